use std::io::{self, Write};

use tracing::{info, warn};

use super::deprovision::{Confirmation, Deprovisioner};
use super::directory::DirectoryInventory;
use super::reconcile::reconcile;
use super::report::{Reporter, RunSummary};
use super::roster::LoginSet;

/// Reconciles `roster` against `inventory` and walks every candidate, one at a
/// time, through confirmation and deprovisioning.
pub fn run_sweep<W: Write>(
    roster: &LoginSet,
    inventory: &DirectoryInventory,
    deprovisioner: &mut Deprovisioner,
    confirmation: &mut dyn Confirmation,
    reporter: &mut Reporter<W>,
) -> io::Result<RunSummary> {
    let mut summary = RunSummary::new(roster.len(), inventory);
    if inventory.is_degraded() {
        reporter.inventory_degraded()?;
    }

    let candidates = reconcile(roster, inventory);
    summary.candidate_count = candidates.len();
    info!(
        roster = roster.len(),
        inventory = inventory.len(),
        candidates = candidates.len(),
        "reconciliation complete"
    );

    if candidates.is_empty() {
        reporter.nothing_to_do()?;
    } else {
        reporter.intro(candidates.len())?;
        for uid in &candidates {
            let Some(account) = inventory.get(uid) else {
                warn!(uid = %uid, "candidate missing from inventory, skipping");
                continue;
            };

            let decision = deprovisioner.process(account, confirmation);
            reporter.candidate(account, &decision)?;
            summary.record(account, decision);
        }
    }

    summary.finish();
    reporter.finish(&summary)?;
    Ok(summary)
}
