use chrono::{DateTime, Local};
use serde::Serialize;

use crate::workflows::deprovision::{CandidateDecision, DeprovisionOutcome};
use crate::workflows::directory::{DirectoryAccount, DirectoryInventory};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateVerdict {
    Declined,
    Deleted,
    PartiallyDeleted,
    Failed,
}

impl CandidateVerdict {
    fn of(decision: &CandidateDecision) -> Self {
        match decision {
            CandidateDecision::Declined => Self::Declined,
            CandidateDecision::Deprovisioned(outcome) => {
                match (outcome.filesystem_deleted, outcome.directory_deleted) {
                    (true, true) => Self::Deleted,
                    (false, false) => Self::Failed,
                    _ => Self::PartiallyDeleted,
                }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CandidateReport {
    pub uid: String,
    pub display_name: String,
    pub home_directory: String,
    pub verdict: CandidateVerdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<DeprovisionOutcome>,
}

/// Everything a run decided, kept only until it has been printed.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Local>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Local>>,
    pub roster_size: usize,
    pub inventory_size: usize,
    pub inventory_degraded: bool,
    pub candidate_count: usize,
    pub candidates: Vec<CandidateReport>,
}

impl RunSummary {
    pub fn new(roster_size: usize, inventory: &DirectoryInventory) -> Self {
        Self {
            started_at: Local::now(),
            finished_at: None,
            roster_size,
            inventory_size: inventory.len(),
            inventory_degraded: inventory.is_degraded(),
            candidate_count: 0,
            candidates: Vec::new(),
        }
    }

    pub fn record(&mut self, account: &DirectoryAccount, decision: CandidateDecision) {
        let verdict = CandidateVerdict::of(&decision);
        let outcome = match decision {
            CandidateDecision::Declined => None,
            CandidateDecision::Deprovisioned(outcome) => Some(outcome),
        };
        self.candidates.push(CandidateReport {
            uid: account.uid.clone(),
            display_name: account.display_name.clone(),
            home_directory: account.home_directory.clone(),
            verdict,
            outcome,
        });
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Local::now());
    }

    pub fn count(&self, verdict: CandidateVerdict) -> usize {
        self.candidates
            .iter()
            .filter(|candidate| candidate.verdict == verdict)
            .count()
    }
}
