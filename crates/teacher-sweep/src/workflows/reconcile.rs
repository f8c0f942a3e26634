use std::collections::BTreeSet;

use super::directory::DirectoryInventory;
use super::roster::LoginSet;

/// Directory uids missing from the roster: the deprovisioning targets.
pub type CandidateSet = BTreeSet<String>;

/// `keys(inventory) - roster`.
pub fn reconcile(roster: &LoginSet, inventory: &DirectoryInventory) -> CandidateSet {
    inventory
        .uids()
        .filter(|uid| !roster.contains(*uid))
        .map(str::to_string)
        .collect()
}
