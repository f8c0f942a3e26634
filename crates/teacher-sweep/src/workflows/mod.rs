pub mod deprovision;
pub mod directory;
pub mod reconcile;
pub mod report;
pub mod roster;
pub mod sweep;
