use super::domain::{AttributeChange, DirectoryEntry, DirectoryError, OperationResult};

/// A bound connection to the directory. Every call is a blocking round-trip.
pub trait DirectorySession {
    /// Subtree search below `base`.
    fn search(
        &mut self,
        base: &str,
        filter: &str,
        attributes: &[&str],
    ) -> Result<Vec<DirectoryEntry>, DirectoryError>;

    fn modify(
        &mut self,
        dn: &str,
        changes: Vec<AttributeChange>,
    ) -> Result<OperationResult, DirectoryError>;

    fn delete(&mut self, dn: &str) -> Result<OperationResult, DirectoryError>;
}

/// Opens sessions against one directory deployment.
pub trait DirectoryConnector {
    /// Read-only session without credentials, used for the inventory.
    fn connect_anonymous(&self) -> Result<Box<dyn DirectorySession>, DirectoryError>;

    /// Privileged session bound with the configured administrative credentials.
    fn connect_admin(&self) -> Result<Box<dyn DirectorySession>, DirectoryError>;
}
