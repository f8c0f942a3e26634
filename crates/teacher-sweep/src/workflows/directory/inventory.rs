use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{info, warn};

use super::domain::{DirectoryEntry, DirectoryError};
use super::gateway::DirectoryConnector;
use crate::config::{DirectoryConfig, InventoryPolicy};

pub(crate) const ACCOUNT_ATTRIBUTES: [&str; 5] = ["uid", "homeDirectory", "cn", "givenName", "sn"];

/// A teacher account as provisioned in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryAccount {
    pub uid: String,
    pub home_directory: String,
    pub display_name: String,
}

impl DirectoryAccount {
    /// Builds an account from a search entry. Entries without a uid or home
    /// directory, or whose home lies outside `home_prefix`, are out of scope.
    pub fn from_entry(entry: &DirectoryEntry, home_prefix: &str) -> Option<Self> {
        let uid = entry.first("uid").filter(|uid| !uid.is_empty())?;
        let home_directory = entry
            .first("homeDirectory")
            .filter(|home| !home.is_empty() && home.starts_with(home_prefix))?;

        let display_name = match entry.first("cn") {
            Some(cn) => cn.to_string(),
            None => {
                let given = entry.first("givenName").unwrap_or_default();
                let surname = entry.first("sn").unwrap_or_default();
                format!("{given} {surname}").trim().to_string()
            }
        };

        Some(Self {
            uid: uid.to_string(),
            home_directory: home_directory.to_string(),
            display_name,
        })
    }
}

/// uid -> account, built once per run and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct DirectoryInventory {
    accounts: BTreeMap<String, DirectoryAccount>,
    degraded: bool,
}

impl DirectoryInventory {
    pub fn from_accounts<I>(accounts: I) -> Self
    where
        I: IntoIterator<Item = DirectoryAccount>,
    {
        Self {
            accounts: accounts
                .into_iter()
                .map(|account| (account.uid.clone(), account))
                .collect(),
            degraded: false,
        }
    }

    pub fn from_entries(entries: &[DirectoryEntry], home_prefix: &str) -> Self {
        Self::from_accounts(
            entries
                .iter()
                .filter_map(|entry| DirectoryAccount::from_entry(entry, home_prefix)),
        )
    }

    /// Empty inventory standing in for a directory that could not be queried.
    pub fn degraded() -> Self {
        Self {
            accounts: BTreeMap::new(),
            degraded: true,
        }
    }

    /// Anonymous search of the people subtree.
    pub fn load(
        connector: &dyn DirectoryConnector,
        config: &DirectoryConfig,
    ) -> Result<Self, DirectoryError> {
        let mut session = connector.connect_anonymous()?;
        let entries = session.search(&config.people_dn(), "(uid=*)", &ACCOUNT_ATTRIBUTES)?;
        let inventory = Self::from_entries(&entries, &config.teacher_home_prefix);

        info!(
            entries = entries.len(),
            teachers = inventory.len(),
            "directory inventory loaded"
        );
        Ok(inventory)
    }

    pub fn get(&self, uid: &str) -> Option<&DirectoryAccount> {
        self.accounts.get(uid)
    }

    pub fn uids(&self) -> impl Iterator<Item = &str> {
        self.accounts.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// True when the directory was unreachable and the fail-open policy applied.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }
}

/// Loads the inventory and applies the configured [`InventoryPolicy`] on failure.
pub fn load_inventory(
    connector: &dyn DirectoryConnector,
    config: &DirectoryConfig,
) -> Result<DirectoryInventory, DirectoryError> {
    match DirectoryInventory::load(connector, config) {
        Ok(inventory) => Ok(inventory),
        Err(err) => match config.inventory_policy {
            InventoryPolicy::FailOpen => {
                if matches!(err, DirectoryError::SizeLimit { .. }) {
                    warn!(error = %err, "directory inventory truncated by the server size limit, continuing with an empty inventory");
                } else {
                    warn!(error = %err, "directory inventory unavailable, continuing with an empty inventory");
                }
                Ok(DirectoryInventory::degraded())
            }
            InventoryPolicy::FailClosed => Err(err),
        },
    }
}
