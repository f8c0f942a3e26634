use std::collections::HashSet;
use std::sync::Arc;

use ldap3::adapters::{Adapter, EntriesOnly, PagedResults};
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, LdapError, Mod, Scope, SearchEntry};
use tokio::runtime::Runtime;
use tracing::{debug, info, warn};

use super::domain::{
    AttributeChange, DirectoryEntry, DirectoryError, OperationResult, SIZE_LIMIT_EXCEEDED,
};
use super::gateway::{DirectoryConnector, DirectorySession};
use crate::config::DirectoryConfig;

/// Entries requested per page of a search.
const PAGE_SIZE: i32 = 500;

/// `ldap3`-backed connector. The async client is driven from a private runtime so
/// the reconciliation workflow stays synchronous.
pub struct LdapDirectory {
    url: String,
    admin_dn: String,
    admin_password: String,
    runtime: Arc<Runtime>,
}

impl LdapDirectory {
    pub fn new(config: &DirectoryConfig) -> Result<Self, DirectoryError> {
        let runtime = Runtime::new().map_err(|err| DirectoryError::Runtime(err.to_string()))?;
        Ok(Self {
            url: config.url.clone(),
            admin_dn: config.admin_dn.clone(),
            admin_password: config.admin_password.clone(),
            runtime: Arc::new(runtime),
        })
    }

    fn open(&self) -> Result<Ldap, DirectoryError> {
        debug!(url = %self.url, "connecting to directory");

        let (conn, ldap) = self
            .runtime
            .block_on(LdapConnAsync::with_settings(
                LdapConnSettings::new(),
                &self.url,
            ))
            .map_err(|err| DirectoryError::Connect {
                url: self.url.clone(),
                reason: err.to_string(),
            })?;

        self.runtime.spawn(async move {
            if let Err(err) = conn.drive().await {
                warn!(error = %err, "LDAP connection driver error");
            }
        });

        Ok(ldap)
    }

    fn session(&self, ldap: Ldap) -> Box<dyn DirectorySession> {
        Box::new(LdapSession {
            ldap,
            runtime: Arc::clone(&self.runtime),
        })
    }
}

impl std::fmt::Debug for LdapDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LdapDirectory")
            .field("url", &self.url)
            .field("admin_dn", &self.admin_dn)
            .finish_non_exhaustive()
    }
}

impl DirectoryConnector for LdapDirectory {
    fn connect_anonymous(&self) -> Result<Box<dyn DirectorySession>, DirectoryError> {
        let ldap = self.open()?;
        Ok(self.session(ldap))
    }

    fn connect_admin(&self) -> Result<Box<dyn DirectorySession>, DirectoryError> {
        let mut ldap = self.open()?;

        debug!(bind_dn = %self.admin_dn, "binding to directory");
        let result = self
            .runtime
            .block_on(ldap.simple_bind(&self.admin_dn, &self.admin_password))
            .map_err(|err| DirectoryError::Bind {
                dn: self.admin_dn.clone(),
                reason: err.to_string(),
            })?;

        if result.rc != 0 {
            let outcome = OperationResult::new(result.rc, result.text);
            return Err(DirectoryError::Bind {
                dn: self.admin_dn.clone(),
                reason: outcome.to_string(),
            });
        }

        info!(bind_dn = %self.admin_dn, "privileged directory session established");
        Ok(self.session(ldap))
    }
}

struct LdapSession {
    ldap: Ldap,
    runtime: Arc<Runtime>,
}

impl DirectorySession for LdapSession {
    fn search(
        &mut self,
        base: &str,
        filter: &str,
        attributes: &[&str],
    ) -> Result<Vec<DirectoryEntry>, DirectoryError> {
        debug!(base = %base, filter = %filter, "searching directory");

        let attrs: Vec<String> = attributes.iter().map(|name| name.to_string()).collect();
        let ldap = &mut self.ldap;
        let (entries, result) = self
            .runtime
            .block_on(async move {
                let adapters: Vec<Box<dyn Adapter<_, _>>> = vec![
                    Box::new(EntriesOnly::new()),
                    Box::new(PagedResults::new(PAGE_SIZE)),
                ];
                let mut stream = ldap
                    .streaming_search_with(adapters, base, Scope::Subtree, filter, attrs)
                    .await?;
                let mut entries = Vec::new();
                while let Some(entry) = stream.next().await? {
                    entries.push(SearchEntry::construct(entry));
                }
                Ok::<_, LdapError>((entries, stream.finish().await))
            })
            .map_err(|err| DirectoryError::operation("search", base, err))?;

        if result.rc == SIZE_LIMIT_EXCEEDED {
            return Err(DirectoryError::SizeLimit {
                base: base.to_string(),
                returned: entries.len(),
            });
        }
        result
            .success()
            .map_err(|err| DirectoryError::operation("search", base, err))?;

        Ok(entries
            .into_iter()
            .map(|entry| DirectoryEntry {
                dn: entry.dn,
                attrs: entry.attrs,
            })
            .collect())
    }

    fn modify(
        &mut self,
        dn: &str,
        changes: Vec<AttributeChange>,
    ) -> Result<OperationResult, DirectoryError> {
        let mods: Vec<Mod<String>> = changes
            .into_iter()
            .map(|change| match change {
                AttributeChange::Add { attribute, values } => {
                    Mod::Add(attribute, values.into_iter().collect::<HashSet<_>>())
                }
                AttributeChange::Delete { attribute, values } => {
                    Mod::Delete(attribute, values.into_iter().collect::<HashSet<_>>())
                }
                AttributeChange::Replace { attribute, values } => {
                    Mod::Replace(attribute, values.into_iter().collect::<HashSet<_>>())
                }
            })
            .collect();

        debug!(dn = %dn, changes = mods.len(), "modifying directory entry");
        let result = self
            .runtime
            .block_on(self.ldap.modify(dn, mods))
            .map_err(|err| DirectoryError::operation("modify", dn, err))?;

        Ok(OperationResult::new(result.rc, result.text))
    }

    fn delete(&mut self, dn: &str) -> Result<OperationResult, DirectoryError> {
        debug!(dn = %dn, "deleting directory entry");
        let result = self
            .runtime
            .block_on(self.ldap.delete(dn))
            .map_err(|err| DirectoryError::operation("delete", dn, err))?;

        Ok(OperationResult::new(result.rc, result.text))
    }
}

impl Drop for LdapSession {
    fn drop(&mut self) {
        if let Err(err) = self.runtime.block_on(self.ldap.unbind()) {
            debug!(error = %err, "directory unbind failed");
        }
    }
}
