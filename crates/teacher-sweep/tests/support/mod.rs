#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use teacher_sweep::config::{DirectoryConfig, InventoryPolicy};
use teacher_sweep::workflows::deprovision::{Confirmation, HomeDirectoryStore};
use teacher_sweep::workflows::directory::{
    AttributeChange, DirectoryAccount, DirectoryConnector, DirectoryEntry, DirectoryError,
    DirectorySession, OperationResult,
};

pub const BASE_DN: &str = "dc=instituto,dc=extremadura,dc=es";
pub const PEOPLE_DN: &str = "ou=People,dc=instituto,dc=extremadura,dc=es";
pub const GROUP_DN: &str = "ou=Group,dc=instituto,dc=extremadura,dc=es";

pub fn directory_config(policy: InventoryPolicy) -> DirectoryConfig {
    DirectoryConfig {
        url: "ldap://directory.test:389".to_string(),
        base_dn: BASE_DN.to_string(),
        people_ou: "ou=People".to_string(),
        group_ou: "ou=Group".to_string(),
        admin_dn: format!("cn=admin,ou=people,{BASE_DN}"),
        admin_password: "secret".to_string(),
        teacher_home_prefix: "/home/profesor".to_string(),
        inventory_policy: policy,
    }
}

pub fn user_dn(uid: &str) -> String {
    format!("uid={uid},{PEOPLE_DN}")
}

pub fn group_dn(cn: &str) -> String {
    format!("cn={cn},{GROUP_DN}")
}

pub fn teacher_entry(uid: &str, name: &str) -> DirectoryEntry {
    DirectoryEntry::new(user_dn(uid))
        .with_attr("uid", &[uid])
        .with_attr("homeDirectory", &[format!("/home/profesor/{uid}").as_str()])
        .with_attr("cn", &[name])
}

pub fn account(uid: &str, name: &str) -> DirectoryAccount {
    DirectoryAccount {
        uid: uid.to_string(),
        home_directory: format!("/home/profesor/{uid}"),
        display_name: name.to_string(),
    }
}

#[derive(Debug, Default)]
pub struct DirectoryState {
    pub entries: BTreeMap<String, DirectoryEntry>,
    pub anonymous_unavailable: bool,
    /// Server-side cap on the number of entries a search may return.
    pub size_limit: Option<usize>,
    pub admin_failures_remaining: usize,
    pub anonymous_connects: usize,
    pub admin_connects: usize,
    /// Every modify/delete issued, as `"modify <dn> <attribute>"` or `"delete <dn>"`.
    pub mutations: Vec<String>,
    /// Attributes whose modify calls fail at the transport level.
    pub broken_attributes: HashSet<String>,
    /// DNs whose delete reports success without removing anything.
    pub sticky: HashSet<String>,
    /// DNs whose delete is refused with the given result.
    pub refused: HashMap<String, OperationResult>,
    /// DNs whose delete removes the entry but still reports the given result.
    pub lossy: HashMap<String, OperationResult>,
}

/// In-memory directory shared between the connector and its sessions.
#[derive(Debug, Clone, Default)]
pub struct FakeDirectory {
    pub state: Arc<Mutex<DirectoryState>>,
}

impl FakeDirectory {
    pub fn with_entries<I: IntoIterator<Item = DirectoryEntry>>(entries: I) -> Self {
        let directory = Self::default();
        {
            let mut state = directory.state();
            for entry in entries {
                state.entries.insert(entry.dn.clone(), entry);
            }
        }
        directory
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, DirectoryState> {
        self.state.lock().expect("directory mutex poisoned")
    }

    pub fn contains(&self, dn: &str) -> bool {
        self.state().entries.contains_key(dn)
    }

    pub fn values(&self, dn: &str, attribute: &str) -> Vec<String> {
        self.state()
            .entries
            .get(dn)
            .map(|entry| entry.values(attribute).to_vec())
            .unwrap_or_default()
    }

    pub fn mutations(&self) -> Vec<String> {
        self.state().mutations.clone()
    }

    fn session(&self) -> Box<dyn DirectorySession> {
        Box::new(FakeSession {
            state: Arc::clone(&self.state),
        })
    }
}

impl DirectoryConnector for FakeDirectory {
    fn connect_anonymous(&self) -> Result<Box<dyn DirectorySession>, DirectoryError> {
        let mut state = self.state();
        state.anonymous_connects += 1;
        if state.anonymous_unavailable {
            return Err(DirectoryError::Connect {
                url: "ldap://directory.test:389".to_string(),
                reason: "connection refused".to_string(),
            });
        }
        drop(state);
        Ok(self.session())
    }

    fn connect_admin(&self) -> Result<Box<dyn DirectorySession>, DirectoryError> {
        let mut state = self.state();
        state.admin_connects += 1;
        if state.admin_failures_remaining > 0 {
            state.admin_failures_remaining -= 1;
            return Err(DirectoryError::Bind {
                dn: format!("cn=admin,ou=people,{BASE_DN}"),
                reason: "invalidCredentials (49)".to_string(),
            });
        }
        drop(state);
        Ok(self.session())
    }
}

struct FakeSession {
    state: Arc<Mutex<DirectoryState>>,
}

impl FakeSession {
    fn state(&self) -> std::sync::MutexGuard<'_, DirectoryState> {
        self.state.lock().expect("directory mutex poisoned")
    }
}

/// Matches the handful of filter shapes the workflow emits:
/// `(attr=value)`, `(attr=*)` and `(|(..)(..))`.
fn matches(entry: &DirectoryEntry, filter: &str) -> bool {
    let inner = filter
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .unwrap_or(filter);

    if let Some(alternatives) = inner.strip_prefix('|') {
        return split_groups(alternatives)
            .iter()
            .any(|group| matches(entry, group));
    }

    match inner.split_once('=') {
        Some((attribute, "*")) => !entry.values(attribute).is_empty(),
        Some((attribute, value)) => entry.values(attribute).iter().any(|v| v == value),
        None => false,
    }
}

fn split_groups(filters: &str) -> Vec<&str> {
    let mut groups = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (index, ch) in filters.char_indices() {
        match ch {
            '(' => {
                if depth == 0 {
                    start = index;
                }
                depth += 1;
            }
            ')' => {
                depth -= 1;
                if depth == 0 {
                    groups.push(&filters[start..=index]);
                }
            }
            _ => {}
        }
    }
    groups
}

impl DirectorySession for FakeSession {
    fn search(
        &mut self,
        base: &str,
        filter: &str,
        _attributes: &[&str],
    ) -> Result<Vec<DirectoryEntry>, DirectoryError> {
        let state = self.state();
        let suffix = format!(",{}", base.to_ascii_lowercase());
        let found: Vec<DirectoryEntry> = state
            .entries
            .values()
            .filter(|entry| entry.dn.to_ascii_lowercase().ends_with(&suffix))
            .filter(|entry| matches(entry, filter))
            .cloned()
            .collect();
        match state.size_limit {
            Some(limit) if found.len() > limit => Err(DirectoryError::SizeLimit {
                base: base.to_string(),
                returned: limit,
            }),
            _ => Ok(found),
        }
    }

    fn modify(
        &mut self,
        dn: &str,
        changes: Vec<AttributeChange>,
    ) -> Result<OperationResult, DirectoryError> {
        let mut state = self.state();
        for change in changes {
            let AttributeChange::Delete { attribute, values } = change else {
                return Ok(OperationResult::new(53, "fake only supports deletes"));
            };
            state.mutations.push(format!("modify {dn} {attribute}"));
            if state.broken_attributes.contains(&attribute) {
                return Err(DirectoryError::operation("modify", dn, "connection reset"));
            }
            let Some(entry) = state.entries.get_mut(dn) else {
                return Ok(OperationResult::new(32, ""));
            };
            let Some((_, current)) = entry
                .attrs
                .iter_mut()
                .find(|(key, _)| key.eq_ignore_ascii_case(&attribute))
            else {
                return Ok(OperationResult::new(16, "no such attribute"));
            };
            let before = current.len();
            current.retain(|value| !values.contains(value));
            if current.len() == before {
                return Ok(OperationResult::new(16, "no such value"));
            }
        }
        Ok(OperationResult::success())
    }

    fn delete(&mut self, dn: &str) -> Result<OperationResult, DirectoryError> {
        let mut state = self.state();
        state.mutations.push(format!("delete {dn}"));
        if let Some(result) = state.refused.get(dn) {
            return Ok(result.clone());
        }
        if let Some(result) = state.lossy.get(dn).cloned() {
            state.entries.remove(dn);
            return Ok(result);
        }
        if state.sticky.contains(dn) {
            return Ok(OperationResult::success());
        }
        match state.entries.remove(dn) {
            Some(_) => Ok(OperationResult::success()),
            None => Ok(OperationResult::new(32, "")),
        }
    }
}

#[derive(Debug, Default)]
pub struct StoreState {
    pub existing: BTreeSet<PathBuf>,
    pub removed: Vec<PathBuf>,
    pub failing: HashSet<PathBuf>,
}

#[derive(Debug, Clone, Default)]
pub struct FakeStore {
    pub state: Arc<Mutex<StoreState>>,
}

impl FakeStore {
    pub fn with_homes(uids: &[&str]) -> Self {
        let store = Self::default();
        {
            let mut state = store.state.lock().expect("store mutex poisoned");
            for uid in uids {
                state
                    .existing
                    .insert(PathBuf::from(format!("/home/profesor/{uid}")));
            }
        }
        store
    }

    pub fn removed(&self) -> Vec<PathBuf> {
        self.state.lock().expect("store mutex poisoned").removed.clone()
    }
}

impl HomeDirectoryStore for FakeStore {
    fn exists(&self, path: &Path) -> bool {
        self.state
            .lock()
            .expect("store mutex poisoned")
            .existing
            .contains(path)
    }

    fn remove_all(&self, path: &Path) -> io::Result<()> {
        let mut state = self.state.lock().expect("store mutex poisoned");
        if state.failing.contains(path) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"));
        }
        state.existing.remove(path);
        state.removed.push(path.to_path_buf());
        Ok(())
    }
}

/// Answers prompts from a fixed script; once exhausted every answer is "no".
#[derive(Debug, Default)]
pub struct ScriptedConfirmation {
    answers: VecDeque<bool>,
    pub asked: Vec<String>,
}

impl ScriptedConfirmation {
    pub fn new(answers: &[bool]) -> Self {
        Self {
            answers: answers.iter().copied().collect(),
            asked: Vec::new(),
        }
    }
}

impl Confirmation for ScriptedConfirmation {
    fn confirm(&mut self, account: &DirectoryAccount) -> bool {
        self.asked.push(account.uid.clone());
        self.answers.pop_front().unwrap_or(false)
    }
}
