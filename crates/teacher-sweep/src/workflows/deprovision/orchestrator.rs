use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use super::confirm::Confirmation;
use super::filesystem::HomeDirectoryStore;
use super::state::{DeprovisionMachine, DeprovisionState};
use crate::config::DirectoryConfig;
use crate::workflows::directory::{
    escape_filter_value, AttributeChange, DirectoryAccount, DirectoryConnector, DirectorySession,
};

/// Result of running the deprovisioning sequence for one confirmed candidate.
#[derive(Debug, Clone, Serialize)]
pub struct DeprovisionOutcome {
    pub uid: String,
    pub filesystem_deleted: bool,
    pub filesystem_message: String,
    pub directory_deleted: bool,
    pub directory_message: String,
    pub messages: Vec<String>,
    pub trail: Vec<DeprovisionState>,
}

impl DeprovisionOutcome {
    pub fn fully_succeeded(&self) -> bool {
        self.filesystem_deleted && self.directory_deleted
    }
}

/// What happened to a candidate after the confirmation gate.
#[derive(Debug, Clone)]
pub enum CandidateDecision {
    Declined,
    Deprovisioned(DeprovisionOutcome),
}

/// Working state for one candidate while the machine runs.
struct CandidateRun<'a> {
    account: &'a DirectoryAccount,
    entry_dn: Option<String>,
    /// Set when the delete call itself failed; the candidate cannot succeed.
    delete_failure: Option<String>,
    filesystem: (bool, String),
    directory: (bool, String),
    messages: Vec<String>,
}

impl<'a> CandidateRun<'a> {
    fn new(account: &'a DirectoryAccount) -> Self {
        Self {
            account,
            entry_dn: None,
            delete_failure: None,
            filesystem: (false, String::new()),
            directory: (false, String::new()),
            messages: Vec::new(),
        }
    }

    fn note(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!(uid = %self.account.uid, "{message}");
        self.messages.push(message);
    }

    fn problem(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!(uid = %self.account.uid, "{message}");
        self.messages.push(message);
    }

    /// Records the final directory verdict.
    fn conclude(&mut self, succeeded: bool, message: String) {
        if succeeded {
            self.note(message.clone());
        } else {
            self.problem(message.clone());
        }
        self.directory = (succeeded, message);
    }

    fn into_outcome(self, trail: Vec<DeprovisionState>) -> DeprovisionOutcome {
        DeprovisionOutcome {
            uid: self.account.uid.clone(),
            filesystem_deleted: self.filesystem.0,
            filesystem_message: self.filesystem.1,
            directory_deleted: self.directory.0,
            directory_message: self.directory.1,
            messages: self.messages,
            trail,
        }
    }
}

/// Drives candidates through [`DeprovisionState`] against the filesystem and the
/// directory. The privileged session is opened on first use and kept for the
/// remaining candidates.
pub struct Deprovisioner {
    connector: Box<dyn DirectoryConnector>,
    store: Box<dyn HomeDirectoryStore>,
    config: DirectoryConfig,
    session: Option<Box<dyn DirectorySession>>,
}

impl std::fmt::Debug for Deprovisioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deprovisioner")
            .field("config", &self.config)
            .field("connected", &self.session.is_some())
            .finish_non_exhaustive()
    }
}

impl Deprovisioner {
    pub fn new(
        connector: Box<dyn DirectoryConnector>,
        store: Box<dyn HomeDirectoryStore>,
        config: DirectoryConfig,
    ) -> Self {
        Self {
            connector,
            store,
            config,
            session: None,
        }
    }

    /// Asks for confirmation and, when given, runs the full sequence.
    pub fn process(
        &mut self,
        account: &DirectoryAccount,
        confirmation: &mut dyn Confirmation,
    ) -> CandidateDecision {
        let mut machine = DeprovisionMachine::new();
        let mut run = CandidateRun::new(account);

        while !machine.state().is_terminal() {
            let next = self.step(machine.state(), &mut run, confirmation);
            if let Err(err) = machine.advance(next) {
                run.conclude(false, err.to_string());
                machine.abort();
            }
        }

        if machine.state() == DeprovisionState::Declined {
            info!(uid = %account.uid, "deletion declined");
            return CandidateDecision::Declined;
        }

        CandidateDecision::Deprovisioned(run.into_outcome(machine.into_trail()))
    }

    fn step(
        &mut self,
        state: DeprovisionState,
        run: &mut CandidateRun<'_>,
        confirmation: &mut dyn Confirmation,
    ) -> DeprovisionState {
        use DeprovisionState::*;

        match state {
            Pending => {
                if confirmation.confirm(run.account) {
                    Confirmed
                } else {
                    Declined
                }
            }
            Confirmed => {
                self.remove_home(run);
                FilesystemAttempted
            }
            FilesystemAttempted => {
                run.note(format!(
                    "Starting LDAP user deletion for: {}",
                    run.account.uid
                ));
                DirectoryConnecting
            }
            DirectoryConnecting => self.connect(run),
            DirectoryConnectFailed => Failed,
            DirectoryConnected => Verifying,
            Verifying => self.verify(run),
            NotFound => {
                run.conclude(
                    false,
                    format!("User {} not found in LDAP", run.account.uid),
                );
                Failed
            }
            GroupCleanup => {
                self.clean_group_memberships(run);
                PersonalGroupCleanup
            }
            PersonalGroupCleanup => {
                self.remove_personal_group(run);
                Deleting
            }
            Deleting => {
                self.delete_entry(run);
                PostVerify
            }
            PostVerify => self.post_verify(run),
            Declined | Succeeded | Failed => state,
        }
    }

    fn remove_home(&self, run: &mut CandidateRun<'_>) {
        let home = run.account.home_directory.clone();
        let path = Path::new(&home);

        let result = if !self.store.exists(path) {
            (false, format!("Directory {home} does not exist"))
        } else {
            match self.store.remove_all(path) {
                Ok(()) => (true, format!("Directory {home} successfully deleted")),
                Err(err) => (false, format!("Error deleting directory {home}: {err}")),
            }
        };

        if result.0 {
            run.note(result.1.clone());
        } else {
            run.problem(result.1.clone());
        }
        run.filesystem = result;
    }

    fn connect(&mut self, run: &mut CandidateRun<'_>) -> DeprovisionState {
        if self.session.is_some() {
            run.note("Reusing LDAP connection");
            return DeprovisionState::DirectoryConnected;
        }

        run.note(format!("Connecting to LDAP as: {}", self.config.admin_dn));
        match self.connector.connect_admin() {
            Ok(session) => {
                self.session = Some(session);
                run.note("LDAP connection established");
                DeprovisionState::DirectoryConnected
            }
            Err(err) => {
                run.conclude(false, format!("LDAP connection error: {err}"));
                DeprovisionState::DirectoryConnectFailed
            }
        }
    }

    fn verify(&mut self, run: &mut CandidateRun<'_>) -> DeprovisionState {
        let uid = run.account.uid.clone();
        let Some(session) = self.session.as_mut() else {
            run.conclude(false, "LDAP connection lost".to_string());
            return DeprovisionState::Failed;
        };

        let filter = format!("(uid={})", escape_filter_value(&uid));
        match session.search(&self.config.people_dn(), &filter, &["uid"]) {
            Ok(entries) => match entries.into_iter().next() {
                Some(entry) => {
                    run.note(format!("User {uid} found in LDAP"));
                    run.entry_dn = Some(entry.dn);
                    DeprovisionState::GroupCleanup
                }
                None => DeprovisionState::NotFound,
            },
            Err(err) => {
                // A broken session would fail every later candidate too.
                self.session = None;
                run.conclude(false, format!("Error looking up user {uid}: {err}"));
                DeprovisionState::Failed
            }
        }
    }

    fn account_dn(&self, run: &CandidateRun<'_>) -> String {
        run.entry_dn
            .clone()
            .unwrap_or_else(|| self.config.user_dn(&run.account.uid))
    }

    fn clean_group_memberships(&mut self, run: &mut CandidateRun<'_>) {
        let uid = run.account.uid.clone();
        let user_dn = self.account_dn(run);
        let Some(session) = self.session.as_mut() else {
            run.problem("LDAP connection lost before group cleanup");
            return;
        };

        run.note(format!("Searching groups for user {uid}..."));
        let filter = format!(
            "(|(memberUid={})(member={}))",
            escape_filter_value(&uid),
            escape_filter_value(&user_dn)
        );
        let groups = match session.search(&self.config.group_dn(), &filter, &["cn"]) {
            Ok(groups) => groups,
            Err(err) => {
                run.problem(format!("Error searching groups for user {uid}: {err}"));
                return;
            }
        };

        let names: Vec<&str> = groups
            .iter()
            .map(|group| group.first("cn").unwrap_or(group.dn.as_str()))
            .collect();
        run.note(format!("Groups found: [{}]", names.join(", ")));

        for group in &groups {
            let name = group.first("cn").unwrap_or(group.dn.as_str());
            run.note(format!("Removing user {uid} from group: {name}"));

            for (attribute, value) in [("memberUid", uid.as_str()), ("member", user_dn.as_str())] {
                let change = AttributeChange::delete_value(attribute, value);
                match session.modify(&group.dn, vec![change]) {
                    Ok(result) if result.is_success() => {
                        run.note(format!("  - {attribute} removed: {result}"));
                    }
                    Ok(result) => {
                        run.problem(format!("  - {attribute} not removed: {result}"));
                    }
                    Err(err) => {
                        run.problem(format!("  - Error removing {attribute}: {err}"));
                    }
                }
            }
        }
    }

    fn remove_personal_group(&mut self, run: &mut CandidateRun<'_>) {
        let uid = run.account.uid.clone();
        let Some(session) = self.session.as_mut() else {
            run.problem("LDAP connection lost before personal group cleanup");
            return;
        };

        let filter = format!("(cn={})", escape_filter_value(&uid));
        let groups = match session.search(&self.config.group_dn(), &filter, &["cn"]) {
            Ok(groups) => groups,
            Err(err) => {
                run.problem(format!("Error searching personal group {uid}: {err}"));
                return;
            }
        };

        for group in groups {
            run.note(format!("Removing personal group: {}", group.dn));
            match session.delete(&group.dn) {
                Ok(result) if result.is_success() => {
                    run.note(format!("Personal group removal result: {result}"));
                }
                Ok(result) => {
                    run.problem(format!("Personal group removal result: {result}"));
                }
                Err(err) => run.problem(format!("Error removing personal group: {err}")),
            }
        }
    }

    fn delete_entry(&mut self, run: &mut CandidateRun<'_>) {
        let uid = run.account.uid.clone();
        let user_dn = self.account_dn(run);
        let Some(session) = self.session.as_mut() else {
            run.problem("LDAP connection lost before deletion");
            return;
        };

        run.note(format!("Deleting user: {user_dn}"));
        match session.delete(&user_dn) {
            Ok(result) if result.is_success() => {
                run.note(format!("User {uid} deleted: {result}"));
            }
            Ok(result) => {
                let failure = format!("Error deleting user: {}", result.description());
                run.problem(failure.clone());
                run.delete_failure = Some(failure);
            }
            Err(err) => {
                let failure = format!("Error deleting user: {err}");
                run.problem(failure.clone());
                run.delete_failure = Some(failure);
            }
        }
    }

    /// A candidate succeeds only when the delete call succeeded and the entry is
    /// gone. A lingering entry fails it whatever the delete call reported.
    fn post_verify(&mut self, run: &mut CandidateRun<'_>) -> DeprovisionState {
        let uid = run.account.uid.clone();
        let Some(session) = self.session.as_mut() else {
            run.conclude(false, "LDAP connection lost before verification".to_string());
            return DeprovisionState::Failed;
        };

        let filter = format!("(uid={})", escape_filter_value(&uid));
        let still_present = match session.search(&self.config.people_dn(), &filter, &["uid"]) {
            Ok(entries) => !entries.is_empty(),
            Err(err) => {
                run.conclude(false, format!("Unable to verify deletion of {uid}: {err}"));
                return DeprovisionState::Failed;
            }
        };

        match (still_present, run.delete_failure.take()) {
            (true, _) => {
                run.conclude(false, format!("The user {uid} still exists after deletion"));
                DeprovisionState::Failed
            }
            (false, Some(failure)) => {
                run.note(format!("User {uid} no longer present in LDAP"));
                run.directory = (false, failure);
                DeprovisionState::Failed
            }
            (false, None) => {
                run.conclude(true, format!("User {uid} successfully deleted"));
                DeprovisionState::Succeeded
            }
        }
    }
}
