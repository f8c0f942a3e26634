use serde::Serialize;

/// Per-candidate deprovisioning states, in the order they are normally visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeprovisionState {
    Pending,
    Confirmed,
    Declined,
    FilesystemAttempted,
    DirectoryConnecting,
    DirectoryConnected,
    DirectoryConnectFailed,
    Verifying,
    NotFound,
    GroupCleanup,
    PersonalGroupCleanup,
    Deleting,
    PostVerify,
    Succeeded,
    Failed,
}

impl DeprovisionState {
    /// Transition table: the states reachable from `self` in one step.
    pub const fn successors(self) -> &'static [Self] {
        use DeprovisionState::*;
        match self {
            Pending => &[Confirmed, Declined],
            Confirmed => &[FilesystemAttempted],
            FilesystemAttempted => &[DirectoryConnecting],
            DirectoryConnecting => &[DirectoryConnected, DirectoryConnectFailed],
            DirectoryConnected => &[Verifying],
            DirectoryConnectFailed => &[Failed],
            Verifying => &[NotFound, GroupCleanup, Failed],
            NotFound => &[Failed],
            GroupCleanup => &[PersonalGroupCleanup],
            PersonalGroupCleanup => &[Deleting],
            Deleting => &[PostVerify],
            PostVerify => &[Succeeded, Failed],
            Declined | Succeeded | Failed => &[],
        }
    }

    pub const fn is_terminal(self) -> bool {
        self.successors().is_empty()
    }

    pub fn can_transition_to(self, next: Self) -> bool {
        self.successors().contains(&next)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Confirmed => "Confirmed",
            Self::Declined => "Declined",
            Self::FilesystemAttempted => "Filesystem Attempted",
            Self::DirectoryConnecting => "Directory Connecting",
            Self::DirectoryConnected => "Directory Connected",
            Self::DirectoryConnectFailed => "Directory Connect Failed",
            Self::Verifying => "Verifying",
            Self::NotFound => "Not Found",
            Self::GroupCleanup => "Group Cleanup",
            Self::PersonalGroupCleanup => "Personal Group Cleanup",
            Self::Deleting => "Deleting",
            Self::PostVerify => "Post Verify",
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal deprovisioning transition {} -> {}", from.label(), to.label())]
pub struct TransitionError {
    pub from: DeprovisionState,
    pub to: DeprovisionState,
}

/// Tracks one candidate's position in the state machine and the path it took.
#[derive(Debug, Clone)]
pub struct DeprovisionMachine {
    state: DeprovisionState,
    trail: Vec<DeprovisionState>,
}

impl Default for DeprovisionMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl DeprovisionMachine {
    pub fn new() -> Self {
        Self {
            state: DeprovisionState::Pending,
            trail: vec![DeprovisionState::Pending],
        }
    }

    pub fn state(&self) -> DeprovisionState {
        self.state
    }

    pub fn advance(&mut self, next: DeprovisionState) -> Result<(), TransitionError> {
        if !self.state.can_transition_to(next) {
            return Err(TransitionError {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        self.trail.push(next);
        Ok(())
    }

    /// Jumps straight to `Failed`, bypassing the table.
    pub(crate) fn abort(&mut self) {
        self.state = DeprovisionState::Failed;
        self.trail.push(DeprovisionState::Failed);
    }

    pub fn trail(&self) -> &[DeprovisionState] {
        &self.trail
    }

    pub fn into_trail(self) -> Vec<DeprovisionState> {
        self.trail
    }
}
