//! Export state machine states.

use std::fmt;

/// Where the single in-flight export currently is.
///
/// `Idle -> Staging -> Capturing -> Paginating -> Assembling -> Done`, with
/// `Failed` reachable from every working state. `Done` and `Failed` are
/// transient: the orchestrator returns to `Idle` right after.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExportState {
    #[default]
    Idle,
    Staging,
    Capturing,
    Paginating,
    Assembling,
    Done,
    Failed,
}

impl ExportState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportState::Idle => "idle",
            ExportState::Staging => "staging",
            ExportState::Capturing => "capturing",
            ExportState::Paginating => "paginating",
            ExportState::Assembling => "assembling",
            ExportState::Done => "done",
            ExportState::Failed => "failed",
        }
    }

    /// A pipeline stage is running.
    pub fn is_working(&self) -> bool {
        matches!(
            self,
            ExportState::Staging
                | ExportState::Capturing
                | ExportState::Paginating
                | ExportState::Assembling
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ExportState::Done | ExportState::Failed)
    }

    /// Whether `self -> next` is an edge of the state machine.
    ///
    /// `working -> Idle` is allowed as well: it is the cancellation edge taken
    /// when an in-flight export future is dropped.
    pub fn can_transition_to(&self, next: ExportState) -> bool {
        use ExportState::*;
        match (self, next) {
            (Idle, Staging)
            | (Staging, Capturing)
            | (Capturing, Paginating)
            | (Paginating, Assembling)
            | (Assembling, Done)
            | (Done, Idle)
            | (Failed, Idle) => true,
            (from, Failed) | (from, Idle) => from.is_working(),
            _ => false,
        }
    }
}

impl fmt::Display for ExportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
