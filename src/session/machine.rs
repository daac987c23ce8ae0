use super::error::{SessionError, SessionResult};
use super::{event::ModeTransition, BusyKind, ModeEvent, WorkspaceMode};

/// Transition-table state machine over the workspace modes.
///
/// Its table is the single-active-mode invariant: an interactive mode or an
/// external call can only be entered from `Idle`, so no two of them can
/// ever overlap.
#[derive(Debug)]
pub struct ModeMachine {
    mode: WorkspaceMode,
    transition_history: Vec<ModeTransition>,
}

impl ModeMachine {
    pub fn new() -> Self {
        Self {
            mode: WorkspaceMode::default(),
            transition_history: Vec::new(),
        }
    }

    pub fn mode(&self) -> WorkspaceMode {
        self.mode
    }

    pub fn busy_kind(&self) -> Option<BusyKind> {
        match self.mode {
            WorkspaceMode::Busy(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn can_transition(&self, event: ModeEvent) -> bool {
        self.next_mode(event).is_some()
    }

    pub fn next_mode(&self, event: ModeEvent) -> Option<WorkspaceMode> {
        use ModeEvent::*;
        match (self.mode, event) {
            (WorkspaceMode::Idle, BeginBusy(kind)) => Some(WorkspaceMode::Busy(kind)),
            (WorkspaceMode::Error, BeginBusy(kind)) => Some(WorkspaceMode::Busy(kind)),
            (WorkspaceMode::Busy(_), FinishBusy) => Some(WorkspaceMode::Idle),
            (WorkspaceMode::Busy(_), FailBusy) => Some(WorkspaceMode::Error),
            (WorkspaceMode::Error, AcknowledgeError) => Some(WorkspaceMode::Idle),
            (WorkspaceMode::Idle, EnterCrop) => Some(WorkspaceMode::Cropping),
            (WorkspaceMode::Idle, EnterZoom) => Some(WorkspaceMode::Zooming),
            (WorkspaceMode::Idle, EnterMaskPaint) => Some(WorkspaceMode::MaskPainting),
            (WorkspaceMode::Cropping, CommitTool | CancelTool) => Some(WorkspaceMode::Idle),
            (WorkspaceMode::Zooming, CommitTool | CancelTool) => Some(WorkspaceMode::Idle),
            (WorkspaceMode::MaskPainting, CommitTool | CancelTool) => Some(WorkspaceMode::Idle),
            _ => None,
        }
    }

    pub fn transition(&mut self, event: ModeEvent) -> SessionResult<WorkspaceMode> {
        tracing::debug!(from = ?self.mode, event = ?event, "request mode transition");
        let next = self.next_mode(event).ok_or_else(|| {
            let from = self.mode;
            tracing::warn!(from = ?from, event = ?event, "invalid mode transition requested");
            SessionError::InvalidModeTransition { from, event }
        })?;

        let record = ModeTransition::new(Some(self.mode), event, next);
        self.mode = next;
        self.transition_history.push(record);

        Ok(self.mode)
    }
}

#[cfg(test)]
impl ModeMachine {
    fn history(&self) -> &[ModeTransition] {
        &self.transition_history
    }
}

impl Default for ModeMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ModeMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WorkspaceMode::{:?}", self.mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::UpscaleTier;

    #[test]
    fn interactive_modes_are_only_reachable_from_idle() {
        let mut machine = ModeMachine::new();
        assert!(machine.can_transition(ModeEvent::EnterCrop));
        assert!(machine.can_transition(ModeEvent::EnterZoom));
        assert!(machine.can_transition(ModeEvent::EnterMaskPaint));

        let _ = machine
            .transition(ModeEvent::EnterCrop)
            .expect("idle -> cropping should transition");

        assert!(!machine.can_transition(ModeEvent::EnterZoom));
        assert!(!machine.can_transition(ModeEvent::EnterMaskPaint));
        assert!(!machine.can_transition(ModeEvent::BeginBusy(BusyKind::Generate)));
    }

    #[test]
    fn busy_blocks_new_interactive_modes_and_further_calls() {
        let mut machine = ModeMachine::new();
        let _ = machine
            .transition(ModeEvent::BeginBusy(BusyKind::Edit))
            .expect("idle -> busy should transition");

        assert_eq!(machine.busy_kind(), Some(BusyKind::Edit));
        assert!(!machine.can_transition(ModeEvent::EnterCrop));
        assert!(!machine.can_transition(ModeEvent::BeginBusy(BusyKind::Generate)));
        assert!(machine.can_transition(ModeEvent::FinishBusy));
        assert!(machine.can_transition(ModeEvent::FailBusy));
    }

    #[test]
    fn busy_failure_routes_through_error_and_acknowledgment_restores_idle() {
        let mut machine = ModeMachine::new();
        let _ = machine
            .transition(ModeEvent::BeginBusy(BusyKind::Upscale(UpscaleTier::Premium)))
            .expect("idle -> busy");
        let _ = machine.transition(ModeEvent::FailBusy).expect("busy -> error");
        assert_eq!(machine.mode(), WorkspaceMode::Error);

        let _ = machine
            .transition(ModeEvent::AcknowledgeError)
            .expect("error -> idle");
        assert_eq!(machine.mode(), WorkspaceMode::Idle);
    }

    #[test]
    fn a_new_operation_supersedes_an_unacknowledged_error() {
        let mut machine = ModeMachine::new();
        let _ = machine.transition(ModeEvent::BeginBusy(BusyKind::Generate));
        let _ = machine.transition(ModeEvent::FailBusy);
        assert_eq!(machine.mode(), WorkspaceMode::Error);

        let _ = machine
            .transition(ModeEvent::BeginBusy(BusyKind::Generate))
            .expect("error -> busy supersedes the banner");
        assert_eq!(machine.mode(), WorkspaceMode::Busy(BusyKind::Generate));
    }

    #[test]
    fn transition_records_history_with_ordered_entries() {
        let mut machine = ModeMachine::new();
        let _ = machine.transition(ModeEvent::EnterCrop).expect("enter crop");
        let _ = machine.transition(ModeEvent::CommitTool).expect("commit");
        let _ = machine.transition(ModeEvent::EnterZoom).expect("enter zoom");
        let _ = machine.transition(ModeEvent::CancelTool).expect("cancel");

        assert_eq!(machine.mode(), WorkspaceMode::Idle);
        assert_eq!(machine.history().len(), 4);
        assert_eq!(
            machine.history()[0],
            ModeTransition::new(
                Some(WorkspaceMode::Idle),
                ModeEvent::EnterCrop,
                WorkspaceMode::Cropping
            )
        );
        assert_eq!(
            machine.history()[3],
            ModeTransition::new(
                Some(WorkspaceMode::Zooming),
                ModeEvent::CancelTool,
                WorkspaceMode::Idle
            )
        );
    }

    #[test]
    fn invalid_transition_returns_error_without_mutating_history() {
        let mut machine = ModeMachine::new();

        let err = machine
            .transition(ModeEvent::FinishBusy)
            .expect_err("idle -> finish busy should fail");
        assert!(matches!(
            err,
            SessionError::InvalidModeTransition {
                from: WorkspaceMode::Idle,
                event: ModeEvent::FinishBusy
            }
        ));
        assert_eq!(machine.mode(), WorkspaceMode::Idle);
        assert!(machine.history().is_empty());
    }
}
