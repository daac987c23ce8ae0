use super::event::ModeEvent;
use super::model::WorkspaceMode;
use thiserror::Error;

pub type SessionResult<T> = std::result::Result<T, SessionError>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid mode transition: from {from:?} using event {event:?}")]
    InvalidModeTransition {
        from: WorkspaceMode,
        event: ModeEvent,
    },
}
