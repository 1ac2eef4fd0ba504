pub mod head_manager;
pub mod host;
pub mod messages;
pub mod presenter;
pub mod registry;
pub mod transport;

use messages::{DecodeError, MessageKind};

use crate::menu::actions::DispatchError;

/// Stable identifier of a session participant.
pub type ParticipantId = i64;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Malformed message, reason='{0}'")]
    Decode(#[from] DecodeError),

    #[error("Menu dispatch failed, reason='{0}'")]
    Dispatch(#[from] DispatchError),

    #[error("No handler registered for {0:?}")]
    NoHandler(MessageKind),
}
