use thiserror::Error;

use crate::signaling::Slot;

/// Ошибки сессии сигнализации. Все варианты фатальны для текущей сессии.
#[derive(Debug, Error)]
pub enum SignalError {
    /// Не удалось поднять движок или бэкенд сигнализации
    #[error("setup failed: {0}")]
    Setup(String),

    #[error("i/o on slot {slot}: {source}")]
    Io {
        slot: Slot,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot encode slot {slot}: {reason}")]
    Encode { slot: Slot, reason: String },

    #[error("malformed payload in slot {slot}: {reason}")]
    Decode { slot: Slot, reason: String },

    #[error("slot {slot} does not hold a {expected}")]
    SlotKind { slot: Slot, expected: &'static str },

    #[error("webrtc engine: {0}")]
    Engine(String),

    #[error("peer connection failed")]
    ConnectionFailed,

    #[error("signaling cancelled")]
    Cancelled,
}

impl From<webrtc::Error> for SignalError {
    fn from(err: webrtc::Error) -> Self {
        SignalError::Engine(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SignalError>;
