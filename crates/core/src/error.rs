// Error types for the playback controller and the engines behind it

use crate::state::{Command, PlayerState};
use std::fmt;

/// Errors returned by controller commands
///
/// None of these change the playback state: the command is rejected and the
/// session is left exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlayerError {
    /// Command is not defined for the current state
    #[error("invalid state: {command:?} is not allowed in {state:?}")]
    InvalidState { command: Command, state: PlayerState },

    /// Seek target outside `[0, duration)`
    #[error("invalid seek target {target_ms} ms (duration {duration_ms} ms)")]
    InvalidSeekTarget { target_ms: i64, duration_ms: u64 },

    /// Locator could not be bound as a data source
    #[error("invalid data source: {0}")]
    InvalidDataSource(String),

    /// Controller was released, no further commands are accepted
    #[error("player released")]
    Released,
}

/// Result type alias for controller commands
pub type Result<T> = std::result::Result<T, PlayerError>;

/// Failure class reported by an engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineErrorKind {
    /// Reading the media failed
    Io,
    /// Container or codec is not supported
    UnsupportedFormat,
    /// Media data could not be decoded
    Decode,
    /// Engine ran out of some resource (threads, memory, device)
    Resource,
    /// Engine cannot handle this kind of source at all
    UnsupportedSource,
}

impl EngineErrorKind {
    /// Numeric code delivered as the first argument of `onError`
    pub fn code(self) -> i32 {
        match self {
            EngineErrorKind::Io => 1,
            EngineErrorKind::UnsupportedFormat => 2,
            EngineErrorKind::Decode => 3,
            EngineErrorKind::Resource => 4,
            EngineErrorKind::UnsupportedSource => 5,
        }
    }
}

impl fmt::Display for EngineErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            EngineErrorKind::Io => "IO error",
            EngineErrorKind::UnsupportedFormat => "Unsupported format",
            EngineErrorKind::Decode => "Decoding error",
            EngineErrorKind::Resource => "Resource error",
            EngineErrorKind::UnsupportedSource => "Unsupported source",
        };
        f.write_str(name)
    }
}

/// Failure surfaced from the playback engine
///
/// Always drives the controller into `Error`; `code()` and `extra` are what
/// the host receives through `onError(code, extra)`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} (code {}, extra {extra}): {message}", .kind.code())]
pub struct EngineError {
    pub kind: EngineErrorKind,
    /// Engine specific detail, e.g. the OS error number
    pub extra: i32,
    pub message: String,
}

impl EngineError {
    pub fn new(kind: EngineErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            extra: 0,
            message: message.into(),
        }
    }

    pub fn with_extra(mut self, extra: i32) -> Self {
        self.extra = extra;
        self
    }

    pub fn code(&self) -> i32 {
        self.kind.code()
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::new(EngineErrorKind::Io, err.to_string())
            .with_extra(err.raw_os_error().unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_error_display_carries_code_and_extra() {
        let err = EngineError::new(EngineErrorKind::Decode, "bad frame").with_extra(7);
        assert_eq!(err.code(), 3);
        assert_eq!(err.to_string(), "Decoding error (code 3, extra 7): bad frame");
    }

    #[test]
    fn test_io_error_keeps_os_error_number() {
        let io = std::io::Error::from_raw_os_error(2);
        let err = EngineError::from(io);
        assert_eq!(err.kind, EngineErrorKind::Io);
        assert_eq!(err.extra, 2);
    }

    #[test]
    fn test_invalid_state_message() {
        let err = PlayerError::InvalidState {
            command: Command::Pause,
            state: PlayerState::Idle,
        };
        assert_eq!(err.to_string(), "invalid state: Pause is not allowed in Idle");
    }
}
