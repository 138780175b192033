// Core types for the liteplay playback controller

pub mod callback;
pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod source;
pub mod state;

// Re-export commonly used types
pub use callback::{
    CallbackManager, ChannelCallback, PlayerCallback, PlayerEvent, TransitionEvent, Trigger,
};
pub use config::ControllerConfig;
pub use controller::PlaybackController;
pub use engine::{Engine, Notification, NotificationKind, Notifier};
pub use error::{EngineError, EngineErrorKind, PlayerError, Result};
pub use source::SourceKind;
pub use state::{Command, Pending, PlaybackSession, PlayerState};
