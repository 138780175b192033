// Engine trait and the notification path back to the controller

use crate::error::EngineError;
use crate::source::SourceKind;
use crossbeam_channel::Sender;

/// Playback engine driven by the controller
///
/// The controller only calls an engine method when the state table allows
/// it, so engines do not need to validate state themselves. `prepare` and
/// `seek` must return immediately and report their outcome later through
/// the notifier; the remaining calls are synchronous.
pub trait Engine: Send {
    /// Begin preparing `source`; report `prepared` or `error` when done.
    /// The notifier stays valid for the whole session (end of stream and
    /// runtime failures go through it as well).
    fn prepare(&mut self, source: &SourceKind, notifier: Notifier) -> Result<(), EngineError>;

    /// Start or resume playback
    fn start(&mut self) -> Result<(), EngineError>;

    /// Pause playback
    fn pause(&mut self) -> Result<(), EngineError>;

    /// Move to `position_ms`; report `seek_completed` when done
    fn seek(&mut self, position_ms: u64) -> Result<(), EngineError>;

    /// Cancel anything in flight and drop the session's resources
    fn reset(&mut self);

    /// Stop playback; the controller may prepare the same source again
    fn stop(&mut self) {
        self.reset();
    }

    /// Current playback position in milliseconds
    fn position_ms(&self) -> u64;

    /// Release all resources, the engine is not used afterwards
    fn release(&mut self);
}

/// Engine notification payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationKind {
    Prepared { duration_ms: u64 },
    SeekCompleted,
    EndOfStream,
    Failed(EngineError),
}

/// Notification tagged with the session it was issued for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub generation: u64,
    pub kind: NotificationKind,
}

/// Session scoped handle an engine uses to report back
///
/// Cheap to clone and safe to move to worker threads. Once the session is
/// reset anything sent through an old notifier is discarded.
#[derive(Debug, Clone)]
pub struct Notifier {
    generation: u64,
    tx: Sender<Notification>,
}

impl Notifier {
    pub fn new(generation: u64, tx: Sender<Notification>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn prepared(&self, duration_ms: u64) {
        self.send(NotificationKind::Prepared { duration_ms });
    }

    pub fn seek_completed(&self) {
        self.send(NotificationKind::SeekCompleted);
    }

    pub fn end_of_stream(&self) {
        self.send(NotificationKind::EndOfStream);
    }

    pub fn error(&self, error: EngineError) {
        self.send(NotificationKind::Failed(error));
    }

    fn send(&self, kind: NotificationKind) {
        // Controller gone means nobody is interested any more
        let _ = self.tx.send(Notification {
            generation: self.generation,
            kind,
        });
    }
}
