// Player events and the listener registry that delivers them

use crate::state::{Command, PlayerState};
use crossbeam_channel::Sender;
use parking_lot::Mutex;
use std::sync::Arc;

/// Notification delivered to the host, one per transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerEvent {
    Idle,
    Prepared,
    Started,
    Paused,
    SeekCompleted,
    Completed,
    Stopped,
    Error { code: i32, extra: i32 },
}

impl PlayerEvent {
    /// State the controller is in once this event has been emitted
    pub fn state(&self) -> PlayerState {
        match self {
            PlayerEvent::Idle => PlayerState::Idle,
            PlayerEvent::Prepared => PlayerState::Prepared,
            PlayerEvent::Started => PlayerState::Started,
            PlayerEvent::Paused => PlayerState::Paused,
            PlayerEvent::SeekCompleted => PlayerState::SeekCompleted,
            PlayerEvent::Completed => PlayerState::Completed,
            PlayerEvent::Stopped => PlayerState::Stopped,
            PlayerEvent::Error { .. } => PlayerState::Error,
        }
    }
}

/// What caused a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Host command
    Command(Command),
    /// Engine finished preparing
    PrepareDone,
    /// Engine finished seeking
    SeekDone,
    /// Engine ran out of media while started
    EndOfStream,
    /// Engine failure
    EngineFailure,
    /// Start issued by the controller after a seek
    AutoResume,
    /// Reset issued by the controller after an error or completion
    AutoReset,
}

/// Immutable record of a fired transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionEvent {
    pub from: PlayerState,
    pub to: PlayerState,
    pub trigger: Trigger,
    /// Monotonic per controller, starts at 1
    pub ordinal: u64,
    pub event: PlayerEvent,
}

/// Player callback trait
/// Implementations run on the thread that owns the controller and should
/// return quickly; they must not call back into the controller.
pub trait PlayerCallback: Send + Sync {
    fn on_event(&self, event: &TransitionEvent);
}

/// Forwards every event into a channel
pub struct ChannelCallback {
    tx: Sender<TransitionEvent>,
}

impl ChannelCallback {
    pub fn new(tx: Sender<TransitionEvent>) -> Self {
        Self { tx }
    }
}

impl PlayerCallback for ChannelCallback {
    fn on_event(&self, event: &TransitionEvent) {
        // A dropped receiver just means the host stopped listening
        let _ = self.tx.send(*event);
    }
}

/// Callback manager for handling multiple callbacks
pub struct CallbackManager {
    callbacks: Mutex<Vec<Arc<dyn PlayerCallback>>>,
}

impl CallbackManager {
    pub fn new() -> Self {
        Self {
            callbacks: Mutex::new(Vec::new()),
        }
    }

    pub fn add_callback(&self, callback: Arc<dyn PlayerCallback>) {
        self.callbacks.lock().push(callback);
    }

    pub fn clear_callbacks(&self) {
        self.callbacks.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.callbacks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver to every listener in registration order
    pub fn dispatch_event(&self, event: &TransitionEvent) {
        // Snapshot so a listener registering another one cannot deadlock
        let callbacks: Vec<_> = self.callbacks.lock().clone();
        for callback in callbacks.iter() {
            callback.on_event(event);
        }
    }
}

impl Default for CallbackManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Records every event, for tests
#[cfg(test)]
pub(crate) struct TestCallback {
    events: Mutex<Vec<TransitionEvent>>,
}

#[cfg(test)]
impl TestCallback {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn get_events(&self) -> Vec<TransitionEvent> {
        self.events.lock().clone()
    }

    pub fn player_events(&self) -> Vec<PlayerEvent> {
        self.events.lock().iter().map(|e| e.event).collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

#[cfg(test)]
impl PlayerCallback for TestCallback {
    fn on_event(&self, event: &TransitionEvent) {
        self.events.lock().push(*event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(ordinal: u64) -> TransitionEvent {
        TransitionEvent {
            from: PlayerState::Prepared,
            to: PlayerState::Started,
            trigger: Trigger::Command(Command::Start),
            ordinal,
            event: PlayerEvent::Started,
        }
    }

    #[test]
    fn test_dispatch_reaches_every_callback_in_order() {
        let manager = CallbackManager::new();
        let first = Arc::new(TestCallback::new());
        let second = Arc::new(TestCallback::new());
        manager.add_callback(first.clone());
        manager.add_callback(second.clone());

        manager.dispatch_event(&started(1));
        manager.dispatch_event(&started(2));

        let ordinals: Vec<u64> = first.get_events().iter().map(|e| e.ordinal).collect();
        assert_eq!(ordinals, vec![1, 2]);
        assert_eq!(second.get_events().len(), 2);
    }

    #[test]
    fn test_channel_callback_survives_dropped_receiver() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let callback = ChannelCallback::new(tx);
        callback.on_event(&started(1));
        assert_eq!(rx.try_recv().map(|e| e.event), Ok(PlayerEvent::Started));
        drop(rx);
        callback.on_event(&started(2));
    }

    #[test]
    fn test_clear_callbacks() {
        let manager = CallbackManager::new();
        let callback = Arc::new(TestCallback::new());
        manager.add_callback(callback.clone());
        manager.clear_callbacks();
        assert!(manager.is_empty());
        manager.dispatch_event(&started(1));
        assert!(callback.get_events().is_empty());
    }

    #[test]
    fn test_event_state_mapping() {
        assert_eq!(PlayerEvent::Error { code: 1, extra: 0 }.state(), PlayerState::Error);
        assert_eq!(PlayerEvent::SeekCompleted.state(), PlayerState::SeekCompleted);
        assert_eq!(PlayerEvent::Stopped.state(), PlayerState::Stopped);
    }
}
