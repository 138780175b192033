// Playback state controller
//
// Owns the session, validates commands against the state table, drives the
// engine and turns engine notifications into transitions. Every transition
// produces exactly one TransitionEvent, dispatched on the owner thread.

use crate::callback::{
    CallbackManager, ChannelCallback, PlayerCallback, PlayerEvent, TransitionEvent, Trigger,
};
use crate::config::ControllerConfig;
use crate::engine::{Engine, Notification, NotificationKind, Notifier};
use crate::error::{EngineError, PlayerError, Result};
use crate::source::SourceKind;
use crate::state::{Command, Pending, PlaybackSession, PlayerState};
use crossbeam_channel::{Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub struct PlaybackController {
    engine: Box<dyn Engine>,
    session: PlaybackSession,
    callbacks: CallbackManager,
    config: ControllerConfig,
    tx: Sender<Notification>,
    rx: Receiver<Notification>,
    ordinal: u64,
    released: bool,
}

impl PlaybackController {
    pub fn new(engine: impl Engine + 'static) -> Self {
        Self::with_config(engine, ControllerConfig::default())
    }

    pub fn with_config(engine: impl Engine + 'static, config: ControllerConfig) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            engine: Box::new(engine),
            session: PlaybackSession::new(),
            callbacks: CallbackManager::new(),
            config,
            tx,
            rx,
            ordinal: 0,
            released: false,
        }
    }

    pub fn add_callback(&self, callback: Arc<dyn PlayerCallback>) {
        self.callbacks.add_callback(callback);
    }

    /// Receive every future transition through a channel
    pub fn subscribe(&self) -> Receiver<TransitionEvent> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.callbacks.add_callback(Arc::new(ChannelCallback::new(tx)));
        rx
    }

    /// Engine notifications not yet applied; usable in `select!` before
    /// calling `pump`.
    pub fn notifications(&self) -> &Receiver<Notification> {
        &self.rx
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn state(&self) -> PlayerState {
        self.session.state
    }

    pub fn data_source(&self) -> Option<&str> {
        self.session.data_source.as_ref().map(|source| source.locator())
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Current position in milliseconds, `0` until prepared
    pub fn current_position(&self) -> u64 {
        if self.released || !self.session.state.is_prepared() {
            return 0;
        }
        self.engine.position_ms().min(self.duration())
    }

    /// Duration in milliseconds, `0` until prepared
    pub fn duration(&self) -> u64 {
        if self.released || !self.session.state.is_prepared() {
            return 0;
        }
        self.session.duration_ms.unwrap_or(0)
    }

    pub fn set_data_source(&mut self, locator: &str) -> Result<()> {
        self.check(Command::SetDataSource)?;
        let source = SourceKind::classify(locator)?;
        self.session.data_source = Some(source);
        Ok(())
    }

    /// Ask the engine to prepare the bound source; the outcome arrives as
    /// `Prepared` or `Error` on a later `pump`.
    pub fn prepare_async(&mut self) -> Result<()> {
        self.begin_prepare(Command::PrepareAsync)
    }

    /// Prepare the bound source and block until the engine has answered
    ///
    /// Other notifications that arrive in the meantime are applied in order.
    pub fn prepare(&mut self) -> Result<()> {
        self.begin_prepare(Command::Prepare)?;
        while self.session.state == PlayerState::Preparing {
            // The controller holds a sender, so the queue never disconnects
            match self.rx.recv() {
                Ok(notification) => {
                    self.apply(notification);
                }
                Err(_) => break,
            }
        }
        Ok(())
    }

    pub fn start(&mut self) -> Result<()> {
        self.check(Command::Start)?;
        self.run_start(Trigger::Command(Command::Start));
        Ok(())
    }

    pub fn resume(&mut self) -> Result<()> {
        self.check(Command::Resume)?;
        self.run_start(Trigger::Command(Command::Resume));
        Ok(())
    }

    pub fn pause(&mut self) -> Result<()> {
        self.check(Command::Pause)?;
        let trigger = Trigger::Command(Command::Pause);
        match self.engine.pause() {
            Ok(()) => self.emit(PlayerEvent::Paused, trigger),
            Err(err) => self.fail(err, trigger),
        }
        Ok(())
    }

    /// Seek to `position_ms`, which must lie in `[0, duration)`
    pub fn seek_to(&mut self, position_ms: i64) -> Result<()> {
        self.check(Command::SeekTo)?;
        let duration_ms = self.session.duration_ms.unwrap_or(0);
        if position_ms < 0 || position_ms as u64 >= duration_ms {
            return Err(PlayerError::InvalidSeekTarget {
                target_ms: position_ms,
                duration_ms,
            });
        }

        let from_paused = match self.session.state {
            PlayerState::Paused => true,
            PlayerState::SeekCompleted => self.session.paused_at_seek,
            _ => false,
        };
        self.session.pending = Some(Pending::Seek { from_paused });
        if let Err(err) = self.engine.seek(position_ms as u64) {
            self.session.pending = None;
            self.fail(err, Trigger::Command(Command::SeekTo));
        }
        Ok(())
    }

    /// Stop playback and keep the source bound so it can be prepared again
    pub fn stop(&mut self) -> Result<()> {
        self.check(Command::Stop)?;
        let from = self.session.state;
        if from != PlayerState::Error {
            self.engine.stop();
        }
        self.session.stop();
        self.emit_from(from, PlayerEvent::Stopped, Trigger::Command(Command::Stop));
        Ok(())
    }

    /// Cancel everything in flight and return to `Idle`
    pub fn reset(&mut self) -> Result<()> {
        self.check(Command::Reset)?;
        self.reset_session(Trigger::Command(Command::Reset));
        Ok(())
    }

    /// Tear down the engine; idempotent, nothing is accepted afterwards
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        if self.session.state != PlayerState::Idle || self.session.data_source.is_some() {
            self.reset_session(Trigger::Command(Command::Release));
        }
        self.engine.release();
        self.callbacks.clear_callbacks();
        self.released = true;
    }

    /// Apply every queued engine notification without blocking
    ///
    /// Returns how many notifications caused a transition; stale ones are
    /// dropped silently.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(notification) = self.rx.try_recv() {
            if self.apply(notification) {
                applied += 1;
            }
        }
        applied
    }

    /// Wait up to `timeout` for a notification, then drain the queue
    pub fn pump_timeout(&mut self, timeout: Duration) -> usize {
        match self.rx.recv_timeout(timeout) {
            Ok(notification) => usize::from(self.apply(notification)) + self.pump(),
            Err(_) => 0,
        }
    }

    /// Pump until `done` holds for the current state or `timeout` passes
    pub fn pump_until(&mut self, timeout: Duration, done: impl Fn(PlayerState) -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.pump();
            if done(self.session.state) {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            self.pump_timeout(deadline - now);
        }
    }

    fn check(&self, command: Command) -> Result<()> {
        if self.released {
            return Err(PlayerError::Released);
        }
        self.session.validate(command)
    }

    fn begin_prepare(&mut self, command: Command) -> Result<()> {
        self.check(command)?;
        let source = match &self.session.data_source {
            Some(source) => source.clone(),
            None => {
                return Err(PlayerError::InvalidState {
                    command,
                    state: self.session.state,
                })
            }
        };

        self.session.state = PlayerState::Preparing;
        self.session.pending = Some(Pending::Prepare);
        let notifier = Notifier::new(self.session.generation, self.tx.clone());
        if let Err(err) = self.engine.prepare(&source, notifier) {
            self.fail(err, Trigger::Command(command));
        }
        Ok(())
    }

    fn run_start(&mut self, trigger: Trigger) {
        match self.engine.start() {
            Ok(()) => self.emit(PlayerEvent::Started, trigger),
            Err(err) => self.fail(err, trigger),
        }
    }

    fn apply(&mut self, notification: Notification) -> bool {
        if self.released || notification.generation != self.session.generation {
            return false;
        }

        match notification.kind {
            NotificationKind::Prepared { duration_ms } => {
                if self.session.state != PlayerState::Preparing {
                    return false;
                }
                self.session.pending = None;
                self.session.duration_ms = Some(duration_ms);
                self.emit(PlayerEvent::Prepared, Trigger::PrepareDone);
            }
            NotificationKind::SeekCompleted => {
                let from_paused = match self.session.pending {
                    Some(Pending::Seek { from_paused }) => from_paused,
                    _ => return false,
                };
                self.session.pending = None;
                self.session.paused_at_seek = from_paused;
                self.emit(PlayerEvent::SeekCompleted, Trigger::SeekDone);
                if self.config.auto_resume_after_seek && !from_paused {
                    self.run_start(Trigger::AutoResume);
                }
            }
            NotificationKind::EndOfStream => {
                if self.session.state != PlayerState::Started {
                    return false;
                }
                self.session.pending = None;
                self.emit(PlayerEvent::Completed, Trigger::EndOfStream);
                if self.config.reset_on_completion {
                    self.reset_session(Trigger::AutoReset);
                }
            }
            NotificationKind::Failed(err) => {
                // One error per session
                if matches!(
                    self.session.state,
                    PlayerState::Idle | PlayerState::Stopped | PlayerState::Error
                ) {
                    return false;
                }
                self.fail(err, Trigger::EngineFailure);
            }
        }
        true
    }

    fn fail(&mut self, err: EngineError, trigger: Trigger) {
        self.session.pending = None;
        self.emit(
            PlayerEvent::Error {
                code: err.code(),
                extra: err.extra,
            },
            trigger,
        );
        if self.config.reset_on_error {
            self.reset_session(Trigger::AutoReset);
        }
    }

    fn reset_session(&mut self, trigger: Trigger) {
        let from = self.session.state;
        self.engine.reset();
        self.session.renew();
        self.emit_from(from, PlayerEvent::Idle, trigger);
    }

    fn emit(&mut self, event: PlayerEvent, trigger: Trigger) {
        self.emit_from(self.session.state, event, trigger);
    }

    fn emit_from(&mut self, from: PlayerState, event: PlayerEvent, trigger: Trigger) {
        let to = event.state();
        self.session.state = to;
        self.ordinal += 1;
        let transition = TransitionEvent {
            from,
            to,
            trigger,
            ordinal: self.ordinal,
            event,
        };
        self.callbacks.dispatch_event(&transition);
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.release();
    }
}
