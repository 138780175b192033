// Button-driven host around a playback controller
//
// The host never owns playback state: it caches the last state it was told
// about and resynchronises on every event.

use crossbeam_channel::Receiver;
use liteplay_core::{
    Notification, PlaybackController, PlayerEvent, PlayerState, Result, TransitionEvent,
};
pub struct DemoHost {
    controller: PlaybackController,
    events: Receiver<TransitionEvent>,
    locator: String,
    seek_step_ms: u64,
    status: PlayerState,
    label: String,
}

impl DemoHost {
    pub fn new(
        controller: PlaybackController,
        locator: impl Into<String>,
        seek_step_ms: u64,
    ) -> Self {
        let events = controller.subscribe();
        let status = controller.state();
        Self {
            controller,
            events,
            locator: locator.into(),
            seek_step_ms,
            status,
            label: status_label(status),
        }
    }

    /// Last state reported by the controller
    pub fn status(&self) -> PlayerState {
        self.status
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn position(&self) -> u64 {
        self.controller.current_position()
    }

    pub fn duration(&self) -> u64 {
        self.controller.duration()
    }

    pub fn notifications(&self) -> &Receiver<Notification> {
        self.controller.notifications()
    }

    /// Prepare from idle, or resume a paused or freshly seeked player
    pub fn on_start_click(&mut self) -> Result<()> {
        let result = match self.status {
            PlayerState::Idle => {
                log::info!("[host] preparing {}", self.locator);
                self.controller
                    .set_data_source(&self.locator)
                    .and_then(|_| self.controller.prepare_async())
            }
            PlayerState::Paused | PlayerState::SeekCompleted => self.controller.resume(),
            _ => self.controller.start(),
        };
        self.drain_events();
        result
    }

    pub fn on_pause_click(&mut self) -> Result<()> {
        let result = self.controller.pause();
        self.drain_events();
        result
    }

    /// Jump ahead by the seek step; returns whether a seek was issued
    pub fn on_seek_click(&mut self) -> Result<bool> {
        let target = self.controller.current_position() + self.seek_step_ms;
        let duration = self.controller.duration();
        if target >= duration {
            log::error!(
                "[host] seek failed: target {} ms is beyond duration {} ms",
                target,
                duration
            );
            return Ok(false);
        }

        let result = self.controller.seek_to(target as i64);
        self.drain_events();
        result.map(|_| true)
    }

    /// Reset unless already idle
    ///
    /// Checks the controller rather than the cached status: entering
    /// `Preparing` emits no event, so the cache still reads `Idle` then.
    pub fn on_stop_click(&mut self) -> Result<()> {
        if self.controller.state() == PlayerState::Idle {
            return Ok(());
        }
        let result = self.controller.reset();
        self.drain_events();
        result
    }

    /// Apply whatever notifications are already queued
    pub fn poll(&mut self) -> usize {
        let applied = self.controller.pump();
        self.drain_events();
        applied
    }

    pub fn release(&mut self) {
        self.controller.release();
        self.drain_events();
    }

    fn drain_events(&mut self) {
        while let Ok(transition) = self.events.try_recv() {
            self.on_event(&transition);
        }
    }

    fn on_event(&mut self, transition: &TransitionEvent) {
        self.status = transition.to;
        self.label = status_label(transition.to);
        log::debug!(
            "[host] {} -> {} ({:?})",
            transition.from.label(),
            transition.to.label(),
            transition.trigger
        );

        match transition.event {
            PlayerEvent::Prepared => {
                log::info!("[host] prepared, duration {} ms", self.controller.duration());
                if let Err(err) = self.controller.start() {
                    log::error!("[host] start after prepare failed: {}", err);
                }
            }
            PlayerEvent::Completed => log::info!("[host] playback completed"),
            PlayerEvent::Error { code, extra } => {
                log::error!("[host] playback error code={} extra={}", code, extra)
            }
            _ => {}
        }
    }
}

fn status_label(state: PlayerState) -> String {
    format!("Status: {}", state.label())
}

#[cfg(test)]
mod tests {
    use super::*;
    use liteplay_engine::fixtures::{temp_path, write_silent_wav};
    use liteplay_engine::{ClockEngine, EngineConfig};
    use std::thread;
    use std::time::{Duration, Instant};

    fn settle(host: &mut DemoHost) -> usize {
        thread::sleep(Duration::from_millis(10));
        host.poll()
    }

    fn host_for(name: &str, duration_ms: u64) -> DemoHost {
        let path = temp_path(name);
        write_silent_wav(&path, 8_000, duration_ms).unwrap();
        let engine = ClockEngine::with_config(
            EngineConfig::default()
                .with_tick(Duration::from_millis(5))
                .with_seek_align_ms(1),
        );
        DemoHost::new(
            PlaybackController::new(engine),
            path.to_string_lossy().to_string(),
            10_000,
        )
    }

    fn pump_until(host: &mut DemoHost, state: PlayerState) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            settle(host);
            if host.status() == state {
                return true;
            }
        }
        false
    }

    #[test]
    fn test_start_click_prepares_and_autostarts() {
        let mut host = host_for("host-start.wav", 20_000);
        assert_eq!(host.label(), "Status: Idle");

        host.on_start_click().unwrap();
        assert!(pump_until(&mut host, PlayerState::Started));
        assert_eq!(host.label(), "Status: Started");
        assert_eq!(host.duration(), 20_000);
    }

    #[test]
    fn test_button_walkthrough() {
        let mut host = host_for("host-walkthrough.wav", 20_000);
        host.on_start_click().unwrap();
        assert!(pump_until(&mut host, PlayerState::Started));

        host.on_pause_click().unwrap();
        assert_eq!(host.status(), PlayerState::Paused);

        // Seeking while paused does not resume
        assert!(host.on_seek_click().unwrap());
        assert!(pump_until(&mut host, PlayerState::SeekCompleted));
        thread::sleep(Duration::from_millis(50));
        host.poll();
        assert_eq!(host.status(), PlayerState::SeekCompleted);
        assert!(host.position() >= 10_000);

        host.on_start_click().unwrap();
        assert_eq!(host.status(), PlayerState::Started);

        // Another step would land past the end
        assert!(!host.on_seek_click().unwrap());
        assert_eq!(host.status(), PlayerState::Started);

        host.on_stop_click().unwrap();
        assert_eq!(host.status(), PlayerState::Idle);
        host.on_stop_click().unwrap();
        assert_eq!(host.status(), PlayerState::Idle);
    }

    #[test]
    fn test_missing_file_ends_idle() {
        let path = temp_path("host-missing.mp3");
        let mut host = DemoHost::new(
            PlaybackController::new(ClockEngine::new()),
            path.to_string_lossy().to_string(),
            10_000,
        );
        host.on_start_click().unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut applied = 0;
        while applied == 0 && Instant::now() < deadline {
            applied = settle(&mut host);
        }
        assert_eq!(applied, 1);
        assert_eq!(host.status(), PlayerState::Idle);
    }

    #[test]
    fn test_stop_click_cancels_prepare() {
        let mut host = host_for("host-cancel.wav", 20_000);
        host.on_start_click().unwrap();
        assert_eq!(host.status(), PlayerState::Idle);

        host.on_stop_click().unwrap();
        thread::sleep(Duration::from_millis(100));
        assert_eq!(host.poll(), 0);
        assert_eq!(host.status(), PlayerState::Idle);
        assert_eq!(host.duration(), 0);
    }

    #[test]
    fn test_pause_in_idle_is_rejected() {
        let mut host = host_for("host-idle.wav", 1_000);
        assert!(host.on_pause_click().is_err());
        assert_eq!(host.status(), PlayerState::Idle);
    }
}
