// Wall-clock playback position

use std::time::Instant;

/// Tracks where playback is without rendering anything
///
/// Position advances in real time while started and is frozen otherwise.
#[derive(Debug, Clone, Default)]
pub struct PlaybackClock {
    base_ms: u64,
    started_at: Option<Instant>,
    duration_ms: u64,
}

impl PlaybackClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a freshly prepared track
    pub fn load(&mut self, duration_ms: u64) {
        self.base_ms = 0;
        self.started_at = None;
        self.duration_ms = duration_ms;
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn start(&mut self) {
        self.start_at(Instant::now());
    }

    pub fn pause(&mut self) {
        self.pause_at(Instant::now());
    }

    pub fn position_ms(&self) -> u64 {
        self.position_at(Instant::now())
    }

    /// Jump to `position_ms`; the clock stops until started again
    pub fn seek(&mut self, position_ms: u64) {
        self.base_ms = position_ms.min(self.duration_ms);
        self.started_at = None;
    }

    /// Running and out of media
    pub fn at_end(&self) -> bool {
        self.at_end_at(Instant::now())
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn start_at(&mut self, now: Instant) {
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
    }

    fn pause_at(&mut self, now: Instant) {
        self.base_ms = self.position_at(now);
        self.started_at = None;
    }

    fn position_at(&self, now: Instant) -> u64 {
        let elapsed = self
            .started_at
            .map(|started| now.saturating_duration_since(started).as_millis() as u64)
            .unwrap_or(0);
        (self.base_ms + elapsed).min(self.duration_ms)
    }

    fn at_end_at(&self, now: Instant) -> bool {
        self.is_running() && self.duration_ms > 0 && self.position_at(now) >= self.duration_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_position_advances_only_while_started() {
        let t0 = Instant::now();
        let mut clock = PlaybackClock::new();
        clock.load(10_000);
        assert_eq!(clock.position_at(t0 + Duration::from_millis(500)), 0);

        clock.start_at(t0);
        assert_eq!(clock.position_at(t0 + Duration::from_millis(1_200)), 1_200);

        clock.pause_at(t0 + Duration::from_millis(1_500));
        assert_eq!(clock.position_at(t0 + Duration::from_millis(9_000)), 1_500);

        clock.start_at(t0 + Duration::from_millis(2_000));
        assert_eq!(clock.position_at(t0 + Duration::from_millis(2_250)), 1_750);
    }

    #[test]
    fn test_position_never_exceeds_duration() {
        let t0 = Instant::now();
        let mut clock = PlaybackClock::new();
        clock.load(1_000);
        clock.start_at(t0);
        assert_eq!(clock.position_at(t0 + Duration::from_secs(5)), 1_000);
        assert!(clock.at_end_at(t0 + Duration::from_secs(5)));
        assert!(!clock.at_end_at(t0 + Duration::from_millis(999)));
    }

    #[test]
    fn test_seek_stops_clock() {
        let t0 = Instant::now();
        let mut clock = PlaybackClock::new();
        clock.load(10_000);
        clock.start_at(t0);
        clock.seek(4_000);
        assert!(!clock.is_running());
        assert_eq!(clock.position_at(t0 + Duration::from_secs(3)), 4_000);
        assert!(!clock.at_end_at(t0 + Duration::from_secs(30)));
    }

    #[test]
    fn test_start_twice_keeps_origin() {
        let t0 = Instant::now();
        let mut clock = PlaybackClock::new();
        clock.load(10_000);
        clock.start_at(t0);
        clock.start_at(t0 + Duration::from_millis(300));
        assert_eq!(clock.position_at(t0 + Duration::from_millis(400)), 400);
    }
}
