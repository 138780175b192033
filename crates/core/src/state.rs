// Playback state, commands and the per-session record

use crate::error::{PlayerError, Result};
use crate::source::SourceKind;

/// Player state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerState {
    /// No media prepared
    Idle,
    /// prepare_async issued, engine still working
    Preparing,
    /// Media is prepared and ready to start
    Prepared,
    /// Playback running
    Started,
    /// Playback paused
    Paused,
    /// Seek finished, playback not running
    SeekCompleted,
    /// Stream reached its end
    Completed,
    /// Playback stopped, the source stays bound
    Stopped,
    /// Engine reported a failure
    Error,
}

impl PlayerState {
    /// Numeric state code exposed to native hosts
    pub fn code(self) -> i32 {
        match self {
            PlayerState::Idle => 0x00,
            PlayerState::Preparing => 0x01,
            PlayerState::Prepared => 0x02,
            PlayerState::Started => 0x03,
            PlayerState::Paused => 0x04,
            PlayerState::SeekCompleted => 0x05,
            PlayerState::Completed => 0x08,
            PlayerState::Stopped => 0x09,
            PlayerState::Error => 0x0A,
        }
    }

    /// Whether duration and position are meaningful
    pub fn is_prepared(self) -> bool {
        matches!(
            self,
            PlayerState::Prepared
                | PlayerState::Started
                | PlayerState::Paused
                | PlayerState::SeekCompleted
                | PlayerState::Completed
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            PlayerState::Idle => "Idle",
            PlayerState::Preparing => "Preparing",
            PlayerState::Prepared => "Prepared",
            PlayerState::Started => "Started",
            PlayerState::Paused => "Paused",
            PlayerState::SeekCompleted => "SeekCompleted",
            PlayerState::Completed => "Completed",
            PlayerState::Stopped => "Stopped",
            PlayerState::Error => "Error",
        }
    }
}

/// Commands a host can issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    SetDataSource,
    Prepare,
    PrepareAsync,
    Start,
    Pause,
    Resume,
    SeekTo,
    Stop,
    Reset,
    Release,
}

/// Asynchronous operation the engine is still working on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pending {
    Prepare,
    Seek {
        /// Playback was paused when the seek was issued
        from_paused: bool,
    },
}

/// One bound media source and its playback state
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    pub state: PlayerState,
    pub data_source: Option<SourceKind>,
    pub duration_ms: Option<u64>,
    /// Session identity, bumped on every reset
    pub generation: u64,
    pub pending: Option<Pending>,
    /// Playback was paused when the current `SeekCompleted` was reached
    pub paused_at_seek: bool,
}

impl PlaybackSession {
    pub fn new() -> Self {
        Self {
            state: PlayerState::Idle,
            data_source: None,
            duration_ms: None,
            generation: 0,
            pending: None,
            paused_at_seek: false,
        }
    }

    /// Drop everything bound to the current session and start a new one
    pub fn renew(&mut self) {
        let generation = self.generation.wrapping_add(1);
        *self = Self::new();
        self.generation = generation;
    }

    /// End the playback of this session but keep its source bound
    pub fn stop(&mut self) {
        let data_source = self.data_source.take();
        self.renew();
        self.data_source = data_source;
    }

    /// Check a command against the state table
    ///
    /// A pending seek blocks every playback command until it lands.
    pub fn validate(&self, command: Command) -> Result<()> {
        let seeking = matches!(self.pending, Some(Pending::Seek { .. }));
        let allowed = match (command, self.state) {
            (Command::Reset, _) | (Command::Release, _) => true,

            (Command::SetDataSource, PlayerState::Idle) => self.data_source.is_none(),
            (Command::Prepare, PlayerState::Idle)
            | (Command::Prepare, PlayerState::Stopped)
            | (Command::PrepareAsync, PlayerState::Idle)
            | (Command::PrepareAsync, PlayerState::Stopped) => self.data_source.is_some(),

            (Command::Start, PlayerState::Prepared)
            | (Command::Start, PlayerState::Paused)
            | (Command::Start, PlayerState::SeekCompleted) => !seeking,

            (Command::Pause, PlayerState::Started) => !seeking,

            (Command::Resume, PlayerState::Paused)
            | (Command::Resume, PlayerState::SeekCompleted) => !seeking,

            (Command::SeekTo, PlayerState::Started)
            | (Command::SeekTo, PlayerState::Paused)
            | (Command::SeekTo, PlayerState::SeekCompleted) => !seeking,

            // Cancels a pending seek as well
            (Command::Stop, state) => state.is_prepared() || state == PlayerState::Error,

            _ => false,
        };

        if allowed {
            Ok(())
        } else {
            Err(PlayerError::InvalidState {
                command,
                state: self.state,
            })
        }
    }
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STATES: [PlayerState; 9] = [
        PlayerState::Idle,
        PlayerState::Preparing,
        PlayerState::Prepared,
        PlayerState::Started,
        PlayerState::Paused,
        PlayerState::SeekCompleted,
        PlayerState::Completed,
        PlayerState::Stopped,
        PlayerState::Error,
    ];

    fn session_in(state: PlayerState) -> PlaybackSession {
        let mut session = PlaybackSession::new();
        session.state = state;
        if state != PlayerState::Idle {
            session.data_source = Some(SourceKind::File("a.mp3".to_string()));
        }
        session
    }

    #[test]
    fn test_reset_and_release_always_allowed() {
        for state in ALL_STATES {
            let session = session_in(state);
            assert!(session.validate(Command::Reset).is_ok());
            assert!(session.validate(Command::Release).is_ok());
        }
    }

    #[test]
    fn test_pause_only_from_started() {
        for state in ALL_STATES {
            let result = session_in(state).validate(Command::Pause);
            assert_eq!(result.is_ok(), state == PlayerState::Started, "{:?}", state);
        }
    }

    #[test]
    fn test_start_states() {
        for state in ALL_STATES {
            let expected = matches!(
                state,
                PlayerState::Prepared | PlayerState::Paused | PlayerState::SeekCompleted
            );
            assert_eq!(session_in(state).validate(Command::Start).is_ok(), expected);
        }
    }

    #[test]
    fn test_prepare_needs_bound_source() {
        let mut session = PlaybackSession::new();
        assert_eq!(
            session.validate(Command::PrepareAsync),
            Err(PlayerError::InvalidState {
                command: Command::PrepareAsync,
                state: PlayerState::Idle,
            })
        );
        session.data_source = Some(SourceKind::File("a.mp3".to_string()));
        assert!(session.validate(Command::PrepareAsync).is_ok());
        assert!(session.validate(Command::SetDataSource).is_err());
    }

    #[test]
    fn test_pending_seek_blocks_playback_commands() {
        let mut session = session_in(PlayerState::Started);
        session.pending = Some(Pending::Seek { from_paused: false });
        assert!(session.validate(Command::Pause).is_err());
        assert!(session.validate(Command::SeekTo).is_err());
        assert!(session.validate(Command::Reset).is_ok());
    }

    #[test]
    fn test_renew_bumps_generation() {
        let mut session = session_in(PlayerState::Started);
        session.duration_ms = Some(1000);
        session.renew();
        assert_eq!(session.state, PlayerState::Idle);
        assert_eq!(session.data_source, None);
        assert_eq!(session.duration_ms, None);
        assert_eq!(session.generation, 1);
    }

    #[test]
    fn test_stop_states() {
        for state in ALL_STATES {
            let expected = !matches!(
                state,
                PlayerState::Idle | PlayerState::Preparing | PlayerState::Stopped
            );
            assert_eq!(
                session_in(state).validate(Command::Stop).is_ok(),
                expected,
                "{:?}",
                state
            );
        }
    }

    #[test]
    fn test_prepare_again_after_stop() {
        let session = session_in(PlayerState::Stopped);
        assert!(session.validate(Command::PrepareAsync).is_ok());
        assert!(session.validate(Command::Prepare).is_ok());
        assert!(session.validate(Command::SetDataSource).is_err());
        assert!(session.validate(Command::Start).is_err());
    }

    #[test]
    fn test_stop_keeps_source() {
        let mut session = session_in(PlayerState::Started);
        session.duration_ms = Some(1000);
        session.pending = Some(Pending::Seek { from_paused: true });
        session.stop();
        assert_eq!(session.data_source, Some(SourceKind::File("a.mp3".to_string())));
        assert_eq!(session.duration_ms, None);
        assert_eq!(session.pending, None);
        assert_eq!(session.generation, 1);
    }
}
