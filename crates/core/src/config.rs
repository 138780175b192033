// Controller policy switches

/// Policies applied by the controller on top of the state table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Start again after a seek unless playback was paused when it was issued
    pub auto_resume_after_seek: bool,
    /// Reset to `Idle` right after reporting an engine error
    pub reset_on_error: bool,
    /// Reset to `Idle` right after reporting completion
    pub reset_on_completion: bool,
}

impl ControllerConfig {
    pub fn with_auto_resume_after_seek(mut self, enabled: bool) -> Self {
        self.auto_resume_after_seek = enabled;
        self
    }

    pub fn with_reset_on_error(mut self, enabled: bool) -> Self {
        self.reset_on_error = enabled;
        self
    }

    pub fn with_reset_on_completion(mut self, enabled: bool) -> Self {
        self.reset_on_completion = enabled;
        self
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            auto_resume_after_seek: true,
            reset_on_error: true,
            reset_on_completion: true,
        }
    }
}
