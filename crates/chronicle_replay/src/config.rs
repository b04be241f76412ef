//! Session configuration.

/// Environment variable that enables recording
pub const RECORD_ENV: &str = "CHRONICLE_RECORD";

/// Configuration for a recording session.
///
/// Recording defaults to disabled; hosts opt in either explicitly
/// or through the `CHRONICLE_RECORD` environment variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecorderConfig {
    /// Whether registered listeners append to the log
    pub enabled: bool,
}

impl RecorderConfig {
    /// Configuration with recording off
    #[must_use]
    pub const fn new() -> Self {
        Self { enabled: false }
    }

    /// Set the enabled flag
    #[must_use]
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Read the enabled flag from `CHRONICLE_RECORD`.
    /// "1" or "true" (any case) enables; anything else disables.
    #[must_use]
    pub fn from_env() -> Self {
        let enabled = std::env::var(RECORD_ENV)
            .map(|v| {
                let v = v.trim();
                v == "1" || v.eq_ignore_ascii_case("true")
            })
            .unwrap_or(false);
        Self { enabled }
    }
}
