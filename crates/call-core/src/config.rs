//! Call manager configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How long a keypad DTMF tone plays before the stop signal is scheduled.
pub const DIALPAD_TONE_LENGTH: Duration = Duration::from_millis(150);

/// Default cap on consecutive automatic redial attempts.
pub const MAX_AUTO_REDIAL_ATTEMPTS: u32 = 3;

/// Tuning knobs for [`CallManager`](crate::manager::CallManager).
///
/// # Examples
///
/// ```rust
/// use dialtone_call_core::CallManagerConfig;
///
/// let config = CallManagerConfig::new()
///     .with_auto_redial(true)
///     .with_max_auto_redial_attempts(5);
///
/// assert!(config.auto_redial_enabled);
/// assert_eq!(config.max_auto_redial_attempts, 5);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallManagerConfig {
    /// Whether dropped outgoing calls are automatically re-placed.
    pub auto_redial_enabled: bool,
    /// Cap on consecutive automatic redial attempts.
    pub max_auto_redial_attempts: u32,
    /// How long a keypad DTMF tone plays before the stop signal is sent.
    pub dtmf_tone_length: Duration,
}

impl CallManagerConfig {
    /// Create a configuration with defaults: auto-redial off, three
    /// attempts, the standard dialpad tone length.
    pub fn new() -> Self {
        Self {
            auto_redial_enabled: false,
            max_auto_redial_attempts: MAX_AUTO_REDIAL_ATTEMPTS,
            dtmf_tone_length: DIALPAD_TONE_LENGTH,
        }
    }

    /// Set whether auto-redial starts out enabled.
    pub fn with_auto_redial(mut self, enabled: bool) -> Self {
        self.auto_redial_enabled = enabled;
        self
    }

    /// Set the auto-redial attempt cap.
    pub fn with_max_auto_redial_attempts(mut self, attempts: u32) -> Self {
        self.max_auto_redial_attempts = attempts;
        self
    }

    /// Set the DTMF tone length.
    pub fn with_dtmf_tone_length(mut self, length: Duration) -> Self {
        self.dtmf_tone_length = length;
        self
    }
}

impl Default for CallManagerConfig {
    fn default() -> Self {
        Self::new()
    }
}
