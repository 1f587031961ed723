//! Runtime configuration.
//!
//! Defaults are the compiled-in values of `fad_config`; the embedding kernel (or a test) may
//! override individual fields before attach.

use fad_config as flags;

use crate::board::keypad::KeypadLevels;

/// Longest the power sequencer may wait for the application's acknowledgment.
pub const MAX_SUSPEND_ACK_TIMEOUT_MS: u32 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FadConfig {
    /// Suspend acknowledgment wait, capped at [MAX_SUSPEND_ACK_TIMEOUT_MS].
    pub suspend_ack_timeout_ms: u32,
    /// Initial value of the `standby_off_minutes` attribute.
    pub standby_off_minutes: u32,
    /// Initial value of the `standby_on_minutes` attribute.
    pub standby_on_minutes: u32,
    pub edid_poll_interval_ms: u32,
    pub edid_poll_retries: u32,
    pub watchdog_default_timeout_ms: u32,
    pub watchdog_kick_period_ms: u32,
    /// Keypad levels used when the board configuration does not provide its own.
    pub keypad_levels: KeypadLevels,
}

impl FadConfig {
    pub fn ack_timeout_ms(&self) -> u32 {
        self.suspend_ack_timeout_ms.min(MAX_SUSPEND_ACK_TIMEOUT_MS)
    }
}

impl Default for FadConfig {
    fn default() -> Self {
        FadConfig {
            suspend_ack_timeout_ms: flags::SUSPEND_ACK_TIMEOUT_MS,
            standby_off_minutes: flags::STANDBY_OFF_MINUTES,
            standby_on_minutes: flags::STANDBY_ON_MINUTES,
            edid_poll_interval_ms: flags::EDID_POLL_INTERVAL_MS,
            edid_poll_retries: flags::EDID_POLL_RETRIES,
            watchdog_default_timeout_ms: flags::WATCHDOG_DEFAULT_TIMEOUT_MS,
            watchdog_kick_period_ms: flags::WATCHDOG_KICK_PERIOD_MS,
            keypad_levels: KeypadLevels {
                low: flags::KEYPAD_BL_LOW as u8,
                medium: flags::KEYPAD_BL_MEDIUM as u8,
                high: flags::KEYPAD_BL_HIGH as u8,
            },
        }
    }
}
