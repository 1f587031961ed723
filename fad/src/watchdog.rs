//! SoC watchdog emulation.
//!
//! The hardware counts in half-second ticks and cannot be stopped once started, so a
//! disable request programs the longest timeout and hands servicing to a periodic kick
//! task. An enabled watchdog is serviced only by the application.

use core::sync::atomic::{AtomicBool, Ordering};

use fad_api::WatchdogConfig;

use crate::{device::FadDevice, error::FadResult, hal::PeriodicTask};

pub const WDOG_TICK_MS: u32 = 500;
pub const WDOG_MAX_TICKS: u8 = u8::MAX;

/// Convert a timeout to ticks, clamped to `1..=255`.
pub fn timeout_to_ticks(timeout_ms: u32) -> u8 {
    (timeout_ms / WDOG_TICK_MS).clamp(1, WDOG_MAX_TICKS as u32) as u8
}

pub(crate) struct WatchdogState {
    /// Set while a disable request is being emulated.
    self_kicking: AtomicBool,
    kicker_started: AtomicBool,
}

impl WatchdogState {
    pub(crate) const fn new() -> WatchdogState {
        WatchdogState {
            self_kicking: AtomicBool::new(false),
            kicker_started: AtomicBool::new(false),
        }
    }
}

impl FadDevice {
    pub(crate) fn enable_watchdog(&self, cfg: WatchdogConfig) -> FadResult<()> {
        let ticks = if cfg.enable {
            let timeout_ms = match cfg.time_ms {
                0 => self.config.watchdog_default_timeout_ms,
                ms => ms as u32,
            };
            timeout_to_ticks(timeout_ms)
        } else {
            log::info!("watchdog cannot be stopped, programming the longest timeout");
            WDOG_MAX_TICKS
        };
        self.with_board(|b| b.watchdog_init(ticks))?;
        self.watchdog.self_kicking.store(!cfg.enable, Ordering::Release);
        log::info!("watchdog armed with {} ticks", ticks);

        if !cfg.enable && !self.watchdog.kicker_started.swap(true, Ordering::AcqRel) {
            self.platform
                .start_periodic(PeriodicTask::WatchdogKick, self.config.watchdog_kick_period_ms);
        }
        Ok(())
    }

    pub(crate) fn service_watchdog(&self) -> FadResult<()> {
        self.with_board(|b| b.watchdog_service())
    }

    /// Called by the periodic kick task. Services the watchdog only while it is emulating
    /// the disabled state.
    pub fn watchdog_tick(&self) {
        if !self.watchdog.self_kicking.load(Ordering::Acquire) {
            return;
        }
        if let Err(err) = self.service_watchdog() {
            log::warn!("watchdog kick failed: {}", err);
        }
    }
}
