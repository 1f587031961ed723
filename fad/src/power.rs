//! Standby and power sequencing.
//!
//! Before the system suspends, user space is told a standby is coming and must acknowledge
//! within the configured time or the suspend is vetoed. While suspended, an optional
//! countdown alarm bounds the time spent in standby; a wake caused by that alarm turns the
//! camera off unless it is charging.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use fad_api::FadEvent;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use spin::Mutex;

use crate::{
    board::Capabilities,
    config::FadConfig,
    device::FadDevice,
    error::{FadError, FadResult},
    hal::{Cancellation, Notification, WaitChannel, WakeSource},
};

const MS_PER_MINUTE: u64 = 60_000;

/// Battery charge state as reported by the power supply driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u32)]
pub enum ChargeState {
    Unknown = 0,
    Discharging = 1,
    Charging = 2,
    Full = 3,
}

/// Why the system came back from standby.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeReason {
    Unknown,
    Button,
    Cable,
    /// The standby countdown ran out.
    StandbyExpired,
}

pub(crate) struct PowerState {
    pub(crate) pending: AtomicBool,
    acked: AtomicBool,
    countdown_armed: AtomicBool,
    charge: AtomicU32,
    pub(crate) standby_off_minutes: AtomicU32,
    pub(crate) standby_on_minutes: AtomicU32,
    pub(crate) trigger_poll: AtomicBool,
    last_wake: Mutex<Option<WakeReason>>,
}

impl PowerState {
    pub(crate) fn new(config: &FadConfig) -> PowerState {
        PowerState {
            pending: AtomicBool::new(false),
            acked: AtomicBool::new(false),
            countdown_armed: AtomicBool::new(false),
            charge: AtomicU32::new(ChargeState::Unknown.into()),
            standby_off_minutes: AtomicU32::new(config.standby_off_minutes),
            standby_on_minutes: AtomicU32::new(config.standby_on_minutes),
            trigger_poll: AtomicBool::new(false),
            last_wake: Mutex::new(None),
        }
    }
}

impl FadDevice {
    pub fn charge_state(&self) -> ChargeState {
        ChargeState::try_from(self.power.charge.load(Ordering::Acquire))
            .unwrap_or(ChargeState::Unknown)
    }

    pub fn set_charge_state(&self, state: ChargeState) {
        self.power.charge.store(state.into(), Ordering::Release);
    }

    pub fn suspend_pending(&self) -> bool {
        self.power.pending.load(Ordering::Acquire)
    }

    /// Wake reason of the most recent resume.
    pub fn last_wake_reason(&self) -> Option<WakeReason> {
        *self.power.last_wake.lock()
    }

    pub fn is_suspended(&self) -> bool {
        self.state.lock().suspended
    }

    /// Countdown length for a standby starting now, in minutes. 0 disables it.
    fn standby_minutes(&self) -> u32 {
        let minutes = match self.charge_state() {
            ChargeState::Charging => &self.power.standby_on_minutes,
            _ => &self.power.standby_off_minutes,
        };
        minutes.load(Ordering::Acquire)
    }

    fn cancel_countdown(&self) {
        if self.power.countdown_armed.swap(false, Ordering::AcqRel) {
            self.platform.alarm_cancel();
        }
    }

    /// Announce the standby and wait for user space to acknowledge it.
    ///
    /// Returns `Timeout` to veto the suspend when no acknowledgment arrives in time or the
    /// wait is cancelled.
    pub fn suspend_prepare(&self, cancel: &dyn Cancellation) -> FadResult<()> {
        self.power.acked.store(false, Ordering::Release);
        self.power.pending.store(true, Ordering::Release);
        self.platform.notify(Notification::StandbyRequested);

        let minutes = self.standby_minutes();
        if minutes > 0 {
            self.platform.alarm_start(minutes as u64 * MS_PER_MINUTE);
            self.power.countdown_armed.store(true, Ordering::Release);
            debug_ex!(target: "fad::power", "standby countdown armed for {} min", minutes);
        }

        let timeout_ms = self.config.ack_timeout_ms();
        let deadline = self.platform.now_ms() + timeout_ms as u64;
        loop {
            if self.power.acked.load(Ordering::Acquire) {
                log::info!("standby acknowledged");
                return Ok(());
            }
            if cancel.is_cancelled() || self.platform.now_ms() >= deadline {
                break;
            }
            self.platform.park(WaitChannel::SuspendAck);
        }

        self.cancel_countdown();
        self.power.pending.store(false, Ordering::Release);
        log::error!("standby not acknowledged within {} ms, vetoing suspend", timeout_ms);
        Err(FadError::Timeout)
    }

    /// User space finished its standby preparations.
    pub fn acknowledge_suspend(&self) {
        self.power.acked.store(true, Ordering::Release);
        self.platform.unpark(WaitChannel::SuspendAck);
    }

    pub fn suspend(&self) -> FadResult<()> {
        let mut state = self.lock_state()?;
        state.suspended = true;
        state.board.suspend()
    }

    pub fn resume(&self) -> FadResult<WakeReason> {
        {
            let mut state = self.lock_state()?;
            state.suspended = false;
            if let Err(err) = state.board.resume() {
                log::error!("board resume failed: {}", err);
            }
        }
        self.cancel_countdown();
        self.power.pending.store(false, Ordering::Release);

        let reason = match self.platform.wake_source() {
            WakeSource::Button => WakeReason::Button,
            WakeSource::Cable => WakeReason::Cable,
            WakeSource::Alarm => WakeReason::StandbyExpired,
            WakeSource::Unknown => WakeReason::Unknown,
        };
        *self.power.last_wake.lock() = Some(reason);
        if reason == WakeReason::StandbyExpired {
            if self.charge_state() == ChargeState::Charging {
                log::info!("standby expired while charging, staying on");
            } else {
                log::warn!("standby expired, powering off");
                self.platform.power_off();
                return Ok(reason);
            }
        }
        self.platform.notify(Notification::Resumed);
        Ok(reason)
    }

    /// Quiesce outputs before the system goes down.
    pub fn shutdown(&self) {
        self.post_event(FadEvent::Reset);
        let Ok(mut state) = self.lock_state() else {
            return;
        };
        if self.capabilities().contains(Capabilities::BUZZER) {
            if let Err(err) = state.board.set_buzzer_frequency(0, 0) {
                log::warn!("could not silence buzzer: {}", err);
            }
        }
        if self.capabilities().contains(Capabilities::LASER) {
            if let Err(err) = state.board.set_laser_status(false) {
                log::warn!("could not turn laser off: {}", err);
            }
        }
    }

    pub fn set_charger_suspend(&self, suspend: bool) -> FadResult<()> {
        self.with_board(|b| b.set_charger_suspend(suspend))
    }
}
