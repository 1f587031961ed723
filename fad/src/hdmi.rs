//! HDMI transmitter bring-up.
//!
//! ```text
//! PoweredDown -> PoweringUp -> AwaitingEdid -> Ready
//!                                          \-> Timeout
//! ```
//!
//! Bring-up writes a fixed, ordered register sequence and then polls the interrupt status
//! register for EDID completion. Running out of polls is not an error: the sink may still be
//! present, presence is always read from the hot-plug-detect bit.
//!
//! Bring-up and hot-plug evaluation are serialized by the PHY's own lock. They run in the
//! deferred worker (or at attach) and never under the device lock.

use alloc::sync::Arc;
use core::sync::atomic::{AtomicBool, Ordering};

use spin::Mutex;

use crate::{
    error::{FadError, FadResult},
    hal::{I2cBus, Notification, Platform},
};

pub const REG_POWER: u8 = 0x41;
pub const REG_HPD_STATE: u8 = 0x42;
pub const REG_INPUT_FMT: u8 = 0x15;
pub const REG_INPUT_TYPE: u8 = 0x16;
pub const REG_INPUT_SELECT: u8 = 0x17;
pub const REG_IRQ: u8 = 0x96;
pub const REG_TMDS_TRANSC: u8 = 0xA1;
pub const REG_MODE: u8 = 0xAF;
pub const REG_CLK_DELAY: u8 = 0xBA;
pub const REG_DDR: u8 = 0xD0;
pub const REG_TMDS_CODING: u8 = 0xD6;
pub const REG_MUX: u8 = 0xE0;

/// Hot-plug detect, in [REG_HPD_STATE].
pub const HPD_BIT: u8 = 0x40;
/// EDID read complete, in [REG_IRQ].
pub const IRQ_EDID_READY: u8 = 0x04;

/// Power-up register writes, in the order the transmitter requires.
pub const BRINGUP_SEQUENCE: [(u8, u8); 16] = [
    (REG_TMDS_TRANSC, 0x3C), // transceivers off
    (REG_POWER, 0x10),
    (0x98, 0x03),
    (0x9C, 0x38),
    (0x9D, 0x61),
    (0xA2, 0x94),
    (0xA3, 0x94),
    (REG_CLK_DELAY, 0x70),
    (0xDE, 0x88),
    (REG_INPUT_FMT, 0x0A),
    (REG_INPUT_TYPE, 0x02),
    (REG_INPUT_SELECT, 0x00),
    (REG_DDR, 0x3C),
    (REG_TMDS_CODING, 0x10),
    (REG_MUX, 0x08),
    (REG_MODE, 0x14),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HdmiState {
    PoweredDown,
    PoweringUp,
    AwaitingEdid,
    Ready,
    /// EDID never completed; the link may still work.
    Timeout,
}

pub struct HdmiPhy {
    bus: Arc<dyn I2cBus>,
    addr: u8,
    poll_interval_ms: u32,
    poll_retries: u32,
    state: Mutex<HdmiState>,
    connected: AtomicBool,
    bringup: Mutex<()>,
}

impl HdmiPhy {
    pub fn new(bus: Arc<dyn I2cBus>, addr: u8, poll_interval_ms: u32, poll_retries: u32) -> HdmiPhy {
        HdmiPhy {
            bus,
            addr,
            poll_interval_ms,
            poll_retries,
            state: Mutex::new(HdmiState::PoweredDown),
            connected: AtomicBool::new(false),
            bringup: Mutex::new(()),
        }
    }

    fn read(&self, reg: u8) -> FadResult<u8> {
        let mut val = [0u8];
        self.bus.write_read(self.addr, &[reg], &mut val).map_err(|err| {
            log::error!("hdmi read of {:#04x} failed: {:?}", reg, err);
            FadError::HardwareError
        })?;
        Ok(val[0])
    }

    fn write(&self, reg: u8, val: u8) -> FadResult<()> {
        self.bus.write(self.addr, &[reg, val]).map_err(|err| {
            log::error!("hdmi write of {:#04x} failed: {:?}", reg, err);
            FadError::HardwareError
        })
    }

    fn set_state(&self, state: HdmiState) {
        debug_ex!(target: "fad::hdmi", "hdmi state -> {:?}", state);
        *self.state.lock() = state;
    }

    pub fn state(&self) -> HdmiState {
        *self.state.lock()
    }

    /// Last connection state seen by hot-plug evaluation.
    pub fn connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Sink presence from the hot-plug-detect bit.
    pub fn is_present(&self) -> FadResult<bool> {
        Ok(self.read(REG_HPD_STATE)? & HPD_BIT != 0)
    }

    /// Run the power-up sequence and wait for EDID. Returns `Ready` or `Timeout`.
    pub fn bring_up(&self, platform: &dyn Platform) -> FadResult<HdmiState> {
        let _guard = self.bringup.lock();
        self.bring_up_locked(platform)
    }

    fn bring_up_locked(&self, platform: &dyn Platform) -> FadResult<HdmiState> {
        self.set_state(HdmiState::PoweringUp);
        for (reg, val) in BRINGUP_SEQUENCE {
            if let Err(err) = self.write(reg, val) {
                self.set_state(HdmiState::PoweredDown);
                return Err(err);
            }
        }

        self.set_state(HdmiState::AwaitingEdid);
        for poll in 1..=self.poll_retries {
            let irq = match self.read(REG_IRQ) {
                Ok(irq) => irq,
                Err(err) => {
                    self.set_state(HdmiState::PoweredDown);
                    return Err(err);
                }
            };
            if irq & IRQ_EDID_READY != 0 {
                log::info!("hdmi ready after {} polls", poll);
                self.set_state(HdmiState::Ready);
                return Ok(HdmiState::Ready);
            }
            if poll < self.poll_retries {
                platform.sleep_ms(self.poll_interval_ms);
            }
        }
        log::warn!("hdmi EDID not read after {} polls", self.poll_retries);
        self.set_state(HdmiState::Timeout);
        Ok(HdmiState::Timeout)
    }

    /// Evaluate a hot-plug interrupt. Returns the new connection state if it changed.
    ///
    /// The PHY interrupt status is acknowledged by writing it back before anything else.
    pub fn on_hotplug(&self, platform: &dyn Platform) -> FadResult<Option<bool>> {
        let _guard = self.bringup.lock();
        let irq = self.read(REG_IRQ)?;
        self.write(REG_IRQ, irq)?;

        let connected = self.read(REG_HPD_STATE)? & HPD_BIT != 0;
        if connected == self.connected.load(Ordering::Acquire) {
            return Ok(None);
        }
        if connected {
            self.bring_up_locked(platform)?;
        } else {
            self.set_state(HdmiState::PoweredDown);
        }
        self.connected.store(connected, Ordering::Release);
        log::info!("hdmi {}", if connected { "connected" } else { "disconnected" });
        platform.notify(Notification::HdmiChanged { connected });
        Ok(Some(connected))
    }
}
