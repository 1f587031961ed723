//! Shared I2C IO-expander.
//!
//! Several boards route laser and power-enable signals through one 8-bit expander. Every
//! bit change is a read-modify-write of the output register, so all register access goes
//! through the io-port lock. The lock is independent of the device lock and is always the
//! innermost one taken.

use alloc::sync::Arc;

use bitflags::bitflags;
use spin::Mutex;

use crate::{
    error::{FadError, FadResult},
    hal::I2cBus,
};

/// Input port register (pin levels).
pub const REG_INPUT: u8 = 0;
/// Output port register.
pub const REG_OUTPUT: u8 = 1;
/// Direction register, a cleared bit is an output.
pub const REG_CONFIG: u8 = 3;

bitflags! {
    /// Expander bits used by the driver.
    pub struct IoPortBits: u8 {
        /// Lens VCM LED supply.
        const VCM_LED_EN      = 1 << 0;
        /// Laser power switch.
        const LASER_SWITCH_ON = 1 << 2;
        /// Focus module supply.
        const FOCUS_POWER_EN  = 1 << 3;
        /// Laser emission (soft on).
        const LASER_SOFT_ON   = 1 << 5;
    }
}

pub struct IoExpander {
    bus: Arc<dyn I2cBus>,
    addr: u8,
    lock: Mutex<()>,
}

impl IoExpander {
    pub fn new(bus: Arc<dyn I2cBus>, addr: u8) -> IoExpander {
        IoExpander {
            bus,
            addr,
            lock: Mutex::new(()),
        }
    }

    fn read_reg(&self, reg: u8) -> FadResult<u8> {
        let mut val = [0u8];
        self.bus.write_read(self.addr, &[reg], &mut val).map_err(|err| {
            log::error!("ioport read of reg {} failed: {:?}", reg, err);
            FadError::HardwareError
        })?;
        Ok(val[0])
    }

    fn write_reg(&self, reg: u8, val: u8) -> FadResult<()> {
        self.bus.write(self.addr, &[reg, val]).map_err(|err| {
            log::error!("ioport write of reg {} failed: {:?}", reg, err);
            FadError::HardwareError
        })
    }

    fn modify(&self, reg: u8, bits: IoPortBits, set: bool) -> FadResult<u8> {
        let _guard = self.lock.lock();
        let old = self.read_reg(reg)?;
        let new = if set {
            old | bits.bits()
        } else {
            old & !bits.bits()
        };
        if new != old {
            self.write_reg(reg, new)?;
        }
        Ok(new)
    }

    /// Turn `bits` into outputs.
    pub fn configure_outputs(&self, bits: IoPortBits) -> FadResult<()> {
        self.modify(REG_CONFIG, bits, false).map(|_| ())
    }

    /// Drive `bits` high or low, leaving every other output untouched.
    pub fn set(&self, bits: IoPortBits, on: bool) -> FadResult<()> {
        let value = self.modify(REG_OUTPUT, bits, on)?;
        debug_ex!(target: "fad::ioport", "ioport output now {:#04x}", value);
        Ok(())
    }

    /// Level of a single pin, read from the input port.
    pub fn get(&self, bit: IoPortBits) -> FadResult<bool> {
        let _guard = self.lock.lock();
        Ok(self.read_reg(REG_INPUT)? & bit.bits() != 0)
    }

    pub fn output(&self) -> FadResult<u8> {
        let _guard = self.lock.lock();
        self.read_reg(REG_OUTPUT)
    }
}
