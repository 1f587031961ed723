//! FAD: peripheral HAL driver for FLIR camera boards.
//!
//! One control device serves a fixed set of peripheral requests (laser, GPS, status LEDs,
//! keypad backlight, buzzer, digital I/O, HDMI presence, watchdog) across several board
//! families. The board is detected at attach, its capability table is built once, and every
//! later entry point goes through the [FadDevice] context:
//! - requests: [FadDevice::ioctl]
//! - events: [FadDevice::read_event], [FadDevice::poll_event], [FadDevice::handle_irq]
//! - deferred work: [FadDevice::run_deferred_work]
//! - power: [FadDevice::suspend_prepare], [FadDevice::suspend], [FadDevice::resume]
//! - attributes: [FadDevice::show_attr], [FadDevice::store_attr]
//!
//! Kernel services (GPIO, IRQ, I2C, regulators, timers, uevents) are reached only through the
//! traits in [hal].

#![no_std]

extern crate alloc;
#[cfg(test)]
extern crate std;

#[macro_use]
pub mod logging;

pub mod attrs;
pub mod board;
pub mod config;
pub mod device;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod hal;
pub mod hdmi;
pub mod ioport;
pub mod power;
pub mod regulator;
pub mod watchdog;

#[cfg(test)]
mod testing;

pub use device::FadDevice;
pub use error::{FadError, FadResult};
