//! User-space ABI of the FAD control device.
//!
//! Shared between the driver and applications:
//! - [ioctl]: request codes and their direction/size encoding.
//! - [payload]: the fixed-layout payload structs and their little-endian byte codec.
//! - The event tag delivered by the read channel ([FadEvent]).

#![no_std]

pub mod ioctl;
pub mod payload;

pub use ioctl::{Direction, Request};
pub use payload::*;

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Event tag delivered by a read of the control device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u32)]
pub enum FadEvent {
    /// Nothing pending.
    None = 0,
    /// Synthetic event used to release a blocked reader.
    Reset = 1,
    /// The laser button changed state.
    LaserChanged = 2,
    /// A digital input changed state.
    DigitalInputChanged = 3,
}

/// Reason for the last restart, as reported by the boot loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u32)]
pub enum RestartReason {
    NotSet = 0,
    Coldstart = 1,
    Watchdog = 2,
}
