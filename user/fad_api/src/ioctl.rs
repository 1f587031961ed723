//! Request codes of the control device.
//!
//! Codes use the usual ioctl layout: `nr` in bits 0..8, the type character in bits 8..16,
//! the payload size in bits 16..30 and the direction in bits 30..32.

use bitflags::bitflags;

use crate::payload::{
    Backlight, Buzzer, DigitalIo, GpsEnable, HdmiStatus, LaserActive, LaserMode, LaserStatus, Led,
    Payload, SecurityParams, StartReason, SubjBacklight, TrigPressed, WatchdogConfig,
};

/// Type character shared by every FAD request.
pub const FAD_IOC_TYPE: u8 = b'a';

const NR_SHIFT: u32 = 0;
const TYPE_SHIFT: u32 = 8;
const SIZE_SHIFT: u32 = 16;
const DIR_SHIFT: u32 = 30;
const SIZE_MASK: u32 = (1 << 14) - 1;

bitflags! {
    /// Data movement of a request, seen from the caller.
    pub struct Direction: u32 {
        /// Payload is copied from the caller into the driver.
        const WRITE = 0b01;
        /// Payload is copied from the driver back to the caller.
        const READ  = 0b10;
    }
}

/// Encode a request code.
pub const fn ioc(dir: u32, nr: u8, size: usize) -> u32 {
    (dir << DIR_SHIFT)
        | (((size as u32) & SIZE_MASK) << SIZE_SHIFT)
        | ((FAD_IOC_TYPE as u32) << TYPE_SHIFT)
        | ((nr as u32) << NR_SHIFT)
}

macro_rules! define_requests {
    ($( $(#[$doc:meta])* $name:ident = ($nr:expr, $dir:ident, $size:expr) ),+ $(,)?) => {
        /// Every request understood by the control device.
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum Request {
            $( $(#[$doc])* $name, )+
        }

        impl Request {
            /// All requests, in code order.
            pub const ALL: &'static [Request] = &[$(Request::$name),+];

            /// Request number inside the `'a'` type space.
            pub const fn nr(self) -> u8 {
                match self { $(Request::$name => $nr,)+ }
            }

            /// Payload size in bytes, 0 for requests without payload.
            pub const fn size(self) -> usize {
                match self { $(Request::$name => $size,)+ }
            }

            /// Direction of the payload copy.
            pub const fn direction(self) -> Direction {
                match self { $(Request::$name => define_requests!(@dir $dir),)+ }
            }
        }
    };
    (@dir R) => { Direction::READ };
    (@dir W) => { Direction::WRITE };
    (@dir N) => { Direction::empty() };
}

define_requests! {
    /// Read laser power-enable and button state.
    GetLaserStatus = (1, R, LaserStatus::SIZE),
    /// Set the laser power enable.
    SetLaserStatus = (2, W, LaserStatus::SIZE),
    /// Start, stop or time a buzzer tone.
    Buzzer = (12, W, Buzzer::SIZE),
    /// Read digital I/O state.
    GetDigIoStatus = (20, R, DigitalIo::SIZE),
    /// Arm (or emulate disabling of) the hardware watchdog.
    EnableWatchdog = (22, W, WatchdogConfig::SIZE),
    /// Service the watchdog once.
    TrigWatchdog = (23, N, 0),
    GetGpsEnable = (27, R, GpsEnable::SIZE),
    SetGpsEnable = (28, W, GpsEnable::SIZE),
    GetLaserActive = (29, R, LaserActive::SIZE),
    SetLaserActive = (30, W, LaserActive::SIZE),
    /// Read HDMI hot-plug presence.
    GetHdmiStatus = (31, R, HdmiStatus::SIZE),
    GetKakaLed = (36, R, Led::SIZE),
    SetKakaLed = (37, W, Led::SIZE),
    GetKpBacklight = (40, R, Backlight::SIZE),
    SetKpBacklight = (41, W, Backlight::SIZE),
    GetKpSubjBacklight = (42, R, SubjBacklight::SIZE),
    SetKpSubjBacklight = (43, W, SubjBacklight::SIZE),
    /// Read the restart reason recorded at boot.
    GetStartReason = (46, R, StartReason::SIZE),
    /// Read the security and identity block.
    GetSecurityParams = (48, R, SecurityParams::SIZE),
    /// Post a reset event so a blocked reader returns.
    ReleaseRead = (49, N, 0),
    GetTrigPressed = (50, R, TrigPressed::SIZE),
    /// Select pointer or distance measurement.
    SetLaserMode = (51, W, LaserMode::SIZE),
}

impl Request {
    /// Full 32-bit request code.
    pub const fn code(self) -> u32 {
        ioc(self.direction().bits(), self.nr(), self.size())
    }

    /// Look up a request by its full code. Number, size and direction must all match.
    pub fn from_code(code: u32) -> Option<Request> {
        Request::ALL.iter().copied().find(|req| req.code() == code)
    }
}
