//! Payload layouts of the control device.
//!
//! Every payload has a fixed size and a little-endian C layout (32-bit `BOOL`s and enums,
//! natural alignment). [Payload::decode] validates enum values; it never trusts the caller.

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::RestartReason;

/// Payload decoding failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadError {
    /// Buffer shorter than the payload.
    Short,
    /// A field holds a value outside its domain.
    BadValue,
}

/// A fixed-size request payload.
pub trait Payload: Sized {
    /// Size of the encoded payload in bytes.
    const SIZE: usize;
    /// Parse the payload from the start of `buf`.
    fn decode(buf: &[u8]) -> Result<Self, PayloadError>;
    /// Write the payload to the start of `buf`.
    fn encode(&self, buf: &mut [u8]) -> Result<(), PayloadError>;
}

// region: Codec helpers

fn check(buf: &[u8], size: usize) -> Result<(), PayloadError> {
    if buf.len() < size {
        Err(PayloadError::Short)
    } else {
        Ok(())
    }
}

fn get_u16(buf: &[u8], off: usize) -> u16 {
    u16::from_le_bytes([buf[off], buf[off + 1]])
}

fn get_u32(buf: &[u8], off: usize) -> u32 {
    u32::from_le_bytes([buf[off], buf[off + 1], buf[off + 2], buf[off + 3]])
}

fn get_u64(buf: &[u8], off: usize) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&buf[off..off + 8]);
    u64::from_le_bytes(raw)
}

fn get_bool(buf: &[u8], off: usize) -> bool {
    get_u32(buf, off) != 0
}

fn get_enum<T: TryFromPrimitive<Primitive = u32>>(buf: &[u8], off: usize) -> Result<T, PayloadError> {
    T::try_from_primitive(get_u32(buf, off)).map_err(|_| PayloadError::BadValue)
}

fn put_u16(buf: &mut [u8], off: usize, v: u16) {
    buf[off..off + 2].copy_from_slice(&v.to_le_bytes());
}

fn put_u32(buf: &mut [u8], off: usize, v: u32) {
    buf[off..off + 4].copy_from_slice(&v.to_le_bytes());
}

fn put_u64(buf: &mut [u8], off: usize, v: u64) {
    buf[off..off + 8].copy_from_slice(&v.to_le_bytes());
}

fn put_bool(buf: &mut [u8], off: usize, v: bool) {
    put_u32(buf, off, v as u32);
}

// endregion

// region: Enums

/// Requested buzzer action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u32)]
pub enum BuzzerState {
    On = 0,
    Off = 1,
    /// Sound for `time_ms`, then stop.
    Timed = 2,
}

/// Color of the dual-LED status indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u32)]
pub enum LedColor {
    Off = 0,
    Green = 1,
    Red = 2,
    Yellow = 3,
}

/// Steady or flashing state of a status LED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u32)]
pub enum LedState {
    Off = 0,
    On = 1,
    /// 1 Hz.
    FlashSlow = 2,
    /// 3 Hz.
    FlashFast = 3,
}

/// Perceived keypad backlight level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u32)]
pub enum SubjectiveLevel {
    Low = 0,
    Medium = 1,
    High = 2,
    Off = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u32)]
pub enum LaserModeKind {
    Pointer = 0,
    Distance = 1,
}

/// Rangefinder measurement accuracy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u32)]
pub enum Accuracy {
    None = 0,
    Low = 1,
    High = 2,
}

// endregion

// region: Payloads

/// Laser power enable and button state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LaserStatus {
    pub power_enabled: bool,
    /// The laser button is pressed.
    pub is_on: bool,
}

impl Payload for LaserStatus {
    const SIZE: usize = 8;
    fn decode(buf: &[u8]) -> Result<Self, PayloadError> {
        check(buf, Self::SIZE)?;
        Ok(LaserStatus {
            power_enabled: get_bool(buf, 0),
            is_on: get_bool(buf, 4),
        })
    }
    fn encode(&self, buf: &mut [u8]) -> Result<(), PayloadError> {
        check(buf, Self::SIZE)?;
        put_bool(buf, 0, self.power_enabled);
        put_bool(buf, 4, self.is_on);
        Ok(())
    }
}

/// Buzzer tone request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Buzzer {
    pub state: BuzzerState,
    /// Duty cycle in percent, 0 to 100.
    pub pwm: u8,
    /// Tone frequency in Hz.
    pub freq: u16,
    /// Duration of a timed tone.
    pub time_ms: u16,
}

impl Payload for Buzzer {
    const SIZE: usize = 12;
    fn decode(buf: &[u8]) -> Result<Self, PayloadError> {
        check(buf, Self::SIZE)?;
        Ok(Buzzer {
            state: get_enum(buf, 0)?,
            pwm: buf[4],
            freq: get_u16(buf, 6),
            time_ms: get_u16(buf, 8),
        })
    }
    fn encode(&self, buf: &mut [u8]) -> Result<(), PayloadError> {
        check(buf, Self::SIZE)?;
        buf[..Self::SIZE].fill(0);
        put_u32(buf, 0, self.state.into());
        buf[4] = self.pwm;
        put_u16(buf, 6, self.freq);
        put_u16(buf, 8, self.time_ms);
        Ok(())
    }
}

/// Digital I/O snapshot. Bit `n` of a state mask is channel `n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DigitalIo {
    pub num_in: u8,
    pub num_out: u8,
    pub input_state: u16,
    pub output_state: u16,
    pub output_set: u16,
    pub output_clear: u16,
}

impl Payload for DigitalIo {
    const SIZE: usize = 16;
    fn decode(buf: &[u8]) -> Result<Self, PayloadError> {
        check(buf, Self::SIZE)?;
        Ok(DigitalIo {
            num_in: buf[0],
            num_out: buf[1],
            input_state: get_u16(buf, 2),
            output_state: get_u16(buf, 4),
            output_set: get_u16(buf, 6),
            output_clear: get_u16(buf, 8),
        })
    }
    fn encode(&self, buf: &mut [u8]) -> Result<(), PayloadError> {
        check(buf, Self::SIZE)?;
        buf[..Self::SIZE].fill(0);
        buf[0] = self.num_in;
        buf[1] = self.num_out;
        put_u16(buf, 2, self.input_state);
        put_u16(buf, 4, self.output_state);
        put_u16(buf, 6, self.output_set);
        put_u16(buf, 8, self.output_clear);
        Ok(())
    }
}

/// Watchdog arming request. `time_ms == 0` selects the default timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WatchdogConfig {
    pub enable: bool,
    pub time_ms: u16,
}

impl Payload for WatchdogConfig {
    const SIZE: usize = 8;
    fn decode(buf: &[u8]) -> Result<Self, PayloadError> {
        check(buf, Self::SIZE)?;
        Ok(WatchdogConfig {
            enable: get_bool(buf, 0),
            time_ms: get_u16(buf, 4),
        })
    }
    fn encode(&self, buf: &mut [u8]) -> Result<(), PayloadError> {
        check(buf, Self::SIZE)?;
        buf[..Self::SIZE].fill(0);
        put_bool(buf, 0, self.enable);
        put_u16(buf, 4, self.time_ms);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Led {
    pub color: LedColor,
    pub state: LedState,
}

impl Payload for Led {
    const SIZE: usize = 8;
    fn decode(buf: &[u8]) -> Result<Self, PayloadError> {
        check(buf, Self::SIZE)?;
        Ok(Led {
            color: get_enum(buf, 0)?,
            state: get_enum(buf, 4)?,
        })
    }
    fn encode(&self, buf: &mut [u8]) -> Result<(), PayloadError> {
        check(buf, Self::SIZE)?;
        put_u32(buf, 0, self.color.into());
        put_u32(buf, 4, self.state.into());
        Ok(())
    }
}

/// Payloads holding a single 32-bit `BOOL`.
macro_rules! bool_payload {
    ($($(#[$doc:meta])* $name:ident { $field:ident }),+ $(,)?) => {
        $(
            $(#[$doc])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
            pub struct $name {
                pub $field: bool,
            }

            impl Payload for $name {
                const SIZE: usize = 4;
                fn decode(buf: &[u8]) -> Result<Self, PayloadError> {
                    check(buf, Self::SIZE)?;
                    Ok($name { $field: get_bool(buf, 0) })
                }
                fn encode(&self, buf: &mut [u8]) -> Result<(), PayloadError> {
                    check(buf, Self::SIZE)?;
                    put_bool(buf, 0, self.$field);
                    Ok(())
                }
            }
        )+
    };
}

bool_payload! {
    GpsEnable { enabled },
    LaserActive { active },
    /// HDMI sink presence from the hot-plug-detect bit.
    HdmiStatus { present },
    TrigPressed { pressed },
}

/// Keypad backlight in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Backlight {
    pub level: u8,
}

impl Payload for Backlight {
    const SIZE: usize = 1;
    fn decode(buf: &[u8]) -> Result<Self, PayloadError> {
        check(buf, Self::SIZE)?;
        Ok(Backlight { level: buf[0] })
    }
    fn encode(&self, buf: &mut [u8]) -> Result<(), PayloadError> {
        check(buf, Self::SIZE)?;
        buf[0] = self.level;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubjBacklight {
    pub level: SubjectiveLevel,
}

impl Payload for SubjBacklight {
    const SIZE: usize = 4;
    fn decode(buf: &[u8]) -> Result<Self, PayloadError> {
        check(buf, Self::SIZE)?;
        Ok(SubjBacklight {
            level: get_enum(buf, 0)?,
        })
    }
    fn encode(&self, buf: &mut [u8]) -> Result<(), PayloadError> {
        check(buf, Self::SIZE)?;
        put_u32(buf, 0, self.level.into());
        Ok(())
    }
}

/// Layout version reported in [SecurityParams::version].
pub const SECURITY_PARAMS_VERSION: u32 = 101;

/// Security and identity block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SecurityParams {
    pub version: u32,
    pub required_config_level: u32,
    pub require_30hz_level: u32,
    pub unique_id: u64,
}

impl Payload for SecurityParams {
    const SIZE: usize = 24;
    fn decode(buf: &[u8]) -> Result<Self, PayloadError> {
        check(buf, Self::SIZE)?;
        Ok(SecurityParams {
            version: get_u32(buf, 0),
            required_config_level: get_u32(buf, 4),
            require_30hz_level: get_u32(buf, 8),
            unique_id: get_u64(buf, 16),
        })
    }
    fn encode(&self, buf: &mut [u8]) -> Result<(), PayloadError> {
        check(buf, Self::SIZE)?;
        buf[..Self::SIZE].fill(0);
        put_u32(buf, 0, self.version);
        put_u32(buf, 4, self.required_config_level);
        put_u32(buf, 8, self.require_30hz_level);
        put_u64(buf, 16, self.unique_id);
        Ok(())
    }
}

/// Laser measurement mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaserMode {
    pub mode: LaserModeKind,
    pub continuous: bool,
    pub accuracy: Accuracy,
}

impl Payload for LaserMode {
    const SIZE: usize = 12;
    fn decode(buf: &[u8]) -> Result<Self, PayloadError> {
        check(buf, Self::SIZE)?;
        Ok(LaserMode {
            mode: get_enum(buf, 0)?,
            continuous: get_bool(buf, 4),
            accuracy: get_enum(buf, 8)?,
        })
    }
    fn encode(&self, buf: &mut [u8]) -> Result<(), PayloadError> {
        check(buf, Self::SIZE)?;
        put_u32(buf, 0, self.mode.into());
        put_bool(buf, 4, self.continuous);
        put_u32(buf, 8, self.accuracy.into());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartReason {
    pub reason: RestartReason,
}

impl Payload for StartReason {
    const SIZE: usize = 4;
    fn decode(buf: &[u8]) -> Result<Self, PayloadError> {
        check(buf, Self::SIZE)?;
        Ok(StartReason {
            reason: get_enum(buf, 0)?,
        })
    }
    fn encode(&self, buf: &mut [u8]) -> Result<(), PayloadError> {
        check(buf, Self::SIZE)?;
        put_u32(buf, 0, self.reason.into());
        Ok(())
    }
}

// endregion
