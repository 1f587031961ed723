//! Keypad backlight level mapping.

use fad_api::SubjectiveLevel;

use crate::hal::ConfigSource;

/// Raw backlight values behind the subjective levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeypadLevels {
    pub low: u8,
    pub medium: u8,
    pub high: u8,
}

impl KeypadLevels {
    /// Read `kp_bl_low`/`kp_bl_medium`/`kp_bl_high`, falling back to `self` per value.
    pub fn from_properties(self, props: &dyn ConfigSource) -> KeypadLevels {
        let prop = |name: &str, default: u8| {
            props
                .property_u32(name)
                .and_then(|v| u8::try_from(v).ok())
                .unwrap_or(default)
        };
        KeypadLevels {
            low: prop("kp_bl_low", self.low),
            medium: prop("kp_bl_medium", self.medium),
            high: prop("kp_bl_high", self.high),
        }
    }

    /// Nearest subjective level of a raw value. Midpoints belong to the lower level.
    pub fn classify(&self, raw: u8) -> SubjectiveLevel {
        let raw = raw as u32;
        if raw <= (self.low as u32 + self.medium as u32) / 2 {
            SubjectiveLevel::Low
        } else if raw <= (self.medium as u32 + self.high as u32) / 2 {
            SubjectiveLevel::Medium
        } else {
            SubjectiveLevel::High
        }
    }

    pub fn raw(&self, level: SubjectiveLevel) -> u8 {
        match level {
            SubjectiveLevel::Low => self.low,
            SubjectiveLevel::Medium => self.medium,
            SubjectiveLevel::High => self.high,
            SubjectiveLevel::Off => 0,
        }
    }
}
