//! Error taxonomy of the driver.

use core::fmt;

use fad_api::payload::PayloadError;

use crate::hal::HalError;

/// Result type used by every driver entry point.
pub type FadResult<T> = Result<T, FadError>;

/// Errors reported to callers of the control device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadError {
    /// The board does not have the capability.
    NotSupported,
    /// The payload holds a value outside its domain.
    InvalidParameter,
    /// An I2C or GPIO transfer failed.
    HardwareError,
    /// A bounded wait expired (EDID readiness, suspend acknowledgment).
    Timeout,
    /// A resource could not be acquired during setup.
    ResourceExhausted,
    /// Copying the payload from or to the caller failed.
    CopyFault,
    /// A blocking wait was cancelled.
    Interrupted,
    /// Another reader is already blocked on the event channel.
    Busy,
}

impl FadError {
    /// Negative errno returned across the kernel boundary.
    pub const fn errno(self) -> i32 {
        match self {
            FadError::NotSupported => -95,       // EOPNOTSUPP
            FadError::InvalidParameter => -22,   // EINVAL
            FadError::HardwareError => -5,       // EIO
            FadError::Timeout => -110,           // ETIMEDOUT
            FadError::ResourceExhausted => -12,  // ENOMEM
            FadError::CopyFault => -14,          // EFAULT
            FadError::Interrupted => -512,       // ERESTARTSYS
            FadError::Busy => -16,               // EBUSY
        }
    }
}

impl fmt::Display for FadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FadError::NotSupported => write!(f, "not supported on this board"),
            FadError::InvalidParameter => write!(f, "invalid parameter"),
            FadError::HardwareError => write!(f, "hardware access failed"),
            FadError::Timeout => write!(f, "timed out"),
            FadError::ResourceExhausted => write!(f, "resource acquisition failed"),
            FadError::CopyFault => write!(f, "bad user buffer"),
            FadError::Interrupted => write!(f, "interrupted"),
            FadError::Busy => write!(f, "busy"),
        }
    }
}

impl From<HalError> for FadError {
    fn from(_: HalError) -> Self {
        FadError::HardwareError
    }
}

impl From<PayloadError> for FadError {
    fn from(err: PayloadError) -> Self {
        match err {
            PayloadError::Short => FadError::CopyFault,
            PayloadError::BadValue => FadError::InvalidParameter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;

    #[test]
    fn display_all_variants() {
        let cases = [
            (FadError::NotSupported, "not supported on this board"),
            (FadError::InvalidParameter, "invalid parameter"),
            (FadError::HardwareError, "hardware access failed"),
            (FadError::Timeout, "timed out"),
            (FadError::ResourceExhausted, "resource acquisition failed"),
            (FadError::CopyFault, "bad user buffer"),
            (FadError::Interrupted, "interrupted"),
            (FadError::Busy, "busy"),
        ];
        for (err, text) in cases {
            assert_eq!(format!("{}", err), text);
        }
    }

    #[test]
    fn errno_values_are_distinct_and_negative() {
        let all = [
            FadError::NotSupported,
            FadError::InvalidParameter,
            FadError::HardwareError,
            FadError::Timeout,
            FadError::ResourceExhausted,
            FadError::CopyFault,
            FadError::Interrupted,
            FadError::Busy,
        ];
        for (i, a) in all.iter().enumerate() {
            assert!(a.errno() < 0);
            for b in &all[i + 1..] {
                assert_ne!(a.errno(), b.errno());
            }
        }
    }

    #[test]
    fn payload_errors_split_copy_from_parameter() {
        assert_eq!(FadError::from(PayloadError::Short), FadError::CopyFault);
        assert_eq!(FadError::from(PayloadError::BadValue), FadError::InvalidParameter);
        assert_eq!(FadError::from(HalError::Io), FadError::HardwareError);
    }
}
