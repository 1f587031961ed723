//! Control-plane attributes.
//!
//! Small named values exposed as text, the way sysfs attributes are: reads produce a decimal
//! number and a newline, writes take decimal text.

use core::{fmt, sync::atomic::Ordering};

use crate::{
    device::FadDevice,
    error::{FadError, FadResult},
    power::ChargeState,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    /// 1 while a standby is waiting for acknowledgment. Write 0 to acknowledge.
    SuspendPending,
    ChargeState,
    StandbyOffMinutes,
    /// Countdown used instead of `standby_off_minutes` while charging.
    StandbyOnMinutes,
    /// Reads 1 once after a trigger press.
    TriggerPoll,
    /// Write-only. 1 suspends charging peripherals, 0 resumes them.
    ChargerSuspend,
}

impl Attribute {
    pub const ALL: [Attribute; 6] = [
        Attribute::SuspendPending,
        Attribute::ChargeState,
        Attribute::StandbyOffMinutes,
        Attribute::StandbyOnMinutes,
        Attribute::TriggerPoll,
        Attribute::ChargerSuspend,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Attribute::SuspendPending => "suspend_pending",
            Attribute::ChargeState => "charge_state",
            Attribute::StandbyOffMinutes => "standby_off_minutes",
            Attribute::StandbyOnMinutes => "standby_on_minutes",
            Attribute::TriggerPoll => "trigger_poll",
            Attribute::ChargerSuspend => "charger_suspend",
        }
    }

    pub fn from_name(name: &str) -> Option<Attribute> {
        Attribute::ALL.into_iter().find(|attr| attr.name() == name)
    }

    pub const fn readable(self) -> bool {
        !matches!(self, Attribute::ChargerSuspend)
    }

    pub const fn writable(self) -> bool {
        !matches!(self, Attribute::TriggerPoll)
    }
}

fn parse(input: &str) -> FadResult<u32> {
    input.trim().parse().map_err(|_| FadError::InvalidParameter)
}

impl FadDevice {
    /// Write the attribute's current value to `out`.
    pub fn show_attr(&self, attr: Attribute, out: &mut dyn fmt::Write) -> FadResult<()> {
        let value: u32 = match attr {
            Attribute::SuspendPending => self.suspend_pending() as u32,
            Attribute::ChargeState => self.charge_state().into(),
            Attribute::StandbyOffMinutes => self.power.standby_off_minutes.load(Ordering::Acquire),
            Attribute::StandbyOnMinutes => self.power.standby_on_minutes.load(Ordering::Acquire),
            Attribute::TriggerPoll => self.power.trigger_poll.swap(false, Ordering::AcqRel) as u32,
            Attribute::ChargerSuspend => return Err(FadError::NotSupported),
        };
        writeln!(out, "{}", value).map_err(|_| FadError::CopyFault)
    }

    /// Parse `input` and apply it to the attribute.
    pub fn store_attr(&self, attr: Attribute, input: &str) -> FadResult<()> {
        if !attr.writable() {
            return Err(FadError::NotSupported);
        }
        let value = parse(input)?;
        debug_ex!(target: "fad::attrs", "{} <- {}", attr.name(), value);
        match attr {
            Attribute::SuspendPending => match value {
                0 => {
                    self.acknowledge_suspend();
                    Ok(())
                }
                _ => Err(FadError::InvalidParameter),
            },
            Attribute::ChargeState => {
                let state = ChargeState::try_from(value).map_err(|_| FadError::InvalidParameter)?;
                self.set_charge_state(state);
                Ok(())
            }
            Attribute::StandbyOffMinutes => {
                self.power.standby_off_minutes.store(value, Ordering::Release);
                Ok(())
            }
            Attribute::StandbyOnMinutes => {
                self.power.standby_on_minutes.store(value, Ordering::Release);
                Ok(())
            }
            Attribute::ChargerSuspend => match value {
                0 => self.set_charger_suspend(false),
                1 => self.set_charger_suspend(true),
                _ => Err(FadError::InvalidParameter),
            },
            Attribute::TriggerPoll => Err(FadError::NotSupported),
        }
    }
}
