//! Regulators with an explicit enabled flag.
//!
//! The charger-suspend request and the system suspend path toggle some supplies
//! independently. The flag keeps the underlying enable count balanced: a second enable or
//! a second disable is a no-op.

use alloc::sync::Arc;

use crate::{
    error::{FadError, FadResult},
    hal::Regulator,
};

pub struct GuardedRegulator {
    name: &'static str,
    reg: Arc<dyn Regulator>,
    enabled: bool,
}

impl GuardedRegulator {
    /// Wrap a regulator that is currently off.
    pub fn new(name: &'static str, reg: Arc<dyn Regulator>) -> GuardedRegulator {
        GuardedRegulator {
            name,
            reg,
            enabled: false,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn enable(&mut self) -> FadResult<()> {
        if self.enabled {
            return Ok(());
        }
        self.reg.enable().map_err(|err| {
            log::error!("failed to enable regulator {}: {:?}", self.name, err);
            FadError::HardwareError
        })?;
        self.enabled = true;
        Ok(())
    }

    pub fn disable(&mut self) -> FadResult<()> {
        if !self.enabled {
            return Ok(());
        }
        self.reg.disable().map_err(|err| {
            log::error!("failed to disable regulator {}: {:?}", self.name, err);
            FadError::HardwareError
        })?;
        self.enabled = false;
        Ok(())
    }
}

impl Drop for GuardedRegulator {
    fn drop(&mut self) {
        if let Err(err) = self.disable() {
            log::warn!("{} left enabled: {}", self.name, err);
        }
    }
}

/// Enable `supplies` in order. On failure the ones already enabled are turned off again in
/// reverse and the enable error is returned.
pub fn enable_all(supplies: &mut [GuardedRegulator]) -> FadResult<()> {
    let mut failure = None;
    for (i, supply) in supplies.iter_mut().enumerate() {
        if let Err(err) = supply.enable() {
            failure = Some((i, err));
            break;
        }
    }
    let Some((failed, err)) = failure else {
        return Ok(());
    };
    if let Err(undo) = disable_all(&mut supplies[..failed]) {
        log::warn!("unwinding supplies failed: {}", undo);
    }
    Err(err)
}

/// Disable `supplies` in reverse order. Every supply is attempted; the first failure is
/// returned.
pub fn disable_all(supplies: &mut [GuardedRegulator]) -> FadResult<()> {
    let mut result: FadResult<()> = Ok(());
    for supply in supplies.iter_mut().rev() {
        if let Err(err) = supply.disable() {
            result = result.and(Err(err));
        }
    }
    result
}
