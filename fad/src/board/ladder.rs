//! Ordered record of acquired board resources.
//!
//! Board setup acquires everything through a [Ladder]. Each successful acquisition is
//! pushed onto the ladder; [Ladder::release_all] (and `Drop`) gives them back in reverse
//! order. A setup function that fails with `?` therefore unwinds exactly what it took.

use alloc::{sync::Arc, vec::Vec};

use crate::{
    error::{FadError, FadResult},
    hal::{HalError, I2cBus, IrqLine, Led, Platform, Pwm, RangeFinder, Regulator, Trigger, WatchdogHw},
};

/// One acquired resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    Gpio(u32),
    Irq(IrqLine),
    I2c(u32),
    Regulator(&'static str),
    Led(&'static str),
    Pwm(u32),
    Watchdog,
    RangeFinder,
}

pub struct Ladder {
    platform: Arc<dyn Platform>,
    held: Vec<Resource>,
}

fn exhausted(what: &Resource, err: HalError) -> FadError {
    log::error!("failed to acquire {:?}: {:?}", what, err);
    FadError::ResourceExhausted
}

impl Ladder {
    pub fn new(platform: Arc<dyn Platform>) -> Ladder {
        Ladder {
            platform,
            held: Vec::new(),
        }
    }

    /// Resources currently held, in acquisition order.
    pub fn held(&self) -> &[Resource] {
        &self.held
    }

    fn push(&mut self, res: Resource) {
        debug_ex!(target: "fad::ladder", "acquired {:?}", res);
        self.held.push(res);
    }

    fn resolve_gpio(&self, name: &'static str) -> FadResult<u32> {
        self.platform.named_gpio(name).ok_or_else(|| {
            log::error!("gpio '{}' is not described for this board", name);
            FadError::ResourceExhausted
        })
    }

    fn request_gpio(&mut self, name: &'static str) -> FadResult<u32> {
        let pin = self.resolve_gpio(name)?;
        self.platform
            .gpio_request(pin, name)
            .map_err(|err| exhausted(&Resource::Gpio(pin), err))?;
        self.push(Resource::Gpio(pin));
        Ok(pin)
    }

    /// Request the named GPIO as an input.
    pub fn gpio_input(&mut self, name: &'static str) -> FadResult<u32> {
        let pin = self.request_gpio(name)?;
        self.platform
            .gpio_direction_input(pin)
            .map_err(|err| exhausted(&Resource::Gpio(pin), err))?;
        Ok(pin)
    }

    /// Request the named GPIO as an output driven to `value`.
    pub fn gpio_output(&mut self, name: &'static str, value: bool) -> FadResult<u32> {
        let pin = self.request_gpio(name)?;
        self.platform
            .gpio_direction_output(pin, value)
            .map_err(|err| exhausted(&Resource::Gpio(pin), err))?;
        Ok(pin)
    }

    pub fn irq(&mut self, line: IrqLine, trigger: Trigger, label: &'static str) -> FadResult<()> {
        self.platform
            .irq_request(line, trigger, label)
            .map_err(|err| exhausted(&Resource::Irq(line), err))?;
        self.push(Resource::Irq(line));
        Ok(())
    }

    pub fn i2c(&mut self, bus: u32) -> FadResult<Arc<dyn I2cBus>> {
        let handle = self
            .platform
            .i2c_get(bus)
            .map_err(|err| exhausted(&Resource::I2c(bus), err))?;
        self.push(Resource::I2c(bus));
        Ok(handle)
    }

    pub fn regulator(&mut self, name: &'static str) -> FadResult<Arc<dyn Regulator>> {
        let handle = self
            .platform
            .regulator_get(name)
            .map_err(|err| exhausted(&Resource::Regulator(name), err))?;
        self.push(Resource::Regulator(name));
        Ok(handle)
    }

    pub fn led(&mut self, name: &'static str) -> FadResult<Arc<dyn Led>> {
        let handle = self
            .platform
            .led_get(name)
            .map_err(|err| exhausted(&Resource::Led(name), err))?;
        self.push(Resource::Led(name));
        Ok(handle)
    }

    pub fn pwm(&mut self, id: u32) -> FadResult<Arc<dyn Pwm>> {
        let handle = self
            .platform
            .pwm_get(id)
            .map_err(|err| exhausted(&Resource::Pwm(id), err))?;
        self.push(Resource::Pwm(id));
        Ok(handle)
    }

    pub fn watchdog(&mut self) -> FadResult<Arc<dyn WatchdogHw>> {
        let handle = self
            .platform
            .watchdog_get()
            .map_err(|err| exhausted(&Resource::Watchdog, err))?;
        self.push(Resource::Watchdog);
        Ok(handle)
    }

    pub fn rangefinder(&mut self) -> FadResult<Arc<dyn RangeFinder>> {
        let handle = self
            .platform
            .rangefinder_get()
            .map_err(|err| exhausted(&Resource::RangeFinder, err))?;
        self.push(Resource::RangeFinder);
        Ok(handle)
    }

    /// Release everything, newest first.
    pub fn release_all(&mut self) {
        while let Some(res) = self.held.pop() {
            debug_ex!(target: "fad::ladder", "releasing {:?}", res);
            match res {
                Resource::Gpio(pin) => self.platform.gpio_free(pin),
                Resource::Irq(line) => self.platform.irq_free(line),
                Resource::I2c(bus) => self.platform.i2c_put(bus),
                Resource::Regulator(name) => self.platform.regulator_put(name),
                Resource::Led(name) => self.platform.led_put(name),
                Resource::Pwm(id) => self.platform.pwm_put(id),
                Resource::Watchdog => self.platform.watchdog_put(),
                Resource::RangeFinder => self.platform.rangefinder_put(),
            }
        }
    }
}

impl Drop for Ladder {
    fn drop(&mut self) {
        self.release_all();
    }
}
