//! i.MX6Q "roco" boards, described by board properties.
//!
//! Every optional peripheral is announced by a board property; a missing property means the
//! hardware is absent. The I2C bus numbers come from `i2c1_bus`/`i2c2_bus`. The keypad backlight is a pair of LED devices driven with raw
//! subjective levels; there is no percent control on this board.

use alloc::{boxed::Box, sync::Arc, vec::Vec};

use fad_api::{LaserStatus, SubjectiveLevel};

use super::{Board, BoardDescriptor, Capabilities, keypad::KeypadLevels, ladder::Ladder};
use crate::{
    config::FadConfig,
    error::{FadError, FadResult},
    hal::{I2cBus, IrqLine, Led, Platform, SocFamily, Trigger},
    regulator::GuardedRegulator,
};

const GPIO_LASER_ON: &str = "laser_on";
const GPIO_LASER_SOFT: &str = "laser_soft";
const GPIO_LASER_SWITCH: &str = "laser_switch";

pub static DESCRIPTOR: BoardDescriptor = BoardDescriptor {
    name: "roco",
    compatible: &["flir,roco"],
    soc: Some(SocFamily::Imx6Q),
    caps: Capabilities::from_bits_truncate(
        Capabilities::LASER.bits()
            | Capabilities::SOFTWARE_LASER.bits()
            | Capabilities::GPS.bits()
            | Capabilities::FIVE_V_ENABLE.bits()
            | Capabilities::DIGITAL_IO.bits()
            | Capabilities::KAKA_LED.bits()
            | Capabilities::BUZZER.bits()
            | Capabilities::KP_BACKLIGHT.bits(),
    ),
    regulators: &["rori_opt_3v6"],
    leds: &["pike", "pijk"],
    setup,
};

const PROPERTY_CAPS: &[(&str, Capabilities)] = &[
    ("hasLaser", Capabilities::LASER),
    ("HasSoftwareControlledLaser", Capabilities::SOFTWARE_LASER),
    ("HasGPS", Capabilities::GPS),
    ("Has5VEnable", Capabilities::FIVE_V_ENABLE),
    ("HasDigitalIO", Capabilities::DIGITAL_IO),
    ("HasKAKALed", Capabilities::KAKA_LED),
    ("HasBuzzer", Capabilities::BUZZER),
    ("HasKpBacklight", Capabilities::KP_BACKLIGHT),
];

struct LaserPins {
    on: u32,
    soft: u32,
    switch: u32,
}

pub struct Roco {
    platform: Arc<dyn Platform>,
    opt3v6: GuardedRegulator,
    keypad_leds: Vec<Arc<dyn Led>>,
    ladder: Ladder,
    caps: Capabilities,
    // Held for the sensor and keypad peripherals sharing these buses.
    _buses: [Arc<dyn I2cBus>; 2],
    laser: Option<LaserPins>,
    levels: KeypadLevels,
    laser_enable: bool,
}

fn required_property(platform: &Arc<dyn Platform>, name: &str) -> FadResult<u32> {
    platform.property_u32(name).ok_or_else(|| {
        log::error!("board property '{}' is missing", name);
        FadError::ResourceExhausted
    })
}

fn setup(
    desc: &'static BoardDescriptor,
    platform: &Arc<dyn Platform>,
    config: &FadConfig,
) -> FadResult<Box<dyn Board>> {
    let mut caps = PROPERTY_CAPS
        .iter()
        .filter(|(name, _)| platform.property_u32(name).is_some_and(|v| v != 0))
        .fold(Capabilities::empty(), |caps, (_, cap)| caps | *cap)
        & desc.caps;
    if !caps.contains(Capabilities::LASER) {
        caps.remove(Capabilities::SOFTWARE_LASER);
    }
    log::info!("roco capabilities from board properties: {:?}", caps);

    let mut ladder = Ladder::new(platform.clone());
    let bus1 = ladder.i2c(required_property(platform, "i2c1_bus")?)?;
    let bus2 = ladder.i2c(required_property(platform, "i2c2_bus")?)?;

    let laser = if caps.contains(Capabilities::LASER) {
        let on = ladder.gpio_input(GPIO_LASER_ON)?;
        ladder.irq(IrqLine::LaserButton, Trigger::Falling, "LaserON")?;
        let soft = ladder.gpio_output(GPIO_LASER_SOFT, false)?;
        let switch = ladder.gpio_output(GPIO_LASER_SWITCH, false)?;
        Some(LaserPins { on, soft, switch })
    } else {
        None
    };

    let [name] = desc.regulator_names()?;
    let mut opt3v6 = GuardedRegulator::new(name, ladder.regulator(name)?);
    opt3v6.enable()?;

    let mut keypad_leds = Vec::with_capacity(desc.leds.len());
    if caps.contains(Capabilities::KP_BACKLIGHT) {
        for name in desc.leds {
            keypad_leds.push(ladder.led(*name)?);
        }
    }

    Ok(Box::new(Roco {
        platform: platform.clone(),
        opt3v6,
        keypad_leds,
        ladder,
        caps,
        _buses: [bus1, bus2],
        laser,
        levels: config.keypad_levels.from_properties(platform.as_ref()),
        laser_enable: false,
    }))
}

impl Roco {
    fn laser(&self) -> FadResult<&LaserPins> {
        self.laser.as_ref().ok_or(FadError::NotSupported)
    }
}

impl Board for Roco {
    fn name(&self) -> &'static str {
        DESCRIPTOR.name
    }

    fn capabilities(&self) -> Capabilities {
        self.caps
    }

    fn get_laser_status(&mut self) -> FadResult<LaserStatus> {
        let pins = self.laser()?;
        Ok(LaserStatus {
            power_enabled: self.platform.gpio_get(pins.switch)?,
            is_on: !self.platform.gpio_get(pins.on)?,
        })
    }

    fn set_laser_status(&mut self, enable: bool) -> FadResult<()> {
        let (switch, soft) = {
            let pins = self.laser()?;
            (pins.switch, pins.soft)
        };
        self.laser_enable = enable;
        self.platform.gpio_set(switch, enable)?;
        if !enable {
            self.platform.gpio_set(soft, false)?;
        }
        Ok(())
    }

    fn update_laser_output(&mut self) -> FadResult<()> {
        let pins = self.laser()?;
        let emit = self.laser_enable && !self.platform.gpio_get(pins.on)?;
        self.platform.gpio_set(pins.soft, emit)?;
        Ok(())
    }

    fn get_laser_active(&mut self) -> FadResult<bool> {
        let pins = self.laser()?;
        Ok(self.platform.gpio_get(pins.soft)?)
    }

    fn set_laser_active(&mut self, active: bool) -> FadResult<()> {
        let pins = self.laser()?;
        self.platform.gpio_set(pins.soft, active)?;
        Ok(())
    }

    fn get_gps_enable(&mut self) -> FadResult<bool> {
        Ok(true)
    }

    fn set_gps_enable(&mut self, _enable: bool) -> FadResult<()> {
        Ok(())
    }

    fn get_keypad_subj_backlight(&mut self) -> FadResult<SubjectiveLevel> {
        let raw = self.keypad_leds.first().map(|led| led.brightness()).unwrap_or(0);
        if raw == 0 {
            // Dark keypad reads back as the lowest level.
            return Ok(SubjectiveLevel::Low);
        }
        Ok(self.levels.classify(raw))
    }

    fn set_keypad_subj_backlight(&mut self, level: SubjectiveLevel) -> FadResult<()> {
        let raw = self.levels.raw(level);
        for led in &self.keypad_leds {
            led.set_brightness(raw);
        }
        Ok(())
    }

    fn suspend(&mut self) -> FadResult<()> {
        self.opt3v6.disable()
    }

    fn resume(&mut self) -> FadResult<()> {
        self.opt3v6.enable()
    }

    fn teardown(&mut self) {
        for led in &self.keypad_leds {
            led.set_brightness(0);
        }
        if let Err(err) = self.opt3v6.disable() {
            log::warn!("{} left enabled: {}", self.opt3v6.name(), err);
        }
        self.keypad_leds.clear();
        self.ladder.release_all();
    }
}
