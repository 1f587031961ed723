//! i.MX51 "pico" boards.
//!
//! Laser and supply enables sit on the shared IO-expander, the laser button and HDMI
//! hot-plug are GPIO interrupts, the buzzer is a PWM channel and the keypad backlight is a
//! PMIC current sink with five levels. GPS is always powered.

use alloc::{boxed::Box, sync::Arc};

use fad_api::{LaserStatus, SubjectiveLevel};

use super::{Board, BoardDescriptor, Capabilities, keypad::KeypadLevels, ladder::Ladder};
use crate::{
    config::FadConfig,
    error::{FadError, FadResult},
    hal::{IrqLine, Led, Platform, Pwm, SocFamily, Trigger, WatchdogHw},
    hdmi::HdmiPhy,
    ioport::{IoExpander, IoPortBits},
};

const IOPORT_BUS: u32 = 0;
const IOPORT_ADDR: u8 = 0x46 >> 1;
const HDMI_BUS: u32 = 1;
const HDMI_ADDR: u8 = 0x72 >> 1;
const BUZZER_PWM: u32 = 0;
const KP_BACKLIGHT: &str = "kp_backlight";

const GPIO_LASER_ON: &str = "laser_on";
const GPIO_3V6A_EN: &str = "3v6a_en";
const GPIO_HDMI_INT: &str = "hdmi_int";

/// PMIC keypad sink steps, 25 % each.
const KP_PERCENT_PER_LEVEL: u8 = 25;

pub static DESCRIPTOR: BoardDescriptor = BoardDescriptor {
    name: "pico",
    compatible: &["flir,pico"],
    soc: Some(SocFamily::Imx51),
    caps: Capabilities::from_bits_truncate(
        Capabilities::LASER.bits()
            | Capabilities::GPS.bits()
            | Capabilities::FIVE_V_ENABLE.bits()
            | Capabilities::BUZZER.bits()
            | Capabilities::KP_BACKLIGHT.bits()
            | Capabilities::SOFTWARE_LASER.bits()
            | Capabilities::HDMI.bits()
            | Capabilities::WATCHDOG.bits(),
    ),
    regulators: &[],
    leds: &[KP_BACKLIGHT],
    setup,
};

/// PWM period and duty in microseconds for a tone, `None` when silent.
pub fn buzzer_timing(freq: u16, pwm: u8) -> Option<(u32, u32)> {
    if freq == 0 || pwm == 0 {
        return None;
    }
    let period = (1_000_000 / freq as u32).clamp(10, 0xFFFE);
    let duty = ((period * pwm as u32 + 50) / 100).max(1);
    Some((period, duty))
}

pub struct Pico {
    platform: Arc<dyn Platform>,
    ladder: Ladder,
    caps: Capabilities,
    ioport: IoExpander,
    laser_on: u32,
    pin_3v6a: u32,
    pwm: Arc<dyn Pwm>,
    kp_backlight: Arc<dyn Led>,
    wdog: Arc<dyn WatchdogHw>,
    hdmi: Arc<HdmiPhy>,
    levels: KeypadLevels,
    laser_enable: bool,
}

fn setup(
    desc: &'static BoardDescriptor,
    platform: &Arc<dyn Platform>,
    config: &FadConfig,
) -> FadResult<Box<dyn Board>> {
    let mut ladder = Ladder::new(platform.clone());

    let ioport = IoExpander::new(ladder.i2c(IOPORT_BUS)?, IOPORT_ADDR);
    ioport.set(IoPortBits::VCM_LED_EN | IoPortBits::FOCUS_POWER_EN, true)?;
    ioport.set(IoPortBits::LASER_SWITCH_ON | IoPortBits::LASER_SOFT_ON, false)?;
    ioport.configure_outputs(IoPortBits::all())?;

    let laser_on = ladder.gpio_input(GPIO_LASER_ON)?;
    ladder.irq(IrqLine::LaserButton, Trigger::Falling, "LaserON")?;
    let pin_3v6a = ladder.gpio_output(GPIO_3V6A_EN, true)?;

    let hdmi_bus = ladder.i2c(HDMI_BUS)?;
    ladder.gpio_input(GPIO_HDMI_INT)?;
    ladder.irq(IrqLine::HdmiHotplug, Trigger::Falling, "HdmiInt")?;

    let pwm = ladder.pwm(BUZZER_PWM)?;
    let [kp_name] = desc.led_names()?;
    let kp_backlight = ladder.led(kp_name)?;
    let wdog = ladder.watchdog()?;

    Ok(Box::new(Pico {
        platform: platform.clone(),
        ladder,
        caps: desc.caps,
        ioport,
        laser_on,
        pin_3v6a,
        pwm,
        kp_backlight,
        wdog,
        hdmi: Arc::new(HdmiPhy::new(
            hdmi_bus,
            HDMI_ADDR,
            config.edid_poll_interval_ms,
            config.edid_poll_retries,
        )),
        levels: config.keypad_levels.from_properties(platform.as_ref()),
        laser_enable: false,
    }))
}

impl Pico {
    fn laser_button_pressed(&self) -> FadResult<bool> {
        // Active low.
        Ok(!self.platform.gpio_get(self.laser_on)?)
    }
}

impl Board for Pico {
    fn name(&self) -> &'static str {
        DESCRIPTOR.name
    }

    fn capabilities(&self) -> Capabilities {
        self.caps
    }

    fn get_laser_status(&mut self) -> FadResult<LaserStatus> {
        Ok(LaserStatus {
            power_enabled: self.ioport.get(IoPortBits::LASER_SWITCH_ON)?,
            is_on: self.laser_button_pressed()?,
        })
    }

    fn set_laser_status(&mut self, enable: bool) -> FadResult<()> {
        self.laser_enable = enable;
        self.ioport.set(IoPortBits::LASER_SWITCH_ON, enable)?;
        if !enable {
            self.ioport.set(IoPortBits::LASER_SOFT_ON, false)?;
        }
        Ok(())
    }

    fn update_laser_output(&mut self) -> FadResult<()> {
        let emit = self.laser_enable && self.laser_button_pressed()?;
        self.ioport.set(IoPortBits::LASER_SOFT_ON, emit)
    }

    fn get_laser_active(&mut self) -> FadResult<bool> {
        self.ioport.get(IoPortBits::LASER_SOFT_ON)
    }

    fn set_laser_active(&mut self, active: bool) -> FadResult<()> {
        self.ioport.set(IoPortBits::LASER_SOFT_ON, active)
    }

    fn get_gps_enable(&mut self) -> FadResult<bool> {
        Ok(true)
    }

    fn set_gps_enable(&mut self, enable: bool) -> FadResult<()> {
        if !enable {
            log::warn!("GPS supply is not switchable on pico, keeping it on");
        }
        Ok(())
    }

    fn get_keypad_backlight(&mut self) -> FadResult<u8> {
        Ok(self.kp_backlight.brightness().saturating_mul(KP_PERCENT_PER_LEVEL))
    }

    fn set_keypad_backlight(&mut self, percent: u8) -> FadResult<()> {
        if percent > 100 {
            return Err(FadError::InvalidParameter);
        }
        let level = (percent + KP_PERCENT_PER_LEVEL / 2) / KP_PERCENT_PER_LEVEL;
        self.kp_backlight.set_brightness(level);
        Ok(())
    }

    fn get_keypad_subj_backlight(&mut self) -> FadResult<SubjectiveLevel> {
        let percent = self.get_keypad_backlight()?;
        Ok(self.levels.classify(percent))
    }

    fn set_keypad_subj_backlight(&mut self, level: SubjectiveLevel) -> FadResult<()> {
        self.set_keypad_backlight(self.levels.raw(level))
    }

    fn set_buzzer_frequency(&mut self, freq: u16, pwm: u8) -> FadResult<()> {
        match buzzer_timing(freq, pwm) {
            Some((period, duty)) => {
                debug_ex!("buzzer {} Hz: period {} us, duty {} us", freq, period, duty);
                self.pwm.configure(period, duty)?;
            }
            None => self.pwm.disable(),
        }
        Ok(())
    }

    fn watchdog_init(&mut self, ticks: u8) -> FadResult<()> {
        self.wdog.configure(ticks);
        Ok(())
    }

    fn watchdog_service(&mut self) -> FadResult<()> {
        self.wdog.service();
        Ok(())
    }

    fn suspend(&mut self) -> FadResult<()> {
        self.pwm.disable();
        self.ioport.set(
            IoPortBits::VCM_LED_EN
                | IoPortBits::FOCUS_POWER_EN
                | IoPortBits::LASER_SOFT_ON,
            false,
        )?;
        self.platform.gpio_set(self.pin_3v6a, false)?;
        Ok(())
    }

    fn resume(&mut self) -> FadResult<()> {
        self.platform.gpio_set(self.pin_3v6a, true)?;
        self.ioport
            .set(IoPortBits::VCM_LED_EN | IoPortBits::FOCUS_POWER_EN, true)
    }

    fn hdmi_phy(&self) -> Option<Arc<HdmiPhy>> {
        Some(self.hdmi.clone())
    }

    fn teardown(&mut self) {
        self.pwm.disable();
        if let Err(err) = self
            .ioport
            .set(IoPortBits::LASER_SWITCH_ON | IoPortBits::LASER_SOFT_ON, false)
        {
            log::warn!("could not switch laser off during teardown: {}", err);
        }
        self.ladder.release_all();
    }
}
