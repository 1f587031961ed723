//! EC101 "ninjago" boards with a laser rangefinder module.
//!
//! The laser button only reports state here; emission is commanded through the rangefinder,
//! gated by the laser enable. Four supplies feed the optics and sensors and follow system
//! suspend. The optics supply is also switched by the charger-suspend request, so every
//! supply sits behind a [GuardedRegulator].

use alloc::{boxed::Box, sync::Arc, vec::Vec};

use fad_api::{LaserMode, LaserModeKind, LaserStatus};

use super::{Board, BoardDescriptor, Capabilities, ladder::Ladder};
use crate::{
    config::FadConfig,
    error::FadResult,
    hal::{IrqLine, Platform, RangeCommand, RangeFinder, Trigger},
    regulator::{self, GuardedRegulator},
};

const GPIO_LASER_ON: &str = "laser_on";
/// Index of the optics supply in [DESCRIPTOR]`.regulators`.
const OPTICS_POWER: usize = 0;

pub static DESCRIPTOR: BoardDescriptor = BoardDescriptor {
    name: "ninjago",
    compatible: &["flir,ec101"],
    soc: None,
    caps: Capabilities::from_bits_truncate(
        Capabilities::LASER.bits()
            | Capabilities::LASER_DISTANCE.bits()
            | Capabilities::GPS.bits(),
    ),
    regulators: &["optics_power", "position_sensor", "ring_sensor", "motor_sleep"],
    leds: &[],
    setup,
};

pub struct Ninjago {
    // Dropped ahead of the ladder so supplies go off before their handles are put.
    supplies: Vec<GuardedRegulator>,
    ladder: Ladder,
    caps: Capabilities,
    rangefinder: Arc<dyn RangeFinder>,
    laser_enable: bool,
    active: bool,
    mode: LaserMode,
}

fn setup(
    desc: &'static BoardDescriptor,
    platform: &Arc<dyn Platform>,
    _config: &FadConfig,
) -> FadResult<Box<dyn Board>> {
    let mut caps = desc.caps;
    if platform.property_u32("hasGPS") == Some(0) {
        caps.remove(Capabilities::GPS);
    }

    let mut ladder = Ladder::new(platform.clone());
    ladder.gpio_input(GPIO_LASER_ON)?;
    ladder.irq(IrqLine::LaserButton, Trigger::Falling, "LaserON")?;
    let rangefinder = ladder.rangefinder()?;

    let mut supplies = Vec::with_capacity(desc.regulators.len());
    for name in desc.regulators {
        supplies.push(GuardedRegulator::new(*name, ladder.regulator(*name)?));
    }
    regulator::enable_all(&mut supplies)?;

    Ok(Box::new(Ninjago {
        supplies,
        ladder,
        caps,
        rangefinder,
        laser_enable: false,
        active: false,
        mode: LaserMode {
            mode: LaserModeKind::Pointer,
            continuous: false,
            accuracy: fad_api::Accuracy::None,
        },
    }))
}

impl Ninjago {
    fn start(&self) -> FadResult<()> {
        let cmd = match self.mode.mode {
            LaserModeKind::Pointer => RangeCommand::Pointer,
            LaserModeKind::Distance if self.mode.continuous => {
                RangeCommand::Continuous(self.mode.accuracy)
            }
            LaserModeKind::Distance => RangeCommand::Single(self.mode.accuracy),
        };
        debug_ex!("rangefinder start: {:?}", cmd);
        Ok(self.rangefinder.command(cmd)?)
    }

    fn stop(&mut self) -> FadResult<()> {
        self.active = false;
        Ok(self.rangefinder.command(RangeCommand::Stop)?)
    }

    fn disable_supplies(&mut self) -> FadResult<()> {
        regulator::disable_all(&mut self.supplies)
    }
}

impl Board for Ninjago {
    fn name(&self) -> &'static str {
        DESCRIPTOR.name
    }

    fn capabilities(&self) -> Capabilities {
        self.caps
    }

    fn get_laser_status(&mut self) -> FadResult<LaserStatus> {
        Ok(LaserStatus {
            power_enabled: self.laser_enable,
            is_on: self.rangefinder.is_emitting()?,
        })
    }

    fn set_laser_status(&mut self, enable: bool) -> FadResult<()> {
        self.laser_enable = enable;
        if !enable {
            self.stop()?;
        }
        Ok(())
    }

    fn get_laser_active(&mut self) -> FadResult<bool> {
        Ok(self.active)
    }

    fn set_laser_active(&mut self, active: bool) -> FadResult<()> {
        if !active {
            return self.stop();
        }
        if !self.laser_enable {
            log::warn!("laser activation ignored, laser is disabled");
            return Ok(());
        }
        self.start()?;
        self.active = true;
        Ok(())
    }

    fn set_laser_mode(&mut self, mode: LaserMode) -> FadResult<()> {
        self.mode = mode;
        if self.active {
            self.start()?;
        }
        Ok(())
    }

    fn get_gps_enable(&mut self) -> FadResult<bool> {
        Ok(true)
    }

    fn set_gps_enable(&mut self, _enable: bool) -> FadResult<()> {
        Ok(())
    }

    fn suspend(&mut self) -> FadResult<()> {
        if self.active {
            self.stop()?;
        }
        self.disable_supplies()
    }

    fn resume(&mut self) -> FadResult<()> {
        for supply in self.supplies.iter_mut() {
            supply.enable()?;
        }
        Ok(())
    }

    fn set_charger_suspend(&mut self, suspend: bool) -> FadResult<()> {
        let optics = &mut self.supplies[OPTICS_POWER];
        if suspend {
            optics.disable()
        } else {
            optics.enable()
        }
    }

    fn teardown(&mut self) {
        if let Err(err) = self.stop() {
            log::warn!("rangefinder stop failed during teardown: {}", err);
        }
        if let Err(err) = self.disable_supplies() {
            log::warn!("supplies left enabled: {}", err);
        }
        self.supplies.clear();
        self.ladder.release_all();
    }
}
