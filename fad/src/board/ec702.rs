//! EC702 boards. GPS is the only peripheral and it is always powered.

use alloc::{boxed::Box, sync::Arc};

use super::{Board, BoardDescriptor, Capabilities, ladder::Ladder};
use crate::{config::FadConfig, error::FadResult, hal::Platform};

pub static DESCRIPTOR: BoardDescriptor = BoardDescriptor {
    name: "ec702",
    compatible: &["flir,ec702"],
    soc: None,
    caps: Capabilities::GPS,
    regulators: &[],
    leds: &[],
    setup,
};

pub struct Ec702 {
    ladder: Ladder,
    caps: Capabilities,
}

fn setup(
    desc: &'static BoardDescriptor,
    platform: &Arc<dyn Platform>,
    _config: &FadConfig,
) -> FadResult<Box<dyn Board>> {
    let caps = match platform.property_u32("hasGPS") {
        Some(0) => Capabilities::empty(),
        _ => desc.caps,
    };
    Ok(Box::new(Ec702 {
        ladder: Ladder::new(platform.clone()),
        caps,
    }))
}

impl Board for Ec702 {
    fn name(&self) -> &'static str {
        DESCRIPTOR.name
    }

    fn capabilities(&self) -> Capabilities {
        self.caps
    }

    fn get_gps_enable(&mut self) -> FadResult<bool> {
        Ok(true)
    }

    fn set_gps_enable(&mut self, _enable: bool) -> FadResult<()> {
        Ok(())
    }

    fn teardown(&mut self) {
        self.ladder.release_all();
    }
}
