//! Board capability tables and the board selector.
//!
//! Responsibilities:
//! - Define the [Board] trait: one method per peripheral operation. An operation the board
//!   does not override reports [FadError::NotSupported] and touches nothing, which is how
//!   an absent capability looks to the dispatcher.
//! - Describe each board family with a [BoardDescriptor]: its compatible strings, SoC
//!   family, capability flags, resource names and setup constructor.
//! - Select and run the setup of the descriptor matching the running platform
//!   ([BoardRegistry::setup]).
//!
//! Ownership notes:
//! - Setup resolves every resource through a [ladder::Ladder] owned by the returned board;
//!   [Board::teardown] releases it in reverse order.
//! - A failed setup drops its ladder before returning, so nothing half-initialized escapes.

pub mod ec702;
pub mod keypad;
pub mod ladder;
pub mod neco;
pub mod ninjago;
pub mod pico;
pub mod roco;

use alloc::{boxed::Box, collections::btree_map::BTreeMap, sync::Arc, vec, vec::Vec};

use bitflags::bitflags;
use fad_api::{DigitalIo, LaserMode, LaserStatus, Led, SubjectiveLevel};

use crate::{
    config::FadConfig,
    error::{FadError, FadResult},
    hal::{Platform, PlatformId, SocFamily},
    hdmi::HdmiPhy,
};

bitflags! {
    /// Peripherals physically present on a board.
    pub struct Capabilities: u32 {
        const LASER          = 1 << 0;
        const GPS            = 1 << 1;
        const DIGITAL_IO     = 1 << 2;
        /// Dual-LED status indicator.
        const KAKA_LED       = 1 << 3;
        const BUZZER         = 1 << 4;
        const KP_BACKLIGHT   = 1 << 5;
        /// Laser emission follows the laser button in software.
        const SOFTWARE_LASER = 1 << 6;
        const TRIGGER        = 1 << 7;
        const HDMI           = 1 << 8;
        const FIVE_V_ENABLE  = 1 << 9;
        const FOCUS_MODULE   = 1 << 10;
        /// Laser rangefinder with pointer and distance modes.
        const LASER_DISTANCE = 1 << 11;
        const WATCHDOG       = 1 << 12;
    }
}

/// Per-board capability table.
///
/// Methods run with the device lock held, except [Board::hdmi_phy] which is queried once at
/// attach. None of them may be called from interrupt context.
pub trait Board: Send {
    fn name(&self) -> &'static str;
    /// Capability flags resolved during setup. Must not change afterwards.
    fn capabilities(&self) -> Capabilities;

    fn get_laser_status(&mut self) -> FadResult<LaserStatus> {
        Err(FadError::NotSupported)
    }
    fn set_laser_status(&mut self, _enable: bool) -> FadResult<()> {
        Err(FadError::NotSupported)
    }
    /// Re-evaluate the laser output after a laser button edge.
    fn update_laser_output(&mut self) -> FadResult<()> {
        Err(FadError::NotSupported)
    }
    fn get_laser_active(&mut self) -> FadResult<bool> {
        Err(FadError::NotSupported)
    }
    fn set_laser_active(&mut self, _active: bool) -> FadResult<()> {
        Err(FadError::NotSupported)
    }
    fn set_laser_mode(&mut self, _mode: LaserMode) -> FadResult<()> {
        Err(FadError::NotSupported)
    }
    fn get_gps_enable(&mut self) -> FadResult<bool> {
        Err(FadError::NotSupported)
    }
    fn set_gps_enable(&mut self, _enable: bool) -> FadResult<()> {
        Err(FadError::NotSupported)
    }
    fn get_kaka_led(&mut self) -> FadResult<Led> {
        Err(FadError::NotSupported)
    }
    fn set_kaka_led(&mut self, _led: Led) -> FadResult<()> {
        Err(FadError::NotSupported)
    }
    /// Keypad backlight in percent.
    fn get_keypad_backlight(&mut self) -> FadResult<u8> {
        Err(FadError::NotSupported)
    }
    fn set_keypad_backlight(&mut self, _percent: u8) -> FadResult<()> {
        Err(FadError::NotSupported)
    }
    fn get_keypad_subj_backlight(&mut self) -> FadResult<SubjectiveLevel> {
        Err(FadError::NotSupported)
    }
    fn set_keypad_subj_backlight(&mut self, _level: SubjectiveLevel) -> FadResult<()> {
        Err(FadError::NotSupported)
    }
    /// Program the buzzer. `freq == 0` or `pwm == 0` silences it.
    fn set_buzzer_frequency(&mut self, _freq: u16, _pwm: u8) -> FadResult<()> {
        Err(FadError::NotSupported)
    }
    fn get_digital_status(&mut self) -> FadResult<DigitalIo> {
        Err(FadError::NotSupported)
    }
    fn get_trigger_pressed(&mut self) -> FadResult<bool> {
        Err(FadError::NotSupported)
    }
    /// Program the watchdog timeout in half-second ticks.
    fn watchdog_init(&mut self, _ticks: u8) -> FadResult<()> {
        Err(FadError::NotSupported)
    }
    fn watchdog_service(&mut self) -> FadResult<()> {
        Err(FadError::NotSupported)
    }
    fn suspend(&mut self) -> FadResult<()> {
        Ok(())
    }
    fn resume(&mut self) -> FadResult<()> {
        Ok(())
    }
    fn set_charger_suspend(&mut self, _suspend: bool) -> FadResult<()> {
        Err(FadError::NotSupported)
    }
    fn hdmi_phy(&self) -> Option<Arc<HdmiPhy>> {
        None
    }
    /// Quiesce the hardware and release every resource acquired by setup.
    fn teardown(&mut self);
}

/// Board setup constructor.
pub type SetupFn =
    fn(&'static BoardDescriptor, &Arc<dyn Platform>, &FadConfig) -> FadResult<Box<dyn Board>>;

/// Static description of a board family.
pub struct BoardDescriptor {
    pub name: &'static str,
    pub compatible: &'static [&'static str],
    /// SoC family used when no compatible string matches.
    pub soc: Option<SocFamily>,
    /// Capabilities the family can have. Setup may narrow them from board properties.
    pub caps: Capabilities,
    pub regulators: &'static [&'static str],
    pub leds: &'static [&'static str],
    pub setup: SetupFn,
}

impl BoardDescriptor {
    /// The regulator table as exactly `N` names.
    pub fn regulator_names<const N: usize>(&self) -> FadResult<[&'static str; N]> {
        self.exact("regulators", self.regulators)
    }

    /// The LED table as exactly `N` names.
    pub fn led_names<const N: usize>(&self) -> FadResult<[&'static str; N]> {
        self.exact("LEDs", self.leds)
    }

    fn exact<const N: usize>(
        &self,
        what: &str,
        table: &'static [&'static str],
    ) -> FadResult<[&'static str; N]> {
        table.try_into().map_err(|_| {
            log::error!(
                "board '{}' describes {} {}, expected {}",
                self.name,
                table.len(),
                what,
                N
            );
            FadError::ResourceExhausted
        })
    }
}

impl core::fmt::Debug for BoardDescriptor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BoardDescriptor")
            .field("name", &self.name)
            .field("compatible", &self.compatible)
            .finish()
    }
}

/// Board descriptors keyed by compatible string and SoC family.
pub struct BoardRegistry {
    comp_map: BTreeMap<&'static str, Vec<&'static BoardDescriptor>>,
    soc_map: BTreeMap<SocFamily, &'static BoardDescriptor>,
}

impl BoardRegistry {
    pub fn new() -> BoardRegistry {
        BoardRegistry {
            comp_map: BTreeMap::new(),
            soc_map: BTreeMap::new(),
        }
    }

    /// Registry holding every built-in board family.
    pub fn builtin() -> BoardRegistry {
        let mut reg = BoardRegistry::new();
        for desc in [
            &pico::DESCRIPTOR,
            &neco::DESCRIPTOR,
            &roco::DESCRIPTOR,
            &ninjago::DESCRIPTOR,
            &ec702::DESCRIPTOR,
        ] {
            reg.register(desc);
        }
        reg
    }

    pub fn register(&mut self, desc: &'static BoardDescriptor) {
        debug_ex!("\tRegistered board '{}'.", desc.name);
        for comp in desc.compatible {
            self.comp_map.entry(*comp).or_insert_with(|| vec![]).push(desc);
        }
        if let Some(soc) = desc.soc {
            self.soc_map.entry(soc).or_insert(desc);
        }
    }

    /// Descriptor for `id`: first by compatible string, then by SoC family.
    pub fn find(&self, id: &PlatformId) -> Option<&'static BoardDescriptor> {
        self.comp_map
            .get(id.compatible.as_str())
            .and_then(|descs| descs.first().copied())
            .or_else(|| self.soc_map.get(&id.soc).copied())
    }

    /// Select the board for the running platform and run its setup.
    pub fn setup(
        &self,
        platform: &Arc<dyn Platform>,
        config: &FadConfig,
    ) -> FadResult<Box<dyn Board>> {
        let id = platform.identity();
        let desc = self.find(&id).ok_or_else(|| {
            log::error!("no board description for {:?}", id);
            FadError::NotSupported
        })?;
        log::info!("setting up board '{}' for {}", desc.name, id.compatible);
        (desc.setup)(desc, platform, config).map_err(|err| {
            log::error!("setup of board '{}' failed: {}", desc.name, err);
            FadError::ResourceExhausted
        })
    }
}

impl Default for BoardRegistry {
    fn default() -> Self {
        BoardRegistry::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockPlatform;
    use alloc::string::ToString;

    #[test]
    fn compatible_wins_over_soc() {
        let reg = BoardRegistry::builtin();
        let id = PlatformId {
            soc: SocFamily::Imx6Q,
            compatible: "flir,ec101".to_string(),
        };
        assert_eq!(reg.find(&id).map(|d| d.name), Some("ninjago"));
    }

    #[test]
    fn soc_family_is_the_fallback() {
        let reg = BoardRegistry::builtin();
        let id = PlatformId {
            soc: SocFamily::Imx51,
            compatible: "flir,unknown".to_string(),
        };
        assert_eq!(reg.find(&id).map(|d| d.name), Some("pico"));
    }

    #[test]
    fn unknown_platform_is_not_supported() {
        let mock = MockPlatform::with_identity(SocFamily::Other, "acme,board");
        let platform: Arc<dyn Platform> = mock;
        let result = BoardRegistry::builtin().setup(&platform, &FadConfig::default());
        assert_eq!(result.err(), Some(FadError::NotSupported));
    }

    #[test]
    fn setup_teardown_is_symmetric_for_every_board() {
        for mock in MockPlatform::all_boards() {
            let platform: Arc<dyn Platform> = mock.clone();
            let mut board = BoardRegistry::builtin()
                .setup(&platform, &FadConfig::default())
                .unwrap();
            let acquired = mock.acquires();
            board.teardown();
            let mut released = mock.releases();
            released.reverse();
            assert_eq!(acquired, released, "board {}", board.name());
        }
    }

    #[test]
    fn failed_setup_unwinds_and_reports_exhaustion() {
        use ladder::Resource;
        let mock = MockPlatform::roco();
        mock.fail_acquire(Resource::Regulator("rori_opt_3v6"));
        let platform: Arc<dyn Platform> = mock.clone();
        let result = BoardRegistry::builtin().setup(&platform, &FadConfig::default());
        assert_eq!(result.err(), Some(FadError::ResourceExhausted));
        assert!(!mock.acquires().is_empty());
        assert!(mock.ledger_balanced());
    }
}
