//! i.MX6S "neco" boards: digital I/O, trigger button and the KAKA status LED.

use alloc::{boxed::Box, sync::Arc};

use fad_api::{DigitalIo, Led, LedColor, LedState};

use super::{Board, BoardDescriptor, Capabilities, ladder::Ladder};
use crate::{
    config::FadConfig,
    error::FadResult,
    hal::{IrqLine, Led as LedDevice, Platform, SocFamily, Trigger},
};

const GPIO_DIGIN: [&str; 2] = ["digin0", "digin1"];
const GPIO_DIGOUT0: &str = "digout0";
const GPIO_TRIGGER: &str = "trigger";
const LED_RED: &str = "kaka_red";
const LED_GREEN: &str = "kaka_green";

const LED_FULL: u8 = 255;
/// Half periods of the flash states, 1 Hz and 3 Hz.
const FLASH_SLOW_MS: u32 = 500;
const FLASH_FAST_MS: u32 = 167;

pub static DESCRIPTOR: BoardDescriptor = BoardDescriptor {
    name: "neco",
    compatible: &["flir,neco"],
    soc: Some(SocFamily::Imx6S),
    caps: Capabilities::from_bits_truncate(
        Capabilities::DIGITAL_IO.bits()
            | Capabilities::KAKA_LED.bits()
            | Capabilities::TRIGGER.bits(),
    ),
    regulators: &[],
    leds: &[LED_RED, LED_GREEN],
    setup,
};

pub struct Neco {
    platform: Arc<dyn Platform>,
    ladder: Ladder,
    caps: Capabilities,
    digin: [u32; 2],
    digout: u32,
    trigger: u32,
    red: Arc<dyn LedDevice>,
    green: Arc<dyn LedDevice>,
    kaka: Led,
}

fn setup(
    desc: &'static BoardDescriptor,
    platform: &Arc<dyn Platform>,
    _config: &FadConfig,
) -> FadResult<Box<dyn Board>> {
    let mut ladder = Ladder::new(platform.clone());

    let mut digin = [0u32; 2];
    for (n, name) in GPIO_DIGIN.into_iter().enumerate() {
        digin[n] = ladder.gpio_input(name)?;
        ladder.irq(IrqLine::DigitalInput(n as u8), Trigger::Falling, name)?;
    }
    let digout = ladder.gpio_output(GPIO_DIGOUT0, false)?;
    let trigger = ladder.gpio_input(GPIO_TRIGGER)?;
    ladder.irq(IrqLine::Trigger, Trigger::Falling, "Trigger")?;

    let [red_name, green_name] = desc.led_names()?;
    let red = ladder.led(red_name)?;
    let green = ladder.led(green_name)?;
    red.set_brightness(0);
    green.set_brightness(0);

    Ok(Box::new(Neco {
        platform: platform.clone(),
        ladder,
        caps: desc.caps,
        digin,
        digout,
        trigger,
        red,
        green,
        kaka: Led {
            color: LedColor::Off,
            state: LedState::Off,
        },
    }))
}

impl Neco {
    fn drive(led: &dyn LedDevice, lit: bool, state: LedState) {
        match (lit, state) {
            (false, _) | (_, LedState::Off) => led.set_brightness(0),
            (true, LedState::On) => led.set_brightness(LED_FULL),
            (true, LedState::FlashSlow) => led.blink(FLASH_SLOW_MS, FLASH_SLOW_MS),
            (true, LedState::FlashFast) => led.blink(FLASH_FAST_MS, FLASH_FAST_MS),
        }
    }
}

impl Board for Neco {
    fn name(&self) -> &'static str {
        DESCRIPTOR.name
    }

    fn capabilities(&self) -> Capabilities {
        self.caps
    }

    fn get_kaka_led(&mut self) -> FadResult<Led> {
        Ok(self.kaka)
    }

    fn set_kaka_led(&mut self, led: Led) -> FadResult<()> {
        let (red, green) = match led.color {
            LedColor::Off => (false, false),
            LedColor::Green => (false, true),
            LedColor::Red => (true, false),
            LedColor::Yellow => (true, true),
        };
        Self::drive(self.red.as_ref(), red, led.state);
        Self::drive(self.green.as_ref(), green, led.state);
        self.kaka = led;
        Ok(())
    }

    fn get_digital_status(&mut self) -> FadResult<DigitalIo> {
        let mut input_state = 0u16;
        for (n, pin) in self.digin.iter().enumerate() {
            if self.platform.gpio_get(*pin)? {
                input_state |= 1 << n;
            }
        }
        let output_state = self.platform.gpio_get(self.digout)? as u16;
        Ok(DigitalIo {
            num_in: self.digin.len() as u8,
            num_out: 1,
            input_state,
            output_state,
            output_set: 0,
            output_clear: 0,
        })
    }

    fn get_trigger_pressed(&mut self) -> FadResult<bool> {
        Ok(!self.platform.gpio_get(self.trigger)?)
    }

    fn teardown(&mut self) {
        self.red.set_brightness(0);
        self.green.set_brightness(0);
        self.ladder.release_all();
    }
}
