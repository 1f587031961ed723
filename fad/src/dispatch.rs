//! Request dispatch for the control device.
//!
//! [FadDevice::ioctl] resolves the request code, checks the board capability, copies and
//! decodes the payload, runs the board operation under the device lock and copies the
//! result back. A request for an absent capability fails before any copy or lock.

use fad_api::{
    Backlight, Buzzer, BuzzerState, Direction, FadEvent, GpsEnable, HdmiStatus, LaserActive,
    LaserMode, LaserStatus, Led, Payload, Request, StartReason, SubjBacklight, TrigPressed,
    WatchdogConfig,
};

use crate::{
    board::Capabilities,
    device::FadDevice,
    error::{FadError, FadResult},
};

/// A caller-supplied buffer in another address space.
pub trait UserBuffer {
    /// Fill `dst` from the start of the buffer.
    fn copy_in(&self, dst: &mut [u8]) -> Result<(), CopyError>;
    /// Write `src` to the start of the buffer.
    fn copy_out(&mut self, src: &[u8]) -> Result<(), CopyError>;
}

/// The user buffer could not be accessed or was too short.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyError;

impl From<CopyError> for FadError {
    fn from(_: CopyError) -> Self {
        FadError::CopyFault
    }
}

/// Largest payload of any request.
const MAX_PAYLOAD: usize = 32;

/// Capability a request needs. Empty means always available.
pub fn required_capability(req: Request) -> Capabilities {
    match req {
        Request::GetLaserStatus
        | Request::SetLaserStatus
        | Request::GetLaserActive
        | Request::SetLaserActive => Capabilities::LASER,
        Request::SetLaserMode => Capabilities::LASER_DISTANCE,
        Request::Buzzer => Capabilities::BUZZER,
        Request::GetDigIoStatus => Capabilities::DIGITAL_IO,
        Request::EnableWatchdog | Request::TrigWatchdog => Capabilities::WATCHDOG,
        Request::GetGpsEnable | Request::SetGpsEnable => Capabilities::GPS,
        Request::GetHdmiStatus => Capabilities::HDMI,
        Request::GetKakaLed | Request::SetKakaLed => Capabilities::KAKA_LED,
        Request::GetKpBacklight
        | Request::SetKpBacklight
        | Request::GetKpSubjBacklight
        | Request::SetKpSubjBacklight => Capabilities::KP_BACKLIGHT,
        Request::GetTrigPressed => Capabilities::TRIGGER,
        Request::GetStartReason | Request::GetSecurityParams | Request::ReleaseRead => {
            Capabilities::empty()
        }
    }
}

impl FadDevice {
    /// Execute one control request.
    pub fn ioctl(&self, code: u32, user: &mut dyn UserBuffer) -> FadResult<()> {
        let Some(req) = Request::from_code(code) else {
            debug_ex!(target: "fad::dispatch", "unknown request {:#x}", code);
            return Err(FadError::NotSupported);
        };
        if !self.capabilities().contains(required_capability(req)) {
            debug_ex!(target: "fad::dispatch", "{:?} not available on {}", req, self.board_name());
            return Err(FadError::NotSupported);
        }

        let mut buf = [0u8; MAX_PAYLOAD];
        let payload = &mut buf[..req.size()];
        if req.direction().contains(Direction::WRITE) {
            user.copy_in(payload)?;
        }
        self.execute(req, payload)?;
        if req.direction().contains(Direction::READ) {
            user.copy_out(payload)?;
        }
        Ok(())
    }

    fn execute(&self, req: Request, buf: &mut [u8]) -> FadResult<()> {
        match req {
            Request::GetLaserStatus => self.with_board(|b| b.get_laser_status())?.encode(buf)?,
            Request::SetLaserStatus => {
                let status = LaserStatus::decode(buf)?;
                self.with_board(|b| b.set_laser_status(status.power_enabled))?
            }
            Request::GetLaserActive => LaserActive {
                active: self.with_board(|b| b.get_laser_active())?,
            }
            .encode(buf)?,
            Request::SetLaserActive => {
                let req = LaserActive::decode(buf)?;
                self.with_board(|b| b.set_laser_active(req.active))?
            }
            Request::SetLaserMode => {
                let mode = LaserMode::decode(buf)?;
                self.with_board(|b| b.set_laser_mode(mode))?
            }
            Request::Buzzer => self.sound_buzzer(Buzzer::decode(buf)?)?,
            Request::GetDigIoStatus => self.with_board(|b| b.get_digital_status())?.encode(buf)?,
            Request::EnableWatchdog => self.enable_watchdog(WatchdogConfig::decode(buf)?)?,
            Request::TrigWatchdog => self.service_watchdog()?,
            Request::GetGpsEnable => GpsEnable {
                enabled: self.with_board(|b| b.get_gps_enable())?,
            }
            .encode(buf)?,
            Request::SetGpsEnable => {
                let gps = GpsEnable::decode(buf)?;
                self.with_board(|b| b.set_gps_enable(gps.enabled))?
            }
            Request::GetHdmiStatus => {
                let phy = self.hdmi.as_ref().ok_or(FadError::NotSupported)?;
                HdmiStatus {
                    present: phy.is_present()?,
                }
                .encode(buf)?
            }
            Request::GetKakaLed => self.with_board(|b| b.get_kaka_led())?.encode(buf)?,
            Request::SetKakaLed => {
                let led = Led::decode(buf)?;
                self.with_board(|b| b.set_kaka_led(led))?
            }
            Request::GetKpBacklight => Backlight {
                level: self.with_board(|b| b.get_keypad_backlight())?,
            }
            .encode(buf)?,
            Request::SetKpBacklight => {
                let backlight = Backlight::decode(buf)?;
                self.with_board(|b| b.set_keypad_backlight(backlight.level))?
            }
            Request::GetKpSubjBacklight => SubjBacklight {
                level: self.with_board(|b| b.get_keypad_subj_backlight())?,
            }
            .encode(buf)?,
            Request::SetKpSubjBacklight => {
                let subj = SubjBacklight::decode(buf)?;
                self.with_board(|b| b.set_keypad_subj_backlight(subj.level))?
            }
            Request::GetTrigPressed => TrigPressed {
                pressed: self.with_board(|b| b.get_trigger_pressed())?,
            }
            .encode(buf)?,
            Request::GetStartReason => StartReason {
                reason: self.restart_reason(),
            }
            .encode(buf)?,
            Request::GetSecurityParams => self.security_params().encode(buf)?,
            Request::ReleaseRead => self.post_event(FadEvent::Reset),
        }
        Ok(())
    }

    fn sound_buzzer(&self, req: Buzzer) -> FadResult<()> {
        if req.pwm > 100 {
            return Err(FadError::InvalidParameter);
        }
        match req.state {
            BuzzerState::Off => self.with_board(|b| b.set_buzzer_frequency(0, 0)),
            BuzzerState::On => self.start_tone(req).map(|_| ()),
            BuzzerState::Timed => {
                let epoch = self.start_tone(req)?;
                // The device lock is not held while the tone plays.
                self.platform.sleep_ms(req.time_ms as u32);
                let mut state = self.lock_state()?;
                if state.tone_epoch != epoch {
                    debug_ex!(target: "fad::dispatch", "timed tone superseded");
                    return Ok(());
                }
                state.board.set_buzzer_frequency(0, 0)
            }
        }
    }

    /// Program a tone and return its epoch.
    fn start_tone(&self, req: Buzzer) -> FadResult<u32> {
        let mut state = self.lock_state()?;
        state.board.set_buzzer_frequency(req.freq, req.pwm)?;
        state.tone_epoch = state.tone_epoch.wrapping_add(1);
        Ok(state.tone_epoch)
    }
}
