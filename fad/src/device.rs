//! The device context.
//!
//! One [FadDevice] exists per attached control device. It owns the board selected at attach
//! and every piece of runtime state; all entry points take `&self`:
//! - The device lock (`state`) serializes board operations and suspend-flag changes.
//! - Events, deferred-work bits, edge trackers and power bookkeeping are atomics, so the
//!   interrupt path never takes a lock.
//! - The HDMI PHY has its own lock and is driven outside the device lock.

use alloc::{boxed::Box, sync::Arc};

use fad_api::{RestartReason, SECURITY_PARAMS_VERSION, SecurityParams};
use spin::{Mutex, MutexGuard};

use crate::{
    board::{Board, BoardRegistry, Capabilities},
    config::FadConfig,
    error::{FadError, FadResult},
    event::{DeferredWork, EdgeTrackers, EventMailbox},
    hal::Platform,
    hdmi::HdmiPhy,
    power::PowerState,
    watchdog::WatchdogState,
};

/// State guarded by the device lock.
pub(crate) struct DeviceState {
    pub(crate) board: Box<dyn Board>,
    pub(crate) suspended: bool,
    /// Bumped whenever a buzzer tone starts.
    pub(crate) tone_epoch: u32,
    pub(crate) torn_down: bool,
}

pub struct FadDevice {
    pub(crate) platform: Arc<dyn Platform>,
    pub(crate) config: FadConfig,
    caps: Capabilities,
    board_name: &'static str,
    pub(crate) state: Mutex<DeviceState>,
    pub(crate) hdmi: Option<Arc<HdmiPhy>>,
    pub(crate) events: EventMailbox,
    pub(crate) work: DeferredWork,
    pub(crate) edges: EdgeTrackers,
    pub(crate) power: PowerState,
    pub(crate) watchdog: WatchdogState,
    restart_reason: RestartReason,
    security: SecurityParams,
}

impl FadDevice {
    /// Detect the board, run its setup and build the context.
    ///
    /// Fails with `NotSupported` for an unknown platform and `ResourceExhausted` when setup
    /// could not acquire its resources; nothing stays acquired in either case.
    pub fn attach(
        platform: Arc<dyn Platform>,
        registry: &BoardRegistry,
        config: FadConfig,
    ) -> FadResult<FadDevice> {
        let board = registry.setup(&platform, &config)?;
        let caps = board.capabilities();
        let hdmi = if caps.contains(Capabilities::HDMI) {
            board.hdmi_phy()
        } else {
            None
        };
        let security = SecurityParams {
            version: SECURITY_PARAMS_VERSION,
            required_config_level: platform.property_u32("requiredConfigCFClevel").unwrap_or(0),
            require_30hz_level: platform.property_u32("require30HzCFClevel").unwrap_or(0),
            unique_id: platform.unique_id(),
        };

        let dev = FadDevice {
            restart_reason: platform.restart_reason(),
            board_name: board.name(),
            power: PowerState::new(&config),
            platform,
            config,
            caps,
            state: Mutex::new(DeviceState {
                board,
                suspended: false,
                tone_epoch: 0,
                torn_down: false,
            }),
            hdmi,
            events: EventMailbox::new(),
            work: DeferredWork::new(),
            edges: EdgeTrackers::new(),
            watchdog: WatchdogState::new(),
            security,
        };

        // Bring up a display that is already plugged in.
        if let Some(phy) = &dev.hdmi {
            if let Err(err) = phy.on_hotplug(dev.platform.as_ref()) {
                log::warn!("initial hdmi evaluation failed: {}", err);
            }
        }
        log::info!("attached '{}' with {:?}", dev.board_name, dev.caps);
        Ok(dev)
    }

    pub fn capabilities(&self) -> Capabilities {
        self.caps
    }

    pub fn board_name(&self) -> &'static str {
        self.board_name
    }

    pub fn restart_reason(&self) -> RestartReason {
        self.restart_reason
    }

    pub fn security_params(&self) -> SecurityParams {
        self.security
    }

    /// Take the device lock. Fails once the device has been detached.
    pub(crate) fn lock_state(&self) -> FadResult<MutexGuard<'_, DeviceState>> {
        let state = self.state.lock();
        if state.torn_down {
            return Err(FadError::NotSupported);
        }
        Ok(state)
    }

    /// Run one board operation under the device lock.
    pub(crate) fn with_board<R>(
        &self,
        op: impl FnOnce(&mut dyn Board) -> FadResult<R>,
    ) -> FadResult<R> {
        let mut state = self.lock_state()?;
        op(state.board.as_mut())
    }

    /// Release a blocked reader, quiesce the board and release its resources.
    /// Later calls are no-ops.
    pub fn detach(&self) {
        self.post_event(fad_api::FadEvent::Reset);
        let mut state = self.state.lock();
        if state.torn_down {
            return;
        }
        state.board.teardown();
        state.torn_down = true;
        log::info!("detached '{}'", self.board_name);
    }
}

impl Drop for FadDevice {
    fn drop(&mut self) {
        self.detach();
    }
}
