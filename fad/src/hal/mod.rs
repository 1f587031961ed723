//! Platform services the driver depends on.
//!
//! Everything outside the driver is reached through these traits: board-configuration
//! lookup, GPIO, interrupt lines, I2C buses, regulators, LEDs, PWM, the watchdog block,
//! the rangefinder module, timers, wait channels, uevents and power-off.
//!
//! [Platform] bundles the host-side traits. Device handles returned by [DeviceHost] are
//! shared (`Arc`) and may be used from any execution context that is allowed to block.

use alloc::{string::String, sync::Arc};

use fad_api::{Accuracy, RestartReason};

/// Failure reported by a platform service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalError {
    /// The transfer or register access failed.
    Io,
    /// The named resource does not exist.
    NotFound,
    /// The resource is held by someone else.
    Busy,
}

pub type HalResult<T> = Result<T, HalError>;

// region: Identity and events

/// SoC family of the running board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SocFamily {
    Imx51,
    Imx6S,
    Imx6Q,
    Other,
}

/// Platform identity used to select the board descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformId {
    pub soc: SocFamily,
    /// Board compatibility string, e.g. `flir,roco`.
    pub compatible: String,
}

/// Logical interrupt lines owned by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IrqLine {
    LaserButton,
    DigitalInput(u8),
    Trigger,
    HdmiHotplug,
}

/// Interrupt trigger edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Rising,
    Falling,
}

/// Wait channels a blocked context can park on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitChannel {
    Event,
    SuspendAck,
}

/// Notifications delivered to user space (uevents, attribute polls).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    StandbyRequested,
    Resumed,
    HdmiChanged { connected: bool },
    TriggerPoll,
}

/// Hardware wake source reported after resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeSource {
    Unknown,
    Button,
    Cable,
    /// The standby countdown alarm fired.
    Alarm,
}

/// Periodic low-priority tasks the driver asks the platform to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodicTask {
    WatchdogKick,
}

/// Commands understood by the laser rangefinder module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeCommand {
    Stop,
    Pointer,
    Single(Accuracy),
    Continuous(Accuracy),
}

// endregion

// region: Device handles

pub trait I2cBus: Send + Sync {
    /// Write `bytes` to the device at 7-bit address `addr`.
    fn write(&self, addr: u8, bytes: &[u8]) -> HalResult<()>;
    /// Write `bytes`, then read `out.len()` bytes with a repeated start.
    fn write_read(&self, addr: u8, bytes: &[u8], out: &mut [u8]) -> HalResult<()>;
}

pub trait Regulator: Send + Sync {
    fn enable(&self) -> HalResult<()>;
    fn disable(&self) -> HalResult<()>;
}

pub trait Led: Send + Sync {
    fn set_brightness(&self, value: u8);
    fn brightness(&self) -> u8;
    /// Blink with the given on/off periods until the next brightness change.
    fn blink(&self, on_ms: u32, off_ms: u32);
}

pub trait Pwm: Send + Sync {
    fn configure(&self, period_us: u32, duty_us: u32) -> HalResult<()>;
    fn disable(&self);
}

/// SoC watchdog block. `ticks` are half-second units.
pub trait WatchdogHw: Send + Sync {
    fn configure(&self, ticks: u8);
    fn service(&self);
}

pub trait RangeFinder: Send + Sync {
    fn command(&self, cmd: RangeCommand) -> HalResult<()>;
    fn is_emitting(&self) -> HalResult<bool>;
}

// endregion

// region: Host services

/// Board-configuration property lookup.
pub trait ConfigSource {
    fn identity(&self) -> PlatformId;
    fn property_u32(&self, name: &str) -> Option<u32>;
    /// Resolve a named GPIO to its pin number.
    fn named_gpio(&self, name: &str) -> Option<u32>;
    fn unique_id(&self) -> u64;
    fn restart_reason(&self) -> RestartReason;
}

pub trait GpioHost {
    fn gpio_request(&self, pin: u32, label: &'static str) -> HalResult<()>;
    fn gpio_free(&self, pin: u32);
    fn gpio_direction_input(&self, pin: u32) -> HalResult<()>;
    fn gpio_direction_output(&self, pin: u32, value: bool) -> HalResult<()>;
    fn gpio_get(&self, pin: u32) -> HalResult<bool>;
    fn gpio_set(&self, pin: u32, value: bool) -> HalResult<()>;
}

pub trait IrqHost {
    fn irq_request(&self, line: IrqLine, trigger: Trigger, label: &'static str) -> HalResult<()>;
    /// Reprogram the trigger edge. Callable from interrupt context.
    fn irq_set_trigger(&self, line: IrqLine, trigger: Trigger) -> HalResult<()>;
    fn irq_free(&self, line: IrqLine);
}

/// Acquisition and release of shared device handles.
pub trait DeviceHost {
    fn i2c_get(&self, bus: u32) -> HalResult<Arc<dyn I2cBus>>;
    fn i2c_put(&self, bus: u32);
    fn regulator_get(&self, name: &'static str) -> HalResult<Arc<dyn Regulator>>;
    fn regulator_put(&self, name: &'static str);
    fn led_get(&self, name: &'static str) -> HalResult<Arc<dyn Led>>;
    fn led_put(&self, name: &'static str);
    fn pwm_get(&self, id: u32) -> HalResult<Arc<dyn Pwm>>;
    fn pwm_put(&self, id: u32);
    fn watchdog_get(&self) -> HalResult<Arc<dyn WatchdogHw>>;
    fn watchdog_put(&self);
    fn rangefinder_get(&self) -> HalResult<Arc<dyn RangeFinder>>;
    fn rangefinder_put(&self);
}

/// Time, sleeping and work scheduling.
pub trait Scheduler {
    fn sleep_ms(&self, ms: u32);
    /// Monotonic milliseconds.
    fn now_ms(&self) -> u64;
    /// Block briefly on `chan` until woken or a scheduler tick passes.
    fn park(&self, chan: WaitChannel);
    fn unpark(&self, chan: WaitChannel);
    /// Ask the worker context to call [crate::FadDevice::run_deferred_work].
    fn schedule_work(&self);
    fn start_periodic(&self, task: PeriodicTask, period_ms: u32);
}

pub trait PowerHost {
    fn notify(&self, note: Notification);
    fn alarm_start(&self, ms: u64);
    fn alarm_cancel(&self);
    fn wake_source(&self) -> WakeSource;
    /// Begin an orderly system power-off.
    fn power_off(&self);
}

/// Every kernel service the driver uses.
pub trait Platform:
    ConfigSource + GpioHost + IrqHost + DeviceHost + Scheduler + PowerHost + Send + Sync
{
}

impl<T> Platform for T where
    T: ConfigSource + GpioHost + IrqHost + DeviceHost + Scheduler + PowerHost + Send + Sync
{
}

/// Pending-signal check of the blocked caller.
pub trait Cancellation {
    fn is_cancelled(&self) -> bool;
}

// endregion
