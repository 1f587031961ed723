//! In-memory platform used by the unit tests.
//!
//! [MockPlatform] records every acquisition and release in a ledger, keeps GPIO levels,
//! I2C register files and LED state in memory, and runs time virtually: `sleep_ms`
//! advances a counter instead of blocking.

use alloc::{
    collections::BTreeMap,
    string::{String, ToString},
    sync::Arc,
    vec,
    vec::Vec,
};
use core::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::{
    sync::Mutex,
    time::{Duration, Instant},
};

use fad_api::{Payload, RestartReason};

use crate::{
    board::{BoardRegistry, ladder::Resource},
    config::FadConfig,
    device::FadDevice,
    dispatch::{CopyError, UserBuffer},
    hal::*,
};

pub const PICO_IOPORT_ADDR: u8 = 0x23;
pub const PICO_HDMI_ADDR: u8 = 0x39;
pub const UNIQUE_ID: u64 = 0x0123_4567_89AB_CDEF;

/// Attach a device with the built-in boards and default configuration.
pub fn attach(mock: &Arc<MockPlatform>) -> FadDevice {
    attach_with(mock, FadConfig::default())
}

pub fn attach_with(mock: &Arc<MockPlatform>, config: FadConfig) -> FadDevice {
    match FadDevice::attach(mock.clone(), &BoardRegistry::builtin(), config) {
        Ok(dev) => dev,
        Err(err) => panic!("attach failed: {}", err),
    }
}

// region: I2C

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum I2cOp {
    Write { addr: u8, reg: u8, val: u8 },
    Read { addr: u8, reg: u8 },
}

type ReadHook = Arc<dyn Fn(u8, u8, usize) -> Option<u8> + Send + Sync>;

/// Byte-register devices behind one bus.
#[derive(Default)]
pub struct MockI2c {
    regs: Mutex<BTreeMap<(u8, u8), u8>>,
    mirrors: Mutex<BTreeMap<(u8, u8), u8>>,
    reads: Mutex<BTreeMap<(u8, u8), usize>>,
    ops: Mutex<Vec<I2cOp>>,
    hook: Mutex<Option<ReadHook>>,
    failing: AtomicBool,
}

impl MockI2c {
    pub fn new() -> MockI2c {
        MockI2c::default()
    }

    pub fn poke(&self, addr: u8, reg: u8, val: u8) {
        self.regs.lock().unwrap().insert((addr, reg), val);
    }

    pub fn peek(&self, addr: u8, reg: u8) -> u8 {
        self.regs.lock().unwrap().get(&(addr, reg)).copied().unwrap_or(0)
    }

    /// Reads of `from_reg` return the current value of `to_reg`.
    pub fn mirror(&self, addr: u8, from_reg: u8, to_reg: u8) {
        self.mirrors.lock().unwrap().insert((addr, from_reg), to_reg);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Override reads. The hook gets the address, the register and the number of reads of
    /// that register so far, this one included.
    pub fn on_read(&self, hook: impl Fn(u8, u8, usize) -> Option<u8> + Send + Sync + 'static) {
        *self.hook.lock().unwrap() = Some(Arc::new(hook));
    }

    pub fn read_count(&self, addr: u8, reg: u8) -> usize {
        self.reads.lock().unwrap().get(&(addr, reg)).copied().unwrap_or(0)
    }

    pub fn ops(&self) -> Vec<I2cOp> {
        self.ops.lock().unwrap().clone()
    }

    pub fn clear_ops(&self) {
        self.ops.lock().unwrap().clear();
    }

    fn read_reg(&self, addr: u8, reg: u8) -> u8 {
        let count = {
            let mut reads = self.reads.lock().unwrap();
            let count = reads.entry((addr, reg)).or_insert(0);
            *count += 1;
            *count
        };
        self.ops.lock().unwrap().push(I2cOp::Read { addr, reg });
        let hook = self.hook.lock().unwrap().clone();
        if let Some(val) = hook.and_then(|hook| hook(addr, reg, count)) {
            return val;
        }
        let source = self.mirrors.lock().unwrap().get(&(addr, reg)).copied();
        self.peek(addr, source.unwrap_or(reg))
    }
}

impl I2cBus for MockI2c {
    fn write(&self, addr: u8, bytes: &[u8]) -> HalResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(HalError::Io);
        }
        if let [reg, vals @ ..] = bytes {
            for (i, val) in vals.iter().enumerate() {
                let reg = reg.wrapping_add(i as u8);
                self.poke(addr, reg, *val);
                self.ops.lock().unwrap().push(I2cOp::Write { addr, reg, val: *val });
            }
        }
        Ok(())
    }

    fn write_read(&self, addr: u8, bytes: &[u8], out: &mut [u8]) -> HalResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(HalError::Io);
        }
        let reg = bytes.first().copied().unwrap_or(0);
        for (i, byte) in out.iter_mut().enumerate() {
            *byte = self.read_reg(addr, reg.wrapping_add(i as u8));
        }
        Ok(())
    }
}

// endregion

// region: Device handles

pub type RegulatorLog = Arc<Mutex<Vec<(&'static str, bool)>>>;

#[derive(Default)]
pub struct MockRegulator {
    name: &'static str,
    log: RegulatorLog,
    enables: AtomicUsize,
    disables: AtomicUsize,
    failing: AtomicBool,
}

impl MockRegulator {
    pub fn named(name: &'static str, log: RegulatorLog) -> MockRegulator {
        MockRegulator {
            name,
            log,
            ..MockRegulator::default()
        }
    }

    pub fn enables(&self) -> usize {
        self.enables.load(Ordering::SeqCst)
    }

    pub fn disables(&self) -> usize {
        self.disables.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn record(&self, on: bool) -> HalResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(HalError::Io);
        }
        let counter = if on { &self.enables } else { &self.disables };
        counter.fetch_add(1, Ordering::SeqCst);
        self.log.lock().unwrap().push((self.name, on));
        Ok(())
    }
}

impl Regulator for MockRegulator {
    fn enable(&self) -> HalResult<()> {
        self.record(true)
    }

    fn disable(&self) -> HalResult<()> {
        self.record(false)
    }
}

#[derive(Default)]
pub struct MockLed {
    brightness: Mutex<u8>,
    blink: Mutex<Option<(u32, u32)>>,
}

impl MockLed {
    pub fn blinking(&self) -> Option<(u32, u32)> {
        *self.blink.lock().unwrap()
    }
}

impl Led for MockLed {
    fn set_brightness(&self, value: u8) {
        *self.blink.lock().unwrap() = None;
        *self.brightness.lock().unwrap() = value;
    }

    fn brightness(&self) -> u8 {
        *self.brightness.lock().unwrap()
    }

    fn blink(&self, on_ms: u32, off_ms: u32) {
        *self.blink.lock().unwrap() = Some((on_ms, off_ms));
    }
}

#[derive(Default)]
pub struct MockPwm {
    config: Mutex<Option<(u32, u32)>>,
    configures: AtomicUsize,
}

impl MockPwm {
    /// Current `(period_us, duty_us)`, `None` while disabled.
    pub fn output(&self) -> Option<(u32, u32)> {
        *self.config.lock().unwrap()
    }

    pub fn configures(&self) -> usize {
        self.configures.load(Ordering::SeqCst)
    }
}

impl Pwm for MockPwm {
    fn configure(&self, period_us: u32, duty_us: u32) -> HalResult<()> {
        self.configures.fetch_add(1, Ordering::SeqCst);
        *self.config.lock().unwrap() = Some((period_us, duty_us));
        Ok(())
    }

    fn disable(&self) {
        *self.config.lock().unwrap() = None;
    }
}

#[derive(Default)]
pub struct MockWatchdog {
    ticks: Mutex<Option<u8>>,
    services: AtomicUsize,
}

impl MockWatchdog {
    pub fn ticks(&self) -> Option<u8> {
        *self.ticks.lock().unwrap()
    }

    pub fn services(&self) -> usize {
        self.services.load(Ordering::SeqCst)
    }
}

impl WatchdogHw for MockWatchdog {
    fn configure(&self, ticks: u8) {
        *self.ticks.lock().unwrap() = Some(ticks);
    }

    fn service(&self) {
        self.services.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct MockRangeFinder {
    commands: Mutex<Vec<RangeCommand>>,
}

impl RangeFinder for MockRangeFinder {
    fn command(&self, cmd: RangeCommand) -> HalResult<()> {
        self.commands.lock().unwrap().push(cmd);
        Ok(())
    }

    fn is_emitting(&self) -> HalResult<bool> {
        let last = self.commands.lock().unwrap().last().copied();
        Ok(!matches!(last, None | Some(RangeCommand::Stop)))
    }
}

// endregion

// region: Platform

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEntry {
    Acquire(Resource),
    Release(Resource),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmOp {
    Start(u64),
    Cancel,
}

type NotifyHook = Arc<dyn Fn(Notification) + Send + Sync>;
type SleepHook = Arc<dyn Fn(u32) + Send + Sync>;

pub struct MockPlatform {
    id: PlatformId,
    props: Mutex<BTreeMap<String, u32>>,
    gpio_names: BTreeMap<&'static str, u32>,
    gpio_levels: Mutex<BTreeMap<u32, bool>>,
    gpio_held: Mutex<Vec<u32>>,
    ledger: Mutex<Vec<LedgerEntry>>,
    fail: Mutex<Vec<Resource>>,
    buses: BTreeMap<u32, Arc<MockI2c>>,
    regulators: Mutex<BTreeMap<&'static str, Arc<MockRegulator>>>,
    regulator_log: RegulatorLog,
    leds: Mutex<BTreeMap<&'static str, Arc<MockLed>>>,
    pwm: Arc<MockPwm>,
    watchdog: Arc<MockWatchdog>,
    ranger: Arc<MockRangeFinder>,
    triggers: Mutex<Vec<(IrqLine, Trigger)>>,
    start: Instant,
    virtual_ms: AtomicU64,
    slept_ms: AtomicU64,
    unparks: AtomicUsize,
    scheduled: AtomicUsize,
    periodic: Mutex<Vec<(PeriodicTask, u32)>>,
    notes: Mutex<Vec<Notification>>,
    alarms: Mutex<Vec<AlarmOp>>,
    wake: Mutex<WakeSource>,
    powered_off: AtomicBool,
    restart: Mutex<RestartReason>,
    notify_hook: Mutex<Option<NotifyHook>>,
    sleep_hook: Mutex<Option<SleepHook>>,
}

impl MockPlatform {
    fn build(soc: SocFamily, compatible: &str, gpios: &[(&'static str, u32)]) -> MockPlatform {
        let buses = (0..4).map(|bus| (bus, Arc::new(MockI2c::new()))).collect();
        MockPlatform {
            id: PlatformId {
                soc,
                compatible: compatible.to_string(),
            },
            props: Mutex::new(BTreeMap::new()),
            gpio_names: gpios.iter().copied().collect(),
            gpio_levels: Mutex::new(BTreeMap::new()),
            gpio_held: Mutex::new(Vec::new()),
            ledger: Mutex::new(Vec::new()),
            fail: Mutex::new(Vec::new()),
            buses,
            regulators: Mutex::new(BTreeMap::new()),
            regulator_log: RegulatorLog::default(),
            leds: Mutex::new(BTreeMap::new()),
            pwm: Arc::default(),
            watchdog: Arc::default(),
            ranger: Arc::default(),
            triggers: Mutex::new(Vec::new()),
            start: Instant::now(),
            virtual_ms: AtomicU64::new(0),
            slept_ms: AtomicU64::new(0),
            unparks: AtomicUsize::new(0),
            scheduled: AtomicUsize::new(0),
            periodic: Mutex::new(Vec::new()),
            notes: Mutex::new(Vec::new()),
            alarms: Mutex::new(Vec::new()),
            wake: Mutex::new(WakeSource::Unknown),
            powered_off: AtomicBool::new(false),
            restart: Mutex::new(RestartReason::Coldstart),
            notify_hook: Mutex::new(None),
            sleep_hook: Mutex::new(None),
        }
    }

    pub fn with_identity(soc: SocFamily, compatible: &str) -> Arc<MockPlatform> {
        Arc::new(MockPlatform::build(soc, compatible, &[]))
    }

    pub fn pico() -> Arc<MockPlatform> {
        let mock = MockPlatform::build(
            SocFamily::Imx51,
            "flir,pico",
            &[("laser_on", 10), ("3v6a_en", 11), ("hdmi_int", 12)],
        );
        mock.buses[&0].mirror(PICO_IOPORT_ADDR, crate::ioport::REG_INPUT, crate::ioport::REG_OUTPUT);
        Arc::new(mock)
    }

    pub fn neco() -> Arc<MockPlatform> {
        Arc::new(MockPlatform::build(
            SocFamily::Imx6S,
            "flir,neco",
            &[("digin0", 20), ("digin1", 21), ("digout0", 22), ("trigger", 23)],
        ))
    }

    pub fn roco() -> Arc<MockPlatform> {
        let mock = MockPlatform::build(
            SocFamily::Imx6Q,
            "flir,roco",
            &[("laser_on", 30), ("laser_soft", 31), ("laser_switch", 32)],
        );
        mock.set_property("i2c1_bus", 2);
        mock.set_property("i2c2_bus", 3);
        for name in [
            "hasLaser",
            "HasSoftwareControlledLaser",
            "HasGPS",
            "Has5VEnable",
            "HasDigitalIO",
            "HasKAKALed",
            "HasBuzzer",
            "HasKpBacklight",
        ] {
            mock.set_property(name, 1);
        }
        Arc::new(mock)
    }

    pub fn ninjago() -> Arc<MockPlatform> {
        Arc::new(MockPlatform::build(SocFamily::Imx6Q, "flir,ec101", &[("laser_on", 40)]))
    }

    pub fn ec702() -> Arc<MockPlatform> {
        Arc::new(MockPlatform::build(SocFamily::Other, "flir,ec702", &[]))
    }

    pub fn all_boards() -> Vec<Arc<MockPlatform>> {
        vec![
            MockPlatform::pico(),
            MockPlatform::neco(),
            MockPlatform::roco(),
            MockPlatform::ninjago(),
            MockPlatform::ec702(),
        ]
    }

    // Configuration

    pub fn set_property(&self, name: &str, value: u32) {
        self.props.lock().unwrap().insert(name.to_string(), value);
    }

    pub fn clear_property(&self, name: &str) {
        self.props.lock().unwrap().remove(name);
    }

    pub fn set_restart_reason(&self, reason: RestartReason) {
        *self.restart.lock().unwrap() = reason;
    }

    // Ledger

    /// Make the next acquisitions of `res` fail.
    pub fn fail_acquire(&self, res: Resource) {
        self.fail.lock().unwrap().push(res);
    }

    fn acquire(&self, res: Resource) -> HalResult<()> {
        if self.fail.lock().unwrap().contains(&res) {
            return Err(HalError::Busy);
        }
        self.ledger.lock().unwrap().push(LedgerEntry::Acquire(res));
        Ok(())
    }

    fn release(&self, res: Resource) {
        self.ledger.lock().unwrap().push(LedgerEntry::Release(res));
    }

    pub fn ledger(&self) -> Vec<LedgerEntry> {
        self.ledger.lock().unwrap().clone()
    }

    pub fn acquires(&self) -> Vec<Resource> {
        self.ledger()
            .into_iter()
            .filter_map(|entry| match entry {
                LedgerEntry::Acquire(res) => Some(res),
                LedgerEntry::Release(_) => None,
            })
            .collect()
    }

    pub fn releases(&self) -> Vec<Resource> {
        self.ledger()
            .into_iter()
            .filter_map(|entry| match entry {
                LedgerEntry::Release(res) => Some(res),
                LedgerEntry::Acquire(_) => None,
            })
            .collect()
    }

    /// Every acquired resource was released exactly once.
    pub fn ledger_balanced(&self) -> bool {
        let mut outstanding = self.acquires();
        for res in self.releases() {
            match outstanding.iter().position(|held| *held == res) {
                Some(i) => {
                    outstanding.remove(i);
                }
                None => return false,
            }
        }
        outstanding.is_empty()
    }

    // Handles

    pub fn i2c(&self, bus: u32) -> Arc<MockI2c> {
        self.buses[&bus].clone()
    }

    pub fn regulator(&self, name: &'static str) -> Arc<MockRegulator> {
        self.regulators
            .lock()
            .unwrap()
            .entry(name)
            .or_insert_with(|| Arc::new(MockRegulator::named(name, self.regulator_log.clone())))
            .clone()
    }

    pub fn regulator_log(&self) -> Vec<(&'static str, bool)> {
        self.regulator_log.lock().unwrap().clone()
    }

    pub fn led(&self, name: &'static str) -> Arc<MockLed> {
        self.leds.lock().unwrap().entry(name).or_default().clone()
    }

    pub fn pwm(&self) -> Arc<MockPwm> {
        self.pwm.clone()
    }

    pub fn watchdog(&self) -> Arc<MockWatchdog> {
        self.watchdog.clone()
    }

    pub fn range_commands(&self) -> Vec<RangeCommand> {
        self.ranger.commands.lock().unwrap().clone()
    }

    // GPIO and interrupts

    pub fn gpio_pin(&self, name: &str) -> u32 {
        self.gpio_names[name]
    }

    pub fn set_gpio(&self, pin: u32, level: bool) {
        self.gpio_levels.lock().unwrap().insert(pin, level);
    }

    pub fn gpio_level(&self, pin: u32) -> bool {
        self.gpio_levels.lock().unwrap().get(&pin).copied().unwrap_or(false)
    }

    /// Pin number of `name` if it is currently requested.
    pub fn named_gpio_acquired(&self, name: &str) -> Option<u32> {
        let pin = self.gpio_names.get(name).copied()?;
        self.gpio_held.lock().unwrap().contains(&pin).then_some(pin)
    }

    /// Trigger changes made after the lines were requested.
    pub fn triggers(&self) -> Vec<(IrqLine, Trigger)> {
        self.triggers.lock().unwrap().clone()
    }

    // Scheduling and power

    pub fn slept_ms(&self) -> u64 {
        self.slept_ms.load(Ordering::SeqCst)
    }

    /// Move the monotonic clock forward without sleeping.
    pub fn advance_ms(&self, ms: u64) {
        self.virtual_ms.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn unparks(&self) -> usize {
        self.unparks.load(Ordering::SeqCst)
    }

    pub fn work_scheduled(&self) -> usize {
        self.scheduled.load(Ordering::SeqCst)
    }

    pub fn periodic(&self) -> Vec<(PeriodicTask, u32)> {
        self.periodic.lock().unwrap().clone()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notes.lock().unwrap().clone()
    }

    pub fn alarms(&self) -> Vec<AlarmOp> {
        self.alarms.lock().unwrap().clone()
    }

    pub fn set_wake_source(&self, source: WakeSource) {
        *self.wake.lock().unwrap() = source;
    }

    pub fn powered_off(&self) -> bool {
        self.powered_off.load(Ordering::SeqCst)
    }

    /// Run `hook` after every notification.
    pub fn on_notify(&self, hook: impl Fn(Notification) + Send + Sync + 'static) {
        *self.notify_hook.lock().unwrap() = Some(Arc::new(hook));
    }

    /// Run `hook` inside every `sleep_ms`.
    pub fn on_sleep(&self, hook: impl Fn(u32) + Send + Sync + 'static) {
        *self.sleep_hook.lock().unwrap() = Some(Arc::new(hook));
    }
}

impl ConfigSource for MockPlatform {
    fn identity(&self) -> PlatformId {
        self.id.clone()
    }

    fn property_u32(&self, name: &str) -> Option<u32> {
        self.props.lock().unwrap().get(name).copied()
    }

    fn named_gpio(&self, name: &str) -> Option<u32> {
        self.gpio_names.get(name).copied()
    }

    fn unique_id(&self) -> u64 {
        UNIQUE_ID
    }

    fn restart_reason(&self) -> RestartReason {
        *self.restart.lock().unwrap()
    }
}

impl GpioHost for MockPlatform {
    fn gpio_request(&self, pin: u32, _label: &'static str) -> HalResult<()> {
        self.acquire(Resource::Gpio(pin))?;
        self.gpio_held.lock().unwrap().push(pin);
        Ok(())
    }

    fn gpio_free(&self, pin: u32) {
        self.gpio_held.lock().unwrap().retain(|held| *held != pin);
        self.release(Resource::Gpio(pin));
    }

    fn gpio_direction_input(&self, _pin: u32) -> HalResult<()> {
        Ok(())
    }

    fn gpio_direction_output(&self, pin: u32, value: bool) -> HalResult<()> {
        self.set_gpio(pin, value);
        Ok(())
    }

    fn gpio_get(&self, pin: u32) -> HalResult<bool> {
        Ok(self.gpio_level(pin))
    }

    fn gpio_set(&self, pin: u32, value: bool) -> HalResult<()> {
        self.set_gpio(pin, value);
        Ok(())
    }
}

impl IrqHost for MockPlatform {
    fn irq_request(&self, line: IrqLine, _trigger: Trigger, _label: &'static str) -> HalResult<()> {
        self.acquire(Resource::Irq(line))
    }

    fn irq_set_trigger(&self, line: IrqLine, trigger: Trigger) -> HalResult<()> {
        self.triggers.lock().unwrap().push((line, trigger));
        Ok(())
    }

    fn irq_free(&self, line: IrqLine) {
        self.release(Resource::Irq(line));
    }
}

impl DeviceHost for MockPlatform {
    fn i2c_get(&self, bus: u32) -> HalResult<Arc<dyn I2cBus>> {
        let handle = self.buses.get(&bus).cloned().ok_or(HalError::NotFound)?;
        self.acquire(Resource::I2c(bus))?;
        Ok(handle)
    }

    fn i2c_put(&self, bus: u32) {
        self.release(Resource::I2c(bus));
    }

    fn regulator_get(&self, name: &'static str) -> HalResult<Arc<dyn Regulator>> {
        self.acquire(Resource::Regulator(name))?;
        Ok(self.regulator(name))
    }

    fn regulator_put(&self, name: &'static str) {
        self.release(Resource::Regulator(name));
    }

    fn led_get(&self, name: &'static str) -> HalResult<Arc<dyn Led>> {
        self.acquire(Resource::Led(name))?;
        Ok(self.led(name))
    }

    fn led_put(&self, name: &'static str) {
        self.release(Resource::Led(name));
    }

    fn pwm_get(&self, id: u32) -> HalResult<Arc<dyn Pwm>> {
        self.acquire(Resource::Pwm(id))?;
        Ok(self.pwm.clone())
    }

    fn pwm_put(&self, id: u32) {
        self.release(Resource::Pwm(id));
    }

    fn watchdog_get(&self) -> HalResult<Arc<dyn WatchdogHw>> {
        self.acquire(Resource::Watchdog)?;
        Ok(self.watchdog.clone())
    }

    fn watchdog_put(&self) {
        self.release(Resource::Watchdog);
    }

    fn rangefinder_get(&self) -> HalResult<Arc<dyn RangeFinder>> {
        self.acquire(Resource::RangeFinder)?;
        Ok(self.ranger.clone())
    }

    fn rangefinder_put(&self) {
        self.release(Resource::RangeFinder);
    }
}

impl Scheduler for MockPlatform {
    fn sleep_ms(&self, ms: u32) {
        self.slept_ms.fetch_add(ms as u64, Ordering::SeqCst);
        self.virtual_ms.fetch_add(ms as u64, Ordering::SeqCst);
        let hook = self.sleep_hook.lock().unwrap().clone();
        if let Some(hook) = hook {
            hook(ms);
        }
    }

    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64 + self.virtual_ms.load(Ordering::SeqCst)
    }

    fn park(&self, _chan: WaitChannel) {
        std::thread::sleep(Duration::from_micros(200));
    }

    fn unpark(&self, _chan: WaitChannel) {
        self.unparks.fetch_add(1, Ordering::SeqCst);
    }

    fn schedule_work(&self) {
        self.scheduled.fetch_add(1, Ordering::SeqCst);
    }

    fn start_periodic(&self, task: PeriodicTask, period_ms: u32) {
        self.periodic.lock().unwrap().push((task, period_ms));
    }
}

impl PowerHost for MockPlatform {
    fn notify(&self, note: Notification) {
        self.notes.lock().unwrap().push(note);
        let hook = self.notify_hook.lock().unwrap().clone();
        if let Some(hook) = hook {
            hook(note);
        }
    }

    fn alarm_start(&self, ms: u64) {
        self.alarms.lock().unwrap().push(AlarmOp::Start(ms));
    }

    fn alarm_cancel(&self) {
        self.alarms.lock().unwrap().push(AlarmOp::Cancel);
    }

    fn wake_source(&self) -> WakeSource {
        *self.wake.lock().unwrap()
    }

    fn power_off(&self) {
        self.powered_off.store(true, Ordering::SeqCst);
    }
}

// endregion

// region: User buffers

/// A user buffer backed by memory.
pub struct VecBuffer(pub Vec<u8>);

impl VecBuffer {
    pub fn zeroed(len: usize) -> VecBuffer {
        VecBuffer(vec![0; len])
    }

    pub fn with<P: Payload>(payload: &P) -> VecBuffer {
        let mut buf = VecBuffer::zeroed(P::SIZE);
        payload.encode(&mut buf.0).unwrap();
        buf
    }

    pub fn decode<P: Payload>(&self) -> P {
        P::decode(&self.0).unwrap()
    }
}

impl UserBuffer for VecBuffer {
    fn copy_in(&self, dst: &mut [u8]) -> Result<(), CopyError> {
        let src = self.0.get(..dst.len()).ok_or(CopyError)?;
        dst.copy_from_slice(src);
        Ok(())
    }

    fn copy_out(&mut self, src: &[u8]) -> Result<(), CopyError> {
        let dst = self.0.get_mut(..src.len()).ok_or(CopyError)?;
        dst.copy_from_slice(src);
        Ok(())
    }
}

/// A user pointer that faults on every access.
pub struct FaultingBuffer;

impl UserBuffer for FaultingBuffer {
    fn copy_in(&self, _dst: &mut [u8]) -> Result<(), CopyError> {
        Err(CopyError)
    }

    fn copy_out(&mut self, _src: &[u8]) -> Result<(), CopyError> {
        Err(CopyError)
    }
}

#[derive(Default)]
pub struct CancelFlag(pub AtomicBool);

impl CancelFlag {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

impl Cancellation for CancelFlag {
    fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// endregion
