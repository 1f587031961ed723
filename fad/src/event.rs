//! Events, interrupt entry and deferred work.
//!
//! The interrupt path only touches atomics: it stores the event tag, flips the trigger edge
//! and marks deferred work. Anything that needs I2C or sleeping runs later from
//! [FadDevice::run_deferred_work] in the worker context.

use core::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};

use bitflags::bitflags;
use fad_api::FadEvent;

use crate::{
    board::Capabilities,
    device::FadDevice,
    dispatch::UserBuffer,
    error::{FadError, FadResult},
    hal::{Cancellation, IrqLine, Notification, Trigger, WaitChannel},
};

/// Single-slot event store. A newer event replaces an unread one.
pub struct EventMailbox {
    slot: AtomicU32,
    reader: AtomicBool,
}

impl EventMailbox {
    pub const fn new() -> EventMailbox {
        EventMailbox {
            slot: AtomicU32::new(0),
            reader: AtomicBool::new(false),
        }
    }

    pub fn post(&self, event: FadEvent) {
        self.slot.store(event.into(), Ordering::Release);
    }

    pub fn pending(&self) -> bool {
        self.slot.load(Ordering::Acquire) != u32::from(FadEvent::None)
    }

    /// Take the pending event, leaving the slot empty.
    pub fn take(&self) -> FadEvent {
        let raw = self.slot.swap(FadEvent::None.into(), Ordering::AcqRel);
        FadEvent::try_from(raw).unwrap_or(FadEvent::None)
    }

    fn claim_reader(&self) -> FadResult<ReaderGuard<'_>> {
        self.reader
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .map(|_| ReaderGuard(&self.reader))
            .map_err(|_| FadError::Busy)
    }
}

impl Default for EventMailbox {
    fn default() -> Self {
        EventMailbox::new()
    }
}

struct ReaderGuard<'a>(&'a AtomicBool);

impl Drop for ReaderGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

bitflags! {
    /// Work queued from interrupt context.
    pub struct Work: u8 {
        const LASER_UPDATE = 1 << 0;
        const HDMI_HOTPLUG = 1 << 1;
    }
}

pub(crate) struct DeferredWork {
    pending: AtomicU8,
}

impl DeferredWork {
    pub(crate) const fn new() -> DeferredWork {
        DeferredWork {
            pending: AtomicU8::new(0),
        }
    }

    /// Mark `work`. Returns true if none of it was pending before.
    fn mark(&self, work: Work) -> bool {
        let prev = Work::from_bits_truncate(self.pending.fetch_or(work.bits(), Ordering::AcqRel));
        !prev.contains(work)
    }

    fn drain(&self) -> Work {
        Work::from_bits_truncate(self.pending.swap(0, Ordering::AcqRel))
    }
}

/// Emulated both-edge triggering for one line. Starts armed on the falling edge.
pub(crate) struct EdgeTracker {
    rising: AtomicBool,
}

impl EdgeTracker {
    const fn new() -> EdgeTracker {
        EdgeTracker {
            rising: AtomicBool::new(false),
        }
    }

    /// Arm the other edge and return it.
    fn flip(&self) -> Trigger {
        if self.rising.fetch_xor(true, Ordering::AcqRel) {
            Trigger::Falling
        } else {
            Trigger::Rising
        }
    }

    pub(crate) fn armed(&self) -> Trigger {
        if self.rising.load(Ordering::Acquire) {
            Trigger::Rising
        } else {
            Trigger::Falling
        }
    }
}

pub(crate) struct EdgeTrackers {
    laser: EdgeTracker,
    digin: [EdgeTracker; 2],
    trigger: EdgeTracker,
}

impl EdgeTrackers {
    pub(crate) const fn new() -> EdgeTrackers {
        EdgeTrackers {
            laser: EdgeTracker::new(),
            digin: [EdgeTracker::new(), EdgeTracker::new()],
            trigger: EdgeTracker::new(),
        }
    }

    pub(crate) fn for_line(&self, line: IrqLine) -> Option<&EdgeTracker> {
        match line {
            IrqLine::LaserButton => Some(&self.laser),
            IrqLine::DigitalInput(n) => self.digin.get(n as usize),
            IrqLine::Trigger => Some(&self.trigger),
            IrqLine::HdmiHotplug => None,
        }
    }
}

impl FadDevice {
    /// Store `event` for the reader and wake it.
    pub fn post_event(&self, event: FadEvent) {
        self.events.post(event);
        self.platform.unpark(WaitChannel::Event);
    }

    /// True if an event is waiting. Does not consume it.
    pub fn poll_event(&self) -> bool {
        self.events.pending()
    }

    /// Block until an event arrives and take it.
    ///
    /// Only one reader may wait at a time; a second one gets `Busy`. A pending cancellation
    /// ends the wait with `Interrupted`.
    pub fn read_event(&self, cancel: &dyn Cancellation) -> FadResult<FadEvent> {
        let _reader = self.events.claim_reader()?;
        loop {
            match self.events.take() {
                FadEvent::None => {}
                event => return Ok(event),
            }
            if cancel.is_cancelled() {
                return Err(FadError::Interrupted);
            }
            self.platform.park(WaitChannel::Event);
        }
    }

    /// Device-node read: wait for an event and copy its 32-bit tag out.
    pub fn read(&self, cancel: &dyn Cancellation, out: &mut dyn UserBuffer) -> FadResult<usize> {
        let event = self.read_event(cancel)?;
        let tag = u32::from(event).to_le_bytes();
        out.copy_out(&tag).map_err(|_| FadError::CopyFault)?;
        Ok(tag.len())
    }

    /// Interrupt entry. Never blocks and never takes the device lock.
    pub fn handle_irq(&self, line: IrqLine) {
        match line {
            IrqLine::LaserButton => {
                self.post_event(FadEvent::LaserChanged);
                self.flip_edge(line);
                if self.capabilities().contains(Capabilities::SOFTWARE_LASER) {
                    self.queue_work(Work::LASER_UPDATE);
                }
            }
            IrqLine::DigitalInput(_) => {
                self.post_event(FadEvent::DigitalInputChanged);
                self.flip_edge(line);
            }
            IrqLine::Trigger => {
                self.power.trigger_poll.store(true, Ordering::Release);
                self.platform.notify(Notification::TriggerPoll);
                self.flip_edge(line);
            }
            IrqLine::HdmiHotplug => self.queue_work(Work::HDMI_HOTPLUG),
        }
    }

    fn flip_edge(&self, line: IrqLine) {
        let Some(tracker) = self.edges.for_line(line) else {
            return;
        };
        let next = tracker.flip();
        if let Err(err) = self.platform.irq_set_trigger(line, next) {
            log::warn!("could not rearm {:?} on {:?}: {:?}", line, next, err);
        }
    }

    fn queue_work(&self, work: Work) {
        if self.work.mark(work) {
            self.platform.schedule_work();
        }
    }

    /// Worker entry: run everything queued since the last call.
    pub fn run_deferred_work(&self) {
        let work = self.work.drain();
        debug_ex!(target: "fad::event", "deferred work {:?}", work);

        if work.contains(Work::LASER_UPDATE) {
            if let Err(err) = self.with_board(|board| board.update_laser_output()) {
                log::warn!("laser update failed: {}", err);
            }
        }
        if work.contains(Work::HDMI_HOTPLUG) {
            if let Some(phy) = &self.hdmi {
                if let Err(err) = phy.on_hotplug(self.platform.as_ref()) {
                    log::warn!("hdmi hotplug handling failed: {}", err);
                }
            }
        }
    }
}
