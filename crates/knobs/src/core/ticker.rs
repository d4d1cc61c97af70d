//! Tick sources that drive monitor polling.

use std::{
    cell::Cell,
    fmt,
    rc::Rc,
    time::Duration,
};

use tracing::trace;

use super::{
    emitter::{Emitter, Event},
    scheduler::{Scheduler, TimerId},
};

/// Emitted by a ticker on each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickerEvent;

/// Event names for [`TickerEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TickerEventName {
    /// A tick.
    Tick,
}

impl Event for TickerEvent {
    type Name = TickerEventName;

    fn name(&self) -> TickerEventName {
        TickerEventName::Tick
    }
}

/// A source of ticks.
pub trait Ticker {
    /// Tick events.
    fn emitter(&self) -> &Emitter<TickerEvent>;

    /// True while ticks are suppressed.
    fn disabled(&self) -> bool;

    /// Suppress or resume ticks.
    fn set_disabled(&self, disabled: bool);

    /// Stop ticking for good.
    fn dispose(&self);
}

/// A ticker that fires only when told to.
#[derive(Debug, Default)]
pub struct ManualTicker {
    /// Tick events.
    emitter: Emitter<TickerEvent>,
    /// Suppression flag.
    disabled: Cell<bool>,
}

impl ManualTicker {
    /// Construct an enabled ticker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire one tick, unless disabled.
    pub fn tick(&self) {
        if self.disabled.get() {
            return;
        }
        self.emitter.emit(&TickerEvent);
    }
}

impl Ticker for ManualTicker {
    fn emitter(&self) -> &Emitter<TickerEvent> {
        &self.emitter
    }

    fn disabled(&self) -> bool {
        self.disabled.get()
    }

    fn set_disabled(&self, disabled: bool) {
        self.disabled.set(disabled);
    }

    fn dispose(&self) {
        self.disabled.set(true);
    }
}

/// A ticker firing on a fixed wall-clock period through a [`Scheduler`].
///
/// Starting and stopping are idempotent. Re-enabling arms the timer for the
/// next period and never fires synchronously. A zero interval never fires.
pub struct IntervalTicker {
    /// Tick events.
    emitter: Emitter<TickerEvent>,
    /// Timer host.
    scheduler: Scheduler,
    /// Tick period.
    interval: Duration,
    /// The live timer, if armed.
    timer: Cell<Option<TimerId>>,
    /// Suppression flag.
    disabled: Cell<bool>,
    /// Set once disposed.
    disposed: Cell<bool>,
}

impl fmt::Debug for IntervalTicker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntervalTicker")
            .field("interval", &self.interval)
            .field("armed", &self.timer.get().is_some())
            .field("disabled", &self.disabled.get())
            .finish()
    }
}

impl IntervalTicker {
    /// Construct and arm a ticker.
    pub fn new(scheduler: &Scheduler, interval: Duration) -> Rc<Self> {
        let t = Rc::new(Self {
            emitter: Emitter::new(),
            scheduler: scheduler.clone(),
            interval,
            timer: Cell::new(None),
            disabled: Cell::new(false),
            disposed: Cell::new(false),
        });
        t.start();
        t
    }

    /// The tick period.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// True while a timer is armed.
    pub fn is_armed(&self) -> bool {
        self.timer.get().is_some()
    }

    /// Arm the timer if it should be running and is not.
    fn start(&self) {
        if self.timer.get().is_some()
            || self.disabled.get()
            || self.disposed.get()
            || self.interval.is_zero()
        {
            return;
        }
        let emitter = self.emitter.downgrade();
        let id = self.scheduler.schedule_repeating(self.interval, move || {
            if let Some(e) = emitter.upgrade() {
                trace!("interval tick");
                e.emit(&TickerEvent);
            }
        });
        self.timer.set(Some(id));
    }

    /// Cancel the timer if armed.
    fn stop(&self) {
        if let Some(id) = self.timer.take() {
            self.scheduler.cancel(id);
        }
    }
}

impl Ticker for IntervalTicker {
    fn emitter(&self) -> &Emitter<TickerEvent> {
        &self.emitter
    }

    fn disabled(&self) -> bool {
        self.disabled.get()
    }

    fn set_disabled(&self, disabled: bool) {
        self.disabled.set(disabled);
        if disabled {
            self.stop();
        } else {
            self.start();
        }
    }

    fn dispose(&self) {
        self.disposed.set(true);
        self.stop();
    }
}

impl Drop for IntervalTicker {
    fn drop(&mut self) {
        self.stop();
    }
}
