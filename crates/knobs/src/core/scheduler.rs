//! Repeating timers delivered on the owning thread.
//!
//! A background thread sleeps until the nearest deadline and sends due timer
//! ids over a channel. The host drains the channel with
//! [`Scheduler::dispatch`], which runs callbacks on the thread that owns the
//! control tree. A timer cancelled between firing and delivery is dropped at
//! delivery, so no callback ever runs after cancellation.

use std::{
    cell::{Cell, RefCell},
    cmp::Ordering,
    collections::{HashMap, binary_heap::BinaryHeap},
    fmt,
    rc::Rc,
    sync::{
        Arc, Mutex, MutexGuard,
        atomic::{AtomicBool, Ordering as AtomicOrdering},
        mpsc,
    },
    thread,
    time::{Duration, Instant},
};

use tracing::trace;

/// Identifies a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// A timer with a pending deadline.
#[derive(Debug)]
struct PendingTimer {
    /// Deadline.
    time: Instant,
    /// Timer to fire.
    id: TimerId,
}

impl PartialEq for PendingTimer {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time
    }
}

impl Eq for PendingTimer {}

/// Reverse order so timers with the closest deadline are at the top.
impl PartialOrd for PendingTimer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Reverse order so timers with the closest deadline are at the top.
impl Ord for PendingTimer {
    fn cmp(&self, other: &Self) -> Ordering {
        other.time.cmp(&self.time)
    }
}

/// Deadlines shared with the timer thread.
#[derive(Default, Debug)]
struct PendingHeap {
    /// Pending timers.
    timers: BinaryHeap<PendingTimer>,
}

impl PendingHeap {
    /// Add a timer relative to an explicit time base.
    fn add_at(&mut self, now: Instant, id: TimerId, after: Duration) {
        self.timers.push(PendingTimer {
            time: now + after,
            id,
        });
    }

    /// Drop every deadline for a timer.
    fn remove(&mut self, id: TimerId) {
        self.timers.retain(|t| t.id != id);
    }

    /// Time until the nearest deadline. `None` if nothing is pending, zero if
    /// a deadline has passed.
    fn wait_at(&self, now: Instant) -> Option<Duration> {
        self.timers
            .peek()
            .map(|top| top.time.checked_duration_since(now).unwrap_or(Duration::ZERO))
    }

    /// Pop every timer due at `now`.
    fn collect_at(&mut self, now: Instant) -> Vec<TimerId> {
        let mut v = vec![];
        while let Some(t) = self.timers.pop() {
            if t.time <= now {
                v.push(t.id);
            } else {
                self.timers.push(t);
                break;
            }
        }
        v
    }
}

/// Lock a mutex, recovering the data if a holder panicked.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A registered repeating timer.
struct Timer {
    /// Firing period.
    period: Duration,
    /// Callback run on each delivery.
    callback: Rc<dyn Fn()>,
}

/// Scheduler state shared by handles.
struct Inner {
    /// Live timers.
    timers: RefCell<HashMap<TimerId, Timer>>,
    /// Deadlines, shared with the timer thread.
    pending: Arc<Mutex<PendingHeap>>,
    /// Fired timer ids sent by the timer thread.
    rx: mpsc::Receiver<Vec<TimerId>>,
    /// Sender cloned into the timer thread.
    tx: mpsc::Sender<Vec<TimerId>>,
    /// Timer thread, started on first use.
    handle: RefCell<Option<thread::JoinHandle<()>>>,
    /// Tells the timer thread to exit.
    shutdown: Arc<AtomicBool>,
    /// Next timer id.
    next_id: Cell<u64>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.shutdown.store(true, AtomicOrdering::SeqCst);
        if let Some(h) = self.handle.get_mut().as_ref() {
            h.thread().unpark();
        }
    }
}

/// Schedules repeating timers. Cloning produces another handle to the same
/// scheduler.
#[derive(Clone)]
pub struct Scheduler {
    /// Shared state.
    inner: Rc<Inner>,
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("timers", &self.inner.timers.borrow().len())
            .finish()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    /// Construct a scheduler. The timer thread starts with the first timer.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            inner: Rc::new(Inner {
                timers: RefCell::new(HashMap::new()),
                pending: Arc::new(Mutex::new(PendingHeap::default())),
                rx,
                tx,
                handle: RefCell::new(None),
                shutdown: Arc::new(AtomicBool::new(false)),
                next_id: Cell::new(1),
            }),
        }
    }

    /// Register a timer that fires every `period`, first after one period.
    pub fn schedule_repeating(&self, period: Duration, callback: impl Fn() + 'static) -> TimerId {
        let id = TimerId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);
        self.inner.timers.borrow_mut().insert(
            id,
            Timer {
                period,
                callback: Rc::new(callback),
            },
        );
        self.arm(id, period);
        trace!(?id, ?period, "timer scheduled");
        id
    }

    /// Cancel a timer. Fires already sent by the timer thread are dropped at
    /// delivery.
    pub fn cancel(&self, id: TimerId) {
        if self.inner.timers.borrow_mut().remove(&id).is_some() {
            lock(&self.inner.pending).remove(id);
            trace!(?id, "timer cancelled");
        }
    }

    /// True if the timer is live.
    pub fn is_scheduled(&self, id: TimerId) -> bool {
        self.inner.timers.borrow().contains_key(&id)
    }

    /// Number of live timers.
    pub fn len(&self) -> usize {
        self.inner.timers.borrow().len()
    }

    /// True if no timers are live.
    pub fn is_empty(&self) -> bool {
        self.inner.timers.borrow().is_empty()
    }

    /// Run callbacks for every timer that has fired, without blocking.
    /// Returns the number of callbacks run.
    pub fn dispatch(&self) -> usize {
        let mut fired = vec![];
        while let Ok(ids) = self.inner.rx.try_recv() {
            fired.extend(ids);
        }
        self.deliver(fired)
    }

    /// Block for up to `timeout` waiting for a timer, then dispatch.
    pub fn wait_dispatch(&self, timeout: Duration) -> usize {
        match self.inner.rx.recv_timeout(timeout) {
            Ok(mut fired) => {
                while let Ok(ids) = self.inner.rx.try_recv() {
                    fired.extend(ids);
                }
                self.deliver(fired)
            }
            Err(_) => 0,
        }
    }

    /// Re-arm and run callbacks for fired timers that are still live.
    fn deliver(&self, fired: Vec<TimerId>) -> usize {
        let mut n = 0;
        for id in fired {
            let (period, callback) = match self.inner.timers.borrow().get(&id) {
                Some(t) => (t.period, t.callback.clone()),
                None => continue,
            };
            self.arm(id, period);
            callback();
            n += 1;
        }
        n
    }

    /// Push a deadline and make sure the timer thread is awake.
    fn arm(&self, id: TimerId, after: Duration) {
        lock(&self.inner.pending).add_at(Instant::now(), id, after);
        let mut handle = self.inner.handle.borrow_mut();
        if let Some(h) = handle.as_ref() {
            h.thread().unpark();
            return;
        }
        let pending = self.inner.pending.clone();
        let shutdown = self.inner.shutdown.clone();
        let tx = self.inner.tx.clone();
        *handle = Some(thread::spawn(move || {
            loop {
                // Taking the wait in its own statement releases the lock
                // before parking.
                let wait = lock(&pending).wait_at(Instant::now());
                match wait {
                    Some(d) => thread::park_timeout(d),
                    None => thread::park(),
                }
                if shutdown.load(AtomicOrdering::SeqCst) {
                    break;
                }
                let ids = lock(&pending).collect_at(Instant::now());
                if !ids.is_empty() && tx.send(ids).is_err() {
                    break;
                }
            }
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_heap() {
        let now = Instant::now();
        let mut ph = PendingHeap::default();
        let (a, b) = (TimerId(1), TimerId(2));

        assert_eq!(ph.wait_at(now), None);
        ph.add_at(now, a, Duration::from_secs(10));
        assert_eq!(ph.wait_at(now), Some(Duration::from_secs(10)));
        ph.add_at(now, b, Duration::from_secs(100));
        assert_eq!(ph.collect_at(now + Duration::from_secs(11)), vec![a]);
        assert!(ph.wait_at(now).unwrap() <= Duration::from_secs(100));
        ph.remove(b);
        assert_eq!(ph.wait_at(now), None);
    }

    #[test]
    fn fires_and_cancels() {
        let s = Scheduler::new();
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        let id = s.schedule_repeating(Duration::from_millis(5), move || c.set(c.get() + 1));
        let deadline = Instant::now() + Duration::from_secs(5);
        while count.get() < 2 && Instant::now() < deadline {
            s.wait_dispatch(Duration::from_millis(50));
        }
        assert!(count.get() >= 2);

        s.cancel(id);
        assert!(!s.is_scheduled(id));
        let before = count.get();
        thread::sleep(Duration::from_millis(20));
        s.dispatch();
        assert_eq!(count.get(), before);
    }

    #[test]
    fn delivery_after_cancel_is_dropped() {
        let s = Scheduler::new();
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        let id = s.schedule_repeating(Duration::from_millis(1), move || c.set(c.get() + 1));
        thread::sleep(Duration::from_millis(30));
        s.cancel(id);
        s.dispatch();
        assert_eq!(count.get(), 0);
    }
}
