//! Single-threaded timer queue driving every deferred state change.
//!
//! Time is virtual: the queue only moves forward when a driver calls
//! [`EventLoop::advance`]. Tests advance it directly; the CLI uses a
//! [`Driver`] that either sleeps on the tokio clock or jumps ahead instantly.

use std::cell::Cell;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::rc::Rc;
use std::time::Duration;

use tracing::{debug, trace};

pub type Task<S> = Box<dyn FnOnce(&mut S)>;

/// Handle to a scheduled task. Cancelling is explicit; dropping the handle
/// does nothing and the task still fires.
#[derive(Debug, Clone)]
pub struct TimerHandle {
    id: u64,
    due: Duration,
    cancelled: Rc<Cell<bool>>,
}

impl TimerHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn due(&self) -> Duration {
        self.due
    }

    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

struct Entry<S> {
    due: Duration,
    seq: u64,
    label: &'static str,
    cancelled: Rc<Cell<bool>>,
    task: Task<S>,
}

impl<S> PartialEq for Entry<S> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl<S> Eq for Entry<S> {}

impl<S> PartialOrd for Entry<S> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<S> Ord for Entry<S> {
    // BinaryHeap is a max-heap: earliest deadline, then lowest seq, sorts highest.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

pub struct Scheduler<S> {
    now: Duration,
    next_seq: u64,
    queue: BinaryHeap<Entry<S>>,
}

impl<S> Default for Scheduler<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> std::fmt::Debug for Scheduler<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("now", &self.now)
            .field("queued", &self.queue.len())
            .finish()
    }
}

impl<S> Scheduler<S> {
    pub fn new() -> Self {
        Scheduler {
            now: Duration::ZERO,
            next_seq: 0,
            queue: BinaryHeap::new(),
        }
    }

    /// Virtual time elapsed since the scheduler was created.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn schedule<F>(&mut self, delay: Duration, label: &'static str, task: F) -> TimerHandle
    where
        F: FnOnce(&mut S) + 'static,
    {
        let seq = self.next_seq;
        self.next_seq += 1;
        let due = self.now + delay;
        let cancelled = Rc::new(Cell::new(false));

        debug!(timer = seq, label, delay_ms = delay.as_millis() as u64, "Timer scheduled");

        self.queue.push(Entry {
            due,
            seq,
            label,
            cancelled: Rc::clone(&cancelled),
            task: Box::new(task),
        });

        TimerHandle { id: seq, due, cancelled }
    }

    /// Number of queued tasks that have not been cancelled.
    pub fn pending(&self) -> usize {
        self.queue.iter().filter(|e| !e.cancelled.get()).count()
    }

    /// Time left until the earliest live task is due, or `None` when idle.
    pub fn time_until_next(&mut self) -> Option<Duration> {
        self.drop_cancelled_head();
        self.queue
            .peek()
            .map(|entry| entry.due.saturating_sub(self.now))
    }

    /// Pops the next live task due at or before `until`, moving the clock to
    /// its deadline.
    pub fn pop_due(&mut self, until: Duration) -> Option<Task<S>> {
        loop {
            let due = self.queue.peek()?.due;
            if due > until {
                return None;
            }
            let entry = self.queue.pop()?;
            if due > self.now {
                self.now = due;
            }
            if entry.cancelled.get() {
                trace!(timer = entry.seq, label = entry.label, "Skipping cancelled timer");
                continue;
            }
            debug!(timer = entry.seq, label = entry.label, "Timer fired");
            return Some(entry.task);
        }
    }

    fn advance_clock(&mut self, to: Duration) {
        if to > self.now {
            self.now = to;
        }
    }

    fn drop_cancelled_head(&mut self) {
        while self.queue.peek().is_some_and(|e| e.cancelled.get()) {
            self.queue.pop();
        }
    }
}

/// State that owns its own [`Scheduler`]. Due tasks receive `&mut Self`, so
/// they may read and mutate the state and schedule follow-up work.
pub trait EventLoop: Sized {
    fn scheduler(&mut self) -> &mut Scheduler<Self>;

    /// Moves virtual time forward by `dt`, firing every task that falls due
    /// in that window. Returns how many tasks fired.
    fn advance(&mut self, dt: Duration) -> usize {
        let until = self.scheduler().now() + dt;
        let mut fired = 0;
        while let Some(task) = self.scheduler().pop_due(until) {
            task(self);
            fired += 1;
        }
        self.scheduler().advance_clock(until);
        fired
    }

    /// Fires everything queued, including tasks scheduled while draining.
    fn run_until_idle(&mut self) -> usize {
        let mut fired = 0;
        while let Some(wait) = self.scheduler().time_until_next() {
            fired += self.advance(wait);
        }
        fired
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pace {
    /// Sleep on the tokio clock until each deadline.
    Realtime,
    /// Jump the virtual clock straight to each deadline.
    Instant,
}

/// Maps virtual time onto the tokio clock for interactive front ends.
#[derive(Debug)]
pub struct Driver {
    pace: Pace,
    started: tokio::time::Instant,
}

impl Driver {
    pub fn new(pace: Pace) -> Self {
        Driver {
            pace,
            started: tokio::time::Instant::now(),
        }
    }

    /// How long to actually wait before a task due in `wait` should fire.
    pub fn delay(&self, wait: Duration) -> Duration {
        match self.pace {
            Pace::Realtime => wait,
            Pace::Instant => Duration::ZERO,
        }
    }

    /// Brings virtual time up to wall time. No-op when pacing instantly.
    pub fn catch_up<S: EventLoop>(&self, state: &mut S) -> usize {
        match self.pace {
            Pace::Realtime => {
                let now = state.scheduler().now();
                let wall = self.started.elapsed();
                if wall > now {
                    state.advance(wall - now)
                } else {
                    0
                }
            }
            Pace::Instant => 0,
        }
    }

    /// Fires what became due after having waited `waited`.
    pub fn fire_after<S: EventLoop>(&self, state: &mut S, waited: Duration) -> usize {
        let now = state.scheduler().now();
        let target = match self.pace {
            Pace::Realtime => self.started.elapsed().max(now + waited),
            Pace::Instant => now + waited,
        };
        state.advance(target - now)
    }

    /// Waits for the next deadline and fires it. Returns `None` when idle.
    pub async fn step<S: EventLoop>(&self, state: &mut S) -> Option<usize> {
        let wait = state.scheduler().time_until_next()?;
        tokio::time::sleep(self.delay(wait)).await;
        Some(self.fire_after(state, wait))
    }

    pub async fn settle<S: EventLoop>(&self, state: &mut S) -> usize {
        let mut fired = 0;
        while let Some(n) = self.step(state).await {
            fired += n;
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        scheduler: Scheduler<Recorder>,
        log: Vec<(&'static str, Duration)>,
    }

    impl EventLoop for Recorder {
        fn scheduler(&mut self) -> &mut Scheduler<Self> {
            &mut self.scheduler
        }
    }

    impl Recorder {
        fn record(&mut self, name: &'static str) {
            let now = self.scheduler.now();
            self.log.push((name, now));
        }
    }

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    #[test]
    fn test_fires_in_deadline_order() {
        let mut r = Recorder::default();
        r.scheduler.schedule(secs(2.0), "late", |r: &mut Recorder| r.record("late"));
        r.scheduler.schedule(secs(1.0), "early", |r: &mut Recorder| r.record("early"));

        assert_eq!(r.advance(secs(0.5)), 0);
        assert_eq!(r.advance(secs(0.5)), 1);
        assert_eq!(r.log, vec![("early", secs(1.0))]);
        assert_eq!(r.advance(secs(5.0)), 1);
        assert_eq!(r.log[1], ("late", secs(2.0)));
        assert_eq!(r.scheduler.now(), secs(6.0));
    }

    #[test]
    fn test_ties_fire_in_schedule_order() {
        let mut r = Recorder::default();
        r.scheduler.schedule(secs(1.0), "a", |r: &mut Recorder| r.record("a"));
        r.scheduler.schedule(secs(1.0), "b", |r: &mut Recorder| r.record("b"));
        r.scheduler.schedule(secs(1.0), "c", |r: &mut Recorder| r.record("c"));

        r.run_until_idle();
        let names: Vec<_> = r.log.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_cancelled_never_fires() {
        let mut r = Recorder::default();
        let handle = r.scheduler.schedule(secs(1.0), "gone", |r: &mut Recorder| r.record("gone"));
        r.scheduler.schedule(secs(3.0), "kept", |r: &mut Recorder| r.record("kept"));
        handle.cancel();

        assert!(handle.is_cancelled());
        assert_eq!(r.scheduler.pending(), 1);
        assert_eq!(r.scheduler.time_until_next(), Some(secs(3.0)));
        assert_eq!(r.run_until_idle(), 1);
        assert_eq!(r.log, vec![("kept", secs(3.0))]);
    }

    #[test]
    fn test_dropped_handle_still_fires() {
        let mut r = Recorder::default();
        drop(r.scheduler.schedule(secs(1.0), "fire", |r: &mut Recorder| r.record("fire")));
        r.run_until_idle();
        assert_eq!(r.log.len(), 1);
    }

    #[test]
    fn test_nested_scheduling() {
        let mut r = Recorder::default();
        r.scheduler.schedule(secs(1.0), "outer", |r: &mut Recorder| {
            r.record("outer");
            r.scheduler.schedule(secs(2.0), "inner", |r: &mut Recorder| r.record("inner"));
        });

        // The inner task lands inside the same window and still fires.
        assert_eq!(r.advance(secs(3.0)), 2);
        assert_eq!(r.log, vec![("outer", secs(1.0)), ("inner", secs(3.0))]);
        assert_eq!(r.scheduler.time_until_next(), None);
    }

    #[test]
    fn test_handle_reports_due() {
        let mut r = Recorder::default();
        r.advance(secs(1.5));
        let handle = r.scheduler.schedule(secs(2.0), "x", |_: &mut Recorder| {});
        assert_eq!(handle.due(), secs(3.5));
        assert_eq!(r.scheduler.time_until_next(), Some(secs(2.0)));
    }

    #[tokio::test]
    async fn test_instant_driver_settles() {
        let mut r = Recorder::default();
        r.scheduler.schedule(secs(30.0), "slow", |r: &mut Recorder| r.record("slow"));
        let driver = Driver::new(Pace::Instant);

        assert_eq!(driver.settle(&mut r).await, 1);
        assert_eq!(r.log, vec![("slow", secs(30.0))]);
        assert_eq!(driver.step(&mut r).await, None);
    }

    #[tokio::test]
    async fn test_realtime_driver_follows_clock() {
        let mut r = Recorder::default();
        r.scheduler.schedule(secs(0.02), "tick", |r: &mut Recorder| r.record("tick"));
        let driver = Driver::new(Pace::Realtime);

        assert_eq!(driver.step(&mut r).await, Some(1));
        assert_eq!(r.log.len(), 1);
        assert!(r.scheduler.now() >= secs(0.02));
    }
}
