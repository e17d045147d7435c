//! Cooperative timer scheduling.
//!
//! All of the portal's temporal behavior (the sinkhole reveal, ghost
//! messages, the contamination drift loop, the execution-sequence ticks)
//! runs through one scheduler the owning session pumps with `advance`.
//! Timers carry typed actions instead of closures, which makes
//! cancellation on logout/identity change a structural guarantee: the
//! session clears the scheduler and no stale callback can outlive it.

use chrono::{DateTime, Utc};

/// Wall-clock source. Date-range triggers and "now" timestamps read
/// through this so tests can pin time.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock for deterministic tests. Clones share the same
/// underlying instant, so a test can keep a handle while the session owns
/// another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: std::rc::Rc<std::cell::Cell<DateTime<Utc>>>,
}

impl ManualClock {
    #[must_use]
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            now: std::rc::Rc::new(std::cell::Cell::new(now)),
        }
    }

    pub fn advance_ms(&self, delta_ms: u64) {
        let next = self.now.get() + chrono::Duration::milliseconds(delta_ms as i64);
        self.now.set(next);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

/// Handle returned by `arm`; pass it back to `cancel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Repeat {
    Once,
    Every(u64),
}

#[derive(Debug, Clone)]
struct Entry<A> {
    handle: TimerHandle,
    due_ms: u64,
    repeat: Repeat,
    action: A,
}

/// One-shot and repeating delayed actions over a virtual millisecond
/// timeline the caller advances.
#[derive(Debug, Clone)]
pub struct Scheduler<A> {
    now_ms: u64,
    next_handle: u64,
    entries: Vec<Entry<A>>,
}

impl<A> Default for Scheduler<A> {
    fn default() -> Self {
        Self {
            now_ms: 0,
            next_handle: 0,
            entries: Vec::new(),
        }
    }
}

impl<A: Clone> Scheduler<A> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a one-shot timer firing `delay_ms` from now.
    pub fn arm(&mut self, delay_ms: u64, action: A) -> TimerHandle {
        self.push(delay_ms, Repeat::Once, action)
    }

    /// Arm a repeating timer; the first fire happens one full period out.
    pub fn arm_repeating(&mut self, period_ms: u64, action: A) -> TimerHandle {
        let period = period_ms.max(1);
        self.push(period, Repeat::Every(period), action)
    }

    fn push(&mut self, delay_ms: u64, repeat: Repeat, action: A) -> TimerHandle {
        self.next_handle += 1;
        let handle = TimerHandle(self.next_handle);
        self.entries.push(Entry {
            handle,
            due_ms: self.now_ms + delay_ms,
            repeat,
            action,
        });
        handle
    }

    /// Cancel a pending timer. Returns false if it already fired or was
    /// cancelled before.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.handle != handle);
        self.entries.len() != before
    }

    /// Drop every pending timer (logout/identity-change teardown).
    pub fn cancel_all(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub const fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Milliseconds until the earliest pending timer, if any. Lets an
    /// owner interleave firing with re-arming inside one elapsed window.
    #[must_use]
    pub fn next_due_in(&self) -> Option<u64> {
        self.entries
            .iter()
            .map(|entry| entry.due_ms.saturating_sub(self.now_ms))
            .min()
    }

    /// Advance the timeline by `delta_ms`, returning every due action in
    /// firing order. Repeating timers re-arm and can fire several times
    /// within one advance.
    pub fn advance(&mut self, delta_ms: u64) -> Vec<A> {
        let target = self.now_ms + delta_ms;
        let mut fired = Vec::new();

        loop {
            let next = self
                .entries
                .iter()
                .enumerate()
                .filter(|(_, entry)| entry.due_ms <= target)
                .min_by_key(|(_, entry)| (entry.due_ms, entry.handle.0))
                .map(|(idx, entry)| (idx, entry.due_ms));

            let Some((idx, due_ms)) = next else { break };
            self.now_ms = due_ms;

            let repeat = self.entries[idx].repeat;
            fired.push(self.entries[idx].action.clone());
            match repeat {
                Repeat::Once => {
                    self.entries.swap_remove(idx);
                }
                Repeat::Every(period) => {
                    self.entries[idx].due_ms += period;
                }
            }
        }

        self.now_ms = target;
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_shot_fires_once_at_due_time() {
        let mut scheduler: Scheduler<&str> = Scheduler::new();
        scheduler.arm(1000, "ping");

        assert!(scheduler.advance(999).is_empty());
        assert_eq!(scheduler.advance(1), vec!["ping"]);
        assert!(scheduler.advance(10_000).is_empty());
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn repeating_timer_fires_for_each_elapsed_period() {
        let mut scheduler: Scheduler<&str> = Scheduler::new();
        scheduler.arm_repeating(10, "tick");

        assert_eq!(scheduler.advance(35), vec!["tick", "tick", "tick"]);
        assert_eq!(scheduler.advance(5), vec!["tick"]);
        assert_eq!(scheduler.pending(), 1);
    }

    #[test]
    fn actions_fire_in_due_order_across_timers() {
        let mut scheduler: Scheduler<&str> = Scheduler::new();
        scheduler.arm(300, "late");
        scheduler.arm(100, "early");
        scheduler.arm(200, "middle");

        assert_eq!(scheduler.advance(300), vec!["early", "middle", "late"]);
    }

    #[test]
    fn cancel_prevents_firing() {
        let mut scheduler: Scheduler<&str> = Scheduler::new();
        let keep = scheduler.arm(50, "keep");
        let drop = scheduler.arm(50, "drop");

        assert!(scheduler.cancel(drop));
        assert!(!scheduler.cancel(drop));
        assert_eq!(scheduler.advance(100), vec!["keep"]);
        assert!(!scheduler.cancel(keep));
    }

    #[test]
    fn cancel_all_clears_everything() {
        let mut scheduler: Scheduler<u8> = Scheduler::new();
        scheduler.arm(10, 1);
        scheduler.arm_repeating(10, 2);
        scheduler.cancel_all();
        assert!(scheduler.advance(1000).is_empty());
    }

    #[test]
    fn manual_clock_advances() {
        let start: DateTime<Utc> = "2025-08-01T12:00:00Z".parse().unwrap();
        let clock = ManualClock::starting_at(start);
        clock.advance_ms(30_000);
        assert_eq!(clock.now(), start + chrono::Duration::seconds(30));
    }
}
