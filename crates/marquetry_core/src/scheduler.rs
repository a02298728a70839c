//! Cooperative scheduler driven by the host's main loop.
//!
//! The host calls [`Scheduler::tick`] once per frame. Recurring timers fire
//! every `period` ticks until their [`TimerGuard`] is cancelled or dropped.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

struct Timer {
    id: u64,
    period: u32,
    remaining: Cell<u32>,
    live: Cell<bool>,
    callback: Box<dyn Fn()>,
}

#[derive(Default)]
struct State {
    next_id: u64,
    ticks: u64,
    timers: Vec<Rc<Timer>>,
}

/// Host tick scheduler.
#[derive(Clone, Default)]
pub struct Scheduler {
    state: Rc<RefCell<State>>,
}

/// Recurring timer registration. Dropping it cancels the timer.
#[must_use = "dropping a timer guard cancels the timer"]
pub struct TimerGuard {
    timer: Weak<Timer>,
    state: Weak<RefCell<State>>,
}

impl TimerGuard {
    /// Cancels the timer. Idempotent.
    pub fn cancel(&self) {
        let Some(timer) = self.timer.upgrade() else {
            return;
        };
        timer.live.set(false);
        if let Some(state) = self.state.upgrade() {
            state.borrow_mut().timers.retain(|t| t.id != timer.id);
        }
    }

    /// Returns true until cancelled.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.timer.upgrade().is_some_and(|t| t.live.get())
    }
}

impl Drop for TimerGuard {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl Scheduler {
    /// Creates an idle scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a callback firing every `period` ticks (at least one).
    pub fn every(&self, period: u32, callback: impl Fn() + 'static) -> TimerGuard {
        let period = period.max(1);
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        let timer = Rc::new(Timer {
            id: state.next_id,
            period,
            remaining: Cell::new(period),
            live: Cell::new(true),
            callback: Box::new(callback),
        });
        let guard = TimerGuard {
            timer: Rc::downgrade(&timer),
            state: Rc::downgrade(&self.state),
        };
        state.timers.push(timer);
        guard
    }

    /// Advances one tick, firing due timers. Returns how many fired.
    pub fn tick(&self) -> usize {
        let due: Vec<Rc<Timer>> = {
            let mut state = self.state.borrow_mut();
            state.ticks += 1;
            state
                .timers
                .iter()
                .filter(|timer| {
                    let remaining = timer.remaining.get().saturating_sub(1);
                    if remaining == 0 {
                        timer.remaining.set(timer.period);
                        true
                    } else {
                        timer.remaining.set(remaining);
                        false
                    }
                })
                .cloned()
                .collect()
        };
        let mut fired = 0;
        for timer in due {
            if timer.live.get() {
                (timer.callback)();
                fired += 1;
            }
        }
        fired
    }

    /// Ticks elapsed since creation.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.state.borrow().ticks
    }

    /// Number of registered timers.
    #[must_use]
    pub fn timer_count(&self) -> usize {
        self.state.borrow().timers.len()
    }
}
