//! Counting resource gate with a one-shot "open forever" broadcast.

use oxipgz_core::{PgzError, Result};
use parking_lot::{Condvar, Mutex};
use tracing::debug;

/// A counting gate with a hard maximum.
///
/// [`wait_free`](Limiter::wait_free) takes one unit, blocking while none are
/// free. [`release_forever`](Limiter::release_forever) opens the gate for
/// good: every current and future waiter passes without taking a unit.
#[derive(Debug)]
pub struct Limiter {
    state: Mutex<LimiterState>,
    freed: Condvar,
    max: usize,
}

#[derive(Debug)]
struct LimiterState {
    free: usize,
    open_forever: bool,
}

impl Limiter {
    /// Create a limiter with `free` units available out of `max`.
    pub fn new(free: usize, max: usize) -> Result<Self> {
        if max == 0 {
            return Err(PgzError::invalid_argument(
                "limiter maximum must be positive",
            ));
        }
        if free > max {
            return Err(PgzError::invalid_argument(format!(
                "limiter free count {free} exceeds maximum {max}"
            )));
        }
        Ok(Self {
            state: Mutex::new(LimiterState {
                free,
                open_forever: false,
            }),
            freed: Condvar::new(),
            max,
        })
    }

    /// Block until a unit is free and take it.
    ///
    /// Returns `false` when the limiter was opened forever, in which case no
    /// unit was taken.
    pub fn wait_free(&self) -> bool {
        let mut state = self.state.lock();
        while !state.open_forever && state.free == 0 {
            self.freed.wait(&mut state);
        }
        if state.open_forever {
            return false;
        }
        state.free -= 1;
        true
    }

    /// Return up to `count` units, capped at the maximum.
    ///
    /// Returns whether the free count grew. Wakes as many waiters as units
    /// were actually returned.
    pub fn try_release(&self, count: usize) -> bool {
        let mut state = self.state.lock();
        if state.open_forever {
            return false;
        }
        let before = state.free;
        state.free = before.saturating_add(count).min(self.max);
        let released = state.free - before;
        drop(state);

        for _ in 0..released {
            self.freed.notify_one();
        }
        if released > 0 {
            debug!(released, "limiter released");
        }
        released > 0
    }

    /// Open the gate for every current and future waiter.
    pub fn release_forever(&self) {
        let mut state = self.state.lock();
        if state.open_forever {
            return;
        }
        state.free = self.max;
        state.open_forever = true;
        drop(state);

        self.freed.notify_all();
        debug!(max = self.max, "limiter released forever");
    }

    /// Units currently free.
    pub fn current_free(&self) -> usize {
        self.state.lock().free
    }

    /// The hard maximum.
    pub fn max(&self) -> usize {
        self.max
    }

    /// Whether [`release_forever`](Limiter::release_forever) was called.
    pub fn is_open_forever(&self) -> bool {
        self.state.lock().open_forever
    }
}
