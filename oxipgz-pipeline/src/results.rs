//! Ordered collection of out-of-order results.
//!
//! Each reservation takes a slot in a bounded queue. Slots may be completed in
//! any order from any thread; [`DrainCompleted`] yields values strictly in
//! reservation order.

use crate::queue::{BoundedBlockingQueue, Dequeued};
use oxipgz_core::{PgzError, Result};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::debug;

struct Slot<T> {
    value: Mutex<Option<T>>,
}

impl<T> Slot<T> {
    fn is_completed(&self) -> bool {
        self.value.lock().is_some()
    }

    fn take(&self) -> Option<T> {
        self.value.lock().take()
    }
}

/// Completion broadcast shared between slot handles and the drainer.
#[derive(Default)]
struct CompletionSignal {
    generation: Mutex<u64>,
    changed: Condvar,
}

impl CompletionSignal {
    fn generation(&self) -> u64 {
        *self.generation.lock()
    }

    fn notify(&self) {
        let mut generation = self.generation.lock();
        *generation = generation.wrapping_add(1);
        drop(generation);
        self.changed.notify_all();
    }

    /// Wait until the generation moves past `seen` or `timeout` elapses.
    fn wait_past(&self, seen: u64, timeout: Duration) {
        let mut generation = self.generation.lock();
        if *generation == seen {
            self.changed.wait_for(&mut generation, timeout);
        }
    }
}

/// A reserved position in the output order.
///
/// Completing the handle consumes it, so a slot is filled at most once.
/// A handle must be completed for the drain to move past its slot.
pub struct SlotHandle<T> {
    slot: Arc<Slot<T>>,
    signal: Arc<CompletionSignal>,
}

impl<T> SlotHandle<T> {
    /// Fill the slot with `value` and wake the drainer.
    pub fn complete(self, value: T) {
        *self.slot.value.lock() = Some(value);
        self.signal.notify();
    }
}

impl<T> std::fmt::Debug for SlotHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotHandle")
            .field("completed", &self.slot.is_completed())
            .finish()
    }
}

/// Turns out-of-order completions into an in-order stream, holding at most
/// `capacity` outstanding results.
pub struct OrderedResultCollector<T> {
    slots: BoundedBlockingQueue<Arc<Slot<T>>>,
    signal: Arc<CompletionSignal>,
    recheck: Duration,
    closed: AtomicBool,
    draining: AtomicBool,
}

impl<T> OrderedResultCollector<T> {
    /// Create a collector with `capacity` slots.
    ///
    /// `recheck` bounds how long the drainer sleeps before re-checking the
    /// oldest slot, so a [`close`](Self::close) issued mid-wait is noticed.
    pub fn new(capacity: usize, recheck: Duration) -> Result<Self> {
        if recheck.is_zero() {
            return Err(PgzError::invalid_argument(
                "result recheck interval must be positive",
            ));
        }
        Ok(Self {
            slots: BoundedBlockingQueue::new(capacity)?,
            signal: Arc::new(CompletionSignal::default()),
            recheck,
            closed: AtomicBool::new(false),
            draining: AtomicBool::new(false),
        })
    }

    /// Reserve the next slot, blocking while `capacity` slots are outstanding.
    ///
    /// Fails once [`close`](Self::close) has been called.
    pub fn reserve_slot(&self) -> Result<SlotHandle<T>> {
        if self.closed.load(Ordering::Acquire) {
            return Err(PgzError::queue_closed("result collector"));
        }
        let slot = Arc::new(Slot {
            value: Mutex::new(None),
        });
        self.slots
            .enqueue(Arc::clone(&slot))
            .map_err(|_| PgzError::queue_closed("result collector"))?;

        Ok(SlotHandle {
            slot,
            signal: Arc::clone(&self.signal),
        })
    }

    /// Lazily yield completed values in reservation order.
    ///
    /// The sequence ends once the collector is closed and every outstanding
    /// slot has been emitted. Only one drain may ever be started.
    pub fn drain_completed(&self) -> Result<DrainCompleted<'_, T>> {
        if self.draining.swap(true, Ordering::AcqRel) {
            return Err(PgzError::invalid_argument(
                "results can only be drained once",
            ));
        }
        Ok(DrainCompleted {
            collector: self,
            finished: false,
        })
    }

    /// Stop new reservations. Already reserved slots can still be drained.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.slots.shutdown();
        self.signal.notify();
        debug!(outstanding = self.slots.len(), "result collector closed");
    }

    /// Whether [`close`](Self::close) was called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Slots reserved but not yet drained.
    pub fn outstanding(&self) -> usize {
        self.slots.len()
    }

    /// Maximum number of outstanding slots.
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }
}

impl<T> std::fmt::Debug for OrderedResultCollector<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderedResultCollector")
            .field("capacity", &self.capacity())
            .field("outstanding", &self.outstanding())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Single-pass iterator over completed results, in reservation order.
pub struct DrainCompleted<'a, T> {
    collector: &'a OrderedResultCollector<T>,
    finished: bool,
}

impl<T> Iterator for DrainCompleted<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.finished {
            return None;
        }
        let collector = self.collector;
        loop {
            let seen = collector.signal.generation();
            match collector.slots.dequeue_if_matches(|slot| slot.is_completed()) {
                Dequeued::Item(slot) => {
                    if let Some(value) = slot.take() {
                        return Some(value);
                    }
                }
                Dequeued::ShutdownAndEmpty => {
                    self.finished = true;
                    return None;
                }
                Dequeued::NotMatched => collector.signal.wait_past(seen, collector.recheck),
            }
        }
    }
}
