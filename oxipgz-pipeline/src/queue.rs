//! Bounded blocking FIFO queue.
//!
//! Two [`Limiter`]s gate the queue: one counts free producer slots, the other
//! counts items ready for consumers. Shutdown opens both, so nobody blocks on
//! the queue afterwards while already queued items stay drainable.

use crate::limiter::Limiter;
use oxipgz_core::{PgzError, Result};
use parking_lot::Mutex;
use std::collections::VecDeque;
use tracing::debug;

/// Outcome of a dequeue attempt.
#[derive(Debug, PartialEq, Eq)]
pub enum Dequeued<T> {
    /// An item was removed from the head.
    Item(T),
    /// The head did not match the predicate and was left in place.
    NotMatched,
    /// The queue was shut down and holds no more items.
    ShutdownAndEmpty,
}

impl<T> Dequeued<T> {
    /// The dequeued item, if any.
    pub fn into_item(self) -> Option<T> {
        match self {
            Self::Item(item) => Some(item),
            Self::NotMatched | Self::ShutdownAndEmpty => None,
        }
    }
}

/// A FIFO queue holding at most `capacity` items.
#[derive(Debug)]
pub struct BoundedBlockingQueue<T> {
    state: Mutex<QueueState<T>>,
    space: Limiter,
    ready: Limiter,
    capacity: usize,
}

#[derive(Debug)]
struct QueueState<T> {
    items: VecDeque<T>,
    shutdown: bool,
}

impl<T> BoundedBlockingQueue<T> {
    /// Create a queue holding at most `capacity` items.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(PgzError::invalid_argument("queue capacity must be positive"));
        }
        Ok(Self {
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity),
                shutdown: false,
            }),
            space: Limiter::new(capacity, capacity)?,
            ready: Limiter::new(0, capacity)?,
            capacity,
        })
    }

    /// Append an item, blocking while the queue is full.
    ///
    /// Fails once [`shutdown`](Self::shutdown) has been requested, including
    /// for producers that were blocked when it happened.
    pub fn enqueue(&self, item: T) -> Result<()> {
        if self.is_shutdown() {
            return Err(PgzError::queue_closed("queue"));
        }

        self.space.wait_free();

        let mut state = self.state.lock();
        if state.shutdown {
            return Err(PgzError::queue_closed("queue"));
        }
        state.items.push_back(item);
        let len = state.items.len();
        drop(state);

        self.ready.try_release(1);
        debug!(len, capacity = self.capacity, "enqueued");
        Ok(())
    }

    /// Remove the head item, blocking while the queue is empty.
    ///
    /// After shutdown this never blocks: it returns queued items until none
    /// remain, then [`Dequeued::ShutdownAndEmpty`].
    pub fn dequeue(&self) -> Dequeued<T> {
        self.dequeue_if_matches(|_| true)
    }

    /// Remove the head item only if `predicate` accepts it.
    ///
    /// Blocks while the queue is empty. A rejected head stays in place and
    /// [`Dequeued::NotMatched`] is returned so the caller can wait for it to
    /// change.
    pub fn dequeue_if_matches<P>(&self, predicate: P) -> Dequeued<T>
    where
        P: FnOnce(&T) -> bool,
    {
        let took_unit = self.ready.wait_free();

        let mut state = self.state.lock();
        let Some(head) = state.items.front() else {
            return Dequeued::ShutdownAndEmpty;
        };
        if !predicate(head) {
            drop(state);
            if took_unit {
                self.ready.try_release(1);
            }
            return Dequeued::NotMatched;
        }
        let item = state.items.pop_front();
        drop(state);

        self.space.try_release(1);
        match item {
            Some(item) => Dequeued::Item(item),
            None => Dequeued::ShutdownAndEmpty,
        }
    }

    /// Stop accepting items and wake every blocked producer and consumer.
    ///
    /// Idempotent. Queued items remain available to consumers.
    pub fn shutdown(&self) {
        let mut state = self.state.lock();
        if state.shutdown {
            return;
        }
        state.shutdown = true;
        let remaining = state.items.len();
        drop(state);

        self.ready.release_forever();
        self.space.release_forever();
        debug!(remaining, "queue shut down");
    }

    /// Whether [`shutdown`](Self::shutdown) was requested.
    pub fn is_shutdown(&self) -> bool {
        self.state.lock().shutdown
    }

    /// Number of queued items.
    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    /// Whether the queue holds no items.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of queued items.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether the queue holds `capacity` items.
    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }
}
