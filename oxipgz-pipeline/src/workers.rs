//! Fixed-size worker thread pool.

use oxipgz_core::{PgzError, Result};
use parking_lot::{Condvar, Mutex};
use std::any::Any;
use std::collections::VecDeque;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// A unit of work executed by the pool.
pub trait WorkerTask: Send {
    /// Identifier used in logs and error messages.
    fn id(&self) -> &str;

    /// Execute the task, consuming it.
    fn run(self: Box<Self>);
}

/// How [`WorkerPool::dispose`] treats queued tasks and running workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisposeOptions {
    /// Run every queued task before stopping. Otherwise queued tasks are
    /// dropped without running.
    pub drain_queue: bool,
    /// Stop waiting for workers after this long. Workers still running are
    /// detached.
    pub join_timeout: Option<Duration>,
}

impl DisposeOptions {
    /// Run the queued tasks, then join without a timeout.
    pub fn graceful() -> Self {
        Self {
            drain_queue: true,
            join_timeout: None,
        }
    }

    /// Drop the queued tasks, then join without a timeout.
    pub fn forced() -> Self {
        Self::default()
    }

    /// Set the join timeout.
    pub fn with_join_timeout(mut self, timeout: Duration) -> Self {
        self.join_timeout = Some(timeout);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PoolState {
    Running,
    Draining,
    Stopping,
}

struct Shared {
    queue: Mutex<TaskQueue>,
    task_ready: Condvar,
    in_progress: AtomicUsize,
}

struct TaskQueue {
    tasks: VecDeque<Box<dyn WorkerTask>>,
    state: PoolState,
}

/// A fixed number of threads sharing one unbounded task queue.
pub struct WorkerPool {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Start `threads` workers.
    pub fn new(threads: usize) -> Result<Self> {
        if threads == 0 {
            return Err(PgzError::invalid_argument(
                "worker pool needs at least one thread",
            ));
        }

        let shared = Arc::new(Shared {
            queue: Mutex::new(TaskQueue {
                tasks: VecDeque::new(),
                state: PoolState::Running,
            }),
            task_ready: Condvar::new(),
            in_progress: AtomicUsize::new(0),
        });

        let mut pool = Self {
            shared,
            workers: Vec::with_capacity(threads),
        };
        for index in 0..threads {
            let shared = Arc::clone(&pool.shared);
            let handle = thread::Builder::new()
                .name(format!("oxipgz-worker-{index}"))
                .spawn(move || worker_loop(&shared))?;
            pool.workers.push(handle);
        }
        debug!(threads, "worker pool started");
        Ok(pool)
    }

    /// Queue a task and wake one worker.
    pub fn submit(&self, task: Box<dyn WorkerTask>) -> Result<()> {
        let mut queue = self.shared.queue.lock();
        if queue.state != PoolState::Running {
            return Err(PgzError::queue_closed("worker pool"));
        }
        queue.tasks.push_back(task);
        drop(queue);

        self.shared.task_ready.notify_one();
        Ok(())
    }

    /// Tasks waiting for a worker.
    pub fn queued(&self) -> usize {
        self.shared.queue.lock().tasks.len()
    }

    /// Tasks currently executing.
    pub fn in_progress(&self) -> usize {
        self.shared.in_progress.load(Ordering::Acquire)
    }

    /// Number of worker threads still owned by the pool.
    pub fn threads(&self) -> usize {
        self.workers.len()
    }

    /// Stop the workers and join them.
    ///
    /// Returns `true` when every worker was joined, `false` when the join
    /// timeout expired first. Dropped tasks are destroyed outside the lock.
    pub fn dispose(&mut self, options: DisposeOptions) -> bool {
        let dropped = {
            let mut queue = self.shared.queue.lock();
            if queue.state == PoolState::Stopping && self.workers.is_empty() {
                return true;
            }
            if options.drain_queue {
                if queue.state == PoolState::Running {
                    queue.state = PoolState::Draining;
                }
                VecDeque::new()
            } else {
                queue.state = PoolState::Stopping;
                std::mem::take(&mut queue.tasks)
            }
        };
        self.shared.task_ready.notify_all();

        if !dropped.is_empty() {
            debug!(count = dropped.len(), "dropping queued tasks");
        }
        drop(dropped);

        let deadline = options.join_timeout.map(|timeout| Instant::now() + timeout);
        let mut all_joined = true;
        for handle in self.workers.drain(..) {
            if let Some(deadline) = deadline {
                while !handle.is_finished() && Instant::now() < deadline {
                    thread::sleep(Duration::from_millis(1));
                }
                if !handle.is_finished() {
                    all_joined = false;
                    continue;
                }
            }
            if handle.join().is_err() {
                all_joined = false;
            }
        }

        self.shared.queue.lock().state = PoolState::Stopping;
        if !all_joined {
            warn!("worker pool disposed with workers still running");
        }
        all_joined
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if !self.workers.is_empty() {
            self.dispose(DisposeOptions::forced());
        }
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("threads", &self.workers.len())
            .field("queued", &self.queued())
            .field("in_progress", &self.in_progress())
            .finish()
    }
}

fn worker_loop(shared: &Shared) {
    loop {
        let task = {
            let mut queue = shared.queue.lock();
            loop {
                if queue.state == PoolState::Stopping {
                    return;
                }
                if let Some(task) = queue.tasks.pop_front() {
                    break task;
                }
                if queue.state == PoolState::Draining {
                    return;
                }
                shared.task_ready.wait(&mut queue);
            }
        };

        shared.in_progress.fetch_add(1, Ordering::AcqRel);
        let id = task.id().to_string();
        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| task.run())) {
            warn!(task = %id, message = %panic_message(payload.as_ref()), "worker task panicked");
        }
        shared.in_progress.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Render a panic payload as text.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
