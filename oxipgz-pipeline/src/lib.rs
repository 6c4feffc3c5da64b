//! # OxiPgz Pipeline
//!
//! Order-preserving parallel task execution.
//!
//! Work items are produced faster than they can be consumed, run on a bounded
//! pool of worker threads and are collected in submission order even though
//! they complete in any order.
//!
//! - [`Limiter`]: Counting gate with a one-shot "open forever" broadcast
//! - [`BoundedBlockingQueue`]: FIFO queue with blocking enqueue and dequeue
//! - [`OrderedResultCollector`]: Reserve slots, complete them out of order,
//!   drain them in order
//! - [`WorkerPool`]: Fixed threads sharing one task queue
//! - [`OrderedTaskPipeline`]: The composition used by the compressor
//!
//! ## Example
//!
//! ```rust
//! use oxipgz_pipeline::OrderedTaskPipeline;
//! use std::time::Duration;
//!
//! let pipeline = OrderedTaskPipeline::new(2, 4, Duration::from_millis(100)).unwrap();
//! for i in 0..4u32 {
//!     pipeline.submit(format!("square-{i}"), move || Ok(i * i)).unwrap();
//! }
//! pipeline.finish();
//!
//! let squares: Vec<u32> = pipeline.results().unwrap().map(|r| r.unwrap()).collect();
//! assert_eq!(squares, vec![0, 1, 4, 9]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod limiter;
pub mod queue;
pub mod results;
pub mod tasks;
pub mod workers;

pub use limiter::Limiter;
pub use queue::{BoundedBlockingQueue, Dequeued};
pub use results::{DrainCompleted, OrderedResultCollector, SlotHandle};
pub use tasks::OrderedTaskPipeline;
pub use workers::{DisposeOptions, WorkerPool, WorkerTask, panic_message};
