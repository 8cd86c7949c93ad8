//! Batch orchestration of independent compiler jobs.
//!
//! Reads a descriptor file with one job per line, prepares every job's
//! compiler invocation on the calling thread, runs the jobs on a bounded
//! worker pool and writes one delimited report block per job, always in
//! descriptor order.
//!
//! # Main types
//!
//! - [`RunConfiguration`]: Validated command line (`--compiler-args-file`).
//! - [`DescriptorLoader`]: Parses the descriptor file.
//! - [`JobContext`]: A job's descriptor, sink and prepared invocation.
//! - [`WorkerPool`]: Fixed-size pool for blocking compiler runs.
//! - [`ResultAggregator`]: Ordered drain and report rendering.
//! - [`Orchestrator`]: Runs the whole pipeline.

/// Report rendering and ordered drain.
pub mod aggregator;
/// Argument normalization and the command-line gate.
pub mod config;
/// Per-job context construction.
pub mod context;
/// Orchestration engine.
pub mod engine;
/// Descriptor file loading.
pub mod loader;
/// Bounded worker pool.
pub mod pool;

pub use aggregator::{render_block, ResultAggregator};
pub use config::{normalize_args, InvalidConfiguration, RunConfiguration};
pub use context::{build_contexts, BuiltContexts, JobContext};
pub use engine::{Orchestrator, RunOutcome, RunState};
pub use loader::{parse_line, DescriptorLoader, LoadReport};
pub use pool::{available_parallelism, pool_size, JobHandle, WorkerPool};
