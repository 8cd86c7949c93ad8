//! Core types and error definitions for jobmux.
//!
//! This crate provides the types shared by every jobmux crate: the error
//! taxonomy and the records that flow through a run.
//!
//! # Main types
//!
//! - [`JobmuxError`]: Unified error enum for every stage of a run.
//! - [`JobmuxResult`]: Convenience alias for `Result<T, JobmuxError>`.
//! - [`JobDescriptor`]: A named job and its raw argument string.
//! - [`JobResult`]: Status and captured diagnostics of one executed job.
//! - [`RunSummary`]: Counters describing a completed run.

/// Error taxonomy.
pub mod error;
/// Job descriptors, results and run counters.
pub mod job;

pub use error::{JobmuxError, JobmuxResult};
pub use job::{JobDescriptor, JobResult, RunSummary, STATUS_INVOCATION_FAILED, STATUS_SUCCESS};
