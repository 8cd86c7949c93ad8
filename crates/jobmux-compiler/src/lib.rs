//! The external compiler, as seen by the jobmux orchestrator.
//!
//! The orchestrator never links a compiler. It talks to one through two
//! traits: a [`Compiler`] builds invocations serially, and each
//! [`Invocation`] runs on a worker, writing diagnostics into its own
//! [`DiagnosticSink`].
//!
//! # Main types
//!
//! - [`Compiler`] / [`Invocation`]: Build-then-run seam.
//! - [`DiagnosticSink`]: Isolated per-job diagnostic buffer with counting.
//! - [`DiagnosticFilter`]: Pluggable predicate that drops diagnostics.
//! - [`PolicyOverlay`]: Fixed convention, summary and filter policy.
//! - [`ProcessCompiler`]: Runs an external compiler executable.

/// Diagnostics, filters and the per-job sink.
pub mod diagnostic;
/// Compiler and invocation traits.
pub mod invocation;
/// Policy applied on top of every job's arguments.
pub mod policy;
/// External executable backend.
pub mod process;

pub use diagnostic::{
    Diagnostic, DiagnosticFilter, DiagnosticSink, KeepAll, Level, StructAccessFilter,
};
pub use invocation::{Compiler, Invocation};
pub use policy::{CodingConvention, PolicyOverlay, SummaryDetail};
pub use process::{feed_diagnostics, ProcessCompiler, ProcessInvocation, StderrShape};
