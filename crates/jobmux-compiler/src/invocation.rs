use crate::diagnostic::DiagnosticSink;
use crate::policy::PolicyOverlay;
use jobmux_core::JobmuxResult;

/// The external compiler, seen from the orchestrator.
///
/// `prepare` parses a job's arguments and materializes its options. It takes
/// `&mut self` because that parsing may share state across jobs: the one owner
/// of a `Compiler` builds every invocation, one at a time, before any of them
/// runs.
pub trait Compiler {
    /// Builds a ready-to-run invocation for one job's argument vector.
    fn prepare(
        &mut self,
        args: &[String],
        overlay: &PolicyOverlay,
    ) -> JobmuxResult<Box<dyn Invocation>>;
}

/// A prepared compiler run, safe to move to a worker thread.
pub trait Invocation: Send {
    /// Runs the compiler, writing diagnostics into `sink`.
    ///
    /// Returns the compiler's status (0 on success). An `Err` means the run
    /// itself failed and produced no status.
    fn execute(self: Box<Self>, sink: &mut DiagnosticSink) -> JobmuxResult<i32>;
}
