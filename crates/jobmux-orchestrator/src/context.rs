use jobmux_compiler::{Compiler, DiagnosticSink, Invocation, PolicyOverlay};
use jobmux_core::{JobDescriptor, JobResult, JobmuxResult, STATUS_INVOCATION_FAILED};
use tracing::{debug, error};

/// Everything one job needs to run: its descriptor, its own diagnostic sink
/// and a prepared invocation.
///
/// A context is owned by the orchestrator until submitted, then by exactly
/// one worker, and is consumed by [`JobContext::run`].
pub struct JobContext {
    descriptor: JobDescriptor,
    sink: DiagnosticSink,
    invocation: Box<dyn Invocation>,
}

impl JobContext {
    /// Parses the descriptor's arguments and prepares its invocation.
    pub fn build(
        compiler: &mut dyn Compiler,
        overlay: &PolicyOverlay,
        descriptor: JobDescriptor,
    ) -> JobmuxResult<Self> {
        let args = descriptor.argument_vector();
        let invocation = compiler.prepare(&args, overlay)?;
        Ok(Self {
            descriptor,
            sink: DiagnosticSink::new(overlay),
            invocation,
        })
    }

    /// The job's descriptor.
    pub fn descriptor(&self) -> &JobDescriptor {
        &self.descriptor
    }

    /// The job's name.
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// Runs the invocation to completion and collects the captured text.
    ///
    /// A failed invocation is recorded as [`STATUS_INVOCATION_FAILED`] with the
    /// error appended to the job's own output.
    pub fn run(self) -> JobResult {
        let JobContext {
            descriptor,
            mut sink,
            invocation,
        } = self;

        debug!(job = %descriptor.name, "Running compiler");
        let status = match invocation.execute(&mut sink) {
            Ok(status) => status,
            Err(e) => {
                error!(job = %descriptor.name, error = %e, "Compiler invocation failed");
                sink.write_raw(&format!("{e}\n"));
                STATUS_INVOCATION_FAILED
            }
        };

        JobResult {
            descriptor,
            status,
            captured_text: sink.finish(),
        }
    }
}

impl std::fmt::Debug for JobContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobContext")
            .field("descriptor", &self.descriptor)
            .field("sink", &self.sink)
            .finish_non_exhaustive()
    }
}

/// Contexts built for a batch, plus how many descriptors were skipped.
#[derive(Debug, Default)]
pub struct BuiltContexts {
    /// Contexts ready for submission, in descriptor order.
    pub contexts: Vec<JobContext>,
    /// Descriptors whose construction failed.
    pub skipped: usize,
}

/// Builds a context for every descriptor, one after another on the calling
/// thread.
///
/// A construction failure is logged and skips only that job.
pub fn build_contexts(
    compiler: &mut dyn Compiler,
    overlay: &PolicyOverlay,
    descriptors: Vec<JobDescriptor>,
) -> BuiltContexts {
    let mut built = BuiltContexts {
        contexts: Vec::with_capacity(descriptors.len()),
        skipped: 0,
    };

    for descriptor in descriptors {
        let name = descriptor.name.clone();
        match JobContext::build(compiler, overlay, descriptor) {
            Ok(context) => built.contexts.push(context),
            Err(e) => {
                error!(job = %name, error = %e, "Failed to prepare compiler, skipping job");
                built.skipped += 1;
            }
        }
    }

    built
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobmux_compiler::Level;
    use jobmux_core::JobmuxError;

    struct Echo {
        args: Vec<String>,
    }

    impl Invocation for Echo {
        fn execute(self: Box<Self>, sink: &mut DiagnosticSink) -> JobmuxResult<i32> {
            sink.report(&jobmux_compiler::Diagnostic::new(
                Level::Warning,
                format!("args.js:1: WARNING - {}\n", self.args.join(",")),
            ));
            Ok(0)
        }
    }

    struct Broken;

    impl Invocation for Broken {
        fn execute(self: Box<Self>, _sink: &mut DiagnosticSink) -> JobmuxResult<i32> {
            Err(JobmuxError::Invocation("compiler crashed".into()))
        }
    }

    /// Rejects any job whose first argument is `--bad`; fails at run time for `--crash`.
    #[derive(Default)]
    struct PickyCompiler {
        prepared: Vec<Vec<String>>,
    }

    impl Compiler for PickyCompiler {
        fn prepare(
            &mut self,
            args: &[String],
            _overlay: &PolicyOverlay,
        ) -> JobmuxResult<Box<dyn Invocation>> {
            if args.first().map(String::as_str) == Some("--bad") {
                return Err(JobmuxError::Construction("unknown flag --bad".into()));
            }
            self.prepared.push(args.to_vec());
            if args.first().map(String::as_str) == Some("--crash") {
                return Ok(Box::new(Broken));
            }
            Ok(Box::new(Echo {
                args: args.to_vec(),
            }))
        }
    }

    #[test]
    fn test_build_contexts_skips_failed_construction() {
        let mut compiler = PickyCompiler::default();
        let built = build_contexts(
            &mut compiler,
            &PolicyOverlay::devtools(),
            vec![
                JobDescriptor::new("a", "--js a.js"),
                JobDescriptor::new("b", "--bad"),
                JobDescriptor::new("c", "--js  c.js"),
            ],
        );

        assert_eq!(built.skipped, 1);
        let names: Vec<&str> = built.contexts.iter().map(JobContext::name).collect();
        assert_eq!(names, vec!["a", "c"]);
        assert_eq!(compiler.prepared, vec![vec!["--js", "a.js"], vec!["--js", "c.js"]]);
    }

    #[test]
    fn test_run_collects_sink_text() {
        let mut compiler = PickyCompiler::default();
        let context = JobContext::build(
            &mut compiler,
            &PolicyOverlay::devtools(),
            JobDescriptor::new("a", "--js a.js"),
        )
        .unwrap();

        let result = context.run();
        assert_eq!(result.status, 0);
        assert_eq!(
            result.captured_text,
            "args.js:1: WARNING - --js,a.js\n0 error(s), 1 warning(s)\n"
        );
    }

    #[test]
    fn test_run_maps_invocation_error_to_sentinel() {
        let mut compiler = PickyCompiler::default();
        let context = JobContext::build(
            &mut compiler,
            &PolicyOverlay::devtools(),
            JobDescriptor::new("boom", "--crash"),
        )
        .unwrap();

        let result = context.run();
        assert_eq!(result.status, STATUS_INVOCATION_FAILED);
        assert!(result.captured_text.contains("compiler crashed"));
    }
}
