use crate::aggregator::ResultAggregator;
use crate::config::RunConfiguration;
use crate::context::build_contexts;
use crate::loader::DescriptorLoader;
use crate::pool::{available_parallelism, pool_size, WorkerPool};
use jobmux_compiler::{Compiler, PolicyOverlay};
use jobmux_core::{JobDescriptor, JobmuxError, JobmuxResult, RunSummary};
use std::io::Write;
use std::time::Instant;
use tracing::{debug, info};

/// Stage of a run, logged as the orchestrator moves through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Configuration validated.
    Configured,
    /// Reading the descriptor file.
    Loading,
    /// Contexts built and jobs submitted to the pool.
    Scheduled,
    /// Collecting results in descriptor order.
    Draining,
    /// Every job reported or accounted for.
    Done,
    /// The descriptor file could not be read or the report could not be
    /// written.
    Aborted,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunState::Configured => write!(f, "configured"),
            RunState::Loading => write!(f, "loading"),
            RunState::Scheduled => write!(f, "scheduled"),
            RunState::Draining => write!(f, "draining"),
            RunState::Done => write!(f, "done"),
            RunState::Aborted => write!(f, "aborted"),
        }
    }
}

/// How a configured run ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// Every submitted job was drained.
    Completed(RunSummary),
    /// The descriptor file was unreadable, or the report could not be written.
    Aborted(JobmuxError),
}

/// Loads job descriptors, builds contexts serially, runs them on a worker
/// pool and reports the results in descriptor order.
pub struct Orchestrator<C: Compiler> {
    compiler: C,
    overlay: PolicyOverlay,
    parallelism: usize,
    state: RunState,
}

impl<C: Compiler> Orchestrator<C> {
    /// Creates an orchestrator with the DevTools policy overlay and the
    /// machine's parallelism.
    pub fn new(compiler: C) -> Self {
        Self {
            compiler,
            overlay: PolicyOverlay::devtools(),
            parallelism: available_parallelism(),
            state: RunState::Configured,
        }
    }

    /// Replaces the policy overlay.
    pub fn with_overlay(mut self, overlay: PolicyOverlay) -> Self {
        self.overlay = overlay;
        self
    }

    /// Overrides the parallelism the pool size is derived from.
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    /// The stage the last run reached. `Configured` before any run.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// The compiler used to prepare invocations.
    pub fn compiler(&self) -> &C {
        &self.compiler
    }

    /// Runs every job in the configured descriptor file, writing report
    /// blocks to `out`.
    pub async fn run<W: Write>(&mut self, config: &RunConfiguration, out: W) -> RunOutcome {
        self.transition(RunState::Configured);
        self.transition(RunState::Loading);

        let report = match DescriptorLoader::load(&config.descriptor_file).await {
            Ok(report) => report,
            Err(e) => {
                self.transition(RunState::Aborted);
                return RunOutcome::Aborted(e);
            }
        };
        let rejected_lines = report.rejected.len();

        match self.run_descriptors(report.descriptors, out).await {
            Ok(mut summary) => {
                summary.rejected_lines = rejected_lines;
                RunOutcome::Completed(summary)
            }
            Err(e) => {
                self.transition(RunState::Aborted);
                RunOutcome::Aborted(e)
            }
        }
    }

    /// Runs an already loaded batch of descriptors.
    ///
    /// Only a failure to write the report is returned as an error; job-level
    /// failures are counted in the summary.
    pub async fn run_descriptors<W: Write>(
        &mut self,
        descriptors: Vec<JobDescriptor>,
        out: W,
    ) -> JobmuxResult<RunSummary> {
        let start = Instant::now();
        let loaded = descriptors.len();

        let built = build_contexts(&mut self.compiler, &self.overlay, descriptors);
        let pool = WorkerPool::new(pool_size(built.contexts.len(), self.parallelism));
        info!(
            jobs = built.contexts.len(),
            skipped = built.skipped,
            workers = pool.size(),
            "Scheduling compiler jobs"
        );

        let mut handles = Vec::with_capacity(built.contexts.len());
        for context in built.contexts {
            let name = context.name().to_string();
            handles.push(pool.submit(name, move || context.run()).await);
        }
        self.transition(RunState::Scheduled);

        self.transition(RunState::Draining);
        let mut aggregator = ResultAggregator::new(out);
        aggregator.drain(handles).await?;
        let (_, mut summary) = aggregator.into_parts();
        summary.loaded = loaded;
        summary.skipped = built.skipped;
        self.transition(RunState::Done);

        info!(
            loaded = summary.loaded,
            skipped = summary.skipped,
            reported = summary.reported,
            failed = summary.failed,
            retrieval_failures = summary.retrieval_failures,
            duration_ms = start.elapsed().as_millis() as u64,
            "Compiler jobs complete"
        );
        Ok(summary)
    }

    fn transition(&mut self, state: RunState) {
        debug!(from = %self.state, to = %state, "Run state");
        self.state = state;
    }
}
