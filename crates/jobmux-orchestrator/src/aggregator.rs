use crate::pool::JobHandle;
use jobmux_core::{JobResult, JobmuxResult, RunSummary};
use std::fmt::Write as _;
use std::io::Write;
use tracing::{error, warn};

/// Renders one job's report block.
///
/// A non-zero status is announced on its own line before the block. The
/// captured text is copied verbatim and followed by a newline.
pub fn render_block(result: &JobResult) -> String {
    let mut block = String::with_capacity(result.captured_text.len() + 64);
    if result.status != 0 {
        let _ = writeln!(block, "ERROR: Compiler returned {}", result.status);
    }
    let _ = writeln!(block, "@@ START_MODULE:{} @@", result.descriptor.name);
    let _ = writeln!(block, "{}", result.captured_text);
    let _ = writeln!(block, "@@ END_MODULE @@");
    block
}

/// Drains submitted jobs in submission order and writes their report blocks.
pub struct ResultAggregator<W: Write> {
    out: W,
    summary: RunSummary,
}

impl<W: Write> ResultAggregator<W> {
    /// Creates an aggregator writing to `out`.
    pub fn new(out: W) -> Self {
        Self {
            out,
            summary: RunSummary::default(),
        }
    }

    /// Waits on each handle in turn and reports it.
    ///
    /// A slow early job holds back the blocks of later ones but never
    /// reorders them. A job whose outcome cannot be retrieved is logged and
    /// left out of the report.
    pub async fn drain(&mut self, handles: Vec<JobHandle<JobResult>>) -> JobmuxResult<()> {
        for handle in handles {
            let label = handle.label().to_string();
            match handle.join().await {
                Ok(result) => self.emit(&result)?,
                Err(e) => {
                    error!(job = %label, error = %e, "Failed to retrieve job result");
                    self.summary.retrieval_failures += 1;
                }
            }
        }
        Ok(())
    }

    /// Writes the block for one completed job.
    pub fn emit(&mut self, result: &JobResult) -> JobmuxResult<()> {
        if !result.is_success() {
            warn!(
                job = %result.descriptor.name,
                status = result.status,
                "Compiler returned non-zero status"
            );
            self.summary.failed += 1;
        }
        self.out.write_all(render_block(result).as_bytes())?;
        self.out.flush()?;
        self.summary.reported += 1;
        Ok(())
    }

    /// Counters accumulated so far.
    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Returns the writer and the accumulated counters.
    pub fn into_parts(self) -> (W, RunSummary) {
        (self.out, self.summary)
    }
}
