use serde::{Deserialize, Serialize};

/// Status returned by a compiler invocation that completed without errors.
pub const STATUS_SUCCESS: i32 = 0;

/// Status recorded when the invocation itself failed instead of returning
/// a status of its own.
pub const STATUS_INVOCATION_FAILED: i32 = -2;

/// One named compilation request, as loaded from a single descriptor line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDescriptor {
    /// Job name, used to tag the report block.
    pub name: String,
    /// Everything after the name, passed to the compiler after splitting.
    pub raw_arguments: String,
}

impl JobDescriptor {
    /// Creates a descriptor from a name and a raw argument string.
    pub fn new(name: impl Into<String>, raw_arguments: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            raw_arguments: raw_arguments.into(),
        }
    }

    /// Splits the raw argument string on runs of whitespace.
    ///
    /// No quoting or escaping is interpreted at this layer.
    pub fn argument_vector(&self) -> Vec<String> {
        self.raw_arguments
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }
}

/// The outcome of one executed job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResult {
    /// The descriptor the job was built from.
    pub descriptor: JobDescriptor,
    /// Compiler status: 0 on success, non-zero on failure,
    /// [`STATUS_INVOCATION_FAILED`] when the invocation failed outright.
    pub status: i32,
    /// Diagnostics captured from the job's isolated sink.
    pub captured_text: String,
}

impl JobResult {
    /// Whether the compiler reported success.
    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }
}

/// Counters describing a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Descriptors loaded from the file.
    pub loaded: usize,
    /// Descriptor lines rejected as malformed.
    pub rejected_lines: usize,
    /// Jobs whose construction failed and were never submitted.
    pub skipped: usize,
    /// Report blocks emitted.
    pub reported: usize,
    /// Reported jobs with a non-zero status.
    pub failed: usize,
    /// Jobs whose outcome could not be retrieved from the pool.
    pub retrieval_failures: usize,
}

impl RunSummary {
    /// Whether any submitted job failed or went missing.
    pub fn any_job_failed(&self) -> bool {
        self.failed > 0 || self.retrieval_failures > 0
    }
}
