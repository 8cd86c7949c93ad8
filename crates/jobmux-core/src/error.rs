use thiserror::Error;

/// A convenience `Result` alias using [`JobmuxError`].
pub type JobmuxResult<T> = Result<T, JobmuxError>;

/// Top-level error type for the jobmux runner.
///
/// Each variant corresponds to one stage of a run. Only [`JobmuxError::Config`]
/// and [`JobmuxError::Descriptor`] are fatal to a whole run; the others are
/// confined to a single job.
#[derive(Error, Debug)]
pub enum JobmuxError {
    /// Command-line or settings validation failed.
    #[error("Config error: {0}")]
    Config(String),

    /// The descriptor file could not be opened or read.
    #[error("Descriptor error: {0}")]
    Descriptor(String),

    /// Building the invocation for a job failed; that job is skipped.
    #[error("Construction error: {0}")]
    Construction(String),

    /// The compiler invocation itself failed while running.
    #[error("Invocation error: {0}")]
    Invocation(String),

    /// The worker task for a job panicked or was cancelled.
    #[error("Pool error: {0}")]
    Pool(String),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl JobmuxError {
    /// Whether this error aborts the whole run rather than a single job.
    pub fn is_fatal(&self) -> bool {
        matches!(self, JobmuxError::Config(_) | JobmuxError::Descriptor(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(JobmuxError::Config("missing flag".into()).is_fatal());
        assert!(JobmuxError::Descriptor("no such file".into()).is_fatal());
        assert!(!JobmuxError::Construction("bad args".into()).is_fatal());
        assert!(!JobmuxError::Invocation("crashed".into()).is_fatal());
        assert!(!JobmuxError::Pool("panicked".into()).is_fatal());
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: JobmuxError = io.into();
        assert_eq!(err.to_string(), "IO error: gone");
        assert!(!err.is_fatal());
    }
}
