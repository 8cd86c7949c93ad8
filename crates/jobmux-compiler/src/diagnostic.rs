use crate::policy::{PolicyOverlay, SummaryDetail};
use std::fmt::Write as _;
use std::sync::Arc;

/// Severity of a compiler diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    /// Counts toward a failing status.
    Error,
    /// Reported but never fails a job.
    Warning,
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Level::Error => write!(f, "ERROR"),
            Level::Warning => write!(f, "WARNING"),
        }
    }
}

/// A single formatted diagnostic, as the compiler printed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Severity parsed from the header line.
    pub level: Level,
    /// Full formatted text, header included, newline terminated.
    pub text: String,
}

impl Diagnostic {
    /// Creates a diagnostic from its level and formatted text.
    pub fn new(level: Level, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }
}

/// Predicate deciding whether a formatted diagnostic is dropped.
///
/// Evaluated before the diagnostic is counted or written, so a suppressed
/// error never contributes to a job's failure status.
pub trait DiagnosticFilter: Send + Sync {
    /// Returns `true` if the diagnostic text must be suppressed.
    fn suppresses(&self, text: &str) -> bool;
}

impl<F> DiagnosticFilter for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn suppresses(&self, text: &str) -> bool {
        self(text)
    }
}

/// Drops the known false positives about property access on struct types
/// that involve `Symbol` keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructAccessFilter;

impl DiagnosticFilter for StructAccessFilter {
    fn suppresses(&self, text: &str) -> bool {
        text.contains("access on a struct") && text.contains("Symbol")
    }
}

/// Filter that keeps every diagnostic.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepAll;

impl DiagnosticFilter for KeepAll {
    fn suppresses(&self, _text: &str) -> bool {
        false
    }
}

/// Isolated in-memory output of one job.
///
/// Each job owns its own sink; nothing here is shared with other jobs or
/// with the process's standard error.
pub struct DiagnosticSink {
    buffer: String,
    filter: Arc<dyn DiagnosticFilter>,
    summary_detail: SummaryDetail,
    errors: usize,
    warnings: usize,
    suppressed: usize,
    suppressed_errors: usize,
}

impl DiagnosticSink {
    /// Creates an empty sink applying the overlay's filter and summary detail.
    pub fn new(overlay: &PolicyOverlay) -> Self {
        Self {
            buffer: String::with_capacity(512),
            filter: overlay.filter(),
            summary_detail: overlay.summary_detail(),
            errors: 0,
            warnings: 0,
            suppressed: 0,
            suppressed_errors: 0,
        }
    }

    /// Whether the filter would drop `diagnostic`. Nothing is counted.
    pub fn is_suppressed(&self, diagnostic: &Diagnostic) -> bool {
        self.filter.suppresses(&diagnostic.text)
    }

    /// Reports one diagnostic. Returns `false` if the filter dropped it.
    pub fn report(&mut self, diagnostic: &Diagnostic) -> bool {
        if self.is_suppressed(diagnostic) {
            self.suppressed += 1;
            if diagnostic.level == Level::Error {
                self.suppressed_errors += 1;
            }
            return false;
        }

        match diagnostic.level {
            Level::Error => self.errors += 1,
            Level::Warning => self.warnings += 1,
        }
        self.buffer.push_str(&diagnostic.text);
        true
    }

    /// Appends text that is not a diagnostic, unfiltered and uncounted.
    pub fn write_raw(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    /// Errors emitted so far.
    pub fn error_count(&self) -> usize {
        self.errors
    }

    /// Warnings emitted so far.
    pub fn warning_count(&self) -> usize {
        self.warnings
    }

    /// Diagnostics dropped by the filter.
    pub fn suppressed_count(&self) -> usize {
        self.suppressed
    }

    /// Errors dropped by the filter.
    pub fn suppressed_error_count(&self) -> usize {
        self.suppressed_errors
    }

    /// Appends the summary line, if the detail level asks for one, and
    /// returns the captured text.
    pub fn finish(mut self) -> String {
        let print = match self.summary_detail.level() {
            0 => false,
            1 => self.errors > 0,
            2 => self.errors > 0 || self.warnings > 0,
            _ => true,
        };
        if print {
            let _ = writeln!(
                self.buffer,
                "{} error(s), {} warning(s)",
                self.errors, self.warnings
            );
        }
        self.buffer
    }
}

impl std::fmt::Debug for DiagnosticSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiagnosticSink")
            .field("len", &self.buffer.len())
            .field("errors", &self.errors)
            .field("warnings", &self.warnings)
            .field("suppressed", &self.suppressed)
            .finish()
    }
}
