use crate::diagnostic::{DiagnosticFilter, StructAccessFilter};
use std::sync::Arc;

/// Naming and coding-convention profile applied to every job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodingConvention {
    /// DevTools front-end conventions: a missing `@override` is an error.
    DevTools,
}

impl CodingConvention {
    /// Compiler flags that enable this convention.
    pub fn compiler_flags(&self) -> &'static [&'static str] {
        match self {
            CodingConvention::DevTools => &["--jscomp_error=missingOverride"],
        }
    }
}

/// How eagerly the error/warning summary line is printed.
///
/// 0 never, 1 when there are errors, 2 when there are errors or warnings,
/// 3 always.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SummaryDetail(u8);

impl SummaryDetail {
    /// The most verbose supported level.
    pub const MAX: SummaryDetail = SummaryDetail(3);

    /// Numeric level, clamped to [`SummaryDetail::MAX`].
    pub fn level(&self) -> u8 {
        self.0.min(Self::MAX.0)
    }
}

/// Policy applied on top of every job's own arguments.
///
/// Not configurable from the descriptor file; only the diagnostic filter can
/// be swapped, and only by code.
#[derive(Clone)]
pub struct PolicyOverlay {
    convention: CodingConvention,
    ide_mode: bool,
    summary_detail: SummaryDetail,
    filter: Arc<dyn DiagnosticFilter>,
}

impl PolicyOverlay {
    /// The overlay used for DevTools front-end builds.
    pub fn devtools() -> Self {
        Self {
            convention: CodingConvention::DevTools,
            ide_mode: true,
            summary_detail: SummaryDetail::MAX,
            filter: Arc::new(StructAccessFilter),
        }
    }

    /// Replaces the diagnostic filter.
    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: DiagnosticFilter + 'static,
    {
        self.filter = Arc::new(filter);
        self
    }

    /// The coding convention.
    pub fn convention(&self) -> CodingConvention {
        self.convention
    }

    /// Whether the compiler should run in IDE mode, keeping going after
    /// errors so every diagnostic of a job is reported.
    ///
    /// This is a compiler option with no command-line flag, so it is not part
    /// of [`PolicyOverlay::compiler_flags`]. Only an in-process [`Compiler`]
    /// can apply it.
    ///
    /// [`Compiler`]: crate::Compiler
    pub fn ide_mode(&self) -> bool {
        self.ide_mode
    }

    /// The summary detail level.
    pub fn summary_detail(&self) -> SummaryDetail {
        self.summary_detail
    }

    /// A shared handle to the diagnostic filter.
    pub fn filter(&self) -> Arc<dyn DiagnosticFilter> {
        Arc::clone(&self.filter)
    }

    /// Flags appended after each job's own arguments.
    pub fn compiler_flags(&self) -> Vec<String> {
        let mut flags: Vec<String> = self
            .convention
            .compiler_flags()
            .iter()
            .map(|flag| (*flag).to_string())
            .collect();
        flags.push(format!(
            "--summary_detail_level={}",
            self.summary_detail.level()
        ));
        flags
    }
}

impl Default for PolicyOverlay {
    fn default() -> Self {
        Self::devtools()
    }
}

impl std::fmt::Debug for PolicyOverlay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyOverlay")
            .field("convention", &self.convention)
            .field("ide_mode", &self.ide_mode)
            .field("summary_detail", &self.summary_detail)
            .finish_non_exhaustive()
    }
}
