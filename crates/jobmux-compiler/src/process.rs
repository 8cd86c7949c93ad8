use crate::diagnostic::{Diagnostic, DiagnosticSink, Level};
use crate::invocation::{Compiler, Invocation};
use crate::policy::PolicyOverlay;
use jobmux_core::{JobmuxError, JobmuxResult};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::LazyLock;
use tracing::{debug, warn};

#[allow(clippy::expect_used)]
static DIAGNOSTIC_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^.+?:\d+(?::\d+)?: (ERROR|WARNING) - ").expect("valid header regex")
});

#[allow(clippy::expect_used)]
static SUMMARY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+ error\(s\), \d+ warning\(s\)").expect("valid summary regex")
});

/// Runs an external compiler executable, one child process per job.
///
/// Child stdout is inherited; child stderr is captured and parsed into
/// diagnostics for the job's sink.
#[derive(Debug)]
pub struct ProcessCompiler {
    program: String,
    leading_args: Vec<String>,
    resolved: Option<PathBuf>,
    prepared: usize,
}

impl ProcessCompiler {
    /// Creates a compiler from a command line: program, then leading arguments.
    pub fn new(command: &[String]) -> JobmuxResult<Self> {
        let (program, leading_args) = command
            .split_first()
            .ok_or_else(|| JobmuxError::Config("Compiler command is empty".to_string()))?;

        Ok(Self {
            program: program.clone(),
            leading_args: leading_args.to_vec(),
            resolved: None,
            prepared: 0,
        })
    }

    /// Number of invocations built so far.
    pub fn prepared_count(&self) -> usize {
        self.prepared
    }

    fn resolve_program(&mut self) -> JobmuxResult<PathBuf> {
        if let Some(path) = &self.resolved {
            return Ok(path.clone());
        }
        let path = find_executable(&self.program).ok_or_else(|| {
            JobmuxError::Construction(format!("Compiler executable not found: {}", self.program))
        })?;
        debug!(program = %path.display(), "Resolved compiler executable");
        self.resolved = Some(path.clone());
        Ok(path)
    }
}

impl Compiler for ProcessCompiler {
    fn prepare(
        &mut self,
        args: &[String],
        overlay: &PolicyOverlay,
    ) -> JobmuxResult<Box<dyn Invocation>> {
        if args.is_empty() {
            return Err(JobmuxError::Construction(
                "Empty compiler argument vector".to_string(),
            ));
        }
        if let Some(bad) = args.iter().find(|arg| arg.contains('\0')) {
            return Err(JobmuxError::Construction(format!(
                "Argument contains a NUL byte: {bad:?}"
            )));
        }

        let program = self.resolve_program()?;
        if overlay.ide_mode() && self.prepared == 0 {
            debug!("IDE mode has no command-line flag; the external compiler runs without it");
        }
        let mut full_args = self.leading_args.clone();
        full_args.extend_from_slice(args);
        full_args.extend(overlay.compiler_flags());

        self.prepared += 1;
        Ok(Box::new(ProcessInvocation {
            program,
            args: full_args,
        }))
    }
}

/// A fully resolved compiler command line.
#[derive(Debug)]
pub struct ProcessInvocation {
    program: PathBuf,
    args: Vec<String>,
}

impl ProcessInvocation {
    /// The arguments the child process will receive.
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl Invocation for ProcessInvocation {
    fn execute(self: Box<Self>, sink: &mut DiagnosticSink) -> JobmuxResult<i32> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                JobmuxError::Invocation(format!(
                    "Failed to start {}: {e}",
                    self.program.display()
                ))
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        let shape = feed_diagnostics(&stderr, sink);

        let code = output.status.code().ok_or_else(|| {
            JobmuxError::Invocation(format!(
                "{} was terminated by a signal",
                self.program.display()
            ))
        })?;

        if code != 0
            && shape.is_clean()
            && sink.error_count() == 0
            && sink.suppressed_error_count() > 0
        {
            warn!(
                status = code,
                suppressed = sink.suppressed_error_count(),
                "Compiler failed only on suppressed errors, treating as success"
            );
            return Ok(0);
        }
        Ok(code)
    }
}

/// What [`feed_diagnostics`] saw besides the diagnostics themselves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StderrShape {
    /// Non-blank lines written through unfiltered.
    pub raw_lines: usize,
    /// Whether the compiler printed its own summary line.
    pub summary_seen: bool,
}

impl StderrShape {
    /// Only diagnostics followed by a summary line: the compiler ran to
    /// completion and printed nothing else.
    pub fn is_clean(&self) -> bool {
        self.raw_lines == 0 && self.summary_seen
    }
}

/// Splits compiler stderr into diagnostics and reports them to `sink`.
///
/// A header line opens a diagnostic. Following lines belong to it up to and
/// including the first blank line, or up to the next header. The compiler's
/// own summary line is dropped; the sink prints its own from the filtered
/// counts. Any other text is written through unfiltered.
///
/// A diagnostic still open when output ends without a summary line was cut
/// short, so the filter cannot drop it: if it would be suppressed it is
/// written through raw instead.
pub fn feed_diagnostics(stderr: &str, sink: &mut DiagnosticSink) -> StderrShape {
    let mut shape = StderrShape::default();
    let mut current: Option<Diagnostic> = None;

    for line in stderr.split_inclusive('\n') {
        let bare = line.trim_end_matches(['\r', '\n']);

        if SUMMARY_LINE.is_match(bare) {
            if let Some(diagnostic) = current.take() {
                sink.report(&diagnostic);
            }
            shape.summary_seen = true;
            continue;
        }

        if let Some(captures) = DIAGNOSTIC_HEADER.captures(bare) {
            if let Some(diagnostic) = current.take() {
                sink.report(&diagnostic);
            }
            let level = match &captures[1] {
                "ERROR" => Level::Error,
                _ => Level::Warning,
            };
            current = Some(Diagnostic::new(level, line));
            continue;
        }

        match current.as_mut() {
            Some(diagnostic) => {
                diagnostic.text.push_str(line);
                if bare.trim().is_empty() {
                    if let Some(diagnostic) = current.take() {
                        sink.report(&diagnostic);
                    }
                }
            }
            None => {
                shape.raw_lines += count_non_blank(line);
                sink.write_raw(line);
            }
        }
    }

    if let Some(diagnostic) = current {
        if !shape.summary_seen && sink.is_suppressed(&diagnostic) {
            shape.raw_lines += count_non_blank(&diagnostic.text);
            sink.write_raw(&diagnostic.text);
        } else {
            sink.report(&diagnostic);
        }
    }
    shape
}

fn count_non_blank(text: &str) -> usize {
    text.lines().filter(|line| !line.trim().is_empty()).count()
}

fn find_executable(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    let search_path = std::env::var_os("PATH")?;
    std::env::split_paths(&search_path).find_map(|dir| {
        let plain = dir.join(program);
        if plain.is_file() {
            return Some(plain);
        }
        let suffix = std::env::consts::EXE_SUFFIX;
        if suffix.is_empty() {
            return None;
        }
        let with_suffix = dir.join(format!("{program}{suffix}"));
        with_suffix.is_file().then_some(with_suffix)
    })
}
