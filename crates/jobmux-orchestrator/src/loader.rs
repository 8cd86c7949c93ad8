use jobmux_core::{JobDescriptor, JobmuxError, JobmuxResult};
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

/// Descriptors read from one file, plus the lines that were rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Well-formed descriptors, in file order.
    pub descriptors: Vec<JobDescriptor>,
    /// 1-based numbers of malformed lines.
    pub rejected: Vec<usize>,
}

/// Reads a descriptor file: one `<name> <arguments>` job per line.
pub struct DescriptorLoader;

impl DescriptorLoader {
    /// Loads every descriptor from `path`.
    ///
    /// Empty lines are skipped. Malformed lines are logged and dropped.
    /// Failing to open or read the file (invalid UTF-8 included) is fatal.
    pub async fn load(path: &Path) -> JobmuxResult<LoadReport> {
        match Self::read(path).await {
            Ok(report) => {
                info!(
                    path = %path.display(),
                    jobs = report.descriptors.len(),
                    rejected = report.rejected.len(),
                    "Loaded compiler arguments file"
                );
                Ok(report)
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to read compiler arguments file");
                Err(JobmuxError::Descriptor(format!("{}: {e}", path.display())))
            }
        }
    }

    async fn read(path: &Path) -> std::io::Result<LoadReport> {
        let file = File::open(path).await?;
        let mut lines = BufReader::new(file).lines();
        let mut report = LoadReport::default();
        let mut line_number = 0;

        while let Some(line) = lines.next_line().await? {
            line_number += 1;
            if line.is_empty() {
                continue;
            }
            match parse_line(&line) {
                Some(descriptor) => report.descriptors.push(descriptor),
                None => {
                    error!(
                        line = line_number,
                        "Line {line_number} does not contain job name and compiler arguments"
                    );
                    report.rejected.push(line_number);
                }
            }
        }

        Ok(report)
    }
}

/// Splits a line on its first run of whitespace into name and arguments.
///
/// Returns `None` unless both parts are non-empty.
pub fn parse_line(line: &str) -> Option<JobDescriptor> {
    let (name, rest) = line.split_once(char::is_whitespace)?;
    let raw_arguments = rest.trim_start();
    if name.is_empty() || raw_arguments.is_empty() {
        return None;
    }
    Some(JobDescriptor::new(name, raw_arguments))
}
