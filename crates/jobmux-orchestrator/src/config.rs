use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use std::path::PathBuf;

/// Command-line flags recognized by the runner.
#[derive(Parser, Debug)]
#[command(
    name = "jobmux",
    about = "Runs independent compiler jobs in parallel and reports their diagnostics in order"
)]
struct Flags {
    /// Full path to file containing compiler arguments (one line per instance)
    #[arg(long = "compiler-args-file", value_name = "PATH")]
    compiler_args_file: Option<PathBuf>,
}

/// Validated, process-wide run configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfiguration {
    /// Descriptor file listing one job per line.
    pub descriptor_file: PathBuf,
}

/// Why the command line was rejected, plus the usage text to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidConfiguration {
    /// Parser message, absent when the flags parsed but the path was missing.
    pub message: Option<String>,
    /// Rendered usage/help text.
    pub usage: String,
}

impl InvalidConfiguration {
    fn new(message: Option<String>) -> Self {
        Self {
            message,
            usage: Flags::command().render_help().to_string(),
        }
    }
}

impl std::fmt::Display for InvalidConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(message) = &self.message {
            writeln!(f, "{}", message.trim_end())?;
        }
        write!(f, "{}", self.usage)
    }
}

impl std::error::Error for InvalidConfiguration {}

impl RunConfiguration {
    /// Parses the raw process arguments, program name first.
    ///
    /// Every token after the program name is normalized with
    /// [`normalize_args`] before parsing. Help requests, unknown flags and a
    /// missing `--compiler-args-file` all yield [`InvalidConfiguration`].
    pub fn from_args<I, S>(args: I) -> Result<Self, InvalidConfiguration>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args = args.into_iter().map(Into::into);
        let program = args.next().unwrap_or_else(|| "jobmux".to_string());
        let rest: Vec<String> = args.collect();

        let tokens = std::iter::once(program).chain(normalize_args(&rest));
        let flags = Flags::try_parse_from(tokens).map_err(|e| match e.kind() {
            ErrorKind::DisplayHelp => InvalidConfiguration::new(None),
            _ => InvalidConfiguration::new(Some(e.to_string())),
        })?;

        match flags.compiler_args_file {
            Some(descriptor_file) => Ok(Self { descriptor_file }),
            None => Err(InvalidConfiguration::new(None)),
        }
    }
}

/// Rewrites `--name=value` tokens into `--name` and `value`.
///
/// One layer of matching single or double quotes around the whole value is
/// removed. Any other token passes through unchanged.
pub fn normalize_args(args: &[String]) -> Vec<String> {
    let mut normalized = Vec::with_capacity(args.len());

    for arg in args {
        match split_flag_value(arg) {
            Some((flag, value)) => {
                normalized.push(flag.to_string());
                normalized.push(unquote(value).to_string());
            }
            None => normalized.push(arg.clone()),
        }
    }

    normalized
}

fn split_flag_value(arg: &str) -> Option<(&str, &str)> {
    let (flag, value) = arg.split_once('=')?;
    let name = flag.strip_prefix("--")?;
    let mut chars = name.chars();
    let first = chars.next()?;
    let valid = (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    valid.then_some((flag, value))
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_normalize_splits_flag_value() {
        assert_eq!(
            normalize_args(&strings(&["--compiler-args-file=/tmp/args.txt"])),
            strings(&["--compiler-args-file", "/tmp/args.txt"])
        );
    }

    #[test]
    fn test_normalize_unwraps_one_quote_layer() {
        assert_eq!(
            normalize_args(&strings(&["--a=\"x y\"", "--b='z'", "--c=\"'w'\""])),
            strings(&["--a", "x y", "--b", "z", "--c", "'w'"])
        );
    }

    #[test]
    fn test_normalize_leaves_mismatched_quotes() {
        assert_eq!(
            normalize_args(&strings(&["--a='x\"", "--b=\""])),
            strings(&["--a", "'x\"", "--b", "\""])
        );
    }

    #[test]
    fn test_normalize_passes_other_tokens_through() {
        let args = strings(&["positional", "-x=1", "--=v", "--flag", "value", "--1st=v"]);
        assert_eq!(normalize_args(&args), args);
    }

    #[test]
    fn test_normalize_keeps_later_equals_in_value() {
        assert_eq!(
            normalize_args(&strings(&["--define=DEBUG=false"])),
            strings(&["--define", "DEBUG=false"])
        );
    }

    #[test]
    fn test_equals_and_space_forms_are_equivalent() {
        let spaced =
            RunConfiguration::from_args(["jobmux", "--compiler-args-file", "/tmp/a b.txt"]);
        let joined = RunConfiguration::from_args(["jobmux", "--compiler-args-file=/tmp/a b.txt"]);
        let quoted =
            RunConfiguration::from_args(["jobmux", "--compiler-args-file='/tmp/a b.txt'"]);
        assert_eq!(spaced, joined);
        assert_eq!(spaced, quoted);
        assert_eq!(
            spaced.unwrap().descriptor_file,
            PathBuf::from("/tmp/a b.txt")
        );
    }

    #[test]
    fn test_missing_path_is_invalid() {
        let err = RunConfiguration::from_args(["jobmux"]).unwrap_err();
        assert!(err.message.is_none());
        assert!(err.usage.contains("--compiler-args-file"));
    }

    #[test]
    fn test_unknown_flag_is_invalid() {
        let err = RunConfiguration::from_args(["jobmux", "--jobs=4"]).unwrap_err();
        assert!(err.message.is_some());
        assert!(err.to_string().contains("--compiler-args-file"));
    }

    #[test]
    fn test_help_is_invalid() {
        assert!(RunConfiguration::from_args(["jobmux", "--help"]).is_err());
    }
}
