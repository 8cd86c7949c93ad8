#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Black-box tests of the `jobmux` binary.
//!
//! The compiler is replaced by a small shell script that reads its own
//! arguments, so these tests only run on unix.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn jobmux(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_jobmux"))
        .args(args)
        .current_dir(dir)
        .env_remove("JOBMUX_CONFIG")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run jobmux")
}

#[test]
fn missing_flag_prints_usage_and_fails() {
    let dir = TempDir::new().unwrap();
    let output = jobmux(dir.path(), &[]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--compiler-args-file"));
    assert!(!stderr.contains("START_MODULE"));
}

#[test]
fn unknown_flag_prints_usage_and_fails() {
    let dir = TempDir::new().unwrap();
    let output = jobmux(dir.path(), &["--threads=4"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--compiler-args-file"));
}

#[test]
fn usage_wins_over_broken_settings_file() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("jobmux.toml"), "[compiler\ncommand = ").unwrap();
    let output = jobmux(dir.path(), &[]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--compiler-args-file"));
    assert!(!stderr.contains("Invalid settings file"));
}

#[test]
fn broken_settings_file_fails_a_valid_invocation() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("jobmux.toml"), "[compiler\ncommand = ").unwrap();
    std::fs::write(dir.path().join("args.txt"), "a --js a.js\n").unwrap();
    let output = jobmux(dir.path(), &["--compiler-args-file=args.txt"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid settings file"));
    assert!(!stderr.contains("START_MODULE"));
}

#[test]
fn missing_descriptor_file_fails_without_report() {
    let dir = TempDir::new().unwrap();
    let output = jobmux(dir.path(), &["--compiler-args-file=does-not-exist.txt"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!stderr.contains("START_MODULE"));
    assert!(stderr.contains("does-not-exist.txt"));
}

#[cfg(unix)]
mod with_fake_compiler {
    use super::*;

    const FAKE_COMPILER: &str = r#"#!/bin/sh
echo "stdout from $2"
case "$1" in
  --fail) echo "$2:1: ERROR - failed" >&2; exit 1 ;;
  --slow) sleep 1; echo "$2:1: WARNING - slow" >&2 ;;
  *) echo "$2:1: WARNING - compiled" >&2 ;;
esac
echo "1 error(s), 0 warning(s)" >&2
exit 0
"#;

    fn setup(descriptors: &str, extra_settings: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let script = dir.path().join("fake-compiler.sh");
        std::fs::write(&script, FAKE_COMPILER).unwrap();
        std::fs::write(
            dir.path().join("jobmux.toml"),
            format!(
                "[compiler]\ncommand = [\"sh\", \"{}\"]\n{extra_settings}",
                script.display()
            ),
        )
        .unwrap();
        let args = dir.path().join("args.txt");
        std::fs::write(&args, descriptors).unwrap();
        (dir, args)
    }

    fn starts(stderr: &str) -> Vec<&str> {
        stderr
            .lines()
            .filter(|line| line.starts_with("@@ START_MODULE:"))
            .collect()
    }

    #[test]
    fn report_follows_descriptor_order() {
        let (dir, args) = setup(
            "first --slow a.js\n\nmalformed\nsecond --js b.js\nthird --fail c.js\n",
            "",
        );
        let output = jobmux(
            dir.path(),
            &[&format!("--compiler-args-file=\"{}\"", args.display())],
        );

        assert!(output.status.success(), "per-job failures do not fail the run");
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert_eq!(
            starts(&stderr),
            vec![
                "@@ START_MODULE:first @@",
                "@@ START_MODULE:second @@",
                "@@ START_MODULE:third @@",
            ]
        );
        assert!(stderr.contains(
            "@@ START_MODULE:second @@\nb.js:1: WARNING - compiled\n0 error(s), 1 warning(s)\n\n@@ END_MODULE @@\n"
        ));
        assert!(stderr.contains("ERROR: Compiler returned 1\n@@ START_MODULE:third @@\n"));
        assert!(stderr.contains("Line 3"));

        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("stdout from a.js"));
        assert!(!stderr.contains("stdout from"));
    }

    #[test]
    fn strict_exit_fails_on_job_failure() {
        let (dir, args) = setup(
            "ok --js a.js\nbad --fail b.js\n",
            "[run]\nstrict_exit = true\n",
        );
        let output = jobmux(
            dir.path(),
            &["--compiler-args-file", args.to_str().unwrap()],
        );

        assert!(!output.status.success());
        assert_eq!(starts(&String::from_utf8_lossy(&output.stderr)).len(), 2);
    }
}
