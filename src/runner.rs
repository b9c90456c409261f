//! Execution and classification engine.
//!
//! For one mutant: run the optional build step, diff the mutant against the
//! original, run the test command inside the isolated copy, and map its exit
//! status to a classification. The
//! vocabulary is inverted on purpose: a test suite that still passes on a
//! mutant is a *failed* mutant (it survived), a failing suite is a *passed*
//! mutant (it was killed).

use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use regex::Regex;
use similar::TextDiff;

use crate::config::RunConfig;
use crate::error::{Error, Result};
use crate::materialize::Mutant;
use crate::stats::ExecutionResult;

const DEFAULT_TEST_COMMAND: &str = "cargo test";

/// The outcome of executing one mutant.
#[derive(Debug)]
pub struct Execution {
    pub result: ExecutionResult,
    /// Test names extracted from `FAIL: <name>` lines in the output.
    pub failed_tests: Vec<String>,
    pub diff: String,
}

enum TestRun {
    Exited { code: Option<i32>, output: String },
    TimedOut,
}

/// Map a test command exit code to a classification.
///
/// 0: tests passed despite the mutation, the mutant survived -> Failed.
/// 1: tests failed, the mutant was killed -> Passed.
/// 2: the mutant did not compile -> Skipped.
/// Anything else is skipped too; the caller logs a warning.
pub fn classify(code: Option<i32>) -> ExecutionResult {
    match code {
        Some(0) => ExecutionResult::Failed,
        Some(1) => ExecutionResult::Passed,
        _ => ExecutionResult::Skipped,
    }
}

pub fn parse_command(cmd: &str) -> (String, Vec<String>) {
    let parts: Vec<&str> = cmd.split_whitespace().collect();
    if parts.len() > 1 {
        (
            parts[0].to_string(),
            parts[1..].iter().map(|s| s.to_string()).collect(),
        )
    } else {
        (cmd.to_string(), vec![])
    }
}

/// Line diff between the original and the mutated source, delete/insert
/// lines only.
pub fn generate_diff(original: &str, mutated: &str) -> String {
    let diff = TextDiff::from_lines(original, mutated);
    let mut output = String::new();
    for change in diff.iter_all_changes() {
        match change.tag() {
            similar::ChangeTag::Delete => output.push_str(&format!("- {}", change)),
            similar::ChangeTag::Insert => output.push_str(&format!("+ {}", change)),
            _ => {}
        }
    }
    output
}

pub struct TestRunner<'c> {
    config: &'c RunConfig,
    fail_pattern: Regex,
}

impl<'c> TestRunner<'c> {
    pub fn new(config: &'c RunConfig) -> Self {
        TestRunner {
            config,
            fail_pattern: Regex::new(r"FAIL:?\s*([\w:]+)").expect("fail pattern is valid"),
        }
    }

    /// Execute one mutant and classify it. The cleanup command runs on every
    /// exit path, including errors.
    pub fn execute(&self, mutant: &Mutant) -> Result<Execution> {
        let _cleanup = CleanupGuard {
            command: self.config.cleanup_command.as_deref(),
            dir: &mutant.dir,
        };

        self.run_build(&mutant.dir)?;
        let diff = self.mutant_diff(mutant)?;
        if diff.is_empty() {
            tracing::warn!(
                mutant = %mutant.id(),
                "mutant is byte-identical to the original file"
            );
        } else {
            tracing::debug!(mutant = %mutant.id(), "diff:\n{}", diff);
        }

        match self.run_tests(&mutant.dir)? {
            TestRun::TimedOut => {
                tracing::warn!(
                    mutant = %mutant.id(),
                    timeout_secs = self.config.timeout_secs,
                    "test command timed out, classifying as skipped"
                );
                Ok(Execution {
                    result: ExecutionResult::Skipped,
                    failed_tests: vec![],
                    diff,
                })
            }
            TestRun::Exited { code, output } => {
                if !matches!(code, Some(0) | Some(1) | Some(2)) {
                    tracing::warn!(
                        mutant = %mutant.id(),
                        exit_code = ?code,
                        "unrecognized test exit code, classifying as skipped"
                    );
                }
                let failed_tests = self.failed_tests(&output);
                Ok(Execution {
                    result: classify(code),
                    failed_tests,
                    diff,
                })
            }
        }
    }

    /// Extract failing test names from combined test output.
    pub fn failed_tests(&self, output: &str) -> Vec<String> {
        self.fail_pattern
            .captures_iter(output)
            .map(|caps| caps[1].to_string())
            .collect()
    }

    fn run_build(&self, dir: &Path) -> Result<()> {
        let Some(build_command) = self.config.build_command.as_deref() else {
            return Ok(());
        };
        tracing::info!(command = build_command, "running build command");
        let (program, args) = parse_command(build_command);
        let output = Command::new(&program)
            .args(&args)
            .current_dir(dir)
            .output()
            .map_err(|e| Error::Build {
                code: None,
                output: format!("could not run {build_command}: {e}"),
            })?;
        if !output.status.success() {
            return Err(Error::Build {
                code: output.status.code(),
                output: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(())
    }

    /// Line diff of the mutant against the original. An empty diff is an
    /// accepted outcome; the caller logs it and execution proceeds.
    fn mutant_diff(&self, mutant: &Mutant) -> Result<String> {
        let original = std::fs::read_to_string(&mutant.absolute_path)?;
        let mutated = std::fs::read_to_string(&mutant.mutated_file)?;
        Ok(generate_diff(&original, &mutated))
    }

    fn run_tests(&self, dir: &Path) -> Result<TestRun> {
        let command = self
            .config
            .test_command
            .as_deref()
            .unwrap_or(DEFAULT_TEST_COMMAND);
        let (program, args) = parse_command(command);
        let mut child = Command::new(&program)
            .args(&args)
            .current_dir(dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let start = Instant::now();
        let timeout = Duration::from_secs(self.config.timeout_secs);
        loop {
            match child.try_wait()? {
                Some(status) => {
                    let mut output = String::new();
                    if let Some(mut stdout) = child.stdout.take() {
                        let _ = stdout.read_to_string(&mut output);
                    }
                    if let Some(mut stderr) = child.stderr.take() {
                        let _ = stderr.read_to_string(&mut output);
                    }
                    return Ok(TestRun::Exited {
                        code: status.code(),
                        output,
                    });
                }
                None => {
                    if start.elapsed() > timeout {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Ok(TestRun::TimedOut);
                    }
                    std::thread::sleep(Duration::from_millis(10));
                }
            }
        }
    }
}

/// Runs the cleanup command when dropped, so it fires no matter how the
/// mutant's execution ended.
struct CleanupGuard<'a> {
    command: Option<&'a str>,
    dir: &'a Path,
}

impl Drop for CleanupGuard<'_> {
    fn drop(&mut self) {
        let Some(command) = self.command else {
            return;
        };
        tracing::info!(command, "running cleanup command");
        let (program, args) = parse_command(command);
        match Command::new(&program).args(&args).current_dir(self.dir).output() {
            Ok(output) if !output.status.success() => {
                tracing::warn!(command, code = ?output.status.code(), "cleanup command failed");
            }
            Err(e) => tracing::warn!(command, error = %e, "could not run cleanup command"),
            _ => {}
        }
    }
}
