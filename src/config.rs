use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Resolved run configuration.
///
/// This is the already-consolidated form: the CLI merges a JSON config file
/// with command-line overrides before the pipeline ever sees it. `files` is
/// the final include list, relative to `project_root`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub project_root: PathBuf,
    /// Where mutant copies are written; relative paths are rooted at
    /// `project_root`.
    pub mutant_dir: PathBuf,
    /// Replace an existing mutant directory instead of failing on conflict.
    pub overwrite: bool,
    /// Test command run inside each mutant copy. `None` means the default
    /// `cargo test` invocation.
    pub test_command: Option<String>,
    /// Optional build step run before the tests, fatal on failure.
    pub build_command: Option<String>,
    /// Cleanup step, always run after a mutant's execution.
    pub cleanup_command: Option<String>,
    /// Test command timeout in seconds.
    pub timeout_secs: u64,
    /// Skip mutation and execute mutants already on disk.
    pub disable_mutation: bool,
    /// Generate mutants but do not run tests.
    pub disable_test: bool,
    /// Enabled strategy names; must all exist in the registry.
    pub strategies: Vec<String>,
    /// Source files to mutate, relative to `project_root`.
    pub files: Vec<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            project_root: PathBuf::from("."),
            mutant_dir: PathBuf::from("mutants"),
            overwrite: false,
            test_command: None,
            build_command: None,
            cleanup_command: None,
            timeout_secs: 10,
            disable_mutation: false,
            disable_test: false,
            strategies: Vec::new(),
            files: Vec::new(),
        }
    }
}

impl RunConfig {
    /// Deserialize a config file (JSON).
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let config: RunConfig = serde_json::from_str(&data)?;
        Ok(config)
    }

    /// Absolute root of the mutant output tree.
    pub fn mutant_root(&self) -> PathBuf {
        if self.mutant_dir.is_absolute() {
            self.mutant_dir.clone()
        } else {
            self.project_root.join(&self.mutant_dir)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.project_root.is_dir() {
            return Err(Error::config(format!(
                "project root {} is not a directory",
                self.project_root.display()
            )));
        }
        if !self.disable_mutation && self.files.is_empty() {
            return Err(Error::config("no files selected for mutation"));
        }
        if !self.disable_mutation && self.strategies.is_empty() {
            return Err(Error::config("no mutation strategies enabled"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let config: RunConfig = serde_json::from_str(r#"{"timeout_secs": 30}"#).unwrap();
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.mutant_dir, PathBuf::from("mutants"));
        assert!(!config.overwrite);
        assert!(config.test_command.is_none());
    }

    #[test]
    fn mutant_root_joins_relative_dir() {
        let config = RunConfig {
            project_root: PathBuf::from("/proj"),
            mutant_dir: PathBuf::from("mutants"),
            ..RunConfig::default()
        };
        assert_eq!(config.mutant_root(), PathBuf::from("/proj/mutants"));
    }

    #[test]
    fn mutant_root_keeps_absolute_dir() {
        let config = RunConfig {
            project_root: PathBuf::from("/proj"),
            mutant_dir: PathBuf::from("/tmp/mutants"),
            ..RunConfig::default()
        };
        assert_eq!(config.mutant_root(), PathBuf::from("/tmp/mutants"));
    }

    #[test]
    fn validate_rejects_empty_file_set() {
        let config = RunConfig {
            project_root: PathBuf::from("."),
            strategies: vec!["branch/if".into()],
            ..RunConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
