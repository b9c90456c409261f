//! Mutant materialization: checksum deduplication and isolated project
//! copies.
//!
//! A mutant directory is published atomically: the project is copied into a
//! hidden staging directory under the mutant root and renamed into place, so
//! an aborted run never leaves a half-copied tree that looks complete.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::config::RunConfig;
use crate::copy_tree;
use crate::error::{Error, Result};

/// One isolated, fully buildable project copy with exactly one source edit
/// applied. Immutable once created; the execution engine only reads it.
#[derive(Debug, Clone)]
pub struct Mutant {
    /// Mutated file, relative to the project root.
    pub relative_path: PathBuf,
    /// The original (unmutated) file.
    pub absolute_path: PathBuf,
    pub strategy: String,
    pub index: usize,
    pub checksum: String,
    /// Root of the isolated project copy.
    pub dir: PathBuf,
    /// The mutated file inside the copy.
    pub mutated_file: PathBuf,
}

impl Mutant {
    /// `<relative-file-path>.<strategy-name>.<sequence-number>`, which is
    /// also the name of the on-disk directory.
    pub fn id(&self) -> String {
        format!(
            "{}.{}.{}",
            self.relative_path.display(),
            safe_strategy_name(&self.strategy),
            self.index
        )
    }
}

/// Outcome of one materialization attempt.
#[derive(Debug)]
pub enum Materialized {
    Fresh(Mutant),
    /// The serialized text was byte-identical to an earlier mutant this run.
    Duplicate { checksum: String },
}

/// Strategy names use '/' as a group separator; directory names cannot.
pub fn safe_strategy_name(name: &str) -> String {
    name.replace('/', "-")
}

pub fn content_checksum(text: &str) -> String {
    blake3::hash(text.as_bytes()).to_hex().to_string()
}

/// Turns materialized views into on-disk mutants. The dedup set is scoped to
/// one run and shared across files and strategies.
pub struct Materializer<'c> {
    config: &'c RunConfig,
    mutant_root: PathBuf,
    seen: HashSet<String>,
}

impl<'c> Materializer<'c> {
    /// Fails if the mutant output root cannot be created; that is fatal for
    /// the whole run.
    pub fn new(config: &'c RunConfig) -> Result<Self> {
        let mutant_root = config.mutant_root();
        fs::create_dir_all(&mutant_root)?;
        Ok(Materializer {
            config,
            mutant_root,
            seen: HashSet::new(),
        })
    }

    /// Seed the dedup set with the original file's bytes, so an edit that
    /// serializes identically to the source classifies as a duplicate.
    pub fn note_original(&mut self, text: &str) {
        self.seen.insert(content_checksum(text));
    }

    /// Persist one mutated file as an isolated project copy, or classify it
    /// as a duplicate if the same bytes were seen earlier this run.
    pub fn materialize(
        &mut self,
        relative: &Path,
        strategy: &str,
        index: usize,
        text: &str,
    ) -> Result<Materialized> {
        let checksum = content_checksum(text);
        if self.seen.contains(&checksum) {
            return Ok(Materialized::Duplicate { checksum });
        }

        let file_name = relative
            .file_name()
            .ok_or_else(|| Error::internal(format!("no file name in {}", relative.display())))?
            .to_string_lossy()
            .into_owned();
        let dir_name = format!("{}.{}.{}", file_name, safe_strategy_name(strategy), index);
        let dest = match relative.parent() {
            Some(parent) if parent != Path::new("") => {
                self.mutant_root.join(parent).join(&dir_name)
            }
            _ => self.mutant_root.join(&dir_name),
        };

        if dest.exists() {
            if self.config.overwrite {
                fs::remove_dir_all(&dest)?;
            } else {
                return Err(Error::MutantConflict { path: dest });
            }
        }

        let stage = self
            .mutant_root
            .join(format!(".stage-{:08x}", fastrand::u32(..)));
        if let Err(e) = self.populate(&stage, relative, text) {
            let _ = fs::remove_dir_all(&stage);
            return Err(e);
        }
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        if let Err(e) = fs::rename(&stage, &dest) {
            let _ = fs::remove_dir_all(&stage);
            return Err(e.into());
        }

        self.seen.insert(checksum.clone());
        let absolute_path = self.config.project_root.join(relative);
        let mutated_file = dest.join(relative);
        Ok(Materialized::Fresh(Mutant {
            relative_path: relative.to_path_buf(),
            absolute_path,
            strategy: strategy.to_string(),
            index,
            checksum,
            dir: dest,
            mutated_file,
        }))
    }

    fn populate(&self, stage: &Path, relative: &Path, text: &str) -> Result<()> {
        copy_tree::copy_project(&self.config.project_root, stage, &self.mutant_root)?;
        // The mutated source goes over the copied file, never the original.
        fs::write(stage.join(relative), text)?;
        Ok(())
    }
}

/// Execution-only mode: rebuild `Mutant` records from directories a previous
/// run left under the mutant root.
pub fn scan_existing(config: &RunConfig) -> Result<Vec<Mutant>> {
    let pattern = Regex::new(r"^([\w\-. ]+?\.(?:py|rs))\.([\w\-]+)\.(\d+)$")
        .expect("mutant directory pattern is valid");
    let mut mutants = Vec::new();
    let root = config.mutant_root();
    if root.is_dir() {
        scan_dir(config, &root, Path::new(""), &pattern, &mut mutants)?;
    }
    mutants.sort_by_key(|m| (m.relative_path.clone(), m.strategy.clone(), m.index));
    Ok(mutants)
}

fn scan_dir(
    config: &RunConfig,
    dir: &Path,
    rel_prefix: &Path,
    pattern: &Regex,
    out: &mut Vec<Mutant>,
) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        if let Some(caps) = pattern.captures(&name) {
            let relative = rel_prefix.join(&caps[1]);
            let mutated_file = entry.path().join(&relative);
            let data = fs::read_to_string(&mutated_file)?;
            out.push(Mutant {
                absolute_path: config.project_root.join(&relative),
                relative_path: relative,
                strategy: caps[2].to_string(),
                index: caps[3].parse().unwrap_or(0),
                checksum: content_checksum(&data),
                dir: entry.path(),
                mutated_file,
            });
        } else {
            scan_dir(config, &entry.path(), &rel_prefix.join(&name), pattern, out)?;
        }
    }
    Ok(())
}
