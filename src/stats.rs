//! Run statistics and duplicate-kill detection.
//!
//! The aggregator owns all accumulation state for one run: per-file
//! counters, the failed-test index used to surface redundant mutants, and
//! the list of surviving mutants. Nothing here is process-global; the
//! pipeline passes one `Aggregator` through explicitly.

use std::collections::BTreeMap;

use serde::Serialize;

/// Classification of one executed (or deduplicated) mutant. Produced once,
/// never revised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExecutionResult {
    /// The test suite failed: the mutant was killed. The tool's success path.
    Passed,
    /// The test suite still passed: the mutant survived a coverage gap.
    Failed,
    /// The mutant did not compile, timed out, or exited oddly.
    Skipped,
    /// Byte-identical to an earlier mutant; never executed.
    Duplicate,
}

/// Counters for one source file.
#[derive(Debug, Default, Clone, Serialize)]
pub struct FileStats {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duplicated: usize,
    /// Mutants dropped by materialization or execution I/O errors. Reported,
    /// but excluded from the score denominator.
    pub errored: usize,
}

impl FileStats {
    pub fn record(&mut self, result: ExecutionResult) {
        match result {
            ExecutionResult::Passed => self.passed += 1,
            ExecutionResult::Failed => self.failed += 1,
            ExecutionResult::Skipped => self.skipped += 1,
            ExecutionResult::Duplicate => self.duplicated += 1,
        }
    }

    /// Denominator of the mutation score; duplicated and errored mutants do
    /// not count.
    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped
    }

    pub fn score(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.passed as f64 / total as f64
    }

    pub fn summary(&self) -> String {
        format!(
            "the mutation score is {:.6} ({} passed, {} failed, {} duplicated, {} skipped, total is {})",
            self.score(),
            self.passed,
            self.failed,
            self.duplicated,
            self.skipped,
            self.total()
        )
    }

    fn merge(&mut self, other: &FileStats) {
        self.passed += other.passed;
        self.failed += other.failed;
        self.skipped += other.skipped;
        self.duplicated += other.duplicated;
        self.errored += other.errored;
    }
}

/// Canonical key for a set of failing tests: sorted and joined, so two
/// mutants killed by the same tests land in the same bucket.
pub fn canonical_test_key(tests: &[String]) -> String {
    let mut sorted = tests.to_vec();
    sorted.sort();
    sorted.join(", ")
}

#[derive(Debug, Default)]
pub struct Aggregator {
    files: BTreeMap<String, FileStats>,
    /// failing-test key -> mutants that produced exactly that failure set.
    failed_test_index: BTreeMap<String, Vec<String>>,
    live: Vec<String>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, file: &str, result: ExecutionResult) {
        self.files.entry(file.to_string()).or_default().record(result);
    }

    /// Record a mutant dropped by a recoverable error.
    pub fn record_error(&mut self, file: &str) {
        self.files.entry(file.to_string()).or_default().errored += 1;
    }

    /// Record a full execution: the classification, survival, and the
    /// failing-test set for redundancy detection.
    pub fn record_execution(
        &mut self,
        file: &str,
        mutant_id: &str,
        result: ExecutionResult,
        failed_tests: &[String],
    ) {
        self.record(file, result);
        if result == ExecutionResult::Failed {
            self.live.push(mutant_id.to_string());
        }
        // Only killed mutants enter the redundancy index; a skipped compile
        // failure can still print FAIL lines.
        if result == ExecutionResult::Passed && !failed_tests.is_empty() {
            self.failed_test_index
                .entry(canonical_test_key(failed_tests))
                .or_default()
                .push(mutant_id.to_string());
        }
    }

    pub fn files(&self) -> &BTreeMap<String, FileStats> {
        &self.files
    }

    pub fn overall(&self) -> FileStats {
        let mut overall = FileStats::default();
        for stats in self.files.values() {
            overall.merge(stats);
        }
        overall
    }

    /// Mutants the test suite never killed.
    pub fn live_mutants(&self) -> &[String] {
        &self.live
    }

    /// Buckets of mutants killed by the identical failing-test set. Size > 1
    /// means the test suite cannot tell those source edits apart.
    pub fn redundant_candidates(&self) -> Vec<(&str, &[String])> {
        self.failed_test_index
            .iter()
            .filter(|(_, mutants)| mutants.len() > 1)
            .map(|(key, mutants)| (key.as_str(), mutants.as_slice()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_is_passed_over_total() {
        let mut stats = FileStats::default();
        stats.passed = 3;
        stats.failed = 1;
        stats.skipped = 1;
        stats.duplicated = 2;
        assert_eq!(stats.total(), 5);
        assert!((stats.score() - 0.6).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_stats_score_is_zero() {
        let stats = FileStats::default();
        assert_eq!(stats.total(), 0);
        assert_eq!(stats.score(), 0.0);
    }

    #[test]
    fn summary_uses_the_fixed_format() {
        let mut stats = FileStats::default();
        stats.passed = 1;
        stats.failed = 1;
        assert_eq!(
            stats.summary(),
            "the mutation score is 0.500000 (1 passed, 1 failed, 0 duplicated, 0 skipped, total is 2)"
        );
    }

    #[test]
    fn errored_mutants_are_reported_but_not_scored() {
        let mut aggregator = Aggregator::new();
        aggregator.record("a.py", ExecutionResult::Passed);
        aggregator.record_error("a.py");
        aggregator.record_error("a.py");

        let stats = &aggregator.files()["a.py"];
        assert_eq!(stats.errored, 2);
        assert_eq!(stats.total(), 1);
        assert!((stats.score() - 1.0).abs() < f64::EPSILON);
        assert_eq!(aggregator.overall().errored, 2);
    }

    #[test]
    fn canonical_key_is_order_independent() {
        let a = canonical_test_key(&["TestFoo".into(), "TestBar".into()]);
        let b = canonical_test_key(&["TestBar".into(), "TestFoo".into()]);
        assert_eq!(a, b);
        assert_eq!(a, "TestBar, TestFoo");
    }
}
