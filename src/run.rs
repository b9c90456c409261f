//! Pipeline orchestration: strategy -> walk -> materializer -> runner ->
//! aggregator, sequential per mutant.
//!
//! This is also the mutant boundary for error recovery: fatal errors
//! propagate out with `?`, recoverable ones are logged and folded into the
//! statistics so one bad mutant never aborts the batch.

use crate::config::RunConfig;
use crate::error::{Error, Result};
use crate::materialize::{self, Materialized, Materializer, Mutant};
use crate::parser;
use crate::runner::TestRunner;
use crate::stats::{Aggregator, ExecutionResult};
use crate::strategy::StrategyRegistry;
use crate::walk::MutationWalk;
use crate::detect_language;

/// Run the whole pipeline for one resolved configuration.
pub fn run(config: &RunConfig, registry: &StrategyRegistry) -> Result<Aggregator> {
    config.validate()?;
    for name in &config.strategies {
        if registry.get(name).is_none() {
            return Err(Error::config(format!("unknown mutation strategy {name:?}")));
        }
    }

    let mut aggregator = Aggregator::new();

    let mutants = if config.disable_mutation {
        tracing::info!("mutation disabled, executing mutants already on disk");
        materialize::scan_existing(config)?
    } else {
        generate_mutants(config, registry, &mut aggregator)?
    };

    if config.disable_test {
        tracing::info!(
            mutants = mutants.len(),
            "test execution disabled, mutants left on disk"
        );
        return Ok(aggregator);
    }

    let runner = TestRunner::new(config);
    for mutant in &mutants {
        let file_key = mutant.relative_path.display().to_string();
        tracing::debug!(mutant = %mutant.id(), "running tests");
        match runner.execute(mutant) {
            Ok(execution) => {
                log_classification(mutant, execution.result);
                aggregator.record_execution(
                    &file_key,
                    &mutant.id(),
                    execution.result,
                    &execution.failed_tests,
                );
            }
            Err(e) if !e.is_fatal() => {
                tracing::warn!(mutant = %mutant.id(), error = %e, "dropping mutant");
                aggregator.record_error(&file_key);
            }
            Err(e) => return Err(e),
        }
    }

    Ok(aggregator)
}

fn generate_mutants(
    config: &RunConfig,
    registry: &StrategyRegistry,
    aggregator: &mut Aggregator,
) -> Result<Vec<Mutant>> {
    let mut materializer = Materializer::new(config)?;
    let mut mutants = Vec::new();

    for relative in &config.files {
        let absolute = config.project_root.join(relative);
        let file_key = relative.display().to_string();
        let language = detect_language(&absolute).ok_or_else(|| Error::UnsupportedLanguage {
            path: absolute.clone(),
        })?;
        let source = std::fs::read_to_string(&absolute)?;
        // The original file must be valid before it is worth mutating.
        let (mut tree, symbols) = parser::parse_source(&source, language, &absolute)?;
        debug_assert_eq!(tree.source(), source);
        // An edit that reproduces the original bytes is a duplicate, not a
        // mutant.
        materializer.note_original(&source);

        for name in &config.strategies {
            let strategy = registry
                .get(name)
                .ok_or_else(|| Error::config(format!("unknown mutation strategy {name:?}")))?;
            tracing::info!(file = %file_key, strategy = %name, "mutating");

            let mut walk = MutationWalk::new(&mut tree, strategy, &symbols, language);
            while let Some(view) = walk.next() {
                match materializer.materialize(relative, name, view.index, &view.text) {
                    Ok(Materialized::Fresh(mutant)) => {
                        tracing::info!(
                            mutant = %mutant.id(),
                            checksum = %mutant.checksum,
                            "created mutant"
                        );
                        mutants.push(mutant);
                    }
                    Ok(Materialized::Duplicate { checksum }) => {
                        tracing::debug!(checksum = %checksum, "ignoring duplicate mutant");
                        aggregator.record(&file_key, ExecutionResult::Duplicate);
                    }
                    Err(e) if !e.is_fatal() => {
                        tracing::warn!(file = %file_key, strategy = %name, error = %e,
                            "dropping mutant");
                        aggregator.record_error(&file_key);
                    }
                    Err(e) => return Err(e),
                }
            }
        }
        debug_assert_eq!(tree.source(), source, "walk failed to restore the tree");
    }

    Ok(mutants)
}

fn log_classification(mutant: &Mutant, result: ExecutionResult) {
    let label = match result {
        ExecutionResult::Passed => "PASS",
        ExecutionResult::Failed => "FAIL",
        ExecutionResult::Skipped => "SKIP",
        ExecutionResult::Duplicate => "DUP",
    };
    tracing::info!(
        mutant = %mutant.id(),
        checksum = %mutant.checksum,
        "{label}"
    );
}
