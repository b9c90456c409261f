use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use mutesting::config::RunConfig;
use mutesting::run::run;
use mutesting::strategy::StrategyRegistry;

const THREE_IFS: &str = "\
def classify(x):
    if x > 0:
        return 1
    if x < 0:
        return -1
    if x == 0:
        return 0
    return None
";

fn script(dir: &Path, name: &str, body: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }
    path.to_string_lossy().into_owned()
}

fn base_config(project: &TempDir) -> RunConfig {
    RunConfig {
        project_root: project.path().to_path_buf(),
        mutant_dir: PathBuf::from("mutants"),
        strategies: vec!["branch/if".into()],
        files: vec![PathBuf::from("classify.py")],
        timeout_secs: 10,
        ..RunConfig::default()
    }
}

#[test]
fn three_ifs_with_an_always_failing_suite_score_one() {
    let project = TempDir::new().unwrap();
    fs::write(project.path().join("classify.py"), THREE_IFS).unwrap();

    let mut config = base_config(&project);
    config.test_command = Some(script(project.path(), "kill_all.sh", "exit 1"));

    let registry = StrategyRegistry::with_builtins();
    let aggregator = run(&config, &registry).unwrap();

    let stats = &aggregator.files()["classify.py"];
    assert_eq!(stats.passed, 3);
    assert_eq!(stats.failed, 0);
    assert_eq!(stats.skipped, 0);
    assert!((stats.score() - 1.0).abs() < f64::EPSILON);
    assert!(aggregator.live_mutants().is_empty());
}

#[test]
fn a_passing_suite_reports_surviving_mutants() {
    let project = TempDir::new().unwrap();
    fs::write(project.path().join("classify.py"), THREE_IFS).unwrap();

    let mut config = base_config(&project);
    config.test_command = Some(script(project.path(), "survive_all.sh", "exit 0"));

    let registry = StrategyRegistry::with_builtins();
    let aggregator = run(&config, &registry).unwrap();

    let stats = &aggregator.files()["classify.py"];
    assert_eq!(stats.failed, 3);
    assert_eq!(stats.score(), 0.0);
    assert_eq!(aggregator.live_mutants().len(), 3);
}

#[test]
fn no_test_mode_leaves_mutant_trees_on_disk() {
    let project = TempDir::new().unwrap();
    fs::write(project.path().join("classify.py"), THREE_IFS).unwrap();

    let mut config = base_config(&project);
    config.disable_test = true;

    let registry = StrategyRegistry::with_builtins();
    let aggregator = run(&config, &registry).unwrap();
    assert_eq!(aggregator.overall().total(), 0);

    let mutants = project.path().join("mutants");
    for i in 0..3 {
        let dir = mutants.join(format!("classify.py.branch-if.{i}"));
        assert!(dir.is_dir(), "missing {}", dir.display());
        assert!(dir.join("classify.py").is_file());
    }
    // The original stayed untouched.
    assert_eq!(
        fs::read_to_string(project.path().join("classify.py")).unwrap(),
        THREE_IFS
    );
}

#[test]
fn no_mutate_mode_executes_mutants_from_a_previous_run() {
    let project = TempDir::new().unwrap();
    fs::write(project.path().join("classify.py"), THREE_IFS).unwrap();

    let registry = StrategyRegistry::with_builtins();

    let mut generate = base_config(&project);
    generate.disable_test = true;
    run(&generate, &registry).unwrap();

    let mut execute = base_config(&project);
    execute.disable_mutation = true;
    execute.test_command = Some(script(project.path(), "kill_all.sh", "exit 1"));
    let aggregator = run(&execute, &registry).unwrap();

    let stats = &aggregator.files()["classify.py"];
    assert_eq!(stats.passed, 3);
    assert!((stats.score() - 1.0).abs() < f64::EPSILON);
}

#[test]
fn an_edit_reproducing_the_original_is_a_duplicate_not_an_abort() {
    let project = TempDir::new().unwrap();
    // Gutting an `if` whose body is already `pass` serializes back to the
    // original bytes.
    fs::write(
        project.path().join("classify.py"),
        "def f(x):\n    if x:\n        pass\n    return 0\n",
    )
    .unwrap();

    let mut config = base_config(&project);
    config.test_command = Some(script(project.path(), "kill_all.sh", "exit 1"));

    let registry = StrategyRegistry::with_builtins();
    let aggregator = run(&config, &registry).unwrap();

    let stats = &aggregator.files()["classify.py"];
    assert_eq!(stats.duplicated, 1);
    assert_eq!(stats.total(), 0);
    assert!(!project
        .path()
        .join("mutants/classify.py.branch-if.0")
        .exists());
}

#[test]
fn conflicting_mutant_dirs_are_counted_as_errors_not_scored() {
    let project = TempDir::new().unwrap();
    fs::write(project.path().join("classify.py"), THREE_IFS).unwrap();
    // A stale directory from an earlier run occupies the first mutant's name.
    fs::create_dir_all(project.path().join("mutants/classify.py.branch-if.0")).unwrap();

    let mut config = base_config(&project);
    config.test_command = Some(script(project.path(), "kill_all.sh", "exit 1"));

    let registry = StrategyRegistry::with_builtins();
    let aggregator = run(&config, &registry).unwrap();

    let stats = &aggregator.files()["classify.py"];
    assert_eq!(stats.errored, 1);
    assert_eq!(stats.passed, 2);
    assert_eq!(stats.total(), 2);
    assert!((stats.score() - 1.0).abs() < f64::EPSILON);
}

#[test]
fn unknown_strategy_is_a_config_error() {
    let project = TempDir::new().unwrap();
    fs::write(project.path().join("classify.py"), THREE_IFS).unwrap();

    let mut config = base_config(&project);
    config.strategies = vec!["branch/case".into()];

    let registry = StrategyRegistry::with_builtins();
    let err = run(&config, &registry).unwrap_err();
    assert!(err.is_fatal());
    assert!(err.to_string().contains("branch/case"));
}

#[test]
fn unparsable_input_aborts_the_run() {
    let project = TempDir::new().unwrap();
    fs::write(project.path().join("classify.py"), "def broken(:\n").unwrap();

    let mut config = base_config(&project);
    config.disable_test = true;

    let registry = StrategyRegistry::with_builtins();
    let err = run(&config, &registry).unwrap_err();
    assert!(err.is_fatal());
}

#[test]
fn duplicate_serializations_are_counted_not_executed() {
    let project = TempDir::new().unwrap();
    // Gutting the if body and removing its only statement serialize to the
    // same bytes, so the second strategy's mutant is a duplicate.
    let source = "def f(x):\n    if x:\n        f(0)\n";
    fs::write(project.path().join("classify.py"), source).unwrap();

    let mut config = base_config(&project);
    config.strategies = vec!["branch/if".into(), "statement/remove".into()];
    config.test_command = Some(script(project.path(), "kill_all.sh", "exit 1"));

    let registry = StrategyRegistry::with_builtins();
    let aggregator = run(&config, &registry).unwrap();

    let stats = &aggregator.files()["classify.py"];
    assert_eq!(stats.passed, 1);
    assert_eq!(stats.duplicated, 1);
    assert_eq!(stats.total(), 1);
}
