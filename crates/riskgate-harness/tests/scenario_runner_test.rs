//! Integration test: scenario fixtures replay cleanly.
//!
//! Validates that:
//! 1. Every fixture under tests/scenarios/ parses and passes its expectations.
//! 2. The shipped demo fixture matches the built-in demo.
//! 3. Replays are reproducible for a fixed seed.
//!
//! Run: cargo test -p riskgate-harness --test scenario_runner_test

use std::path::{Path, PathBuf};

use riskgate_core::{ControllerConfig, MemorySink, Verdict};
use riskgate_harness::{ScenarioRunner, ScenarioSet, ScenarioStep};

fn workspace_root() -> PathBuf {
    let manifest = env!("CARGO_MANIFEST_DIR");
    Path::new(manifest)
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .to_path_buf()
}

fn fixture_paths() -> Vec<PathBuf> {
    let dir = workspace_root().join("tests/scenarios");
    let mut paths: Vec<PathBuf> = std::fs::read_dir(&dir)
        .unwrap_or_else(|e| panic!("reading {}: {e}", dir.display()))
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.extension().and_then(|s| s.to_str()) == Some("json"))
        .collect();
    paths.sort();
    paths
}

#[test]
fn every_fixture_passes() {
    let paths = fixture_paths();
    assert!(paths.len() >= 2, "expected shipped fixtures, found {paths:?}");
    for path in paths {
        let set = ScenarioSet::from_file(&path)
            .unwrap_or_else(|e| panic!("{}: {e}", path.display()));
        let report = ScenarioRunner::new("fixture").run(&set).unwrap();
        assert!(
            report.all_passed(),
            "{}: {:#?}",
            path.display(),
            report.failures()
        );
    }
}

#[test]
fn demo_fixture_matches_builtin() {
    let shipped = ScenarioSet::from_file(&workspace_root().join("tests/scenarios/demo.v1.json"))
        .expect("demo fixture");
    assert_eq!(shipped, ScenarioSet::demo());
}

#[test]
fn replay_is_reproducible_for_a_seed() {
    // Repeated risks give the desensitization draw something to decide.
    let mut steps = vec![];
    for _ in 0..30 {
        steps.push(ScenarioStep::log_event("shutdown", 1.0));
    }
    for i in 0..200 {
        let risk = [0.35, 0.55, 0.75][i % 3];
        steps.push(ScenarioStep::evaluate(risk, "overload", i % 4 == 0));
    }
    let set = ScenarioSet {
        version: "v1".to_string(),
        name: "repeat".to_string(),
        description: None,
        config: None,
        seed: None,
        steps,
    };

    let runner = ScenarioRunner::new("r").with_seed(Some(0xDEAD_BEEF));
    let (a, sink_a) = runner.run_with_sink(&set, MemorySink::new()).unwrap();
    let (b, sink_b) = runner.run_with_sink(&set, MemorySink::new()).unwrap();
    assert_eq!(a, b);
    assert_eq!(sink_a.records(), sink_b.records());

    let desensitized = a
        .steps
        .iter()
        .filter(|s| s.detail.ends_with("desensitized"))
        .count();
    assert!(desensitized > 0, "expected at least one desensitized accept");
}

#[test]
fn fixture_config_shapes_the_controller() {
    let mut set = ScenarioSet::demo();
    set.config = Some(ControllerConfig::default().with_capacities(2, 2));
    set.steps.retain(|s| !matches!(s, ScenarioStep::ExpectStats { .. }));
    let report = ScenarioRunner::new("small").run(&set).unwrap();
    assert_eq!(report.stats.risk_history_len, 2);
    assert_eq!(report.stats.event_memory_len, 2);
}

#[test]
fn expectations_can_fail() {
    let mut set = ScenarioSet::demo();
    set.steps.insert(
        0,
        ScenarioStep::evaluate(1.0, "shutdown", true).expecting(Verdict::Accept),
    );
    let report = ScenarioRunner::new("neg").run(&set).unwrap();
    assert!(!report.all_passed());
    assert_eq!(report.failures()[0].index, 0);
}
