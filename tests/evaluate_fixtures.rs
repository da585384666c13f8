//! Table-driven evaluation over `tests/fixtures`.
//!
//! Each `<name>.input.json` is paired with `<name>.jsonata` and the expected
//! `<name>.output`. Outputs that parse as JSON are compared as values, so
//! object key order does not matter; anything else (`undefined`) is compared
//! as text.

use jsonata_bridge::{Bridge, EvaluationOutcome};
use std::fs;
use std::path::{Path, PathBuf};

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

fn fixture_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .filter_map(|file| file.strip_suffix(".input.json").map(str::to_owned))
        .collect();
    names.sort();
    names
}

fn read_part(dir: &Path, name: &str, extension: &str) -> String {
    let path = dir.join(format!("{name}{extension}"));
    fs::read_to_string(&path)
        .unwrap_or_else(|err| panic!("cannot read {}: {err}", path.display()))
        .trim()
        .to_string()
}

#[test]
fn fixtures_match_expected_output() {
    let dir = fixtures_dir();
    let names = fixture_names(&dir);
    assert!(names.len() >= 10, "fixtures missing from {}", dir.display());

    let bridge = Bridge::default();
    for name in &names {
        let input = read_part(&dir, name, ".input.json");
        let expression = read_part(&dir, name, ".jsonata");
        let expected = read_part(&dir, name, ".output");

        let result = match bridge.evaluate(&expression, &input) {
            EvaluationOutcome::Success(text) => text.into_string(),
            EvaluationOutcome::Failure(err) => panic!("{name}: `{expression}` failed: {err}"),
        };

        let parsed_expected = serde_json::from_str::<serde_json::Value>(&expected).ok();
        let parsed_result = serde_json::from_str::<serde_json::Value>(&result).ok();
        match (parsed_expected, parsed_result) {
            (Some(expected), Some(result)) => assert_eq!(result, expected, "{name}"),
            (None, None) => assert_eq!(result, expected, "{name}"),
            _ => panic!("{name}: expected `{expected}`, got `{result}`"),
        }
    }
}
