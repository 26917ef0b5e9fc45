//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary and verify outputs.

mod common;

use common::{assert_contains, Sandbox};

#[test]
fn test_help_lists_commands() {
    let sb = Sandbox::new();
    let out = sb.ok(&["--help"]);
    for command in ["place", "guide", "visit", "availability", "blackout", "scheduler"] {
        assert_contains(&out, command);
    }
}

#[test]
fn test_config_get_and_set() {
    let sb = Sandbox::new();
    assert_eq!(sb.ok(&["config", "get", "scheduler.interval_secs"]).trim(), "5");
    sb.ok(&["config", "set", "scheduler.interval_secs", "30"]);
    assert_eq!(sb.ok(&["config", "get", "scheduler.interval_secs"]).trim(), "30");

    let stderr = sb.fails(&["config", "get", "scheduler.nope"]);
    assert_contains(&stderr, "unknown key");
}

#[test]
fn test_category_list_has_built_ins() {
    let sb = Sandbox::new();
    let list = sb.json(&["category", "list"]);
    let names: Vec<_> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, ["artistic", "historical", "naturalistic", "scientific"]);

    let stderr = sb.fails(&["category", "remove", "historical"]);
    assert_contains(&stderr, "cannot be removed");
}

#[test]
fn test_place_and_guide_registration() {
    let sb = Sandbox::new();
    sb.seed_catalog();

    let places = sb.json(&["place", "list"]);
    assert_eq!(places[0]["name"], "Museo Civico");
    let guides = sb.json(&["guide", "list"]);
    assert_eq!(guides[0]["email"], "anna@example.org");

    let stderr = sb.fails(&["place", "add", "Lab", "--categories", "alchemy"]);
    assert_contains(&stderr, "category not found: alchemy");
}

#[test]
fn test_blackout_add_twice_keeps_one() {
    let sb = Sandbox::new();
    assert_contains(&sb.ok(&["blackout", "add", "2026-12-08", "Immaculate Conception"]), "added");
    assert_contains(&sb.ok(&["blackout", "add", "2026-12-08", "Immaculate Conception"]), "already");
    let list = sb.json(&["blackout", "list"]);
    assert_eq!(list.as_object().unwrap().len(), 1);
    assert_eq!(list["2026-12-08"], "Immaculate Conception");
}

#[test]
fn test_unknown_visit_fails() {
    let sb = Sandbox::new();
    let stderr = sb.fails(&["visit", "get", "missing"]);
    assert_contains(&stderr, "error: visit not found: missing");
}
