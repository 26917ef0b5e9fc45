//! Helpers for CLI end-to-end tests.
//!
//! Every [`Sandbox`] points HOME at its own temporary directory so tests
//! never touch the real data directory and can run in parallel.

#![allow(dead_code)]

use std::process::Command;

pub struct Sandbox {
    home: tempfile::TempDir,
    today: String,
}

impl Sandbox {
    /// Sandbox where today is 2026-10-10, availability collection open.
    pub fn new() -> Self {
        Self::on("2026-10-10")
    }

    pub fn on(today: &str) -> Self {
        Self {
            home: tempfile::tempdir().expect("tempdir"),
            today: today.to_string(),
        }
    }

    pub fn set_today(&mut self, today: &str) {
        self.today = today.to_string();
    }

    /// Invoke a CLI command and return (stdout, stderr, exit code).
    pub fn run(&self, args: &[&str]) -> (String, String, i32) {
        let output = Command::new(env!("CARGO_BIN_EXE_guidetour"))
            .args(["--today", &self.today])
            .args(args)
            .env("HOME", self.home.path())
            .env_remove("GUIDETOUR_ENV")
            .env_remove("RUST_LOG")
            .output()
            .expect("Failed to execute CLI command");

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let code = output.status.code().unwrap_or(-1);
        (stdout, stderr, code)
    }

    /// Invoke a CLI command and expect success.
    pub fn ok(&self, args: &[&str]) -> String {
        let (stdout, stderr, code) = self.run(args);
        assert_eq!(code, 0, "CLI command failed: {args:?}\n{stderr}");
        stdout
    }

    /// Invoke a CLI command and expect failure; returns stderr.
    pub fn fails(&self, args: &[&str]) -> String {
        let (_, stderr, code) = self.run(args);
        assert_ne!(code, 0, "CLI command unexpectedly succeeded: {args:?}");
        stderr
    }

    /// Run a command whose stdout is one JSON document.
    pub fn json(&self, args: &[&str]) -> serde_json::Value {
        let stdout = self.ok(args);
        serde_json::from_str(&stdout).expect("Failed to parse JSON output")
    }

    /// Seed one place offering `historical` and one qualified guide.
    pub fn seed_catalog(&self) {
        self.ok(&[
            "place",
            "add",
            "Museo Civico",
            "--location",
            "Via Roma 1",
            "--categories",
            "historical,artistic",
        ]);
        self.ok(&[
            "guide",
            "add",
            "anna@example.org",
            "Anna",
            "--categories",
            "historical",
        ]);
    }

    /// Plan a visit and return its id.
    pub fn plan(&self, date: &str, start: &str, extra: &[&str]) -> String {
        let mut args = vec![
            "visit",
            "plan",
            "Old town",
            "--place",
            "Museo Civico",
            "--categories",
            "historical",
            "--date",
            date,
            "--start",
            start,
        ];
        args.extend_from_slice(extra);
        let stdout = self.ok(&args);
        let first = stdout.lines().next().unwrap_or_default();
        first
            .strip_prefix("Visit planned: ")
            .expect("visit id line")
            .trim()
            .to_string()
    }
}

/// Check if string contains substring
pub fn assert_contains(haystack: &str, needle: &str) {
    assert!(
        haystack.contains(needle),
        "Expected '{}' to contain '{}'",
        haystack,
        needle
    );
}
