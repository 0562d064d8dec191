#![allow(dead_code)]

use serde_json::{json, Value};
use std::path::PathBuf;
use tempfile::TempDir;

pub const NAMES: [&str; 5] = ["Ada", "Grace", "Linus", "Margaret", "Ken"];

/// `n` people with ids 1..=n, a role, a numeric-string score and a creation date
/// one day apart starting 2024-01-01.
pub fn people(n: usize) -> Vec<Value> {
    (1..=n)
        .map(|i| {
            json!({
                "id": i,
                "name": format!("{} {}", NAMES[(i - 1) % NAMES.len()], i),
                "role": if i % 2 == 0 { "admin" } else { "member" },
                "score": format!("{}", (i * 7) % 40),
                "created": format!("2024-01-{:02}", ((i - 1) % 28) + 1),
            })
        })
        .collect()
}

/// Write `value` as JSON into a fresh temp dir. Keep the TempDir alive.
pub fn write_json(name: &str, value: &Value) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join(name);
    std::fs::write(&path, serde_json::to_string(value).unwrap()).unwrap();
    (dir, path)
}
