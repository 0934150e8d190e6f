//! Reading and writing agent config files on disk.

mod support;

use serde_json::{Value, json};
use tempfile::TempDir;

use skillmux_core::config::{AgentConfig, read_agent_config, write_agent_config};
use skillmux_core::error::Error;

use support::write_file;

#[test]
fn missing_file_reads_as_empty_config() {
    let temp = TempDir::new().unwrap();

    let config = read_agent_config(&temp.path().join("nope").join("mcp.json"), Some("cursor"))
        .unwrap();

    assert_eq!(config, AgentConfig::new());
}

#[test]
fn servers_schema_is_normalized_and_restored() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join(".vscode").join("mcp.json");
    write_file(
        &path,
        r#"{"inputs":[{"id":"token"}],"servers":{"gh":{"type":"stdio","command":"gh-mcp"}}}"#,
    );

    let mut config = read_agent_config(&path, Some("github-copilot")).unwrap();
    assert!(config.has_server("gh"));
    assert!(config.extra.contains_key("inputs"));

    config.add_server_if_absent("fs", json!({ "type": "stdio", "command": "fs-mcp" }));
    write_agent_config(&path, &config, Some("github-copilot")).unwrap();

    let written: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let keys: Vec<&str> = written
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(keys, vec!["inputs", "servers"]);
    assert_eq!(written["servers"]["gh"]["command"], "gh-mcp");
    assert_eq!(written["servers"]["fs"]["command"], "fs-mcp");
    assert!(written.get("mcpServers").is_none());
}

#[test]
fn unrelated_fields_and_servers_survive_a_write() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join(".mcp.json");
    write_file(
        &path,
        r#"{"$schema":"x","mcpServers":{"mine":{"command":"node","args":["a.js"],"custom":1}},"theme":"dark"}"#,
    );

    let mut config = read_agent_config(&path, Some("claude")).unwrap();
    assert!(!config.add_server_if_absent("mine", json!({ "command": "other" })));
    assert!(config.add_server_if_absent("gh", json!({ "command": "gh-mcp" })));
    write_agent_config(&path, &config, Some("claude")).unwrap();

    let written: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(
        written["mcpServers"]["mine"],
        json!({ "command": "node", "args": ["a.js"], "custom": 1 })
    );
    assert_eq!(written["$schema"], "x");
    assert_eq!(written["theme"], "dark");
    let keys: Vec<&str> = written
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(keys, vec!["$schema", "mcpServers", "theme"]);
}

#[test]
fn malformed_file_is_reported_and_left_alone() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join(".cursor").join("mcp.json");
    write_file(&path, "{ \"mcpServers\": ");

    let err = read_agent_config(&path, Some("cursor")).unwrap_err();

    assert!(matches!(err, Error::ParseJson { .. }));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ \"mcpServers\": ");
}

#[test]
fn non_object_servers_field_is_rejected() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("mcp.json");
    write_file(&path, r#"{"mcpServers":["not","a","map"]}"#);

    let err = read_agent_config(&path, None).unwrap_err();

    assert!(matches!(err, Error::InvalidServersField { .. }));
}

#[test]
fn writer_refuses_directory_path() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join(".mcp.json");
    std::fs::create_dir_all(&path).unwrap();

    let err = write_agent_config(&path, &AgentConfig::new(), Some("claude")).unwrap_err();

    assert!(matches!(err, Error::PathIsDirectory(_)));
    assert!(path.is_dir());
}

#[test]
fn writer_creates_missing_parent_directories() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("a").join("b").join("opencode.json");
    let mut config = AgentConfig::new();
    config.upsert_server("fs", json!({ "type": "local", "command": ["fs-mcp"] }));

    write_agent_config(&path, &config, Some("opencode")).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.ends_with("}\n"));
    let written: Value = serde_json::from_str(&content).unwrap();
    assert_eq!(written["mcp"]["fs"]["type"], "local");
}
