//! Agent families skillmux can configure.
//!
//! Every supported coding agent is one [`AgentKind`] variant. Per-family differences
//! (config location, server-map key, entry shape) are resolved by matching on the
//! variant, never by string lookups scattered through the callers.

pub mod paths;

use std::fmt;

use serde_json::{Map, Value, json};

use crate::config::ServerSchema;
use crate::context::HostContext;
use crate::mcp::spec::McpServerEntry;
use crate::types::Scope;

pub use paths::{
    detect_agents, resolve_config_path, resolve_config_path_lenient, sanitize_agent_name,
};

/// Built-in agent families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentKind {
    Claude,
    ClaudeDesktop,
    Cursor,
    Cline,
    Windsurf,
    Continue,
    Junie,
    Zed,
    Roo,
    Gemini,
    Kiro,
    GithubCopilot,
    OpenCode,
}

impl AgentKind {
    pub const ALL: [AgentKind; 13] = [
        AgentKind::Claude,
        AgentKind::ClaudeDesktop,
        AgentKind::Cursor,
        AgentKind::Cline,
        AgentKind::Windsurf,
        AgentKind::Continue,
        AgentKind::Junie,
        AgentKind::Zed,
        AgentKind::Roo,
        AgentKind::Gemini,
        AgentKind::Kiro,
        AgentKind::GithubCopilot,
        AgentKind::OpenCode,
    ];

    /// Canonical identifier used in CLI flags and reports.
    pub fn id(self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::ClaudeDesktop => "claude-desktop",
            Self::Cursor => "cursor",
            Self::Cline => "cline",
            Self::Windsurf => "windsurf",
            Self::Continue => "continue",
            Self::Junie => "junie",
            Self::Zed => "zed",
            Self::Roo => "roo",
            Self::Gemini => "gemini",
            Self::Kiro => "kiro",
            Self::GithubCopilot => "github-copilot",
            Self::OpenCode => "opencode",
        }
    }

    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Claude => &["claude-code"],
            Self::Roo => &["roo-code"],
            Self::Gemini => &["gemini-cli"],
            Self::GithubCopilot => &["copilot", "vscode"],
            _ => &[],
        }
    }

    /// Parse an identifier or alias (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.id() == value || kind.aliases().contains(&value.as_str()))
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Claude => "Claude Code",
            Self::ClaudeDesktop => "Claude Desktop",
            Self::Cursor => "Cursor",
            Self::Cline => "Cline",
            Self::Windsurf => "Windsurf",
            Self::Continue => "Continue",
            Self::Junie => "Junie",
            Self::Zed => "Zed",
            Self::Roo => "Roo Code",
            Self::Gemini => "Gemini CLI",
            Self::Kiro => "Kiro",
            Self::GithubCopilot => "GitHub Copilot",
            Self::OpenCode => "OpenCode",
        }
    }

    /// Key holding the server map in this family's config file.
    pub fn schema(self) -> ServerSchema {
        match self {
            Self::GithubCopilot => ServerSchema::Servers,
            Self::OpenCode => ServerSchema::Mcp,
            _ => ServerSchema::McpServers,
        }
    }

    /// Paths (relative to project root or home) whose presence means the agent is in use.
    pub fn detect_markers(self) -> &'static [&'static str] {
        match self {
            Self::Claude => &[".claude", ".mcp.json", ".claude.json"],
            Self::ClaudeDesktop => &[],
            Self::Cursor => &[".cursor"],
            Self::Cline => &[".cline", ".clinerules"],
            Self::Windsurf => &[".windsurf", ".codeium/windsurf"],
            Self::Continue => &[".continue"],
            Self::Junie => &[".junie"],
            Self::Zed => &[".zed"],
            Self::Roo => &[".roo"],
            Self::Gemini => &[".gemini"],
            Self::Kiro => &[".kiro"],
            Self::GithubCopilot => &[".vscode", ".github/copilot-instructions.md"],
            Self::OpenCode => &["opencode.json", ".opencode", ".config/opencode"],
        }
    }

    /// Whether the agent appears to be in use on this host.
    pub fn is_detected(self, ctx: &HostContext) -> bool {
        let marker_found = self.detect_markers().iter().any(|marker| {
            ctx.project_root().join(marker).exists() || ctx.home_dir().join(marker).exists()
        });
        marker_found
            || self
                .config_path(Scope::Global, ctx)
                .is_ok_and(|path| path.exists())
    }

    /// Render a new server entry in this family's on-disk shape.
    pub fn render_entry(self, entry: &McpServerEntry) -> Value {
        match self {
            Self::OpenCode => {
                let mut command = vec![entry.command.clone()];
                command.extend(entry.args.iter().cloned());
                let mut obj = Map::new();
                obj.insert("type".to_string(), json!("local"));
                obj.insert("command".to_string(), json!(command));
                if !entry.env.is_empty() {
                    obj.insert("environment".to_string(), json!(entry.env));
                }
                Value::Object(obj)
            }
            Self::GithubCopilot => {
                let mut obj = Map::new();
                obj.insert("type".to_string(), json!("stdio"));
                obj.extend(standard_entry(entry));
                Value::Object(obj)
            }
            _ => Value::Object(standard_entry(entry)),
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// `{command, args?, env?, cwd?}` as most agents expect it.
fn standard_entry(entry: &McpServerEntry) -> Map<String, Value> {
    let mut obj = Map::new();
    obj.insert("command".to_string(), json!(entry.command));
    if !entry.args.is_empty() {
        obj.insert("args".to_string(), json!(entry.args));
    }
    if !entry.env.is_empty() {
        obj.insert("env".to_string(), json!(entry.env));
    }
    if let Some(cwd) = &entry.cwd {
        obj.insert("cwd".to_string(), json!(cwd));
    }
    obj
}

/// Render an entry for any identifier; unknown agents get the standard shape.
pub fn render_entry_for(agent: &str, entry: &McpServerEntry) -> Value {
    match AgentKind::parse(agent) {
        Some(kind) => kind.render_entry(entry),
        None => Value::Object(standard_entry(entry)),
    }
}

/// Server-map key for any identifier; unknown agents use `mcpServers`.
pub fn schema_for(agent: Option<&str>) -> ServerSchema {
    agent
        .and_then(AgentKind::parse)
        .map(AgentKind::schema)
        .unwrap_or(ServerSchema::McpServers)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> McpServerEntry {
        let mut entry = McpServerEntry::new("npx", vec!["-y".to_string(), "pkg".to_string()]);
        entry.env.insert("TOKEN".to_string(), "abc".to_string());
        entry
    }

    #[test]
    fn test_parse_accepts_aliases() {
        assert_eq!(AgentKind::parse("claude-code"), Some(AgentKind::Claude));
        assert_eq!(AgentKind::parse("Claude"), Some(AgentKind::Claude));
        assert_eq!(AgentKind::parse("vscode"), Some(AgentKind::GithubCopilot));
        assert_eq!(AgentKind::parse("nonexistent"), None);
    }

    #[test]
    fn test_ids_are_unique() {
        let mut ids: Vec<_> = AgentKind::ALL.iter().map(|k| k.id()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), AgentKind::ALL.len());
    }

    #[test]
    fn test_schema_keys() {
        assert_eq!(AgentKind::GithubCopilot.schema(), ServerSchema::Servers);
        assert_eq!(AgentKind::OpenCode.schema(), ServerSchema::Mcp);
        assert_eq!(AgentKind::Cursor.schema(), ServerSchema::McpServers);
        assert_eq!(schema_for(Some("copilot")), ServerSchema::Servers);
        assert_eq!(schema_for(Some("made-up")), ServerSchema::McpServers);
        assert_eq!(schema_for(None), ServerSchema::McpServers);
    }

    #[test]
    fn test_render_standard_entry() {
        let value = AgentKind::Cursor.render_entry(&entry());
        assert_eq!(
            value,
            json!({ "command": "npx", "args": ["-y", "pkg"], "env": { "TOKEN": "abc" } })
        );
    }

    #[test]
    fn test_render_copilot_entry_has_type() {
        let value = AgentKind::GithubCopilot.render_entry(&entry());
        assert_eq!(value["type"], "stdio");
        assert_eq!(value["command"], "npx");
    }

    #[test]
    fn test_render_opencode_entry() {
        let value = AgentKind::OpenCode.render_entry(&entry());
        assert_eq!(
            value,
            json!({
                "type": "local",
                "command": ["npx", "-y", "pkg"],
                "environment": { "TOKEN": "abc" }
            })
        );
    }

    #[test]
    fn test_detection_by_project_marker() {
        let temp = tempfile::TempDir::new().unwrap();
        let home = temp.path().join("home");
        let project = temp.path().join("project");
        std::fs::create_dir_all(project.join(".cursor")).unwrap();
        std::fs::create_dir_all(&home).unwrap();
        let ctx = HostContext::new(home, project).with_platform(crate::context::Platform::Linux);

        assert!(AgentKind::Cursor.is_detected(&ctx));
        assert!(!AgentKind::Kiro.is_detected(&ctx));
    }
}
