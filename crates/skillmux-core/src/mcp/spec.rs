//! MCP server templates declared by skills, and the rendered entries written to agents.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Literal tool entry meaning "every tool the server exposes".
pub const WILDCARD_TOOL: &str = "*";

/// Server registration template as declared in a skill's frontmatter.
///
/// `args` and `env` values may contain `{{NAME}}` placeholders described by `parameters`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpServerSpec {
    pub name: String,
    pub command: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    /// Explicit tool allow-list; `None` or a `*` entry means all tools.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, ParameterSpec>,
}

impl McpServerSpec {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            cwd: None,
            tools: None,
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn with_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tools = Some(tools.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_parameter(mut self, name: impl Into<String>, spec: ParameterSpec) -> Self {
        self.parameters.insert(name.into(), spec);
        self
    }

    /// Whether the declared tool list grants every tool.
    pub fn allows_all_tools(&self) -> bool {
        is_wildcard(self.tools.as_deref())
    }
}

/// `None`, or any list containing the wildcard entry, grants every tool.
pub fn is_wildcard(tools: Option<&[String]>) -> bool {
    match tools {
        None => true,
        Some(tools) => tools.iter().any(|tool| tool == WILDCARD_TOOL),
    }
}

/// Placeholder description used to resolve or prompt for a value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParameterSpec {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required: bool,
    /// Literal default, or `{{ENV:VAR}}` to read `VAR` at resolution time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default)]
    pub sensitive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

impl ParameterSpec {
    pub fn required(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            required: true,
            ..Default::default()
        }
    }

    pub fn optional(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }
}

/// Rendered server registration as written into an agent config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpServerEntry {
    pub command: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
}

impl McpServerEntry {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            env: BTreeMap::new(),
            cwd: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_deserializes_from_frontmatter_yaml() {
        let yaml = r#"
name: github
command: npx
args: ["-y", "@modelcontextprotocol/server-github"]
env:
  GITHUB_TOKEN: "{{GITHUB_TOKEN}}"
tools: [create_issue]
parameters:
  GITHUB_TOKEN:
    description: GitHub personal access token
    required: true
    sensitive: true
    default: "{{ENV:GITHUB_TOKEN}}"
"#;
        let spec: McpServerSpec = serde_yaml::from_str(yaml).expect("valid spec");
        assert_eq!(spec.name, "github");
        assert_eq!(spec.args.len(), 2);
        assert_eq!(spec.tools, Some(vec!["create_issue".to_string()]));
        let param = &spec.parameters["GITHUB_TOKEN"];
        assert!(param.required);
        assert!(param.sensitive);
        assert_eq!(param.default.as_deref(), Some("{{ENV:GITHUB_TOKEN}}"));
    }

    #[test]
    fn test_wildcard_detection() {
        assert!(McpServerSpec::new("fs", "npx").allows_all_tools());
        assert!(
            McpServerSpec::new("fs", "npx")
                .with_tools(["*"])
                .allows_all_tools()
        );
        assert!(
            !McpServerSpec::new("fs", "npx")
                .with_tools(["read_file"])
                .allows_all_tools()
        );
    }

    #[test]
    fn test_entry_omits_empty_fields() {
        let entry = McpServerEntry::new("uvx", Vec::new());
        let json = serde_json::to_value(&entry).expect("serializes");
        assert_eq!(json, serde_json::json!({ "command": "uvx" }));
    }
}
