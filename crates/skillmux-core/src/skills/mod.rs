//! Installed skill records.
//!
//! Skills arrive already installed on disk; this module only models the fields the
//! MCP dependency engine consumes and loads them from skill directories.

pub mod loader;

use serde::{Deserialize, Deserializer, Serialize};

use crate::mcp::spec::McpServerSpec;

pub use loader::{DirectorySkillSource, SkillSource, parse_skill};

/// A parsed skill document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skill {
    pub metadata: SkillMetadata,
    pub body: String,
}

impl Skill {
    pub fn new(metadata: SkillMetadata) -> Self {
        Self {
            metadata,
            body: String::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }
}

/// Frontmatter fields of a skill.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SkillMetadata {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "requiresMcpServers")]
    pub requires_mcp_servers: Vec<McpServerSpec>,
    /// `@server/tool` entries; `None` means the skill places no restriction.
    #[serde(
        default,
        alias = "allowedTools",
        deserialize_with = "deserialize_tool_list",
        skip_serializing_if = "Option::is_none"
    )]
    pub allowed_tools: Option<Vec<String>>,
}

impl SkillMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn requires(mut self, server: McpServerSpec) -> Self {
        self.requires_mcp_servers.push(server);
        self
    }

    pub fn allowed_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_tools = Some(tools.into_iter().map(Into::into).collect());
        self
    }
}

/// Accepts either a YAML list or a comma/space separated string.
fn deserialize_tool_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ToolList {
        List(Vec<String>),
        Text(String),
    }

    Ok(match Option::<ToolList>::deserialize(deserializer)? {
        None => None,
        Some(ToolList::List(list)) => Some(list),
        Some(ToolList::Text(text)) => Some(
            text.split([',', ' '])
                .map(str::trim)
                .filter(|tool| !tool.is_empty())
                .map(str::to_string)
                .collect(),
        ),
    })
}
