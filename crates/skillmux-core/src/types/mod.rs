//! Shared core types used across path resolution, config writing and orchestration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Where agent configuration is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Project directory.
    #[default]
    Local,
    /// User home directory.
    Global,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Global => "global",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "local" | "project" => Ok(Self::Local),
            "global" | "user" => Ok(Self::Global),
            other => Err(format!("unsupported scope: {other} (local|global)")),
        }
    }
}

/// Whether a generator-backed agent receives the bundled agent file or plain server entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfigMode {
    AgentConfig,
    McpJson,
}

impl ConfigMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AgentConfig => "agent-config",
            Self::McpJson => "mcp-json",
        }
    }
}

impl fmt::Display for ConfigMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "agent-config" | "agent" => Ok(Self::AgentConfig),
            "mcp-json" | "mcp" => Ok(Self::McpJson),
            other => Err(format!(
                "unsupported config mode: {other} (agent-config|mcp-json)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_parse() {
        assert_eq!("local".parse::<Scope>(), Ok(Scope::Local));
        assert_eq!("GLOBAL".parse::<Scope>(), Ok(Scope::Global));
        assert!("shared".parse::<Scope>().is_err());
    }

    #[test]
    fn test_config_mode_serialization() {
        let json = serde_json::to_string(&ConfigMode::AgentConfig).expect("serializes");
        assert_eq!(json, "\"agent-config\"");
        assert_eq!("mcp-json".parse::<ConfigMode>(), Ok(ConfigMode::McpJson));
    }
}
