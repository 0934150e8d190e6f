//! Agent configuration files and skillmux's own settings.
//!
//! Agent config files are JSON documents holding a server map under a family-specific key
//! (`mcpServers`, `servers` or `mcp`). They are loaded into [`AgentConfig`], which keeps
//! every server entry and every unrelated top-level field exactly as read, so a
//! read-modify-write cycle only changes what the caller changed.

pub mod io;
pub mod settings;
pub mod store;

use std::path::Path;

use serde_json::{Map, Value};

use crate::error::{Error, Result};

pub use io::{ensure_not_directory, read_agent_config, write_agent_config};
pub use settings::{BridgeServer, Defaults, Settings, SkillsSettings};
pub use store::{AgentConfigStore, configure_agent_mcp};

pub const CANONICAL_SERVERS_KEY: &str = "mcpServers";

/// Top-level key an agent family stores its server map under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerSchema {
    McpServers,
    Servers,
    Mcp,
}

impl ServerSchema {
    pub fn key(self) -> &'static str {
        match self {
            Self::McpServers => CANONICAL_SERVERS_KEY,
            Self::Servers => "servers",
            Self::Mcp => "mcp",
        }
    }
}

/// Canonical in-memory agent config.
///
/// `mcp_servers` holds entries as raw JSON so unchanged servers are written back
/// byte-for-byte; `extra` holds every other top-level field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentConfig {
    pub mcp_servers: Map<String, Value>,
    pub extra: Map<String, Value>,
    /// Position of the server key among the document's top-level keys.
    servers_slot: Option<usize>,
}

impl AgentConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_server(&self, name: &str) -> bool {
        self.mcp_servers.contains_key(name)
    }

    pub fn server(&self, name: &str) -> Option<&Value> {
        self.mcp_servers.get(name)
    }

    /// Insert or replace one server entry; returns the previous value.
    pub fn upsert_server(&mut self, name: impl Into<String>, entry: Value) -> Option<Value> {
        self.mcp_servers.insert(name.into(), entry)
    }

    /// Insert only when `name` is not yet present. Returns whether it was added.
    pub fn add_server_if_absent(&mut self, name: &str, entry: Value) -> bool {
        if self.has_server(name) {
            return false;
        }
        self.mcp_servers.insert(name.to_string(), entry);
        true
    }

    /// Normalize a parsed document, lifting the schema's server key into `mcp_servers`.
    ///
    /// For non-canonical schemas a stray `mcpServers` map is folded in as well (the
    /// schema key wins on conflicts) so it is not written back alongside the real key.
    pub fn from_document(
        document: Map<String, Value>,
        schema: ServerSchema,
        path: &Path,
    ) -> Result<Self> {
        let key = schema.key();
        let mut config = Self::new();
        let mut stray = None;

        for (index, (name, value)) in document.into_iter().enumerate() {
            if name == key {
                config.mcp_servers = server_map(value, key, path)?;
                config.servers_slot = Some(index);
            } else if schema != ServerSchema::McpServers && name == CANONICAL_SERVERS_KEY {
                stray = Some(server_map(value, CANONICAL_SERVERS_KEY, path)?);
                config.servers_slot.get_or_insert(index);
            } else {
                config.extra.insert(name, value);
            }
        }

        if let Some(stray) = stray {
            for (name, entry) in stray {
                config.mcp_servers.entry(name).or_insert(entry);
            }
        }

        Ok(config)
    }

    /// Inverse of [`AgentConfig::from_document`]: the server map goes back under the
    /// schema's key, at its original position when there was one.
    pub fn to_document(&self, schema: ServerSchema) -> Map<String, Value> {
        let servers = Value::Object(self.mcp_servers.clone());
        let slot = self.servers_slot.unwrap_or(self.extra.len());
        let mut document = Map::new();
        let mut servers = Some(servers);

        for (index, (name, value)) in self.extra.iter().enumerate() {
            if index == slot {
                if let Some(servers) = servers.take() {
                    document.insert(schema.key().to_string(), servers);
                }
            }
            document.insert(name.clone(), value.clone());
        }
        if let Some(servers) = servers {
            document.insert(schema.key().to_string(), servers);
        }
        document
    }
}

fn server_map(value: Value, key: &str, path: &Path) -> Result<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        _ => Err(Error::InvalidServersField {
            key: key.to_string(),
            path: path.to_path_buf(),
        }),
    }
}
