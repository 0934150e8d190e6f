//! Agent config access bound to a host context and scope.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::client::{AgentKind, resolve_config_path, resolve_config_path_lenient};
use crate::context::HostContext;
use crate::error::{Error, Result};
use crate::mcp::ServerLookup;
use crate::types::Scope;

use super::io::{read_agent_config, write_agent_config};
use super::settings::BridgeServer;
use super::AgentConfig;

/// Reads agent configs for one scope, resolving unknown agents leniently.
#[derive(Debug, Clone)]
pub struct AgentConfigStore {
    ctx: HostContext,
    scope: Scope,
}

impl AgentConfigStore {
    pub fn new(ctx: HostContext, scope: Scope) -> Self {
        Self { ctx, scope }
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn context(&self) -> &HostContext {
        &self.ctx
    }

    pub fn config_path(&self, agent: &str) -> Result<PathBuf> {
        resolve_config_path_lenient(agent, self.scope, &self.ctx)
    }

    pub fn load(&self, agent: &str) -> Result<AgentConfig> {
        read_agent_config(&self.config_path(agent)?, Some(agent))
    }

    pub fn save(&self, agent: &str, config: &AgentConfig) -> Result<PathBuf> {
        let path = self.config_path(agent)?;
        write_agent_config(&path, config, Some(agent))?;
        Ok(path)
    }
}

impl ServerLookup for AgentConfigStore {
    fn has_server(&self, agent: &str, server: &str) -> Result<bool> {
        Ok(self.load(agent)?.has_server(server))
    }
}

/// Register the bridge server for `agent`, replacing only that one server key.
///
/// Unknown agent identifiers fail with [`Error::UnknownAgent`].
pub fn configure_agent_mcp(
    agent: &str,
    scope: Scope,
    ctx: &HostContext,
    bridge: &BridgeServer,
) -> Result<PathBuf> {
    let kind = AgentKind::parse(agent).ok_or_else(|| Error::UnknownAgent(agent.to_string()))?;
    let path = resolve_config_path(agent, scope, ctx)?;
    debug!(agent = %kind, path = %path.display(), "configuring bridge server");

    let mut config = read_agent_config(&path, Some(agent))?;
    upsert_bridge(&mut config, kind, bridge);
    write_agent_config(&path, &config, Some(agent))?;

    info!("Configured {} for {}", bridge.name, kind.display_name());
    Ok(path)
}

/// Replace the bridge entry in `kind`'s shape, leaving every other server as read.
pub(crate) fn upsert_bridge(config: &mut AgentConfig, kind: AgentKind, bridge: &BridgeServer) {
    config.upsert_server(bridge.name.clone(), kind.render_entry(&bridge.to_entry()));
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::{Value, json};
    use tempfile::TempDir;

    use super::*;
    use crate::context::Platform;
    use crate::env::MapEnv;

    fn ctx(temp: &TempDir) -> HostContext {
        HostContext::new(temp.path().join("home"), temp.path().join("project"))
            .with_platform(Platform::Linux)
            .with_env(MapEnv::new())
    }

    #[test]
    fn test_configure_agent_mcp_preserves_other_content() {
        let temp = TempDir::new().unwrap();
        let ctx = ctx(&temp);
        let path = ctx.project_root().join(".cursor").join("mcp.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            r#"{"theme":"dark","mcpServers":{"other":{"command":"x","custom":[1,2]}}}"#,
        )
        .unwrap();

        configure_agent_mcp("cursor", Scope::Local, &ctx, &BridgeServer::default()).unwrap();

        let written: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["theme"], "dark");
        assert_eq!(written["mcpServers"]["other"], json!({"command":"x","custom":[1,2]}));
        assert_eq!(written["mcpServers"]["skillmux"]["command"], "npx");
    }

    #[test]
    fn test_configure_agent_mcp_replaces_bridge_entry() {
        let temp = TempDir::new().unwrap();
        let ctx = ctx(&temp);
        let path = ctx.project_root().join(".mcp.json");
        fs::create_dir_all(ctx.project_root()).unwrap();
        fs::write(&path, r#"{"mcpServers":{"skillmux":{"command":"old"}}}"#).unwrap();

        configure_agent_mcp("claude-code", Scope::Local, &ctx, &BridgeServer::default()).unwrap();

        let written: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["mcpServers"]["skillmux"]["command"], "npx");
    }

    #[test]
    fn test_configure_agent_mcp_rejects_unknown_agent() {
        let temp = TempDir::new().unwrap();
        let bridge = BridgeServer::default();
        let err = configure_agent_mcp("mystery", Scope::Local, &ctx(&temp), &bridge).unwrap_err();
        assert!(matches!(err, Error::UnknownAgent(_)));
    }

    #[test]
    fn test_store_lookup_is_presence_only() {
        let temp = TempDir::new().unwrap();
        let ctx = ctx(&temp);
        let store = AgentConfigStore::new(ctx.clone(), Scope::Local);
        let mut config = AgentConfig::new();
        config.upsert_server("fs", json!({ "command": "anything" }));
        store.save("zed", &config).unwrap();

        assert!(store.has_server("zed", "fs").unwrap());
        assert!(!store.has_server("zed", "gh").unwrap());
        assert!(!store.has_server("cline", "fs").unwrap());
    }

    #[test]
    fn test_configure_agent_mcp_refuses_directory() {
        let temp = TempDir::new().unwrap();
        let ctx = ctx(&temp);
        let path = ctx.project_root().join(".cursor").join("mcp.json");
        fs::create_dir_all(&path).unwrap();

        let bridge = BridgeServer::default();
        let err = configure_agent_mcp("cursor", Scope::Local, &ctx, &bridge).unwrap_err();
        assert!(matches!(err, Error::PathIsDirectory(p) if p == path));
        assert!(path.is_dir());
    }
}
