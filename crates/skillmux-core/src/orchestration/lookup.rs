//! Dependency lookup across both places a server can be configured.

use tracing::debug;

use crate::config::io::read_with_schema;
use crate::config::{AgentConfigStore, ServerSchema};
use crate::error::Result;
use crate::generator::GeneratorRegistry;
use crate::mcp::ServerLookup;

/// Finds a server in the agent's plain config or, for generator-backed families, in
/// the generated agent file that embeds its own server map.
#[derive(Debug, Clone, Copy)]
pub struct InstalledServers<'a> {
    store: &'a AgentConfigStore,
    registry: &'a GeneratorRegistry,
}

impl<'a> InstalledServers<'a> {
    pub fn new(store: &'a AgentConfigStore, registry: &'a GeneratorRegistry) -> Self {
        Self { store, registry }
    }
}

impl ServerLookup for InstalledServers<'_> {
    fn has_server(&self, agent: &str, server: &str) -> Result<bool> {
        if self.store.has_server(agent, server)? {
            return Ok(true);
        }
        let Some(path) = self
            .registry
            .get_generator(agent)
            .and_then(|generator| {
                generator.embedded_servers_path(self.store.scope(), self.store.context())
            })
        else {
            return Ok(false);
        };
        debug!(agent, server, path = %path.display(), "checking generated agent file");
        Ok(read_with_schema(&path, ServerSchema::McpServers)?.has_server(server))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::context::HostContext;
    use crate::types::Scope;

    #[test]
    fn test_kiro_agent_file_counts_as_configured() {
        let temp = TempDir::new().unwrap();
        let ctx = HostContext::new(temp.path().join("home"), temp.path().join("project"));
        let agent_file = ctx.project_root().join(".kiro/agents/skills-mcp.json");
        fs::create_dir_all(agent_file.parent().unwrap()).unwrap();
        fs::write(
            &agent_file,
            r#"{"name":"skills-mcp","mcpServers":{"fs":{"command":"fs-mcp"}}}"#,
        )
        .unwrap();
        let store = AgentConfigStore::new(ctx, Scope::Local);
        let registry = GeneratorRegistry::with_default_generators();
        let lookup = InstalledServers::new(&store, &registry);

        assert!(lookup.has_server("kiro", "fs").unwrap());
        assert!(!lookup.has_server("kiro", "github").unwrap());
        assert!(!store.has_server("kiro", "fs").unwrap());
    }

    #[test]
    fn test_plain_agents_only_consult_their_config() {
        let temp = TempDir::new().unwrap();
        let ctx = HostContext::new(temp.path().join("home"), temp.path().join("project"));
        let stray = ctx.project_root().join(".kiro/agents/skills-mcp.json");
        fs::create_dir_all(stray.parent().unwrap()).unwrap();
        fs::write(&stray, r#"{"mcpServers":{"fs":{"command":"fs-mcp"}}}"#).unwrap();
        let store = AgentConfigStore::new(ctx, Scope::Local);
        let registry = GeneratorRegistry::with_default_generators();

        let lookup = InstalledServers::new(&store, &registry);
        assert!(!lookup.has_server("cursor", "fs").unwrap());
    }
}
