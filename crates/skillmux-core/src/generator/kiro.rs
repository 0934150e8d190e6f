//! Kiro: a JSON custom agent under `.kiro/agents/`.

use std::path::PathBuf;

use serde_json::{Map, Value, json};

use crate::client::AgentKind;
use crate::context::HostContext;
use crate::error::Result;
use crate::types::Scope;

use super::{
    AGENT_NAME, BundleConfig, ConfigFormat, ConfigGenerator, GenerateOptions, GeneratedConfig,
    USAGE_PROMPT, json_content, merge_into_existing,
};

#[derive(Debug, Default, Clone, Copy)]
pub struct KiroGenerator;

impl ConfigGenerator for KiroGenerator {
    fn id(&self) -> &'static str {
        "kiro"
    }

    fn display_name(&self) -> &'static str {
        "Kiro"
    }

    fn supported_agents(&self) -> &'static [&'static str] {
        &["kiro"]
    }

    /// The agent file embeds its servers, so it replaces the settings file output.
    /// Without it, servers are merged into `.kiro/settings/mcp.json`.
    fn generate(
        &self,
        bundle: &BundleConfig,
        options: &GenerateOptions,
        ctx: &HostContext,
    ) -> Result<Vec<GeneratedConfig>> {
        let family = AgentKind::Kiro;

        if !options.include_agent_config {
            let path = family.config_path(options.scope, ctx)?;
            let config = merge_into_existing(&path, family, bundle)?;
            return Ok(vec![GeneratedConfig {
                file_path: path,
                content: json_content(&config.to_document(family.schema()))?,
                format: ConfigFormat::Json,
            }]);
        }

        // Enabled capabilities first, then one `@server` reference per bundled server.
        let tools: Vec<String> = bundle
            .tools
            .iter()
            .filter(|(_, enabled)| **enabled)
            .map(|(name, _)| name.clone())
            .chain(bundle.mcp_servers.keys().map(|name| format!("@{name}")))
            .collect();

        let mut agent = Map::new();
        agent.insert("name".to_string(), json!(bundle.name));
        agent.insert("description".to_string(), json!(bundle.description));
        agent.insert("prompt".to_string(), json!(USAGE_PROMPT));
        agent.insert(
            "mcpServers".to_string(),
            Value::Object(bundle.rendered_servers(family)),
        );
        agent.insert("tools".to_string(), json!(tools));
        agent.insert("allowedTools".to_string(), json!(bundle.tool_refs("@")));

        Ok(vec![GeneratedConfig {
            file_path: agent_file(options.scope, ctx, &bundle.name),
            content: json_content(&agent)?,
            format: ConfigFormat::Json,
        }])
    }

    /// Only the settings file is shared; the agent file is owned outright.
    fn merged_config_path(
        &self,
        options: &GenerateOptions,
        ctx: &HostContext,
    ) -> Result<Option<PathBuf>> {
        if options.include_agent_config {
            return Ok(None);
        }
        AgentKind::Kiro.config_path(options.scope, ctx).map(Some)
    }

    fn embedded_servers_path(&self, scope: Scope, ctx: &HostContext) -> Option<PathBuf> {
        Some(agent_file(scope, ctx, AGENT_NAME))
    }
}

fn agent_file(scope: Scope, ctx: &HostContext, name: &str) -> PathBuf {
    ctx.base_dir(scope)
        .join(".kiro")
        .join("agents")
        .join(format!("{name}.json"))
}
