//! GitHub Copilot: `servers` file plus an optional `.agent.md` custom agent.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::client::AgentKind;
use crate::context::HostContext;
use crate::error::Result;
use crate::mcp::WILDCARD_TOOL;

use super::{
    BundleConfig, BundleServer, BundleTransport, ConfigFormat, ConfigGenerator, GenerateOptions,
    GeneratedConfig, USAGE_PROMPT, json_content, markdown_with_frontmatter, merge_into_existing,
};

#[derive(Debug, Default, Clone, Copy)]
pub struct CopilotGenerator;

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct AgentFrontmatter<'a> {
    name: &'a str,
    description: &'a str,
    tools: Vec<String>,
    mcp_servers: BTreeMap<&'a str, Value>,
    disable_model_invocation: bool,
    user_invocable: bool,
}

impl ConfigGenerator for CopilotGenerator {
    fn id(&self) -> &'static str {
        "copilot"
    }

    fn display_name(&self) -> &'static str {
        "GitHub Copilot"
    }

    fn supported_agents(&self) -> &'static [&'static str] {
        &["github-copilot"]
    }

    /// The servers file is always produced; the agent file only when requested.
    fn generate(
        &self,
        bundle: &BundleConfig,
        options: &GenerateOptions,
        ctx: &HostContext,
    ) -> Result<Vec<GeneratedConfig>> {
        let family = AgentKind::GithubCopilot;
        let servers_path = family.config_path(options.scope, ctx)?;
        let config = merge_into_existing(&servers_path, family, bundle)?;

        let mut outputs = vec![GeneratedConfig {
            file_path: servers_path,
            content: json_content(&config.to_document(family.schema()))?,
            format: ConfigFormat::Json,
        }];

        if options.include_agent_config {
            let frontmatter = AgentFrontmatter {
                name: &bundle.name,
                description: &bundle.description,
                tools: bundle.tool_refs(""),
                mcp_servers: bundle
                    .mcp_servers
                    .iter()
                    .map(|(name, server)| (name.as_str(), agent_server(server)))
                    .collect(),
                disable_model_invocation: false,
                user_invocable: true,
            };
            let body = format!("# {}\n\n{}\n", bundle.name, USAGE_PROMPT);
            outputs.push(GeneratedConfig {
                file_path: ctx
                    .base_dir(options.scope)
                    .join(".github")
                    .join("agents")
                    .join(format!("{}.agent.md", bundle.name)),
                content: markdown_with_frontmatter(&frontmatter, &body)?,
                format: ConfigFormat::Markdown,
            });
        }

        Ok(outputs)
    }

    fn merged_config_path(
        &self,
        options: &GenerateOptions,
        ctx: &HostContext,
    ) -> Result<Option<PathBuf>> {
        AgentKind::GithubCopilot.config_path(options.scope, ctx).map(Some)
    }
}

/// Server as declared inside a custom agent's `mcp-servers` block.
fn agent_server(server: &BundleServer) -> Value {
    let mut obj = Map::new();
    match &server.transport {
        BundleTransport::Stdio { command, args } => {
            obj.insert("type".to_string(), json!("local"));
            obj.insert("command".to_string(), json!(command));
            obj.insert("args".to_string(), json!(args));
        }
        BundleTransport::Http { url, headers } => {
            obj.insert("type".to_string(), json!("http"));
            obj.insert("url".to_string(), json!(url));
            if !headers.is_empty() {
                obj.insert("headers".to_string(), json!(headers));
            }
        }
    }
    if !server.env.is_empty() {
        obj.insert("env".to_string(), json!(server.env));
    }
    let tools = match server.named_tools() {
        Some(tools) => tools.to_vec(),
        None => vec![WILDCARD_TOOL.to_string()],
    };
    obj.insert("tools".to_string(), json!(tools));
    Value::Object(obj)
}
