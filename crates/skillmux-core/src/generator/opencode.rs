//! OpenCode: `mcp` entries in `opencode.json` plus an optional markdown agent.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::client::AgentKind;
use crate::context::HostContext;
use crate::error::Result;
use crate::types::Scope;

use super::{
    BundleConfig, ConfigFormat, ConfigGenerator, GenerateOptions, GeneratedConfig, USAGE_PROMPT,
    json_content, markdown_with_frontmatter, merge_into_existing,
};

#[derive(Debug, Default, Clone, Copy)]
pub struct OpenCodeGenerator;

#[derive(Serialize)]
struct AgentFrontmatter<'a> {
    description: &'a str,
    mode: &'static str,
    tools: BTreeMap<String, bool>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    permission: BTreeMap<String, String>,
}

impl ConfigGenerator for OpenCodeGenerator {
    fn id(&self) -> &'static str {
        "opencode"
    }

    fn display_name(&self) -> &'static str {
        "OpenCode"
    }

    fn supported_agents(&self) -> &'static [&'static str] {
        &["opencode"]
    }

    fn generate(
        &self,
        bundle: &BundleConfig,
        options: &GenerateOptions,
        ctx: &HostContext,
    ) -> Result<Vec<GeneratedConfig>> {
        let family = AgentKind::OpenCode;
        let config_path = family.config_path(options.scope, ctx)?;
        let config = merge_into_existing(&config_path, family, bundle)?;

        let mut outputs = vec![GeneratedConfig {
            file_path: config_path,
            content: json_content(&config.to_document(family.schema()))?,
            format: ConfigFormat::Json,
        }];

        if options.include_agent_config {
            let frontmatter = AgentFrontmatter {
                description: &bundle.description,
                mode: "subagent",
                tools: tool_flags(bundle),
                permission: bundle.permissions.clone(),
            };
            let body = format!("{USAGE_PROMPT}\n");
            outputs.push(GeneratedConfig {
                file_path: agents_dir(options.scope, ctx).join(format!("{}.md", bundle.name)),
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
        AgentKind::OpenCode.config_path(options.scope, ctx).map(Some)
    }
}

/// Capability flags plus one `server_tool` (or `server_*`) flag per allowed MCP tool.
fn tool_flags(bundle: &BundleConfig) -> BTreeMap<String, bool> {
    let mut flags = bundle.tools.clone();
    for (name, server) in &bundle.mcp_servers {
        match server.named_tools() {
            None => {
                flags.insert(format!("{name}_*"), true);
            }
            Some(tools) => {
                for tool in tools {
                    flags.insert(format!("{name}_{tool}"), true);
                }
            }
        }
    }
    flags
}

fn agents_dir(scope: Scope, ctx: &HostContext) -> PathBuf {
    match scope {
        Scope::Local => ctx.project_root().join(".opencode").join("agents"),
        Scope::Global => ctx.home_dir().join(".config").join("opencode").join("agents"),
    }
}
