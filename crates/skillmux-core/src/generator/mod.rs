//! Composite agent-config generators.
//!
//! Some agent families accept a richer "agent config" file that bundles MCP server
//! registrations with tool allow-lists and usage instructions. Each family has one
//! [`ConfigGenerator`]; the [`GeneratorRegistry`] routes an agent identifier to its
//! generator, and an agent without one falls back to the plain server config path.

pub mod copilot;
pub mod kiro;
pub mod opencode;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::client::AgentKind;
use crate::config::io::{read_with_schema, write_text};
use crate::config::{AgentConfig, ensure_not_directory};
use crate::context::HostContext;
use crate::error::Result;
use crate::mcp::spec::{McpServerEntry, WILDCARD_TOOL, is_wildcard};
use crate::types::Scope;

pub use copilot::CopilotGenerator;
pub use kiro::KiroGenerator;
pub use opencode::OpenCodeGenerator;

/// File stem shared by every generated agent file.
pub const AGENT_NAME: &str = "skills-mcp";

pub const DEFAULT_DESCRIPTION: &str =
    "Uses installed skills and the MCP servers they depend on to complete tasks.";

/// Usage instructions embedded in every generated agent file.
pub const USAGE_PROMPT: &str = "You have access to installed skills through the skillmux MCP \
server. Before starting a task, list the available skills and load the ones relevant to the \
request with the use_skill tool. Follow each loaded skill's instructions exactly, and call the \
MCP servers the skill depends on only through the tools it allows.";

/// Serialization format of a generated file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigFormat {
    Json,
    Markdown,
}

/// One file produced by a generator, already serialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedConfig {
    pub file_path: PathBuf,
    pub content: String,
    pub format: ConfigFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerateOptions {
    pub scope: Scope,
    /// Emit the composite agent file in addition to the plain server config.
    pub include_agent_config: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            scope: Scope::Local,
            include_agent_config: true,
        }
    }
}

/// How a bundled server is launched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleTransport {
    Stdio { command: String, args: Vec<String> },
    Http {
        url: String,
        headers: BTreeMap<String, String>,
    },
}

/// One server inside a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleServer {
    pub transport: BundleTransport,
    pub env: BTreeMap<String, String>,
    /// `None` or a `*` entry grants every tool.
    pub tools: Option<Vec<String>>,
}

impl BundleServer {
    pub fn stdio(entry: &McpServerEntry) -> Self {
        Self {
            transport: BundleTransport::Stdio {
                command: entry.command.clone(),
                args: entry.args.clone(),
            },
            env: entry.env.clone(),
            tools: None,
        }
    }

    pub fn http(url: impl Into<String>) -> Self {
        Self {
            transport: BundleTransport::Http {
                url: url.into(),
                headers: BTreeMap::new(),
            },
            env: BTreeMap::new(),
            tools: None,
        }
    }

    pub fn with_tools(mut self, tools: Option<Vec<String>>) -> Self {
        self.tools = tools;
        self
    }

    pub fn allows_all_tools(&self) -> bool {
        is_wildcard(self.tools.as_deref())
    }

    /// Named tools, or `None` when the server is unrestricted.
    pub fn named_tools(&self) -> Option<&[String]> {
        if self.allows_all_tools() {
            None
        } else {
            self.tools.as_deref()
        }
    }

    /// Entry in `family`'s server-map shape.
    pub fn render_for(&self, family: AgentKind) -> Value {
        match &self.transport {
            BundleTransport::Stdio { command, args } => {
                let mut entry = McpServerEntry::new(command.clone(), args.clone());
                entry.env = self.env.clone();
                family.render_entry(&entry)
            }
            BundleTransport::Http { url, headers } => {
                let mut obj = Map::new();
                match family {
                    AgentKind::OpenCode => {
                        obj.insert("type".to_string(), json!("remote"));
                    }
                    AgentKind::GithubCopilot => {
                        obj.insert("type".to_string(), json!("http"));
                    }
                    _ => {}
                }
                obj.insert("url".to_string(), json!(url));
                if !headers.is_empty() {
                    obj.insert("headers".to_string(), json!(headers));
                }
                Value::Object(obj)
            }
        }
    }
}

/// Input shared by every generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleConfig {
    pub name: String,
    pub description: String,
    pub mcp_servers: BTreeMap<String, BundleServer>,
    /// Servers this tool owns; their entries replace whatever a shared server file holds.
    pub managed_servers: BTreeSet<String>,
    /// Capability flags such as `use_skill = true`.
    pub tools: BTreeMap<String, bool>,
    /// Permission levels such as `edit = "ask"`.
    pub permissions: BTreeMap<String, String>,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            name: AGENT_NAME.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            mcp_servers: BTreeMap::new(),
            managed_servers: BTreeSet::new(),
            tools: BTreeMap::from([("use_skill".to_string(), true)]),
            permissions: BTreeMap::new(),
        }
    }
}

impl BundleConfig {
    pub fn with_server(mut self, name: impl Into<String>, server: BundleServer) -> Self {
        self.mcp_servers.insert(name.into(), server);
        self
    }

    /// Add a server whose entry is always rewritten, even in files the user shares.
    pub fn with_managed_server(mut self, name: impl Into<String>, server: BundleServer) -> Self {
        let name = name.into();
        self.managed_servers.insert(name.clone());
        self.mcp_servers.insert(name, server);
        self
    }

    pub fn with_permission(mut self, name: impl Into<String>, level: impl Into<String>) -> Self {
        self.permissions.insert(name.into(), level.into());
        self
    }

    /// `server/*` for unrestricted servers, `server/tool` per named tool otherwise.
    pub fn tool_refs(&self, prefix: &str) -> Vec<String> {
        let mut refs = Vec::new();
        for (name, server) in &self.mcp_servers {
            match server.named_tools() {
                None => refs.push(format!("{prefix}{name}/{WILDCARD_TOOL}")),
                Some(tools) => {
                    refs.extend(tools.iter().map(|tool| format!("{prefix}{name}/{tool}")))
                }
            }
        }
        refs
    }

    /// Server map rendered for `family`.
    pub fn rendered_servers(&self, family: AgentKind) -> Map<String, Value> {
        self.mcp_servers
            .iter()
            .map(|(name, server)| (name.clone(), server.render_for(family)))
            .collect()
    }
}

/// Synthesizes the config files for one agent family.
pub trait ConfigGenerator: fmt::Debug + Send + Sync {
    /// Stable identifier, used in listings.
    fn id(&self) -> &'static str;

    fn display_name(&self) -> &'static str;

    /// Canonical agent identifiers this generator handles.
    fn supported_agents(&self) -> &'static [&'static str];

    /// Produce every file for `bundle`. Existing files are read where output merges
    /// with them; nothing is written.
    fn generate(
        &self,
        bundle: &BundleConfig,
        options: &GenerateOptions,
        ctx: &HostContext,
    ) -> Result<Vec<GeneratedConfig>>;

    /// User-shared server file that `generate` merges into, if any. Unmanaged servers
    /// already present there keep their existing entry.
    fn merged_config_path(
        &self,
        options: &GenerateOptions,
        ctx: &HostContext,
    ) -> Result<Option<PathBuf>>;

    /// Generated agent file that embeds its own `mcpServers` map, if any.
    fn embedded_servers_path(&self, _scope: Scope, _ctx: &HostContext) -> Option<PathBuf> {
        None
    }
}

/// Ordered set of generators keyed by the agents they support.
#[derive(Debug, Default)]
pub struct GeneratorRegistry {
    generators: Vec<Box<dyn ConfigGenerator>>,
}

impl GeneratorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the Copilot, Kiro and OpenCode generators.
    pub fn with_default_generators() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(CopilotGenerator));
        registry.register(Box::new(KiroGenerator));
        registry.register(Box::new(OpenCodeGenerator));
        registry
    }

    /// Add a generator; later registrations never shadow earlier ones.
    pub fn register(&mut self, generator: Box<dyn ConfigGenerator>) {
        self.generators.push(generator);
    }

    pub fn supports(&self, agent: &str) -> bool {
        self.get_generator(agent).is_some()
    }

    pub fn get_generator(&self, agent: &str) -> Option<&dyn ConfigGenerator> {
        let agent = canonical_agent(agent);
        self.generators
            .iter()
            .find(|generator| generator.supported_agents().contains(&agent.as_str()))
            .map(|generator| generator.as_ref())
    }

    /// Generate for `agent`, or `None` when no generator handles it.
    ///
    /// Every output path is checked against existing directories before returning.
    pub fn generate(
        &self,
        agent: &str,
        bundle: &BundleConfig,
        options: &GenerateOptions,
        ctx: &HostContext,
    ) -> Result<Option<Vec<GeneratedConfig>>> {
        let Some(generator) = self.get_generator(agent) else {
            debug!(agent, "no generator registered");
            return Ok(None);
        };
        let configs = generator.generate(bundle, options, ctx)?;
        for config in &configs {
            ensure_not_directory(&config.file_path)?;
        }
        Ok(Some(configs))
    }

    pub fn list_generators(&self) -> Vec<&dyn ConfigGenerator> {
        self.generators.iter().map(|g| g.as_ref()).collect()
    }

    pub fn supported_agent_types(&self) -> Vec<&'static str> {
        let mut agents: Vec<&'static str> = Vec::new();
        for generator in &self.generators {
            for agent in generator.supported_agents() {
                if !agents.contains(agent) {
                    agents.push(agent);
                }
            }
        }
        agents
    }

    pub fn clear(&mut self) {
        self.generators.clear();
    }
}

fn canonical_agent(agent: &str) -> String {
    match AgentKind::parse(agent) {
        Some(kind) => kind.id().to_string(),
        None => agent.trim().to_ascii_lowercase(),
    }
}

/// Write every generated file, returning the paths in order.
pub fn write_generated(configs: &[GeneratedConfig]) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(configs.len());
    for config in configs {
        write_text(&config.file_path, &config.content)?;
        written.push(config.file_path.clone());
    }
    Ok(written)
}

/// `---` delimited YAML frontmatter followed by `body`.
pub(crate) fn markdown_with_frontmatter<T: Serialize>(
    frontmatter: &T,
    body: &str,
) -> Result<String> {
    let yaml = serde_yaml::to_string(frontmatter)?;
    Ok(format!("---\n{yaml}---\n\n{body}"))
}

/// Existing server config at `path` with the bundle merged in. Managed servers are
/// replaced; any other server is added only when its key is absent.
pub(crate) fn merge_into_existing(
    path: &Path,
    family: AgentKind,
    bundle: &BundleConfig,
) -> Result<AgentConfig> {
    let mut config = read_with_schema(path, family.schema())?;
    for (name, entry) in bundle.rendered_servers(family) {
        if bundle.managed_servers.contains(&name) {
            config.upsert_server(name, entry);
        } else if !config.add_server_if_absent(&name, entry) {
            debug!(server = %name, path = %path.display(), "keeping existing server entry");
        }
    }
    Ok(config)
}

/// Pretty JSON with a trailing newline, as every agent config is written.
pub(crate) fn json_content(document: &Map<String, Value>) -> Result<String> {
    let mut content = serde_json::to_string_pretty(document)?;
    content.push('\n');
    Ok(content)
}
