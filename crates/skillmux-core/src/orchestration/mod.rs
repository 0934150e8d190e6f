//! Applying skill MCP dependencies across a set of agents.
//!
//! Parameters are resolved once per dependency before any agent is touched, so prompts
//! never repeat per agent and a cancelled prompt leaves no partially applied server.
//! Agents are then configured one at a time in input order; a failing agent is logged
//! and recorded while the rest of the batch continues.

mod lookup;

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::client::{AgentKind, render_entry_for, resolve_config_path_lenient};
use crate::config::store::upsert_bridge;
use crate::config::{AgentConfig, BridgeServer, read_agent_config, write_agent_config};
use crate::context::HostContext;
use crate::error::{Error, Result};
use crate::generator::{
    BundleConfig, BundleServer, GenerateOptions, GeneratorRegistry, write_generated,
};
use crate::mcp::{
    McpDependencyInfo, McpServerEntry, ParameterPrompter, ServerTools, apply_params,
    resolve_parameters,
};
use crate::types::{ConfigMode, Scope};

pub use lookup::InstalledServers;

/// How an agent's configuration was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Regenerated through the agent family's generator.
    Generator,
    /// Merged into the plain server config file.
    RawConfig,
}

/// Successful configuration of one agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentOutcome {
    pub agent: String,
    pub route: Route,
    /// Dependency servers newly written for this agent.
    pub added: Vec<String>,
    /// Dependency servers left untouched because the key already existed.
    pub skipped: Vec<String>,
    pub written_files: Vec<PathBuf>,
}

/// Failed configuration of one agent.
#[derive(Debug)]
pub struct AgentFailure {
    pub agent: String,
    pub error: Error,
}

/// Per-agent results of a batch.
#[derive(Debug, Default)]
pub struct SetupReport {
    pub configured: Vec<AgentOutcome>,
    pub failed: Vec<AgentFailure>,
    pub written_files: Vec<PathBuf>,
}

impl SetupReport {
    pub fn is_empty(&self) -> bool {
        self.configured.is_empty() && self.failed.is_empty()
    }

    /// Every attempted agent failed.
    pub fn is_total_failure(&self) -> bool {
        self.configured.is_empty() && !self.failed.is_empty()
    }

    pub fn merge(&mut self, other: SetupReport) {
        self.configured.extend(other.configured);
        self.failed.extend(other.failed);
        self.written_files.extend(other.written_files);
    }

    fn record(&mut self, agent: &str, result: Result<AgentOutcome>) -> Result<()> {
        match result {
            Ok(outcome) => {
                self.written_files.extend(outcome.written_files.iter().cloned());
                self.configured.push(outcome);
            }
            Err(err) if err.is_cancelled() => return Err(err),
            Err(err) => {
                warn!("Failed to configure {}: {}", agent, err);
                self.failed.push(AgentFailure {
                    agent: agent.to_string(),
                    error: err,
                });
            }
        }
        Ok(())
    }
}

/// A dependency with its parameters substituted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedServer {
    pub name: String,
    pub entry: McpServerEntry,
    /// Allow-list for bundled agent files; `None` is unrestricted.
    pub tools: Option<Vec<String>>,
}

/// Input of [`Configurator::setup`].
#[derive(Debug, Clone, Copy)]
pub struct SetupRequest<'a> {
    pub agents: &'a [String],
    /// Explicit mode for every agent; `None` picks the per-family default.
    pub mode: Option<ConfigMode>,
    pub dependencies: &'a [McpDependencyInfo],
    pub allowed_tools: Option<&'a BTreeMap<String, ServerTools>>,
}

/// Everything a batch needs, borrowed from the caller.
#[derive(Clone, Copy)]
pub struct Configurator<'a> {
    pub ctx: &'a HostContext,
    pub scope: Scope,
    pub registry: &'a GeneratorRegistry,
    pub bridge: &'a BridgeServer,
    pub prompter: &'a dyn ParameterPrompter,
}

impl<'a> Configurator<'a> {
    pub fn new(
        ctx: &'a HostContext,
        scope: Scope,
        registry: &'a GeneratorRegistry,
        bridge: &'a BridgeServer,
        prompter: &'a dyn ParameterPrompter,
    ) -> Self {
        Self {
            ctx,
            scope,
            registry,
            bridge,
            prompter,
        }
    }

    /// Resolve and substitute every dependency exactly once.
    pub fn resolve_dependencies(
        &self,
        dependencies: &[McpDependencyInfo],
        allowed_tools: Option<&BTreeMap<String, ServerTools>>,
    ) -> Result<Vec<ResolvedServer>> {
        let mut resolved = Vec::with_capacity(dependencies.len());
        for dep in dependencies {
            let params = resolve_parameters(&dep.spec, self.ctx.env(), self.prompter)?;
            let tools = match allowed_tools.and_then(|tools| tools.get(&dep.server_name)) {
                Some(ServerTools::Only(names)) => Some(names.clone()),
                Some(ServerTools::All) | None => None,
            };
            resolved.push(ResolvedServer {
                name: dep.server_name.clone(),
                entry: apply_params(&dep.spec, &params),
                tools,
            });
        }
        Ok(resolved)
    }

    /// Write skill dependencies for each agent.
    ///
    /// In agent-config mode generator-backed agents have their composite files
    /// regenerated; every other agent gets missing servers added to its plain config.
    pub fn configure_skill_mcp_deps_for_agents(
        &self,
        dependencies: &[McpDependencyInfo],
        agents: &[String],
        mode: ConfigMode,
        allowed_tools: Option<&BTreeMap<String, ServerTools>>,
    ) -> Result<SetupReport> {
        if dependencies.is_empty() || agents.is_empty() {
            return Ok(SetupReport::default());
        }
        let resolved = self.resolve_dependencies(dependencies, allowed_tools)?;
        self.run_batch(agents, &resolved, mode, false)
    }

    /// Register the bridge server and skill dependencies for a mixed agent set.
    pub fn setup(&self, request: SetupRequest<'_>) -> Result<SetupReport> {
        self.route(request, true)
    }

    /// Skill dependencies only, routed like [`Configurator::setup`].
    pub fn configure_dependencies(&self, request: SetupRequest<'_>) -> Result<SetupReport> {
        if request.dependencies.is_empty() || request.agents.is_empty() {
            return Ok(SetupReport::default());
        }
        self.route(request, false)
    }

    /// Split agents into generator-backed and plain subsets and run each batch; without
    /// an explicit mode the former default to agent-config and the latter to mcp-json.
    fn route(&self, request: SetupRequest<'_>, register_bridge: bool) -> Result<SetupReport> {
        let resolved = self.resolve_dependencies(request.dependencies, request.allowed_tools)?;
        let (generated, raw): (Vec<String>, Vec<String>) = request
            .agents
            .iter()
            .cloned()
            .partition(|agent| self.registry.supports(agent));

        let mut report = SetupReport::default();
        if !generated.is_empty() {
            let mode = request.mode.unwrap_or(ConfigMode::AgentConfig);
            report.merge(self.run_batch(&generated, &resolved, mode, register_bridge)?);
        }
        if !raw.is_empty() {
            let mode = request.mode.unwrap_or(ConfigMode::McpJson);
            report.merge(self.run_batch(&raw, &resolved, mode, register_bridge)?);
        }
        Ok(report)
    }

    fn run_batch(
        &self,
        agents: &[String],
        resolved: &[ResolvedServer],
        mode: ConfigMode,
        register_bridge: bool,
    ) -> Result<SetupReport> {
        let mut report = SetupReport::default();
        for agent in agents {
            let result = self.configure_agent(agent, resolved, mode, register_bridge);
            report.record(agent, result)?;
        }
        Ok(report)
    }

    /// Configure one agent through its generator or its plain config file.
    pub fn configure_agent(
        &self,
        agent: &str,
        resolved: &[ResolvedServer],
        mode: ConfigMode,
        register_bridge: bool,
    ) -> Result<AgentOutcome> {
        if mode == ConfigMode::AgentConfig && self.registry.supports(agent) {
            return self.generate_agent(agent, resolved);
        }

        self.merge_raw_config(agent, resolved, register_bridge)
    }

    /// Regenerate the agent's composite files: bridge entry plus every dependency.
    ///
    /// A dependency already present in a user-shared server file keeps its entry there
    /// and is reported as skipped.
    fn generate_agent(&self, agent: &str, resolved: &[ResolvedServer]) -> Result<AgentOutcome> {
        let generator = self
            .registry
            .get_generator(agent)
            .ok_or_else(|| Error::UnknownAgent(agent.to_string()))?;
        let options = GenerateOptions {
            scope: self.scope,
            include_agent_config: true,
        };

        let existing = match generator.merged_config_path(&options, self.ctx)? {
            Some(path) => read_agent_config(&path, Some(agent))?,
            None => AgentConfig::new(),
        };
        let (skipped, added): (Vec<String>, Vec<String>) = resolved
            .iter()
            .map(|server| server.name.clone())
            .partition(|name| existing.has_server(name));

        let mut bundle = BundleConfig::default().with_managed_server(
            self.bridge.name.clone(),
            BundleServer::stdio(&self.bridge.to_entry()),
        );
        for server in resolved {
            bundle = bundle.with_server(
                server.name.clone(),
                BundleServer::stdio(&server.entry).with_tools(server.tools.clone()),
            );
        }

        let configs = self
            .registry
            .generate(agent, &bundle, &options, self.ctx)?
            .ok_or_else(|| Error::UnknownAgent(agent.to_string()))?;
        let written_files = write_generated(&configs)?;
        info!("Generated {} file(s) for {}", written_files.len(), agent);

        Ok(AgentOutcome {
            agent: agent.to_string(),
            route: Route::Generator,
            added,
            skipped,
            written_files,
        })
    }

    /// One read-modify-write of the agent's plain config: the bridge entry (when
    /// registering) is replaced, dependency servers are added only when their key is
    /// absent. Nothing is written when nothing changed.
    fn merge_raw_config(
        &self,
        agent: &str,
        resolved: &[ResolvedServer],
        register_bridge: bool,
    ) -> Result<AgentOutcome> {
        let mut outcome = AgentOutcome {
            agent: agent.to_string(),
            route: Route::RawConfig,
            added: Vec::new(),
            skipped: Vec::new(),
            written_files: Vec::new(),
        };

        let bridge_family = if register_bridge {
            Some(AgentKind::parse(agent).ok_or_else(|| Error::UnknownAgent(agent.to_string()))?)
        } else if resolved.is_empty() {
            return Ok(outcome);
        } else {
            None
        };

        let path = match bridge_family {
            Some(kind) => kind.config_path(self.scope, self.ctx)?,
            None => resolve_config_path_lenient(agent, self.scope, self.ctx)?,
        };
        let mut config = read_agent_config(&path, Some(agent))?;
        if let Some(kind) = bridge_family {
            upsert_bridge(&mut config, kind, self.bridge);
        }
        for server in resolved {
            if config.add_server_if_absent(&server.name, render_entry_for(agent, &server.entry)) {
                outcome.added.push(server.name.clone());
            } else {
                debug!(agent, server = %server.name, "server already configured, skipping");
                outcome.skipped.push(server.name.clone());
            }
        }

        if bridge_family.is_some() || !outcome.added.is_empty() {
            write_agent_config(&path, &config, Some(agent))?;
            info!(
                "Configured {} for {} ({} server(s) added)",
                path.display(),
                agent,
                outcome.added.len()
            );
            outcome.written_files.push(path);
        }
        Ok(outcome)
    }
}
