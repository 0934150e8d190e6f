//! skillmux core library
//!
//! Reconciles the MCP servers that installed skills depend on with the configuration
//! files of many coding agents, each with its own file location and schema.

pub mod client;
pub mod config;
pub mod context;
pub mod env;
pub mod error;
pub mod generator;
pub mod mcp;
pub mod orchestration;
pub mod skills;
pub mod types;

pub use error::{Error, Result};

/// Re-exports of commonly used types
pub mod prelude {
    // Errors
    pub use crate::error::{Error, Result};

    // Host
    pub use crate::context::{HostContext, Platform};
    pub use crate::env::{Environment, MapEnv, ProcessEnv};
    pub use crate::types::{ConfigMode, Scope};

    // Agents
    pub use crate::client::{
        AgentKind, detect_agents, resolve_config_path, resolve_config_path_lenient,
    };

    // Config
    pub use crate::config::{
        AgentConfig, AgentConfigStore, BridgeServer, ServerSchema, Settings, configure_agent_mcp,
        read_agent_config, write_agent_config,
    };

    // MCP
    pub use crate::mcp::{
        McpDependencyCheckResult, McpDependencyInfo, McpServerEntry, McpServerSpec, NoPrompt,
        ParameterPrompter, ParameterSpec, PromptRequest, ServerTools, check_dependencies,
        collect_dependencies, derive_allowed_tools,
    };

    // Generators
    pub use crate::generator::{
        BundleConfig, BundleServer, ConfigFormat, ConfigGenerator, GenerateOptions,
        GeneratedConfig, GeneratorRegistry,
    };

    // Orchestration
    pub use crate::orchestration::{Configurator, InstalledServers, SetupReport, SetupRequest};

    // Skills
    pub use crate::skills::{DirectorySkillSource, Skill, SkillMetadata, SkillSource};
}
