//! MCP (Model Context Protocol) server templates, parameters and skill dependencies

pub mod deps;
pub mod params;
pub mod spec;

pub use deps::{
    McpDependencyCheckResult, McpDependencyInfo, ServerLookup, ServerTools, check_dependencies,
    collect_dependencies, derive_allowed_tools,
};
pub use params::{NoPrompt, ParameterPrompter, PromptRequest, apply_params, resolve_parameters};
pub use spec::{McpServerEntry, McpServerSpec, ParameterSpec, WILDCARD_TOOL};
