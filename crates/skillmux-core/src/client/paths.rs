//! Config file locations per agent family and scope.

use std::path::{Path, PathBuf};

use crate::context::{HostContext, Platform};
use crate::error::{Error, Result};
use crate::types::Scope;

use super::AgentKind;

/// Where a config file lives before the host context is applied.
enum Location {
    /// Relative to the project root (local) or home directory (global).
    Base(&'static str),
    /// Under the per-user application config directory of the platform.
    AppConfig(&'static [&'static str]),
}

fn location(agent: AgentKind, scope: Scope) -> Location {
    use AgentKind as A;
    use Location::{AppConfig, Base};

    match (agent, scope) {
        (A::Claude, Scope::Local) => Base(".mcp.json"),
        (A::Claude, Scope::Global) => Base(".claude.json"),
        (A::ClaudeDesktop, _) => AppConfig(&["Claude", "claude_desktop_config.json"]),
        (A::Cursor, _) => Base(".cursor/mcp.json"),
        (A::Cline, _) => Base(".cline/mcp.json"),
        (A::Windsurf, Scope::Local) => Base(".windsurf/mcp.json"),
        (A::Windsurf, Scope::Global) => Base(".codeium/windsurf/mcp_config.json"),
        (A::Continue, _) => Base(".continue/mcp.json"),
        (A::Junie, _) => Base(".junie/mcp/mcp.json"),
        (A::Zed, _) => Base(".zed/mcp.json"),
        (A::Roo, _) => Base(".roo/mcp.json"),
        (A::Gemini, _) => Base(".gemini/settings.json"),
        (A::Kiro, _) => Base(".kiro/settings/mcp.json"),
        (A::GithubCopilot, Scope::Local) => Base(".vscode/mcp.json"),
        (A::GithubCopilot, Scope::Global) => AppConfig(&["Code", "User", "mcp.json"]),
        (A::OpenCode, Scope::Local) => Base("opencode.json"),
        (A::OpenCode, Scope::Global) => Base(".config/opencode/opencode.json"),
    }
}

impl AgentKind {
    /// Absolute config path for this agent in `scope`.
    pub fn config_path(self, scope: Scope, ctx: &HostContext) -> Result<PathBuf> {
        match location(self, scope) {
            Location::Base(relative) => Ok(join_relative(ctx.base_dir(scope), relative)),
            Location::AppConfig(segments) => {
                let root = app_config_dir(ctx).ok_or(Error::UnsupportedPlatform {
                    agent: self.id(),
                    platform: ctx.platform().as_str(),
                })?;
                Ok(segments.iter().fold(root, |path, segment| path.join(segment)))
            }
        }
    }
}

/// Per-user application config directory of the context's platform.
///
/// Environment overrides (`APPDATA`, `XDG_CONFIG_HOME`) are read from the context so
/// tests stay hermetic.
fn app_config_dir(ctx: &HostContext) -> Option<PathBuf> {
    let home = ctx.home_dir();
    match ctx.platform() {
        Platform::MacOs => Some(home.join("Library").join("Application Support")),
        Platform::Windows => Some(
            ctx.env()
                .var("APPDATA")
                .map(PathBuf::from)
                .unwrap_or_else(|| home.join("AppData").join("Roaming")),
        ),
        Platform::Linux => Some(
            ctx.env()
                .var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|| home.join(".config")),
        ),
        Platform::Other => None,
    }
}

fn join_relative(base: &Path, relative: &str) -> PathBuf {
    relative
        .split('/')
        .fold(base.to_path_buf(), |path, segment| path.join(segment))
}

/// Resolve the config path for a known agent identifier or alias.
///
/// Unknown identifiers fail with [`Error::UnknownAgent`].
pub fn resolve_config_path(agent: &str, scope: Scope, ctx: &HostContext) -> Result<PathBuf> {
    let kind = AgentKind::parse(agent).ok_or_else(|| Error::UnknownAgent(agent.to_string()))?;
    kind.config_path(scope, ctx)
}

/// Like [`resolve_config_path`], but unknown identifiers fall back to
/// `<base>/.<sanitized-name>/mcp.json`.
pub fn resolve_config_path_lenient(
    agent: &str,
    scope: Scope,
    ctx: &HostContext,
) -> Result<PathBuf> {
    match AgentKind::parse(agent) {
        Some(kind) => kind.config_path(scope, ctx),
        None => Ok(ctx
            .base_dir(scope)
            .join(format!(".{}", sanitize_agent_name(agent)))
            .join("mcp.json")),
    }
}

/// Lowercase, keep `[a-z0-9_-]`, map everything else to `-`.
pub fn sanitize_agent_name(agent: &str) -> String {
    let sanitized: String = agent
        .trim()
        .to_ascii_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();
    let trimmed = sanitized.trim_matches('-');
    if trimmed.is_empty() {
        "agent".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Agents with a detection marker or an existing global config on this host.
pub fn detect_agents(ctx: &HostContext) -> Vec<AgentKind> {
    AgentKind::ALL
        .into_iter()
        .filter(|kind| kind.is_detected(ctx))
        .collect()
}
