//! skillmux's own settings, layered global then project.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::HostContext;
use crate::error::{Error, Result};
use crate::mcp::spec::McpServerEntry;
use crate::types::{ConfigMode, Scope};

pub const SETTINGS_DIR: &str = "skillmux";
pub const GLOBAL_SETTINGS_FILE: &str = "config.toml";
pub const PROJECT_SETTINGS_FILE: &str = "skillmux.toml";
pub const DEFAULT_SKILLS_DIR: &str = ".skillmux/skills";

/// The bridge server registered by `configure_agent_mcp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeServer {
    pub name: String,
    pub command: String,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
}

impl Default for BridgeServer {
    fn default() -> Self {
        Self {
            name: "skillmux".to_string(),
            command: "npx".to_string(),
            args: vec!["-y".to_string(), "skillmux-mcp".to_string()],
            env: BTreeMap::new(),
        }
    }
}

impl BridgeServer {
    pub fn to_entry(&self) -> McpServerEntry {
        McpServerEntry {
            command: self.command.clone(),
            args: self.args.clone(),
            env: self.env.clone(),
            cwd: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Defaults {
    /// Agents used by non-interactive setup when none are given.
    pub agents: Vec<String>,
    pub scope: Scope,
    /// `None` selects the per-family default.
    pub config_mode: Option<ConfigMode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillsSettings {
    /// Skill directories, relative ones resolved against the scope's base dir.
    pub dirs: Vec<PathBuf>,
}

impl Default for SkillsSettings {
    fn default() -> Self {
        Self {
            dirs: vec![PathBuf::from(DEFAULT_SKILLS_DIR)],
        }
    }
}

/// Effective settings after layering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub bridge: BridgeServer,
    pub defaults: Defaults,
    pub skills: SkillsSettings,
}

/// One settings file as written; every field optional so layers compose.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsLayer {
    #[serde(default)]
    bridge: BridgeLayer,
    #[serde(default)]
    defaults: DefaultsLayer,
    #[serde(default)]
    skills: SkillsLayer,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct BridgeLayer {
    name: Option<String>,
    command: Option<String>,
    args: Option<Vec<String>>,
    #[serde(default)]
    env: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct DefaultsLayer {
    agents: Option<Vec<String>>,
    scope: Option<Scope>,
    config_mode: Option<ConfigMode>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SkillsLayer {
    dirs: Option<Vec<PathBuf>>,
}

impl Settings {
    /// `<config_dir>/skillmux/config.toml`, when a config dir exists on this platform.
    pub fn global_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(SETTINGS_DIR).join(GLOBAL_SETTINGS_FILE))
    }

    pub fn project_path(project_root: &Path) -> PathBuf {
        project_root.join(PROJECT_SETTINGS_FILE)
    }

    /// Load the user's global settings and the context's project settings.
    pub fn load_for(ctx: &HostContext) -> Result<Self> {
        Self::load(
            Self::global_path().as_deref(),
            &Self::project_path(ctx.project_root()),
        )
    }

    /// Layer `global` then `project`; missing files contribute nothing.
    pub fn load(global: Option<&Path>, project: &Path) -> Result<Self> {
        let mut settings = Self::default();
        if let Some(layer) = global.map(read_layer).transpose()?.flatten() {
            settings.apply(layer);
        }
        if let Some(layer) = read_layer(project)? {
            settings.apply(layer);
        }
        Ok(settings)
    }

    /// Parse a single settings document on top of the defaults.
    pub fn from_toml_str(content: &str) -> std::result::Result<Self, toml::de::Error> {
        let mut settings = Self::default();
        settings.apply(toml::from_str(content)?);
        Ok(settings)
    }

    fn apply(&mut self, layer: SettingsLayer) {
        let SettingsLayer {
            bridge,
            defaults,
            skills,
        } = layer;

        if let Some(name) = bridge.name {
            self.bridge.name = name;
        }
        if let Some(command) = bridge.command {
            self.bridge.command = command;
        }
        if let Some(args) = bridge.args {
            self.bridge.args = args;
        }
        self.bridge.env.extend(bridge.env);

        if let Some(agents) = defaults.agents {
            self.defaults.agents = agents;
        }
        if let Some(scope) = defaults.scope {
            self.defaults.scope = scope;
        }
        if defaults.config_mode.is_some() {
            self.defaults.config_mode = defaults.config_mode;
        }

        if let Some(dirs) = skills.dirs {
            self.skills.dirs = dirs;
        }
    }

    /// Skill directories resolved against the base dir for `scope`.
    pub fn skill_dirs(&self, ctx: &HostContext, scope: Scope) -> Vec<PathBuf> {
        let base = ctx.base_dir(scope);
        self.skills
            .dirs
            .iter()
            .map(|dir| {
                if dir.is_absolute() {
                    dir.clone()
                } else {
                    base.join(dir)
                }
            })
            .collect()
    }
}

fn read_layer(path: &Path) -> Result<Option<SettingsLayer>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "settings file not present");
            return Ok(None);
        }
        Err(err) => return Err(Error::io("read", path, err)),
    };
    toml::from_str(&content)
        .map(Some)
        .map_err(|source| Error::ParseSettings {
            path: path.to_path_buf(),
            source,
        })
}
