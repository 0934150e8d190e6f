//! Host context shared by path resolution, parameter resolution and orchestration.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::env::{Environment, ProcessEnv};
use crate::error::{Error, Result};
use crate::types::Scope;

/// Operating system family used for platform-specific config locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Linux,
    Windows,
    Other,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(target_os = "windows") {
            Self::Windows
        } else if cfg!(target_os = "linux") {
            Self::Linux
        } else {
            Self::Other
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::MacOs => "macos",
            Self::Linux => "linux",
            Self::Windows => "windows",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Paths and environment the configuration engine operates against.
///
/// Frontends build this once per invocation; tests point both roots at a temp dir.
#[derive(Debug, Clone)]
pub struct HostContext {
    home_dir: PathBuf,
    project_root: PathBuf,
    platform: Platform,
    env: Arc<dyn Environment>,
}

impl HostContext {
    pub fn new(home_dir: PathBuf, project_root: PathBuf) -> Self {
        Self {
            home_dir,
            project_root,
            platform: Platform::current(),
            env: Arc::new(ProcessEnv),
        }
    }

    /// Context for the current user and working directory.
    pub fn from_process() -> Result<Self> {
        let home_dir = dirs::home_dir().ok_or(Error::NoHomeDir)?;
        let project_root =
            std::env::current_dir().map_err(|e| Error::io("read", "current directory", e))?;
        Ok(Self::new(home_dir, project_root))
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_env(mut self, env: impl Environment + 'static) -> Self {
        self.env = Arc::new(env);
        self
    }

    pub fn home_dir(&self) -> &Path {
        &self.home_dir
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn env(&self) -> &dyn Environment {
        self.env.as_ref()
    }

    /// Project root for local scope, home directory for global scope.
    pub fn base_dir(&self, scope: Scope) -> &Path {
        match scope {
            Scope::Local => &self.project_root,
            Scope::Global => &self.home_dir,
        }
    }
}
