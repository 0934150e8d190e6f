#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use skillmux_core::context::{HostContext, Platform};
use skillmux_core::env::MapEnv;
use skillmux_core::error::{Error, Result};
use skillmux_core::mcp::{ParameterPrompter, PromptRequest};
use tempfile::TempDir;

/// Linux host rooted in `temp` with an empty environment.
pub fn host(temp: &TempDir) -> HostContext {
    let home = temp.path().join("home");
    let project = temp.path().join("project");
    std::fs::create_dir_all(&home).expect("Failed to create home dir");
    std::fs::create_dir_all(&project).expect("Failed to create project dir");
    HostContext::new(home, project)
        .with_platform(Platform::Linux)
        .with_env(MapEnv::new())
}

pub fn write_file(path: &Path, content: &str) {
    std::fs::create_dir_all(path.parent().expect("path has a parent"))
        .expect("Failed to create parent dir");
    std::fs::write(path, content).expect("Failed to write file");
}

/// Write `<skills_dir>/<name>/SKILL.md` with the given frontmatter body.
pub fn write_skill(skills_dir: &Path, name: &str, frontmatter: &str) {
    let content = format!("---\nname: {name}\n{frontmatter}---\n\n# {name}\n");
    write_file(&skills_dir.join(name).join("SKILL.md"), &content);
}

/// Answers every prompt with a fixed value and counts the calls.
#[derive(Debug)]
pub struct CountingPrompter {
    answer: String,
    calls: AtomicUsize,
}

impl CountingPrompter {
    pub fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ParameterPrompter for CountingPrompter {
    fn prompt(&self, _request: &PromptRequest<'_>) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.answer.clone())
    }
}

/// Simulates the user interrupting the first prompt.
#[derive(Debug, Default)]
pub struct CancellingPrompter;

impl ParameterPrompter for CancellingPrompter {
    fn prompt(&self, _request: &PromptRequest<'_>) -> Result<String> {
        Err(Error::Cancelled)
    }
}
