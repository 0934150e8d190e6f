//! Loading installed skills from `<dir>/<skill>/SKILL.md`.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Error, Result};

use super::{Skill, SkillMetadata};

pub const SKILL_FILE: &str = "SKILL.md";

const FRONTMATTER_DELIMITER: &str = "---";

/// Provider of installed skills.
pub trait SkillSource {
    fn load(&self) -> Result<Vec<Skill>>;
}

/// Reads every `SKILL.md` one level below each configured directory.
#[derive(Debug, Clone)]
pub struct DirectorySkillSource {
    dirs: Vec<PathBuf>,
}

impl DirectorySkillSource {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }
}

impl SkillSource for DirectorySkillSource {
    /// Skills are returned in directory order, then by skill directory name.
    ///
    /// Missing directories are skipped; a malformed skill is logged and skipped.
    fn load(&self) -> Result<Vec<Skill>> {
        let mut skills = Vec::new();
        for dir in &self.dirs {
            if !dir.is_dir() {
                debug!(dir = %dir.display(), "skill directory not present");
                continue;
            }
            for skill_file in skill_files(dir)? {
                let content = fs::read_to_string(&skill_file)
                    .map_err(|e| Error::io("read", &skill_file, e))?;
                match parse_skill(&skill_file, &content) {
                    Ok(skill) => skills.push(skill),
                    Err(err) => warn!("Skipping skill {}: {}", skill_file.display(), err),
                }
            }
        }
        Ok(skills)
    }
}

fn skill_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| Error::io("read directory", dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::io("read directory", dir, e))?;
        let candidate = entry.path().join(SKILL_FILE);
        if candidate.is_file() {
            files.push(candidate);
        }
    }
    files.sort();
    Ok(files)
}

/// Split `---` frontmatter from the body and deserialize the metadata.
pub fn parse_skill(path: &Path, content: &str) -> Result<Skill> {
    let invalid = |reason: &str| Error::InvalidSkill {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    let content = content.trim_start_matches('\u{feff}');
    let rest = content
        .strip_prefix(FRONTMATTER_DELIMITER)
        .ok_or_else(|| invalid("missing frontmatter"))?;
    let (frontmatter, body) = split_at_closing_delimiter(rest)
        .ok_or_else(|| invalid("unterminated frontmatter"))?;

    let metadata: SkillMetadata = serde_yaml::from_str(frontmatter)?;
    if metadata.name.trim().is_empty() {
        return Err(invalid("empty name"));
    }

    Ok(Skill {
        metadata,
        body: body.trim_start_matches(['\r', '\n']).to_string(),
    })
}

fn split_at_closing_delimiter(rest: &str) -> Option<(&str, &str)> {
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if offset > 0 && line.trim_end() == FRONTMATTER_DELIMITER {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}
