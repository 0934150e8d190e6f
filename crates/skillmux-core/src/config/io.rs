//! Reading and writing agent JSON config files.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::client::schema_for;
use crate::error::{Error, Result};

use super::{AgentConfig, ServerSchema};

/// Load an agent config, normalizing the agent's server key into `mcp_servers`.
///
/// A missing file is an empty config. A directory at `path` fails with
/// [`Error::PathIsDirectory`]; any other read or parse failure is returned, since the
/// file's state is then unknown and must not be overwritten.
pub fn read_agent_config(path: &Path, agent: Option<&str>) -> Result<AgentConfig> {
    read_with_schema(path, schema_for(agent))
}

pub fn read_with_schema(path: &Path, schema: ServerSchema) -> Result<AgentConfig> {
    ensure_not_directory(path)?;
    match load_json_document(path)? {
        Some(document) => AgentConfig::from_document(document, schema, path),
        None => {
            debug!(path = %path.display(), "config not found, starting empty");
            Ok(AgentConfig::new())
        }
    }
}

/// Persist an agent config under the agent's server key.
pub fn write_agent_config(path: &Path, config: &AgentConfig, agent: Option<&str>) -> Result<()> {
    write_with_schema(path, config, schema_for(agent))
}

pub fn write_with_schema(path: &Path, config: &AgentConfig, schema: ServerSchema) -> Result<()> {
    write_json_document(path, &config.to_document(schema))
}

/// Parsed JSON object at `path`, or `None` when the file does not exist.
pub(crate) fn load_json_document(path: &Path) -> Result<Option<Map<String, Value>>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(Error::io("read", path, err)),
    };
    let value: Value = serde_json::from_slice(&bytes).map_err(|source| Error::ParseJson {
        path: path.to_path_buf(),
        source,
    })?;
    match value {
        Value::Object(map) => Ok(Some(map)),
        _ => Err(Error::NotAnObject(path.to_path_buf())),
    }
}

/// Two-space pretty JSON with a trailing newline.
pub(crate) fn write_json_document(path: &Path, document: &Map<String, Value>) -> Result<()> {
    let mut content = serde_json::to_string_pretty(document)?;
    content.push('\n');
    write_text(path, &content)
}

/// Guarded write: refuses directories, creates parents, then writes `content`.
pub(crate) fn write_text(path: &Path, content: &str) -> Result<()> {
    ensure_not_directory(path)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io("create directory", parent, e))?;
    }
    fs::write(path, content).map_err(|e| Error::io("write", path, e))?;
    info!(path = %path.display(), "wrote config");
    Ok(())
}

/// Fail with [`Error::PathIsDirectory`] when `path` exists as a directory.
pub fn ensure_not_directory(path: &Path) -> Result<()> {
    if path.is_dir() {
        return Err(Error::PathIsDirectory(path.to_path_buf()));
    }
    Ok(())
}
