//! YAML parsing of systemconf.yaml into the configuration model.
//!
//! Structural checks live in [`super::validator`]; this module only decodes.

use super::error::ParseError;
use super::types::SystemconfFile;
use std::path::Path;

/// Parse a systemconf.yaml file from disk.
pub fn parse_file(path: &Path) -> Result<SystemconfFile, ParseError> {
    let content = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("read {} ({} bytes)", path.display(), content.len());
    parse(&content)
}

/// Parse a systemconf.yaml from a string.
pub fn parse(yaml: &str) -> Result<SystemconfFile, ParseError> {
    Ok(serde_yaml_ng::from_str(yaml)?)
}
