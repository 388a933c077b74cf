//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::GateConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file, or JSON for `.json` paths.
pub fn load_config(path: &Path) -> Result<GateConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let config = if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str(&content)?
    } else {
        toml::from_str(&content)?
    };

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write(suffix: &str, body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_toml() {
        let file = write(
            ".toml",
            "[filter]\nenabled = true\nallowPrivate = true\ndefined = [\"1.2.3.4\"]\n",
        );
        let config = load_config(file.path()).unwrap();
        assert!(config.filter.allow_private);
        assert_eq!(config.filter.defined, vec!["1.2.3.4"]);
    }

    #[test]
    fn loads_json() {
        let file = write(
            ".json",
            r#"{"filter": {"enabled": true, "headerBearer": true, "tags": []}}"#,
        );
        let config = load_config(file.path()).unwrap();
        assert!(config.filter.header_bearer);
    }

    #[test]
    fn reports_validation_errors() {
        let file = write(".toml", "[filter]\nenabled = true\ntags = [\"RU\"]\n");
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref e) if e.len() == 2));
        assert!(err.to_string().contains("codeFile"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config(Path::new("/nonexistent/geo-gate.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
