//! Data file path resolution.

use std::path::{Path, PathBuf};

use directories::BaseDirs;
use thiserror::Error;

/// Errors raised while resolving a configured data file path.
#[derive(Debug, Error)]
pub enum PathError {
    #[error("empty path")]
    Empty,

    #[error("cannot determine home directory")]
    NoHomeDir,

    #[error("unsupported ~user expansion: {0:?}")]
    UnsupportedExpansion(String),

    #[error("cannot make absolute path from {path:?}: {source}")]
    Absolute {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("path does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("stat error for {}: {source}", .path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Expand `~`, make absolute and follow symlinks where possible.
///
/// With `must_exist`, a path that cannot be found is an error.
pub fn resolve_path(input: &str, must_exist: bool) -> Result<PathBuf, PathError> {
    if input.is_empty() {
        return Err(PathError::Empty);
    }

    let expanded = match input.strip_prefix('~') {
        Some(rest) => {
            let home = home_dir()?;
            if rest.is_empty() {
                home
            } else if let Some(tail) = rest.strip_prefix('/').or_else(|| rest.strip_prefix('\\')) {
                home.join(tail)
            } else {
                return Err(PathError::UnsupportedExpansion(input.to_string()));
            }
        }
        None => PathBuf::from(input),
    };

    let absolute = std::path::absolute(&expanded).map_err(|source| PathError::Absolute {
        path: input.to_string(),
        source,
    })?;

    let resolved = absolute.canonicalize().unwrap_or(absolute);

    if must_exist {
        check_exists(&resolved)?;
    }

    Ok(resolved)
}

fn home_dir() -> Result<PathBuf, PathError> {
    BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .ok_or(PathError::NoHomeDir)
}

fn check_exists(path: &Path) -> Result<(), PathError> {
    match std::fs::metadata(path) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(PathError::NotFound(path.to_path_buf()))
        }
        Err(source) => Err(PathError::Stat {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_path_is_rejected() {
        assert!(matches!(resolve_path("", false), Err(PathError::Empty)));
    }

    #[test]
    fn user_expansion_is_rejected() {
        let err = resolve_path("~someone/blocks.csv", false).unwrap_err();
        assert!(matches!(err, PathError::UnsupportedExpansion(ref s) if s == "~someone/blocks.csv"));
    }

    #[test]
    fn tilde_expands_to_home() {
        let home = BaseDirs::new().unwrap().home_dir().to_path_buf();
        let expected = home.canonicalize().unwrap_or(home.clone());

        assert_eq!(resolve_path("~", false).unwrap(), expected);

        let file = resolve_path("~/x.csv", false).unwrap();
        assert!(file.ends_with("x.csv"));
        assert!(file.starts_with(&expected) || file.starts_with(&home));
    }

    #[test]
    fn missing_file_is_an_error_only_when_required() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.csv");
        let missing = missing.to_str().unwrap();

        assert!(matches!(resolve_path(missing, true), Err(PathError::NotFound(_))));
        assert!(resolve_path(missing, false).is_ok());
    }

    #[test]
    fn existing_file_resolves_to_absolute_path() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let resolved = resolve_path(file.path().to_str().unwrap(), true).unwrap();

        assert!(resolved.is_absolute());
        assert_eq!(resolved, file.path().canonicalize().unwrap());
    }
}
