//! Path utilities for nativegate

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::error::{hints, NativeBuildError};

/// Name of the project configuration file
pub const CONFIG_FILE_NAME: &str = "NativeBuild.toml";

/// Find the config file by walking up from the current directory
pub fn find_config_file() -> Result<PathBuf> {
    let current_dir = std::env::current_dir().context("Failed to get current directory")?;
    find_config_file_from(&current_dir)
}

/// Find the config file starting from a specific directory
pub fn find_config_file_from(start: &Path) -> Result<PathBuf> {
    let mut dir = start;
    loop {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Ok(candidate);
        }

        match dir.parent() {
            Some(parent) => dir = parent,
            None => {
                return Err(NativeBuildError::config_error_with_hint(
                    format!("Could not find {} in current directory or any parent", CONFIG_FILE_NAME),
                    hints::native_build_toml_not_found(),
                )
                .into())
            }
        }
    }
}

/// Resolve `path` against `root` unless it is already absolute
pub fn resolve_under(root: &Path, path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Make a path absolute relative to the current directory
pub fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let current_dir = std::env::current_dir().context("Failed to get current directory")?;
    Ok(current_dir.join(path))
}

/// Ensure a directory exists
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_config_file_from_nested_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        std::fs::write(root.join(CONFIG_FILE_NAME), "").unwrap();
        let nested = root.join("Assets").join("Plugins");
        std::fs::create_dir_all(&nested).unwrap();

        let found = find_config_file_from(&nested).unwrap();
        assert_eq!(found, root.join(CONFIG_FILE_NAME));
    }

    #[test]
    fn test_find_config_file_missing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let err = find_config_file_from(temp_dir.path()).unwrap_err();
        assert!(err.downcast_ref::<NativeBuildError>().is_some());
    }

    #[test]
    #[serial_test::serial]
    fn test_find_config_file_from_current_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path().canonicalize().unwrap();
        std::fs::write(root.join(CONFIG_FILE_NAME), "").unwrap();
        let nested = root.join("Assets");
        std::fs::create_dir_all(&nested).unwrap();

        let previous = std::env::current_dir().unwrap();
        std::env::set_current_dir(&nested).unwrap();
        let found = find_config_file();
        let absolute = absolutize(Path::new("Build"));
        std::env::set_current_dir(previous).unwrap();

        assert_eq!(found.unwrap(), root.join(CONFIG_FILE_NAME));
        assert_eq!(absolute.unwrap(), nested.join("Build"));
    }

    #[test]
    fn test_resolve_under() {
        let root = Path::new("/project/lib/NativeCode");
        assert_eq!(
            resolve_under(root, "Win64/Plugin.sln"),
            PathBuf::from("/project/lib/NativeCode/Win64/Plugin.sln")
        );
        assert_eq!(resolve_under(root, "/abs/Makefile"), PathBuf::from("/abs/Makefile"));
    }
}
