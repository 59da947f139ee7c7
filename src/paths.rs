//! Path resolution for the guardrails configuration file
//!
//! # Environment Variables
//!
//! - `GUARDRAILS_CONFIG` - Explicit configuration file (same as `--config`)
//! - `GUARDRAILS_CONFIG_DIR` - Override the config directory
//!
//! # Config File Resolution Priority
//!
//! 1. `--config` flag / `GUARDRAILS_CONFIG`
//! 2. `./guardrails.toml`, then `./guardrails.json`
//! 3. `guardrails.toml` / `guardrails.json` in `config_dir()`
//!
//! For config_dir():
//! 1. `GUARDRAILS_CONFIG_DIR` environment variable
//! 2. `XDG_CONFIG_HOME/guardrails` (if set)
//! 3. Platform default (`~/.config/guardrails`, `%APPDATA%\guardrails` on Windows)

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "GUARDRAILS_CONFIG_DIR";

/// Config file names, in lookup order
pub const CONFIG_FILES: [&str; 2] = ["guardrails.toml", "guardrails.json"];

/// Get the guardrails config directory path
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = expand(&dir);
        log::debug!(
            "Using config dir from {}: {}",
            ENV_CONFIG_DIR,
            path.display()
        );
        return Ok(path);
    }

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg_config).join("guardrails");
        log::debug!("Using XDG_CONFIG_HOME: {}", path.display());
        return Ok(path);
    }

    #[cfg(windows)]
    {
        if let Some(app_data) = dirs::config_dir() {
            return Ok(app_data.join("guardrails"));
        }
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    let path = home.join(".config").join("guardrails");
    log::debug!("Using default config dir: {}", path.display());
    Ok(path)
}

/// Locate the configuration file.
///
/// An explicit path must exist; otherwise the working directory and then the
/// config directory are searched.
pub fn find_config(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        let path = expand(&path.to_string_lossy());
        if !path.exists() {
            bail!("Config file not found: {}", path.display());
        }
        return Ok(path);
    }

    let dirs = [PathBuf::from("."), config_dir()?];
    find_in(&dirs).with_context(|| {
        format!(
            "No {} found in the current directory or {}",
            CONFIG_FILES.join(" or "),
            dirs[1].display()
        )
    })
}

/// First existing config file in the given directories
fn find_in(dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter()
        .flat_map(|dir| CONFIG_FILES.iter().map(move |name| dir.join(name)))
        .find(|candidate| candidate.is_file())
        .inspect(|found| log::debug!("Using config file {}", found.display()))
}

/// Expand ~ and environment variables in a path string.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    /// Helper to run a test with temporary env var
    fn with_env_var<F, R>(key: &str, value: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let original = env::var(key).ok();
        // SAFETY: Tests run in isolation and don't read env vars concurrently
        unsafe { env::set_var(key, value) };
        let result = f();
        match original {
            // SAFETY: Tests run in isolation
            Some(v) => unsafe { env::set_var(key, v) },
            None => unsafe { env::remove_var(key) },
        }
        result
    }

    #[test]
    fn test_config_dir_env_override() {
        with_env_var(ENV_CONFIG_DIR, "/custom/guardrails", || {
            let result = config_dir().unwrap();
            assert_eq!(result, PathBuf::from("/custom/guardrails"));
        });
    }

    #[test]
    fn test_find_config_explicit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "").unwrap();

        assert_eq!(find_config(Some(&path)).unwrap(), path);
    }

    #[test]
    fn test_find_config_explicit_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = find_config(Some(&dir.path().join("missing.toml"))).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_find_in_prefers_toml_then_order() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        std::fs::write(second.path().join("guardrails.toml"), "").unwrap();
        std::fs::write(first.path().join("guardrails.json"), "{}").unwrap();

        let dirs = [first.path().to_path_buf(), second.path().to_path_buf()];
        assert_eq!(find_in(&dirs), Some(first.path().join("guardrails.json")));

        std::fs::write(first.path().join("guardrails.toml"), "").unwrap();
        assert_eq!(find_in(&dirs), Some(first.path().join("guardrails.toml")));
    }

    #[test]
    fn test_find_in_nothing() {
        let empty = tempfile::tempdir().unwrap();
        assert_eq!(find_in(&[empty.path().to_path_buf()]), None);
    }

    #[test]
    fn test_expand_with_tilde() {
        let result = expand("~/test/path");
        let home = dirs::home_dir().unwrap();
        assert_eq!(result, home.join("test").join("path"));
    }

    #[test]
    fn test_expand_absolute() {
        assert_eq!(expand("/absolute/path"), PathBuf::from("/absolute/path"));
    }

    #[test]
    fn test_expand_unknown_env_var_unchanged() {
        let result = expand("/path/$NONEXISTENT_GUARDRAILS_VAR_12345/file");
        assert_eq!(
            result,
            PathBuf::from("/path/$NONEXISTENT_GUARDRAILS_VAR_12345/file")
        );
    }
}
