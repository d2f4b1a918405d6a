//! Configuration file loading for the CLI.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use vidmeta_core::config::FetchConfig;

use crate::cli::Args;

/// Loaded configuration with its origin.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Path that was consulted, if any.
    pub path: Option<PathBuf>,
    /// Effective configuration.
    pub config: FetchConfig,
    /// True when `path` existed and was parsed.
    pub loaded_from_file: bool,
}

/// Resolves the default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/vidmeta/config.json`
/// 2. `$HOME/.config/vidmeta/config.json`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    config_path_from(
        env_var_non_empty_os("XDG_CONFIG_HOME"),
        env_var_non_empty_os("HOME"),
    )
}

fn config_path_from(xdg_config_home: Option<OsString>, home: Option<OsString>) -> Option<PathBuf> {
    if let Some(xdg_config_home) = xdg_config_home {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("vidmeta")
                .join("config.json"),
        );
    }
    let home = home?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("vidmeta")
            .join("config.json"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the config named by `--config`, else the default path, else defaults.
///
/// An explicit path must exist; a missing default file is not an error.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        if !path.exists() {
            bail!("Config file '{}' does not exist", path.display());
        }
        return Ok(LoadedConfig {
            path: Some(path.to_path_buf()),
            config: load_file_config(path)?,
            loaded_from_file: true,
        });
    }

    let path = resolve_default_config_path();
    match path.as_deref() {
        Some(path_ref) if path_ref.exists() => Ok(LoadedConfig {
            config: load_file_config(path_ref)?,
            path,
            loaded_from_file: true,
        }),
        _ => Ok(LoadedConfig {
            path,
            config: FetchConfig::default(),
            loaded_from_file: false,
        }),
    }
}

fn load_file_config(path: &Path) -> Result<FetchConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    FetchConfig::from_json_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

/// Applies CLI overrides on top of file values and validates the result.
pub fn apply_cli_overrides(mut config: FetchConfig, args: &Args) -> Result<FetchConfig> {
    if let Some(max_retries) = args.max_retries {
        config.transport.max_retries = max_retries;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.transport.timeout_ms = timeout_ms;
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    config
        .validate()
        .context("Invalid configuration after applying command-line overrides")?;
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use clap::Parser;
    use tempfile::NamedTempFile;

    use super::*;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_config_path_prefers_xdg() {
        let path = config_path_from(Some("/xdg".into()), Some("/home/u".into())).unwrap();
        assert_eq!(path, PathBuf::from("/xdg/vidmeta/config.json"));
    }

    #[test]
    fn test_config_path_falls_back_to_home() {
        let path = config_path_from(None, Some("/home/u".into())).unwrap();
        assert_eq!(path, PathBuf::from("/home/u/.config/vidmeta/config.json"));
        assert!(config_path_from(None, None).is_none());
    }

    #[test]
    fn test_load_explicit_file() {
        let file = write_config(r#"{"transport": {"timeout_ms": 2500}, "seed": 9}"#);
        let loaded = load_config(Some(file.path())).unwrap();
        assert!(loaded.loaded_from_file);
        assert_eq!(loaded.config.transport.timeout_ms, 2500);
        assert_eq!(loaded.config.seed, Some(9));
        assert_eq!(loaded.config.transport.max_retries, 3);
    }

    #[test]
    fn test_load_explicit_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.json");
        let err = load_config(Some(&missing)).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_load_malformed_file_fails_with_context() {
        let file = write_config("{ not json");
        let err = load_config(Some(file.path())).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse config file"));
    }

    #[test]
    fn test_cli_overrides_win() {
        let args =
            Args::try_parse_from(["vidmeta", "--max-retries", "5", "--timeout-ms", "700", "--seed", "1"])
                .unwrap();
        let config = apply_cli_overrides(FetchConfig::default(), &args).unwrap();
        assert_eq!(config.transport.max_retries, 5);
        assert_eq!(config.transport.timeout_ms, 700);
        assert_eq!(config.seed, Some(1));
    }

    #[test]
    fn test_overrides_are_validated() {
        let args = Args::try_parse_from(["vidmeta"]).unwrap();
        let config = FetchConfig {
            fingerprints: Vec::new(),
            ..FetchConfig::default()
        };
        let err = apply_cli_overrides(config, &args).unwrap_err();
        assert!(format!("{err:#}").contains("fingerprints"));
    }
}
