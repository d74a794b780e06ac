//! Config resolution: explicit path → env → user config dir → defaults.

use std::path::{Path, PathBuf};

use crate::engine::EngineConfig;
use crate::validate::ValidationError;

/// Environment variable naming a config file.
pub const CONFIG_ENV_VAR: &str = "PROBS_CONFIG";

/// Directory name under the platform config dir.
pub const CONFIG_DIR_NAME: &str = "probs";

/// File name inside [`CONFIG_DIR_NAME`].
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Candidate locations, in priority order.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    /// Path given by the caller; an error if it cannot be loaded.
    pub explicit: Option<PathBuf>,

    /// Value of [`CONFIG_ENV_VAR`]; an error if set but unloadable.
    pub env: Option<PathBuf>,

    /// Platform config directory; skipped if the file does not exist.
    pub user_config_dir: Option<PathBuf>,
}

impl ConfigPaths {
    /// Candidates from the process environment.
    pub fn from_env(explicit: Option<PathBuf>) -> Self {
        Self {
            explicit,
            env: std::env::var_os(CONFIG_ENV_VAR)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            user_config_dir: dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME)),
        }
    }

    fn user_file(&self) -> Option<PathBuf> {
        self.user_config_dir
            .as_ref()
            .map(|d| d.join(CONFIG_FILE_NAME))
    }
}

/// Where the resolved config came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Explicit(PathBuf),
    Env(PathBuf),
    UserConfig(PathBuf),
    Defaults,
}

/// A loaded, validated config and its origin.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: EngineConfig,
    pub source: ConfigSource,
}

/// Resolve the engine configuration.
///
/// The first candidate that is present wins. A present candidate that fails
/// to load or validate is an error rather than a silent fallback.
pub fn resolve_config(paths: &ConfigPaths) -> Result<ResolvedConfig, ValidationError> {
    if let Some(path) = &paths.explicit {
        return load(path).map(|config| ResolvedConfig {
            config,
            source: ConfigSource::Explicit(path.clone()),
        });
    }

    if let Some(path) = &paths.env {
        return load(path).map(|config| ResolvedConfig {
            config,
            source: ConfigSource::Env(path.clone()),
        });
    }

    if let Some(path) = paths.user_file() {
        if path.is_file() {
            return load(&path).map(|config| ResolvedConfig {
                config,
                source: ConfigSource::UserConfig(path),
            });
        }
    }

    Ok(ResolvedConfig {
        config: EngineConfig::default(),
        source: ConfigSource::Defaults,
    })
}

fn load(path: &Path) -> Result<EngineConfig, ValidationError> {
    EngineConfig::load_validated(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn nothing_configured_gives_defaults() {
        let resolved = resolve_config(&ConfigPaths::default()).unwrap();
        assert_eq!(resolved.source, ConfigSource::Defaults);
        assert_eq!(resolved.config, EngineConfig::default());
    }

    #[test]
    fn explicit_beats_env_and_user_dir() {
        let tmp = TempDir::new().unwrap();
        let explicit = write_config(tmp.path(), "a.json", r#"{"default_entropy_base": 10.0}"#);
        let env = write_config(tmp.path(), "b.json", r#"{"default_entropy_base": 3.0}"#);
        write_config(tmp.path(), CONFIG_FILE_NAME, "{}");

        let paths = ConfigPaths {
            explicit: Some(explicit.clone()),
            env: Some(env),
            user_config_dir: Some(tmp.path().to_path_buf()),
        };
        let resolved = resolve_config(&paths).unwrap();
        assert_eq!(resolved.source, ConfigSource::Explicit(explicit));
        assert_eq!(resolved.config.default_entropy_base, 10.0);
    }

    #[test]
    fn env_beats_user_dir() {
        let tmp = TempDir::new().unwrap();
        let env = write_config(tmp.path(), "env.json", r#"{"max_assignment_space": 1024}"#);
        write_config(tmp.path(), CONFIG_FILE_NAME, "{}");

        let paths = ConfigPaths {
            explicit: None,
            env: Some(env.clone()),
            user_config_dir: Some(tmp.path().to_path_buf()),
        };
        let resolved = resolve_config(&paths).unwrap();
        assert_eq!(resolved.source, ConfigSource::Env(env));
        assert_eq!(resolved.config.max_assignment_space, 1024);
    }

    #[test]
    fn user_dir_used_when_file_exists() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(
            tmp.path(),
            CONFIG_FILE_NAME,
            r#"{"tolerances": {"sum": 1e-4}}"#,
        );
        let paths = ConfigPaths {
            user_config_dir: Some(tmp.path().to_path_buf()),
            ..Default::default()
        };
        let resolved = resolve_config(&paths).unwrap();
        assert_eq!(resolved.source, ConfigSource::UserConfig(path));
        assert_eq!(resolved.config.tolerances.sum, 1e-4);
    }

    #[test]
    fn missing_user_file_falls_through() {
        let tmp = TempDir::new().unwrap();
        let paths = ConfigPaths {
            user_config_dir: Some(tmp.path().join("absent")),
            ..Default::default()
        };
        let resolved = resolve_config(&paths).unwrap();
        assert_eq!(resolved.source, ConfigSource::Defaults);
    }

    #[test]
    fn missing_explicit_file_is_error() {
        let tmp = TempDir::new().unwrap();
        let paths = ConfigPaths {
            explicit: Some(tmp.path().join("nope.json")),
            ..Default::default()
        };
        let err = resolve_config(&paths).unwrap_err();
        assert!(matches!(err, ValidationError::IoError(_)));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let tmp = TempDir::new().unwrap();
        let env = write_config(tmp.path(), "bad.json", r#"{"default_entropy_base": 1.0}"#);
        let paths = ConfigPaths {
            env: Some(env),
            ..Default::default()
        };
        let err = resolve_config(&paths).unwrap_err();
        assert!(matches!(err, ValidationError::Invalid(_)));
        assert!(err.to_string().contains("default_entropy_base"));
    }
}
