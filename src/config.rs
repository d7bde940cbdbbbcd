use crate::routes::Route;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A validation error in the configuration or a submitted form.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]: {}", self.field, self.message)
    }
}

fn default_true() -> bool {
    true
}

/// Configuration for the audit log.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuditConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Defaults to `<data-dir>/audit` when unset.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
        }
    }
}

/// Configuration for the interactive shell.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PortalConfig {
    /// Prompt before deleting a directory entry.
    #[serde(default = "default_true")]
    pub confirm_delete: bool,
    /// Route to land on at startup when a valid session already exists.
    /// Defaults to the session role's dashboard.
    #[serde(default)]
    pub default_route: Option<String>,
    /// Keep readline history in the data directory.
    #[serde(default = "default_true")]
    pub history: bool,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            confirm_delete: true,
            default_route: None,
            history: true,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    pub portal: PortalConfig,
}

impl Config {
    /// Load configuration from default paths.
    /// Priority: local (.toolbox/config.local.toml) > project
    /// (.toolbox/config.toml) > user (~/.toolbox/config.toml).
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".toolbox").join("config.toml");
            if user_config.exists() {
                let user = Self::load_from(&user_config)?;
                config.merge(user);
            }
        }

        let project_config = Path::new(".toolbox").join("config.toml");
        if project_config.exists() {
            let project = Self::load_from(&project_config)?;
            config.merge(project);
        }

        // Local overrides, expected to be gitignored.
        let local_config = Path::new(".toolbox").join("config.local.toml");
        if local_config.exists() {
            let local = Self::load_from(&local_config)?;
            config.merge(local);
        }

        Ok(config)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Merge another config into this one (other takes priority).
    /// Sections are taken wholesale when the other config was loaded;
    /// scalars wrapped in Option are overridden only when set.
    pub fn merge(&mut self, other: Config) {
        if other.data_dir.is_some() {
            self.data_dir = other.data_dir;
        }
        self.audit = other.audit;
        self.portal = other.portal;
    }

    /// The storage root: explicit setting, else `~/.toolbox`, else a
    /// `.toolbox` directory next to the process.
    pub fn resolve_data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }
        dirs::home_dir()
            .map(|home| home.join(".toolbox"))
            .unwrap_or_else(|| PathBuf::from(".toolbox"))
    }

    /// The audit log directory for a given data dir.
    pub fn resolve_audit_dir(&self, data_dir: &Path) -> PathBuf {
        self.audit
            .dir
            .clone()
            .unwrap_or_else(|| data_dir.join("audit"))
    }

    /// Validate configuration and return any errors found.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Some(route) = &self.portal.default_route {
            if Route::parse(route).is_none() {
                errors.push(ValidationError {
                    field: "portal.default_route".to_string(),
                    message: format!(
                        "Unknown route '{}', expected one of: {}",
                        route,
                        Route::all()
                            .iter()
                            .map(|r| r.path())
                            .collect::<Vec<_>>()
                            .join(", ")
                    ),
                });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.audit.enabled);
        assert!(config.portal.confirm_delete);
        assert!(config.portal.history);
        assert_eq!(config.portal.default_route, None);
    }

    #[test]
    fn test_parse_toml_sections() {
        let config: Config = toml::from_str(
            r#"
            data_dir = "/tmp/portal"

            [audit]
            enabled = false

            [portal]
            confirm_delete = false
            default_route = "/user/profile"
            "#,
        )
        .unwrap();
        assert_eq!(config.data_dir.as_deref(), Some(Path::new("/tmp/portal")));
        assert!(!config.audit.enabled);
        assert!(!config.portal.confirm_delete);
        // Unset fields inside a present section still take their defaults.
        assert!(config.portal.history);
    }

    #[test]
    fn test_merge_keeps_base_data_dir_when_other_unset() {
        let mut base = Config {
            data_dir: Some(PathBuf::from("/base")),
            ..Config::default()
        };
        base.merge(Config::default());
        assert_eq!(base.data_dir.as_deref(), Some(Path::new("/base")));
    }

    #[test]
    fn test_merge_overrides_when_other_set() {
        let mut base = Config {
            data_dir: Some(PathBuf::from("/base")),
            ..Config::default()
        };
        let other = Config {
            data_dir: Some(PathBuf::from("/other")),
            ..Config::default()
        };
        base.merge(other);
        assert_eq!(base.data_dir.as_deref(), Some(Path::new("/other")));
    }

    #[test]
    fn test_resolve_audit_dir_defaults_under_data_dir() {
        let config = Config::default();
        let dir = config.resolve_audit_dir(Path::new("/tmp/portal"));
        assert_eq!(dir, Path::new("/tmp/portal").join("audit"));

        let explicit = Config {
            audit: AuditConfig {
                enabled: true,
                dir: Some(PathBuf::from("/var/log/portal")),
            },
            ..Config::default()
        };
        assert_eq!(
            explicit.resolve_audit_dir(Path::new("/tmp/portal")),
            PathBuf::from("/var/log/portal")
        );
    }

    #[test]
    fn test_validate_valid_config() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());
        config.portal.default_route = Some("/admin/dashboard".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_unknown_default_route() {
        let mut config = Config::default();
        config.portal.default_route = Some("/nowhere".to_string());
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].field.contains("default_route"));
        assert!(errors[0].message.contains("/nowhere"));
    }
}
