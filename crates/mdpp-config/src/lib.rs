//! Configuration management for mdpp.
//!
//! Parses `mdpp.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories. The directory
//! containing the discovered config file doubles as the project root for
//! include resolution.
//!
//! CLI settings can be applied during load via [`CliSettings`].

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "mdpp.toml";

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override the project root for include resolution.
    pub root: Option<PathBuf>,
    /// Override strict mode (warnings invalidate the document).
    pub strict: Option<bool>,
    /// Override maximum include nesting depth.
    pub max_include_depth: Option<usize>,
    /// Override maximum total includes per document.
    pub max_includes: Option<usize>,
}

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Project configuration (paths are relative strings from TOML).
    project: ProjectConfigRaw,
    /// Include resolution limits.
    pub includes: IncludesConfig,
    /// Validation configuration.
    pub validate: ValidateConfig,
    /// Alias generation configuration.
    pub aliases: AliasesConfig,

    /// Resolved project configuration (set after loading).
    #[serde(skip)]
    pub project_resolved: ProjectConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Raw project configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ProjectConfigRaw {
    root: Option<String>,
}

/// Resolved project configuration with absolute paths.
#[derive(Debug, Default)]
pub struct ProjectConfig {
    /// Root directory that include paths may not escape.
    pub root: PathBuf,
}

/// Include resolution limits.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct IncludesConfig {
    /// Maximum include nesting depth.
    pub max_depth: usize,
    /// Maximum total includes resolved per document.
    pub max_total: usize,
}

impl Default for IncludesConfig {
    fn default() -> Self {
        Self {
            max_depth: 10,
            max_total: 256,
        }
    }
}

/// Validation configuration.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ValidateConfig {
    /// Treat warnings as errors.
    pub strict: bool,
}

/// Alias generation configuration for `add-aliases`.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AliasesConfig {
    /// Heading levels that receive generated aliases (1-6).
    pub levels: Vec<u8>,
    /// Prefix prepended to every generated alias.
    pub prefix: String,
}

impl Default for AliasesConfig {
    fn default() -> Self {
        Self {
            levels: vec![1, 2],
            prefix: String::new(),
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `mdpp.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing
    /// CLI arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }
        config.validate()?;

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(root) = &settings.root {
            self.project_resolved.root.clone_from(root);
        }
        if let Some(strict) = settings.strict {
            self.validate.strict = strict;
        }
        if let Some(max_depth) = settings.max_include_depth {
            self.includes.max_depth = max_depth;
        }
        if let Some(max_total) = settings.max_includes {
            self.includes.max_total = max_total;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            project: ProjectConfigRaw::default(),
            includes: IncludesConfig::default(),
            validate: ValidateConfig::default(),
            aliases: AliasesConfig::default(),
            project_resolved: ProjectConfig {
                root: base.to_path_buf(),
            },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any value is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.includes.max_depth == 0 {
            return Err(ConfigError::Validation(
                "includes.max_depth must be greater than 0".to_owned(),
            ));
        }
        if self.includes.max_total == 0 {
            return Err(ConfigError::Validation(
                "includes.max_total must be greater than 0".to_owned(),
            ));
        }
        if self.aliases.levels.is_empty() {
            return Err(ConfigError::Validation(
                "aliases.levels cannot be empty".to_owned(),
            ));
        }
        if let Some(level) = self.aliases.levels.iter().find(|l| !(1..=6).contains(*l)) {
            return Err(ConfigError::Validation(format!(
                "aliases.levels entries must be between 1 and 6, got {level}"
            )));
        }
        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        self.project_resolved = ProjectConfig {
            root: match self.project.root.as_deref() {
                Some(root) => config_dir.join(root),
                None => config_dir.to_path_buf(),
            },
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/test"));
        assert_eq!(config.project_resolved.root, PathBuf::from("/test"));
        assert_eq!(config.includes.max_depth, 10);
        assert_eq!(config.includes.max_total, 256);
        assert!(!config.validate.strict);
        assert_eq!(config.aliases.levels, vec![1, 2]);
        assert_eq!(config.aliases.prefix, "");
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.includes.max_depth, 10);
        assert!(!config.validate.strict);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[project]
root = "docs"

[includes]
max_depth = 4
max_total = 32

[validate]
strict = true

[aliases]
levels = [1, 2, 3]
prefix = "doc-"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.includes.max_depth, 4);
        assert_eq!(config.includes.max_total, 32);
        assert!(config.validate.strict);
        assert_eq!(config.aliases.levels, vec![1, 2, 3]);
        assert_eq!(config.aliases.prefix, "doc-");
    }

    #[test]
    fn test_resolve_paths() {
        let toml = r#"
[project]
root = "documentation"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));
        assert_eq!(
            config.project_resolved.root,
            PathBuf::from("/project/documentation")
        );
    }

    #[test]
    fn test_resolve_paths_defaults_to_config_dir() {
        let mut config: Config = toml::from_str("").unwrap();
        config.resolve_paths(Path::new("/project"));
        assert_eq!(config.project_resolved.root, PathBuf::from("/project"));
    }

    #[test]
    fn test_apply_cli_settings() {
        let mut config = Config::default_with_base(Path::new("/test"));
        let overrides = CliSettings {
            root: Some(PathBuf::from("/custom/docs")),
            strict: Some(true),
            max_include_depth: Some(3),
            ..Default::default()
        };

        config.apply_cli_settings(&overrides);

        assert_eq!(config.project_resolved.root, PathBuf::from("/custom/docs"));
        assert!(config.validate.strict);
        assert_eq!(config.includes.max_depth, 3);
        assert_eq!(config.includes.max_total, 256); // Unchanged
    }

    #[test]
    fn test_apply_cli_settings_empty() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.apply_cli_settings(&CliSettings::default());
        assert_eq!(config.project_resolved.root, PathBuf::from("/test"));
        assert!(!config.validate.strict);
    }

    #[test]
    fn test_validate_zero_depth_rejected() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.includes.max_depth = 0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("max_depth"));
    }

    #[test]
    fn test_validate_alias_level_out_of_range() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.aliases.levels = vec![1, 7];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("between 1 and 6"));
    }

    #[test]
    fn test_load_explicit_path_missing() {
        let err = Config::load(Some(Path::new("/nonexistent/mdpp.toml")), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_from_file_resolves_root() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mdpp.toml");
        std::fs::write(&path, "[project]\nroot = \"docs\"\n").unwrap();

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.project_resolved.root, dir.path().join("docs"));
        assert_eq!(config.config_path, Some(path));
    }
}
