use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

pub use crate::config::entrypoint::{EntryPointRule, StagedSource};
pub use crate::config::language::{CompileConfig, FileExtension, Language, RunConfig};
use crate::types::ContainerLimits;

pub mod entrypoint;
pub mod language;
mod loader;

/// Example configuration embedded at compile time.
///
/// Library users can access this to generate a starter config file.
pub const EXAMPLE_CONFIG: &str = include_str!("../../kiln.example.toml");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid characters in file extension")]
    InvalidFileExtChars,

    #[error("failed to read config file at {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] config::ConfigError),

    #[error("language '{0}' not found in configuration")]
    LanguageNotFound(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Config for Kiln
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Path to the docker client binary (uses PATH if not specified).
    #[serde(default)]
    pub docker_path: Option<PathBuf>,

    /// Directory under which per-execution workspaces are created.
    ///
    /// Each execution gets its own uniquely named subdirectory; nothing
    /// outlives the request that created it.
    #[serde(default = "default_workspace_root")]
    pub workspace_root: PathBuf,

    /// Default resource ceilings applied to every execution.
    /// Per-language compile/run sections may override individual fields.
    #[serde(default)]
    pub limits: ContainerLimits,

    /// Language profiles keyed by language ID
    #[serde(default)]
    pub languages: HashMap<String, Language>,
}

impl Config {
    /// Create a new config with the embedded default languages
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty config with no languages
    pub fn empty() -> Self {
        Self {
            docker_path: None,
            workspace_root: default_workspace_root(),
            limits: ContainerLimits::default(),
            languages: HashMap::new(),
        }
    }

    /// Get a language by ID
    pub fn get_language(&self, id: &str) -> Result<&Language, ConfigError> {
        self.languages
            .get(id)
            .ok_or_else(|| ConfigError::LanguageNotFound(id.to_string()))
    }

    /// Get the path to the docker client binary
    pub fn docker_binary(&self) -> PathBuf {
        self.docker_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("docker"))
    }

    /// Merge the global ceilings with per-step overrides
    pub fn effective_limits(&self, overrides: Option<&ContainerLimits>) -> ContainerLimits {
        match overrides {
            Some(limits) => self.limits.with_overrides(limits),
            None => self.limits.clone(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::parse_toml(EXAMPLE_CONFIG).expect("embedded default config should be valid")
    }
}

fn default_workspace_root() -> PathBuf {
    std::env::temp_dir().join("kiln")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_language_found() {
        let config = Config::default();
        let result = config.get_language("python");
        assert!(result.is_ok());
        assert_eq!(result.unwrap().name, "Python 3.11");
    }

    #[test]
    fn get_language_not_found() {
        let config = Config::default();
        let result = config.get_language("ruby");
        assert!(result.is_err());
        match result {
            Err(ConfigError::LanguageNotFound(name)) => assert_eq!(name, "ruby"),
            _ => panic!("expected LanguageNotFound error"),
        }
    }

    #[test]
    fn get_language_empty_config() {
        let config = Config::empty();
        assert!(config.get_language("python").is_err());
    }

    #[test]
    fn docker_binary_default() {
        let config = Config::empty();
        assert_eq!(config.docker_binary(), PathBuf::from("docker"));
    }

    #[test]
    fn docker_binary_custom_path() {
        let config = Config {
            docker_path: Some(PathBuf::from("/usr/local/bin/docker")),
            ..Config::empty()
        };
        assert_eq!(
            config.docker_binary(),
            PathBuf::from("/usr/local/bin/docker")
        );
    }

    #[test]
    fn effective_limits_no_override() {
        let config = Config::default();
        let result = config.effective_limits(None);
        assert_eq!(result.memory_mb, config.limits.memory_mb);
        assert_eq!(result.wall_time_secs, config.limits.wall_time_secs);
    }

    #[test]
    fn effective_limits_with_override() {
        let config = Config::default();
        let overrides = ContainerLimits::none().with_memory_mb(512).with_cpus(2.0);
        let result = config.effective_limits(Some(&overrides));
        assert_eq!(result.memory_mb, Some(512));
        assert_eq!(result.cpus, Some(2.0));
        // Unset fields come from the global defaults
        assert_eq!(result.wall_time_secs, config.limits.wall_time_secs);
    }

    #[test]
    fn config_new_has_languages() {
        let config = Config::new();
        assert!(!config.languages.is_empty());
    }

    #[test]
    fn config_empty_has_no_languages() {
        let config = Config::empty();
        assert!(config.languages.is_empty());
    }

    #[test]
    fn config_empty_has_default_limits() {
        let config = Config::empty();
        assert!(config.limits.wall_time_secs.is_some());
    }

    #[test]
    fn embedded_config_covers_supported_set() {
        let config = Config::default();
        for id in ["python", "javascript", "typescript", "java", "c", "cpp"] {
            assert!(config.languages.contains_key(id), "missing language {id}");
        }
    }

    #[test]
    fn embedded_java_profile_derives_entry_point() {
        let config = Config::default();
        let java = config.get_language("java").unwrap();
        assert!(matches!(
            java.entry_point,
            EntryPointRule::PublicClass { .. }
        ));
        assert!(java.is_compiled());
    }

    #[test]
    fn embedded_compiled_profiles_have_artifacts() {
        let config = Config::default();
        for id in ["c", "cpp"] {
            let lang = config.get_language(id).unwrap();
            let compile = lang.compile.as_ref().expect("compiled language");
            assert_eq!(compile.output_name.as_deref(), Some("main"));
        }
    }
}
