//! Configuration system for Transformer Primer.
//!
//! Uses `figment` for layered configuration: defaults -> config file -> environment -> CLI args.
//! Configuration is loaded from `~/.config/primer/config.toml` and/or `.primer/config.toml`
//! in the workspace directory.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AttentionError, ConfigError};
use crate::scroll_spy::ScrollSpyOptions;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrimerConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub playground: PlaygroundConfig,
    #[serde(default)]
    pub scroll_spy: ScrollSpyOptions,
}

/// HTTP and WebSocket server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Maximum concurrent WebSocket connections.
    pub max_connections: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            max_connections: 64,
        }
    }
}

impl ServerConfig {
    /// `host:port` suitable for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Bounds and defaults for the attention playground form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaygroundConfig {
    pub default_heads: usize,
    pub max_heads: usize,
    pub default_temperature: f64,
    pub min_temperature: f64,
    pub max_temperature: f64,
    /// Longest sentence, in tokens, a request may visualize.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    /// Split `. , ! ? ; :` into their own tokens.
    pub split_punctuation: bool,
    /// Fixed RNG seed for the random heads; entropy when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for PlaygroundConfig {
    fn default() -> Self {
        Self {
            default_heads: 4,
            max_heads: 12,
            default_temperature: 1.0,
            min_temperature: 0.1,
            max_temperature: 2.0,
            max_tokens: default_max_tokens(),
            split_punctuation: true,
            seed: None,
        }
    }
}

fn default_max_tokens() -> usize {
    128
}

impl PlaygroundConfig {
    /// Reject a head count or temperature the playground form would not offer.
    ///
    /// The generator itself accepts any positive values; these bounds are
    /// the user-facing limits.
    pub fn check_bounds(&self, heads: usize, temperature: f64) -> Result<(), AttentionError> {
        if heads < 1 || heads > self.max_heads {
            return Err(AttentionError::invalid(
                "heads",
                format!("must be between 1 and {}, got {}", self.max_heads, heads),
            ));
        }
        if !temperature.is_finite()
            || temperature < self.min_temperature
            || temperature > self.max_temperature
        {
            return Err(AttentionError::invalid(
                "temperature",
                format!(
                    "must be between {} and {}, got {}",
                    self.min_temperature, self.max_temperature, temperature
                ),
            ));
        }
        Ok(())
    }

    /// Check for inconsistent settings and return a list of warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.max_heads == 0 {
            warnings.push("max_heads is 0; every attention request will be rejected".to_string());
        }
        if self.max_tokens == 0 {
            warnings.push("max_tokens is 0; only empty sentences can be visualized".to_string());
        }
        if self.default_heads == 0 || self.default_heads > self.max_heads {
            warnings.push(format!(
                "default_heads {} is outside 1..={}",
                self.default_heads, self.max_heads
            ));
        }
        if self.min_temperature <= 0.0 {
            warnings.push(format!(
                "min_temperature {} must be positive",
                self.min_temperature
            ));
        }
        if self.min_temperature > self.max_temperature {
            warnings.push(format!(
                "min_temperature {} exceeds max_temperature {}",
                self.min_temperature, self.max_temperature
            ));
        }
        if self.default_temperature < self.min_temperature
            || self.default_temperature > self.max_temperature
        {
            warnings.push(format!(
                "default_temperature {} is outside {}..={}",
                self.default_temperature, self.min_temperature, self.max_temperature
            ));
        }

        warnings
    }
}

impl PrimerConfig {
    /// Warnings across every section, prefixed by the section name.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings: Vec<String> = self
            .playground
            .validate()
            .into_iter()
            .map(|w| format!("[playground] {}", w))
            .collect();

        if self.server.max_connections == 0 {
            warnings.push("[server] max_connections is 0; WebSocket clients will be refused".into());
        }
        if let Err(e) = self.scroll_spy.clone().validated() {
            warnings.push(format!("[scroll_spy] {}", e));
        }

        warnings
    }

    /// Render as TOML, as written by `primer config init`.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })
    }

    /// Parse a TOML document.
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })
    }
}

/// Path of the user-level config file, if a home directory is known.
pub fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "primer", "primer")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Path of the workspace-level config file.
pub fn workspace_config_path(workspace: &Path) -> PathBuf {
    workspace.join(".primer").join("config.toml")
}

/// Load configuration from all sources, merging them in priority order.
pub fn load_config(
    workspace: Option<&Path>,
    overrides: Option<&PrimerConfig>,
) -> Result<PrimerConfig, Box<figment::Error>> {
    let mut figment = Figment::from(Serialized::defaults(PrimerConfig::default()));

    // User-level config
    if let Some(user_config) = user_config_path() {
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    // Workspace-level config
    if let Some(ws) = workspace {
        let ws_config = workspace_config_path(ws);
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    // Environment variables (PRIMER_SERVER__PORT, PRIMER_PLAYGROUND__MAX_HEADS, etc.)
    figment = figment.merge(Env::prefixed("PRIMER_").split("__"));

    // Explicit overrides
    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    figment.extract().map_err(Box::new)
}

/// Check whether any configuration file exists (user-level or workspace-level).
pub fn config_exists(workspace: Option<&Path>) -> bool {
    if user_config_path().is_some_and(|p| p.exists()) {
        return true;
    }
    workspace.is_some_and(|ws| workspace_config_path(ws).exists())
}

/// Write the default configuration to `<workspace>/.primer/config.toml`.
///
/// Refuses to overwrite an existing file unless `force` is set. Returns the
/// path written.
pub fn init_workspace_config(workspace: &Path, force: bool) -> Result<PathBuf, ConfigError> {
    let path = workspace_config_path(workspace);
    if path.exists() && !force {
        return Err(ConfigError::Invalid {
            message: format!("{} already exists (use --force to overwrite)", path.display()),
        });
    }
    let rendered = PrimerConfig::default().to_toml()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::Invalid {
            message: format!("cannot create {}: {}", parent.display(), e),
        })?;
    }
    std::fs::write(&path, rendered).map_err(|e| ConfigError::Invalid {
        message: format!("cannot write {}: {}", path.display(), e),
    })?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scroll_spy::{Boundary, Margin};

    #[test]
    fn test_default_config() {
        let config = PrimerConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.playground.default_heads, 4);
        assert_eq!(config.playground.max_heads, 12);
        assert_eq!(config.scroll_spy.threshold, 0.2);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_load_config_defaults() {
        let config = load_config(None, None).unwrap();
        assert_eq!(config.playground.min_temperature, 0.1);
        assert_eq!(config.playground.max_temperature, 2.0);
    }

    #[test]
    fn test_load_config_with_overrides() {
        let mut overrides = PrimerConfig::default();
        overrides.server.port = 8088;
        overrides.playground.seed = Some(7);

        let config = load_config(None, Some(&overrides)).unwrap();
        assert_eq!(config.server.port, 8088);
        assert_eq!(config.playground.seed, Some(7));
    }

    #[test]
    fn test_load_config_from_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let primer_dir = dir.path().join(".primer");
        std::fs::create_dir_all(&primer_dir).unwrap();
        std::fs::write(
            primer_dir.join("config.toml"),
            r#"
[server]
host = "0.0.0.0"
port = 9000
max_connections = 8

[playground]
default_heads = 2
max_heads = 6
default_temperature = 0.5
min_temperature = 0.1
max_temperature = 1.0
split_punctuation = false

[scroll_spy]
threshold = 0.5
margin = "-10% 0px"
"#,
        )
        .unwrap();

        assert!(config_exists(Some(dir.path())));
        let config = load_config(Some(dir.path()), None).unwrap();
        assert_eq!(config.server.bind_addr(), "0.0.0.0:9000");
        assert_eq!(config.playground.max_heads, 6);
        assert_eq!(config.playground.max_tokens, 128);
        assert!(!config.playground.split_punctuation);
        assert_eq!(config.scroll_spy.threshold, 0.5);
        assert_eq!(config.scroll_spy.boundary, Boundary::Viewport);
        assert_eq!(
            config.scroll_spy.margin,
            "-10% 0px".parse::<Margin>().unwrap()
        );
    }

    #[test]
    fn test_toml_roundtrip_preserves_margin() {
        let mut config = PrimerConfig::default();
        config.scroll_spy.margin = "5px 10%".parse().unwrap();
        let rendered = config.to_toml().unwrap();
        assert!(rendered.contains("[scroll_spy]"));
        let parsed = PrimerConfig::from_toml(&rendered).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_from_toml_rejects_bad_margin() {
        let err = PrimerConfig::from_toml("[scroll_spy]\nmargin = \"10em\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_init_workspace_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = init_workspace_config(dir.path(), false).unwrap();
        assert!(path.ends_with(".primer/config.toml"));

        let err = init_workspace_config(dir.path(), false).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert!(init_workspace_config(dir.path(), true).is_ok());

        let config = load_config(Some(dir.path()), None).unwrap();
        assert_eq!(config.playground, PlaygroundConfig::default());
    }

    #[test]
    fn test_check_bounds() {
        let playground = PlaygroundConfig::default();
        assert!(playground.check_bounds(1, 0.1).is_ok());
        assert!(playground.check_bounds(12, 2.0).is_ok());
        assert!(playground.check_bounds(0, 1.0).is_err());
        assert!(playground.check_bounds(13, 1.0).is_err());
        assert!(playground.check_bounds(4, 0.05).is_err());
        assert!(playground.check_bounds(4, 2.5).is_err());
        assert!(playground.check_bounds(4, f64::NAN).is_err());
    }

    #[test]
    fn test_validate_warnings() {
        let mut config = PrimerConfig::default();
        config.playground.default_heads = 20;
        config.playground.min_temperature = 3.0;
        config.server.max_connections = 0;
        let warnings = config.validate();
        assert!(warnings.iter().any(|w| w.contains("default_heads")));
        assert!(warnings.iter().any(|w| w.contains("exceeds max_temperature")));
        assert!(warnings.iter().any(|w| w.starts_with("[server]")));
    }

    #[test]
    fn test_max_tokens_from_toml() {
        let config = PrimerConfig::from_toml(
            r#"
[playground]
default_heads = 4
max_heads = 12
default_temperature = 1.0
min_temperature = 0.1
max_temperature = 2.0
split_punctuation = true
"#,
        )
        .unwrap();
        assert_eq!(config.playground.max_tokens, 128);

        let config = PrimerConfig::from_toml(
            r#"
[playground]
default_heads = 4
max_heads = 12
default_temperature = 1.0
min_temperature = 0.1
max_temperature = 2.0
split_punctuation = true
max_tokens = 0
"#,
        )
        .unwrap();
        assert!(
            config
                .validate()
                .iter()
                .any(|w| w.contains("max_tokens is 0"))
        );
    }
}
