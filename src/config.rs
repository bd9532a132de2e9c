//! Booth configuration
//!
//! Loaded once at startup from a TOML file. Every field has a default, so a
//! missing or empty file gives a working (if unauthenticated) booth.
//!
//! ```toml
//! default_mode = "anime"
//!
//! [gemini]
//! model = "gemini-2.0-flash-preview-image-generation"
//! max_retries = 3
//!
//! [gif]
//! size = 512
//!
//! [[modes]]
//! id = "pirate"
//! name = "Pirate"
//! icon = "🏴‍☠️"
//! instruction = "Make the person look like a pirate."
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::catalog::{ModeCatalog, ModeDescriptor};
use crate::error::ConfigError;
use crate::state::ModeSelection;

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-preview-image-generation";

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_timeout_secs() -> u64 {
    123
}

fn default_max_retries() -> u32 {
    5
}

fn default_base_delay_ms() -> u64 {
    1233
}

fn default_concurrency() -> usize {
    2
}

fn default_gif_size() -> u32 {
    512
}

fn default_frame_delay_ms() -> u32 {
    833
}

fn default_true() -> bool {
    true
}

/// Settings of the Gemini transformation gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeminiConfig {
    #[serde(default = "default_model")]
    pub model: String,
    /// Falls back to `GEMINI_API_KEY`, then `GOOGLE_API_KEY`
    #[serde(default)]
    pub api_key: Option<String>,
    /// Per-attempt timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Total attempts per transformation
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Backoff before retry n is `base_delay_ms * 2^n`
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Requests allowed in flight at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl GeminiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            concurrency: default_concurrency(),
        }
    }
}

/// Settings of the GIF assembly gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GifConfig {
    /// Square edge length in pixels
    #[serde(default = "default_gif_size")]
    pub size: u32,
    #[serde(default = "default_frame_delay_ms")]
    pub frame_delay_ms: u32,
}

impl Default for GifConfig {
    fn default() -> Self {
        Self {
            size: default_gif_size(),
            frame_delay_ms: default_frame_delay_ms(),
        }
    }
}

/// How captured frames are normalized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Center-crop to a square
    #[serde(default = "default_true")]
    pub square: bool,
    /// Flip horizontally, like a selfie camera preview
    #[serde(default)]
    pub mirror: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            square: true,
            mirror: false,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BoothConfig {
    /// Mode active when the session starts; first catalog entry if unset
    #[serde(default)]
    pub default_mode: Option<String>,
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub gif: GifConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    /// Replaces the built-in catalog when non-empty
    #[serde(default)]
    pub modes: Vec<ModeDescriptor>,
}

impl BoothConfig {
    /// Default location: `<config dir>/photobooth/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut path| {
            path.push("photobooth");
            path.push("config.toml");
            path
        })
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: BoothConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                tracing::debug!(path = %path.display(), "Loaded config");
                Self::from_toml(&text)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Read {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.gemini.concurrency == 0 {
            return Err(ConfigError::Validation("gemini.concurrency must be at least 1".into()));
        }
        if self.gemini.max_retries == 0 {
            return Err(ConfigError::Validation("gemini.max_retries must be at least 1".into()));
        }
        if self.gif.size == 0 {
            return Err(ConfigError::Validation("gif.size must be at least 1".into()));
        }
        // Surfaces catalog problems and an unknown default mode at load time
        let catalog = self.catalog()?;
        self.initial_mode(&catalog)?;
        Ok(())
    }

    /// The configured catalog, or the built-in one
    pub fn catalog(&self) -> Result<ModeCatalog, ConfigError> {
        if self.modes.is_empty() {
            Ok(ModeCatalog::builtin())
        } else {
            ModeCatalog::from_entries(self.modes.clone())
        }
    }

    /// Mode a fresh session starts in
    pub fn initial_mode(&self, catalog: &ModeCatalog) -> Result<ModeSelection, ConfigError> {
        match &self.default_mode {
            Some(id) => catalog
                .parse_selection(id)
                .map_err(|e| ConfigError::Validation(e.to_string())),
            None => Ok(ModeSelection::Catalog(catalog.first().id.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = BoothConfig::from_toml("").unwrap();
        assert_eq!(config, BoothConfig::default());
        assert_eq!(config.gemini.model, DEFAULT_MODEL);
        assert_eq!(config.gemini.concurrency, 2);
        assert_eq!(config.gif.size, 512);
        assert!(config.capture.square);
        assert!(!config.capture.mirror);

        let catalog = config.catalog().unwrap();
        assert_eq!(
            config.initial_mode(&catalog).unwrap(),
            ModeSelection::Catalog("renaissance".into())
        );
    }

    #[test]
    fn test_overrides() {
        let config = BoothConfig::from_toml(
            r#"
default_mode = "random"

[gemini]
max_retries = 2
timeout_secs = 30

[gif]
frame_delay_ms = 250

[capture]
mirror = true
"#,
        )
        .unwrap();
        assert_eq!(config.gemini.max_retries, 2);
        assert_eq!(config.gemini.timeout(), Duration::from_secs(30));
        assert_eq!(config.gemini.base_delay_ms, 1233);
        assert_eq!(config.gif.frame_delay_ms, 250);
        assert!(config.capture.mirror);

        let catalog = config.catalog().unwrap();
        assert_eq!(config.initial_mode(&catalog).unwrap(), ModeSelection::Random);
    }

    #[test]
    fn test_custom_catalog_replaces_builtin() {
        let config = BoothConfig::from_toml(
            r#"
default_mode = "pirate"

[[modes]]
id = "pirate"
name = "Pirate"
icon = "🏴"
instruction = "Make the person look like a pirate."

[[modes]]
id = "robot"
name = "Robot"
icon = "🤖"
prompt = "Make the person look like a robot."
"#,
        )
        .unwrap();
        let catalog = config.catalog().unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.first().id, "pirate");
        assert_eq!(
            catalog.resolve("robot", ""),
            Some("Make the person look like a robot.")
        );
    }

    #[test]
    fn test_invalid_configs_are_rejected() {
        assert!(BoothConfig::from_toml("default_mode = \"vaporwave\"").is_err());
        assert!(BoothConfig::from_toml("[gemini]\nconcurrency = 0").is_err());
        assert!(BoothConfig::from_toml(
            "[[modes]]\nid = \"custom\"\nname = \"C\"\nicon = \"\"\ninstruction = \"x\""
        )
        .is_err());
        assert!(matches!(
            BoothConfig::from_toml("gif = 3"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        // Missing file falls back to defaults
        assert_eq!(BoothConfig::load(&path).unwrap(), BoothConfig::default());

        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[gif]\nsize = 256").unwrap();
        drop(file);
        assert_eq!(BoothConfig::load(&path).unwrap().gif.size, 256);
    }
}
