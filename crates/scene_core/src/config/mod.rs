//! Runtime settings
//!
//! Arena capacities, asset directories, event limits, player tuning and the
//! viewport are plain serde structs. A settings file is TOML or RON; the
//! extension picks the format.

pub use serde::{Serialize, Deserialize};

mod runtime;

pub use runtime::{
    ArenaCapacities, DirectoryType, EventLimits, PathConfig, PlayerConfig, RuntimeConfig,
    ViewportConfig,
};

/// On-disk settings format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.toml`
    Toml,
    /// `.ron`
    Ron,
}

impl ConfigFormat {
    /// Format named by the extension of `path`
    pub fn from_path(path: &str) -> Result<Self, ConfigError> {
        match std::path::Path::new(path).extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("ron") => Ok(Self::Ron),
            _ => Err(ConfigError::UnsupportedFormat(path.to_string())),
        }
    }
}

/// Settings that can be read from and written to a settings file
///
/// Keys missing from the file keep their [`Default`] values.
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Read settings from `path`
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let format = ConfigFormat::from_path(path)?;
        let contents = std::fs::read_to_string(path)?;
        match format {
            ConfigFormat::Toml => toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            ConfigFormat::Ron => ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
        }
    }

    /// Write settings to `path`, pretty-printed
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = match ConfigFormat::from_path(path)? {
            ConfigFormat::Toml => {
                toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
            }
            ConfigFormat::Ron => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
        };
        std::fs::write(path, contents)?;
        Ok(())
    }
}

/// Settings file errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// Settings file could not be read or written
    #[error("Settings file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// File contents are not valid for the format
    #[error("Cannot parse settings: {0}")]
    Parse(String),

    /// Settings could not be encoded
    #[error("Cannot encode settings: {0}")]
    Serialize(String),

    /// Extension is neither `.toml` nor `.ron`
    #[error("Unsupported settings format: {0}")]
    UnsupportedFormat(String),

    /// Values failed validation
    #[error("Invalid settings: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_follows_extension() {
        assert_eq!(ConfigFormat::from_path("runtime.toml").unwrap(), ConfigFormat::Toml);
        assert_eq!(ConfigFormat::from_path("dir/runtime.ron").unwrap(), ConfigFormat::Ron);
        assert!(matches!(
            ConfigFormat::from_path("runtime.json"),
            Err(ConfigError::UnsupportedFormat(_))
        ));
        assert!(ConfigFormat::from_path("toml").is_err());
    }
}
