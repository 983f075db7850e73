//! Glyph cache configuration.
//!
//! The cache size can be set programmatically, from the environment, or
//! from a small `key = value` configuration file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Default number of glyphs kept per font.
pub const DEFAULT_GLYPH_CAPACITY: usize = 192;

/// Environment variable overriding [`CacheConfig::glyph_capacity`].
pub const GLYPH_CACHE_SIZE_ENV: &str = "GLYPHKIT_GLYPH_CACHE_SIZE";

/// User-configurable cache settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of rendered glyphs cached per font. 0 disables caching.
    pub glyph_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            glyph_capacity: DEFAULT_GLYPH_CAPACITY,
        }
    }
}

impl CacheConfig {
    /// Sets the glyph cache capacity.
    pub fn with_glyph_capacity(mut self, capacity: usize) -> Self {
        self.glyph_capacity = capacity;
        self
    }

    /// Returns the default configuration file path for the current platform.
    ///
    /// - macOS: ~/Library/Application Support/glyphkit/cache.toml
    /// - Linux: ~/.config/glyphkit/cache.toml
    /// - Windows: %APPDATA%\glyphkit\cache.toml
    pub fn default_config_path() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("glyphkit").join("cache.toml")
        } else {
            PathBuf::from("glyphkit-cache.toml")
        }
    }

    /// Loads configuration from environment variables.
    ///
    /// Reads `GLYPHKIT_GLYPH_CACHE_SIZE` (glyph count, default 192).
    ///
    /// # Errors
    /// Returns an error if the variable is set but is not a non-negative
    /// integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(val) = std::env::var(GLYPH_CACHE_SIZE_ENV) {
            config.glyph_capacity = parse_capacity(GLYPH_CACHE_SIZE_ENV, &val)?;
        }

        Ok(config)
    }

    /// Loads configuration from a file.
    ///
    /// Expected file format:
    /// ```toml
    /// glyph_cache_size = 192
    /// ```
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_toml(&contents)
    }

    fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        for line in toml_str.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                let value = value.trim().trim_matches('"');

                match key {
                    "glyph_cache_size" => {
                        config.glyph_capacity = parse_capacity(key, value)?;
                    }
                    _ => {} // Ignore unknown keys
                }
            }
        }

        Ok(config)
    }

    /// Saves configuration to a file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        fs::write(path.as_ref(), self.to_toml())?;
        Ok(())
    }

    fn to_toml(&self) -> String {
        format!(
            "# glyphkit cache configuration\n\
             glyph_cache_size = {}\n",
            self.glyph_capacity
        )
    }
}

fn parse_capacity(key: &str, value: &str) -> Result<usize, ConfigError> {
    value
        .trim()
        .parse::<usize>()
        .map_err(|_| ConfigError::InvalidValue(key.to_string()))
}

/// Errors that can occur during configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Invalid value for a configuration parameter
    #[error("invalid value for configuration key: {0}")]
    InvalidValue(String),

    /// I/O error reading or writing configuration file
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.glyph_capacity, 192);
    }

    #[test]
    fn test_builder() {
        let config = CacheConfig::default().with_glyph_capacity(64);
        assert_eq!(config.glyph_capacity, 64);
    }

    #[test]
    fn test_default_config_path() {
        let path = CacheConfig::default_config_path();
        assert!(path.ends_with("cache.toml") || path.ends_with("glyphkit-cache.toml"));
    }

    #[test]
    #[serial]
    fn test_from_env() {
        let _guard = EnvGuard::new(&[GLYPH_CACHE_SIZE_ENV]);

        env::set_var(GLYPH_CACHE_SIZE_ENV, "512");
        let config = CacheConfig::from_env().unwrap();
        assert_eq!(config.glyph_capacity, 512);
    }

    #[test]
    #[serial]
    fn test_from_env_unset() {
        let _guard = EnvGuard::new(&[GLYPH_CACHE_SIZE_ENV]);

        env::remove_var(GLYPH_CACHE_SIZE_ENV);
        let config = CacheConfig::from_env().unwrap();
        assert_eq!(config, CacheConfig::default());
    }

    #[test]
    #[serial]
    fn test_from_env_invalid() {
        let _guard = EnvGuard::new(&[GLYPH_CACHE_SIZE_ENV]);

        env::set_var(GLYPH_CACHE_SIZE_ENV, "not_a_number");
        assert!(matches!(CacheConfig::from_env(), Err(ConfigError::InvalidValue(_))));

        env::set_var(GLYPH_CACHE_SIZE_ENV, "-4");
        assert!(matches!(CacheConfig::from_env(), Err(ConfigError::InvalidValue(_))));
    }

    // Helper to save and restore environment variables
    struct EnvGuard {
        vars: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        fn new(var_names: &[&str]) -> Self {
            let vars = var_names
                .iter()
                .map(|name| (name.to_string(), env::var(name).ok()))
                .collect();
            Self { vars }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (name, value) in &self.vars {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    #[test]
    fn test_from_toml() {
        let toml = r#"
            # Test configuration
            glyph_cache_size = 64
            unrelated_key = "ignored"
        "#;

        let config = CacheConfig::from_toml(toml).unwrap();
        assert_eq!(config.glyph_capacity, 64);
    }

    #[test]
    fn test_from_toml_invalid() {
        let result = CacheConfig::from_toml("glyph_cache_size = lots");
        assert!(matches!(result, Err(ConfigError::InvalidValue(key)) if key == "glyph_cache_size"));
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = CacheConfig::default().with_glyph_capacity(0);
        let parsed = CacheConfig::from_toml(&config.to_toml()).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_file_save_and_load() {
        let config_path = env::temp_dir().join("glyphkit_test_cache_config.toml");

        let config = CacheConfig::default().with_glyph_capacity(48);
        config.save_to_file(&config_path).unwrap();

        let loaded = CacheConfig::from_file(&config_path).unwrap();
        assert_eq!(config, loaded);

        // Cleanup
        let _ = fs::remove_file(config_path);
    }

    #[test]
    fn test_missing_file() {
        let result = CacheConfig::from_file("/nonexistent/glyphkit/cache.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
