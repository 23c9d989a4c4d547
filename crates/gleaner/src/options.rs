//! Bind options and their layered loader.

use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Per-call binding policy.
///
/// ```
/// use gleaner::BindOptions;
///
/// let options: BindOptions = toml::from_str("preserve_body = true").unwrap();
/// assert!(options.skip_filled);
/// assert!(options.preserve_body);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BindOptions {
    /// Leave fields that already hold a non-zero value unextracted.
    pub skip_filled: bool,
    /// Buffer the body before decoding so it can be read again afterwards.
    pub preserve_body: bool,
}

impl Default for BindOptions {
    fn default() -> Self {
        Self {
            skip_filled: true,
            preserve_body: false,
        }
    }
}

impl BindOptions {
    /// Sets [`skip_filled`](Self::skip_filled).
    #[must_use]
    pub fn skip_filled(mut self, enabled: bool) -> Self {
        self.skip_filled = enabled;
        self
    }

    /// Sets [`preserve_body`](Self::preserve_body).
    #[must_use]
    pub fn preserve_body(mut self, enabled: bool) -> Self {
        self.preserve_body = enabled;
        self
    }
}

/// Loads [`BindOptions`] in layers: defaults, then a TOML or JSON document,
/// then environment variables.
///
/// Environment variables use the form `PREFIX__SKIP_FILLED` and
/// `PREFIX__PRESERVE_BODY`.
///
/// # Example
///
/// ```
/// use gleaner::OptionsLoader;
///
/// let options = OptionsLoader::new()
///     .with_string(r#"{"skip_filled": false}"#, "json")
///     .unwrap()
///     .load()
///     .unwrap();
///
/// assert!(!options.skip_filled);
/// assert!(!options.preserve_body);
/// ```
#[derive(Debug, Default)]
pub struct OptionsLoader {
    options: BindOptions,
    env_prefix: Option<String>,
}

impl OptionsLoader {
    /// Creates a loader starting from the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a `.toml` or `.json` file, chosen by extension.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, has another
    /// extension, or does not parse.
    pub fn with_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ConfigError::UnsupportedFormat(path.display().to_string()))?;
        self.with_string(&content, format)
    }

    /// Loads a file if it exists.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Loads options from `content` in `format` (`toml` or `json`).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for an unknown format, invalid syntax or
    /// unknown keys.
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        let layer: OptionsLayer = match format.to_ascii_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };
        layer.apply(&mut self.options);
        Ok(self)
    }

    /// Enables environment overrides under `prefix`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Applies environment overrides and returns the options.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Env`] if an override is not a boolean.
    pub fn load(self) -> Result<BindOptions, ConfigError> {
        self.load_from(env::vars())
    }

    fn load_from<I>(mut self, vars: I) -> Result<BindOptions, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let Some(prefix) = self.env_prefix.take() else {
            return Ok(self.options);
        };
        for (name, value) in vars {
            let Some(key) = name
                .strip_prefix(prefix.as_str())
                .and_then(|k| k.strip_prefix("__"))
            else {
                continue;
            };
            let target = match key {
                "SKIP_FILLED" => &mut self.options.skip_filled,
                "PRESERVE_BODY" => &mut self.options.preserve_body,
                _ => continue,
            };
            *target = parse_flag(&value).ok_or_else(|| ConfigError::Env {
                name: name.clone(),
                value: value.clone(),
            })?;
        }
        Ok(self.options)
    }
}

/// Keys set by one document; absent keys keep the value of earlier layers.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct OptionsLayer {
    skip_filled: Option<bool>,
    preserve_body: Option<bool>,
}

impl OptionsLayer {
    fn apply(self, options: &mut BindOptions) {
        if let Some(enabled) = self.skip_filled {
            options.skip_filled = enabled;
        }
        if let Some(enabled) = self.preserve_body {
            options.preserve_body = enabled;
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
