use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

/// Progress template used when progress is switched on without a custom template.
pub const DEFAULT_PROGRESS_TEMPLATE: &str =
    "checked :current/:total [:bar] :rate per second :percent ETA: :etas Pending: :pendingCount";

/// Progress reporting: off, on with the default template, or on with a custom template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProgressSetting {
    Enabled(bool),
    Template(String),
}

impl Default for ProgressSetting {
    fn default() -> Self {
        ProgressSetting::Enabled(false)
    }
}

impl ProgressSetting {
    /// The template to render with, or `None` when progress is disabled.
    pub fn template(&self) -> Option<&str> {
        match self {
            ProgressSetting::Enabled(false) => None,
            ProgressSetting::Enabled(true) => Some(DEFAULT_PROGRESS_TEMPLATE),
            ProgressSetting::Template(t) => Some(t.as_str()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.template().is_some()
    }
}

/// Dispatch configuration as written in `~/.config/volley/config.toml`.
///
/// Every field is optional; missing fields take the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Stagger between launches in milliseconds; job i waits `i * throttle_ms`.
    pub throttle_ms: u64,
    /// Per-request timeout in milliseconds. Must be positive.
    pub request_timeout_ms: u64,
    /// HTTP method used for every request.
    pub http_method: String,
    /// `false`, `true`, or a progress template string.
    pub progress: ProgressSetting,
    /// Drop the raw response from success outcomes once it has been transformed.
    pub discard_response: bool,
    /// Extra request headers sent with every request.
    pub headers: BTreeMap<String, String>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            throttle_ms: 0,
            request_timeout_ms: 60_000,
            http_method: "GET".to_string(),
            progress: ProgressSetting::default(),
            discard_response: false,
            headers: BTreeMap::new(),
        }
    }
}

/// Validated, immutable options consumed by the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOptions {
    pub throttle: Duration,
    pub request_timeout: Duration,
    /// Upper-case HTTP method token.
    pub method: String,
    pub progress: ProgressSetting,
    pub discard_response: bool,
    pub headers: Vec<(String, String)>,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            throttle: Duration::ZERO,
            request_timeout: Duration::from_millis(60_000),
            method: "GET".to_string(),
            progress: ProgressSetting::default(),
            discard_response: false,
            headers: Vec::new(),
        }
    }
}

impl DispatchConfig {
    /// Validate the config and convert it into [`DispatchOptions`].
    pub fn resolve(&self) -> Result<DispatchOptions, ConfigError> {
        let options = DispatchOptions {
            throttle: Duration::from_millis(self.throttle_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            method: self.http_method.trim().to_ascii_uppercase(),
            progress: self.progress.clone(),
            discard_response: self.discard_response,
            headers: self
                .headers
                .iter()
                .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
                .collect(),
        };
        options.validate().map_err(|e| match e {
            ConfigError::InvalidMethod(_) => ConfigError::InvalidMethod(self.http_method.clone()),
            other => other,
        })?;
        Ok(options)
    }
}

impl DispatchOptions {
    /// Check the invariants the dispatcher relies on: a positive timeout, a
    /// method that is an HTTP token, and headers curl can send as written.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.method.is_empty() || !self.method.bytes().all(is_token_byte) {
            return Err(ConfigError::InvalidMethod(self.method.clone()));
        }
        for (name, value) in &self.headers {
            if name.is_empty() || !name.bytes().all(is_token_byte) {
                return Err(ConfigError::InvalidHeader {
                    name: name.clone(),
                    reason: "name is not an HTTP token",
                });
            }
            if value.bytes().any(|b| b == b'\r' || b == b'\n' || b == 0) {
                return Err(ConfigError::InvalidHeader {
                    name: name.clone(),
                    reason: "value contains a line break or NUL",
                });
            }
        }
        Ok(())
    }
}

/// RFC 9110 `tchar`.
fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("volley")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<DispatchConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = DispatchConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from(&path)
}

/// Parse a config file at an explicit path.
pub fn load_from(path: &Path) -> Result<DispatchConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config: {}", path.display()))?;
    let cfg: DispatchConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = DispatchConfig::default();
        assert_eq!(cfg.throttle_ms, 0);
        assert_eq!(cfg.request_timeout_ms, 60_000);
        assert_eq!(cfg.http_method, "GET");
        assert!(!cfg.progress.is_enabled());
        assert!(!cfg.discard_response);
        assert!(cfg.headers.is_empty());
    }

    #[test]
    fn default_config_resolves_to_default_options() {
        let opts = DispatchConfig::default().resolve().unwrap();
        assert_eq!(opts, DispatchOptions::default());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = DispatchConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: DispatchConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn config_toml_partial_uses_defaults() {
        let cfg: DispatchConfig = toml::from_str("throttle_ms = 250").unwrap();
        assert_eq!(cfg.throttle_ms, 250);
        assert_eq!(cfg.request_timeout_ms, 60_000);
        assert_eq!(cfg.http_method, "GET");
    }

    #[test]
    fn config_toml_progress_variants() {
        let off: DispatchConfig = toml::from_str("progress = false").unwrap();
        assert_eq!(off.progress.template(), None);

        let on: DispatchConfig = toml::from_str("progress = true").unwrap();
        assert_eq!(on.progress.template(), Some(DEFAULT_PROGRESS_TEMPLATE));

        let custom: DispatchConfig = toml::from_str(r#"progress = ":current of :total""#).unwrap();
        assert_eq!(custom.progress.template(), Some(":current of :total"));
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            throttle_ms = 100
            request_timeout_ms = 5000
            http_method = "head"
            discard_response = true

            [headers]
            User-Agent = "volley-test"
        "#;
        let cfg: DispatchConfig = toml::from_str(toml).unwrap();
        let opts = cfg.resolve().unwrap();
        assert_eq!(opts.throttle, Duration::from_millis(100));
        assert_eq!(opts.request_timeout, Duration::from_secs(5));
        assert_eq!(opts.method, "HEAD");
        assert!(opts.discard_response);
        assert_eq!(
            opts.headers,
            vec![("User-Agent".to_string(), "volley-test".to_string())]
        );
    }

    #[test]
    fn resolve_rejects_zero_timeout() {
        let cfg = DispatchConfig {
            request_timeout_ms: 0,
            ..DispatchConfig::default()
        };
        assert!(matches!(cfg.resolve(), Err(ConfigError::ZeroTimeout)));
    }

    #[test]
    fn resolve_rejects_bad_method() {
        for bad in ["", "GE T", "G\rET", "PÖST"] {
            let cfg = DispatchConfig {
                http_method: bad.to_string(),
                ..DispatchConfig::default()
            };
            assert!(
                matches!(cfg.resolve(), Err(ConfigError::InvalidMethod(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn resolve_rejects_bad_headers() {
        let mut cfg = DispatchConfig::default();
        cfg.headers.insert("X-Ok".into(), "a\r\nInjected: 1".into());
        assert!(matches!(
            cfg.resolve(),
            Err(ConfigError::InvalidHeader { .. })
        ));

        let mut cfg = DispatchConfig::default();
        cfg.headers.insert("Bad Name".into(), "v".into());
        assert!(matches!(
            cfg.resolve(),
            Err(ConfigError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn validate_catches_hand_built_options() {
        assert!(DispatchOptions::default().validate().is_ok());

        let zero = DispatchOptions {
            request_timeout: Duration::ZERO,
            ..DispatchOptions::default()
        };
        assert!(matches!(zero.validate(), Err(ConfigError::ZeroTimeout)));

        let spaced = DispatchOptions {
            method: "GE T".into(),
            ..DispatchOptions::default()
        };
        assert!(matches!(spaced.validate(), Err(ConfigError::InvalidMethod(m)) if m == "GE T"));

        let injected = DispatchOptions {
            headers: vec![("X-A".into(), "1\nX-B: 2".into())],
            ..DispatchOptions::default()
        };
        assert!(matches!(
            injected.validate(),
            Err(ConfigError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn load_from_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "throttle_ms = 7\nprogress = true\n").unwrap();
        let cfg = load_from(&path).unwrap();
        assert_eq!(cfg.throttle_ms, 7);
        assert!(cfg.progress.is_enabled());
    }

    #[test]
    fn load_from_reports_parse_errors_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "throttle_ms = \"soon\"").unwrap();
        let err = load_from(&path).unwrap_err();
        assert!(format!("{err:#}").contains("config.toml"));
    }
}
