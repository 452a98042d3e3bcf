//! Configuration file handling
//!
//! Every field has a default, so the load test runs with no config file at
//! all. TOML is the default format; files ending in `.yaml`/`.yml` are read
//! as YAML.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::paths::{self, DEFAULT_HTML_REPORT};
use super::{Error, Result};
use crate::engine::Options;
use crate::scenario::Credentials;

/// Base URL of the API under test
pub const DEFAULT_BASE_URL: &str = "https://qatools.ro";

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Scheme and host of the API under test, without a trailing slash
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Log every response record at info level
    #[serde(default)]
    pub http_debug: bool,

    /// Login credentials used by every iteration
    #[serde(default)]
    pub credentials: Credentials,

    /// Virtual users and iterations
    #[serde(default)]
    pub options: Options,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Summary output settings
    #[serde(default)]
    pub summary: SummaryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            http_debug: false,
            credentials: Credentials::default(),
            options: Options::default(),
            http: HttpConfig::default(),
            summary: SummaryConfig::default(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

/// HTTP client settings
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_request_timeout() -> u64 {
    60
}

/// Summary output settings
#[derive(Debug, Deserialize, Clone)]
pub struct SummaryConfig {
    /// Where the HTML report is written
    #[serde(default = "default_html_path")]
    pub html_path: PathBuf,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            html_path: default_html_path(),
        }
    }
}

fn default_html_path() -> PathBuf {
    PathBuf::from(DEFAULT_HTML_REPORT)
}

/// Values given on the command line, applied on top of the file
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub vus: Option<usize>,
    pub iterations: Option<usize>,
    pub http_debug: bool,
}

impl Config {
    /// Load configuration, falling back to defaults when no file is found
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match paths::resolve_config_path(explicit) {
            Some(path) => Self::from_path(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load and validate configuration from a specific file
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;

        let is_yaml = matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("yaml") | Some("yml")
        );

        let config: Config = if is_yaml {
            serde_yaml::from_str(&content).map_err(|e| Error::config_parse(path, e))?
        } else {
            toml::from_str(&content).map_err(|e| Error::config_parse(path, e))?
        };

        config.validate()?;
        Ok(config)
    }

    /// Apply command line overrides and re-validate
    pub fn with_overrides(mut self, overrides: Overrides) -> Result<Self> {
        if let Some(base_url) = overrides.base_url {
            self.base_url = base_url;
        }
        if let Some(vus) = overrides.vus {
            self.options.vus = vus;
        }
        if let Some(iterations) = overrides.iterations {
            self.options.iterations = iterations;
        }
        if overrides.http_debug {
            self.http_debug = true;
        }

        self.validate()?;
        Ok(self)
    }

    /// Check values that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.options.vus == 0 {
            return Err(Error::invalid_option("vus", "must be at least 1"));
        }
        if self.options.iterations == 0 {
            return Err(Error::invalid_option("iterations", "must be at least 1"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(Error::invalid_option(
                "base_url",
                "must start with http:// or https://",
            ));
        }
        if self.credentials.username.is_empty() || self.credentials.password.is_empty() {
            return Err(Error::invalid_option(
                "credentials",
                "username and password must not be empty",
            ));
        }
        Ok(())
    }

    /// Base URL without a trailing slash
    pub fn api_root(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_match_fixed_scenario() {
        let config = Config::default();
        assert_eq!(config.base_url, "https://qatools.ro");
        assert_eq!(config.options.vus, 2);
        assert_eq!(config.options.iterations, 2);
        assert_eq!(config.credentials.username, "tester");
        assert_eq!(config.credentials.password, "passw0rd");
        assert_eq!(config.summary.html_path, PathBuf::from("reports/summary.html"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_toml_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("loadtest.toml");
        std::fs::write(
            &path,
            "base_url = \"http://localhost:8080/\"\n\n[options]\nvus = 5\n",
        )
        .unwrap();

        let config = Config::from_path(&path).unwrap();
        assert_eq!(config.api_root(), "http://localhost:8080");
        assert_eq!(config.options.vus, 5);
        assert_eq!(config.options.iterations, 2);
        assert_eq!(config.http.request_timeout_secs, 60);
    }

    #[test]
    fn test_load_yaml_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("loadtest.yaml");
        std::fs::write(
            &path,
            "http_debug: true\ncredentials:\n  username: alice\n  password: secret\n",
        )
        .unwrap();

        let config = Config::from_path(&path).unwrap();
        assert!(config.http_debug);
        assert_eq!(config.credentials.username, "alice");
    }

    #[test]
    fn test_zero_vus_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("loadtest.toml");
        std::fs::write(&path, "[options]\nvus = 0\n").unwrap();

        let err = Config::from_path(&path).unwrap_err();
        assert!(matches!(err, Error::InvalidOption { ref name, .. } if name == "vus"));
    }

    #[test]
    fn test_malformed_file_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "base_url = ").unwrap();

        let err = Config::from_path(&path).unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));
    }

    #[test]
    fn test_overrides_take_precedence() {
        let config = Config::default()
            .with_overrides(Overrides {
                base_url: Some("http://127.0.0.1:9000".to_string()),
                vus: Some(4),
                iterations: None,
                http_debug: true,
            })
            .unwrap();

        assert_eq!(config.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.options.vus, 4);
        assert_eq!(config.options.iterations, 2);
        assert!(config.http_debug);
    }

    #[test]
    fn test_override_to_zero_iterations_rejected() {
        let result = Config::default().with_overrides(Overrides {
            iterations: Some(0),
            ..Default::default()
        });
        assert!(result.is_err());
    }
}
