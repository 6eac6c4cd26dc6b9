#![allow(clippy::must_use_candidate)]

//! Configuration for the echopod CLI and client
//!
//! Values come from process environment variables with an optional `.env`
//! overlay in the working directory. The `.env` file is also the persisted
//! state the CLI writes endpoint and template ids back into after deploys
//! and deletes.

mod env_file;

use std::path::Path;

use secrecy::SecretString;

pub use env_file::EnvFile;

/// Environment variable holding the RunPod API key
pub const API_KEY_VAR: &str = "RUNPOD_API_KEY";
/// Environment variable holding the serverless endpoint id
pub const ENDPOINT_ID_VAR: &str = "ENDPOINT_ID";
/// Environment variable holding the template id
pub const TEMPLATE_ID_VAR: &str = "TEMPLATE_ID";
/// Environment variable holding a network volume id to attach on deploy
pub const NETWORK_VOLUME_ID_VAR: &str = "NETWORK_VOLUME_ID";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The RunPod API key is not set
    #[error("RunPod API key is not set. Set the {API_KEY_VAR} environment variable or add it to .env")]
    MissingApiKey,

    /// The endpoint id is not set
    #[error("endpoint ID is not set. Set the {ENDPOINT_ID_VAR} environment variable or deploy an endpoint first")]
    MissingEndpointId,

    /// A value could not be parsed
    #[error("invalid value for {name}: {value}")]
    InvalidValue {
        /// Variable name
        name: &'static str,
        /// The offending value
        value: String,
    },

    /// The `.env` file could not be read or written
    #[error("failed to access env file {path}: {source}")]
    EnvFile {
        /// File path
        path: String,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

/// Default generation parameters sent with inference jobs
#[derive(Debug, Clone, Copy)]
pub struct GenerationDefaults {
    /// Sampling temperature
    pub temperature: f64,
    /// Top-p sampling value
    pub top_p: f64,
    /// Random seed for reproducible outputs
    pub seed: Option<u64>,
}

impl Default for GenerationDefaults {
    fn default() -> Self {
        Self {
            temperature: 1.3,
            top_p: 0.95,
            seed: None,
        }
    }
}

/// Resolved echopod configuration
#[derive(Debug)]
pub struct Config {
    /// RunPod API key
    pub api_key: Option<SecretString>,
    /// Serverless endpoint id for inference
    pub endpoint_id: Option<String>,
    /// Template id used when deploying endpoints
    pub template_id: Option<String>,
    /// Network volume to attach to deployed endpoints
    pub network_volume_id: Option<String>,
    /// Default generation parameters
    pub defaults: GenerationDefaults,
}

impl Config {
    /// Load configuration from the process environment, overlaying values
    /// from `.env` in the working directory when present
    ///
    /// Process environment variables take precedence over the file, matching
    /// dotenv conventions.
    ///
    /// # Errors
    ///
    /// Returns an error if the `.env` file exists but cannot be read, or a
    /// numeric default fails to parse
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env_file(Path::new(".env"))
    }

    /// Load configuration using the given `.env` path as the overlay
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, or a numeric
    /// default fails to parse
    pub fn load_with_env_file(path: &Path) -> Result<Self, ConfigError> {
        let overlay = if path.exists() {
            Some(EnvFile::load(path).map_err(|source| ConfigError::EnvFile {
                path: path.display().to_string(),
                source,
            })?)
        } else {
            None
        };

        let lookup = |name: &str| -> Option<String> {
            std::env::var(name)
                .ok()
                .filter(|v| !v.is_empty())
                .or_else(|| {
                    overlay
                        .as_ref()
                        .and_then(|f| f.get(name))
                        .filter(|v| !v.is_empty())
                        .map(str::to_owned)
                })
        };

        Self::from_lookup(lookup)
    }

    /// Build configuration from an arbitrary key lookup
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric default fails to parse
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = GenerationDefaults {
            temperature: parse_or_default(&lookup, "DEFAULT_TEMPERATURE", 1.3)?,
            top_p: parse_or_default(&lookup, "DEFAULT_TOP_P", 0.95)?,
            seed: match lookup("DEFAULT_SEED") {
                Some(raw) => Some(raw.parse().map_err(|_| ConfigError::InvalidValue {
                    name: "DEFAULT_SEED",
                    value: raw,
                })?),
                None => None,
            },
        };

        Ok(Self {
            api_key: lookup(API_KEY_VAR).map(SecretString::from),
            endpoint_id: lookup(ENDPOINT_ID_VAR),
            template_id: lookup(TEMPLATE_ID_VAR),
            network_volume_id: lookup(NETWORK_VOLUME_ID_VAR),
            defaults,
        })
    }

    /// Return the API key or a typed error when it is missing
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingApiKey`] when unset
    pub fn require_api_key(&self) -> Result<SecretString, ConfigError> {
        self.api_key.clone().ok_or(ConfigError::MissingApiKey)
    }

    /// Return the endpoint id or a typed error when it is missing
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEndpointId`] when unset
    pub fn require_endpoint_id(&self) -> Result<String, ConfigError> {
        self.endpoint_id.clone().ok_or(ConfigError::MissingEndpointId)
    }

    /// Validate that the configuration can drive API calls
    ///
    /// # Errors
    ///
    /// Returns the first missing required value
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.require_api_key()?;
        self.require_endpoint_id()?;
        Ok(())
    }
}

fn parse_or_default<F>(lookup: &F, name: &'static str, default: f64) -> Result<f64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue { name, value: raw }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_from<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |name| {
            pairs
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| (*v).to_owned())
        }
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert!(config.api_key.is_none());
        assert!(config.endpoint_id.is_none());
        assert!((config.defaults.temperature - 1.3).abs() < f64::EPSILON);
        assert!((config.defaults.top_p - 0.95).abs() < f64::EPSILON);
        assert!(config.defaults.seed.is_none());
    }

    #[test]
    fn validate_reports_missing_api_key_first() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::MissingApiKey)));
    }

    #[test]
    fn validate_reports_missing_endpoint_id() {
        let config = Config::from_lookup(lookup_from(&[(API_KEY_VAR, "key")])).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::MissingEndpointId)));
    }

    #[test]
    fn numeric_defaults_parse() {
        let config = Config::from_lookup(lookup_from(&[
            ("DEFAULT_TEMPERATURE", "0.8"),
            ("DEFAULT_TOP_P", "0.9"),
            ("DEFAULT_SEED", "42"),
        ]))
        .unwrap();
        assert!((config.defaults.temperature - 0.8).abs() < f64::EPSILON);
        assert!((config.defaults.top_p - 0.9).abs() < f64::EPSILON);
        assert_eq!(config.defaults.seed, Some(42));
    }

    #[test]
    fn invalid_numeric_default_errors() {
        let err = Config::from_lookup(lookup_from(&[("DEFAULT_TEMPERATURE", "warm")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { name: "DEFAULT_TEMPERATURE", .. }));
    }

    #[test]
    fn process_env_wins_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "ENDPOINT_ID=from-file\n").unwrap();

        temp_env::with_var(ENDPOINT_ID_VAR, Some("from-env"), || {
            let config = Config::load_with_env_file(&path).unwrap();
            assert_eq!(config.endpoint_id.as_deref(), Some("from-env"));
        });
    }

    #[test]
    fn file_fills_in_unset_vars() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "TEMPLATE_ID=tpl-123\n").unwrap();

        temp_env::with_var_unset(TEMPLATE_ID_VAR, || {
            let config = Config::load_with_env_file(&path).unwrap();
            assert_eq!(config.template_id.as_deref(), Some("tpl-123"));
        });
    }
}
