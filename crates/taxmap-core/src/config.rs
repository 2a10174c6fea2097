//! taxmap Configuration Management
//!
//! Handles configuration from environment variables, config files,
//! and command-line arguments with defaults pointing at the public
//! BIOfid and Wikidata services.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// BIOfid corpus API
    pub biofid: BiofidConfig,

    /// Wikidata coordinate lookup
    pub wikidata: WikidataConfig,

    /// Relation extraction
    pub extraction: ExtractionConfig,

    /// Tabular export
    pub export: ExportConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // BIOfid
        if let Ok(url) = std::env::var("BIOFID_API_URL") {
            config.biofid.base_url = url;
        }
        if let Ok(secs) = std::env::var("BIOFID_TIMEOUT_SECS") {
            config.biofid.timeout_secs = parse_value("BIOFID_TIMEOUT_SECS", secs)?;
        }

        // Wikidata
        if let Ok(url) = std::env::var("WIKIDATA_SPARQL_URL") {
            config.wikidata.sparql_url = url;
        }
        if let Ok(agent) = std::env::var("WIKIDATA_USER_AGENT") {
            config.wikidata.user_agent = agent;
        }
        if let Ok(secs) = std::env::var("WIKIDATA_TIMEOUT_SECS") {
            config.wikidata.timeout_secs = parse_value("WIKIDATA_TIMEOUT_SECS", secs)?;
        }

        // Extraction
        if let Ok(strategy) = std::env::var("TAXMAP_STRATEGY") {
            config.extraction.strategy = strategy;
        }

        // Export
        if let Ok(delimiter) = std::env::var("TAXMAP_DELIMITER") {
            config.export.delimiter = parse_delimiter(&delimiter)?;
        }

        // Logging
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(json) = std::env::var("LOG_JSON") {
            config.logging.json_format = parse_value("LOG_JSON", json)?;
        }

        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })?;

        if !config.export.delimiter.is_ascii() {
            return Err(ConfigError::InvalidValue {
                key: "export.delimiter".to_string(),
                value: config.export.delimiter.to_string(),
            });
        }

        Ok(config)
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        let env_config = Self::from_env()?;

        // Only override if env values differ from defaults
        if env_config.biofid.base_url != BiofidConfig::default().base_url {
            self.biofid.base_url = env_config.biofid.base_url;
        }
        if env_config.biofid.timeout_secs != BiofidConfig::default().timeout_secs {
            self.biofid.timeout_secs = env_config.biofid.timeout_secs;
        }
        if env_config.wikidata.sparql_url != WikidataConfig::default().sparql_url {
            self.wikidata.sparql_url = env_config.wikidata.sparql_url;
        }
        if env_config.wikidata.user_agent != WikidataConfig::default().user_agent {
            self.wikidata.user_agent = env_config.wikidata.user_agent;
        }
        if env_config.wikidata.timeout_secs != WikidataConfig::default().timeout_secs {
            self.wikidata.timeout_secs = env_config.wikidata.timeout_secs;
        }
        if env_config.extraction.strategy != ExtractionConfig::default().strategy {
            self.extraction.strategy = env_config.extraction.strategy;
        }
        if env_config.export.delimiter != ExportConfig::default().delimiter {
            self.export.delimiter = env_config.export.delimiter;
        }
        if env_config.logging.level != LoggingConfig::default().level {
            self.logging.level = env_config.logging.level;
        }
        if env_config.logging.json_format {
            self.logging.json_format = true;
        }

        Ok(self)
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value,
    })
}

/// Accepts a single character or the escape `\t`
fn parse_delimiter(value: &str) -> Result<char, ConfigError> {
    if value == "\\t" {
        return Ok('\t');
    }

    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => Ok(c),
        _ => Err(ConfigError::InvalidValue {
            key: "TAXMAP_DELIMITER".to_string(),
            value: value.to_string(),
        }),
    }
}

/// BIOfid corpus API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BiofidConfig {
    /// API base URL, method names are appended
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for BiofidConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.biofid.de/api/v1/".to_string(),
            timeout_secs: 120,
        }
    }
}

/// Wikidata SPARQL configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WikidataConfig {
    /// SPARQL endpoint
    pub sparql_url: String,

    /// User agent sent with every query (required by the Wikidata policy)
    pub user_agent: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for WikidataConfig {
    fn default() -> Self {
        Self {
            sparql_url: "https://query.wikidata.org/sparql".to_string(),
            user_agent: format!(
                "taxmap/{} (https://biofid.de/en/contact/; biofid@ub.uni-frankfurt.de)",
                env!("CARGO_PKG_VERSION")
            ),
            timeout_secs: 60,
        }
    }
}

/// Relation extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Registered name of the pairing strategy
    pub strategy: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            strategy: "page".to_string(),
        }
    }
}

/// Export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Field delimiter of the output file
    pub delimiter: char,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self { delimiter: '\t' }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,

    /// Include file/line in logs
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            include_location: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.biofid.base_url, "https://www.biofid.de/api/v1/");
        assert_eq!(config.wikidata.sparql_url, "https://query.wikidata.org/sparql");
        assert_eq!(config.extraction.strategy, "page");
        assert_eq!(config.export.delimiter, '\t');
        assert!(config.wikidata.user_agent.starts_with("taxmap/"));
    }

    #[test]
    fn test_partial_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[wikidata]\ntimeout_secs = 5\n\n[export]\ndelimiter = \",\"\n"
        )
        .unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();

        assert_eq!(config.wikidata.timeout_secs, 5);
        assert_eq!(config.wikidata.sparql_url, WikidataConfig::default().sparql_url);
        assert_eq!(config.export.delimiter, ',');
        assert_eq!(config.biofid.timeout_secs, 120);
    }

    #[test]
    fn test_non_ascii_delimiter_in_file_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[export]\ndelimiter = \"§\"\n").unwrap();

        let result = AppConfig::from_file(file.path());
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "export.delimiter"
        ));
    }

    #[test]
    fn test_missing_file() {
        let result = AppConfig::from_file("/nonexistent/taxmap.toml");
        assert!(matches!(result, Err(ConfigError::FileReadError { .. })));
    }

    #[test]
    fn test_delimiter_parse() {
        assert_eq!(parse_delimiter("\\t").unwrap(), '\t');
        assert_eq!(parse_delimiter(";").unwrap(), ';');
        assert!(parse_delimiter(";;").is_err());
        assert!(parse_delimiter("").is_err());
    }

    #[test]
    fn test_parse_value_rejects_garbage() {
        let result: Result<u64, _> = parse_value("BIOFID_TIMEOUT_SECS", "soon".to_string());
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }
}
