use crate::api_client::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use crate::data_exporter::ColumnPolicy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const ENV_API_KEY: &str = "JOTFORM_API_KEY";
pub const ENV_FORM_ID: &str = "JOTFORM_FORM_ID";
pub const ENV_BASE_URL: &str = "JOTFORM_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "JOTFORM_TIMEOUT_SECS";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Secret API key. Never has a built-in default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_id: Option<String>,

    /// API host, e.g. the EU or US endpoint
    pub base_url: String,

    /// Request timeout in seconds; 0 disables the timeout
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub json_path: PathBuf,
    pub csv_path: PathBuf,

    /// "first-submission" or "union"
    pub csv_columns: ColumnPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when RUST_LOG is not set
    pub level: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            form_id: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            json_path: PathBuf::from("submissions.json"),
            csv_path: PathBuf::from("submissions.csv"),
            csv_columns: ColumnPolicy::FirstSubmission,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Load config from the default location, then apply environment overrides
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        let mut config = if config_path.exists() {
            Self::load_from(&config_path)?
        } else {
            // Write a default config so users have something to edit
            let default_config = Self::default();
            if let Err(e) = default_config.save_to(&config_path) {
                warn!(target: "config", "Could not write default config: {:#}", e);
            }
            default_config
        };

        config.apply_env_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        debug!(target: "config", "Loading config from {}", path.display());
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Environment values win over the file. `lookup` is usually `std::env::var`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(ENV_API_KEY) {
            self.api.api_key = Some(key);
        }
        if let Some(form_id) = lookup(ENV_FORM_ID) {
            self.api.form_id = Some(form_id);
        }
        if let Some(base_url) = lookup(ENV_BASE_URL) {
            self.api.base_url = base_url;
        }
        if let Some(timeout) = lookup(ENV_TIMEOUT_SECS) {
            self.api.timeout_secs = timeout
                .trim()
                .parse()
                .with_context(|| format!("{} must be a whole number of seconds", ENV_TIMEOUT_SECS))?;
        }
        Ok(())
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;

        Ok(())
    }

    /// Get the default config file path
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("jotform-export").join("config.toml"))
    }

    /// Create a default config file with comments
    pub fn create_default_with_comments() -> String {
        r#"# jotform-export Configuration File
# Location: ~/.config/jotform-export/config.toml (Linux)
#           ~/Library/Application Support/jotform-export/config.toml (macOS)
#           %APPDATA%\jotform-export\config.toml (Windows)
#
# Every [api] value can be overridden with an environment variable:
#   JOTFORM_API_KEY, JOTFORM_FORM_ID, JOTFORM_BASE_URL, JOTFORM_TIMEOUT_SECS

[api]
# Your API key (Settings > API in your account). Prefer the environment variable.
# api_key = ""

# Numeric id of the form whose submissions should be exported
# form_id = ""

# API host: https://api.jotform.com, https://eu-api.jotform.com or https://hipaa-api.jotform.com
base_url = "https://eu-api.jotform.com"

# Request timeout in seconds (0 disables the timeout)
timeout_secs = 30

[output]
# Full response payload, pretty printed
json_path = "submissions.json"

# One row per submission
csv_path = "submissions.csv"

# How CSV columns are chosen:
#   "first-submission" - columns of the first submission only; fields that only
#                        appear in later submissions are left out
#   "union"            - every field seen in any submission
csv_columns = "first-submission"

[logging]
# Log filter used when RUST_LOG is not set: "error", "warn", "info", "debug", "trace"
level = "warn"
"#
        .to_string()
    }

    /// Initialize config with a setup wizard
    pub fn init_wizard() -> Result<Self> {
        println!("jotform-export Configuration Setup");
        println!("==================================");

        let mut config = Config::default();

        let api_key = prompt("API key: ")?;
        if !api_key.is_empty() {
            config.api.api_key = Some(api_key);
        }

        let form_id = prompt("Form ID: ")?;
        if !form_id.is_empty() {
            config.api.form_id = Some(form_id);
        }

        let base_url = prompt(&format!("API host [{}]: ", config.api.base_url))?;
        if !base_url.is_empty() {
            config.api.base_url = base_url;
        }

        let union = prompt("Include fields from all submissions as CSV columns? (y/n) [n]: ")?;
        if union.eq_ignore_ascii_case("y") {
            config.output.csv_columns = ColumnPolicy::Union;
        }

        config.save()?;

        println!("\nConfiguration saved to: {:?}", Config::get_config_path()?);
        println!("You can edit this file directly to customize further.");

        Ok(config)
    }
}

fn prompt(question: &str) -> Result<String> {
    print!("{}", question);
    std::io::Write::flush(&mut std::io::stdout())?;
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.api.api_key.is_none());
        assert!(config.api.form_id.is_none());
        assert_eq!(config.api.base_url, "https://eu-api.jotform.com");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.output.json_path, PathBuf::from("submissions.json"));
        assert_eq!(config.output.csv_path, PathBuf::from("submissions.csv"));
        assert_eq!(config.output.csv_columns, ColumnPolicy::FirstSubmission);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        assert!(!toml_str.contains("api_key"));
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.api.base_url, parsed.api.base_url);
        assert_eq!(config.output.csv_columns, parsed.output.csv_columns);
    }

    #[test]
    fn test_commented_default_parses() {
        let parsed: Config = toml::from_str(&Config::create_default_with_comments()).unwrap();
        assert!(parsed.api.api_key.is_none());
        assert_eq!(parsed.api.timeout_secs, 30);
        assert_eq!(parsed.output.csv_columns, ColumnPolicy::FirstSubmission);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[api]\nform_id = \"250933582270356\"\n\n[output]\ncsv_columns = \"union\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.api.form_id.as_deref(), Some("250933582270356"));
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.output.csv_columns, ColumnPolicy::Union);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.api.form_id = Some("42".to_string());

        config.save_to(&path).unwrap();
        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.api.form_id.as_deref(), Some("42"));
    }

    #[test]
    fn test_env_overrides_win() {
        let env: HashMap<&str, &str> = [
            (ENV_API_KEY, "env-key"),
            (ENV_FORM_ID, "99"),
            (ENV_TIMEOUT_SECS, " 5 "),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.api.form_id = Some("from-file".to_string());
        config
            .apply_env_overrides(|name| env.get(name).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.api.api_key.as_deref(), Some("env-key"));
        assert_eq!(config.api.form_id.as_deref(), Some("99"));
        assert_eq!(config.api.timeout_secs, 5);
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_bad_timeout_env() {
        let mut config = Config::default();
        let result = config.apply_env_overrides(|name| {
            (name == ENV_TIMEOUT_SECS).then(|| "soon".to_string())
        });
        assert!(result.is_err());
    }
}
