use crate::agent::loop_::DEFAULT_MAX_STEPS;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const QUARRY_DIR: &str = ".quarry";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub provider: Option<String>,
    pub api_key: String,
    pub base_url: Option<String>,
    pub model: String,
    pub database_path: PathBuf,
    pub max_steps: usize,
    pub temperature: f64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            provider: Some("gemini".to_string()),
            api_key: String::new(),
            base_url: None,
            model: "gemini-2.5-flash".to_string(),
            database_path: PathBuf::from("library.db"),
            max_steps: DEFAULT_MAX_STEPS,
            temperature: 0.0,
        }
    }
}

pub fn get_quarry_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(QUARRY_DIR)
}

pub fn get_config_path() -> PathBuf {
    get_quarry_dir().join("config.toml")
}

pub fn ensure_quarry_dir() -> Result<PathBuf> {
    let quarry_dir = get_quarry_dir();

    if !quarry_dir.exists() {
        std::fs::create_dir_all(&quarry_dir).with_context(|| {
            format!(
                "Failed to create quarry directory at {}",
                quarry_dir.display()
            )
        })?;
    }

    Ok(quarry_dir)
}

impl Config {
    pub fn load_or_init() -> Result<Self> {
        if config_exists() {
            load_config()
        } else {
            Ok(Config::default())
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config")
    }
}

pub fn load_config() -> Result<Config> {
    let config_path = get_config_path();

    let content = std::fs::read_to_string(&config_path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            anyhow::anyhow!(
                "Config file not found. Run 'quarry onboard' to set up your configuration."
            )
        } else {
            anyhow::anyhow!("Failed to read config from {}: {}", config_path.display(), e)
        }
    })?;

    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config from {}", config_path.display()))
}

pub fn save_config(config: &Config) -> Result<()> {
    ensure_quarry_dir()?;

    let config_path = get_config_path();
    let content =
        toml::to_string_pretty(config).with_context(|| "Failed to serialize config to TOML")?;

    std::fs::write(&config_path, content)
        .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

    Ok(())
}

pub fn config_exists() -> bool {
    get_config_path().exists()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let config = Config::from_toml("provider = \"openai\"\nmodel = \"gpt-4o\"\n").unwrap();
        assert_eq!(config.provider.as_deref(), Some("openai"));
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.max_steps, DEFAULT_MAX_STEPS);
        assert_eq!(config.database_path, PathBuf::from("library.db"));
    }

    #[test]
    fn round_trips_through_toml() {
        let config = Config {
            base_url: Some("http://localhost:11434".into()),
            max_steps: 4,
            ..Config::default()
        };
        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(Config::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(Config::from_toml("max_steps = \"many\"").is_err());
    }
}
