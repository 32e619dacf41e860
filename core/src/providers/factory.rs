use crate::config::Config;
use crate::error::SetupError;
use crate::providers::{GeminiProvider, OllamaProvider, OpenAIProvider};
use crate::traits::Provider;
use std::sync::Arc;

pub fn create_provider(config: &Config) -> Result<Arc<dyn Provider>, SetupError> {
    let provider_name = config.provider.as_deref().unwrap_or("gemini");

    match provider_name.to_lowercase().as_str() {
        "gemini" => {
            let api_key = resolve_api_key_with_fallback(
                &["GEMINI_API", "GEMINI_API_KEY", "QUARRY_GEMINI_API_KEY"],
                &config.api_key,
            )?;
            let mut provider = GeminiProvider::new(api_key).with_model(config.model.clone());
            if let Some(base_url) = &config.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            Ok(Arc::new(provider))
        }
        "openai" => {
            let api_key = resolve_api_key_with_fallback(
                &["OPENAI_API_KEY", "QUARRY_OPENAI_API_KEY"],
                &config.api_key,
            )?;
            let mut provider = OpenAIProvider::new(api_key).with_model(config.model.clone());
            if let Some(base_url) = &config.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            Ok(Arc::new(provider))
        }
        "ollama" => {
            let mut provider = OllamaProvider::new().with_model(config.model.clone());
            if let Some(base_url) = &config.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            Ok(Arc::new(provider))
        }
        _ => Err(SetupError::Provider(format!(
            "unknown provider: {}. Available: gemini, openai, ollama",
            provider_name
        ))),
    }
}

fn resolve_api_key_with_fallback(env_vars: &[&str], config_key: &str) -> Result<String, SetupError> {
    for var_name in env_vars {
        if let Ok(key) = std::env::var(var_name)
            && !key.trim().is_empty()
        {
            return Ok(key);
        }
    }
    if !config_key.is_empty() {
        Ok(config_key.to_string())
    } else {
        Err(SetupError::Provider(format!(
            "no API key found; set {} or api_key in the config file",
            env_vars.join(" or ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_each_known_provider() {
        let mut config = Config {
            api_key: "from-config".into(),
            ..Config::default()
        };
        assert_eq!(create_provider(&config).unwrap().name(), "gemini");

        config.provider = Some("OpenAI".into());
        assert_eq!(create_provider(&config).unwrap().name(), "openai");

        config.provider = Some("ollama".into());
        config.api_key.clear();
        assert_eq!(create_provider(&config).unwrap().name(), "ollama");
    }

    #[test]
    fn unknown_provider_is_setup_error() {
        let config = Config {
            provider: Some("carrier-pigeon".into()),
            ..Config::default()
        };
        let err = create_provider(&config).err().unwrap();
        assert!(matches!(err, SetupError::Provider(msg) if msg.contains("carrier-pigeon")));
    }

    #[test]
    fn config_key_is_the_last_resort() {
        let key = resolve_api_key_with_fallback(&["QUARRY_TEST_UNSET_KEY_VAR"], "abc").unwrap();
        assert_eq!(key, "abc");
        assert!(resolve_api_key_with_fallback(&["QUARRY_TEST_UNSET_KEY_VAR"], "").is_err());
    }
}
