//! LLM provider implementations.
//!
//! `build(config, api_key)` is the factory, called once at startup.
//! Adding a new backend = new module + new match arm.

pub mod dummy;
pub mod openai_compatible;
pub mod scripted;

use tracing::debug;

use crate::config::LlmConfig;
use crate::llm::{LlmProvider, ProviderError};

/// Construct an `LlmProvider` from config and an optional API key.
///
/// `api_key` is sourced from the environment (never TOML). The hosted
/// `gemini` backend refuses to start without one; `openai` accepts `None` so
/// keyless local servers work.
pub fn build(config: &LlmConfig, api_key: Option<String>) -> Result<LlmProvider, ProviderError> {
    let provider = match config.provider.as_str() {
        "dummy" => LlmProvider::Dummy(dummy::DummyProvider),
        "gemini" => {
            let key = api_key
                .filter(|k| !k.trim().is_empty())
                .ok_or(ProviderError::MissingApiKey)?;
            LlmProvider::OpenAiCompatible(openai_compatible::OpenAiCompatibleProvider::new(
                config.gemini.clone(),
                Some(key),
            )?)
        }
        "openai" | "openai-compatible" => LlmProvider::OpenAiCompatible(
            openai_compatible::OpenAiCompatibleProvider::new(config.openai.clone(), api_key)?,
        ),
        other => return Err(ProviderError::UnknownProvider(other.to_string())),
    };
    debug!(provider = provider.name(), "llm provider built");
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gemini_requires_api_key() {
        let cfg = LlmConfig { provider: "gemini".into(), ..LlmConfig::default() };
        assert_eq!(build(&cfg, None).unwrap_err(), ProviderError::MissingApiKey);
        assert_eq!(build(&cfg, Some("  ".into())).unwrap_err(), ProviderError::MissingApiKey);
        assert!(matches!(
            build(&cfg, Some("key".into())),
            Ok(LlmProvider::OpenAiCompatible(_))
        ));
    }

    #[test]
    fn openai_allows_keyless() {
        let cfg = LlmConfig { provider: "openai".into(), ..LlmConfig::default() };
        assert!(matches!(build(&cfg, None), Ok(LlmProvider::OpenAiCompatible(_))));
    }

    #[test]
    fn dummy_builds() {
        let cfg = LlmConfig { provider: "dummy".into(), ..LlmConfig::default() };
        assert!(matches!(build(&cfg, None), Ok(LlmProvider::Dummy(_))));
    }

    #[test]
    fn unknown_provider_rejected() {
        let cfg = LlmConfig { provider: "palm".into(), ..LlmConfig::default() };
        assert_eq!(
            build(&cfg, None).unwrap_err(),
            ProviderError::UnknownProvider("palm".into())
        );
    }
}
