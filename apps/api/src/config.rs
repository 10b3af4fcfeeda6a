use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::embedding::{gemini, openai};
use crate::matching::handlers::MAX_TOP_K;
use crate::matching::hybrid::HybridWeights;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingBackend {
    Gemini,
    OpenAi,
}

impl EmbeddingBackend {
    fn api_key_var(self) -> &'static str {
        match self {
            EmbeddingBackend::Gemini => "GOOGLE_GEMINI_API_KEY",
            EmbeddingBackend::OpenAi => "OPENAI_API_KEY",
        }
    }

    fn default_model(self) -> &'static str {
        match self {
            EmbeddingBackend::Gemini => gemini::DEFAULT_MODEL,
            EmbeddingBackend::OpenAi => openai::DEFAULT_MODEL,
        }
    }
}

impl FromStr for EmbeddingBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(EmbeddingBackend::Gemini),
            "openai" => Ok(EmbeddingBackend::OpenAi),
            other => bail!("unknown embedding provider '{other}' (expected 'gemini' or 'openai')"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Fails at startup if the embedding API key is missing or a value is malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub embedding_backend: EmbeddingBackend,
    pub embedding_api_key: String,
    pub embedding_model: String,
    pub embedding_base_url: Option<String>,
    pub embedding_timeout: Duration,
    pub catalog_path: Option<PathBuf>,
    pub default_top_k: usize,
    pub candidate_pool: usize,
    pub hybrid_weights: HybridWeights,
    pub warm_embeddings_on_start: bool,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup (the environment, or a map in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let embedding_backend: EmbeddingBackend =
            parse_or(&lookup, "EMBEDDING_PROVIDER", EmbeddingBackend::Gemini)?;
        let key_var = embedding_backend.api_key_var();

        let config = Config {
            embedding_backend,
            embedding_api_key: lookup(key_var)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("Required environment variable '{key_var}' is not set"))?,
            embedding_model: lookup("EMBEDDING_MODEL")
                .unwrap_or_else(|| embedding_backend.default_model().to_string()),
            embedding_base_url: lookup("EMBEDDING_BASE_URL"),
            embedding_timeout: Duration::from_secs(parse_or(&lookup, "EMBEDDING_TIMEOUT_SECS", 30)?),
            catalog_path: lookup("CAREER_CATALOG_PATH").map(PathBuf::from),
            default_top_k: parse_or(&lookup, "DEFAULT_TOP_K", 10)?,
            candidate_pool: parse_or(&lookup, "CANDIDATE_POOL", 20)?,
            hybrid_weights: HybridWeights {
                embedding: parse_or(&lookup, "EMBEDDING_WEIGHT", 0.6)?,
                grade_match: parse_or(&lookup, "GRADE_MATCH_WEIGHT", 0.4)?,
            },
            warm_embeddings_on_start: parse_or(&lookup, "WARM_EMBEDDINGS_ON_START", false)?,
            port: parse_or(&lookup, "PORT", 8080)?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !(1..=MAX_TOP_K).contains(&self.default_top_k) {
            bail!("DEFAULT_TOP_K must be between 1 and {MAX_TOP_K}");
        }
        if !(1..=MAX_TOP_K).contains(&self.candidate_pool) {
            bail!("CANDIDATE_POOL must be between 1 and {MAX_TOP_K}");
        }
        if self.embedding_timeout.is_zero() {
            bail!("EMBEDDING_TIMEOUT_SECS must be greater than 0");
        }
        let HybridWeights {
            embedding,
            grade_match,
        } = self.hybrid_weights;
        if !(embedding.is_finite() && grade_match.is_finite()) || embedding < 0.0 || grade_match < 0.0 {
            bail!("EMBEDDING_WEIGHT and GRADE_MATCH_WEIGHT must be non-negative numbers");
        }
        Ok(())
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{key} has an invalid value '{raw}': {e}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_with_gemini_key() {
        let config = config_from(&[("GOOGLE_GEMINI_API_KEY", "g-key")]).unwrap();
        assert_eq!(config.embedding_backend, EmbeddingBackend::Gemini);
        assert_eq!(config.embedding_api_key, "g-key");
        assert_eq!(config.embedding_model, "text-embedding-004");
        assert_eq!(config.embedding_timeout, Duration::from_secs(30));
        assert_eq!(config.default_top_k, 10);
        assert_eq!(config.candidate_pool, 20);
        assert_eq!(config.hybrid_weights, HybridWeights::default());
        assert!(!config.warm_embeddings_on_start);
        assert_eq!(config.port, 8080);
        assert!(config.catalog_path.is_none());
    }

    #[test]
    fn test_openai_backend_uses_openai_key_and_model() {
        let config = config_from(&[
            ("EMBEDDING_PROVIDER", "OpenAI"),
            ("OPENAI_API_KEY", "sk-test"),
        ])
        .unwrap();
        assert_eq!(config.embedding_backend, EmbeddingBackend::OpenAi);
        assert_eq!(config.embedding_model, "text-embedding-3-small");
    }

    #[test]
    fn test_missing_api_key_fails() {
        let err = config_from(&[("EMBEDDING_PROVIDER", "openai")]).unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_unknown_provider_fails() {
        assert!(config_from(&[("EMBEDDING_PROVIDER", "cohere"), ("GOOGLE_GEMINI_API_KEY", "k")]).is_err());
    }

    #[test]
    fn test_malformed_number_names_the_variable() {
        let err = config_from(&[("GOOGLE_GEMINI_API_KEY", "k"), ("PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_top_k_out_of_range_fails() {
        assert!(config_from(&[("GOOGLE_GEMINI_API_KEY", "k"), ("DEFAULT_TOP_K", "0")]).is_err());
        assert!(config_from(&[("GOOGLE_GEMINI_API_KEY", "k"), ("DEFAULT_TOP_K", "500")]).is_err());
    }

    #[test]
    fn test_custom_weights_and_flags() {
        let config = config_from(&[
            ("GOOGLE_GEMINI_API_KEY", "k"),
            ("EMBEDDING_WEIGHT", "0.7"),
            ("GRADE_MATCH_WEIGHT", "0.3"),
            ("WARM_EMBEDDINGS_ON_START", "true"),
            ("CAREER_CATALOG_PATH", "/etc/careerlens/careers.json"),
        ])
        .unwrap();
        assert_eq!(config.hybrid_weights.embedding, 0.7);
        assert_eq!(config.hybrid_weights.grade_match, 0.3);
        assert!(config.warm_embeddings_on_start);
        assert_eq!(
            config.catalog_path,
            Some(PathBuf::from("/etc/careerlens/careers.json"))
        );
    }

    #[test]
    fn test_negative_weight_fails() {
        assert!(config_from(&[("GOOGLE_GEMINI_API_KEY", "k"), ("EMBEDDING_WEIGHT", "-1")]).is_err());
    }
}
