//! DeepL API provider for machine translation
//!
//! This module integrates with the DeepL v2 REST API to provide real
//! machine translation.
//!
//! # Authentication
//!
//! The API key is resolved once, at construction: an explicit key wins,
//! otherwise the `DEEPL_API_KEY` environment variable is used. The endpoint
//! can be overridden the same way through `DEEPL_API_URL`.
//!
//! # Example
//!
//! ```ignore
//! use autolocale_mt::{DeepLProvider, MachineTranslator, TranslationSettings};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = DeepLProvider::from_env()?;
//!     let settings = TranslationSettings::default();
//!     let result = provider.translate("Hello, world!", Some("en"), "de", &settings).await?;
//!     println!("{}", result);
//!     Ok(())
//! }
//! ```

use crate::error::{MtError, MtResult};
use crate::settings::TranslationSettings;
use crate::translator::{MachineTranslator, normalize_locale, validate_locale};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use tracing::{debug, warn};

/// Default DeepL Pro endpoint
pub const DEFAULT_API_URL: &str = "https://api.deepl.com/v2/translate";
/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "DEEPL_API_KEY";
/// Environment variable overriding the endpoint
pub const API_URL_ENV: &str = "DEEPL_API_URL";

/// Immutable credential and endpoint configuration for [`DeepLProvider`]
#[derive(Clone, PartialEq, Eq)]
pub struct DeepLConfig {
    api_key: String,
    api_url: String,
}

impl DeepLConfig {
    /// Create a configuration with an explicit API key and the default endpoint
    ///
    /// # Errors
    ///
    /// `MtError::ConfigError` if the key is empty or whitespace.
    pub fn new(api_key: impl Into<String>) -> MtResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(MtError::ConfigError("API key cannot be empty".to_string()));
        }
        Ok(Self {
            api_key,
            api_url: DEFAULT_API_URL.to_string(),
        })
    }

    /// Replace the translate endpoint
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Resolve the configuration from explicit options first, then from `env`
    ///
    /// `env` is a variable lookup, normally `std::env::var`; tests inject
    /// a closure instead of mutating the process environment.
    pub fn resolve<F>(explicit_key: Option<&str>, explicit_url: Option<&str>, env: F) -> MtResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = explicit_key
            .filter(|key| !key.trim().is_empty())
            .map(str::to_string)
            .or_else(|| env(API_KEY_ENV))
            .ok_or_else(|| {
                MtError::ConfigError(format!(
                    "DeepL API key is required. Set {} or pass deepl_api_key in the plugin configuration",
                    API_KEY_ENV
                ))
            })?;

        let config = Self::new(api_key)?;
        let api_url = explicit_url
            .filter(|url| !url.trim().is_empty())
            .map(str::to_string)
            .or_else(|| env(API_URL_ENV));

        Ok(match api_url {
            Some(url) => config.with_api_url(url),
            None => config,
        })
    }

    /// Resolve the configuration from the process environment only
    pub fn from_env() -> MtResult<Self> {
        Self::resolve(None, None, |name| std::env::var(name).ok())
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// The usage endpoint next to the translate endpoint, used for health probes
    ///
    /// Only a trailing `/translate` segment is replaced; a URL without one is
    /// taken as the API base.
    pub fn usage_url(&self) -> String {
        let url = self.api_url.trim_end_matches('/');
        let base = url.strip_suffix("/translate").unwrap_or(url);
        format!("{}/usage", base)
    }

    fn authorization(&self) -> String {
        format!("DeepL-Auth-Key {}", self.api_key)
    }
}

impl std::fmt::Debug for DeepLConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeepLConfig")
            .field("api_key", &"***")
            .field("api_url", &self.api_url)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct DeepLResponse {
    #[serde(default)]
    translations: Vec<DeepLTranslation>,
}

#[derive(Debug, Deserialize)]
struct DeepLTranslation {
    #[allow(dead_code)]
    #[serde(default)]
    detected_source_language: Option<String>,
    text: String,
}

/// DeepL API v2 provider
///
/// Supports both single and batch translations with automatic request chunking.
#[derive(Clone)]
pub struct DeepLProvider {
    config: DeepLConfig,
    client: reqwest::Client,
}

impl DeepLProvider {
    /// Maximum number of texts per API request
    const MAX_BATCH_SIZE: usize = 50;

    /// Create a provider around an already-resolved configuration
    pub fn new(config: DeepLConfig) -> MtResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| MtError::NetworkError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Create a provider from `DEEPL_API_KEY` / `DEEPL_API_URL`
    pub fn from_env() -> MtResult<Self> {
        Self::new(DeepLConfig::from_env()?)
    }

    pub fn config(&self) -> &DeepLConfig {
        &self.config
    }

    fn chunk_batch(texts: &[String]) -> Vec<&[String]> {
        texts.chunks(Self::MAX_BATCH_SIZE).collect()
    }

    /// Build the url-encoded form body for one request
    fn build_form(
        texts: &[String],
        source_locale: Option<&str>,
        target_locale: &str,
        settings: &TranslationSettings,
    ) -> Vec<(&'static str, String)> {
        let mut params: Vec<(&'static str, String)> =
            texts.iter().map(|text| ("text", text.clone())).collect();

        params.push(("target_lang", normalize_locale(target_locale)));
        if let Some(source) = source_locale {
            params.push(("source_lang", normalize_locale(source)));
        }
        if let Some(formality) = settings.formality {
            params.push(("formality", formality.as_str().to_string()));
        }
        if let Some(preserve) = settings.preserve_formatting {
            params.push(("preserve_formatting", if preserve { "1" } else { "0" }.to_string()));
        }
        if let Some(tag_handling) = settings.tag_handling {
            params.push(("tag_handling", tag_handling.as_str().to_string()));
        }
        if let Some(split) = settings.split_sentences {
            params.push(("split_sentences", split.as_str().to_string()));
        }

        params
    }

    /// Translate a single chunk of texts via the API
    ///
    /// Returns whatever the vendor sent back; count checks are the caller's job.
    async fn translate_chunk(
        &self,
        texts: &[String],
        source_locale: Option<&str>,
        target_locale: &str,
        settings: &TranslationSettings,
    ) -> MtResult<Vec<String>> {
        let form = Self::build_form(texts, source_locale, target_locale, settings);

        debug!(
            count = texts.len(),
            target = target_locale,
            "Sending translation request"
        );

        let response = self
            .client
            .post(self.config.api_url())
            .header(AUTHORIZATION, self.config.authorization())
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            warn!(status = status.as_u16(), "DeepL API error: {}", error_text);

            return Err(MtError::UpstreamError {
                status: status.as_u16(),
                message: format!(
                    "{} - {}",
                    status.canonical_reason().unwrap_or("Unknown status"),
                    error_text
                ),
            });
        }

        let body: DeepLResponse = response.json().await.map_err(|e| {
            MtError::TranslationError(format!("Failed to parse API response: {}", e))
        })?;

        Ok(body.translations.into_iter().map(|t| t.text).collect())
    }
}

impl std::fmt::Debug for DeepLProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeepLProvider")
            .field("config", &self.config)
            .finish()
    }
}

#[async_trait]
impl MachineTranslator for DeepLProvider {
    async fn translate(
        &self,
        text: &str,
        source_locale: Option<&str>,
        target_locale: &str,
        settings: &TranslationSettings,
    ) -> MtResult<String> {
        if let Some(source) = source_locale {
            validate_locale(source)?;
        }
        validate_locale(target_locale)?;

        if text.is_empty() {
            return Ok(String::new());
        }

        let results = self
            .translate_chunk(&[text.to_string()], source_locale, target_locale, settings)
            .await?;

        results.into_iter().next().ok_or(MtError::EmptyResponse)
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        source_locale: Option<&str>,
        target_locale: &str,
        settings: &TranslationSettings,
    ) -> MtResult<Vec<String>> {
        if let Some(source) = source_locale {
            validate_locale(source)?;
        }
        validate_locale(target_locale)?;

        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut all_results = Vec::with_capacity(texts.len());

        // Chunks go out sequentially so the output order is the input order
        for chunk in Self::chunk_batch(texts) {
            let chunk_results = self
                .translate_chunk(chunk, source_locale, target_locale, settings)
                .await?;

            if chunk_results.len() != chunk.len() {
                return Err(MtError::CountMismatch {
                    expected: chunk.len(),
                    actual: chunk_results.len(),
                });
            }
            all_results.extend(chunk_results);
        }

        Ok(all_results)
    }

    async fn health_check(&self) -> bool {
        let result = self
            .client
            .get(self.config.usage_url())
            .header(AUTHORIZATION, self.config.authorization())
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                warn!(status = response.status().as_u16(), "DeepL health check failed");
                false
            }
            Err(e) => {
                warn!("DeepL health check failed: {}", e);
                false
            }
        }
    }

    fn provider_name(&self) -> &str {
        "DeepL"
    }
}
