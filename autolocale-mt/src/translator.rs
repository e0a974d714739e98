//! Machine Translation trait and utilities
//!
//! This module defines the `MachineTranslator` trait for provider abstraction,
//! so the orchestrator can run against DeepL in production and against the
//! deterministic mock in tests without knowing which one it holds.
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
//!
//!     let result = provider.translate("Hello, world!", Some("en"), "fr", &settings).await?;
//!     println!("{}", result); // "Bonjour, le monde !"
//!
//!     let texts = vec!["Hello".to_string(), "Goodbye".to_string()];
//!     let results = provider.translate_batch(&texts, Some("en"), "fr", &settings).await?;
//!     println!("{:?}", results);
//!
//!     Ok(())
//! }
//! ```

use crate::error::{MtError, MtResult};
use crate::settings::TranslationSettings;
use async_trait::async_trait;

/// Generic trait for machine translation providers
///
/// All methods are async to support I/O-bound operations like network requests.
/// Implementations must be safe to share between concurrently running
/// per-locale tasks.
#[async_trait]
pub trait MachineTranslator: Send + Sync {
    /// Translate a single text string into the target locale
    ///
    /// # Arguments
    ///
    /// * `text` - The text to translate
    /// * `source_locale` - Source language code, or `None` to let the vendor detect it
    /// * `target_locale` - Target language code (e.g., "fr", "pt-br")
    /// * `settings` - Formatting options forwarded to the vendor
    ///
    /// # Errors
    ///
    /// Always surfaces vendor failures. Falling back to the untranslated
    /// text is a caller decision.
    async fn translate(
        &self,
        text: &str,
        source_locale: Option<&str>,
        target_locale: &str,
        settings: &TranslationSettings,
    ) -> MtResult<String>;

    /// Translate multiple strings in a single batch operation
    ///
    /// # Guarantees
    ///
    /// - Output order matches input order
    /// - Output length equals input length, otherwise `MtError::CountMismatch`
    async fn translate_batch(
        &self,
        texts: &[String],
        source_locale: Option<&str>,
        target_locale: &str,
        settings: &TranslationSettings,
    ) -> MtResult<Vec<String>>;

    /// Probe whether the vendor is reachable. Never fails; returns `false` instead.
    async fn health_check(&self) -> bool;

    /// Get the name of this translation provider
    ///
    /// Used for logging and the health endpoint.
    fn provider_name(&self) -> &str;
}

/// Locale codes accepted by DeepL, keyed by lower-case ISO 639-1 code
const VENDOR_LANGUAGE_CODES: &[(&str, &str)] = &[
    ("en", "EN"),
    ("de", "DE"),
    ("fr", "FR"),
    ("it", "IT"),
    ("ja", "JA"),
    ("es", "ES"),
    ("pt", "PT"),
    ("ru", "RU"),
    ("zh", "ZH"),
    ("nl", "NL"),
    ("pl", "PL"),
    ("bg", "BG"),
    ("cs", "CS"),
    ("da", "DA"),
    ("el", "EL"),
    ("et", "ET"),
    ("fi", "FI"),
    ("hu", "HU"),
    ("id", "ID"),
    ("ko", "KO"),
    ("lt", "LT"),
    ("lv", "LV"),
    ("nb", "NB"),
    ("ro", "RO"),
    ("sk", "SK"),
    ("sl", "SL"),
    ("sv", "SV"),
    ("tr", "TR"),
    ("uk", "UK"),
    ("ar", "AR"),
    ("hi", "HI"),
    ("th", "TH"),
    ("vi", "VI"),
];

/// Map a locale code to the vendor's upper-case language code
///
/// Known ISO codes go through the lookup table. Anything else is upper-cased
/// verbatim, so regional variants like `pt-br` become `PT-BR`. Never fails.
///
/// # Example
///
/// ```ignore
/// assert_eq!(normalize_locale("fr"), "FR");
/// assert_eq!(normalize_locale("pt-br"), "PT-BR");
/// ```
pub fn normalize_locale(locale: &str) -> String {
    let lower = locale.to_lowercase();
    VENDOR_LANGUAGE_CODES
        .iter()
        .find(|(iso, _)| *iso == lower)
        .map(|(_, vendor)| vendor.to_string())
        .unwrap_or_else(|| locale.to_uppercase())
}

/// Validate that a locale code is in acceptable format
///
/// Checks that the locale code contains only alphanumeric characters,
/// hyphens, and underscores.
pub fn validate_locale(locale: &str) -> MtResult<()> {
    if locale.is_empty() {
        return Err(MtError::InvalidLocale("Locale code is empty".to_string()));
    }

    if !locale
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(MtError::InvalidLocale(format!(
            "Invalid characters in locale code: {}",
            locale
        )));
    }

    Ok(())
}
