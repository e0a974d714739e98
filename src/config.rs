//! Plugin configuration
//!
//! Loaded from TOML by the server binary:
//!
//! ```toml
//! enabled = true
//! deepl_api_url = "https://api-free.deepl.com/v2/translate"
//!
//! [localization]
//! default_locale = "en"
//! locales = ["en", "lt", "uk"]
//!
//! [collections.insights]
//! only_missing = false
//! fields = [
//!     { name = "title", kind = "plain_text" },
//!     { name = "content", kind = "rich_text" },
//! ]
//! settings = { formality = "prefer_more" }
//! ```

use crate::document::FieldDescriptor;
use crate::error::{Result, TranslateError};
use autolocale_mt::{DeepLConfig, MtResult, TranslationSettings};
use icu_locale::Locale;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Explicit vendor key; the environment is consulted when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deepl_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deepl_api_url: Option<String>,
    pub localization: Localization,
    #[serde(default)]
    pub collections: BTreeMap<String, CollectionOptions>,
}

/// The configured locale set and its source locale
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Localization {
    pub default_locale: String,
    pub locales: Vec<String>,
}

impl Localization {
    pub fn new(default_locale: &str, locales: &[&str]) -> Self {
        Self {
            default_locale: default_locale.to_string(),
            locales: locales.iter().map(|l| l.to_string()).collect(),
        }
    }

    /// Locales to translate into from `source`, in configured order
    ///
    /// The source is always excluded. When `allow` is given, only codes it
    /// contains are kept.
    pub fn target_locales(&self, source: &str, allow: Option<&[String]>) -> Vec<String> {
        self.locales
            .iter()
            .filter(|locale| locale.as_str() != source)
            .filter(|locale| allow.is_none_or(|codes| codes.iter().any(|c| c == *locale)))
            .cloned()
            .collect()
    }

    pub fn contains(&self, locale: &str) -> bool {
        self.locales.iter().any(|l| l == locale)
    }

    fn validate(&self) -> Result<()> {
        if self.locales.is_empty() {
            return Err(TranslateError::Config("No locales configured".to_string()));
        }
        for code in &self.locales {
            code.parse::<Locale>().map_err(|e| {
                TranslateError::Config(format!("Invalid locale code '{}': {}", code, e))
            })?;
        }
        if !self.contains(&self.default_locale) {
            return Err(TranslateError::Config(format!(
                "Default locale '{}' is not in the locale set",
                self.default_locale
            )));
        }
        Ok(())
    }
}

/// Per-collection access switches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionAccess {
    #[serde(default = "default_true")]
    pub translate: bool,
}

impl Default for CollectionAccess {
    fn default() -> Self {
        Self { translate: true }
    }
}

/// Translation options of one collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionOptions {
    pub fields: Vec<FieldDescriptor>,
    #[serde(default, skip_serializing_if = "TranslationSettings::is_empty")]
    pub settings: TranslationSettings,
    #[serde(default)]
    pub access: CollectionAccess,
    /// Default only-missing policy for passes started by change hooks
    #[serde(default)]
    pub only_missing: bool,
}

impl CollectionOptions {
    pub fn new(fields: Vec<FieldDescriptor>) -> Self {
        Self {
            fields,
            settings: TranslationSettings::default(),
            access: CollectionAccess::default(),
            only_missing: false,
        }
    }
}

impl PluginConfig {
    pub fn new(localization: Localization) -> Self {
        Self {
            enabled: true,
            deepl_api_key: None,
            deepl_api_url: None,
            localization,
            collections: BTreeMap::new(),
        }
    }

    pub fn with_collection(mut self, slug: impl Into<String>, options: CollectionOptions) -> Self {
        self.collections.insert(slug.into(), options);
        self
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: PluginConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<()> {
        self.localization.validate()?;
        for (slug, options) in &self.collections {
            if options.fields.is_empty() {
                return Err(TranslateError::Config(format!(
                    "Collection '{}' has no fields to translate",
                    slug
                )));
            }
        }
        Ok(())
    }

    pub fn collection(&self, slug: &str) -> Option<&CollectionOptions> {
        self.collections.get(slug)
    }

    /// Resolve the gateway configuration, falling back to the environment
    pub fn gateway_config(&self) -> MtResult<DeepLConfig> {
        DeepLConfig::resolve(
            self.deepl_api_key.as_deref(),
            self.deepl_api_url.as_deref(),
            |name| std::env::var(name).ok(),
        )
    }
}
