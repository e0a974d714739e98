//! Mock Machine Translator for testing
//!
//! This module provides a deterministic, API-free translator for exercising
//! translation passes without API keys or network access.
//!
//! # Example
//!
//! ```ignore
//! use autolocale_mt::{MachineTranslator, MockMode, MockTranslator, TranslationSettings};
//!
//! #[tokio::test]
//! async fn test_translation() {
//!     let mock = MockTranslator::new(MockMode::Suffix);
//!     let settings = TranslationSettings::default();
//!     let result = mock.translate("hello", Some("en"), "fr", &settings).await.unwrap();
//!     assert_eq!(result, "hello_fr");
//! }
//! ```

use crate::error::{MtError, MtResult};
use crate::settings::TranslationSettings;
use crate::translator::MachineTranslator;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Mock translation modes for testing different scenarios
#[derive(Debug, Clone)]
pub enum MockMode {
    /// Append locale suffix: "hello" → "hello_fr"
    Suffix,

    /// Use predefined mappings for realistic translations
    /// (text, target_locale) → translation, falling back to `Suffix`
    Mappings(HashMap<(String, String), String>),

    /// Swap the case of every character: "Hello" → "hELLO"
    SwapCase,

    /// Reverse the order of words separated by spaces
    Reorder,

    /// Every call fails with an upstream error carrying this message
    Error(String),

    /// No-op: return input unchanged
    NoOp,
}

/// Mock translator that simulates various translation scenarios
///
/// Clones share the call counter, so a clone handed to the orchestrator can
/// be inspected from the test that created it.
#[derive(Debug, Clone)]
pub struct MockTranslator {
    mode: MockMode,
    /// Optional simulated network delay (in milliseconds)
    delay_ms: u64,
    /// Texts that make any call containing them fail
    failing: HashSet<String>,
    healthy: bool,
    calls: Arc<AtomicUsize>,
}

impl MockTranslator {
    /// Create a new MockTranslator with the given mode
    pub fn new(mode: MockMode) -> Self {
        Self {
            mode,
            delay_ms: 0,
            failing: HashSet::new(),
            healthy: true,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a MockTranslator with simulated network delay
    pub fn with_delay(mode: MockMode, delay_ms: u64) -> Self {
        Self {
            delay_ms,
            ..Self::new(mode)
        }
    }

    /// Build a `Mappings` translator from `(text, target, translation)` triples
    pub fn with_mappings<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str, &'a str)>) -> Self {
        let map = entries
            .into_iter()
            .map(|(text, target, translation)| {
                ((text.to_string(), target.to_string()), translation.to_string())
            })
            .collect();
        Self::new(MockMode::Mappings(map))
    }

    /// Make every call that contains `text` fail with a 503 upstream error
    pub fn failing_on(mut self, text: impl Into<String>) -> Self {
        self.failing.insert(text.into());
        self
    }

    /// Make `health_check` report the vendor as unreachable
    pub fn unhealthy(mut self) -> Self {
        self.healthy = false;
        self
    }

    /// Number of `translate`/`translate_batch` calls made so far, across clones
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn begin_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }
    }

    fn check_failure(&self, text: &str) -> MtResult<()> {
        if self.failing.contains(text) {
            return Err(MtError::UpstreamError {
                status: 503,
                message: format!("Simulated failure for \"{}\"", text),
            });
        }
        Ok(())
    }

    /// Apply translation logic based on the mode
    fn apply_translation(&self, text: &str, target: &str) -> MtResult<String> {
        match &self.mode {
            MockMode::Suffix => Ok(format!("{}_{}", text, target)),
            MockMode::Mappings(map) => {
                let key = (text.to_string(), target.to_string());
                Ok(map
                    .get(&key)
                    .cloned()
                    .unwrap_or_else(|| format!("{}_{}", text, target)))
            }
            MockMode::SwapCase => Ok(text
                .chars()
                .map(|c| {
                    if c.is_uppercase() {
                        c.to_lowercase().collect::<String>()
                    } else {
                        c.to_uppercase().collect::<String>()
                    }
                })
                .collect()),
            MockMode::Reorder => {
                let words: Vec<&str> = text.split_whitespace().collect();
                Ok(words.into_iter().rev().collect::<Vec<_>>().join(" "))
            }
            MockMode::Error(msg) => Err(MtError::UpstreamError {
                status: 500,
                message: msg.clone(),
            }),
            MockMode::NoOp => Ok(text.to_string()),
        }
    }
}

#[async_trait]
impl MachineTranslator for MockTranslator {
    async fn translate(
        &self,
        text: &str,
        _source_locale: Option<&str>,
        target_locale: &str,
        _settings: &TranslationSettings,
    ) -> MtResult<String> {
        self.begin_call().await;
        self.check_failure(text)?;
        self.apply_translation(text, target_locale)
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        _source_locale: Option<&str>,
        target_locale: &str,
        _settings: &TranslationSettings,
    ) -> MtResult<Vec<String>> {
        // One simulated request per batch, like the real provider
        self.begin_call().await;
        for text in texts {
            self.check_failure(text)?;
        }

        texts
            .iter()
            .map(|text| self.apply_translation(text, target_locale))
            .collect()
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn provider_name(&self) -> &str {
        "Mock Translator"
    }
}
