//! Machine translation gateway for autolocale
//!
//! This crate wraps the translation vendor behind the [`MachineTranslator`]
//! trait: single and batch text translation, locale-code normalization,
//! formatting settings and a reachability probe.
//!
//! # Example
//!
//! ```ignore
//! use autolocale_mt::{DeepLConfig, DeepLProvider, MachineTranslator, TranslationSettings};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DeepLConfig::resolve(None, None, |name| std::env::var(name).ok())?;
//!     let provider = DeepLProvider::new(config)?;
//!
//!     let texts = vec!["Hello world".to_string(), "Read more".to_string()];
//!     let translated = provider
//!         .translate_batch(&texts, Some("en"), "lt", &TranslationSettings::default())
//!         .await?;
//!
//!     println!("{:?}", translated);
//!     Ok(())
//! }
//! ```

pub mod deepl;
pub mod error;
pub mod mock;
pub mod settings;
pub mod translator;

// Re-export main types for convenient access
pub use deepl::{DeepLConfig, DeepLProvider};
pub use error::{MtError, MtResult};
pub use mock::{MockMode, MockTranslator};
pub use settings::{Formality, SplitSentences, TagHandling, TranslationSettings};
pub use translator::{MachineTranslator, normalize_locale, validate_locale};
