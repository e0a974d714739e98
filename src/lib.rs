//! Automatic field translation for localized document collections
//!
//! A translation pass reads a document in its source locale, translates the
//! configured fields through a [`MachineTranslator`](autolocale_mt::MachineTranslator)
//! and writes one record per target locale back to a [`DocumentStore`].
//!
//! ```no_run
//! use autolocale::{InMemoryStore, Orchestrator, PluginConfig, TranslationRequest};
//! use autolocale_mt::DeepLProvider;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PluginConfig::load("autolocale.toml")?;
//! let translator = DeepLProvider::new(config.gateway_config()?)?;
//! let orchestrator = Orchestrator::new(
//!     Arc::new(InMemoryStore::new()),
//!     Arc::new(translator),
//!     Arc::new(config),
//! );
//!
//! let report = orchestrator
//!     .translate_document(&TranslationRequest::new("insights", "42", "en"))
//!     .await?;
//! println!("written: {:?}", report.written_locales());
//! # Ok(())
//! # }
//! ```

pub mod access;
pub mod config;
pub mod document;
pub mod error;
pub mod field;
pub mod hooks;
pub mod memory_store;
pub mod orchestrator;
pub mod richtext;
pub mod storage;


pub use access::{AccessDecision, DenyReason, Principal, authorize, authorize_system};
pub use config::{CollectionAccess, CollectionOptions, Localization, PluginConfig};
pub use document::{
    Document, DocumentStatus, FieldDescriptor, FieldKind, FieldShape, STATUS_KEY,
};
pub use error::{Result, StorageError, TranslateError};
pub use field::{FieldOutcome, FieldReport};
pub use hooks::{HookStats, TranslationHook};
pub use memory_store::InMemoryStore;
pub use orchestrator::{
    BulkReport, BulkRequest, LocaleReport, LocaleStatus, Orchestrator, PassReport,
    TranslationRequest, Trigger,
};
pub use richtext::{NodePath, RichText, TextMap};
pub use storage::{ChangeEvent, DocumentStore, Operation, PassIntent, WriteContext};
