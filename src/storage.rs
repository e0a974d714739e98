//! Document store interface and write context
//!
//! The store itself lives outside this crate; everything here is the contract
//! the orchestrator talks to. [`InMemoryStore`](crate::memory_store::InMemoryStore)
//! is the in-process implementation used by the server and the tests.

use crate::document::Document;
use crate::error::StorageError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Why a write happened
///
/// Carried on every write so that change hooks can tell user edits apart
/// from writes the translator made itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassIntent {
    /// A person edited the document
    UserEdit,
    /// The write stores the result of a translation pass
    TranslationEcho,
    /// A bulk maintenance write that must not fan out
    BulkReindex,
}

impl PassIntent {
    /// Only user edits start a new translation pass
    pub fn triggers_translation(&self) -> bool {
        matches!(self, PassIntent::UserEdit)
    }
}

/// Transient flags attached to one write call; never persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteContext {
    pub intent: PassIntent,
    /// Skip recomputation of derived fields such as slugs
    pub skip_derived_fields: bool,
}

impl WriteContext {
    pub fn user_edit() -> Self {
        Self {
            intent: PassIntent::UserEdit,
            skip_derived_fields: false,
        }
    }

    /// Context for writes originated by a translation pass
    pub fn translation_echo() -> Self {
        Self {
            intent: PassIntent::TranslationEcho,
            skip_derived_fields: true,
        }
    }

    pub fn bulk_reindex() -> Self {
        Self {
            intent: PassIntent::BulkReindex,
            skip_derived_fields: true,
        }
    }

    /// True when hooks must not translate in response to this write
    pub fn skip_translate(&self) -> bool {
        !self.intent.triggers_translation()
    }
}

impl Default for WriteContext {
    fn default() -> Self {
        Self::user_edit()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
}

/// Emitted by a store after every successful write
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub collection: String,
    pub locale: String,
    pub operation: Operation,
    pub document: Document,
    pub context: WriteContext,
}

/// Per-locale document persistence
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Look up one locale record; `Ok(None)` when it does not exist
    async fn find_by_id(
        &self,
        collection: &str,
        id: &str,
        locale: &str,
    ) -> Result<Option<Document>, StorageError>;

    /// Merge `data` into an existing locale record; a `_status` entry sets the status
    async fn update(
        &self,
        collection: &str,
        id: &str,
        data: Map<String, Value>,
        locale: &str,
        context: WriteContext,
    ) -> Result<Document, StorageError>;

    /// Create a new locale record
    async fn create(
        &self,
        collection: &str,
        document: Document,
        locale: &str,
        context: WriteContext,
    ) -> Result<Document, StorageError>;

    /// List up to `limit` records of a collection in one locale
    async fn find(
        &self,
        collection: &str,
        locale: &str,
        limit: usize,
    ) -> Result<Vec<Document>, StorageError>;
}
