//! In-process [`DocumentStore`] keyed by collection, id and locale

use crate::document::Document;
use crate::error::StorageError;
use crate::storage::{ChangeEvent, DocumentStore, Operation, WriteContext};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RecordKey {
    collection: String,
    id: String,
    locale: String,
}

impl RecordKey {
    fn new(collection: &str, id: &str, locale: &str) -> Self {
        Self {
            collection: collection.to_string(),
            id: id.to_string(),
            locale: locale.to_string(),
        }
    }
}

/// Document store backed by a hash map
///
/// Clones share the same records. When built with
/// [`with_change_feed`](Self::with_change_feed), every successful write is
/// published as a [`ChangeEvent`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    records: Arc<RwLock<HashMap<RecordKey, Document>>>,
    changes: Option<mpsc::UnboundedSender<ChangeEvent>>,
    /// Locales whose writes fail with `StorageError::Unavailable`
    failing_locales: Arc<RwLock<HashSet<String>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_change_feed() -> (Self, mpsc::UnboundedReceiver<ChangeEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let store = Self {
            changes: Some(tx),
            ..Default::default()
        };
        (store, rx)
    }

    /// Insert a record directly, without emitting a change event
    pub async fn seed(&self, collection: &str, locale: &str, document: Document) {
        let key = RecordKey::new(collection, &document.id, locale);
        self.records.write().await.insert(key, document);
    }

    /// Make every write to `locale` fail
    pub async fn fail_writes_for(&self, locale: &str) {
        self.failing_locales.write().await.insert(locale.to_string());
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    async fn check_writable(&self, locale: &str) -> Result<(), StorageError> {
        if self.failing_locales.read().await.contains(locale) {
            return Err(StorageError::Unavailable(format!(
                "writes to locale {} are failing",
                locale
            )));
        }
        Ok(())
    }

    fn publish(
        &self,
        collection: &str,
        locale: &str,
        operation: Operation,
        document: &Document,
        context: WriteContext,
    ) {
        if let Some(tx) = &self.changes {
            let event = ChangeEvent {
                collection: collection.to_string(),
                locale: locale.to_string(),
                operation,
                document: document.clone(),
                context,
            };
            // A closed feed only means nobody listens any more
            if tx.send(event).is_err() {
                debug!(collection, locale, "Change feed closed, event dropped");
            }
        }
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn find_by_id(
        &self,
        collection: &str,
        id: &str,
        locale: &str,
    ) -> Result<Option<Document>, StorageError> {
        let key = RecordKey::new(collection, id, locale);
        Ok(self.records.read().await.get(&key).cloned())
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        data: Map<String, Value>,
        locale: &str,
        context: WriteContext,
    ) -> Result<Document, StorageError> {
        self.check_writable(locale).await?;
        let key = RecordKey::new(collection, id, locale);
        let updated = {
            let mut records = self.records.write().await;
            let document = records.get_mut(&key).ok_or_else(|| StorageError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
                locale: locale.to_string(),
            })?;
            document.merge(data);
            document.clone()
        };
        debug!(collection, id, locale, intent = ?context.intent, "Updated record");
        self.publish(collection, locale, Operation::Update, &updated, context);
        Ok(updated)
    }

    async fn create(
        &self,
        collection: &str,
        document: Document,
        locale: &str,
        context: WriteContext,
    ) -> Result<Document, StorageError> {
        self.check_writable(locale).await?;
        let key = RecordKey::new(collection, &document.id, locale);
        {
            let mut records = self.records.write().await;
            if records.contains_key(&key) {
                return Err(StorageError::Conflict {
                    collection: collection.to_string(),
                    id: document.id.clone(),
                    locale: locale.to_string(),
                });
            }
            records.insert(key, document.clone());
        }
        debug!(collection, id = %document.id, locale, intent = ?context.intent, "Created record");
        self.publish(collection, locale, Operation::Create, &document, context);
        Ok(document)
    }

    async fn find(
        &self,
        collection: &str,
        locale: &str,
        limit: usize,
    ) -> Result<Vec<Document>, StorageError> {
        let records = self.records.read().await;
        let mut docs: Vec<Document> = records
            .iter()
            .filter(|(key, _)| key.collection == collection && key.locale == locale)
            .map(|(_, doc)| doc.clone())
            .collect();
        docs.sort_by(|a, b| a.id.cmp(&b.id));
        docs.truncate(limit);
        Ok(docs)
    }
}
