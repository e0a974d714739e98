//! Translation passes
//!
//! One pass takes a source-locale document and writes translated copies into
//! every target locale. Locales run concurrently and fail independently; a
//! pass only fails as a whole when it cannot start (unknown collection,
//! missing source document, unreadable store).

use crate::config::{CollectionOptions, PluginConfig};
use crate::document::{Document, DocumentStatus};
use crate::error::{Result, StorageError, TranslateError};
use crate::field::{FieldContext, FieldOutcome, FieldReport, resolve_fields};
use crate::storage::{DocumentStore, WriteContext};
use autolocale_mt::{MachineTranslator, TranslationSettings};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Upper bound on documents visited by one bulk run
pub const BULK_LIMIT: usize = 10_000;

/// A request to translate one document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslationRequest {
    pub collection: String,
    pub id: String,
    pub source_locale: String,
    /// Restrict targets to these codes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codes: Option<Vec<String>>,
    #[serde(default)]
    pub settings: TranslationSettings,
    /// Overrides the collection's only-missing default when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub only_missing: Option<bool>,
}

impl TranslationRequest {
    pub fn new(
        collection: impl Into<String>,
        id: impl Into<String>,
        source_locale: impl Into<String>,
    ) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
            source_locale: source_locale.into(),
            ..Default::default()
        }
    }

    pub fn with_codes<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.codes = Some(codes.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_settings(mut self, settings: TranslationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_only_missing(mut self, only_missing: bool) -> Self {
        self.only_missing = Some(only_missing);
        self
    }
}

/// A request to translate every document of a collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkRequest {
    pub collection: String,
    pub source_locale: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codes: Option<Vec<String>>,
    #[serde(default)]
    pub settings: TranslationSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub only_missing: Option<bool>,
}

impl BulkRequest {
    fn for_document(&self, id: &str) -> TranslationRequest {
        TranslationRequest {
            collection: self.collection.clone(),
            id: id.to_string(),
            source_locale: self.source_locale.clone(),
            codes: self.codes.clone(),
            settings: self.settings,
            only_missing: self.only_missing,
        }
    }
}

/// What started a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// A store change hook, carrying the context of the write that fired it
    ChangeHook(WriteContext),
    /// An explicit request; never suppressed
    Explicit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LocaleStatus {
    Created,
    Updated,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocaleReport {
    pub locale: String,
    pub status: LocaleStatus,
    pub fields: Vec<FieldReport>,
}

impl LocaleReport {
    pub fn is_failed(&self) -> bool {
        matches!(self.status, LocaleStatus::Failed(_))
    }

    pub fn field(&self, name: &str) -> Option<&FieldOutcome> {
        self.fields
            .iter()
            .find(|report| report.field == name)
            .map(|report| &report.outcome)
    }
}

/// Per-locale outcome of one pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassReport {
    pub collection: String,
    pub document_id: String,
    pub source_locale: String,
    pub locales: Vec<LocaleReport>,
}

impl PassReport {
    /// True when every locale was written
    pub fn success(&self) -> bool {
        self.locales.iter().all(|locale| !locale.is_failed())
    }

    pub fn locale(&self, code: &str) -> Option<&LocaleReport> {
        self.locales.iter().find(|report| report.locale == code)
    }

    pub fn written_locales(&self) -> Vec<&str> {
        self.locales
            .iter()
            .filter(|report| !report.is_failed())
            .map(|report| report.locale.as_str())
            .collect()
    }

    pub fn failed_locales(&self) -> Vec<&str> {
        self.locales
            .iter()
            .filter(|report| report.is_failed())
            .map(|report| report.locale.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkReport {
    pub collection: String,
    pub source_locale: String,
    pub documents: usize,
    /// Ids of documents with at least one failed locale
    pub failed_documents: Vec<String>,
    pub passes: Vec<PassReport>,
}

impl BulkReport {
    pub fn success(&self) -> bool {
        self.failed_documents.is_empty()
    }
}

/// Runs translation passes against a store through a translator
#[derive(Clone)]
pub struct Orchestrator {
    store: Arc<dyn DocumentStore>,
    translator: Arc<dyn MachineTranslator>,
    config: Arc<PluginConfig>,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        translator: Arc<dyn MachineTranslator>,
        config: Arc<PluginConfig>,
    ) -> Self {
        Self {
            store,
            translator,
            config,
        }
    }

    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    pub fn translator(&self) -> &dyn MachineTranslator {
        self.translator.as_ref()
    }

    /// Run a pass unless the trigger says the write was a translation echo
    ///
    /// Returns `Ok(None)` when the pass was suppressed.
    pub async fn run_pass(
        &self,
        request: &TranslationRequest,
        trigger: Trigger,
    ) -> Result<Option<PassReport>> {
        if let Trigger::ChangeHook(context) = trigger
            && context.skip_translate()
        {
            debug!(
                collection = %request.collection,
                id = %request.id,
                intent = ?context.intent,
                "Skipping pass for non-user write"
            );
            return Ok(None);
        }
        self.translate_document(request).await.map(Some)
    }

    /// Translate one document into every target locale
    pub async fn translate_document(&self, request: &TranslationRequest) -> Result<PassReport> {
        let options = self.collection_options(&request.collection)?;
        let source = self
            .store
            .find_by_id(&request.collection, &request.id, &request.source_locale)
            .await?
            .ok_or_else(|| TranslateError::NotFound {
                collection: request.collection.clone(),
                id: request.id.clone(),
            })?;

        Ok(self.translate_loaded(request, options, &source).await)
    }

    /// Translate every document of a collection, one after another
    ///
    /// Failing documents are logged and recorded; they never stop the run.
    pub async fn translate_collection(&self, request: &BulkRequest) -> Result<BulkReport> {
        let options = self.collection_options(&request.collection)?;
        let docs = self
            .store
            .find(&request.collection, &request.source_locale, BULK_LIMIT)
            .await?;
        if docs.is_empty() {
            return Err(TranslateError::NoDocuments {
                collection: request.collection.clone(),
                locale: request.source_locale.clone(),
            });
        }

        info!(
            collection = %request.collection,
            documents = docs.len(),
            source = %request.source_locale,
            "Starting bulk translation"
        );

        let mut report = BulkReport {
            collection: request.collection.clone(),
            source_locale: request.source_locale.clone(),
            documents: docs.len(),
            failed_documents: Vec::new(),
            passes: Vec::with_capacity(docs.len()),
        };

        for doc in &docs {
            let pass = self
                .translate_loaded(&request.for_document(&doc.id), options, doc)
                .await;
            if !pass.success() {
                error!(
                    collection = %request.collection,
                    id = %doc.id,
                    failed = ?pass.failed_locales(),
                    "Failed to translate document"
                );
                report.failed_documents.push(doc.id.clone());
            }
            report.passes.push(pass);
        }

        Ok(report)
    }

    fn collection_options(&self, collection: &str) -> Result<&CollectionOptions> {
        self.config
            .collection(collection)
            .ok_or_else(|| TranslateError::CollectionNotConfigured(collection.to_string()))
    }

    async fn translate_loaded(
        &self,
        request: &TranslationRequest,
        options: &CollectionOptions,
        source: &Document,
    ) -> PassReport {
        let settings = request.settings.overlay(&options.settings);
        let only_missing = request.only_missing.unwrap_or(options.only_missing);
        let targets = self
            .config
            .localization
            .target_locales(&request.source_locale, request.codes.as_deref());

        info!(
            collection = %request.collection,
            id = %source.id,
            source = %request.source_locale,
            targets = ?targets,
            only_missing,
            "Starting translation pass"
        );

        let tasks = targets.iter().map(|locale| {
            self.translate_locale(request, options, source, locale, &settings, only_missing)
        });
        let locales = join_all(tasks).await;

        PassReport {
            collection: request.collection.clone(),
            document_id: source.id.clone(),
            source_locale: request.source_locale.clone(),
            locales,
        }
    }

    async fn translate_locale(
        &self,
        request: &TranslationRequest,
        options: &CollectionOptions,
        source: &Document,
        locale: &str,
        settings: &TranslationSettings,
        only_missing: bool,
    ) -> LocaleReport {
        let existing = match self
            .store
            .find_by_id(&request.collection, &source.id, locale)
            .await
        {
            Ok(doc) => doc,
            Err(e) => return self.locale_failed(request, &source.id, locale, Vec::new(), e),
        };

        let ctx = FieldContext {
            translator: self.translator.as_ref(),
            collection: &request.collection,
            document_id: &source.id,
            source_locale: &request.source_locale,
            target_locale: locale,
            settings,
        };
        let resolved =
            resolve_fields(&ctx, &options.fields, source, existing.as_ref(), only_missing).await;

        match self
            .persist(&request.collection, source, locale, resolved.values)
            .await
        {
            Ok(status) => {
                debug!(
                    collection = %request.collection,
                    id = %source.id,
                    locale,
                    ?status,
                    "Locale written"
                );
                LocaleReport {
                    locale: locale.to_string(),
                    status,
                    fields: resolved.reports,
                }
            }
            Err(e) => self.locale_failed(request, &source.id, locale, resolved.reports, e),
        }
    }

    /// Update the locale record when it exists, otherwise create it as a draft
    async fn persist(
        &self,
        collection: &str,
        source: &Document,
        locale: &str,
        values: Map<String, Value>,
    ) -> std::result::Result<LocaleStatus, StorageError> {
        let context = WriteContext::translation_echo();
        let exists = self
            .store
            .find_by_id(collection, &source.id, locale)
            .await?
            .is_some();

        if exists {
            self.store
                .update(collection, &source.id, values, locale, context)
                .await?;
            Ok(LocaleStatus::Updated)
        } else {
            let mut document = source.clone();
            document.fields.extend(values);
            document.status = Some(DocumentStatus::Draft);
            self.store.create(collection, document, locale, context).await?;
            Ok(LocaleStatus::Created)
        }
    }

    fn locale_failed(
        &self,
        request: &TranslationRequest,
        id: &str,
        locale: &str,
        fields: Vec<FieldReport>,
        e: StorageError,
    ) -> LocaleReport {
        warn!(
            collection = %request.collection,
            id,
            locale,
            error = %e,
            "Locale translation failed"
        );
        LocaleReport {
            locale: locale.to_string(),
            status: LocaleStatus::Failed(e.to_string()),
            fields,
        }
    }
}
