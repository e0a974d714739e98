//! Change-hook dispatcher
//!
//! Listens to a store's change feed and starts a translation pass for every
//! user edit of a configured collection in its default locale. Writes made by
//! the passes themselves come back through the same feed tagged as
//! translation echoes and are dropped here.

use crate::orchestrator::{Orchestrator, PassReport, TranslationRequest, Trigger};
use crate::storage::ChangeEvent;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, error, info};

/// Counters kept by a [`TranslationHook`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HookStats {
    pub events_seen: usize,
    pub passes_run: usize,
    pub echoes_suppressed: usize,
}

pub struct TranslationHook {
    orchestrator: Orchestrator,
    stats: HookStats,
}

impl TranslationHook {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator,
            stats: HookStats::default(),
        }
    }

    pub fn stats(&self) -> HookStats {
        self.stats
    }

    /// Handle one change; returns the report when a pass ran
    pub async fn after_change(&mut self, event: &ChangeEvent) -> Option<PassReport> {
        self.stats.events_seen += 1;
        let config = self.orchestrator.config();

        if !config.enabled || config.collection(&event.collection).is_none() {
            return None;
        }
        if event.context.skip_translate() {
            self.stats.echoes_suppressed += 1;
            debug!(
                collection = %event.collection,
                id = %event.document.id,
                locale = %event.locale,
                intent = ?event.context.intent,
                "Ignoring non-user write"
            );
            return None;
        }
        if event.locale != config.localization.default_locale {
            return None;
        }

        let request =
            TranslationRequest::new(&event.collection, &event.document.id, &event.locale);
        match self
            .orchestrator
            .run_pass(&request, Trigger::ChangeHook(event.context))
            .await
        {
            Ok(Some(report)) => {
                self.stats.passes_run += 1;
                Some(report)
            }
            Ok(None) => None,
            Err(e) => {
                error!(
                    collection = %event.collection,
                    id = %event.document.id,
                    error = %e,
                    "Hook translation failed"
                );
                None
            }
        }
    }

    /// Process every event currently queued, including ones queued meanwhile
    pub async fn drain(&mut self, rx: &mut UnboundedReceiver<ChangeEvent>) -> Vec<PassReport> {
        let mut reports = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let Some(report) = self.after_change(&event).await {
                reports.push(report);
            }
        }
        reports
    }

    /// Consume the feed until every sender is gone
    pub async fn run(mut self, mut rx: UnboundedReceiver<ChangeEvent>) -> HookStats {
        info!("Translation hook listening for changes");
        while let Some(event) = rx.recv().await {
            self.after_change(&event).await;
        }
        info!(stats = ?self.stats, "Change feed closed");
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CollectionOptions, Localization, PluginConfig};
    use crate::document::{Document, FieldDescriptor};
    use crate::memory_store::InMemoryStore;
    use crate::storage::{DocumentStore, Operation, WriteContext};
    use autolocale_mt::{MockMode, MockTranslator};
    use serde_json::json;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    fn hook_with(
        config: PluginConfig,
    ) -> (TranslationHook, InMemoryStore, UnboundedReceiver<ChangeEvent>) {
        let (store, rx) = InMemoryStore::with_change_feed();
        let orchestrator = Orchestrator::new(
            Arc::new(store.clone()),
            Arc::new(MockTranslator::new(MockMode::Suffix)),
            Arc::new(config),
        );
        (TranslationHook::new(orchestrator), store, rx)
    }

    fn config() -> PluginConfig {
        PluginConfig::new(Localization::new("en", &["en", "fr"])).with_collection(
            "posts",
            CollectionOptions::new(vec![FieldDescriptor::plain_text("title")]),
        )
    }

    #[tokio::test]
    async fn test_non_default_locale_edit_ignored() {
        let (mut hook, store, mut rx) = hook_with(config());
        store
            .create(
                "posts",
                Document::new("1").with_field("title", json!("salut")),
                "fr",
                WriteContext::user_edit(),
            )
            .await
            .unwrap();

        assert!(hook.drain(&mut rx).await.is_empty());
        assert!(store.find_by_id("posts", "1", "en").await.unwrap().is_none());
        assert_eq!(hook.stats().passes_run, 0);
    }

    #[tokio::test]
    async fn test_unconfigured_collection_ignored() {
        let (mut hook, store, mut rx) = hook_with(config());
        store
            .create("media", Document::new("1"), "en", WriteContext::user_edit())
            .await
            .unwrap();
        assert!(hook.drain(&mut rx).await.is_empty());
        assert_eq!(hook.stats().events_seen, 1);
    }

    #[tokio::test]
    async fn test_disabled_plugin_ignores_everything() {
        let mut disabled = config();
        disabled.enabled = false;
        let (mut hook, store, mut rx) = hook_with(disabled);
        store
            .create(
                "posts",
                Document::new("1").with_field("title", json!("hello")),
                "en",
                WriteContext::user_edit(),
            )
            .await
            .unwrap();
        assert!(hook.drain(&mut rx).await.is_empty());
        assert!(store.find_by_id("posts", "1", "fr").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_run_stops_when_feed_closes() {
        let store = InMemoryStore::new();
        let source = Document::new("1").with_field("title", json!("hello"));
        store.seed("posts", "en", source.clone()).await;
        let orchestrator = Orchestrator::new(
            Arc::new(store.clone()),
            Arc::new(MockTranslator::new(MockMode::Suffix)),
            Arc::new(config()),
        );

        let (tx, rx) = mpsc::unbounded_channel();
        for context in [WriteContext::user_edit(), WriteContext::translation_echo()] {
            tx.send(ChangeEvent {
                collection: "posts".to_string(),
                locale: "en".to_string(),
                operation: Operation::Update,
                document: source.clone(),
                context,
            })
            .unwrap();
        }
        drop(tx);

        let stats = TranslationHook::new(orchestrator).run(rx).await;
        assert_eq!(
            stats,
            HookStats {
                events_seen: 2,
                passes_run: 1,
                echoes_suppressed: 1,
            }
        );
        let fr = store.find_by_id("posts", "1", "fr").await.unwrap().unwrap();
        assert_eq!(fr.get_str("title"), Some("hello_fr"));
    }
}
