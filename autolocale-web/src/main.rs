use autolocale::{
    Document, DocumentStore, InMemoryStore, Orchestrator, PluginConfig, TranslationHook,
};
use autolocale_mt::{DeepLProvider, MachineTranslator, MockMode, MockTranslator};
use clap::{Arg, ArgAction, Command};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

mod handlers;

use handlers::{AppState, router};

/// Seed file layout: collection -> locale -> documents
type SeedData = BTreeMap<String, BTreeMap<String, Vec<Document>>>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("info".parse()?),
        )
        .init();

    let matches = Command::new("autolocale-web")
        .version("0.1.0")
        .about("HTTP server that translates localized collection documents")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Path to the plugin configuration (TOML)")
                .default_value("autolocale.toml"),
        )
        .arg(
            Arg::new("bind")
                .long("bind")
                .short('b')
                .help("Address to listen on")
                .default_value("127.0.0.1:3000"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .help("JSON file with documents to load into the in-memory store"),
        )
        .arg(
            Arg::new("mock")
                .long("mock")
                .short('m')
                .help("Use mock translator instead of DeepL")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let config_path = matches
        .get_one::<String>("config")
        .ok_or("Missing config path")?;
    let bind = matches
        .get_one::<String>("bind")
        .ok_or("Missing bind address")?;

    let config = PluginConfig::load(config_path)
        .map_err(|e| format!("Failed to load {}: {}", config_path, e))?;
    info!(
        collections = config.collections.len(),
        locales = ?config.localization.locales,
        enabled = config.enabled,
        "Loaded configuration"
    );

    let translator: Arc<dyn MachineTranslator> = if matches.get_flag("mock") {
        Arc::new(MockTranslator::new(MockMode::Suffix))
    } else {
        let gateway = config
            .gateway_config()
            .map_err(|e| format!("Failed to initialize translator: {}", e))?;
        Arc::new(DeepLProvider::new(gateway)?)
    };

    let (store, changes) = if config.enabled {
        let (store, rx) = InMemoryStore::with_change_feed();
        (store, Some(rx))
    } else {
        (InMemoryStore::new(), None)
    };

    if let Some(path) = matches.get_one::<String>("seed") {
        let seed: SeedData = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        let mut count = 0;
        for (collection, locales) in seed {
            for (locale, docs) in locales {
                for doc in docs {
                    store.seed(&collection, &locale, doc).await;
                    count += 1;
                }
            }
        }
        info!(documents = count, path = %path, "Seeded store");
    }

    let store: Arc<dyn DocumentStore> = Arc::new(store);
    let orchestrator = Orchestrator::new(store.clone(), translator.clone(), Arc::new(config));

    if let Some(rx) = changes {
        tokio::spawn(TranslationHook::new(orchestrator.clone()).run(rx));
    } else {
        warn!("Plugin disabled, translation hook and routes are off");
    }

    if !translator.health_check().await {
        warn!(provider = translator.provider_name(), "Translation provider is not reachable");
    }

    info!("🌍 Starting autolocale web server");

    let app = router(AppState {
        orchestrator,
        store,
    });

    let listener = tokio::net::TcpListener::bind(bind.as_str()).await?;
    info!("🚀 Server running at http://{}", bind);

    axum::serve(listener, app).await?;

    Ok(())
}
