use std::sync::Arc;

use annc_core::{
    config::{Config, StoreBackend},
    store::{JsonFileStore, MemoryStore, RecipientStore},
};

#[tokio::main]
async fn main() -> Result<(), annc_core::Error> {
    annc_core::logging::init("annc")?;

    let cfg = Arc::new(Config::load()?);

    let store: Arc<dyn RecipientStore> = match cfg.store_backend {
        StoreBackend::File => {
            tracing::info!("recipient store: {}", cfg.store_path.display());
            Arc::new(JsonFileStore::open(cfg.store_path.clone()).await?)
        }
        StoreBackend::Memory => {
            tracing::warn!("recipient store is in-memory; registrations are lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    annc_telegram::router::run_polling(cfg, store)
        .await
        .map_err(|e| annc_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
