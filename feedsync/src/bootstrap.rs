use std::sync::Arc;

use anyhow::{Context, Result};

use crate::client::HttpRemoteClient;
use crate::config::FeedConfig;
use crate::controller::FeedController;
use crate::repository::PostRepository;
use crate::store::PostStore;

pub struct Bootstrap {
    pub store: PostStore,
    pub repository: Arc<PostRepository>,
    pub controller: FeedController,
}

/// Single assembly point for the sync layer: opens the durable store, builds
/// the HTTP client from config, and wires the repository and controller. The
/// remote client is constructed here and injected; nothing reaches for it
/// through globals. Must run inside the tokio runtime that will drive the
/// controller.
pub fn initialize(config: &FeedConfig) -> Result<Bootstrap> {
    let store = PostStore::open(&config.paths.db_path)
        .with_context(|| format!("failed to open post store at {:?}", config.paths.db_path))?;
    let remote = HttpRemoteClient::new(&config.base_url, config.request_timeout)?;
    let repository = Arc::new(PostRepository::new(store.clone(), Arc::new(remote)));
    let controller = FeedController::new(repository.clone());
    tracing::info!(base_url = %config.base_url, db = ?config.paths.db_path, "sync layer assembled");
    Ok(Bootstrap {
        store,
        repository,
        controller,
    })
}
