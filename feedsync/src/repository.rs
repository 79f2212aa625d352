use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};

use crate::client::{RemoteClient, RemoteError};
use crate::error::FeedError;
use crate::models::Post;
use crate::store::PostStore;

/// Orchestrates each use case as optimistic local mutation, remote call,
/// then confirm or compensate. Sole writer to the `PostStore`; all failures
/// leave through the classified `FeedError` taxonomy.
pub struct PostRepository {
    store: PostStore,
    remote: Arc<dyn RemoteClient>,
    mutation_locks: Mutex<HashMap<i64, Arc<tokio::sync::Mutex<()>>>>,
}

impl PostRepository {
    pub fn new(store: PostStore, remote: Arc<dyn RemoteClient>) -> Self {
        Self {
            store,
            remote,
            mutation_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &PostStore {
        &self.store
    }

    /// Fetches the full post list and swaps it into the store in one
    /// transaction. On failure the store is untouched; the stale snapshot
    /// stays readable.
    pub async fn refresh(&self) -> Result<(), FeedError> {
        let posts = self.remote.list_posts().await?;
        tracing::info!(count = posts.len(), "feed refreshed from server");
        self.store.replace_all(&posts)?;
        Ok(())
    }

    /// Sends the draft to the create/update endpoint and caches the
    /// server-canonical post (server-assigned id, counters, timestamp).
    /// Nothing is written locally on failure; clearing the draft is the
    /// controller's responsibility, only after success.
    pub async fn save(&self, draft: &Post) -> Result<Post, FeedError> {
        let confirmed = self.remote.create_or_update(draft).await?;
        self.store.upsert(&confirmed)?;
        Ok(confirmed)
    }

    /// Flips the like state optimistically, then confirms with the server.
    /// The remote call direction follows the pre-toggle state; on success the
    /// server-confirmed post wins (its counters are authoritative), on
    /// failure the pre-toggle snapshot is restored bit for bit.
    pub async fn toggle_like(&self, id: i64) -> Result<Post, FeedError> {
        let lock = self.mutation_lock(id)?;
        let _guard = lock.lock().await;

        let prior = self.store.get(id)?.ok_or_else(|| {
            tracing::warn!(id, "toggle_like on a post missing from the local store");
            FeedError::Unknown
        })?;
        let optimistic = prior.toggled();
        let like = !prior.liked_by_me;

        let confirmed = self
            .mutate(
                prior,
                |store| store.upsert(&optimistic),
                self.remote.set_like(id, like),
            )
            .await?;
        self.store.upsert(&confirmed)?;
        Ok(confirmed)
    }

    /// Deletes the row optimistically, then confirms with the server. On
    /// failure the captured row is restored, symmetric with `toggle_like`;
    /// a later `refresh` reconciles whatever the server actually holds.
    pub async fn remove_by_id(&self, id: i64) -> Result<(), FeedError> {
        let lock = self.mutation_lock(id)?;
        let _guard = lock.lock().await;

        let Some(prior) = self.store.get(id)? else {
            // Nothing cached locally; still propagate the delete upstream.
            return Ok(self.remote.delete(id).await?);
        };
        self.mutate(prior, |store| store.delete(id), self.remote.delete(id))
            .await?;
        Ok(())
    }

    /// The optimistic-mutation pattern shared by every compensating write:
    /// capture the prior row, apply the speculative write, attempt the remote
    /// effect, and re-upsert the prior row if the remote effect fails. A
    /// failed restore is logged but never masks the classified error.
    async fn mutate<T, Fut>(
        &self,
        prior: Post,
        speculative: impl FnOnce(&PostStore) -> Result<()>,
        remote: Fut,
    ) -> Result<T, FeedError>
    where
        Fut: Future<Output = Result<T, RemoteError>>,
    {
        speculative(&self.store)?;
        match remote.await {
            Ok(value) => Ok(value),
            Err(err) => {
                if let Err(restore) = self.store.upsert(&prior) {
                    tracing::warn!(
                        id = prior.id,
                        error = %restore,
                        "failed to restore pre-mutation snapshot"
                    );
                }
                Err(err.into())
            }
        }
    }

    /// Single-flight lock per post id: overlapping mutations of one id queue,
    /// mutations of distinct ids run independently.
    fn mutation_lock(&self, id: i64) -> Result<Arc<tokio::sync::Mutex<()>>, FeedError> {
        let mut locks = self
            .mutation_locks
            .lock()
            .map_err(|_| anyhow!("mutation lock table poisoned"))?;
        Ok(locks.entry(id).or_default().clone())
    }
}
