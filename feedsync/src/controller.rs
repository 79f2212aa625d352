use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::FeedError;
use crate::models::Post;
use crate::repository::PostRepository;

/// Where the feed currently stands from the presentation layer's point of
/// view. Errors are advisory: the last good `posts` snapshot stays visible.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FeedStatus {
    #[default]
    Idle,
    Loading,
    Loaded,
    Error(FeedError),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeedState {
    /// Newest first, mirroring the store's live read.
    pub posts: Vec<Post>,
    pub status: FeedStatus,
}

impl FeedState {
    pub fn is_loading(&self) -> bool {
        matches!(self.status, FeedStatus::Loading)
    }

    /// True only when a load succeeded and produced nothing.
    pub fn is_empty(&self) -> bool {
        self.posts.is_empty() && matches!(self.status, FeedStatus::Loaded)
    }

    pub fn error(&self) -> Option<&FeedError> {
        match &self.status {
            FeedStatus::Error(err) => Some(err),
            _ => None,
        }
    }
}

/// Turns repository outcomes into `FeedState` transitions and owns the draft
/// being composed. Never writes the store directly and never retries.
pub struct FeedController {
    repository: Arc<PostRepository>,
    state: Arc<watch::Sender<FeedState>>,
    draft: Mutex<Post>,
    post_created: AtomicBool,
    forwarder: JoinHandle<()>,
}

impl FeedController {
    pub fn new(repository: Arc<PostRepository>) -> Self {
        let state = Arc::new(watch::channel(FeedState::default()).0);

        // Keep `posts` tracking the store's live read for as long as the
        // controller is alive; status transitions stay with the commands.
        let mut live = repository.store().observe_all();
        let forward_to = state.clone();
        let forwarder = tokio::spawn(async move {
            while live.changed().await.is_ok() {
                let posts = live.borrow_and_update().clone();
                forward_to.send_modify(|current| current.posts = posts);
            }
        });

        Self {
            repository,
            state,
            draft: Mutex::new(Post::draft()),
            post_created: AtomicBool::new(false),
            forwarder,
        }
    }

    /// Current state plus every future transition, push-based.
    pub fn subscribe(&self) -> watch::Receiver<FeedState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> FeedState {
        self.state.borrow().clone()
    }

    pub fn draft(&self) -> Post {
        self.draft_guard().clone()
    }

    /// One-shot "post created" signal: true at most once per successful
    /// save, cleared by this read. Never redelivered.
    pub fn take_post_created(&self) -> bool {
        self.post_created.swap(false, Ordering::AcqRel)
    }

    pub async fn load_posts(&self) {
        self.state
            .send_modify(|state| state.status = FeedStatus::Loading);
        match self.repository.refresh().await {
            Ok(()) => self.settle(FeedStatus::Loaded),
            Err(err) => self.settle(FeedStatus::Error(err)),
        }
    }

    /// Saves the current draft. The draft is cleared only after the server
    /// confirms; on failure it stays editable.
    pub async fn save(&self) {
        let draft = self.draft();
        match self.repository.save(&draft).await {
            Ok(confirmed) => {
                tracing::info!(id = confirmed.id, "post saved");
                *self.draft_guard() = Post::draft();
                self.post_created.store(true, Ordering::Release);
                self.settle(FeedStatus::Loaded);
            }
            Err(err) => self.settle(FeedStatus::Error(err)),
        }
    }

    pub async fn like_by_id(&self, id: i64) {
        match self.repository.toggle_like(id).await {
            Ok(_) => self.settle(FeedStatus::Loaded),
            Err(err) => self.settle(FeedStatus::Error(err)),
        }
    }

    pub async fn remove_by_id(&self, id: i64) {
        match self.repository.remove_by_id(id).await {
            Ok(()) => self.settle(FeedStatus::Loaded),
            Err(err) => self.settle(FeedStatus::Error(err)),
        }
    }

    /// Starts editing an existing post. Pure draft mutation, no I/O.
    pub fn edit(&self, post: Post) {
        *self.draft_guard() = post;
    }

    /// Updates the draft's content from user input. No-op when the trimmed
    /// text equals the current content, so redundant emissions are avoided.
    pub fn change_content(&self, content: &str) {
        let text = content.trim();
        let mut draft = self.draft_guard();
        if draft.content == text {
            return;
        }
        draft.content = text.to_string();
    }

    /// Applies an outcome status together with the store's settled snapshot,
    /// so observers never see a status change ahead of the data it reflects.
    fn settle(&self, status: FeedStatus) {
        let posts = self
            .repository
            .store()
            .observe_all()
            .borrow()
            .clone();
        self.state.send_modify(|state| {
            state.posts = posts;
            state.status = status;
        });
    }

    fn draft_guard(&self) -> std::sync::MutexGuard<'_, Post> {
        // Draft mutations are infallible; a poisoned guard still holds a
        // usable draft.
        self.draft.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for FeedController {
    fn drop(&mut self) {
        self.forwarder.abort();
    }
}
