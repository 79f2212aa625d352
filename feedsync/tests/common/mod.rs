#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use feedsync::client::{RemoteClient, RemoteError};
use feedsync::models::Post;

pub fn sample_post(id: i64, content: &str) -> Post {
    Post {
        id,
        author: "ada".into(),
        content: content.into(),
        published_at: format!("2026-08-0{}T10:00:00Z", (id % 9).max(1)),
        liked_by_me: false,
        like_count: 0,
    }
}

/// How the next remote calls should fail, mirroring the three raw failure
/// shapes the transport boundary can produce.
#[derive(Debug, Clone)]
pub enum FailureMode {
    Status(u16, &'static str),
    Transport,
    Decode,
}

impl FailureMode {
    fn to_error(&self) -> RemoteError {
        match self {
            FailureMode::Status(code, message) => RemoteError::Status {
                code: *code,
                message: (*message).to_string(),
            },
            FailureMode::Transport => RemoteError::Transport("connection reset".into()),
            FailureMode::Decode => RemoteError::Decode("unexpected body".into()),
        }
    }
}

/// Scriptable in-memory server: holds authoritative post state, assigns ids,
/// and can be told to fail or to delay responses.
pub struct MockRemote {
    posts: Mutex<BTreeMap<i64, Post>>,
    next_id: Mutex<i64>,
    failure: Mutex<Option<FailureMode>>,
    delay: Mutex<Option<Duration>>,
}

impl Default for MockRemote {
    fn default() -> Self {
        Self {
            posts: Mutex::new(BTreeMap::new()),
            // Server ids start at 1; id 0 marks an unsaved draft.
            next_id: Mutex::new(1),
            failure: Mutex::new(None),
            delay: Mutex::new(None),
        }
    }
}

impl MockRemote {
    pub fn with_posts(posts: Vec<Post>) -> Self {
        let next_id = posts.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        Self {
            posts: Mutex::new(posts.into_iter().map(|p| (p.id, p)).collect()),
            next_id: Mutex::new(next_id),
            ..Self::default()
        }
    }

    pub fn fail_with(&self, mode: FailureMode) {
        *self.failure.lock().unwrap() = Some(mode);
    }

    pub fn heal(&self) {
        *self.failure.lock().unwrap() = None;
    }

    pub fn delay_responses(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn server_post(&self, id: i64) -> Option<Post> {
        self.posts.lock().unwrap().get(&id).cloned()
    }

    async fn gate(&self) -> Result<(), RemoteError> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match self.failure.lock().unwrap().as_ref() {
            Some(mode) => Err(mode.to_error()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RemoteClient for MockRemote {
    async fn list_posts(&self) -> Result<Vec<Post>, RemoteError> {
        self.gate().await?;
        let posts = self.posts.lock().unwrap();
        Ok(posts.values().rev().cloned().collect())
    }

    async fn create_or_update(&self, post: &Post) -> Result<Post, RemoteError> {
        self.gate().await?;
        let mut posts = self.posts.lock().unwrap();
        let mut canonical = post.clone();
        if canonical.id == 0 {
            let mut next = self.next_id.lock().unwrap();
            canonical.id = *next;
            *next += 1;
        }
        canonical.published_at = "2026-08-29T12:00:00Z".into();
        posts.insert(canonical.id, canonical.clone());
        Ok(canonical)
    }

    async fn set_like(&self, id: i64, like: bool) -> Result<Post, RemoteError> {
        self.gate().await?;
        let mut posts = self.posts.lock().unwrap();
        let post = posts.get_mut(&id).ok_or(RemoteError::Status {
            code: 404,
            message: "not found".into(),
        })?;
        if post.liked_by_me != like {
            post.liked_by_me = like;
            post.like_count = if like {
                post.like_count + 1
            } else {
                post.like_count.saturating_sub(1)
            };
        }
        Ok(post.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), RemoteError> {
        self.gate().await?;
        self.posts.lock().unwrap().remove(&id);
        Ok(())
    }
}
