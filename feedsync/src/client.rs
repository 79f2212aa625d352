use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Response, Url};
use serde::Deserialize;
use thiserror::Error;

use crate::models::Post;

/// Raw failure surfaced at the transport boundary, before classification.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The server answered with a non-success status.
    #[error("server returned status {code}: {message}")]
    Status { code: u16, message: String },
    /// No response was obtained: refused connection, timeout, DNS, reset.
    #[error("transport failure: {0}")]
    Transport(String),
    /// A response arrived but its body could not be parsed.
    #[error("malformed response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() || err.is_builder() {
            RemoteError::Decode(err.to_string())
        } else {
            RemoteError::Transport(err.to_string())
        }
    }
}

/// The four remote operations the sync layer depends on. Implemented over
/// HTTP in production and by scriptable fakes in tests.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    async fn list_posts(&self) -> Result<Vec<Post>, RemoteError>;
    async fn create_or_update(&self, post: &Post) -> Result<Post, RemoteError>;
    async fn set_like(&self, id: i64, like: bool) -> Result<Post, RemoteError>;
    async fn delete(&self, id: i64) -> Result<(), RemoteError>;
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// HTTP implementation backed by a shared `reqwest::Client`. The request
/// timeout set at construction bounds the lifetime of every in-flight call;
/// an elapsed timeout surfaces as `RemoteError::Transport`.
#[derive(Clone)]
pub struct HttpRemoteClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpRemoteClient {
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Result<Self> {
        let base_url = sanitize_base_url(base_url.into())?;
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url, RemoteError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|err| RemoteError::Decode(format!("invalid base URL: {err}")))?;
        url.set_path(path.trim_start_matches('/'));
        Ok(url)
    }

    /// Splits a response into success and `Status` failure, pulling the
    /// server's message out of a JSON `{"message": ...}` body when present.
    async fn check(response: Response) -> Result<Response, RemoteError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let code = status.as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ErrorBody>(&body) {
            Ok(parsed) => parsed.message,
            Err(_) if !body.trim().is_empty() => body.trim().to_string(),
            Err(_) => status.canonical_reason().unwrap_or("request failed").to_string(),
        };
        Err(RemoteError::Status { code, message })
    }

    async fn decode_post(response: Response) -> Result<Post, RemoteError> {
        response
            .json::<Post>()
            .await
            .map_err(|err| RemoteError::Decode(err.to_string()))
    }
}

#[async_trait]
impl RemoteClient for HttpRemoteClient {
    async fn list_posts(&self) -> Result<Vec<Post>, RemoteError> {
        let response = self.client.get(self.url("/posts")?).send().await?;
        let response = Self::check(response).await?;
        response
            .json::<Vec<Post>>()
            .await
            .map_err(|err| RemoteError::Decode(err.to_string()))
    }

    async fn create_or_update(&self, post: &Post) -> Result<Post, RemoteError> {
        let response = self
            .client
            .post(self.url("/posts")?)
            .json(post)
            .send()
            .await?;
        let response = Self::check(response).await?;
        Self::decode_post(response).await
    }

    async fn set_like(&self, id: i64, like: bool) -> Result<Post, RemoteError> {
        let url = self.url(&format!("/posts/{id}/likes"))?;
        let request = if like {
            self.client.post(url)
        } else {
            self.client.delete(url)
        };
        let response = request.send().await?;
        let response = Self::check(response).await?;
        Self::decode_post(response).await
    }

    async fn delete(&self, id: i64) -> Result<(), RemoteError> {
        let response = self
            .client
            .delete(self.url(&format!("/posts/{id}"))?)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

fn sanitize_base_url(mut base: String) -> Result<String> {
    if !base.starts_with("http://") && !base.starts_with("https://") {
        base = format!("http://{base}");
    }
    while base.ends_with('/') {
        base.pop();
    }
    let _ = Url::parse(&base).context("invalid base URL")?;
    Ok(base)
}
