use crate::client::RemoteError;
use thiserror::Error;

/// The stable error taxonomy surfaced to presentation code. Every failure in
/// the repository funnels through the `From` impls below; no other layer
/// constructs these variants directly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    /// The server was reached and rejected the request.
    #[error("api error {code}: {message}")]
    Api { code: u16, message: String },
    /// The server could not be reached, or the transport failed before a
    /// status was obtained.
    #[error("network error")]
    Network,
    /// Anything else: malformed response bodies, internal faults.
    #[error("unknown error")]
    Unknown,
}

impl From<RemoteError> for FeedError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Status { code, message } => FeedError::Api { code, message },
            RemoteError::Transport(reason) => {
                tracing::debug!(%reason, "remote call failed in transport");
                FeedError::Network
            }
            RemoteError::Decode(reason) => {
                tracing::warn!(%reason, "remote response could not be decoded");
                FeedError::Unknown
            }
        }
    }
}

/// Local-store faults are internal errors as far as presentation is
/// concerned.
impl From<anyhow::Error> for FeedError {
    fn from(err: anyhow::Error) -> Self {
        tracing::warn!(error = %err, "local store operation failed");
        FeedError::Unknown
    }
}
