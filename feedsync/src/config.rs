use anyhow::{anyhow, Result};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://localhost:9999";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub base_url: String,
    pub paths: FeedPaths,
    /// Bounds the lifetime of every in-flight remote call; an elapsed
    /// timeout surfaces as a network error.
    pub request_timeout: Duration,
}

impl FeedConfig {
    pub fn from_env() -> Result<Self> {
        let paths = FeedPaths::discover()?;
        let base_url = env::var("FEEDSYNC_BASE_URL")
            .ok()
            .filter(|raw| !raw.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let request_timeout = env::var("FEEDSYNC_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        Ok(Self {
            base_url,
            paths,
            request_timeout,
        })
    }

    pub fn new(base_url: impl Into<String>, paths: FeedPaths) -> Self {
        Self {
            base_url: base_url.into(),
            paths,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct FeedPaths {
    pub base: PathBuf,
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
}

impl FeedPaths {
    pub fn discover() -> Result<Self> {
        let exe_path = std::env::current_exe()
            .map_err(|err| anyhow!("failed to resolve current executable: {err}"))?;
        let base = exe_path
            .parent()
            .ok_or_else(|| anyhow!("executable path missing parent"))?
            .to_path_buf();
        Self::from_base_dir(base)
    }

    pub fn from_base_dir<P: AsRef<Path>>(base: P) -> Result<Self> {
        let base = base.as_ref().to_path_buf();
        let data_dir = base.join("data");
        let db_path = data_dir.join("feed.db");
        std::fs::create_dir_all(&data_dir)
            .map_err(|err| anyhow!("failed to create data dir: {err}"))?;
        Ok(Self {
            base,
            data_dir,
            db_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_base_dir_creates_data_dir() {
        let temp = tempfile::tempdir().unwrap();
        let paths = FeedPaths::from_base_dir(temp.path()).unwrap();
        assert!(paths.data_dir.is_dir());
        assert_eq!(paths.db_path, paths.data_dir.join("feed.db"));
    }

    #[test]
    fn config_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let paths = FeedPaths::from_base_dir(temp.path()).unwrap();
        let config = FeedConfig::new("http://localhost:9999", paths);
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        let config = config.with_timeout(Duration::from_millis(200));
        assert_eq!(config.request_timeout, Duration::from_millis(200));
    }
}
