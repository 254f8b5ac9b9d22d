use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    error::Error,
    fetcher::{RetryPolicy, DEFAULT_SLEEP_TIME},
    result::Result,
};

/// Settings for one export run, built once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Short name of the forum to export.
    pub forum: String,
    /// Directory the per-thread files are written to.
    pub directory: PathBuf,
    /// How long to wait after a rate limit error.
    pub sleep_time: Duration,
    /// Which errors are waited out.
    pub retry_policy: RetryPolicy,
}

impl Config {
    /// Constructs a config with the default sleep time and retry policy.
    pub fn new(forum: impl Into<String>, directory: impl Into<PathBuf>) -> Self {
        Self {
            forum: forum.into(),
            directory: directory.into(),
            sleep_time: DEFAULT_SLEEP_TIME,
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Sets the time slept after a rate limit error.
    #[must_use]
    pub fn sleep_time(mut self, sleep_time: Duration) -> Self {
        self.sleep_time = sleep_time;
        self
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }
}

/// Checks that `path` is an existing directory that can be listed and written to.
///
/// # Errors
///
/// Returns [`Error::InvalidDirectory`] describing the first check that failed.
pub async fn validate_directory(path: &Path) -> Result<PathBuf> {
    let invalid = |reason: &'static str| Error::InvalidDirectory {
        path: path.to_path_buf(),
        reason,
    };

    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|_| invalid("is not a valid path"))?;
    if !metadata.is_dir() {
        return Err(invalid("is not a directory"));
    }
    if tokio::fs::read_dir(path).await.is_err() {
        return Err(invalid("is not a readable dir"));
    }
    // permission bits say nothing about the current user, so try a write
    let scratch = tempfile::Builder::new()
        .prefix(".disqus-export-")
        .tempfile_in(path);
    if let Err(e) = scratch {
        log::debug!("write check in {} failed: {}", path.display(), e);
        return Err(invalid("is not a writable dir"));
    }
    Ok(path.to_path_buf())
}
