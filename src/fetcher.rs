use std::time::Duration;

use chrono::Local;

use crate::{
    client::Api,
    error::Error,
    models::{page::Page, Params},
    result::Result,
};

/// Default time to wait after the API reports an exceeded quota.
pub const DEFAULT_SLEEP_TIME: Duration = Duration::from_secs(300);

/// Which failures the fetcher waits out instead of returning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Retry only [`Error::RateLimited`].
    #[default]
    RateLimitOnly,
    /// Retry every error reported by the API, treating all of them as
    /// quota errors. A permanently failing request then never returns.
    AnyApiError,
}

impl RetryPolicy {
    /// Returns whether `err` should be slept on and retried.
    pub fn should_retry(self, err: &Error) -> bool {
        match self {
            RetryPolicy::RateLimitOnly => err.is_rate_limit(),
            RetryPolicy::AnyApiError => err.is_api_error(),
        }
    }
}

/// Performs API calls, absorbing rate limit errors by sleeping and retrying.
///
/// Retries are unbounded and spaced by a constant interval since the API
/// quota window has a fixed length.
#[derive(Debug)]
pub struct Fetcher<'a, A: ?Sized> {
    api: &'a A,
    sleep_time: Duration,
    policy: RetryPolicy,
}

impl<A: ?Sized> Clone for Fetcher<'_, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A: ?Sized> Copy for Fetcher<'_, A> {}

impl<'a, A: Api + ?Sized> Fetcher<'a, A> {
    /// Constructs a fetcher sleeping `sleep_time` after each rate limit error.
    pub fn new(api: &'a A, sleep_time: Duration) -> Self {
        Self {
            api,
            sleep_time,
            policy: RetryPolicy::default(),
        }
    }

    /// Replaces the retry policy.
    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Fetches one page, retrying the identical request until it succeeds
    /// or fails with an error the policy does not cover.
    ///
    /// # Errors
    ///
    /// Returns the first error that is not retryable under the policy.
    pub async fn fetch(&self, endpoint: &str, params: &Params) -> Result<Page> {
        loop {
            match self.api.get(endpoint, params).await {
                Ok(page) => return Ok(page),
                Err(err) if self.policy.should_retry(&err) => {
                    let resume = chrono::Duration::from_std(self.sleep_time)
                        .ok()
                        .and_then(|d| Local::now().checked_add_signed(d))
                        .map_or_else(|| "-".to_string(), |t| t.format("%H:%M:%S").to_string());
                    log::warn!(
                        "received {} while performing get({}, {:?}) sleeping for {}s (until {})",
                        err,
                        endpoint,
                        params,
                        self.sleep_time.as_secs(),
                        resume
                    );
                    tokio::time::sleep(self.sleep_time).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
