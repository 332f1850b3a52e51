use crate::database;
use std::time::Duration;
use thiserror::Error;

/// Failure taxonomy the feed services surface to their callers.
///
/// `NotFound` and `Forbidden` are terminal. `Conflict` means a storage-level
/// write collision outlived the internal retries and the caller may try
/// again. `Validation` covers structural invariants the services enforce
/// defensively even though payload shape is checked upstream.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type FeedResult<T> = Result<T, FeedError>;

impl FeedError {
    /// Stable machine-readable kind, paired with the message in responses.
    pub fn kind(&self) -> &'static str {
        match self {
            FeedError::NotFound(_) => "not_found",
            FeedError::Forbidden(_) => "forbidden",
            FeedError::Conflict(_) => "conflict",
            FeedError::Validation(_) => "validation",
            FeedError::Internal(_) => "internal",
        }
    }

    fn is_retryable_storage_conflict(&self) -> bool {
        matches!(self, FeedError::Internal(err) if database::is_busy_error(err))
    }
}

pub(crate) const WRITE_RETRY_ATTEMPTS: u32 = 3;
pub(crate) const WRITE_RETRY_BACKOFF: Duration = Duration::from_millis(25);

/// Runs a write closure, retrying bounded when the storage layer reports a
/// busy or locked database. Exhaustion surfaces as `Conflict` so the caller
/// can retry; every other error passes through untouched.
pub(crate) fn with_write_retry<T>(mut op: impl FnMut() -> FeedResult<T>) -> FeedResult<T> {
    let mut attempt = 0;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable_storage_conflict() => {
                attempt += 1;
                if attempt >= WRITE_RETRY_ATTEMPTS {
                    return Err(FeedError::Conflict(
                        "storage contention persisted, try again".into(),
                    ));
                }
                tracing::debug!(attempt, "retrying write after storage contention");
                std::thread::sleep(WRITE_RETRY_BACKOFF);
            }
            Err(err) => return Err(err),
        }
    }
}
