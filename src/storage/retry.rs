use std::path::Path;
use std::thread;
use std::time::Duration;

use tracing::warn;

use crate::error::Result;
use crate::storage::ObjectStore;

/// Retries transient storage failures a bounded number of times.
///
/// Only errors for which [`Error::is_retryable`](crate::Error::is_retryable)
/// holds are retried; a missing object or a bad path fails immediately.
/// Backoff grows linearly with the attempt number. Once attempts run out the
/// last error is returned to the caller, which treats it as fatal.
#[derive(Debug, Clone)]
pub struct RetryStore<S> {
    inner: S,
    max_attempts: u32,
    backoff: Duration,
}

impl<S: ObjectStore> RetryStore<S> {
    /// `max_attempts` counts the first try; values below 1 are treated as 1.
    pub fn new(inner: S, max_attempts: u32, backoff: Duration) -> Self {
        RetryStore {
            inner,
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn retry<T>(&self, op: &str, path: &str, mut f: impl FnMut(&S) -> Result<T>) -> Result<T> {
        let mut attempt = 1;
        loop {
            match f(&self.inner) {
                Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                    warn!(op, path, attempt, error = %e, "storage operation failed, retrying");
                    thread::sleep(self.backoff * attempt);
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

impl<S: ObjectStore> ObjectStore for RetryStore<S> {
    fn put(&self, path: &str, bytes: &[u8]) -> Result<()> {
        self.retry("put", path, |s| s.put(path, bytes))
    }

    fn get(&self, path: &str) -> Result<Vec<u8>> {
        self.retry("get", path, |s| s.get(path))
    }

    fn exists(&self, path: &str) -> Result<bool> {
        self.retry("exists", path, |s| s.exists(path))
    }

    fn size(&self, path: &str) -> Result<Option<u64>> {
        self.retry("size", path, |s| s.size(path))
    }

    fn delete(&self, path: &str) -> Result<()> {
        self.retry("delete", path, |s| s.delete(path))
    }

    fn get_range(&self, path: &str, offset: u64, len: u64) -> Result<Vec<u8>> {
        self.retry("get_range", path, |s| s.get_range(path, offset, len))
    }

    fn put_file(&self, path: &str, local: &Path) -> Result<()> {
        self.retry("put_file", path, |s| s.put_file(path, local))
    }

    fn fetch_file(&self, path: &str, local: &Path) -> Result<u64> {
        self.retry("fetch_file", path, |s| s.fetch_file(path, local))
    }
}
