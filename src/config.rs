use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};

/// Tuning knobs for builds and publication.
///
/// `Default` gives production values; [`Options::from_env`] overlays
/// `WIKIDICT_*` environment variables on top of them.
#[derive(Debug, Clone)]
pub struct Options {
    /// Max records buffered per sorted chunk during a full build.
    pub chunk_size: usize,
    /// Local directory under which per-build staging directories are made.
    pub staging_dir: PathBuf,
    /// Object-store prefix for generation artifacts.
    pub dict_prefix: String,
    /// Object-store path of the manifest.
    pub manifest_path: String,
    /// Attempts per storage operation, first try included.
    pub storage_retries: u32,
    /// Base delay between storage retries; grows linearly per attempt.
    pub retry_backoff: Duration,
    /// Log a progress line every N records written (0 disables).
    pub progress_interval: u64,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            chunk_size: 100_000,
            staging_dir: env::temp_dir(),
            dict_prefix: "dict".to_string(),
            manifest_path: "manifest.json".to_string(),
            storage_retries: 3,
            retry_backoff: Duration::from_millis(100),
            progress_interval: 100_000,
        }
    }
}

impl Options {
    /// Defaults overlaid with any `WIKIDICT_*` variables that are set.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut opts = Options::default();
        if let Some(v) = lookup("WIKIDICT_CHUNK_SIZE") {
            opts.chunk_size = parse("WIKIDICT_CHUNK_SIZE", &v)?;
        }
        if let Some(v) = lookup("WIKIDICT_STAGING_DIR") {
            opts.staging_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("WIKIDICT_DICT_PREFIX") {
            opts.dict_prefix = v;
        }
        if let Some(v) = lookup("WIKIDICT_MANIFEST_PATH") {
            opts.manifest_path = v;
        }
        if let Some(v) = lookup("WIKIDICT_STORAGE_RETRIES") {
            opts.storage_retries = parse("WIKIDICT_STORAGE_RETRIES", &v)?;
        }
        if let Some(v) = lookup("WIKIDICT_RETRY_BACKOFF_MS") {
            opts.retry_backoff = Duration::from_millis(parse("WIKIDICT_RETRY_BACKOFF_MS", &v)?);
        }
        if let Some(v) = lookup("WIKIDICT_PROGRESS_INTERVAL") {
            opts.progress_interval = parse("WIKIDICT_PROGRESS_INTERVAL", &v)?;
        }
        opts.validate()?;
        Ok(opts)
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::Config("chunk_size must be greater than zero".into()));
        }
        if self.storage_retries == 0 {
            return Err(Error::Config("storage_retries must be at least 1".into()));
        }
        let prefix = self.dict_prefix.trim_matches('/');
        if prefix.is_empty() {
            return Err(Error::Config("dict_prefix must not be empty".into()));
        }
        if self.manifest_path.trim().is_empty() {
            return Err(Error::Config("manifest_path must not be empty".into()));
        }
        Ok(())
    }
}

fn parse<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{name}: cannot parse `{value}`")))
}
