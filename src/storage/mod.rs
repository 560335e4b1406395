//! Durable object storage behind a small trait.
//!
//! Components receive a store handle explicitly; there is no process-wide
//! client. Paths are relative, `/`-separated object names such as
//! `dict/00000003/data.tbl` or `manifest.json`.

pub mod local;
pub mod memory;
pub mod retry;

use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};

pub use local::LocalStore;
pub use memory::MemoryStore;
pub use retry::RetryStore;

/// Object store operations needed by the build and lookup paths.
pub trait ObjectStore {
    /// Write `bytes` at `path`, replacing any existing object. Readers
    /// never observe a partially written object.
    fn put(&self, path: &str, bytes: &[u8]) -> Result<()>;

    /// Read a whole object. A missing object is a storage error with kind
    /// `NotFound`.
    fn get(&self, path: &str) -> Result<Vec<u8>>;

    fn exists(&self, path: &str) -> Result<bool>;

    /// Object size in bytes, or `None` if it does not exist.
    fn size(&self, path: &str) -> Result<Option<u64>>;

    /// Remove an object. Removing a missing object is not an error.
    fn delete(&self, path: &str) -> Result<()>;

    /// Read `len` bytes starting at `offset`.
    fn get_range(&self, path: &str, offset: u64, len: u64) -> Result<Vec<u8>> {
        let bytes = self.get(path)?;
        slice_range(&bytes, path, offset, len).map(<[u8]>::to_vec)
    }

    /// Upload a local file.
    fn put_file(&self, path: &str, local: &Path) -> Result<()> {
        let bytes = fs::read(local)?;
        self.put(path, &bytes)
    }

    /// Download an object to a local file. Returns bytes written.
    fn fetch_file(&self, path: &str, local: &Path) -> Result<u64> {
        let bytes = self.get(path)?;
        fs::write(local, &bytes)?;
        Ok(bytes.len() as u64)
    }
}

impl<S: ObjectStore + ?Sized> ObjectStore for Arc<S> {
    fn put(&self, path: &str, bytes: &[u8]) -> Result<()> {
        (**self).put(path, bytes)
    }
    fn get(&self, path: &str) -> Result<Vec<u8>> {
        (**self).get(path)
    }
    fn exists(&self, path: &str) -> Result<bool> {
        (**self).exists(path)
    }
    fn size(&self, path: &str) -> Result<Option<u64>> {
        (**self).size(path)
    }
    fn delete(&self, path: &str) -> Result<()> {
        (**self).delete(path)
    }
    fn get_range(&self, path: &str, offset: u64, len: u64) -> Result<Vec<u8>> {
        (**self).get_range(path, offset, len)
    }
    fn put_file(&self, path: &str, local: &Path) -> Result<()> {
        (**self).put_file(path, local)
    }
    fn fetch_file(&self, path: &str, local: &Path) -> Result<u64> {
        (**self).fetch_file(path, local)
    }
}

/// Bounds-checked view of `bytes[offset..offset + len]`.
pub(crate) fn slice_range<'a>(bytes: &'a [u8], path: &str, offset: u64, len: u64) -> Result<&'a [u8]> {
    let end = offset.checked_add(len);
    match end {
        Some(end) if end <= bytes.len() as u64 => Ok(&bytes[offset as usize..end as usize]),
        _ => Err(Error::storage(
            "get_range",
            path,
            io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("range {offset}+{len} beyond object size {}", bytes.len()),
            ),
        )),
    }
}

/// Reject absolute paths and `..` so a store never escapes its root.
pub(crate) fn validate_path(path: &str) -> Result<()> {
    let bad = path.is_empty()
        || path.starts_with('/')
        || path.split('/').any(|part| part.is_empty() || part == "." || part == "..");
    if bad {
        return Err(Error::storage(
            "validate",
            path,
            io::Error::new(io::ErrorKind::InvalidInput, "invalid object path"),
        ));
    }
    Ok(())
}
