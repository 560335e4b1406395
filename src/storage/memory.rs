use std::collections::HashMap;
use std::io;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::storage::{slice_range, validate_path, ObjectStore};

/// In-memory object store.
///
/// Clones share the same objects, so a test can hand one clone to the
/// publish controller and inspect another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sorted list of object paths.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.objects.lock().keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn len(&self) -> usize {
        self.objects.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.lock().is_empty()
    }
}

fn not_found(op: &'static str, path: &str) -> Error {
    Error::storage(op, path, io::Error::from(io::ErrorKind::NotFound))
}

impl ObjectStore for MemoryStore {
    fn put(&self, path: &str, bytes: &[u8]) -> Result<()> {
        validate_path(path)?;
        self.objects.lock().insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    fn get(&self, path: &str) -> Result<Vec<u8>> {
        validate_path(path)?;
        self.objects
            .lock()
            .get(path)
            .cloned()
            .ok_or_else(|| not_found("get", path))
    }

    fn exists(&self, path: &str) -> Result<bool> {
        validate_path(path)?;
        Ok(self.objects.lock().contains_key(path))
    }

    fn size(&self, path: &str) -> Result<Option<u64>> {
        validate_path(path)?;
        Ok(self.objects.lock().get(path).map(|b| b.len() as u64))
    }

    fn delete(&self, path: &str) -> Result<()> {
        validate_path(path)?;
        self.objects.lock().remove(path);
        Ok(())
    }

    fn get_range(&self, path: &str, offset: u64, len: u64) -> Result<Vec<u8>> {
        validate_path(path)?;
        let objects = self.objects.lock();
        let bytes = objects.get(path).ok_or_else(|| not_found("get_range", path))?;
        slice_range(bytes, path, offset, len).map(<[u8]>::to_vec)
    }
}
