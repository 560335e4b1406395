use tracing::debug;

use crate::error::{Error, Result};
use crate::index::Index;
use crate::publish::manifest::Manifest;
use crate::storage::ObjectStore;
use crate::table::decode_row;
use crate::types::{fold_key, Record};

/// Point-lookup reader over the live generation.
///
/// Opening resolves the manifest once and loads that generation's index
/// wholesale. Every `get` is then one index lookup plus one ranged read of
/// the table. A reader keeps serving the generation it opened even after a
/// newer one is published; reopen to pick up the new manifest.
pub struct Dictionary<S> {
    store: S,
    manifest: Manifest,
    index: Index,
}

impl<S: ObjectStore> Dictionary<S> {
    pub fn open(store: S, manifest_path: &str) -> Result<Self> {
        let manifest = Manifest::load(&store, manifest_path)?
            .filter(Manifest::has_table)
            .ok_or_else(|| Error::Manifest("no dictionary has been published".into()))?;
        if manifest.index_path.trim().is_empty() {
            return Err(Error::Manifest("missing or empty required field `index_path`".into()));
        }

        let index = Index::from_json(&store.get(&manifest.index_path)?)?;
        debug!(
            version = manifest.version,
            entries = index.len(),
            "loaded dictionary index"
        );
        Ok(Dictionary {
            store,
            manifest,
            index,
        })
    }

    /// Case-insensitive lookup. `Ok(None)` when the key is not indexed.
    pub fn get(&self, key: &str) -> Result<Option<Record>> {
        let Some(entry) = self.index.get(key) else {
            return Ok(None);
        };
        let bytes = self.store.get_range(
            &self.manifest.table_path,
            entry.offset,
            u64::from(entry.length),
        )?;

        let (record, consumed) = decode_row(&bytes)?;
        if consumed != bytes.len() {
            return Err(Error::Corruption(format!(
                "index span for `{}` is {} bytes but the row is {consumed}",
                entry.key,
                bytes.len()
            )));
        }
        if fold_key(&record.key) != fold_key(key) {
            return Err(Error::Corruption(format!(
                "index span for `{}` points at row `{}`",
                entry.key, record.key
            )));
        }
        Ok(Some(record))
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
