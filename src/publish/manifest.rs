use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::storage::ObjectStore;

/// Object name of a generation's table artifact.
pub const TABLE_FILE: &str = "data.tbl";
/// Object name of a generation's index artifact.
pub const INDEX_FILE: &str = "index.json";

/// The single pointer naming the live generation.
///
/// Readers resolve everything through this record. It is rewritten exactly
/// once per successful build, after the generation it names has been
/// uploaded and verified.
///
/// Fields default to empty on load so a hand-edited or partial manifest
/// still parses; [`Manifest::incremental_inputs`] decides whether it is
/// usable for a refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub table_path: String,
    #[serde(default)]
    pub index_path: String,
    /// Pending changelog to merge on the next refresh. Empty for a fully
    /// merged table.
    #[serde(default)]
    pub delta_path: String,
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

/// Inputs of an incremental build, borrowed from a manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncrementalInputs<'a> {
    pub table_path: &'a str,
    pub index_path: &'a str,
    pub delta_path: &'a str,
}

impl Manifest {
    /// Manifest for a freshly published generation.
    pub fn for_generation(prefix: &str, version: u64) -> Self {
        let (table_path, index_path) = generation_paths(prefix, version);
        Manifest {
            table_path,
            index_path,
            delta_path: String::new(),
            version,
            updated_at: Utc::now(),
        }
    }

    /// Load the manifest, or `None` if nothing has been published yet.
    pub fn load<S: ObjectStore + ?Sized>(store: &S, path: &str) -> Result<Option<Self>> {
        if !store.exists(path)? {
            debug!(path, "no manifest found");
            return Ok(None);
        }
        let bytes = store.get(path)?;
        Self::decode(&bytes).map(Some)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| Error::Manifest(format!("unreadable manifest: {e}")))
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Atomically replace the manifest object.
    pub fn store<S: ObjectStore + ?Sized>(&self, store: &S, path: &str) -> Result<()> {
        store.put(path, &self.encode()?)
    }

    /// True if this manifest names a published table.
    pub fn has_table(&self) -> bool {
        !self.table_path.trim().is_empty()
    }

    /// The fields a refresh needs. `delta_override` takes precedence over
    /// the manifest's own `delta_path`.
    ///
    /// Any missing field is a [`Error::Manifest`], which tells the caller
    /// to fall back to a full bootstrap build.
    pub fn incremental_inputs<'a>(
        &'a self,
        delta_override: Option<&'a str>,
    ) -> Result<IncrementalInputs<'a>> {
        let delta_path = delta_override.unwrap_or(self.delta_path.as_str()).trim();
        let table_path = self.table_path.trim();
        let index_path = self.index_path.trim();
        for (field, value) in [
            ("table_path", table_path),
            ("index_path", index_path),
            ("delta_path", delta_path),
        ] {
            if value.is_empty() {
                return Err(Error::Manifest(format!(
                    "missing or empty required field `{field}`"
                )));
            }
        }
        Ok(IncrementalInputs {
            table_path,
            index_path,
            delta_path,
        })
    }
}

/// Object paths of generation `version`'s table and index.
///
/// Versions are zero-padded so generations list in order.
pub fn generation_paths(prefix: &str, version: u64) -> (String, String) {
    let prefix = prefix.trim_matches('/');
    (
        format!("{prefix}/{version:08}/{TABLE_FILE}"),
        format!("{prefix}/{version:08}/{INDEX_FILE}"),
    )
}
