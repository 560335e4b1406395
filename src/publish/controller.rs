use tracing::{info, warn};

use crate::build::{full_build, incremental_build, verify_local};
use crate::config::Options;
use crate::error::{Error, Result};
use crate::index::BuildOutput;
use crate::iterator::merge::MergeStats;
use crate::iterator::RecordStream;
use crate::publish::manifest::{generation_paths, Manifest};
use crate::publish::staging::Staging;
use crate::refresh::UpdateStats;
use crate::storage::ObjectStore;

/// Which build path produced a generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildKind {
    /// Full external sort of the whole source dataset.
    Bootstrap,
    /// Base table merged with a delta.
    Refresh,
}

/// Outcome of a successful publish.
#[derive(Debug, Clone)]
pub struct PublishReport {
    pub kind: BuildKind,
    /// The manifest now live in the store.
    pub manifest: Manifest,
    pub records: u64,
    /// Set for bootstrap builds.
    pub merge: Option<MergeStats>,
    /// Set for refresh builds.
    pub update: Option<UpdateStats>,
}

/// Builds a generation, uploads it, verifies it, and only then flips the
/// manifest.
///
/// Protocol (each step a precondition of the next):
/// 1. Build table + index in a local staging directory and check them
///    structurally
/// 2. Upload both to generation-specific paths in the store
/// 3. Verify both exist remotely with the staged size
/// 4. Rewrite the manifest
///
/// A failure in 1-3 returns early with the manifest untouched, so readers
/// keep serving the previous generation. The staging directory is dropped
/// on every path.
///
/// Assumes a single publisher. Concurrent publishers must be serialized
/// externally; the manifest write is not a compare-and-swap.
pub struct PublishController<S> {
    store: S,
    options: Options,
}

impl<S: ObjectStore> PublishController<S> {
    pub fn new(store: S, options: Options) -> Result<Self> {
        options.validate()?;
        Ok(PublishController { store, options })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The live manifest, if any generation has been published.
    pub fn current_manifest(&self) -> Result<Option<Manifest>> {
        Manifest::load(&self.store, &self.options.manifest_path)
    }

    /// Bootstrap when nothing usable is published, refresh otherwise.
    ///
    /// `open_source` is only called on the bootstrap path, so a refresh
    /// does not need the full source dataset to exist.
    pub fn run<F, R>(&self, open_source: F, delta_override: Option<&str>) -> Result<PublishReport>
    where
        F: FnOnce() -> Result<R>,
        R: RecordStream,
    {
        match self.current_manifest() {
            Ok(Some(manifest)) if manifest.has_table() => {
                info!(version = manifest.version, "published table found, refreshing");
                return self.refresh(delta_override);
            }
            Ok(_) => info!("no published table, running full build"),
            Err(Error::Manifest(msg)) => {
                warn!(error = %msg, "manifest unreadable, running full build");
            }
            Err(e) => return Err(e),
        }
        let mut source = open_source()?;
        self.bootstrap(&mut source)
    }

    /// Full build over the entire source dataset.
    ///
    /// Published as generation 0 on an empty store, otherwise as the next
    /// version, so a forced rebuild never reuses a live path. An unreadable
    /// manifest is overwritten, and the version is one past the highest
    /// generation already present in the store.
    pub fn bootstrap(&self, source: &mut dyn RecordStream) -> Result<PublishReport> {
        let version = match self.current_manifest() {
            Ok(Some(prev)) => prev.version + 1,
            Ok(None) => 0,
            Err(Error::Manifest(msg)) => {
                let version = self.first_free_version()?;
                warn!(error = %msg, version, "manifest unreadable, replacing it");
                version
            }
            Err(e) => return Err(e),
        };

        let staging = Staging::create(&self.options.staging_dir)?;
        let (output, merge) = full_build(source, staging.path(), &self.options)?;
        let manifest = self.publish(&output, version)?;

        Ok(PublishReport {
            kind: BuildKind::Bootstrap,
            records: output.table.records,
            manifest,
            merge: Some(merge),
            update: None,
        })
    }

    /// Merge the live table with a delta and publish the result as the
    /// next generation.
    ///
    /// `delta_override` names a delta table in the store; without it the
    /// manifest's `delta_path` is used. Returns [`Error::Manifest`] when
    /// nothing is published or a required field is missing.
    pub fn refresh(&self, delta_override: Option<&str>) -> Result<PublishReport> {
        let manifest = self.current_manifest()?.ok_or_else(|| {
            Error::Manifest("no manifest published; a full build is required".into())
        })?;
        let inputs = manifest.incremental_inputs(delta_override)?;
        info!(
            version = manifest.version,
            table = inputs.table_path,
            index = inputs.index_path,
            delta = inputs.delta_path,
            "starting incremental build"
        );

        let staging = Staging::create(&self.options.staging_dir)?;
        let base = staging.path().join("base.tbl");
        let delta = staging.path().join("delta.tbl");
        self.store.fetch_file(inputs.table_path, &base)?;
        self.store.fetch_file(inputs.delta_path, &delta)?;

        let out_dir = staging.path().join("out");
        std::fs::create_dir_all(&out_dir)?;
        let (output, update) = incremental_build(&base, &delta, &out_dir, &self.options)?;
        let manifest = self.publish(&output, manifest.version + 1)?;

        Ok(PublishReport {
            kind: BuildKind::Refresh,
            records: output.table.records,
            manifest,
            merge: None,
            update: Some(update),
        })
    }

    /// Sort a changelog into a table artifact and upload it to `dest`.
    ///
    /// Duplicate keys in the changelog collapse last-write-wins. The result
    /// is what [`refresh`](Self::refresh) expects as its delta. The manifest
    /// is not touched. Returns the number of delta records.
    pub fn stage_delta(&self, source: &mut dyn RecordStream, dest: &str) -> Result<u64> {
        let staging = Staging::create(&self.options.staging_dir)?;
        let (output, _) = full_build(source, staging.path(), &self.options)?;
        self.store.put_file(dest, &output.table.path)?;
        self.verify_remote(dest, output.table.file_size)?;
        info!(dest, records = output.table.records, "staged delta");
        Ok(output.table.records)
    }

    /// Steps 1b-4 of the protocol for an already built generation.
    fn publish(&self, output: &BuildOutput, version: u64) -> Result<Manifest> {
        verify_local(output)?;

        let next = Manifest::for_generation(&self.options.dict_prefix, version);

        self.store.put_file(&next.table_path, &output.table.path)?;
        self.store.put_file(&next.index_path, &output.index_path)?;
        info!(
            table = %next.table_path,
            index = %next.index_path,
            "uploaded generation artifacts"
        );

        self.verify_remote(&next.table_path, output.table.file_size)?;
        self.verify_remote(&next.index_path, output.index_size)?;

        next.store(&self.store, &self.options.manifest_path)?;
        info!(version, records = output.table.records, "published generation");
        Ok(next)
    }

    /// Lowest version with no table or index in the store. Versions are
    /// handed out consecutively from 0, so every generation ever uploaded
    /// sits below it.
    fn first_free_version(&self) -> Result<u64> {
        let mut version = 0;
        loop {
            let (table, index) = generation_paths(&self.options.dict_prefix, version);
            if !self.store.exists(&table)? && !self.store.exists(&index)? {
                return Ok(version);
            }
            version += 1;
        }
    }

    /// The object exists and has exactly the staged, non-zero size.
    fn verify_remote(&self, path: &str, expected: u64) -> Result<()> {
        match self.store.size(path)? {
            Some(size) if size > 0 && size == expected => Ok(()),
            Some(size) => {
                warn!(path, size, expected, "uploaded artifact has wrong size");
                Err(Error::Integrity(format!(
                    "`{path}` is {size} bytes in the store, expected {expected}"
                )))
            }
            None => {
                warn!(path, "uploaded artifact missing");
                Err(Error::Integrity(format!("`{path}` missing after upload")))
            }
        }
    }
}
