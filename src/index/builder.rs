use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::iterator::RecordStream;
use crate::table::{TableMeta, TableWriter};
use crate::types::{fold_key, Record};

/// Artifacts produced by one build pass.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub table: TableMeta,
    pub index_path: PathBuf,
    pub index_entries: u64,
    pub index_size: u64,
}

/// Wraps a [`TableWriter`] and emits the byte-range index in lockstep.
///
/// Both the full build (k-way merger output) and the refresh (merge-updater
/// output) write through this type, so every published table is indexed
/// the same way.
///
/// Guarantees, checked on every record:
/// - folded keys are strictly ascending, so the table is sorted and
///   duplicate-free
/// - index entry count equals table record count
///
/// Index entries are streamed to the index file as they are produced, so
/// memory stays constant no matter how large the table grows.
pub struct IndexBuilder {
    table: TableWriter,
    index: BufWriter<File>,
    index_path: PathBuf,
    /// Index entries written so far.
    entries: u64,
    /// Folded key of the previous record, for the ordering check.
    last_folded: Option<String>,
    progress_interval: u64,
}

impl IndexBuilder {
    /// Create the table file at `table_path` and the index at `index_path`.
    pub fn create(table_path: &Path, index_path: &Path) -> Result<Self> {
        let table = TableWriter::create(table_path)?;
        let mut index = BufWriter::new(File::create(index_path)?);
        index.write_all(b"{")?;
        Ok(IndexBuilder {
            table,
            index,
            index_path: index_path.to_path_buf(),
            entries: 0,
            last_folded: None,
            progress_interval: 0,
        })
    }

    /// Log a progress line every `n` records (0 disables).
    pub fn with_progress_interval(mut self, n: u64) -> Self {
        self.progress_interval = n;
        self
    }

    /// Write one record to the table and its span to the index.
    pub fn add(&mut self, record: &Record) -> Result<()> {
        let folded = fold_key(&record.key);
        if let Some(last) = &self.last_folded {
            if folded <= *last {
                return Err(Error::Integrity(format!(
                    "table order violated: `{}` does not sort after `{}`",
                    record.key, last
                )));
            }
        }

        let span = self.table.append(record)?;

        if self.entries > 0 {
            self.index.write_all(b",")?;
        }
        serde_json::to_writer(&mut self.index, &record.key)?;
        self.index.write_all(b":")?;
        serde_json::to_writer(&mut self.index, &span)?;
        self.entries += 1;

        if self.entries != self.table.records() {
            return Err(Error::Integrity(format!(
                "index has {} entries but table has {} records",
                self.entries,
                self.table.records()
            )));
        }

        self.last_folded = Some(folded);
        if self.progress_interval > 0 && self.entries % self.progress_interval == 0 {
            debug!(records = self.entries, "indexed records");
        }
        Ok(())
    }

    /// Drain `stream` through [`add`](Self::add). Returns records written.
    pub fn write_stream(&mut self, stream: &mut dyn RecordStream) -> Result<u64> {
        let before = self.entries;
        while let Some(record) = stream.next_record()? {
            self.add(&record)?;
        }
        Ok(self.entries - before)
    }

    /// Records written so far.
    pub fn records(&self) -> u64 {
        self.table.records()
    }

    /// Close the index object, fsync both files, and re-check cardinality.
    pub fn finish(mut self) -> Result<BuildOutput> {
        self.index.write_all(b"}")?;
        self.index.flush()?;
        self.index.get_ref().sync_all()?;
        let index_size = self.index.get_ref().metadata()?.len();

        let table = self.table.finish()?;
        if table.records != self.entries {
            return Err(Error::Integrity(format!(
                "index has {} entries but table has {} records",
                self.entries, table.records
            )));
        }

        Ok(BuildOutput {
            table,
            index_path: self.index_path,
            index_entries: self.entries,
            index_size,
        })
    }
}
