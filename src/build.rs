//! Local build passes. Both write `data.tbl` + `index.json` into a caller
//! supplied working directory; nothing here touches the object store.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::config::Options;
use crate::error::{Error, Result};
use crate::index::{BuildOutput, Index, IndexBuilder};
use crate::iterator::merge::{KWayMerger, MergeStats};
use crate::iterator::RecordStream;
use crate::publish::manifest::{INDEX_FILE, TABLE_FILE};
use crate::refresh::{MergeUpdater, UpdateStats};
use crate::sort::ChunkSorter;
use crate::table::TableReader;

/// Full build: chunk sort → k-way merge → indexed table.
///
/// Chunk files are written under `dir/chunks` and removed once merged.
pub fn full_build(
    source: &mut dyn RecordStream,
    dir: &Path,
    options: &Options,
) -> Result<(BuildOutput, MergeStats)> {
    let chunk_dir = dir.join("chunks");
    fs::create_dir_all(&chunk_dir)?;

    let mut sorter = ChunkSorter::new(&chunk_dir, options.chunk_size)?;
    let chunks = sorter.sort(source)?;

    let mut merger = KWayMerger::from_chunks(&chunks)?;
    let mut builder = IndexBuilder::create(&dir.join(TABLE_FILE), &dir.join(INDEX_FILE))?
        .with_progress_interval(options.progress_interval);
    builder.write_stream(&mut merger)?;
    let output = builder.finish()?;
    let stats = merger.stats();

    drop(merger);
    fs::remove_dir_all(&chunk_dir)?;

    info!(
        chunks = chunks.len(),
        records = output.table.records,
        duplicates_dropped = stats.duplicates_dropped,
        table_bytes = output.table.file_size,
        index_bytes = output.index_size,
        "full build complete"
    );
    Ok((output, stats))
}

/// Incremental build: merge a base table with a sorted delta table.
pub fn incremental_build(
    base: &Path,
    delta: &Path,
    dir: &Path,
    options: &Options,
) -> Result<(BuildOutput, UpdateStats)> {
    let mut updater = MergeUpdater::new(TableReader::open(base)?, TableReader::open(delta)?)?;
    let mut builder = IndexBuilder::create(&dir.join(TABLE_FILE), &dir.join(INDEX_FILE))?
        .with_progress_interval(options.progress_interval);
    builder.write_stream(&mut updater)?;
    let output = builder.finish()?;

    updater.log_summary();
    Ok((output, updater.stats()))
}

/// Structural check of a finished build before anything is uploaded:
/// the index parses, has one entry per row, and its spans tile the table.
pub fn verify_local(output: &BuildOutput) -> Result<()> {
    let bytes = fs::read(&output.index_path)?;
    let index = Index::from_json(&bytes)?;
    if index.len() as u64 != output.table.records {
        return Err(Error::Integrity(format!(
            "index has {} entries but table has {} records",
            index.len(),
            output.table.records
        )));
    }
    index.check_spans(output.table.file_size)
}
