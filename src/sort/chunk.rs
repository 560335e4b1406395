use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::iterator::RecordStream;
use crate::table::TableWriter;
use crate::types::KeyedRecord;

/// Locator for one sorted chunk file on local disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkHandle {
    /// Creation order. Later chunks win key collisions during the merge.
    pub seq: u64,
    pub path: PathBuf,
    pub records: u64,
}

/// Splits an unordered record stream into sorted chunk files.
///
/// Duplicate keys are not resolved here. Two records with the same folded
/// key can land in different chunks (or the same chunk, in arrival order);
/// the k-way merger picks the winner.
///
/// The chunk files live in a directory owned by the caller, which is also
/// responsible for deleting them.
pub struct ChunkSorter {
    dir: PathBuf,
    chunk_size: usize,
    next_seq: u64,
}

impl ChunkSorter {
    /// Create a sorter that writes chunks of at most `chunk_size` records
    /// into `dir`.
    pub fn new(dir: &Path, chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::Config("chunk_size must be greater than zero".into()));
        }
        Ok(ChunkSorter {
            dir: dir.to_path_buf(),
            chunk_size,
            next_seq: 0,
        })
    }

    /// Consume `source` entirely, returning the chunks in creation order.
    ///
    /// An empty source produces no chunks.
    pub fn sort(&mut self, source: &mut dyn RecordStream) -> Result<Vec<ChunkHandle>> {
        let mut chunks = Vec::new();
        // Grows with the records actually buffered; chunk_size is only a cap.
        let mut buffer: Vec<KeyedRecord> = Vec::new();
        let mut total = 0u64;

        while let Some(record) = source.next_record()? {
            buffer.push(KeyedRecord::new(record));
            total += 1;
            if buffer.len() >= self.chunk_size {
                chunks.push(self.flush(&mut buffer)?);
                debug!(chunks = chunks.len(), records = total, "flushed sorted chunk");
            }
        }
        if !buffer.is_empty() {
            chunks.push(self.flush(&mut buffer)?);
        }

        info!(chunks = chunks.len(), records = total, "split input into sorted chunks");
        Ok(chunks)
    }

    /// Sort the buffer and write it out as the next chunk. Leaves the buffer
    /// empty.
    fn flush(&mut self, buffer: &mut Vec<KeyedRecord>) -> Result<ChunkHandle> {
        // Stable: records with equal folded keys keep arrival order.
        buffer.sort_by(|a, b| a.folded.cmp(&b.folded));

        let seq = self.next_seq;
        self.next_seq += 1;
        let path = self.dir.join(format!("chunk_{seq:06}.tbl"));

        let mut writer = TableWriter::create(&path)?;
        for keyed in buffer.drain(..) {
            writer.append(&keyed.record)?;
        }
        let meta = writer.finish()?;

        Ok(ChunkHandle {
            seq,
            path,
            records: meta.records,
        })
    }
}
