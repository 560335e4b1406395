use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tracing::debug;

use crate::error::{Error, Result};
use crate::iterator::RecordStream;
use crate::sort::ChunkHandle;
use crate::table::TableReader;
use crate::types::{KeyedRecord, Record};

/// Counters from one k-way merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Records emitted (one per distinct folded key).
    pub emitted: u64,
    /// Records discarded because a newer source held the same folded key.
    pub duplicates_dropped: u64,
}

/// Head record of one open source, ordered for a min-heap on
/// `(folded key, seq)`.
struct HeapEntry {
    head: KeyedRecord,
    seq: u64,
    slot: usize,
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse to pop the smallest first.
        other
            .head
            .folded
            .cmp(&self.head.folded)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

/// Merges sequence-tagged sorted streams into a single sorted stream.
///
/// Used for:
/// - Phase 2 of the external sort (chunk files → one sorted table)
///
/// Ordering guarantee: records are yielded ascending by folded key, exactly
/// one per folded key.
///
/// Collision rule: equal folded keys pop in `(seq, arrival)` order, and the
/// last one popped wins. So the source with the highest sequence id wins,
/// and within one source the later record wins. This is last-write-wins
/// over the original input order.
pub struct KWayMerger {
    sources: Vec<Box<dyn RecordStream>>,
    seqs: Vec<u64>,
    heap: BinaryHeap<HeapEntry>,
    stats: MergeStats,
}

impl KWayMerger {
    /// Create a merger over `(seq, stream)` pairs. Sequence ids must be
    /// unique. Each stream must be sorted by folded key.
    pub fn new(sources: Vec<(u64, Box<dyn RecordStream>)>) -> Result<Self> {
        let mut seqs: Vec<u64> = sources.iter().map(|(seq, _)| *seq).collect();
        seqs.sort_unstable();
        if seqs.windows(2).any(|w| w[0] == w[1]) {
            return Err(Error::Integrity("duplicate chunk sequence id".into()));
        }

        let (seqs, sources): (Vec<u64>, Vec<Box<dyn RecordStream>>) = sources.into_iter().unzip();
        let mut merger = KWayMerger {
            heap: BinaryHeap::with_capacity(sources.len()),
            sources,
            seqs,
            stats: MergeStats::default(),
        };
        for slot in 0..merger.sources.len() {
            merger.pull(slot)?;
        }
        Ok(merger)
    }

    /// Open every chunk file and merge them.
    pub fn from_chunks(chunks: &[ChunkHandle]) -> Result<Self> {
        let mut sources: Vec<(u64, Box<dyn RecordStream>)> = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            sources.push((chunk.seq, Box::new(TableReader::open(&chunk.path)?)));
        }
        Self::new(sources)
    }

    /// Read the next head of `slot` and push it, if the source has one.
    fn pull(&mut self, slot: usize) -> Result<()> {
        if let Some(record) = self.sources[slot].next_record()? {
            self.heap.push(HeapEntry {
                head: KeyedRecord::new(record),
                seq: self.seqs[slot],
                slot,
            });
        }
        Ok(())
    }

    pub fn stats(&self) -> MergeStats {
        self.stats
    }

    /// Number of sources that still have a buffered head.
    pub fn open_sources(&self) -> usize {
        self.heap.len()
    }
}

impl RecordStream for KWayMerger {
    fn next_record(&mut self) -> Result<Option<Record>> {
        let Some(mut winner) = self.heap.pop() else {
            return Ok(None);
        };
        self.pull(winner.slot)?;

        while self
            .heap
            .peek()
            .is_some_and(|next| next.head.folded == winner.head.folded)
        {
            if let Some(newer) = self.heap.pop() {
                self.pull(newer.slot)?;
                debug!(
                    dropped = %winner.head.record.key,
                    kept = %newer.head.record.key,
                    "resolved key collision"
                );
                winner = newer;
                self.stats.duplicates_dropped += 1;
            }
        }

        self.stats.emitted += 1;
        Ok(Some(winner.head.record))
    }
}
