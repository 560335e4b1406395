//! Incremental refresh: two-way sorted merge of a base table and a delta.

use std::cmp::Ordering;

use tracing::info;

use crate::error::{Error, Result};
use crate::iterator::RecordStream;
use crate::types::{KeyedRecord, Record};

/// Where the records of a refreshed table came from. Observability only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateStats {
    /// Emitted from the base table unchanged.
    pub base_only: u64,
    /// Present only in the delta (insertions).
    pub inserted: u64,
    /// Present in both; the delta's value was kept.
    pub updated: u64,
}

impl UpdateStats {
    pub fn total(&self) -> u64 {
        self.base_only + self.inserted + self.updated
    }
}

/// Which input a head record was read from, for the ordering checks.
#[derive(Clone, Copy)]
enum Side {
    Base,
    Delta,
}

/// One input of the two-way merge with its buffered head.
struct Cursor<S> {
    stream: S,
    side: Side,
    head: Option<KeyedRecord>,
    /// Records consumed from this side.
    read: u64,
}

impl<S: RecordStream> Cursor<S> {
    fn new(stream: S, side: Side) -> Result<Self> {
        let mut cursor = Cursor {
            stream,
            side,
            head: None,
            read: 0,
        };
        cursor.head = cursor.fetch(None)?;
        Ok(cursor)
    }

    /// Take the current head and buffer the next one.
    fn advance(&mut self) -> Result<Option<KeyedRecord>> {
        let current = self.head.take();
        if let Some(current) = &current {
            self.read += 1;
            self.head = self.fetch(Some(&current.folded))?;
        }
        Ok(current)
    }

    /// Read the next record and check it sorts strictly after `prev`.
    fn fetch(&mut self, prev: Option<&str>) -> Result<Option<KeyedRecord>> {
        let Some(record) = self.stream.next_record()? else {
            return Ok(None);
        };
        let next = KeyedRecord::new(record);
        if let Some(prev) = prev {
            if next.folded.as_str() <= prev {
                let msg = format!(
                    "`{}` does not sort strictly after `{}`",
                    next.record.key, prev
                );
                return Err(match self.side {
                    Side::Delta => Error::SourceRead(format!("delta not sorted: {msg}")),
                    Side::Base => Error::Integrity(format!("base table not sorted: {msg}")),
                });
            }
        }
        Ok(Some(next))
    }
}

/// Merges base generation N with a sorted delta into generation N+1.
///
/// Per step, comparing folded keys:
/// - base < delta: emit base, advance base
/// - base > delta: emit delta (insert), advance delta
/// - equal: emit delta (update), advance both
///
/// Once one side is exhausted the other is drained unchanged. The output is
/// a flat table; nothing is layered or merged at read time.
///
/// Memory: one head record per side.
pub struct MergeUpdater<B, D> {
    base: Cursor<B>,
    delta: Cursor<D>,
    stats: UpdateStats,
}

impl<B: RecordStream, D: RecordStream> MergeUpdater<B, D> {
    pub fn new(base: B, delta: D) -> Result<Self> {
        Ok(MergeUpdater {
            base: Cursor::new(base, Side::Base)?,
            delta: Cursor::new(delta, Side::Delta)?,
            stats: UpdateStats::default(),
        })
    }

    pub fn stats(&self) -> UpdateStats {
        self.stats
    }

    /// Records consumed from (base, delta) so far.
    pub fn consumed(&self) -> (u64, u64) {
        (self.base.read, self.delta.read)
    }

    /// Log the merge summary. Call after the stream is drained.
    pub fn log_summary(&self) {
        info!(
            base_read = self.base.read,
            delta_read = self.delta.read,
            updated = self.stats.updated,
            inserted = self.stats.inserted,
            base_only = self.stats.base_only,
            total = self.stats.total(),
            "merged delta into base table"
        );
    }
}

impl<B: RecordStream, D: RecordStream> RecordStream for MergeUpdater<B, D> {
    fn next_record(&mut self) -> Result<Option<Record>> {
        let order = match (&self.base.head, &self.delta.head) {
            (None, None) => return Ok(None),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some(b), Some(d)) => b.folded.cmp(&d.folded),
        };

        let emitted = match order {
            Ordering::Less => {
                self.stats.base_only += 1;
                self.base.advance()?
            }
            Ordering::Greater => {
                self.stats.inserted += 1;
                self.delta.advance()?
            }
            Ordering::Equal => {
                self.stats.updated += 1;
                self.base.advance()?;
                self.delta.advance()?
            }
        };
        Ok(emitted.map(|keyed| keyed.record))
    }
}
