//! External sort: chunked in-memory sorting followed by a k-way merge.
//!
//! Phase 1 ([`ChunkSorter`]) cuts the unbounded input into runs of at most
//! `chunk_size` records, sorts each run in memory and spills it to disk.
//! Phase 2 ([`KWayMerger`](crate::iterator::merge::KWayMerger)) streams all
//! runs back through a min-heap. Peak memory is one chunk buffer in phase 1
//! and one head record per chunk in phase 2.

pub mod chunk;

pub use chunk::{ChunkHandle, ChunkSorter};
