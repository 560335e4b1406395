//! # wikidict
//!
//! Builds and refreshes a large sorted key→value table with a byte-offset
//! index, so a point lookup costs one index search plus one ranged read.
//!
//! ## Build paths
//! - **Full build**: unsorted source → chunk sort → k-way merge → indexed
//!   table. Memory is bounded by one chunk buffer plus one head record per
//!   open chunk.
//! - **Refresh**: two-pointer merge of the live table with a sorted delta.
//!   No re-sort.
//!
//! Either way the result is a new immutable generation, published by
//! rewriting a single manifest object only after both artifacts are
//! uploaded and verified. Readers never see a half-built generation.
//!
//! Keys compare case-insensitively and are stored verbatim. When two
//! records share a folded key the newer one wins.

pub mod build;
pub mod config;
pub mod error;
pub mod index;
pub mod iterator;
pub mod lookup;
pub mod publish;
pub mod refresh;
pub mod sort;
pub mod storage;
pub mod table;
pub mod types;

// Public re-exports for the top-level API
pub use config::Options;
pub use error::{Error, Result};
pub use iterator::RecordStream;
pub use lookup::Dictionary;
pub use publish::{BuildKind, Manifest, PublishController, PublishReport};
pub use storage::{LocalStore, MemoryStore, ObjectStore, RetryStore};
pub use types::Record;
