//! Table artifacts: the sorted, row-addressable data file.
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │ HEADER  magic "WDCT" | version (u16) | rsvd   │
//! ├───────────────────────────────────────────────┤
//! │ ROW     crc | key_len | val_len | key | value │
//! │ ... repeated, ascending by case-folded key ...│
//! └───────────────────────────────────────────────┘
//! ```
//!
//! Chunk files from the external sort use the same layout; only published
//! tables are guaranteed duplicate-free.

pub mod format;
pub mod reader;
pub mod writer;

pub use format::{decode_row, encode_row, Header};
pub use reader::TableReader;
pub use writer::{RowSpan, TableMeta, TableWriter};
