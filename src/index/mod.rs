pub mod builder;

use std::collections::{BTreeMap, HashMap};

use crate::error::{Error, Result};
use crate::table::{Header, RowSpan};
use crate::types::fold_key;

pub use builder::{BuildOutput, IndexBuilder};

/// One index entry: where a key's row lives in the table file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Original (non-folded) key.
    pub key: String,
    pub offset: u64,
    pub length: u32,
}

/// In-memory index for one table generation.
///
/// On disk the index is a JSON object `key → {"offset", "length"}` keyed by
/// the original key. In memory it is keyed by the folded key, so lookups are
/// case-insensitive and O(1).
#[derive(Debug, Default)]
pub struct Index {
    entries: HashMap<String, IndexEntry>,
}

impl Index {
    /// Parse an index artifact loaded wholesale.
    ///
    /// Two keys that fold to the same form are corruption: the table they
    /// describe cannot have been duplicate-free.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let raw: BTreeMap<String, RowSpan> = serde_json::from_slice(data)
            .map_err(|e| Error::Corruption(format!("index artifact: {e}")))?;

        let mut entries: HashMap<String, IndexEntry> = HashMap::with_capacity(raw.len());
        for (key, span) in raw {
            let folded = fold_key(&key);
            if let Some(prev) = entries.get(&folded) {
                return Err(Error::Corruption(format!(
                    "index has colliding keys `{}` and `{key}`",
                    prev.key
                )));
            }
            let entry = IndexEntry {
                key,
                offset: span.offset,
                length: span.length,
            };
            entries.insert(folded, entry);
        }
        Ok(Index { entries })
    }

    /// Case-insensitive point lookup.
    pub fn get(&self, key: &str) -> Option<&IndexEntry> {
        self.entries.get(&fold_key(key))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check that the spans tile the table exactly: first row right after
    /// the header, each row starting where the previous one ended, last row
    /// ending at `table_size`.
    pub fn check_spans(&self, table_size: u64) -> Result<()> {
        let mut spans: Vec<&IndexEntry> = self.entries.values().collect();
        spans.sort_by_key(|e| e.offset);

        let mut expected = Header::SIZE as u64;
        for entry in spans {
            if entry.offset != expected {
                return Err(Error::Integrity(format!(
                    "index entry `{}` starts at {} but previous row ends at {}",
                    entry.key, entry.offset, expected
                )));
            }
            expected += entry.length as u64;
        }
        if expected != table_size {
            return Err(Error::Integrity(format!(
                "index covers {expected} bytes but table is {table_size} bytes"
            )));
        }
        Ok(())
    }
}
