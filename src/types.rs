use serde::{Deserialize, Serialize};

/// One dictionary entry.
///
/// The key is stored verbatim (original case preserved on disk). All
/// ordering and equality decisions use [`fold_key`] instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub key: String,
    pub value: String,
}

impl Record {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Record {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Case-folded form of this record's key.
    pub fn folded_key(&self) -> String {
        fold_key(&self.key)
    }
}

/// Canonical case-insensitive form of a key. Used only for ordering and
/// equality, never for storage.
pub fn fold_key(key: &str) -> String {
    key.to_lowercase()
}

/// A record paired with its folded key.
///
/// Merge loops compare heads many times per record; folding once on the way
/// in keeps comparisons allocation-free.
#[derive(Debug, Clone)]
pub struct KeyedRecord {
    pub folded: String,
    pub record: Record,
}

impl KeyedRecord {
    pub fn new(record: Record) -> Self {
        KeyedRecord {
            folded: record.folded_key(),
            record,
        }
    }
}
