use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::table::format::{encode_row, Header};
use crate::types::Record;

/// Byte span of one encoded row inside a table file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowSpan {
    pub offset: u64,
    pub length: u32,
}

/// Summary of a finished table file.
#[derive(Debug, Clone)]
pub struct TableMeta {
    pub path: PathBuf,
    /// Number of rows written.
    pub records: u64,
    /// File size in bytes, header included.
    pub file_size: u64,
}

/// Writes a table (or chunk) file row by row.
///
/// Used for:
/// - Sorted chunks produced by the chunk sorter
/// - The merged output of a full build or a refresh (wrapped by the
///   index builder, which owns the ordering checks)
///
/// Build process:
/// 1. `create` writes the header
/// 2. `append` encodes each record and reports the span it landed on
/// 3. `finish` flushes the buffer and fsyncs
pub struct TableWriter {
    writer: BufWriter<File>,
    path: PathBuf,
    /// Tracks current write position in the file.
    offset: u64,
    records: u64,
}

impl TableWriter {
    /// Create a new table file at `path`, truncating any existing file.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        let header = Header::default().encode();
        writer.write_all(&header)?;
        Ok(TableWriter {
            writer,
            path: path.to_path_buf(),
            offset: header.len() as u64,
            records: 0,
        })
    }

    /// Append one row and return the byte span it occupies.
    pub fn append(&mut self, record: &Record) -> Result<RowSpan> {
        let row = encode_row(record);
        let length = u32::try_from(row.len()).map_err(|_| {
            Error::Integrity(format!(
                "record `{}` encodes to {} bytes, over the 4 GiB row limit",
                record.key,
                row.len()
            ))
        })?;
        self.writer.write_all(&row)?;

        let span = RowSpan {
            offset: self.offset,
            length,
        };
        self.offset += row.len() as u64;
        self.records += 1;
        Ok(span)
    }

    /// Rows written so far.
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Flush buffer + fsync to guarantee durability.
    pub fn finish(mut self) -> Result<TableMeta> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;
        Ok(TableMeta {
            path: self.path,
            records: self.records,
            file_size: self.offset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::format::decode_row;
    use tempfile::tempdir;

    #[test]
    fn spans_are_contiguous_after_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.tbl");

        let mut writer = TableWriter::create(&path).unwrap();
        let a = writer.append(&Record::new("alpha", "first")).unwrap();
        let b = writer.append(&Record::new("omega", "last")).unwrap();
        let meta = writer.finish().unwrap();

        assert_eq!(a.offset, Header::SIZE as u64);
        assert_eq!(b.offset, a.offset + a.length as u64);
        assert_eq!(meta.records, 2);
        assert_eq!(meta.file_size, b.offset + b.length as u64);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), meta.file_size);
    }

    #[test]
    fn span_decodes_to_its_record() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.tbl");

        let mut writer = TableWriter::create(&path).unwrap();
        writer.append(&Record::new("k1", "v1")).unwrap();
        let span = writer.append(&Record::new("k2", "v2")).unwrap();
        writer.finish().unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let start = span.offset as usize;
        let row = &bytes[start..start + span.length as usize];
        let (record, consumed) = decode_row(row).unwrap();
        assert_eq!(record, Record::new("k2", "v2"));
        assert_eq!(consumed, span.length as usize);
    }

    #[test]
    fn empty_table_is_header_only() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.tbl");
        let meta = TableWriter::create(&path).unwrap().finish().unwrap();
        assert_eq!(meta.records, 0);
        assert_eq!(meta.file_size, Header::SIZE as u64);
    }
}
