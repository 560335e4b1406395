use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::iterator::RecordStream;
use crate::table::format::{read_row, Header};
use crate::types::Record;

/// Sequential reader over a table or chunk file.
///
/// Holds one buffered reader and nothing else, so a merge over k open
/// tables costs k buffers regardless of table size.
pub struct TableReader {
    reader: BufReader<File>,
    path: PathBuf,
    /// Byte offset of the next row.
    offset: u64,
    done: bool,
}

impl TableReader {
    /// Open a table file and validate its header.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let mut header = [0u8; Header::SIZE];
        reader.read_exact(&mut header).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                Error::Corruption(format!("{}: file too short for header", path.display()))
            } else {
                Error::Io(e)
            }
        })?;
        Header::decode(&header)?;

        Ok(TableReader {
            reader,
            path: path.to_path_buf(),
            offset: Header::SIZE as u64,
            done: false,
        })
    }

    /// Byte offset of the next unread row.
    pub fn offset(&self) -> u64 {
        self.offset
    }
}

impl RecordStream for TableReader {
    fn next_record(&mut self) -> Result<Option<Record>> {
        if self.done {
            return Ok(None);
        }
        let row = read_row(&mut self.reader).map_err(|e| match e {
            Error::Corruption(msg) => Error::Corruption(format!(
                "{} at offset {}: {msg}",
                self.path.display(),
                self.offset
            )),
            other => other,
        })?;
        match row {
            Some((record, consumed)) => {
                self.offset += consumed as u64;
                Ok(Some(record))
            }
            None => {
                self.done = true;
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iterator::collect;
    use crate::table::writer::TableWriter;
    use tempfile::tempdir;

    #[test]
    fn reads_back_in_write_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.tbl");

        let mut writer = TableWriter::create(&path).unwrap();
        for i in 0..100u32 {
            writer
                .append(&Record::new(format!("key_{i:05}"), format!("val_{i:05}")))
                .unwrap();
        }
        let meta = writer.finish().unwrap();

        let mut reader = TableReader::open(&path).unwrap();
        let records = collect(&mut reader).unwrap();
        assert_eq!(records.len(), 100);
        assert_eq!(records[0], Record::new("key_00000", "val_00000"));
        assert_eq!(records[99], Record::new("key_00099", "val_00099"));
        assert_eq!(reader.offset(), meta.file_size);
    }

    #[test]
    fn rejects_non_table_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("junk");
        std::fs::write(&path, b"hello world").unwrap();
        assert!(matches!(TableReader::open(&path), Err(Error::Corruption(_))));

        std::fs::write(&path, b"WD").unwrap();
        assert!(matches!(TableReader::open(&path), Err(Error::Corruption(_))));
    }

    #[test]
    fn truncated_row_error_names_file_and_offset() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.tbl");
        let mut writer = TableWriter::create(&path).unwrap();
        writer.append(&Record::new("alpha", "one")).unwrap();
        writer.finish().unwrap();

        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 2]).unwrap();

        let mut reader = TableReader::open(&path).unwrap();
        match reader.next_record() {
            Err(Error::Corruption(msg)) => {
                assert!(msg.contains("t.tbl"), "{msg}");
                assert!(msg.contains("offset 8"), "{msg}");
            }
            other => panic!("expected corruption, got {other:?}"),
        }
    }
}
