use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{Error, Result};
use crate::iterator::RecordStream;
use crate::types::Record;

/// Reads records from JSON lines: one `{"key": ..., "value": ...}` object
/// per line. Blank lines are skipped.
///
/// This is the hand-off format from the extraction pipeline. Any malformed
/// line is a [`Error::SourceRead`] carrying the 1-based line number, which
/// aborts the build that is consuming the stream.
pub struct JsonLinesSource<R> {
    reader: R,
    line: String,
    line_no: u64,
    done: bool,
}

impl JsonLinesSource<BufReader<File>> {
    /// Open a JSON-lines file.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| Error::SourceRead(format!("cannot open {}: {e}", path.display())))?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        JsonLinesSource {
            reader,
            line: String::new(),
            line_no: 0,
            done: false,
        }
    }
}

impl<R: BufRead> RecordStream for JsonLinesSource<R> {
    fn next_record(&mut self) -> Result<Option<Record>> {
        while !self.done {
            self.line.clear();
            let n = self
                .reader
                .read_line(&mut self.line)
                .map_err(|e| Error::SourceRead(format!("line {}: {e}", self.line_no + 1)))?;
            if n == 0 {
                self.done = true;
                break;
            }
            self.line_no += 1;

            let trimmed = self.line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let record: Record = serde_json::from_str(trimmed)
                .map_err(|e| Error::SourceRead(format!("line {}: {e}", self.line_no)))?;
            return Ok(Some(record));
        }
        Ok(None)
    }
}
