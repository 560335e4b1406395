use std::io::{BufRead, Read};

use crate::error::{Error, Result};
use crate::types::Record;

/// Magic bytes at the start of every table artifact.
pub const TABLE_MAGIC: [u8; 4] = *b"WDCT";

/// Current on-disk format version.
pub const FORMAT_VERSION: u16 = 1;

/// The header sits at the start of the table file.
///
/// ```text
/// ┌────────────┬──────────────┬───────────────┐
/// │ Magic (4B) │ Version (2B) │ Reserved (2B) │
/// └────────────┴──────────────┴───────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: u16,
}

impl Header {
    pub const SIZE: usize = 8;

    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0..4].copy_from_slice(&TABLE_MAGIC);
        buf[4..6].copy_from_slice(&self.version.to_le_bytes());
        buf
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(Error::Corruption("table header too short".into()));
        }
        if data[0..4] != TABLE_MAGIC {
            return Err(Error::Corruption(format!(
                "bad table magic: {:02x?}",
                &data[0..4]
            )));
        }
        let version = u16::from_le_bytes([data[4], data[5]]);
        if version != FORMAT_VERSION {
            return Err(Error::Corruption(format!(
                "unsupported table format version {version}"
            )));
        }
        Ok(Header { version })
    }
}

impl Default for Header {
    fn default() -> Self {
        Header {
            version: FORMAT_VERSION,
        }
    }
}

// Row header sizes
const CRC_SIZE: usize = 4;
const KEY_LEN_SIZE: usize = 4;
const VAL_LEN_SIZE: usize = 4;
pub const ROW_HEADER_SIZE: usize = CRC_SIZE + KEY_LEN_SIZE + VAL_LEN_SIZE;

/// Serialize one record as a table row.
///
/// ```text
/// ┌──────────┬─────────────┬─────────────┬───────────┬─────────────┐
/// │ CRC (4B) │ Key Len (4B)│ Val Len (4B)│ Key (var) │ Value (var) │
/// └──────────┴─────────────┴─────────────┴───────────┴─────────────┘
/// ```
///
/// The CRC covers everything after the CRC field. A row is self-delimiting,
/// so an index `(offset, length)` pair can be read and decoded on its own.
pub fn encode_row(record: &Record) -> Vec<u8> {
    let key = record.key.as_bytes();
    let value = record.value.as_bytes();
    let mut buf = Vec::with_capacity(ROW_HEADER_SIZE + key.len() + value.len());

    buf.extend_from_slice(&[0u8; CRC_SIZE]);
    buf.extend_from_slice(&(key.len() as u32).to_le_bytes());
    buf.extend_from_slice(&(value.len() as u32).to_le_bytes());
    buf.extend_from_slice(key);
    buf.extend_from_slice(value);

    let crc = crc32fast::hash(&buf[CRC_SIZE..]);
    buf[0..CRC_SIZE].copy_from_slice(&crc.to_le_bytes());
    buf
}

/// Decode a row from the front of `data`, returning (record, bytes_consumed).
pub fn decode_row(data: &[u8]) -> Result<(Record, usize)> {
    if data.len() < ROW_HEADER_SIZE {
        return Err(Error::Corruption("row too short".into()));
    }
    let stored_crc = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    let key_len = u32::from_le_bytes([data[4], data[5], data[6], data[7]]) as usize;
    let val_len = u32::from_le_bytes([data[8], data[9], data[10], data[11]]) as usize;

    let total = ROW_HEADER_SIZE + key_len + val_len;
    if data.len() < total {
        return Err(Error::Corruption("row truncated".into()));
    }
    let computed_crc = crc32fast::hash(&data[CRC_SIZE..total]);
    if stored_crc != computed_crc {
        return Err(Error::Corruption("row CRC mismatch".into()));
    }

    let key_end = ROW_HEADER_SIZE + key_len;
    let key = utf8(&data[ROW_HEADER_SIZE..key_end], "key")?;
    let value = utf8(&data[key_end..total], "value")?;
    Ok((Record { key, value }, total))
}

/// Read the next row from a buffered reader.
///
/// Returns `Ok(None)` only at a clean row boundary; EOF in the middle of a
/// row is corruption.
pub fn read_row<R: BufRead>(reader: &mut R) -> Result<Option<(Record, usize)>> {
    if reader.fill_buf()?.is_empty() {
        return Ok(None);
    }

    let mut head = [0u8; ROW_HEADER_SIZE];
    read_exact_or_corrupt(reader, &mut head)?;
    let key_len = u32::from_le_bytes([head[4], head[5], head[6], head[7]]) as usize;
    let val_len = u32::from_le_bytes([head[8], head[9], head[10], head[11]]) as usize;

    let mut row = Vec::with_capacity(ROW_HEADER_SIZE + key_len + val_len);
    row.extend_from_slice(&head);
    row.resize(ROW_HEADER_SIZE + key_len + val_len, 0);
    read_exact_or_corrupt(reader, &mut row[ROW_HEADER_SIZE..])?;

    decode_row(&row).map(Some)
}

fn read_exact_or_corrupt<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::Corruption("row truncated at end of file".into())
        } else {
            Error::Io(e)
        }
    })
}

fn utf8(bytes: &[u8], field: &str) -> Result<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|_| Error::Corruption(format!("row {field} is not valid UTF-8")))
}
