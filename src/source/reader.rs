use std::path::Path;

use crate::error::MigrationError;

/// Field separator of the pipe dialect.
pub const FIELD_SEPARATOR: &str = "+|";
/// Record terminator of the pipe dialect.
pub const RECORD_TERMINATOR: &str = "&|";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// One record per line, fields split on a single tab.
    Tab,
    /// Records end with `&|`, fields are separated by `+|`.
    Pipe,
}

/// One source record. `number` is 1-based and counts only non-blank records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub number: usize,
    pub fields: Vec<String>,
}

impl Row {
    pub fn new(number: usize, fields: Vec<String>) -> Self {
        Self { number, fields }
    }
}

pub async fn read_rows(path: &Path, dialect: Dialect) -> Result<Vec<Row>, MigrationError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| MigrationError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let text = decode(&bytes).map_err(|reason| MigrationError::Encoding {
        path: path.to_path_buf(),
        reason,
    })?;

    Ok(match dialect {
        Dialect::Tab => parse_tab(&text),
        Dialect::Pipe => parse_pipe(&text),
    })
}

pub fn parse_tab(text: &str) -> Vec<Row> {
    text.lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(idx, line)| Row::new(idx + 1, line.split('\t').map(str::to_string).collect()))
        .collect()
}

/// Only the line break written after each terminator is dropped; line
/// breaks inside fields are kept.
pub fn parse_pipe(text: &str) -> Vec<Row> {
    text.split(RECORD_TERMINATOR)
        .map(|record| {
            record
                .strip_prefix("\r\n")
                .or_else(|| record.strip_prefix('\n'))
                .unwrap_or(record)
        })
        .filter(|record| !record.trim().is_empty())
        .enumerate()
        .map(|(idx, record)| {
            Row::new(
                idx + 1,
                record.split(FIELD_SEPARATOR).map(str::to_string).collect(),
            )
        })
        .collect()
}

// The export tool writes the pipe-dialect files as UTF-16LE with a BOM.
fn decode(bytes: &[u8]) -> Result<String, String> {
    if let Some(body) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        if body.len() % 2 != 0 {
            return Err("truncated UTF-16 sequence".to_string());
        }
        let units: Vec<u16> = body
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16(&units).map_err(|e| e.to_string());
    }

    let body = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    String::from_utf8(body.to_vec()).map_err(|e| e.to_string())
}
