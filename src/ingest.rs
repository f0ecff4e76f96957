//! Reads the raw sales log and splits it into lines.

use crate::encoding::{decode_with_fallback, default_decoders, TextDecoder};
use crate::error::{PipelineError, Result};
use crate::transaction::FIELDS;
use log::{debug, info};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Decoded lines of a sales log, header removed.
#[derive(Debug, Clone)]
pub struct SalesLog {
    /// Label of the encoding that decoded the file.
    pub encoding: &'static str,
    /// Whether a header row was found and dropped.
    pub had_header: bool,
    /// Data lines in file order. Empty lines are kept for the parser to count.
    pub lines: Vec<String>,
}

/// Reads a sales log with the default encoding candidates.
pub fn read_lines(path: impl AsRef<Path>) -> Result<SalesLog> {
    read_lines_with(path, &default_decoders())
}

/// Reads a sales log trying `decoders` in order.
pub fn read_lines_with(path: impl AsRef<Path>, decoders: &[Box<dyn TextDecoder>]) -> Result<SalesLog> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => PipelineError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => PipelineError::FileAccess {
            path: path.to_path_buf(),
            source,
        },
    })?;

    let decoded = decode_with_fallback(&bytes, decoders).ok_or_else(|| PipelineError::Encoding {
        path: path.to_path_buf(),
        attempted: decoders.iter().map(|d| d.label()).collect(),
    })?;
    info!(
        "Read {} bytes from {} as {}",
        bytes.len(),
        path.display(),
        decoded.encoding
    );

    Ok(split_lines(&decoded.text, decoded.encoding))
}

/// Splits decoded text into lines and drops a leading header row.
pub fn split_lines(text: &str, encoding: &'static str) -> SalesLog {
    let mut lines: Vec<String> = text
        .lines()
        .map(|line| line.trim_end_matches('\r').to_string())
        .collect();

    let had_header = lines.first().map(|l| is_header(l)).unwrap_or(false);
    if had_header {
        debug!("Dropping header row");
        lines.remove(0);
    }

    SalesLog {
        encoding,
        had_header,
        lines,
    }
}

/// A header row names the first schema field in its first column.
fn is_header(line: &str) -> bool {
    line.split('|')
        .next()
        .map(|first| first.trim().eq_ignore_ascii_case(FIELDS[0]))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::Utf8;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(bytes: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file
    }

    #[test]
    fn test_reads_utf8_and_drops_header() {
        let file = write_temp(
            b"TransactionID|Date|ProductID|ProductName|Quantity|UnitPrice|CustomerID|Region\n\
              T001|2024-12-01|P101|Laptop|2|45000|C001|North\n",
        );

        let log = read_lines(file.path()).unwrap();
        assert_eq!(log.encoding, "utf-8");
        assert!(log.had_header);
        assert_eq!(log.lines, vec!["T001|2024-12-01|P101|Laptop|2|45000|C001|North"]);
    }

    #[test]
    fn test_keeps_first_line_without_header() {
        let log = split_lines("T001|2024-12-01|P101|Laptop|2|45000|C001|North\r\n\r\n", "utf-8");
        assert!(!log.had_header);
        assert_eq!(log.lines.len(), 2);
        assert_eq!(log.lines[1], "");
    }

    #[test]
    fn test_latin1_fallback() {
        let file = write_temp(b"T001|2024-12-01|P101|Caf\xE9|2|45000|C001|North\n");
        let log = read_lines(file.path()).unwrap();
        assert_eq!(log.encoding, "latin-1");
        assert!(log.lines[0].contains("Café"));
    }

    #[test]
    fn test_missing_file_is_file_not_found() {
        let err = read_lines("definitely/not/here.txt").unwrap_err();
        assert!(matches!(err, PipelineError::FileNotFound { .. }));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_unreadable_path_is_file_access() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = read_lines(dir.path()).unwrap_err();
        match err {
            PipelineError::FileAccess { path, .. } => assert_eq!(path, dir.path()),
            other => panic!("Expected FileAccess error, got {other:?}"),
        }
    }

    #[test]
    fn test_undecodable_file_is_encoding_error() {
        let file = write_temp(b"\xFF\xFE\xFD");
        let decoders: Vec<Box<dyn TextDecoder>> = vec![Box::new(Utf8)];
        let err = read_lines_with(file.path(), &decoders).unwrap_err();
        match err {
            PipelineError::Encoding { attempted, .. } => assert_eq!(attempted, vec!["utf-8"]),
            other => panic!("Expected Encoding error, got {other:?}"),
        }
    }
}
