//! CSV text and atomic whole-file replace

use crate::error::StoreError;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Read every row of a CSV file as plain text cells
///
/// Rows may have different lengths; reconciliation sorts them out.
///
/// # Errors
///
/// [`StoreError::Csv`] when the file cannot be opened or decoded.
pub fn read_rows(path: &Path) -> Result<Vec<Vec<String>>, StoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| StoreError::csv_error(path, e))?;
    reader
        .records()
        .map(|record| {
            record
                .map(|r| r.iter().map(str::to_string).collect())
                .map_err(|e| StoreError::csv_error(path, e))
        })
        .collect()
}

/// Encode rows as CSV and replace `path` atomically
///
/// # Errors
///
/// [`StoreError::Csv`] for encoding failures, [`StoreError::Io`] for write
/// failures.
pub fn write_rows(path: &Path, rows: &[Vec<String>]) -> Result<(), StoreError> {
    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    for row in rows {
        writer
            .write_record(row)
            .map_err(|e| StoreError::csv_error(path, e))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| StoreError::io_error(path, e.into_error()))?;
    write_atomic(path, &bytes)
}

/// Write to a temporary file beside `path`, sync, then rename over it
///
/// A crash at any point leaves either the old file or the new one, never a
/// partial write.
///
/// # Errors
///
/// [`StoreError::Io`] on any filesystem failure.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StoreError::io_error(dir, e))?;
    tmp.write_all(bytes).map_err(|e| StoreError::io_error(tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| StoreError::io_error(tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| StoreError::io_error(path, e.error))?;
    debug!(path = %path.display(), bytes = bytes.len(), "file replaced");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.csv");
        let rows = vec![
            vec!["tiff_path".to_string(), "note".to_string()],
            vec!["a.tif".to_string(), "has, comma and \"quotes\"".to_string()],
        ];
        write_rows(&path, &rows).unwrap();
        assert_eq!(read_rows(&path).unwrap(), rows);
    }

    #[test]
    fn replace_keeps_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.csv");
        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn ragged_rows_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.csv");
        std::fs::write(&path, "a.tif,Ticked\nb.tif\n").unwrap();
        let rows = read_rows(&path).unwrap();
        assert_eq!(rows[0].len(), 2);
        assert_eq!(rows[1].len(), 1);
    }
}
