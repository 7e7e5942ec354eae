//! Reference list for lookup strategies
//!
//! A CSV file with a header row; rows are keyed by the value in the prime
//! column (`lookup_prime_index`, 0 by default).

use crate::error::ConfigError;
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Rows of a lookup list keyed by their prime column
#[derive(Debug, Clone, Default)]
pub struct LookupTable {
    prime_index: usize,
    rows: HashMap<String, Vec<String>>,
}

impl LookupTable {
    /// Read a lookup list, skipping its header row
    ///
    /// # Errors
    ///
    /// [`ConfigError::Lookup`] when the CSV cannot be decoded.
    pub fn from_reader<R: Read>(reader: R, prime_index: usize) -> Result<Self, ConfigError> {
        Self::read(reader, prime_index, Path::new("<memory>"))
    }

    /// Load a lookup list from disk
    ///
    /// # Errors
    ///
    /// [`ConfigError::Lookup`] when the file cannot be opened or decoded.
    pub fn load(path: &Path, prime_index: usize) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path).map_err(|e| ConfigError::Lookup {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let table = Self::read(file, prime_index, path)?;
        info!(path = %path.display(), rows = table.len(), prime_index, "lookup list loaded");
        Ok(table)
    }

    fn read<R: Read>(reader: R, prime_index: usize, path: &Path) -> Result<Self, ConfigError> {
        let mut csv = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let mut rows = HashMap::new();
        for record in csv.records() {
            let record = record.map_err(|e| ConfigError::Lookup {
                path: PathBuf::from(path),
                reason: e.to_string(),
            })?;
            let cells: Vec<String> = record.iter().map(str::to_string).collect();
            match cells.get(prime_index) {
                Some(key) => {
                    rows.entry(key.clone()).or_insert(cells);
                }
                None => debug!(cells = cells.len(), prime_index, "lookup row without prime column skipped"),
            }
        }
        Ok(Self { prime_index, rows })
    }

    /// Cell in `column` of the row keyed by `key`
    #[must_use]
    pub fn lookup(&self, key: &str, column: usize) -> Option<&str> {
        self.rows
            .get(key)
            .and_then(|row| row.get(column))
            .map(String::as_str)
    }

    /// Column used as the key
    #[inline]
    #[must_use]
    pub fn prime_index(&self) -> usize {
        self.prime_index
    }

    /// Number of keyed rows
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if no rows were read
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
