//! One scanned document's values and ledger

use crate::columns::ColumnSpec;
use formzone_ledger::Ledger;
use indexmap::IndexMap;

/// Values of one document, keyed by column name in canonical order
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRecord {
    key: String,
    values: IndexMap<String, String>,
    ledger: Ledger,
}

impl DocumentRecord {
    pub(crate) fn empty(key: impl Into<String>, columns: &[ColumnSpec]) -> Self {
        Self {
            key: key.into(),
            values: columns
                .iter()
                .map(|c| (c.name.clone(), String::new()))
                .collect(),
            ledger: Ledger::new(),
        }
    }

    pub(crate) fn from_parts(key: String, values: IndexMap<String, String>, ledger: Ledger) -> Self {
        Self { key, values, ledger }
    }

    /// Document key (the scan's path)
    #[inline]
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Value of a column; empty when unset
    #[must_use]
    pub fn value(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }

    /// All values in column order
    #[inline]
    #[must_use]
    pub fn values(&self) -> &IndexMap<String, String> {
        &self.values
    }

    /// Comment ledger
    #[inline]
    #[must_use]
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Comment ledger, mutable
    #[inline]
    pub fn ledger_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }

    pub(crate) fn set(&mut self, field: &str, value: String) {
        if let Some(slot) = self.values.get_mut(field) {
            *slot = value;
        }
    }

    /// Reorder to `columns`, adding missing ones empty and dropping others
    pub(crate) fn conform(&mut self, columns: &[ColumnSpec]) {
        let mut values = std::mem::take(&mut self.values);
        self.values = columns
            .iter()
            .map(|c| (c.name.clone(), values.shift_remove(&c.name).unwrap_or_default()))
            .collect();
    }
}
