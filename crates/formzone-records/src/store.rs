//! Record store and reconciliation against the current schema

use crate::columns::{self, is_key_alias, ColumnSpec};
use crate::error::StoreError;
use crate::persist;
use crate::record::DocumentRecord;
use formzone_ledger::Ledger;
use formzone_schema::{ProjectSchema, COMMENTS_COLUMN, DOCUMENT_KEY_COLUMN};
use indexmap::IndexMap;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info, warn};

/// Value that could not be carried into the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedValue {
    /// Document key of the row
    pub document: String,
    /// Source column (header name, or `#<position>` for headerless files)
    pub column: String,
    /// Original cell text
    pub value: String,
}

/// What reconciliation changed while opening rows
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// First row was recognised as a header
    pub header_found: bool,
    /// Schema columns absent from the file, filled empty
    pub missing_columns: Vec<String>,
    /// File columns unknown to the schema
    pub unknown_columns: Vec<String>,
    /// Non-empty cells in unknown or surplus columns
    pub dropped_values: Vec<DroppedValue>,
    /// Group values that name no button of the group, cleared
    pub rejected_choices: Vec<DroppedValue>,
}

impl ReconcileReport {
    /// Nothing was added, dropped or cleared
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.missing_columns.is_empty()
            && self.unknown_columns.is_empty()
            && self.dropped_values.is_empty()
            && self.rejected_choices.is_empty()
    }
}

/// How many schema columns of a row hold a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Completion {
    /// Columns with a value
    pub filled: usize,
    /// Schema columns
    pub total: usize,
}

/// Rows of document records against one schema
#[derive(Debug, Clone)]
pub struct RecordStore {
    columns: Vec<ColumnSpec>,
    rows: Vec<DocumentRecord>,
}

/// Source positions of each target column
struct Layout {
    key: Option<usize>,
    fields: Vec<Option<usize>>,
    comments: Option<usize>,
    /// Unmatched source columns with their names
    extra: Vec<(usize, String)>,
}

impl RecordStore {
    /// Build a store for `schema`, reconciling any existing rows by name
    ///
    /// `existing` is the raw table including its header row, if it has one.
    /// Headerless tables are read positionally in canonical order.
    ///
    /// # Errors
    ///
    /// [`StoreError::Ledger`] for an unreadable comments cell and
    /// [`StoreError::DuplicateKey`] for a repeated document key.
    pub fn open(
        schema: &ProjectSchema,
        existing: Option<Vec<Vec<String>>>,
    ) -> Result<(Self, ReconcileReport), StoreError> {
        let mut store = Self {
            columns: ColumnSpec::from_schema(schema),
            rows: Vec::new(),
        };
        let mut report = ReconcileReport::default();
        let mut table: Vec<Vec<String>> = existing
            .unwrap_or_default()
            .into_iter()
            .filter(|row| row.iter().any(|cell| !cell.is_empty()))
            .collect();
        if table.is_empty() {
            return Ok((store, report));
        }

        let expected = store.header();
        let layout = if columns::detect_header(&table[0], &expected) {
            let header = table.remove(0);
            report.header_found = true;
            store.header_layout(&header, &mut report)
        } else {
            store.positional_layout(&table)
        };

        for (index, row) in table.into_iter().enumerate() {
            store.load_row(index, &row, &layout, &mut report)?;
        }

        if !report.is_clean() {
            warn!(
                missing = ?report.missing_columns,
                unknown = ?report.unknown_columns,
                dropped = report.dropped_values.len(),
                rejected = report.rejected_choices.len(),
                "rows reconciled against schema"
            );
        }
        debug!(rows = store.len(), "record store opened");
        Ok((store, report))
    }

    /// Read a batch file, or start empty when it does not exist
    ///
    /// # Errors
    ///
    /// Persistence errors, plus those of [`open`](Self::open).
    pub fn load(path: &Path, schema: &ProjectSchema) -> Result<(Self, ReconcileReport), StoreError> {
        if !path.exists() {
            return Self::open(schema, None);
        }
        let rows = persist::read_rows(path)?;
        let opened = Self::open(schema, Some(rows))?;
        info!(path = %path.display(), rows = opened.0.len(), "batch file loaded");
        Ok(opened)
    }

    /// Replace the file at `path` with the store's content
    ///
    /// # Errors
    ///
    /// [`StoreError::Csv`] or [`StoreError::Io`]; the previous file is left
    /// intact on failure.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        persist::write_rows(path, &self.to_rows())?;
        info!(path = %path.display(), rows = self.len(), "batch file saved");
        Ok(())
    }

    /// Value columns in canonical order
    #[inline]
    #[must_use]
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Column spec by name
    ///
    /// # Errors
    ///
    /// [`StoreError::FieldNotFound`] when the schema has no such column.
    pub fn column(&self, field: &str) -> Result<&ColumnSpec, StoreError> {
        self.columns
            .iter()
            .find(|c| c.name == field)
            .ok_or_else(|| StoreError::FieldNotFound(field.to_string()))
    }

    /// Header row: key, value columns, comments
    #[must_use]
    pub fn header(&self) -> Vec<String> {
        columns::header(&self.columns)
    }

    /// Number of rows
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if store has no rows
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row by index
    ///
    /// # Errors
    ///
    /// [`StoreError::RowNotFound`] when out of range.
    pub fn row(&self, row: usize) -> Result<&DocumentRecord, StoreError> {
        self.rows
            .get(row)
            .ok_or_else(|| StoreError::RowNotFound(row.to_string()))
    }

    /// Index of the row with this document key
    #[must_use]
    pub fn find_row(&self, key: &str) -> Option<usize> {
        self.rows.iter().position(|r| r.key() == key)
    }

    /// Rows in order
    pub fn iter(&self) -> impl Iterator<Item = &DocumentRecord> {
        self.rows.iter()
    }

    /// Document keys in order
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.rows.iter().map(|r| r.key().to_string()).collect()
    }

    /// Captured value; empty when unset
    ///
    /// # Errors
    ///
    /// [`StoreError::RowNotFound`] or [`StoreError::FieldNotFound`].
    pub fn get_value(&self, row: usize, field: &str) -> Result<&str, StoreError> {
        let record = self.row(row)?;
        self.column(field)?;
        Ok(record.value(field).unwrap_or_default())
    }

    /// Store a value
    ///
    /// Group columns accept only empty or the name of one of their buttons.
    ///
    /// # Errors
    ///
    /// [`StoreError::RowNotFound`], [`StoreError::FieldNotFound`] or
    /// [`StoreError::InvalidChoice`].
    pub fn set_value(&mut self, row: usize, field: &str, value: &str) -> Result<(), StoreError> {
        self.row(row)?;
        let spec = self.column(field)?;
        if !spec.accepts(value) {
            return Err(StoreError::InvalidChoice {
                field: field.to_string(),
                value: value.to_string(),
                choices: spec.choices.clone(),
            });
        }
        if let Some(record) = self.rows.get_mut(row) {
            record.set(field, value.to_string());
        }
        debug!(row, field, "value set");
        Ok(())
    }

    /// Ledger of a row
    ///
    /// # Errors
    ///
    /// [`StoreError::RowNotFound`] when out of range.
    pub fn ledger(&self, row: usize) -> Result<&Ledger, StoreError> {
        Ok(self.row(row)?.ledger())
    }

    /// Ledger of a row, mutable
    ///
    /// # Errors
    ///
    /// [`StoreError::RowNotFound`] when out of range.
    pub fn ledger_mut(&mut self, row: usize) -> Result<&mut Ledger, StoreError> {
        self.rows
            .get_mut(row)
            .map(DocumentRecord::ledger_mut)
            .ok_or_else(|| StoreError::RowNotFound(row.to_string()))
    }

    /// Start a record for a newly loaded document: all values empty
    ///
    /// # Errors
    ///
    /// [`StoreError::DuplicateKey`] when the key is already present.
    pub fn add_document(&mut self, key: &str) -> Result<usize, StoreError> {
        self.push(DocumentRecord::empty(key, &self.columns))
    }

    /// Append a record, conforming it to this store's columns
    ///
    /// # Errors
    ///
    /// [`StoreError::DuplicateKey`] when the key is already present.
    pub fn push(&mut self, mut record: DocumentRecord) -> Result<usize, StoreError> {
        if !record.key().is_empty() && self.find_row(record.key()).is_some() {
            return Err(StoreError::DuplicateKey(record.key().to_string()));
        }
        record.conform(&self.columns);
        self.rows.push(record);
        Ok(self.rows.len() - 1)
    }

    /// Take the record with this key out of the store
    pub fn remove(&mut self, key: &str) -> Option<DocumentRecord> {
        let index = self.find_row(key)?;
        Some(self.rows.remove(index))
    }

    /// Filled versus total schema columns of a row
    ///
    /// # Errors
    ///
    /// [`StoreError::RowNotFound`] when out of range.
    pub fn completion(&self, row: usize) -> Result<Completion, StoreError> {
        let record = self.row(row)?;
        let filled = record.values().values().filter(|v| !v.trim().is_empty()).count();
        Ok(Completion {
            filled,
            total: self.columns.len(),
        })
    }

    /// Header plus one text row per record
    #[must_use]
    pub fn to_rows(&self) -> Vec<Vec<String>> {
        let mut out = Vec::with_capacity(self.rows.len() + 1);
        out.push(self.header());
        for record in &self.rows {
            let mut row = Vec::with_capacity(self.columns.len() + 2);
            row.push(record.key().to_string());
            row.extend(
                self.columns
                    .iter()
                    .map(|c| record.value(&c.name).unwrap_or_default().to_string()),
            );
            row.push(record.ledger().serialize());
            out.push(row);
        }
        out
    }

    fn header_layout(&self, header: &[String], report: &mut ReconcileReport) -> Layout {
        let find = |name: &str| header.iter().position(|h| h.trim() == name);
        let key = find(DOCUMENT_KEY_COLUMN).or_else(|| header.first().filter(|h| is_key_alias(h)).map(|_| 0));
        let comments = find(COMMENTS_COLUMN)
            .or_else(|| header.iter().position(|h| h.trim().eq_ignore_ascii_case(COMMENTS_COLUMN)));
        let fields: Vec<Option<usize>> = self
            .columns
            .iter()
            .map(|c| {
                let found = find(&c.name);
                if found.is_none() {
                    report.missing_columns.push(c.name.clone());
                }
                found
            })
            .collect();

        let used: Vec<usize> = key
            .into_iter()
            .chain(comments)
            .chain(fields.iter().flatten().copied())
            .collect();
        let extra: Vec<(usize, String)> = header
            .iter()
            .enumerate()
            .filter(|(i, _)| !used.contains(i))
            .map(|(i, name)| (i, name.clone()))
            .collect();
        report.unknown_columns = extra.iter().map(|(_, name)| name.clone()).collect();

        Layout {
            key,
            fields,
            comments,
            extra,
        }
    }

    fn positional_layout(&self, table: &[Vec<String>]) -> Layout {
        let width = self.columns.len() + 2;
        let longest = table.iter().map(Vec::len).max().unwrap_or(0);
        Layout {
            key: Some(0),
            fields: (1..=self.columns.len()).map(Some).collect(),
            comments: Some(width - 1),
            extra: (width..longest).map(|i| (i, format!("#{i}"))).collect(),
        }
    }

    fn load_row(
        &mut self,
        index: usize,
        row: &[String],
        layout: &Layout,
        report: &mut ReconcileReport,
    ) -> Result<(), StoreError> {
        let cell = |at: Option<usize>| at.and_then(|i| row.get(i)).cloned().unwrap_or_default();
        let key = cell(layout.key);

        let mut values = IndexMap::with_capacity(self.columns.len());
        for (spec, at) in self.columns.iter().zip(&layout.fields) {
            let value = cell(*at);
            if spec.accepts(&value) {
                values.insert(spec.name.clone(), value);
            } else {
                report.rejected_choices.push(DroppedValue {
                    document: key.clone(),
                    column: spec.name.clone(),
                    value,
                });
                values.insert(spec.name.clone(), String::new());
            }
        }
        for (at, name) in &layout.extra {
            let value = cell(Some(*at));
            if !value.is_empty() {
                report.dropped_values.push(DroppedValue {
                    document: key.clone(),
                    column: name.clone(),
                    value,
                });
            }
        }

        let ledger = Ledger::parse(&cell(layout.comments))
            .map_err(|source| StoreError::Ledger { row: index, source })?;
        self.push(DocumentRecord::from_parts(key, values, ledger))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formzone_schema::{FieldKind, Zone};
    use pretty_assertions::assert_eq;

    fn schema() -> ProjectSchema {
        let mut schema = ProjectSchema::new();
        let z = Zone::new(0, 0, 10, 10);
        schema.define_field(1, "q1", FieldKind::TickBox, z, None).unwrap();
        let colour = schema.define_field(1, "colour", FieldKind::RadioGroup, z, None).unwrap();
        schema.define_field(1, "red", FieldKind::RadioButton, z, Some(colour)).unwrap();
        schema.define_field(1, "blue", FieldKind::RadioButton, z, Some(colour)).unwrap();
        schema.define_field(2, "age", FieldKind::IntegerField, z, None).unwrap();
        schema
    }

    fn table(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|c| (*c).to_string()).collect())
            .collect()
    }

    #[test]
    fn get_and_set_values() {
        let (mut store, _) = RecordStore::open(&schema(), None).unwrap();
        let row = store.add_document("a.tif").unwrap();
        assert_eq!(store.get_value(row, "age").unwrap(), "");
        store.set_value(row, "age", "42").unwrap();
        assert_eq!(store.get_value(row, "age").unwrap(), "42");

        assert!(matches!(store.get_value(row, "nope"), Err(StoreError::FieldNotFound(_))));
        assert!(matches!(store.set_value(9, "age", "1"), Err(StoreError::RowNotFound(_))));
        assert!(matches!(
            store.set_value(row, "colour", "green"),
            Err(StoreError::InvalidChoice { .. })
        ));
        store.set_value(row, "colour", "blue").unwrap();
        store.set_value(row, "colour", "").unwrap();
    }

    #[test]
    fn duplicate_document_rejected() {
        let (mut store, _) = RecordStore::open(&schema(), None).unwrap();
        store.add_document("a.tif").unwrap();
        assert!(matches!(store.add_document("a.tif"), Err(StoreError::DuplicateKey(_))));
    }

    #[test]
    fn reconciles_by_name_not_position() {
        let rows = table(&[
            &["tiff_path", "age", "q1", "legacy", "Comments"],
            &["a.tif", "30", "Ticked", "old", "P1: q1: check"],
        ]);
        let (store, report) = RecordStore::open(&schema(), Some(rows)).unwrap();

        assert!(report.header_found);
        assert_eq!(report.missing_columns, vec!["colour"]);
        assert_eq!(report.unknown_columns, vec!["legacy"]);
        assert_eq!(report.dropped_values[0].value, "old");
        assert_eq!(store.get_value(0, "age").unwrap(), "30");
        assert_eq!(store.get_value(0, "q1").unwrap(), "Ticked");
        assert_eq!(store.get_value(0, "colour").unwrap(), "");
        assert_eq!(store.ledger(0).unwrap().len(), 1);
    }

    #[test]
    fn headerless_rows_are_positional() {
        let rows = table(&[
            &["a.tif", "Ticked", "red", "30", ""],
            &["b.tif", "", "", ""],
            &["c.tif", "", "", "", "", "surplus"],
        ]);
        let (store, report) = RecordStore::open(&schema(), Some(rows)).unwrap();

        assert!(!report.header_found);
        assert_eq!(store.len(), 3);
        assert_eq!(store.get_value(0, "colour").unwrap(), "red");
        assert_eq!(store.get_value(1, "age").unwrap(), "");
        assert_eq!(report.dropped_values[0].column, "#5");
    }

    #[test]
    fn invalid_group_values_are_reported() {
        let rows = table(&[
            &["tiff_path", "q1", "colour", "age", "Comments"],
            &["a.tif", "", "green", "", ""],
        ]);
        let (store, report) = RecordStore::open(&schema(), Some(rows)).unwrap();
        assert_eq!(store.get_value(0, "colour").unwrap(), "");
        assert_eq!(report.rejected_choices[0].value, "green");
    }

    #[test]
    fn bad_comment_cell_is_an_error() {
        let rows = table(&[
            &["tiff_path", "q1", "colour", "age", "Comments"],
            &["a.tif", "", "", "", "not a comment"],
        ]);
        assert!(matches!(
            RecordStore::open(&schema(), Some(rows)),
            Err(StoreError::Ledger { row: 0, .. })
        ));
    }

    #[test]
    fn completion_counts_filled_columns() {
        let (mut store, _) = RecordStore::open(&schema(), None).unwrap();
        let row = store.add_document("a.tif").unwrap();
        store.set_value(row, "q1", "Ticked").unwrap();
        assert_eq!(store.completion(row).unwrap(), Completion { filled: 1, total: 3 });
    }

    #[test]
    fn to_rows_round_trips_through_open() {
        let (mut store, _) = RecordStore::open(&schema(), None).unwrap();
        let row = store.add_document("a.tif").unwrap();
        store.set_value(row, "colour", "red").unwrap();
        store
            .ledger_mut(row)
            .unwrap()
            .append(formzone_ledger::Comment::new(1, "colour", "faint | smudged"));

        let (reopened, report) = RecordStore::open(&schema(), Some(store.to_rows())).unwrap();
        assert!(report.is_clean());
        assert_eq!(reopened.to_rows(), store.to_rows());
    }
}
