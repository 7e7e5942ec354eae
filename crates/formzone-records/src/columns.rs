//! Column layout derived from the schema

use formzone_schema::{FieldKind, ProjectSchema, COMMENTS_COLUMN, DOCUMENT_KEY_COLUMN};

/// First-cell names that mark a header row in older batches
const KEY_ALIASES: [&str; 3] = [DOCUMENT_KEY_COLUMN, "path", "file"];

/// One value column of the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Field name, also the header cell
    pub name: String,
    /// Kind of the owning field
    pub kind: FieldKind,
    /// Page the field lives on
    pub page: u32,
    /// Button names, for group columns
    pub choices: Vec<String>,
}

impl ColumnSpec {
    /// Columns of a schema in canonical order
    #[must_use]
    pub fn from_schema(schema: &ProjectSchema) -> Vec<ColumnSpec> {
        schema
            .columns()
            .into_iter()
            .map(|field| ColumnSpec {
                name: field.name().to_string(),
                kind: field.kind(),
                page: field.page(),
                choices: schema
                    .children(field.id())
                    .into_iter()
                    .map(|b| b.name().to_string())
                    .collect(),
            })
            .collect()
    }

    /// True when `value` may be stored in this column
    #[must_use]
    pub fn accepts(&self, value: &str) -> bool {
        !self.kind.is_group() || value.is_empty() || self.choices.iter().any(|c| c == value)
    }
}

/// Full header row: key column, value columns, comments column
#[must_use]
pub fn header(columns: &[ColumnSpec]) -> Vec<String> {
    std::iter::once(DOCUMENT_KEY_COLUMN.to_string())
        .chain(columns.iter().map(|c| c.name.clone()))
        .chain(std::iter::once(COMMENTS_COLUMN.to_string()))
        .collect()
}

/// Decide whether the first row of a file is a header
///
/// True when its first (up to three) cells match the expected header
/// case-insensitively, or its first cell names the document key.
#[must_use]
pub fn detect_header(first_row: &[String], expected: &[String]) -> bool {
    let Some(first) = first_row.first() else {
        return false;
    };
    let first = first.trim();
    if KEY_ALIASES.iter().any(|alias| alias.eq_ignore_ascii_case(first)) {
        return true;
    }
    let compared = first_row.len().min(expected.len()).min(3);
    compared > 0
        && first_row
            .iter()
            .zip(expected)
            .take(compared)
            .all(|(cell, name)| cell.trim().eq_ignore_ascii_case(name))
}

/// True when a header cell names the document key
pub(crate) fn is_key_alias(cell: &str) -> bool {
    KEY_ALIASES
        .iter()
        .any(|alias| alias.eq_ignore_ascii_case(cell.trim()))
}
