//! Page files
//!
//! A project folder keeps one JSON file per page (`1.json`, `2.json`, ...),
//! each a list of field records. Groups carry their buttons inline.

use crate::error::SchemaError;
use crate::field::FieldKind;
use crate::schema::ProjectSchema;
use crate::zone::Zone;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// One field as stored in a page file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRecord {
    /// Field kind
    #[serde(rename = "type")]
    pub kind: FieldKind,
    /// Field name
    pub name: String,
    /// Fiducial-relative x
    pub x: i32,
    /// Fiducial-relative y
    pub y: i32,
    /// Width; 0 means default
    #[serde(default)]
    pub width: i32,
    /// Height; 0 means default
    #[serde(default)]
    pub height: i32,
    /// Buttons of a group
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub radio_buttons: Vec<FieldRecord>,
}

impl FieldRecord {
    fn zone(&self) -> Zone {
        Zone::new(self.x, self.y, self.width, self.height)
    }
}

/// Path of a page file inside a schema folder
#[must_use]
pub fn page_file(dir: &Path, page: u32) -> PathBuf {
    dir.join(format!("{page}.json"))
}

impl ProjectSchema {
    /// Build a schema from per-page record lists (index 0 is page 1)
    ///
    /// # Errors
    ///
    /// Any [`SchemaError`] raised while defining the fields.
    pub fn from_page_records(pages: Vec<Vec<FieldRecord>>) -> Result<Self, SchemaError> {
        let mut schema = ProjectSchema::new();
        for (page, records) in (1u32..).zip(pages) {
            schema.ensure_page(page)?;
            for record in records {
                let id = schema.define_field(page, record.name.as_str(), record.kind, record.zone(), None)?;
                if !record.radio_buttons.is_empty() && !record.kind.is_group() {
                    return Err(SchemaError::invalid_parent(
                        record.radio_buttons[0].name.clone(),
                        "only radio groups hold radio buttons",
                    ));
                }
                for button in record.radio_buttons {
                    schema.define_field(page, button.name.as_str(), button.kind, button.zone(), Some(id))?;
                }
            }
        }
        Ok(schema)
    }

    /// Records for one page, groups with their buttons inline
    #[must_use]
    pub fn page_records(&self, page: u32) -> Vec<FieldRecord> {
        self.page_fields(page)
            .into_iter()
            .map(|field| {
                let zone = field.zone();
                FieldRecord {
                    kind: field.kind(),
                    name: field.name().to_string(),
                    x: zone.x,
                    y: zone.y,
                    width: zone.width,
                    height: zone.height,
                    radio_buttons: self
                        .children(field.id())
                        .into_iter()
                        .map(|b| {
                            let zone = b.zone();
                            FieldRecord {
                                kind: b.kind(),
                                name: b.name().to_string(),
                                x: zone.x,
                                y: zone.y,
                                width: zone.width,
                                height: zone.height,
                                radio_buttons: Vec::new(),
                            }
                        })
                        .collect(),
                }
            })
            .collect()
    }

    /// Load pages `1.json`, `2.json`, ... until the first missing file
    ///
    /// # Errors
    ///
    /// [`SchemaError::Io`] or [`SchemaError::Json`] for unreadable files, or
    /// a definition error for inconsistent content.
    pub fn load_dir(dir: &Path) -> Result<Self, SchemaError> {
        let mut pages = Vec::new();
        for page in 1u32.. {
            let path = page_file(dir, page);
            if !path.is_file() {
                break;
            }
            let text = std::fs::read_to_string(&path).map_err(|e| SchemaError::io_error(&path, e))?;
            let records: Vec<FieldRecord> =
                serde_json::from_str(&text).map_err(|source| SchemaError::Json { path: path.clone(), source })?;
            debug!(path = %path.display(), fields = records.len(), "page file read");
            pages.push(records);
        }
        let schema = Self::from_page_records(pages)?;
        info!(dir = %dir.display(), pages = schema.page_count(), fields = schema.len(), "schema loaded");
        Ok(schema)
    }

    /// Write one file per page, replacing each atomically
    ///
    /// Page files past the last page are removed so a later
    /// [`ProjectSchema::load_dir`] does not pick them up.
    ///
    /// # Errors
    ///
    /// [`SchemaError::Io`] when a file cannot be written or removed.
    pub fn save_dir(&self, dir: &Path) -> Result<(), SchemaError> {
        std::fs::create_dir_all(dir).map_err(|e| SchemaError::io_error(dir, e))?;
        let pages = self.page_numbers();
        for &page in &pages {
            let path = page_file(dir, page);
            let json = serde_json::to_string_pretty(&self.page_records(page))
                .map_err(|source| SchemaError::Json { path: path.clone(), source })?;
            write_page(dir, &path, json.as_bytes())?;
        }

        let last = pages.last().copied().unwrap_or(0);
        for page in (last + 1).. {
            let path = page_file(dir, page);
            if !path.is_file() {
                break;
            }
            std::fs::remove_file(&path).map_err(|e| SchemaError::io_error(&path, e))?;
            debug!(path = %path.display(), "stale page file removed");
        }
        info!(dir = %dir.display(), pages = self.page_count(), "schema saved");
        Ok(())
    }
}

fn write_page(dir: &Path, path: &Path, bytes: &[u8]) -> Result<(), SchemaError> {
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| SchemaError::io_error(dir, e))?;
    tmp.write_all(bytes).map_err(|e| SchemaError::io_error(tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| SchemaError::io_error(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| SchemaError::io_error(path, e.error))?;
    Ok(())
}
