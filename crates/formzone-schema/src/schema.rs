//! Project schema: per-page ordered fields and canonical column order
//!
//! Fields live in one arena keyed by [`FieldId`]. Pages hold ordered lists of
//! top-level ids; a group holds the ordered ids of its buttons and each button
//! keeps a non-owning back-reference to its group.

use crate::error::SchemaError;
use crate::field::{Field, FieldId, FieldKind};
use crate::zone::Zone;
use indexmap::IndexMap;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Record column holding the document key
pub const DOCUMENT_KEY_COLUMN: &str = "tiff_path";

/// Record column holding the serialized comment ledger
pub const COMMENTS_COLUMN: &str = "Comments";

/// Description of one structural change, for display refresh
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaChange {
    /// Field committed to the schema
    Added { id: FieldId, page: u32, name: String },
    /// Field removed from the schema
    Removed { id: FieldId, page: u32, name: String },
    /// Field renamed
    Renamed { id: FieldId, from: String, to: String },
    /// Field kind changed
    Retyped {
        id: FieldId,
        from: FieldKind,
        to: FieldKind,
    },
    /// Zone moved or resized
    Resized { id: FieldId, zone: Zone },
    /// Button released from a deleted group
    Orphaned { id: FieldId, group: String },
}

impl SchemaChange {
    /// Field the change applies to
    #[must_use]
    pub fn field(&self) -> FieldId {
        match self {
            SchemaChange::Added { id, .. }
            | SchemaChange::Removed { id, .. }
            | SchemaChange::Renamed { id, .. }
            | SchemaChange::Retyped { id, .. }
            | SchemaChange::Resized { id, .. }
            | SchemaChange::Orphaned { id, .. } => *id,
        }
    }

    /// Ids of every field added in a change list, in order
    #[must_use]
    pub fn added(changes: &[SchemaChange]) -> Vec<FieldId> {
        changes
            .iter()
            .filter_map(|change| match change {
                SchemaChange::Added { id, .. } => Some(*id),
                _ => None,
            })
            .collect()
    }
}

/// Ordered page → fields mapping for one project
///
/// Explicitly constructed at project open and passed by reference; there is
/// no global schema.
#[derive(Debug, Clone, Default)]
pub struct ProjectSchema {
    fields: IndexMap<FieldId, Field>,
    pages: BTreeMap<u32, Vec<FieldId>>,
    next_id: u32,
}

impl ProjectSchema {
    /// Create empty schema
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            fields: IndexMap::new(),
            pages: BTreeMap::new(),
            next_id: 0,
        }
    }

    /// Commit a new field
    ///
    /// Column names are unique across the project. Buttons placed in a group
    /// only need a name unique among their siblings, which lets several groups
    /// share answers such as "Yes" and "No".
    ///
    /// # Errors
    ///
    /// [`SchemaError`] for a duplicate, empty or reserved name, page 0, or a
    /// parent that is missing, not a group, or given for a non-button.
    pub fn define_field(
        &mut self,
        page: u32,
        name: impl Into<String>,
        kind: FieldKind,
        zone: Zone,
        parent: Option<FieldId>,
    ) -> Result<FieldId, SchemaError> {
        let name = name.into();
        check_name(&name)?;
        if page == 0 {
            return Err(SchemaError::InvalidPage(page));
        }

        match parent {
            Some(parent_id) => {
                if kind != FieldKind::RadioButton {
                    return Err(SchemaError::invalid_parent(
                        name,
                        "only radio buttons can be placed in a group",
                    ));
                }
                let group = self.get(parent_id)?;
                if !group.kind.is_group() {
                    return Err(SchemaError::invalid_parent(name, "parent is not a radio group"));
                }
                if group.page != page {
                    return Err(SchemaError::PageMismatch {
                        field: name,
                        expected: group.page,
                        actual: page,
                    });
                }
                if self.child_named(parent_id, &name).is_some() {
                    return Err(SchemaError::DuplicateName(name));
                }
            }
            None => {
                if kind.is_column() && self.find(&name).is_some() {
                    return Err(SchemaError::DuplicateName(name));
                }
            }
        }

        let id = FieldId::new(self.next_id);
        self.next_id += 1;
        debug!(%id, page, name = %name, %kind, "field defined");
        self.fields.insert(
            id,
            Field {
                id,
                name,
                kind,
                zone,
                page,
                parent,
                children: Vec::new(),
            },
        );
        match parent.and_then(|p| self.fields.get_mut(&p)) {
            Some(group) => group.children.push(id),
            None => self.pages.entry(page).or_default().push(id),
        }
        Ok(id)
    }

    /// Make sure a page exists even when it has no fields yet
    ///
    /// # Errors
    ///
    /// [`SchemaError::InvalidPage`] for page 0.
    pub fn ensure_page(&mut self, page: u32) -> Result<(), SchemaError> {
        if page == 0 {
            return Err(SchemaError::InvalidPage(page));
        }
        self.pages.entry(page).or_default();
        Ok(())
    }

    /// Field by id
    #[inline]
    #[must_use]
    pub fn field(&self, id: FieldId) -> Option<&Field> {
        self.fields.get(&id)
    }

    /// Field by id, as a result
    ///
    /// # Errors
    ///
    /// [`SchemaError::UnknownField`] when the id is not in this schema.
    pub fn get(&self, id: FieldId) -> Result<&Field, SchemaError> {
        self.fields
            .get(&id)
            .ok_or_else(|| SchemaError::UnknownField(id.to_string()))
    }

    /// Column field by name
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Field> {
        self.columns().into_iter().find(|f| f.name == name)
    }

    /// Any top-level field on a page by name, including free buttons
    #[must_use]
    pub fn find_on_page(&self, page: u32, name: &str) -> Option<&Field> {
        self.page_fields(page).into_iter().find(|f| f.name == name)
    }

    /// Child button of a group by name
    #[must_use]
    pub fn child_named(&self, group: FieldId, name: &str) -> Option<&Field> {
        self.children(group).into_iter().find(|f| f.name == name)
    }

    /// Ordered children of a group (empty for other kinds)
    #[must_use]
    pub fn children(&self, group: FieldId) -> Vec<&Field> {
        self.fields
            .get(&group)
            .map(|g| g.children.iter().filter_map(|c| self.fields.get(c)).collect())
            .unwrap_or_default()
    }

    /// Column that captures a value for this field
    ///
    /// A column maps to itself and a grouped button to its group. Free
    /// buttons have no column.
    #[must_use]
    pub fn owning_column(&self, id: FieldId) -> Option<&Field> {
        let field = self.fields.get(&id)?;
        match field.parent {
            Some(parent) => self.fields.get(&parent),
            None if field.kind.is_column() => Some(field),
            None => None,
        }
    }

    /// Ordered top-level fields of a page
    #[must_use]
    pub fn page_fields(&self, page: u32) -> Vec<&Field> {
        self.pages
            .get(&page)
            .map(|ids| ids.iter().filter_map(|id| self.fields.get(id)).collect())
            .unwrap_or_default()
    }

    /// Pages in ascending order
    #[must_use]
    pub fn page_numbers(&self) -> Vec<u32> {
        self.pages.keys().copied().collect()
    }

    /// Number of pages
    #[inline]
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Every field, including children and free buttons
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.values()
    }

    /// Number of fields, including children
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if schema has no fields
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Column fields in canonical order: pages ascending, then page order
    #[must_use]
    pub fn columns(&self) -> Vec<&Field> {
        self.pages
            .values()
            .flatten()
            .filter_map(|id| self.fields.get(id))
            .filter(|f| f.is_column())
            .collect()
    }

    /// Canonical record header (without key and comment columns)
    ///
    /// Stable across calls for an unchanged schema.
    #[must_use]
    pub fn resolve_column_order(&self) -> Vec<String> {
        self.columns().into_iter().map(|f| f.name.clone()).collect()
    }

    /// Column name → page, built once per record or batch
    #[must_use]
    pub fn field_to_page(&self) -> HashMap<String, u32> {
        self.columns()
            .into_iter()
            .map(|f| (f.name.clone(), f.page))
            .collect()
    }

    // Structural mutation below is crate-private; DesignStrategy is the
    // public surface.

    pub(crate) fn remove(&mut self, id: FieldId) -> Result<Vec<SchemaChange>, SchemaError> {
        let field = self.get(id)?.clone();
        let mut changes = Vec::new();

        if let Some(parent) = field.parent {
            if let Some(group) = self.fields.get_mut(&parent) {
                group.children.retain(|c| *c != id);
            }
        } else if let Some(ids) = self.pages.get_mut(&field.page) {
            let position = ids.iter().position(|c| *c == id).unwrap_or(ids.len());
            ids.retain(|c| *c != id);
            // Orphans take the group's place in page order
            let insert_at = position.min(ids.len());
            for (offset, child) in field.children.iter().enumerate() {
                ids.insert(insert_at + offset, *child);
            }
        }

        for child in &field.children {
            if let Some(button) = self.fields.get_mut(child) {
                button.parent = None;
                changes.push(SchemaChange::Orphaned {
                    id: *child,
                    group: field.name.clone(),
                });
            }
        }

        self.fields.shift_remove(&id);
        debug!(%id, name = %field.name, orphans = field.children.len(), "field removed");
        changes.insert(
            0,
            SchemaChange::Removed {
                id,
                page: field.page,
                name: field.name,
            },
        );
        Ok(changes)
    }

    pub(crate) fn rename(&mut self, id: FieldId, name: &str) -> Result<SchemaChange, SchemaError> {
        check_name(name)?;
        let field = self.get(id)?;
        if field.name == name {
            return Ok(SchemaChange::Renamed {
                id,
                from: field.name.clone(),
                to: name.to_string(),
            });
        }
        let taken = match field.parent {
            Some(parent) => self.child_named(parent, name).is_some(),
            None if field.kind.is_column() => self.find(name).is_some(),
            None => false,
        };
        if taken {
            return Err(SchemaError::DuplicateName(name.to_string()));
        }
        let field = self.field_mut(id)?;
        let from = std::mem::replace(&mut field.name, name.to_string());
        debug!(%id, %from, to = name, "field renamed");
        Ok(SchemaChange::Renamed {
            id,
            from,
            to: name.to_string(),
        })
    }

    pub(crate) fn retype(&mut self, id: FieldId, kind: FieldKind) -> Result<SchemaChange, SchemaError> {
        let field = self.get(id)?;
        let from = field.kind;
        let incompatible = SchemaError::IncompatibleRetype {
            field: field.name.clone(),
            from,
            to: kind,
        };
        if field.parent.is_some() && kind != FieldKind::RadioButton {
            return Err(incompatible);
        }
        if from.is_group() && !kind.is_group() && !field.children.is_empty() {
            return Err(incompatible);
        }
        if !from.is_column() && kind.is_column() && self.find(&field.name).is_some() {
            return Err(SchemaError::DuplicateName(field.name.clone()));
        }
        self.field_mut(id)?.kind = kind;
        debug!(%id, %from, to = %kind, "field retyped");
        Ok(SchemaChange::Retyped { id, from, to: kind })
    }

    pub(crate) fn set_zone(&mut self, id: FieldId, zone: Zone) -> Result<SchemaChange, SchemaError> {
        self.field_mut(id)?.zone = zone;
        Ok(SchemaChange::Resized { id, zone })
    }

    fn field_mut(&mut self, id: FieldId) -> Result<&mut Field, SchemaError> {
        self.fields
            .get_mut(&id)
            .ok_or_else(|| SchemaError::UnknownField(id.to_string()))
    }
}

fn check_name(name: &str) -> Result<(), SchemaError> {
    if name.trim().is_empty() {
        return Err(SchemaError::EmptyName);
    }
    if name == DOCUMENT_KEY_COLUMN || name == COMMENTS_COLUMN {
        return Err(SchemaError::ReservedName(name.to_string()));
    }
    Ok(())
}
