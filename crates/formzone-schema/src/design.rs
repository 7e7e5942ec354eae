//! Design-mode strategy
//!
//! The only mode allowed to change field structure. Multi-step operations
//! (group conversion, radio grids) run against a copy of the schema and
//! replace it only when every step succeeded.

use crate::error::SchemaError;
use crate::field::{Field, FieldId, FieldKind};
use crate::grid::RadioGrid;
use crate::mode::{kind_colour, Mode, ModeStrategy, RenderIntent, RenderStyle};
use crate::schema::{ProjectSchema, SchemaChange};
use crate::zone::Zone;
use std::collections::HashSet;
use tracing::info;

/// Where a group candidate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateSource {
    /// Rectangle found by the detection collaborator, not yet a field
    Detected,
    /// Existing field (a loose field, or a button of an enclosed group)
    Field(FieldId),
}

/// Rectangle that may become a button of a drawn group
#[derive(Debug, Clone, PartialEq)]
pub struct GroupCandidate {
    /// Origin of the rectangle
    pub source: CandidateSource,
    /// Fiducial-relative zone
    pub zone: Zone,
    /// Name offered to the user
    pub suggested_name: String,
}

/// Submitted conversion of a drawn rectangle into a radio group
#[derive(Debug, Clone)]
pub struct GroupRequest {
    /// Group name
    pub name: String,
    /// [`FieldKind::RadioGroup`] or [`FieldKind::NumericRadioGroup`]
    pub kind: FieldKind,
    /// Drawn group rectangle
    pub zone: Zone,
    /// Chosen candidates with the name each button gets
    pub children: Vec<(GroupCandidate, String)>,
}

impl GroupRequest {
    /// Create request for a plain radio group
    #[must_use]
    pub fn new(name: impl Into<String>, zone: Zone) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::RadioGroup,
            zone,
            children: Vec::new(),
        }
    }

    /// Use a different group kind
    #[inline]
    #[must_use]
    pub fn with_kind(mut self, kind: FieldKind) -> Self {
        self.kind = kind;
        self
    }

    /// Add a child
    #[must_use]
    pub fn with_child(mut self, candidate: GroupCandidate, name: impl Into<String>) -> Self {
        self.children.push((candidate, name.into()));
        self
    }
}

/// Structural edits over a [`ProjectSchema`]
#[derive(Debug, Clone, Copy, Default)]
pub struct DesignStrategy;

impl DesignStrategy {
    /// Add a top-level field
    ///
    /// # Errors
    ///
    /// See [`ProjectSchema::define_field`].
    pub fn add_field(
        &self,
        schema: &mut ProjectSchema,
        page: u32,
        name: &str,
        kind: FieldKind,
        zone: Zone,
    ) -> Result<Vec<SchemaChange>, SchemaError> {
        let id = schema.define_field(page, name, kind, zone, None)?;
        Ok(vec![SchemaChange::Added {
            id,
            page,
            name: name.to_string(),
        }])
    }

    /// Add a button under a group
    ///
    /// # Errors
    ///
    /// [`SchemaError`] when `group` is not a group or the name is taken
    /// among its buttons.
    pub fn add_radio_button(
        &self,
        schema: &mut ProjectSchema,
        group: FieldId,
        name: &str,
        zone: Zone,
    ) -> Result<Vec<SchemaChange>, SchemaError> {
        let page = schema.get(group)?.page();
        let id = schema.define_field(page, name, FieldKind::RadioButton, zone, Some(group))?;
        Ok(vec![SchemaChange::Added {
            id,
            page,
            name: name.to_string(),
        }])
    }

    /// Remove a button from its group
    ///
    /// # Errors
    ///
    /// [`SchemaError::InvalidParent`] when the field is not a grouped button.
    pub fn remove_radio_button(
        &self,
        schema: &mut ProjectSchema,
        button: FieldId,
    ) -> Result<Vec<SchemaChange>, SchemaError> {
        let field = schema.get(button)?;
        if field.parent().is_none() {
            return Err(SchemaError::invalid_parent(
                field.name(),
                "field is not a button of a group",
            ));
        }
        schema.remove(button)
    }

    /// Rename a field
    ///
    /// # Errors
    ///
    /// [`SchemaError`] for an empty, reserved or taken name.
    pub fn rename(
        &self,
        schema: &mut ProjectSchema,
        id: FieldId,
        name: &str,
    ) -> Result<Vec<SchemaChange>, SchemaError> {
        Ok(vec![schema.rename(id, name)?])
    }

    /// Change a field's kind
    ///
    /// # Errors
    ///
    /// [`SchemaError::IncompatibleRetype`] when the new kind would break the
    /// group structure around the field.
    pub fn retype(
        &self,
        schema: &mut ProjectSchema,
        id: FieldId,
        kind: FieldKind,
    ) -> Result<Vec<SchemaChange>, SchemaError> {
        Ok(vec![schema.retype(id, kind)?])
    }

    /// Move or resize a field's zone
    ///
    /// # Errors
    ///
    /// [`SchemaError::UnknownField`] for an unknown id.
    pub fn resize(
        &self,
        schema: &mut ProjectSchema,
        id: FieldId,
        zone: Zone,
    ) -> Result<Vec<SchemaChange>, SchemaError> {
        Ok(vec![schema.set_zone(id, zone)?])
    }

    /// Delete a field
    ///
    /// Deleting a group removes only the group; its buttons stay on the page
    /// as free rectangles with unchanged zones.
    ///
    /// # Errors
    ///
    /// [`SchemaError::UnknownField`] for an unknown id.
    pub fn delete(
        &self,
        schema: &mut ProjectSchema,
        id: FieldId,
    ) -> Result<Vec<SchemaChange>, SchemaError> {
        schema.remove(id)
    }

    /// Rectangles inside a drawn group rectangle that can become its buttons
    ///
    /// Detected rectangles come first, named `Option N`; existing fields
    /// follow under their own names. An enclosed group contributes its
    /// buttons rather than itself.
    #[must_use]
    pub fn group_candidates(
        &self,
        schema: &ProjectSchema,
        page: u32,
        group_zone: Zone,
        detected: &[Zone],
    ) -> Vec<GroupCandidate> {
        let enclosed: Vec<&Field> = schema
            .page_fields(page)
            .into_iter()
            .filter(|f| group_zone.contains(&f.zone()))
            .collect();
        let taken: HashSet<Zone> = enclosed.iter().map(|f| f.zone()).collect();

        let mut candidates: Vec<GroupCandidate> = detected
            .iter()
            .filter(|z| group_zone.contains(z) && !taken.contains(z))
            .enumerate()
            .map(|(i, zone)| GroupCandidate {
                source: CandidateSource::Detected,
                zone: *zone,
                suggested_name: format!("Option {}", i + 1),
            })
            .collect();

        for field in enclosed {
            let members = if field.kind().is_group() {
                schema.children(field.id())
            } else {
                vec![field]
            };
            candidates.extend(members.into_iter().map(|f| GroupCandidate {
                source: CandidateSource::Field(f.id()),
                zone: f.zone(),
                suggested_name: f.name().to_string(),
            }));
        }
        candidates
    }

    /// Turn a drawn rectangle and chosen candidates into one radio group
    ///
    /// Converted fields are removed, enclosed groups are dissolved, and the
    /// new group is appended to the page.
    ///
    /// # Errors
    ///
    /// [`SchemaError::NoChildren`] for an empty selection,
    /// [`SchemaError::NotEnclosed`] for a candidate outside the rectangle,
    /// [`SchemaError::DuplicateName`] for repeated button names, or any
    /// definition error for the new group. The schema is unchanged on error.
    pub fn convert_to_group(
        &self,
        schema: &mut ProjectSchema,
        page: u32,
        request: &GroupRequest,
    ) -> Result<Vec<SchemaChange>, SchemaError> {
        if request.children.is_empty() {
            return Err(SchemaError::NoChildren);
        }
        if !request.kind.is_group() {
            return Err(SchemaError::invalid_parent(
                request.name.clone(),
                "a drawn group must be a radio group kind",
            ));
        }
        let mut names = HashSet::new();
        for (candidate, name) in &request.children {
            let name = name.trim();
            if name.is_empty() {
                return Err(SchemaError::EmptyName);
            }
            if !names.insert(name) {
                return Err(SchemaError::DuplicateName(name.to_string()));
            }
            if !request.zone.contains(&candidate.zone) {
                return Err(SchemaError::NotEnclosed(name.to_string()));
            }
        }

        let mut draft = schema.clone();
        let mut changes = Vec::new();

        let mut dissolved = Vec::new();
        for (candidate, _) in &request.children {
            if let CandidateSource::Field(id) = candidate.source {
                let field = draft.get(id)?;
                if field.page() != page {
                    return Err(SchemaError::PageMismatch {
                        field: field.name().to_string(),
                        expected: page,
                        actual: field.page(),
                    });
                }
                if let Some(group) = field.parent() {
                    if !dissolved.contains(&group) {
                        dissolved.push(group);
                    }
                }
            }
        }
        for group in dissolved {
            changes.extend(draft.remove(group)?);
        }
        for (candidate, _) in &request.children {
            if let CandidateSource::Field(id) = candidate.source {
                changes.extend(draft.remove(id)?);
            }
        }

        let group = draft.define_field(page, request.name.trim(), request.kind, request.zone, None)?;
        changes.push(SchemaChange::Added {
            id: group,
            page,
            name: request.name.trim().to_string(),
        });
        for (candidate, name) in &request.children {
            let id = draft.define_field(
                page,
                name.trim(),
                FieldKind::RadioButton,
                candidate.zone,
                Some(group),
            )?;
            changes.push(SchemaChange::Added {
                id,
                page,
                name: name.trim().to_string(),
            });
        }

        *schema = draft;
        info!(
            page,
            group = %request.name,
            buttons = request.children.len(),
            "drawn rectangle converted to radio group"
        );
        Ok(changes)
    }

    /// Create every group a radio grid describes
    ///
    /// # Errors
    ///
    /// [`SchemaError::Grid`] when the grid is rejected, or a definition error
    /// such as a question name already used. The schema is unchanged on
    /// error.
    pub fn apply_grid(
        &self,
        schema: &mut ProjectSchema,
        page: u32,
        grid: &RadioGrid,
        kind: FieldKind,
    ) -> Result<Vec<SchemaChange>, SchemaError> {
        let layouts = grid.layout()?;
        let mut draft = schema.clone();
        let mut changes = Vec::new();
        for layout in &layouts {
            let group = draft.define_field(page, layout.name.as_str(), kind, layout.zone, None)?;
            changes.push(SchemaChange::Added {
                id: group,
                page,
                name: layout.name.clone(),
            });
            for (answer, zone) in &layout.buttons {
                let id = draft.define_field(page, answer.as_str(), FieldKind::RadioButton, *zone, Some(group))?;
                changes.push(SchemaChange::Added {
                    id,
                    page,
                    name: answer.clone(),
                });
            }
        }
        *schema = draft;
        info!(page, groups = layouts.len(), "radio grid applied");
        Ok(changes)
    }
}

impl ModeStrategy for DesignStrategy {
    fn mode(&self) -> Mode {
        Mode::Design
    }

    fn render_intent(&self, field: &Field, _value: &str) -> RenderIntent {
        RenderIntent {
            colour: kind_colour(field.kind()),
            style: RenderStyle::Outline,
            label: Some(field.name().to_string()),
            flagged: false,
        }
    }
}
