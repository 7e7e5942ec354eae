//! Mode strategy dispatch
//!
//! One field model, three modes. What a mode may do is a fixed capability
//! table; how it draws a field is a [`RenderIntent`] computed from the field
//! kind and the captured value. No per-mode field types exist.

use crate::field::{Field, FieldKind};
use crate::value::is_tick_token;

/// Working mode of the surface driving the core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Structural editing of the schema
    Design,
    /// Value capture per document
    Index,
    /// Review of captured values and comments
    Qc,
}

impl Mode {
    /// Capability set of this mode
    #[must_use]
    pub const fn capabilities(self) -> Capabilities {
        match self {
            Mode::Design => Capabilities {
                mutate_structure: true,
                interpret_value: false,
                render_intent: true,
                comment: false,
                escalate: false,
            },
            Mode::Index => Capabilities {
                mutate_structure: false,
                interpret_value: true,
                render_intent: true,
                comment: true,
                escalate: false,
            },
            Mode::Qc => Capabilities {
                mutate_structure: false,
                interpret_value: true,
                render_intent: true,
                comment: true,
                escalate: true,
            },
        }
    }
}

/// What a mode is allowed to do
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Add, remove, rename, retype or move fields
    pub mutate_structure: bool,
    /// Read and set captured values
    pub interpret_value: bool,
    /// Produce drawing instructions
    pub render_intent: bool,
    /// Attach, edit and remove comments
    pub comment: bool,
    /// Mark comments escalated and move records between datasets
    pub escalate: bool,
}

/// RGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// How a field's rectangle should be drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStyle {
    /// Empty outline
    Outline,
    /// Filled, for a ticked box or selected button
    Filled,
}

/// Drawing instructions handed to the rendering collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderIntent {
    /// Outline colour for the field kind
    pub colour: Rgb,
    /// Outline or filled
    pub style: RenderStyle,
    /// Text to draw beside the rectangle
    pub label: Option<String>,
    /// Field carries a comment
    pub flagged: bool,
}

/// Outline colour per field kind
#[must_use]
pub const fn kind_colour(kind: FieldKind) -> Rgb {
    match kind {
        FieldKind::TickBox => Rgb(150, 150, 100),
        FieldKind::RadioButton | FieldKind::RadioGroup => Rgb(100, 150, 0),
        FieldKind::TextField
        | FieldKind::IntegerField
        | FieldKind::DecimalField
        | FieldKind::NumericRadioGroup => Rgb(0, 150, 150),
    }
}

/// Render intent for a captured value, shared by index and QC modes
///
/// For a grouped button, `value` is the group's captured value; the button
/// is filled when that value names it.
#[must_use]
pub fn value_intent(field: &Field, value: &str) -> RenderIntent {
    let (style, label) = match field.kind() {
        FieldKind::TickBox if is_tick_token(value) => (RenderStyle::Filled, None),
        FieldKind::RadioButton if field.parent().is_some() && value == field.name() => {
            (RenderStyle::Filled, None)
        }
        kind if kind.is_text() && !value.is_empty() => (RenderStyle::Outline, Some(value.to_string())),
        _ => (RenderStyle::Outline, None),
    };
    RenderIntent {
        colour: kind_colour(field.kind()),
        style,
        label,
        flagged: false,
    }
}

/// Behaviour a mode applies to fields
pub trait ModeStrategy {
    /// Mode implemented
    fn mode(&self) -> Mode;

    /// Capability set, from the fixed table
    fn capabilities(&self) -> Capabilities {
        self.mode().capabilities()
    }

    /// Drawing instructions for a field and its captured value
    fn render_intent(&self, field: &Field, value: &str) -> RenderIntent;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ProjectSchema;
    use crate::zone::Zone;

    #[test]
    fn only_design_mutates_structure() {
        assert!(Mode::Design.capabilities().mutate_structure);
        assert!(!Mode::Index.capabilities().mutate_structure);
        assert!(!Mode::Qc.capabilities().mutate_structure);
    }

    #[test]
    fn qc_is_superset_of_index() {
        let index = Mode::Index.capabilities();
        let qc = Mode::Qc.capabilities();
        assert!(qc.interpret_value && qc.comment && qc.render_intent);
        assert!(index.interpret_value && index.comment);
        assert!(qc.escalate && !index.escalate);
    }

    #[test]
    fn value_intent_fills_ticked_and_selected() {
        let mut schema = ProjectSchema::new();
        let tick = schema.define_field(1, "t", FieldKind::TickBox, Zone::new(0, 0, 5, 5), None).unwrap();
        let group = schema.define_field(1, "g", FieldKind::RadioGroup, Zone::new(0, 0, 50, 5), None).unwrap();
        let yes = schema.define_field(1, "Yes", FieldKind::RadioButton, Zone::new(0, 0, 5, 5), Some(group)).unwrap();
        let text = schema.define_field(1, "name", FieldKind::TextField, Zone::new(0, 0, 50, 5), None).unwrap();

        assert_eq!(value_intent(schema.field(tick).unwrap(), "Ticked").style, RenderStyle::Filled);
        assert_eq!(value_intent(schema.field(tick).unwrap(), "").style, RenderStyle::Outline);
        assert_eq!(value_intent(schema.field(yes).unwrap(), "Yes").style, RenderStyle::Filled);
        assert_eq!(value_intent(schema.field(yes).unwrap(), "No").style, RenderStyle::Outline);
        let intent = value_intent(schema.field(text).unwrap(), "Ann");
        assert_eq!(intent.label.as_deref(), Some("Ann"));
        assert_eq!(intent.colour, Rgb(0, 150, 150));
    }
}
