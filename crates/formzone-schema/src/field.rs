//! Field identity and kinds

use crate::error::SchemaError;
use crate::zone::Zone;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stable handle to a field inside a [`ProjectSchema`](crate::ProjectSchema)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId(u32);

impl FieldId {
    pub(crate) const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw numeric value
    #[inline]
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The finite set of field kinds every mode works against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    /// Single box, ticked or not
    #[serde(rename = "Tickbox", alias = "TickBox")]
    TickBox,
    /// Free text
    TextField,
    /// Whole number text
    #[serde(alias = "IngerField")]
    IntegerField,
    /// Decimal number text
    DecimalField,
    /// Exclusive choice among child buttons
    RadioGroup,
    /// Child of a group, or a free rectangle awaiting designation
    RadioButton,
    /// Radio group whose button names are numbers
    NumericRadioGroup,
}

impl FieldKind {
    /// All kinds in declaration order
    pub const ALL: [FieldKind; 7] = [
        FieldKind::TickBox,
        FieldKind::TextField,
        FieldKind::IntegerField,
        FieldKind::DecimalField,
        FieldKind::RadioGroup,
        FieldKind::RadioButton,
        FieldKind::NumericRadioGroup,
    ];

    /// Owns radio button children
    #[inline]
    #[must_use]
    pub const fn is_group(self) -> bool {
        matches!(self, FieldKind::RadioGroup | FieldKind::NumericRadioGroup)
    }

    /// Contributes a value column when top-level
    #[inline]
    #[must_use]
    pub const fn is_column(self) -> bool {
        !matches!(self, FieldKind::RadioButton)
    }

    /// Takes numeric text
    #[inline]
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, FieldKind::IntegerField | FieldKind::DecimalField)
    }

    /// Takes typed text rather than a click
    #[inline]
    #[must_use]
    pub const fn is_text(self) -> bool {
        matches!(
            self,
            FieldKind::TextField | FieldKind::IntegerField | FieldKind::DecimalField
        )
    }

    /// Name used in page files
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            FieldKind::TickBox => "Tickbox",
            FieldKind::TextField => "TextField",
            FieldKind::IntegerField => "IntegerField",
            FieldKind::DecimalField => "DecimalField",
            FieldKind::RadioGroup => "RadioGroup",
            FieldKind::RadioButton => "RadioButton",
            FieldKind::NumericRadioGroup => "NumericRadioGroup",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKind {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TickBox" => Ok(FieldKind::TickBox),
            "IngerField" => Ok(FieldKind::IntegerField),
            other => FieldKind::ALL
                .into_iter()
                .find(|kind| kind.as_str() == other)
                .ok_or_else(|| SchemaError::UnknownKind(other.to_string())),
        }
    }
}

/// A field committed to a project schema
///
/// Fields are read-only outside this crate; structure changes go through
/// [`DesignStrategy`](crate::DesignStrategy).
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub(crate) id: FieldId,
    pub(crate) name: String,
    pub(crate) kind: FieldKind,
    pub(crate) zone: Zone,
    pub(crate) page: u32,
    pub(crate) parent: Option<FieldId>,
    pub(crate) children: Vec<FieldId>,
}

impl Field {
    /// Schema handle
    #[inline]
    #[must_use]
    pub fn id(&self) -> FieldId {
        self.id
    }

    /// Field name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Fiducial-relative zone
    #[inline]
    #[must_use]
    pub fn zone(&self) -> Zone {
        self.zone
    }

    /// 1-based page number
    #[inline]
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Owning group, for radio buttons placed in one
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<FieldId> {
        self.parent
    }

    /// Ordered child buttons (groups only)
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[FieldId] {
        &self.children
    }

    /// True for a top-level field that owns a record column
    #[inline]
    #[must_use]
    pub fn is_column(&self) -> bool {
        self.parent.is_none() && self.kind.is_column()
    }

    /// True for a radio button with no group
    #[inline]
    #[must_use]
    pub fn is_free_button(&self) -> bool {
        self.parent.is_none() && self.kind == FieldKind::RadioButton
    }
}
