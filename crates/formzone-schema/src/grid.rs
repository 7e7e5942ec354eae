//! Radio grid layout
//!
//! A design-time shortcut for creating many radio groups with shared answer
//! names at once. The grid is not persisted; it only produces ordinary
//! groups.

use crate::error::GridError;
use crate::zone::Zone;
use std::collections::HashSet;

/// Smallest grid rectangle accepted, in pixels per side
pub const MIN_GRID_SIZE: i32 = 20;

/// Which axis holds the questions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GridOrientation {
    /// Rows are questions, columns are answers
    #[default]
    Horizontal,
    /// Columns are questions, rows are answers
    Vertical,
}

impl GridOrientation {
    fn label(self) -> &'static str {
        match self {
            GridOrientation::Horizontal => "Horizontal",
            GridOrientation::Vertical => "Vertical",
        }
    }
}

/// One radio group produced by a grid
#[derive(Debug, Clone, PartialEq)]
pub struct GroupLayout {
    /// Question label, becomes the group name
    pub name: String,
    /// Union of the question's cells
    pub zone: Zone,
    /// Answer label and cell per button
    pub buttons: Vec<(String, Zone)>,
}

/// Grid of labelled cells over a drawn rectangle
#[derive(Debug, Clone, Default)]
pub struct RadioGrid {
    orientation: GridOrientation,
    zone: Option<Zone>,
    rows: Vec<String>,
    columns: Vec<String>,
    row_splits: Option<Vec<f64>>,
    column_splits: Option<Vec<f64>>,
}

impl RadioGrid {
    /// Create empty grid
    #[inline]
    #[must_use]
    pub fn new(orientation: GridOrientation) -> Self {
        Self {
            orientation,
            ..Self::default()
        }
    }

    /// Set the drawn grid rectangle
    #[inline]
    #[must_use]
    pub fn with_zone(mut self, zone: Zone) -> Self {
        self.zone = Some(zone);
        self
    }

    /// Set row labels
    #[must_use]
    pub fn with_rows<I, S>(mut self, rows: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows = rows.into_iter().map(|s| s.into().trim().to_string()).collect();
        self
    }

    /// Set column labels
    #[must_use]
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns
            .into_iter()
            .map(|s| s.into().trim().to_string())
            .collect();
        self
    }

    /// Interior row boundaries as fractions of the grid height
    #[inline]
    #[must_use]
    pub fn with_row_splits(mut self, splits: Vec<f64>) -> Self {
        self.row_splits = Some(splits);
        self
    }

    /// Interior column boundaries as fractions of the grid width
    #[inline]
    #[must_use]
    pub fn with_column_splits(mut self, splits: Vec<f64>) -> Self {
        self.column_splits = Some(splits);
        self
    }

    /// Grid orientation
    #[inline]
    #[must_use]
    pub fn orientation(&self) -> GridOrientation {
        self.orientation
    }

    /// Check labels, shape and rectangle
    ///
    /// # Errors
    ///
    /// [`GridError`] naming the first problem found.
    pub fn validate(&self) -> Result<Zone, GridError> {
        let orientation = self.orientation.label();
        let (min_rows, min_columns) = match self.orientation {
            GridOrientation::Horizontal => (1, 2),
            GridOrientation::Vertical => (2, 1),
        };
        if self.rows.len() < min_rows {
            return Err(GridError::NotEnoughRows {
                orientation,
                required: min_rows,
                actual: self.rows.len(),
            });
        }
        if self.columns.len() < min_columns {
            return Err(GridError::NotEnoughColumns {
                orientation,
                required: min_columns,
                actual: self.columns.len(),
            });
        }
        check_labels("row", &self.rows)?;
        check_labels("column", &self.columns)?;

        let zone = self.zone.ok_or(GridError::MissingZone)?;
        if zone.width < MIN_GRID_SIZE || zone.height < MIN_GRID_SIZE {
            return Err(GridError::TooSmall);
        }
        Ok(zone)
    }

    /// Compute the groups this grid produces
    ///
    /// # Errors
    ///
    /// [`GridError`] when the grid fails [`validate`](Self::validate) or its
    /// split fractions are malformed.
    pub fn layout(&self) -> Result<Vec<GroupLayout>, GridError> {
        let zone = self.validate()?;
        let ys = boundaries("row", self.row_splits.as_deref(), self.rows.len(), zone.y, zone.height)?;
        let xs = boundaries(
            "column",
            self.column_splits.as_deref(),
            self.columns.len(),
            zone.x,
            zone.width,
        )?;
        let cell = |row: usize, column: usize| {
            Zone::new(
                xs[column],
                ys[row],
                xs[column + 1] - xs[column],
                ys[row + 1] - ys[row],
            )
        };

        let groups = match self.orientation {
            GridOrientation::Horizontal => self
                .rows
                .iter()
                .enumerate()
                .map(|(i, question)| {
                    let buttons: Vec<_> = self
                        .columns
                        .iter()
                        .enumerate()
                        .map(|(j, answer)| (answer.clone(), cell(i, j)))
                        .collect();
                    group(question, buttons)
                })
                .collect(),
            GridOrientation::Vertical => self
                .columns
                .iter()
                .enumerate()
                .map(|(j, question)| {
                    let buttons: Vec<_> = self
                        .rows
                        .iter()
                        .enumerate()
                        .map(|(i, answer)| (answer.clone(), cell(i, j)))
                        .collect();
                    group(question, buttons)
                })
                .collect(),
        };
        Ok(groups)
    }
}

fn group(name: &str, buttons: Vec<(String, Zone)>) -> GroupLayout {
    let zone = buttons
        .iter()
        .map(|(_, z)| *z)
        .reduce(|a, b| a.union(&b))
        .unwrap_or_default();
    GroupLayout {
        name: name.to_string(),
        zone,
        buttons,
    }
}

fn check_labels(axis: &'static str, labels: &[String]) -> Result<(), GridError> {
    let mut seen = HashSet::new();
    for label in labels {
        if !seen.insert(label.as_str()) {
            return Err(GridError::DuplicateLabel {
                axis,
                label: label.clone(),
            });
        }
    }
    if labels.iter().any(String::is_empty) {
        return Err(GridError::EmptyLabel(axis));
    }
    Ok(())
}

/// Pixel boundaries `[start, .., start + extent]`, one more than `cells`
fn boundaries(
    axis: &'static str,
    splits: Option<&[f64]>,
    cells: usize,
    start: i32,
    extent: i32,
) -> Result<Vec<i32>, GridError> {
    #[allow(clippy::cast_precision_loss)]
    let fractions: Vec<f64> = match splits {
        Some(splits) => {
            let ordered = splits.windows(2).all(|w| w[0] < w[1]);
            let inside = splits.iter().all(|f| *f > 0.0 && *f < 1.0);
            if splits.len() + 1 != cells || !ordered || !inside {
                return Err(GridError::BadFractions(axis));
            }
            splits.to_vec()
        }
        None => (1..cells).map(|i| i as f64 / cells as f64).collect(),
    };

    let mut out = Vec::with_capacity(cells + 1);
    out.push(start);
    for f in fractions {
        #[allow(clippy::cast_possible_truncation)]
        out.push(start + (f * f64::from(extent)) as i32);
    }
    out.push(start + extent);
    Ok(out)
}
