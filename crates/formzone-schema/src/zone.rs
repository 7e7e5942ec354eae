//! Fiducial-relative rectangles
//!
//! Every zone is stored as an offset from the page's fiducial anchor, so a
//! scan that is shifted or cropped still lines up once the anchor is found.

use serde::{Deserialize, Serialize};

/// Width/height used when a rectangle arrives without a size
pub const DEFAULT_ZONE_SIZE: i32 = 10;

/// Rectangle relative to a page fiducial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Zone {
    /// Horizontal offset from the fiducial
    pub x: i32,
    /// Vertical offset from the fiducial
    pub y: i32,
    /// Width in pixels
    pub width: i32,
    /// Height in pixels
    pub height: i32,
}

impl Zone {
    /// Create zone; non-positive sizes fall back to [`DEFAULT_ZONE_SIZE`]
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width: if width > 0 { width } else { DEFAULT_ZONE_SIZE },
            height: if height > 0 { height } else { DEFAULT_ZONE_SIZE },
        }
    }

    /// Normalized zone spanning two dragged corner points
    #[must_use]
    pub fn from_corners(a: (i32, i32), b: (i32, i32)) -> Self {
        let left = a.0.min(b.0);
        let top = a.1.min(b.1);
        Self::new(left, top, (a.0 - b.0).abs(), (a.1 - b.1).abs())
    }

    /// Exclusive right edge
    #[inline]
    #[must_use]
    pub const fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Exclusive bottom edge
    #[inline]
    #[must_use]
    pub const fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// True when `other` lies fully within this zone (edges may touch)
    #[must_use]
    pub const fn contains(&self, other: &Zone) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Smallest zone covering both
    #[must_use]
    pub fn union(&self, other: &Zone) -> Zone {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Zone::new(
            x,
            y,
            self.right().max(other.right()) - x,
            self.bottom().max(other.bottom()) - y,
        )
    }
}

/// Detected landmark used as the coordinate origin of a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Fiducial {
    /// Page-absolute x of the anchor
    pub x: i32,
    /// Page-absolute y of the anchor
    pub y: i32,
}

impl Fiducial {
    /// Create anchor at page position
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Page-absolute rectangle for a stored zone
    #[must_use]
    pub const fn to_page(&self, zone: &Zone) -> Zone {
        Zone {
            x: zone.x + self.x,
            y: zone.y + self.y,
            width: zone.width,
            height: zone.height,
        }
    }

    /// Fiducial-relative zone for a page-absolute rectangle
    #[must_use]
    pub const fn to_zone(&self, page_rect: &Zone) -> Zone {
        Zone {
            x: page_rect.x - self.x,
            y: page_rect.y - self.y,
            width: page_rect.width,
            height: page_rect.height,
        }
    }
}
