//! Maps a face bounding box to a horizontal offset from the frame center.
//!
//! All positions are in pixels with the origin at the top-left corner of the
//! frame. A positive offset means the subject sits right of center.

use crate::utils::safe_cast::f64_to_u32_clamp;
use std::fmt;

/// Axis-aligned face bounding box as reported by a detector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    /// X coordinate of the top-left corner
    pub x: i32,
    /// Y coordinate of the top-left corner
    pub y: i32,
    /// Box width
    pub width: i32,
    /// Box height
    pub height: i32,
}

impl BoundingBox {
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Box center using floor halves of the dimensions, saturating at the `i32` range
    #[must_use]
    pub const fn center(&self) -> (i32, i32) {
        (
            self.x.saturating_add(self.width / 2),
            self.y.saturating_add(self.height / 2),
        )
    }
}

/// Frame dimensions, fixed for a tracking session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameGeometry {
    pub width: i32,
    pub height: i32,
}

impl FrameGeometry {
    #[must_use]
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Horizontal center, `width / 2` with floor division
    #[must_use]
    pub const fn center_x(&self) -> i32 {
        self.width / 2
    }

    #[must_use]
    pub const fn center(&self) -> (i32, i32) {
        (self.width / 2, self.height / 2)
    }
}

/// Pan direction of a correction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    /// Wire symbol for the direction
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Left => 'L',
            Self::Right => 'R',
        }
    }

    /// Parse a wire symbol
    #[must_use]
    pub const fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            'L' => Some(Self::Left),
            'R' => Some(Self::Right),
            _ => None,
        }
    }

    /// Direction that corrects a signed error; zero maps to `Right`
    #[must_use]
    pub fn from_sign(value: f64) -> Self {
        if value < 0.0 {
            Self::Left
        } else {
            Self::Right
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Decides whether and how far the pan mechanism needs to move
#[derive(Debug, Clone, Copy)]
pub struct PositionCalculator {
    geometry: FrameGeometry,
    dead_zone: i32,
}

impl PositionCalculator {
    #[must_use]
    pub const fn new(geometry: FrameGeometry, dead_zone: i32) -> Self {
        Self { geometry, dead_zone }
    }

    #[must_use]
    pub const fn geometry(&self) -> FrameGeometry {
        self.geometry
    }

    #[must_use]
    pub const fn dead_zone(&self) -> i32 {
        self.dead_zone
    }

    /// Horizontal offset of the box center from the frame center.
    ///
    /// The box is not clamped to the frame, so noisy detections can report
    /// offsets larger than half the frame width.
    #[must_use]
    pub const fn offset(&self, bbox: &BoundingBox) -> i32 {
        offset(bbox, &self.geometry)
    }

    /// True iff `|offset| > dead_zone`
    #[must_use]
    pub const fn needs_adjustment(&self, offset: i32) -> bool {
        needs_adjustment(offset, self.dead_zone)
    }

    #[must_use]
    pub const fn in_dead_zone(&self, offset: i32) -> bool {
        !self.needs_adjustment(offset)
    }

    #[must_use]
    pub const fn direction(&self, offset: i32) -> Direction {
        direction(offset)
    }

    /// `min(floor(|offset| * gain), max_steps)`
    #[must_use]
    pub fn steps(&self, offset: i32, gain: f64, max_steps: u32) -> u32 {
        steps(offset, gain, max_steps)
    }
}

/// Horizontal offset of the box center from the frame center
#[must_use]
pub const fn offset(bbox: &BoundingBox, geometry: &FrameGeometry) -> i32 {
    bbox.center().0.saturating_sub(geometry.center_x())
}

/// True iff the offset lies strictly outside the dead zone
#[must_use]
pub const fn needs_adjustment(offset: i32, dead_zone: i32) -> bool {
    offset.unsigned_abs() > dead_zone.unsigned_abs()
}

/// `Left` for negative offsets, `Right` otherwise (zero included)
#[must_use]
pub const fn direction(offset: i32) -> Direction {
    if offset < 0 {
        Direction::Left
    } else {
        Direction::Right
    }
}

/// `min(floor(|offset| * gain), max_steps)`
#[must_use]
pub fn steps(offset: i32, gain: f64, max_steps: u32) -> u32 {
    f64_to_u32_clamp(f64::from(offset.unsigned_abs()) * gain, max_steps)
}
