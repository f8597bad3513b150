//! Types, aliases and helper operations for doing math with `ultraviolet`.
//!
//! All positions are in pixels with the `y` axis pointing down, so "up" is negative `y`.

use std::f64::consts::PI;
pub use ultraviolet as uv;

pub type Vec2 = uv::DVec2;

/// An angle in either degrees or radians.
/// Default conversion from f64 is in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde-types", derive(serde::Deserialize, serde::Serialize))]
pub enum Angle {
    Rad(f64),
    Deg(f64),
}
impl Angle {
    /// Get the angle as degrees.
    #[inline]
    pub fn deg(&self) -> f64 {
        match self {
            Angle::Rad(rad) => rad * 180.0 / PI,
            Angle::Deg(deg) => *deg,
        }
    }

    /// Get the angle as radians.
    #[inline]
    pub fn rad(&self) -> f64 {
        match self {
            Angle::Rad(rad) => *rad,
            Angle::Deg(deg) => deg * PI / 180.0,
        }
    }

    /// Unit vector pointing in this direction.
    ///
    /// Angles grow clockwise on screen because `y` points down.
    #[inline]
    pub fn unit_vec(&self) -> Vec2 {
        let rad = self.rad();
        Vec2::new(rad.cos(), rad.sin())
    }
}
impl Default for Angle {
    fn default() -> Self {
        Angle::Rad(0.0)
    }
}
impl From<f64> for Angle {
    fn from(deg: f64) -> Self {
        Angle::Deg(deg)
    }
}

/// One of the two coordinate axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-types", derive(serde::Deserialize, serde::Serialize))]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    #[inline]
    pub fn other(self) -> Self {
        match self {
            Axis::Horizontal => Axis::Vertical,
            Axis::Vertical => Axis::Horizontal,
        }
    }

    /// Get the component of a vector along this axis.
    #[inline]
    pub fn of(self, v: Vec2) -> f64 {
        match self {
            Axis::Horizontal => v.x,
            Axis::Vertical => v.y,
        }
    }

    #[inline]
    pub fn of_mut(self, v: &mut Vec2) -> &mut f64 {
        match self {
            Axis::Horizontal => &mut v.x,
            Axis::Vertical => &mut v.y,
        }
    }
}

/// A cardinal direction.
///
/// For portals this is the direction bodies travel when they come out of it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-types", derive(serde::Deserialize, serde::Serialize))]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    /// The axis this direction points along.
    #[inline]
    pub fn axis(self) -> Axis {
        match self {
            Direction::North | Direction::South => Axis::Vertical,
            Direction::East | Direction::West => Axis::Horizontal,
        }
    }

    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
        }
    }

    /// Unit vector pointing in this direction.
    #[inline]
    pub fn unit_vec(self) -> Vec2 {
        match self {
            Direction::North => Vec2::new(0.0, -1.0),
            Direction::South => Vec2::new(0.0, 1.0),
            Direction::East => Vec2::new(1.0, 0.0),
            Direction::West => Vec2::new(-1.0, 0.0),
        }
    }
}

/// An axis-aligned rectangle in screen space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde-types", derive(serde::Deserialize, serde::Serialize))]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[inline]
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    #[inline]
    pub fn set_right(&mut self, right: f64) {
        self.left = right - self.width;
    }

    #[inline]
    pub fn set_bottom(&mut self, bottom: f64) {
        self.top = bottom - self.height;
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    /// The lower edge coordinate along an axis (left or top).
    #[inline]
    pub fn start(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => self.left,
            Axis::Vertical => self.top,
        }
    }

    /// The higher edge coordinate along an axis (right or bottom).
    #[inline]
    pub fn end(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => self.right(),
            Axis::Vertical => self.bottom(),
        }
    }

    #[inline]
    pub fn extent(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => self.width,
            Axis::Vertical => self.height,
        }
    }

    /// Move the rect along an axis.
    #[inline]
    pub fn shift(&mut self, axis: Axis, amount: f64) {
        match axis {
            Axis::Horizontal => self.left += amount,
            Axis::Vertical => self.top += amount,
        }
    }

    #[inline]
    pub fn shifted(mut self, axis: Axis, amount: f64) -> Self {
        self.shift(axis, amount);
        self
    }

    #[inline]
    pub fn translated(self, v: Vec2) -> Self {
        Self {
            left: self.left + v.x,
            top: self.top + v.y,
            ..self
        }
    }

    /// Check whether two rects have overlapping interiors.
    /// Rects that merely touch at an edge don't overlap,
    /// and neither do rects with no area, such as a fully open door.
    #[inline]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.has_area()
            && other.has_area()
            && self.left < other.right()
            && self.right() > other.left
            && self.top < other.bottom()
            && self.bottom() > other.top
    }

    #[inline]
    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.left.is_finite()
            && self.top.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
    }
}

// Vec2 utils

#[inline]
pub fn vec_is_finite(v: Vec2) -> bool {
    v.x.is_finite() && v.y.is_finite()
}

/// Limit the magnitude of a vector without changing its direction.
#[inline]
pub fn clamp_magnitude(v: Vec2, max: f64) -> Vec2 {
    let mag_sq = v.mag_sq();
    if mag_sq > max * max {
        v * (max / mag_sq.sqrt())
    } else {
        v
    }
}

/// -1, 0 or 1 depending on the sign of the number, with zero mapping to zero.
#[inline]
pub fn sign(x: f64) -> i8 {
    if x > 0.0 {
        1
    } else if x < 0.0 {
        -1
    } else {
        0
    }
}
