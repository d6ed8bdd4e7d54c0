//! 2D geometry primitives for outline measurements.
//!
//! Borders are closed polygons of [`Point`]s. Angle measurements between
//! border points feed the angle profile; line equations support
//! perpendiculars and intersections when orienting outlines.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

// ── Point ──────────────────────────────────────────────────────────────────

/// A 2D point with floating precision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point) -> f64 {
        (*self - *other).as_vector().norm()
    }

    /// Midpoint of the straight line to another point.
    pub fn midpoint_of(&self, other: &Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Coordinates rounded to the nearest integer pixel.
    pub fn rounded(&self) -> (i64, i64) {
        (self.x.round() as i64, self.y.round() as i64)
    }

    /// Whether two points round to the same integer pixel.
    pub fn overlaps(&self, other: &Point) -> bool {
        self.rounded() == other.rounded()
    }

    fn as_vector(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;
    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

/// Interior angle at `vertex` between the rays to `a` and `b`, in degrees.
/// The result lies in `[0, 180]`; reflex detection is the caller's concern
/// (see [`angle_is_reflex`]).
pub fn angle_between(a: &Point, vertex: &Point, b: &Point) -> f64 {
    let va = (*a - *vertex).as_vector();
    let vb = (*b - *vertex).as_vector();
    let na = va.norm();
    let nb = vb.norm();
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    let cos = (va.dot(&vb) / (na * nb)).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

/// Whether the angle at `vertex` opens away from the polygon interior:
/// true when the midpoint of the chord `a`–`b` falls outside the border.
pub fn angle_is_reflex(a: &Point, vertex: &Point, b: &Point, border: &[Point]) -> bool {
    let mid = a.midpoint_of(b);
    // Degenerate chords sit on the vertex itself; treat as convex.
    if mid.overlaps(vertex) {
        return false;
    }
    !point_in_polygon(&mid, border)
}

/// Ray-casting point-in-polygon test over a closed border. A border with
/// fewer than three points encloses nothing.
pub fn point_in_polygon(p: &Point, border: &[Point]) -> bool {
    let n = border.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (pi, pj) = (&border[i], &border[j]);
        if (pi.y > p.y) != (pj.y > p.y) {
            let x_cross = (pj.x - pi.x) * (p.y - pi.y) / (pj.y - pi.y) + pi.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

// ── Line equations ─────────────────────────────────────────────────────────

/// A line in the plane. Vertical lines are a distinct variant rather than
/// an infinite slope.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LineEquation {
    /// `y = m·x + c`.
    Sloped { m: f64, c: f64 },
    /// `x = const`.
    Vertical { x: f64 },
}

impl LineEquation {
    /// Line through two points. Coincident points yield a horizontal line
    /// through them.
    pub fn from_points(a: &Point, b: &Point) -> Self {
        let dx = b.x - a.x;
        if dx.abs() < f64::EPSILON {
            return Self::Vertical { x: a.x };
        }
        let m = (b.y - a.y) / dx;
        Self::Sloped { m, c: a.y - m * a.x }
    }

    /// `y` at the given `x`; `None` for vertical lines.
    pub fn y_at(&self, x: f64) -> Option<f64> {
        match *self {
            Self::Sloped { m, c } => Some(m * x + c),
            Self::Vertical { .. } => None,
        }
    }

    /// `x` at the given `y`; `None` for horizontal lines.
    pub fn x_at(&self, y: f64) -> Option<f64> {
        match *self {
            Self::Sloped { m, c } => {
                if m == 0.0 {
                    None
                } else {
                    Some((y - c) / m)
                }
            }
            Self::Vertical { x } => Some(x),
        }
    }

    /// The perpendicular line passing through `p`.
    pub fn perpendicular_through(&self, p: &Point) -> LineEquation {
        match *self {
            Self::Sloped { m, .. } => {
                if m == 0.0 {
                    Self::Vertical { x: p.x }
                } else {
                    let pm = -1.0 / m;
                    Self::Sloped { m: pm, c: p.y - pm * p.x }
                }
            }
            Self::Vertical { .. } => Self::Sloped { m: 0.0, c: p.y },
        }
    }

    /// Intersection with another line; `None` when parallel.
    pub fn intersection(&self, other: &LineEquation) -> Option<Point> {
        match (*self, *other) {
            (Self::Sloped { m: m1, c: c1 }, Self::Sloped { m: m2, c: c2 }) => {
                if (m1 - m2).abs() < f64::EPSILON {
                    return None;
                }
                let x = (c2 - c1) / (m1 - m2);
                Some(Point::new(x, m1 * x + c1))
            }
            (Self::Sloped { m, c }, Self::Vertical { x })
            | (Self::Vertical { x }, Self::Sloped { m, c }) => Some(Point::new(x, m * x + c)),
            (Self::Vertical { .. }, Self::Vertical { .. }) => None,
        }
    }

    /// Perpendicular distance from a point to this line.
    pub fn distance_to_point(&self, p: &Point) -> f64 {
        match *self {
            Self::Sloped { m, c } => (m * p.x - p.y + c).abs() / (m * m + 1.0).sqrt(),
            Self::Vertical { x } => (p.x - x).abs(),
        }
    }

    /// The two points on this line at distance `d` from `from`, which is
    /// assumed to lie on the line.
    pub fn points_at_distance(&self, from: &Point, d: f64) -> (Point, Point) {
        match *self {
            Self::Sloped { m, .. } => {
                let dx = d / (m * m + 1.0).sqrt();
                let dy = m * dx;
                (
                    Point::new(from.x + dx, from.y + dy),
                    Point::new(from.x - dx, from.y - dy),
                )
            }
            Self::Vertical { x } => (Point::new(x, from.y + d), Point::new(x, from.y - d)),
        }
    }
}
