//! Procedural tube path pieces
//!
//! Each segment is a planar cubic curve in its own local frame: it starts at the
//! origin heading -Z and ends turned by a signed yaw. Segments are chained by
//! heading, so the next one starts where and how the previous one ended.

use glam::Vec3;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::{CURVE_DIVISIONS, FORWARD, UP};
use crate::tuning::Tuning;
use crate::{heading_of, normalize_angle, rotate_y};

/// Which way a segment bends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Turn {
    Left,
    Right,
}

impl Turn {
    /// +1 for left (positive yaw), -1 for right
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            Turn::Left => 1.0,
            Turn::Right => -1.0,
        }
    }
}

/// Cubic Bezier with an arc-length lookup table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TubeCurve {
    pub p0: Vec3,
    pub p1: Vec3,
    pub p2: Vec3,
    pub p3: Vec3,
    /// Cumulative length at each of `CURVE_DIVISIONS + 1` parameter samples
    lengths: Vec<f32>,
}

impl TubeCurve {
    pub fn new(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3) -> Self {
        let mut curve = Self {
            p0,
            p1,
            p2,
            p3,
            lengths: Vec::with_capacity(CURVE_DIVISIONS + 1),
        };
        let mut total = 0.0;
        let mut last = curve.point(0.0);
        curve.lengths.push(0.0);
        for i in 1..=CURVE_DIVISIONS {
            let p = curve.point(i as f32 / CURVE_DIVISIONS as f32);
            total += p.distance(last);
            curve.lengths.push(total);
            last = p;
        }
        curve
    }

    /// Point at curve parameter `t` in [0, 1]
    pub fn point(&self, t: f32) -> Vec3 {
        let t = t.clamp(0.0, 1.0);
        let u = 1.0 - t;
        self.p0 * (u * u * u)
            + self.p1 * (3.0 * u * u * t)
            + self.p2 * (3.0 * u * t * t)
            + self.p3 * (t * t * t)
    }

    /// Unit tangent at curve parameter `t`
    pub fn tangent(&self, t: f32) -> Vec3 {
        let t = t.clamp(0.0, 1.0);
        let u = 1.0 - t;
        let d = (self.p1 - self.p0) * (3.0 * u * u)
            + (self.p2 - self.p1) * (6.0 * u * t)
            + (self.p3 - self.p2) * (3.0 * t * t);
        d.normalize_or(FORWARD)
    }

    /// Total arc length
    #[inline]
    pub fn length(&self) -> f32 {
        self.lengths.last().copied().unwrap_or(0.0)
    }

    /// Curve parameter at arc distance `s` (clamped to the curve)
    pub fn param_at(&self, s: f32) -> f32 {
        let total = self.length();
        if total <= 0.0 {
            return 0.0;
        }
        let s = s.clamp(0.0, total);
        // First sample whose cumulative length reaches s
        let hi = self.lengths.partition_point(|&l| l < s).clamp(1, CURVE_DIVISIONS);
        let lo = hi - 1;
        let span = self.lengths[hi] - self.lengths[lo];
        let frac = if span > 0.0 {
            (s - self.lengths[lo]) / span
        } else {
            0.0
        };
        (lo as f32 + frac) / CURVE_DIVISIONS as f32
    }

    /// Point at arc distance `s`
    #[inline]
    pub fn point_at(&self, s: f32) -> Vec3 {
        self.point(self.param_at(s))
    }

    /// Tangent at arc distance `s`
    #[inline]
    pub fn tangent_at(&self, s: f32) -> Vec3 {
        self.tangent(self.param_at(s))
    }

    /// Unsigned angle between the tangent at `s` and the segment's forward axis
    pub fn heading_angle_at(&self, s: f32) -> f32 {
        self.tangent_at(s).angle_between(FORWARD)
    }

    /// Offset a centerline point into the tube cross-section.
    ///
    /// `phi` is measured around the tangent starting from the horizontal normal.
    pub fn cross_section_point(&self, s: f32, radial: f32, phi: f32) -> Vec3 {
        let t = self.param_at(s);
        let tangent = self.tangent(t);
        let normal = UP.cross(tangent).normalize_or(Vec3::X);
        let binormal = tangent.cross(normal);
        self.point(t) + (normal * phi.cos() + binormal * phi.sin()) * radial
    }
}

/// End state of a segment, expressed in the frame its successor chains from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathEnd {
    pub position: Vec3,
    pub tangent: Vec3,
}

impl Default for PathEnd {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            tangent: FORWARD,
        }
    }
}

/// One generated path piece
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentPath {
    /// Curve in the segment's local frame (starts at origin, heading -Z)
    pub curve: TubeCurve,
    pub turn: Turn,
    /// Signed yaw between the start and end tangents
    pub turn_angle: f32,
    /// Cumulative yaw of the local frame relative to the first segment
    pub heading: f32,
    /// Start point in path space (chained from the previous segment)
    pub origin: Vec3,
}

impl SegmentPath {
    #[inline]
    pub fn length(&self) -> f32 {
        self.curve.length()
    }

    /// Where this segment ends, in path space
    pub fn end(&self) -> PathEnd {
        PathEnd {
            position: self.to_path(self.curve.point(1.0)),
            tangent: rotate_y(self.curve.tangent(1.0), self.heading),
        }
    }

    /// Transform a local point into path space
    #[inline]
    pub fn to_path(&self, local: Vec3) -> Vec3 {
        self.origin + rotate_y(local, self.heading)
    }
}

/// Builds successive tube segments
#[derive(Debug, Clone)]
pub struct CurveGenerator {
    min_length: f32,
    max_length: f32,
    min_turn: f32,
    max_turn: f32,
}

impl CurveGenerator {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            min_length: tuning.min_segment_length.max(f32::EPSILON),
            max_length: tuning.max_segment_length.max(tuning.min_segment_length),
            min_turn: tuning.min_turn,
            max_turn: tuning.max_turn.max(tuning.min_turn),
        }
    }

    /// Generate the segment that continues from `previous` (or from the
    /// default forward tangent at the origin for the first one)
    pub fn generate(&self, previous: Option<PathEnd>, rng: &mut Pcg32) -> SegmentPath {
        let start = previous.unwrap_or_default();
        let heading = normalize_angle(heading_of(start.tangent));

        let target_length = if self.max_length > self.min_length {
            rng.random_range(self.min_length..=self.max_length)
        } else {
            self.min_length
        };
        let turn = if rng.random_bool(0.5) {
            Turn::Left
        } else {
            Turn::Right
        };
        let magnitude = if self.max_turn > self.min_turn {
            rng.random_range(self.min_turn..=self.max_turn)
        } else {
            self.min_turn
        };
        let turn_angle = magnitude * turn.sign();

        let mut curve = Self::build_curve(target_length, turn_angle);
        // The cubic only approximates the arc; never fall below the minimum
        if curve.length() < self.min_length {
            let scale = self.min_length / curve.length().max(f32::EPSILON);
            curve = Self::build_curve(target_length * scale, turn_angle);
        }

        SegmentPath {
            curve,
            turn,
            turn_angle,
            heading,
            origin: start.position,
        }
    }

    /// Approximate a circular arc of `length` turning by `angle`
    fn build_curve(length: f32, angle: f32) -> TubeCurve {
        let half = angle * 0.5;
        let chord = if half.abs() > 1e-4 {
            length * half.sin() / half
        } else {
            length
        };
        let p0 = Vec3::ZERO;
        let p3 = rotate_y(FORWARD, half) * chord;
        let end_dir = rotate_y(FORWARD, angle);
        let handle = length / 3.0;
        let p1 = FORWARD * handle;
        let p2 = p3 - end_dir * handle;
        TubeCurve::new(p0, p1, p2, p3)
    }
}
