//! Vein Runner - an endless runner through a procedurally streamed blood vessel
//!
//! Core modules:
//! - `sim`: Deterministic simulation (tube streaming, collisions, game state)
//! - `render`: Renderer / post-process / HUD ports and the trailing camera
//! - `platform`: Keyboard input mapping
//! - `audio`: Sound cues routed to an external audio port
//! - `tuning`: Data-driven game balance

pub mod audio;
pub mod game;
pub mod highscores;
pub mod platform;
pub mod render;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use game::Game;
pub use highscores::HighScores;
pub use settings::Settings;
pub use tuning::{Tuning, TuningError};

use glam::{Mat3, Vec3};

/// Game configuration constants
pub mod consts {
    /// Reference forward direction of a freshly generated segment (local frame)
    pub const FORWARD: glam::Vec3 = glam::Vec3::NEG_Z;
    /// World up; curves turn in the plane perpendicular to it
    pub const UP: glam::Vec3 = glam::Vec3::Y;

    /// Arc-length lookup resolution per curve
    pub const CURVE_DIVISIONS: usize = 200;

    /// Camera sits this far behind the player
    pub const CAMERA_TRAIL: f32 = 1.2;
    /// Camera x/y easing back toward the tube axis
    pub const CAMERA_LERP: f32 = 0.1;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Rotate a vector about the world up axis
#[inline]
pub fn rotate_y(v: Vec3, angle: f32) -> Vec3 {
    Mat3::from_rotation_y(angle) * v
}

/// Yaw of a horizontal direction, measured from -Z (positive turns toward -X)
#[inline]
pub fn heading_of(dir: Vec3) -> f32 {
    (-dir.x).atan2(-dir.z)
}
