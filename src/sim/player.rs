//! The player's sphere: lateral/vertical steering with damping
//!
//! The sphere never moves along the tube itself; forward travel is the tube
//! streaming past it. Its frame has the tube axis on Z with the sphere's
//! nominal spot at the origin.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// The player sphere
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec3,
    pub vel: Vec3,
    /// Force accumulated since the last `simulate`
    pub force: Vec3,
    pub radius: f32,
    /// Clots are harmless while set
    pub invincible: bool,
}

impl Player {
    pub fn new(radius: f32) -> Self {
        Self {
            pos: Vec3::ZERO,
            vel: Vec3::ZERO,
            force: Vec3::ZERO,
            radius,
            invincible: false,
        }
    }

    /// Queue a lateral/vertical impulse for the next step
    pub fn add_force(&mut self, force: Vec3) {
        self.force += Vec3::new(force.x, force.y, 0.0);
    }

    /// Integrate queued force with damping, keep the sphere inside the tube.
    ///
    /// The force accumulator is consumed; held keys re-apply theirs each frame.
    pub fn simulate(&mut self, damping: f32, max_lateral: f32) {
        self.vel = self.vel * damping + self.force;
        self.force = Vec3::ZERO;
        self.pos += self.vel;
        self.pos.z = 0.0;
        self.vel.z = 0.0;

        let lateral = Vec2::new(self.pos.x, self.pos.y);
        let dist = lateral.length();
        if dist > max_lateral && dist > 0.0 {
            let normal = lateral / dist;
            let clamped = normal * max_lateral;
            self.pos.x = clamped.x;
            self.pos.y = clamped.y;
            // Cancel the velocity component pushing into the wall
            let v = Vec2::new(self.vel.x, self.vel.y);
            let outward = v.dot(normal);
            if outward > 0.0 {
                let v = v - normal * outward;
                self.vel.x = v.x;
                self.vel.y = v.y;
            }
        }
    }

    /// Back to the tube axis, at rest
    pub fn reset(&mut self) {
        self.pos = Vec3::ZERO;
        self.vel = Vec3::ZERO;
        self.force = Vec3::ZERO;
        self.invincible = false;
    }

    /// Stop steering without moving the sphere
    pub fn halt(&mut self) {
        self.vel = Vec3::ZERO;
        self.force = Vec3::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_force_integrates_once() {
        let mut p = Player::new(0.25);
        p.add_force(Vec3::new(0.02, 0.0, 0.0));
        p.simulate(0.85, 10.0);
        assert!((p.pos.x - 0.02).abs() < 1e-6);
        assert_eq!(p.force, Vec3::ZERO);
    }

    #[test]
    fn test_released_motion_decays() {
        let mut p = Player::new(0.25);
        p.add_force(Vec3::new(0.0, 0.05, 0.0));
        p.simulate(0.8, 10.0);
        let mut last = p.vel.y;
        for _ in 0..30 {
            p.simulate(0.8, 10.0);
            assert!(p.vel.y < last);
            last = p.vel.y;
        }
        assert!(last < 0.001);
        // Travel converges: 0.05 / (1 - 0.8)
        assert!(p.pos.y < 0.25 + 1e-4);
    }

    #[test]
    fn test_forward_force_ignored() {
        let mut p = Player::new(0.25);
        p.add_force(Vec3::new(0.0, 0.0, 1.0));
        p.simulate(0.9, 10.0);
        assert_eq!(p.pos, Vec3::ZERO);
    }

    #[test]
    fn test_clamped_to_tube() {
        let mut p = Player::new(0.25);
        for _ in 0..200 {
            p.add_force(Vec3::new(0.02, 0.02, 0.0));
            p.simulate(0.9, 1.0);
            let lateral = Vec2::new(p.pos.x, p.pos.y).length();
            assert!(lateral <= 1.0 + 1e-5);
        }
        // Pinned against the wall: no outward velocity left
        let n = Vec2::new(p.pos.x, p.pos.y).normalize();
        assert!(Vec2::new(p.vel.x, p.vel.y).dot(n) <= 1e-6);
    }
}
