//! Data-driven game balance
//!
//! Every gameplay number lives here so a run can be re-tuned from JSON without
//! touching the simulation. Missing fields fall back to the defaults.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Gameplay tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Speed ===
    /// Forward distance per frame at the start of a run
    pub base_speed: f32,
    /// Forward speed cap
    pub max_speed: f32,
    /// Speed gained per frame while playing
    pub speed_ramp: f32,
    /// Speed removed by a `speed` antibody
    pub speed_pickup_step: f32,

    // === Player ===
    pub player_radius: f32,
    /// Force applied per frame for each held direction key
    pub steer_force: f32,
    /// Velocity multiplier per frame (1.0 = no damping)
    pub damping: f32,

    // === Tube ===
    pub tube_radius: f32,
    pub min_segment_length: f32,
    pub max_segment_length: f32,
    /// Turn angle range per segment (radians, absolute)
    pub min_turn: f32,
    pub max_turn: f32,
    /// Distance the player rides ahead of the tracking point (camera trailing offset)
    pub forward_offset: f32,
    /// Distance into a new segment before the old one is dropped
    pub retire_guard: f32,
    /// Nothing spawns this far past the player's start on the opening segment
    pub start_clearance: f32,

    // === Entities ===
    pub virus_radius: f32,
    pub red_cell_radius: f32,
    pub antibody_radius: f32,
    pub min_clot_radius: f32,
    pub max_clot_radius: f32,
    /// Smallest radial offset from the centerline
    pub min_radial_offset: f32,
    pub viruses_per_segment: u32,
    pub clots_per_segment: u32,
    pub red_cells_per_segment: u32,
    pub antibodies_per_segment: u32,

    // === Collisions ===
    pub collision_epsilon: f32,
    /// Clots must overlap this much before they are fatal
    pub clot_epsilon: f32,
    /// Fraction of the separation vector a red cell is pushed by
    pub red_cell_push: f32,

    // === Invincibility ===
    /// Distance an `invincible` antibody lasts
    pub invincible_distance: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            base_speed: 0.1,
            max_speed: 0.3,
            speed_ramp: 0.00005,
            speed_pickup_step: 0.05,

            player_radius: 0.25,
            steer_force: 0.02,
            damping: 0.85,

            tube_radius: 1.6,
            min_segment_length: 30.0,
            max_segment_length: 50.0,
            min_turn: 0.15,
            max_turn: 0.9,
            forward_offset: 7.0,
            retire_guard: 1.0,
            start_clearance: 5.0,

            virus_radius: 0.15,
            red_cell_radius: 0.3,
            antibody_radius: 0.15,
            min_clot_radius: 0.3,
            max_clot_radius: 0.55,
            min_radial_offset: 0.2,
            viruses_per_segment: 24,
            clots_per_segment: 3,
            red_cells_per_segment: 10,
            antibodies_per_segment: 1,

            collision_epsilon: 0.08,
            clot_epsilon: 0.1,
            red_cell_push: 0.5,

            invincible_distance: 40.0,
        }
    }
}

/// Why a tuning was rejected
#[derive(Debug)]
pub enum TuningError {
    Parse(serde_json::Error),
    Invalid(&'static str),
}

impl fmt::Display for TuningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TuningError::Parse(e) => write!(f, "tuning is not valid JSON: {e}"),
            TuningError::Invalid(why) => write!(f, "invalid tuning: {why}"),
        }
    }
}

impl std::error::Error for TuningError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TuningError::Parse(e) => Some(e),
            TuningError::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for TuningError {
    fn from(e: serde_json::Error) -> Self {
        TuningError::Parse(e)
    }
}

impl Tuning {
    /// Parse and validate a JSON tuning document
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Largest radius any spawned entity can have
    pub fn max_entity_radius(&self) -> f32 {
        self.virus_radius
            .max(self.red_cell_radius)
            .max(self.antibody_radius)
            .max(self.max_clot_radius)
    }

    /// Reject tunings that would break simulation invariants
    pub fn validate(&self) -> Result<(), TuningError> {
        use TuningError::Invalid;

        if !(self.base_speed > 0.0) {
            return Err(Invalid("base_speed must be positive"));
        }
        if self.base_speed > self.max_speed {
            return Err(Invalid("base_speed exceeds max_speed"));
        }
        if self.speed_ramp < 0.0 || self.speed_pickup_step < 0.0 {
            return Err(Invalid("speed ramp and pickup step must not be negative"));
        }
        if !(self.damping > 0.0 && self.damping <= 1.0) {
            return Err(Invalid("damping must be in (0, 1]"));
        }
        let radii = [
            self.player_radius,
            self.virus_radius,
            self.red_cell_radius,
            self.antibody_radius,
            self.min_clot_radius,
        ];
        if radii.iter().any(|r| !(*r > 0.0)) {
            return Err(Invalid("radii must be positive"));
        }
        if self.min_clot_radius > self.max_clot_radius {
            return Err(Invalid("min_clot_radius exceeds max_clot_radius"));
        }
        if self.min_radial_offset < 0.0 {
            return Err(Invalid("min_radial_offset must not be negative"));
        }
        if self.tube_radius <= self.min_radial_offset + self.max_entity_radius() {
            return Err(Invalid("tube too narrow for the largest entity"));
        }
        if self.tube_radius <= self.player_radius {
            return Err(Invalid("tube too narrow for the player"));
        }
        if !(self.min_segment_length > 0.0) || self.min_segment_length > self.max_segment_length
        {
            return Err(Invalid("segment length range is empty or not positive"));
        }
        if self.min_segment_length <= self.retire_guard {
            return Err(Invalid("segments must be longer than the retirement guard"));
        }
        // The player and everything it can touch must stay within current + next
        if self.min_segment_length
            <= self.forward_offset + self.player_radius + self.max_entity_radius() + self.tube_radius
        {
            return Err(Invalid("segments too short for the forward offset"));
        }
        if !(self.min_turn > 0.0 && self.min_turn <= self.max_turn)
            || self.max_turn >= std::f32::consts::FRAC_PI_2
        {
            return Err(Invalid("turn range must lie in (0, pi/2)"));
        }
        if self.invincible_distance <= 0.0 {
            return Err(Invalid("invincible_distance must be positive"));
        }
        if !(0.0..=1.0).contains(&self.red_cell_push) {
            return Err(Invalid("red_cell_push must be in [0, 1]"));
        }
        Ok(())
    }
}
