//! Per-frame simulation step
//!
//! Advances the world by one frame in a fixed order: phase transitions,
//! player motion, speed and invincibility bookkeeping, tube advance, then
//! collision resolution.

use std::cmp::Ordering;

use glam::{Vec2, Vec3};
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::collision::{CollisionReport, CollisionRules, resolve_collisions};
use super::entity::EntityClass;
use super::state::{GamePhase, GameState};
use super::tube::{AdvanceReport, TubeManager};
use crate::tuning::Tuning;

/// How far ahead the autopilot looks for viruses
const AUTOPILOT_RANGE: f32 = 12.0;
/// Extra lateral room the autopilot keeps from clots
const AUTOPILOT_CLOT_MARGIN: f32 = 0.3;
/// Lateral error the autopilot tolerates before steering
const AUTOPILOT_DEAD_ZONE: f32 = 0.05;

/// Input commands for a single frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Held steering direction; each axis in [-1, 1] (x right, y up)
    pub steer: Vec2,
    /// Start from the menu, or restart after a run (space)
    pub start: bool,
    /// Back to the menu after a run
    pub menu: bool,
    /// Give up the current run
    pub quit: bool,
    /// Demo mode - the game plays itself
    pub autopilot: bool,
}

/// Everything one frame did, for logging and feedback
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub advance: AdvanceReport,
    pub collisions: CollisionReport,
}

/// The whole simulation: run state, tube window and the RNG feeding it
#[derive(Debug, Clone)]
pub struct World {
    pub state: GameState,
    pub tube: TubeManager,
    pub rng: Pcg32,
    tuning: Tuning,
    rules: CollisionRules,
}

impl World {
    pub fn new(tuning: Tuning, seed: u64, base_emphasis: f32, boosted_emphasis: f32) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let tube = TubeManager::new(&tuning, &mut rng);
        let state = GameState::new(&tuning, base_emphasis, boosted_emphasis);
        log::info!(
            "World seeded with {} ({} segments in view)",
            seed,
            tube.segment_count()
        );
        Self {
            state,
            tube,
            rng,
            rules: CollisionRules::new(&tuning),
            tuning,
        }
    }

    #[inline]
    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Lateral distance the player may stray from the tube axis
    #[inline]
    pub fn max_lateral(&self) -> f32 {
        self.tuning.tube_radius - self.tuning.player_radius
    }
}

/// Advance the world by one frame
pub fn tick(world: &mut World, input: &TickInput) -> TickReport {
    let mut input = input.clone();
    if input.autopilot {
        // Demo mode starts its own runs
        input.start |= !world.state.is_playing();
        input.steer = Vec2::ZERO;
    }

    apply_transitions(world, &input);

    // Motion integration
    if world.state.is_playing() {
        if input.autopilot {
            input.steer = autopilot_steer(world);
        }
        let steer = input.steer.clamp(Vec2::NEG_ONE, Vec2::ONE);
        let force = Vec3::new(steer.x, steer.y, 0.0) * world.tuning.steer_force;
        world.state.player.add_force(force);
    }
    let max_lateral = world.max_lateral();
    world.state.player.simulate(world.tuning.damping, max_lateral);

    // Forward travel; invincibility runs on the same distance
    if world.state.is_playing() {
        world.state.ramp_speed();
    }
    let delta = world.state.speed;
    world.state.travel(delta);

    let advance = world.tube.advance(delta, &mut world.rng);
    let collisions = resolve_collisions(&mut world.state, &mut world.tube, &world.rules);

    world.state.frame += 1;
    TickReport {
        advance,
        collisions,
    }
}

/// Phase changes requested this frame; they land before anything moves
fn apply_transitions(world: &mut World, input: &TickInput) {
    let state = &mut world.state;
    let began = match state.phase {
        GamePhase::Menu if input.start => state.start(),
        GamePhase::Ended if input.start => state.restart(),
        GamePhase::Ended if input.menu => {
            state.return_to_menu();
            false
        }
        GamePhase::Playing if input.quit => {
            state.end_run();
            false
        }
        _ => false,
    };

    if began {
        // Never begin a run already inside a clot
        let reach = state.player.radius + world.tuning.collision_epsilon;
        let cleared = world
            .tube
            .clear_near(EntityClass::Clot, state.player.pos, reach);
        if cleared > 0 {
            log::debug!("Cleared {} clots from the start position", cleared);
        }
    }
}

/// Demo steering: chase the nearest virus ahead, shy away from clots
fn autopilot_steer(world: &World) -> Vec2 {
    let tube = &world.tube;
    let player = &world.state.player;
    let lateral = |p: Vec3| Vec2::new(p.x, p.y);
    let ahead = |p: Vec3| -p.z;

    // Where the player drifts to if it stops steering now
    let damping = world.tuning.damping;
    let coast = lateral(player.vel) * (damping / (1.0 - damping).max(1e-3));
    let here = lateral(player.pos) + coast;

    let target = tube
        .scan(EntityClass::Virus)
        .map(|(_, e)| tube.player_frame(e.pos))
        .filter(|p| (0.0..AUTOPILOT_RANGE).contains(&ahead(*p)))
        .min_by(|a, b| {
            let da = a.distance_squared(player.pos);
            let db = b.distance_squared(player.pos);
            da.partial_cmp(&db).unwrap_or(Ordering::Equal)
        });

    let mut steer = match target {
        Some(p) => lateral(p) - here,
        None => -here * 0.5,
    };

    for (_, clot) in tube.scan(EntityClass::Clot) {
        let p = tube.player_frame(clot.pos);
        if !(-1.0..AUTOPILOT_RANGE * 0.5).contains(&ahead(p)) {
            continue;
        }
        let away = here - lateral(p);
        let clearance = player.radius + clot.radius + AUTOPILOT_CLOT_MARGIN;
        let gap = away.length();
        if gap < clearance {
            let dir = if gap > 1e-4 { away / gap } else { Vec2::X };
            steer += dir * (clearance - gap) * 4.0;
        }
    }

    Vec2::new(steer_axis(steer.x), steer_axis(steer.y))
}

fn steer_axis(error: f32) -> f32 {
    if error > AUTOPILOT_DEAD_ZONE {
        1.0
    } else if error < -AUTOPILOT_DEAD_ZONE {
        -1.0
    } else {
        0.0
    }
}
