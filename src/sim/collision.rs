//! Player-versus-entity collision checks and their effects
//!
//! Entity positions live in the tube's view frame and are shifted into the
//! player's frame by the forward offset before measuring. Hits are collected
//! first and applied afterwards, removals back to front, so no entity is
//! skipped or visited twice while its collection shrinks.

use glam::Vec3;

use super::entity::EntityClass;
use super::state::GameState;
use super::tube::{EntitySlot, TubeManager};
use crate::tuning::Tuning;

/// Distances and factors the resolver needs
#[derive(Debug, Clone)]
pub struct CollisionRules {
    pub epsilon: f32,
    pub clot_epsilon: f32,
    pub red_cell_push: f32,
}

impl CollisionRules {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            epsilon: tuning.collision_epsilon,
            clot_epsilon: tuning.clot_epsilon,
            red_cell_push: tuning.red_cell_push,
        }
    }
}

/// What collision resolution did this frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollisionReport {
    pub viruses: u32,
    pub fatal_clot: bool,
    pub red_cells_pushed: u32,
    pub pickups: u32,
}

/// Slots of `class` entities closer to the player than `reach(radius)`
fn hits(tube: &TubeManager, class: EntityClass, player: Vec3, reach: impl Fn(f32) -> f32) -> Vec<EntitySlot> {
    tube.scan(class)
        .filter(|(_, e)| tube.player_frame(e.pos).distance(player) < reach(e.radius))
        .map(|(slot, _)| slot)
        .collect()
}

/// Resolve every collision for one frame (virus, clot, red cell, antibody)
pub fn resolve_collisions(
    state: &mut GameState,
    tube: &mut TubeManager,
    rules: &CollisionRules,
) -> CollisionReport {
    let mut report = CollisionReport::default();
    if !state.is_playing() {
        return report;
    }

    let player = state.player.pos;
    let pr = state.player.radius;

    // Viruses: eaten
    let eaten = hits(tube, EntityClass::Virus, player, |r| pr + r + rules.epsilon);
    for slot in eaten.iter().rev() {
        if tube.remove_entity(EntityClass::Virus, *slot).is_some() {
            state.consume_virus();
            report.viruses += 1;
        }
    }

    // Clots: fatal unless invincible; they stay put either way
    let touching = hits(tube, EntityClass::Clot, player, |r| pr + r - rules.clot_epsilon);
    if !touching.is_empty() && !state.player.invincible {
        report.fatal_clot = state.end_run();
    }

    // Red cells: nudged out of the way
    let bumped = hits(tube, EntityClass::RedCell, player, |r| r + pr + rules.epsilon);
    let offset = tube.player_frame(Vec3::ZERO);
    for slot in bumped {
        if let Some(cell) = tube.entity_mut(EntityClass::RedCell, slot) {
            let separation = cell.pos + offset - player;
            cell.pos += separation * rules.red_cell_push;
            report.red_cells_pushed += 1;
        }
    }

    // Antibodies: picked up
    if state.is_playing() {
        let grabbed = hits(tube, EntityClass::Antibody, player, |_| pr + rules.epsilon);
        for slot in grabbed.into_iter().rev() {
            let Some(antibody) = tube.remove_antibody(slot) else {
                continue;
            };
            if let Some(power) = antibody.power_up() {
                state.apply_power_up(power);
                report.pickups += 1;
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::{Entity, EntityKind, PowerUp};
    use crate::sim::state::{GameEvent, GamePhase};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    /// Empty window with a playing state
    fn setup() -> (GameState, TubeManager, CollisionRules) {
        let tuning = Tuning {
            viruses_per_segment: 0,
            clots_per_segment: 0,
            red_cells_per_segment: 0,
            antibodies_per_segment: 0,
            ..Tuning::default()
        };
        let mut rng = Pcg32::seed_from_u64(1);
        let tube = TubeManager::new(&tuning, &mut rng);
        let mut state = GameState::new(&tuning, 0.5, 1.5);
        state.start();
        state.drain_events();
        (state, tube, CollisionRules::new(&tuning))
    }

    /// Place an entity at a player-frame position in the current segment
    fn place(tube: &mut TubeManager, id: u32, kind: EntityKind, radius: f32, at: Vec3) -> EntitySlot {
        let pos = tube.view_frame(at);
        let class = kind.class();
        let index = tube.count(0, class);
        tube.current_segment_mut().push(Entity { id, kind, pos, radius });
        EntitySlot { segment: 0, index }
    }

    #[test]
    fn test_virus_in_reach_is_eaten() {
        let (mut state, mut tube, rules) = setup();
        place(&mut tube, 1, EntityKind::Virus, 0.15, Vec3::new(0.3, 0.0, 0.0));
        place(&mut tube, 2, EntityKind::Virus, 0.15, Vec3::new(1.2, 0.0, 0.0));

        let report = resolve_collisions(&mut state, &mut tube, &rules);
        assert_eq!(report.viruses, 1);
        assert_eq!(state.score, 1);
        let left: Vec<_> = tube.scan(EntityClass::Virus).map(|(_, e)| e.id).collect();
        assert_eq!(left, vec![2]);
        assert!(state.drain_events().contains(&GameEvent::VirusConsumed { score: 1 }));
    }

    #[test]
    fn test_adjacent_viruses_all_eaten() {
        let (mut state, mut tube, rules) = setup();
        for i in 0..5 {
            place(&mut tube, i, EntityKind::Virus, 0.15, Vec3::new(0.05 * i as f32, 0.1, 0.0));
        }
        place(&mut tube, 99, EntityKind::Virus, 0.15, Vec3::new(0.0, 0.0, -5.0));
        let report = resolve_collisions(&mut state, &mut tube, &rules);
        assert_eq!(report.viruses, 5);
        assert_eq!(tube.count(0, EntityClass::Virus), 1);
        // Nothing comes back on the next scan
        let report = resolve_collisions(&mut state, &mut tube, &rules);
        assert_eq!(report.viruses, 0);
        assert_eq!(state.score, 5);
    }

    #[test]
    fn test_clot_ends_run() {
        let (mut state, mut tube, rules) = setup();
        state.consume_virus();
        state.consume_virus();
        place(&mut tube, 1, EntityKind::Clot, 0.4, Vec3::new(0.2, 0.0, 0.0));

        let report = resolve_collisions(&mut state, &mut tube, &rules);
        assert!(report.fatal_clot);
        assert_eq!(state.phase, GamePhase::Ended);
        assert_eq!(state.end_score, 2);

        // Already over: nothing re-triggers
        let report = resolve_collisions(&mut state, &mut tube, &rules);
        assert!(!report.fatal_clot);
        assert_eq!(state.runs, 1);
    }

    #[test]
    fn test_clot_ignored_while_invincible() {
        let (mut state, mut tube, rules) = setup();
        state.apply_power_up(PowerUp::Invincible);
        place(&mut tube, 1, EntityKind::Clot, 0.4, Vec3::new(0.1, 0.0, 0.0));

        let report = resolve_collisions(&mut state, &mut tube, &rules);
        assert!(!report.fatal_clot);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(tube.count(0, EntityClass::Clot), 1);
    }

    #[test]
    fn test_grazing_clot_is_not_fatal() {
        let (mut state, mut tube, rules) = setup();
        // Touching, but not by more than the clot epsilon
        place(&mut tube, 1, EntityKind::Clot, 0.4, Vec3::new(0.25 + 0.4 - 0.05, 0.0, 0.0));
        resolve_collisions(&mut state, &mut tube, &rules);
        assert_eq!(state.phase, GamePhase::Playing);
    }

    #[test]
    fn test_red_cell_pushed_away() {
        let (mut state, mut tube, rules) = setup();
        let slot = place(&mut tube, 1, EntityKind::RedCell, 0.3, Vec3::new(0.4, 0.0, 0.0));

        let report = resolve_collisions(&mut state, &mut tube, &rules);
        assert_eq!(report.red_cells_pushed, 1);
        let cell = tube.entity(EntityClass::RedCell, slot).unwrap();
        let p = tube.player_frame(cell.pos);
        assert!((p.x - 0.6).abs() < 1e-5);
        assert_eq!(tube.count(0, EntityClass::RedCell), 1);
    }

    #[test]
    fn test_antibody_effects() {
        let (mut state, mut tube, rules) = setup();
        for _ in 0..2000 {
            state.ramp_speed();
        }
        let fast = state.speed;
        place(&mut tube, 1, EntityKind::Antibody(PowerUp::Speed), 0.15, Vec3::new(0.1, 0.0, 0.0));
        place(&mut tube, 2, EntityKind::Antibody(PowerUp::Invincible), 0.15, Vec3::new(0.0, 0.1, 0.0));

        let report = resolve_collisions(&mut state, &mut tube, &rules);
        assert_eq!(report.pickups, 2);
        assert!(state.speed < fast);
        assert!(state.player.invincible);
        assert_eq!(state.emphasis, 1.5);
        assert_eq!(tube.count(0, EntityClass::Antibody), 0);
    }

    #[test]
    fn test_nothing_happens_outside_a_run() {
        let (mut state, mut tube, rules) = setup();
        state.end_run();
        state.return_to_menu();
        place(&mut tube, 1, EntityKind::Virus, 0.15, Vec3::ZERO);
        place(&mut tube, 2, EntityKind::Clot, 0.4, Vec3::ZERO);
        let report = resolve_collisions(&mut state, &mut tube, &rules);
        assert_eq!(report, CollisionReport::default());
        assert_eq!(state.phase, GamePhase::Menu);
        assert_eq!(tube.count(0, EntityClass::Virus), 1);
    }
}
