//! Game state and phase transitions
//!
//! All run bookkeeping (phase, score, speed, invincibility) lives here and only
//! changes through the named transition methods.

use serde::{Deserialize, Serialize};

use super::entity::PowerUp;
use super::player::Player;
use crate::highscores::HighScores;
use crate::tuning::Tuning;

/// Current phase of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Start menu showing, tube scrolling in the background
    Menu,
    /// Active run
    Playing,
    /// Run over, end menu showing
    Ended,
}

/// Things that happened during a frame, for sound and feedback
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    RunStarted,
    VirusConsumed { score: u32 },
    PowerUpCollected(PowerUp),
    InvincibilityEnded,
    GameOver { score: u32, new_high: bool },
    ReturnedToMenu,
}

/// Run state (score, speed, invincibility) plus the player sphere
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub phase: GamePhase,
    /// Viruses eaten this run
    pub score: u32,
    /// Score of the last finished run
    pub end_score: u32,
    pub high_score: u32,
    /// Forward distance per frame
    pub speed: f32,
    /// Distance travelled this run
    pub distance: f32,
    /// Distance travelled since the last invincibility pickup
    pub invincible_distance: f32,
    /// Post-process strength (bloom) pushed to the renderer
    pub emphasis: f32,
    pub player: Player,
    /// Finished runs this session
    pub scores: HighScores,
    /// Completed runs this session
    pub runs: u32,
    /// Frame counter
    pub frame: u64,
    /// Events raised since the last drain
    #[serde(skip)]
    pub events: Vec<GameEvent>,

    base_speed: f32,
    max_speed: f32,
    speed_ramp: f32,
    speed_step: f32,
    max_invincible_distance: f32,
    base_emphasis: f32,
    boosted_emphasis: f32,
}

impl GameState {
    pub fn new(tuning: &Tuning, base_emphasis: f32, boosted_emphasis: f32) -> Self {
        Self {
            phase: GamePhase::Menu,
            score: 0,
            end_score: 0,
            high_score: 0,
            speed: tuning.base_speed,
            distance: 0.0,
            invincible_distance: 0.0,
            emphasis: base_emphasis,
            player: Player::new(tuning.player_radius),
            scores: HighScores::new(),
            runs: 0,
            frame: 0,
            events: Vec::new(),
            base_speed: tuning.base_speed,
            max_speed: tuning.max_speed,
            speed_ramp: tuning.speed_ramp,
            speed_step: tuning.speed_pickup_step,
            max_invincible_distance: tuning.invincible_distance,
            base_emphasis,
            boosted_emphasis,
        }
    }

    #[inline]
    pub fn base_speed(&self) -> f32 {
        self.base_speed
    }

    #[inline]
    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.phase == GamePhase::Playing
    }

    /// Take the events raised since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    // === Transitions ===

    /// Menu -> Playing
    pub fn start(&mut self) -> bool {
        if self.phase != GamePhase::Menu {
            return false;
        }
        self.begin_run();
        true
    }

    /// Ended -> Playing, skipping the menu
    pub fn restart(&mut self) -> bool {
        if self.phase != GamePhase::Ended {
            return false;
        }
        self.begin_run();
        true
    }

    fn begin_run(&mut self) {
        self.phase = GamePhase::Playing;
        self.score = 0;
        self.speed = self.base_speed;
        self.distance = 0.0;
        self.player.reset();
        self.clear_invincibility();
        log::info!("Run {} started", self.runs + 1);
        self.events.push(GameEvent::RunStarted);
    }

    /// Playing -> Ended. Idempotent: does nothing outside a run.
    pub fn end_run(&mut self) -> bool {
        if self.phase != GamePhase::Playing {
            return false;
        }
        self.phase = GamePhase::Ended;
        self.end_score = self.score;
        self.runs += 1;
        let new_high = self.score > self.high_score;
        self.scores.add_score(self.score, self.distance, self.runs);
        self.high_score = self.scores.top_score().unwrap_or(self.high_score);
        self.speed = self.base_speed;
        self.player.halt();
        self.clear_invincibility();
        log::info!(
            "Run {} over: {} viruses over {:.0} units{}",
            self.runs,
            self.score,
            self.distance,
            if new_high { " (new high score)" } else { "" }
        );
        self.events.push(GameEvent::GameOver {
            score: self.score,
            new_high,
        });
        true
    }

    /// Ended -> Menu
    pub fn return_to_menu(&mut self) -> bool {
        if self.phase != GamePhase::Ended {
            return false;
        }
        self.phase = GamePhase::Menu;
        self.score = 0;
        self.player.reset();
        self.events.push(GameEvent::ReturnedToMenu);
        true
    }

    // === Per-frame bookkeeping ===

    /// Ramp forward speed toward the cap
    pub fn ramp_speed(&mut self) {
        self.speed = (self.speed + self.speed_ramp).clamp(self.base_speed, self.max_speed);
    }

    /// Record distance covered this frame; expires invincibility
    pub fn travel(&mut self, delta: f32) {
        if self.is_playing() {
            self.distance += delta;
        }
        if self.player.invincible {
            self.invincible_distance += delta;
            if self.invincible_distance >= self.max_invincible_distance {
                self.clear_invincibility();
                log::debug!("Invincibility wore off");
                self.events.push(GameEvent::InvincibilityEnded);
            }
        }
    }

    fn clear_invincibility(&mut self) {
        self.player.invincible = false;
        self.invincible_distance = 0.0;
        self.emphasis = self.base_emphasis;
    }

    // === Collision effects ===

    pub fn consume_virus(&mut self) {
        self.score += 1;
        self.events.push(GameEvent::VirusConsumed { score: self.score });
    }

    pub fn apply_power_up(&mut self, power: PowerUp) {
        match power {
            PowerUp::Invincible => {
                self.player.invincible = true;
                self.invincible_distance = 0.0;
                self.emphasis = self.boosted_emphasis;
            }
            PowerUp::Speed => {
                self.speed = (self.speed - self.speed_step).clamp(self.base_speed, self.max_speed);
            }
        }
        log::debug!("Picked up {:?}", power);
        self.events.push(GameEvent::PowerUpCollected(power));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn state() -> GameState {
        GameState::new(&Tuning::default(), 0.5, 1.5)
    }

    #[test]
    fn test_starts_in_menu() {
        let s = state();
        assert_eq!(s.phase, GamePhase::Menu);
        assert_eq!(s.score, 0);
        assert!((s.speed - Tuning::default().base_speed).abs() < 1e-6);
    }

    #[test]
    fn test_transition_table() {
        let mut s = state();
        assert!(!s.restart());
        assert!(!s.return_to_menu());
        assert!(!s.end_run());
        assert!(s.start());
        assert_eq!(s.phase, GamePhase::Playing);
        assert!(!s.start());
        assert!(s.end_run());
        assert_eq!(s.phase, GamePhase::Ended);
        assert!(!s.end_run());
        assert!(s.return_to_menu());
        assert_eq!(s.phase, GamePhase::Menu);
        assert!(s.start());
        assert!(s.end_run());
        assert!(s.restart());
        assert_eq!(s.phase, GamePhase::Playing);
    }

    #[test]
    fn test_score_resets_on_start_and_restart() {
        let mut s = state();
        s.start();
        for _ in 0..5 {
            s.consume_virus();
        }
        s.end_run();
        assert_eq!(s.end_score, 5);
        s.restart();
        assert_eq!(s.score, 0);
        s.consume_virus();
        s.end_run();
        s.return_to_menu();
        assert_eq!(s.score, 0);
        s.start();
        assert_eq!(s.score, 0);
    }

    #[test]
    fn test_end_run_is_idempotent() {
        let mut s = state();
        s.start();
        s.consume_virus();
        assert!(s.end_run());
        s.drain_events();
        assert!(!s.end_run());
        assert!(s.drain_events().is_empty());
        assert_eq!(s.runs, 1);
    }

    #[test]
    fn test_speed_pickup_floors_at_base() {
        let mut s = state();
        s.start();
        let step = Tuning::default().speed_pickup_step;
        // Far enough up that one step stays clear of the floor
        for _ in 0..2000 {
            s.ramp_speed();
        }
        let ramped = s.speed;
        assert!(ramped - step > s.base_speed());
        s.apply_power_up(PowerUp::Speed);
        assert!((s.speed - (ramped - step)).abs() < 1e-6);
        for _ in 0..20 {
            s.apply_power_up(PowerUp::Speed);
        }
        assert_eq!(s.speed, s.base_speed());
    }

    #[test]
    fn test_speed_pickup_near_floor_clamps() {
        let mut s = state();
        s.start();
        let step = Tuning::default().speed_pickup_step;
        // Accumulated ramp lands a hair under base + step
        for _ in 0..1000 {
            s.ramp_speed();
        }
        let ramped = s.speed;
        s.apply_power_up(PowerUp::Speed);
        assert_eq!(s.speed, (ramped - step).max(s.base_speed()));
        assert!(s.speed >= s.base_speed());
    }

    #[test]
    fn test_invincibility_boosts_and_restores_emphasis() {
        let mut s = state();
        s.start();
        s.apply_power_up(PowerUp::Invincible);
        assert!(s.player.invincible);
        assert_eq!(s.emphasis, 1.5);
        s.travel(Tuning::default().invincible_distance);
        assert!(!s.player.invincible);
        assert_eq!(s.emphasis, 0.5);
        assert!(s.drain_events().contains(&GameEvent::InvincibilityEnded));
    }

    #[test]
    fn test_game_over_stops_steering() {
        let mut s = state();
        s.start();
        s.player.vel = glam::Vec3::new(0.1, 0.0, 0.0);
        for _ in 0..100 {
            s.ramp_speed();
        }
        s.end_run();
        assert_eq!(s.player.vel, glam::Vec3::ZERO);
        assert_eq!(s.speed, s.base_speed());
    }

    proptest! {
        #[test]
        fn prop_speed_stays_clamped(ops in prop::collection::vec(0u8..3, 0..400)) {
            let mut s = state();
            s.start();
            for op in ops {
                match op {
                    0 => s.ramp_speed(),
                    1 => s.apply_power_up(PowerUp::Speed),
                    _ => s.apply_power_up(PowerUp::Invincible),
                }
                prop_assert!(s.speed >= s.base_speed() && s.speed <= s.max_speed());
            }
        }

        #[test]
        fn prop_invincible_for_exactly_max_distance(steps in prop::collection::vec(0.01f32..2.0, 1..200)) {
            let max = Tuning::default().invincible_distance;
            let mut s = state();
            s.start();
            s.apply_power_up(PowerUp::Invincible);
            let mut covered = 0.0f32;
            for step in steps {
                s.travel(step);
                covered += step;
                prop_assert_eq!(s.player.invincible, covered < max);
                if covered >= max {
                    break;
                }
            }
        }

        #[test]
        fn prop_high_score_is_max_of_runs(runs in prop::collection::vec(0u32..60, 1..12)) {
            let mut s = state();
            for (i, &score) in runs.iter().enumerate() {
                if i == 0 { s.start(); } else { s.restart(); }
                for _ in 0..score {
                    s.consume_virus();
                }
                s.end_run();
            }
            prop_assert_eq!(s.high_score, *runs.iter().max().unwrap());
            prop_assert_eq!(s.runs as usize, runs.len());
            // The leaderboard's top entry is the high score
            prop_assert_eq!(s.scores.top_score().unwrap_or(0), s.high_score);
        }
    }
}
