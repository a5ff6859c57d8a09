//! Rendering seams
//!
//! The simulation never draws. Each frame the controller captures a
//! [`SceneView`] (everything in the player's frame), moves the trailing
//! [`Camera`], and hands both to a [`Renderer`]; a [`PostProcess`] stage gets
//! the emphasis strength and a [`HudSink`] gets the text.

#[cfg(target_arch = "wasm32")]
pub mod canvas;

use glam::{Vec2, Vec3};

use crate::consts::{CAMERA_LERP, CAMERA_TRAIL};
use crate::sim::{EntityClass, EntityKind, GamePhase, GameState, World};

/// Cross-section rings drawn per segment
const RINGS_PER_SEGMENT: usize = 24;
/// Anything closer than this to the camera plane is culled
const NEAR_PLANE: f32 = 0.1;

/// Opacity of the full-frame tint for a post-process strength. Zero at or
/// below the resting emphasis, rising with the boost and capped.
pub fn wash_alpha(strength: f32, resting: f32) -> f32 {
    ((strength - resting).max(0.0) * 0.06).min(0.2)
}

/// Draws a captured scene
pub trait Renderer {
    fn render(&mut self, scene: &SceneView, camera: &Camera);
}

/// Full-screen effect stage (bloom on the web build)
pub trait PostProcess {
    fn set_strength(&mut self, strength: f32);
    /// Called once per frame after the scene is drawn
    fn render(&mut self);
}

/// One-way text/visibility sink (the DOM on the web build)
pub trait HudSink {
    fn show(&mut self, hud: &Hud);
}

/// Perspective camera trailing the player
#[derive(Debug, Clone)]
pub struct Camera {
    pub pos: Vec3,
    /// Vertical field of view (radians)
    pub fov_y: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            pos: Vec3::new(0.0, 0.0, CAMERA_TRAIL),
            fov_y: 50f32.to_radians(),
        }
    }
}

impl Camera {
    /// Snap over the player, ease back toward the tube axis, and sit a fixed
    /// distance behind
    pub fn follow(&mut self, player: Vec3) {
        let over = Vec2::new(player.x, player.y);
        let eased = over.lerp(Vec2::ZERO, CAMERA_LERP);
        self.pos = Vec3::new(eased.x, eased.y, player.z + CAMERA_TRAIL);
    }

    /// Project a player-frame point to NDC (x, y in [-1, 1] when on screen).
    /// Returns the NDC position and the screen scale of one world unit, or
    /// None for points behind the camera.
    pub fn project(&self, point: Vec3, aspect: f32) -> Option<(Vec2, f32)> {
        let rel = point - self.pos;
        let depth = -rel.z;
        if depth < NEAR_PLANE {
            return None;
        }
        let focal = 1.0 / (self.fov_y * 0.5).tan();
        let scale = focal / depth;
        Some((Vec2::new(rel.x * scale / aspect, rel.y * scale), scale))
    }
}

/// What a sprite looks like
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpriteKind {
    Entity(EntityKind),
    Player { invincible: bool },
}

/// A sphere to draw
#[derive(Debug, Clone, Copy)]
pub struct Sprite {
    pub kind: SpriteKind,
    /// Player-frame position
    pub pos: Vec3,
    pub radius: f32,
}

/// Snapshot of everything visible, far to near
#[derive(Debug, Clone, Default)]
pub struct SceneView {
    /// Tube cross-section centers along the window
    pub rings: Vec<Vec3>,
    pub ring_radius: f32,
    /// Sorted far to near for painter's order
    pub sprites: Vec<Sprite>,
    /// Post-process strength for this frame
    pub emphasis: f32,
}

impl SceneView {
    pub fn capture(world: &World) -> Self {
        let tube = &world.tube;
        let mut rings = Vec::new();
        let mut sprites = Vec::new();

        for seg in tube.segments() {
            let length = seg.path.length();
            for i in 0..=RINGS_PER_SEGMENT {
                let s = length * i as f32 / RINGS_PER_SEGMENT as f32;
                let center = seg.root.to_view(seg.path.curve.point_at(s));
                rings.push(tube.player_frame(center));
            }
            for class in EntityClass::ALL {
                sprites.extend(seg.entities(class).iter().map(|e| Sprite {
                    kind: SpriteKind::Entity(e.kind),
                    pos: tube.player_frame(e.pos),
                    radius: e.radius,
                }));
            }
        }

        let player = &world.state.player;
        sprites.push(Sprite {
            kind: SpriteKind::Player {
                invincible: player.invincible,
            },
            pos: player.pos,
            radius: player.radius,
        });
        sprites.sort_by(|a, b| a.pos.z.total_cmp(&b.pos.z));
        rings.sort_by(|a, b| a.z.total_cmp(&b.z));

        Self {
            rings,
            ring_radius: world.tuning().tube_radius,
            sprites,
            emphasis: world.state.emphasis,
        }
    }
}

/// HUD contents after a frame
#[derive(Debug, Clone, PartialEq)]
pub struct Hud {
    pub phase: GamePhase,
    pub score: u32,
    pub end_score: u32,
    pub high_score: u32,
    pub speed: f32,
    pub distance: f32,
    pub invincible: bool,
    pub sound_on: bool,
}

impl Hud {
    pub fn capture(state: &GameState, sound_on: bool) -> Self {
        Self {
            phase: state.phase,
            score: state.score,
            end_score: state.end_score,
            high_score: state.high_score,
            speed: state.speed,
            distance: state.distance,
            invincible: state.player.invincible,
            sound_on,
        }
    }

    pub fn show_start_menu(&self) -> bool {
        self.phase == GamePhase::Menu
    }

    pub fn show_score(&self) -> bool {
        self.phase == GamePhase::Playing
    }

    pub fn show_end_menu(&self) -> bool {
        self.phase == GamePhase::Ended
    }

    /// Forward speed as shown to the player
    pub fn speed_text(&self) -> String {
        format!("{:.0}", self.speed * 100.0)
    }

    pub fn distance_text(&self) -> String {
        format!("{:.0}m", self.distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::PowerUp;
    use crate::tuning::Tuning;

    #[test]
    fn test_camera_trails_player() {
        let mut cam = Camera::default();
        cam.follow(Vec3::new(1.0, -0.5, 0.0));
        assert!((cam.pos.x - 0.9).abs() < 1e-6);
        assert!((cam.pos.y + 0.45).abs() < 1e-6);
        assert!((cam.pos.z - CAMERA_TRAIL).abs() < 1e-6);
    }

    #[test]
    fn test_projection() {
        let cam = Camera::default();
        let (ndc, _) = cam.project(Vec3::new(0.0, 0.0, -5.0), 1.0).unwrap();
        assert!(ndc.length() < 1e-6);

        // Right and up stay right and up
        let (ndc, _) = cam.project(Vec3::new(0.5, 0.5, -5.0), 1.0).unwrap();
        assert!(ndc.x > 0.0 && ndc.y > 0.0);

        // Farther is smaller
        let (_, near) = cam.project(Vec3::new(0.0, 0.0, -2.0), 1.0).unwrap();
        let (_, far) = cam.project(Vec3::new(0.0, 0.0, -20.0), 1.0).unwrap();
        assert!(far < near);

        // Behind the camera
        assert!(cam.project(Vec3::new(0.0, 0.0, 3.0), 1.0).is_none());
    }

    #[test]
    fn test_scene_capture() {
        let world = World::new(Tuning::default(), 4, 0.5, 1.5);
        let scene = SceneView::capture(&world);
        let entities: usize = world.tube.segments().map(|s| s.total()).sum();
        assert_eq!(scene.sprites.len(), entities + 1);
        assert!(scene
            .sprites
            .iter()
            .any(|s| matches!(s.kind, SpriteKind::Player { .. })));
        assert!(scene.sprites.windows(2).all(|w| w[0].pos.z <= w[1].pos.z));
        assert_eq!(scene.rings.len(), world.tube.segment_count() * (RINGS_PER_SEGMENT + 1));
    }

    #[test]
    fn test_hud_menus() {
        let mut state = GameState::new(&Tuning::default(), 0.5, 1.5);
        let hud = Hud::capture(&state, false);
        assert!(hud.show_start_menu() && !hud.show_score() && !hud.show_end_menu());
        state.start();
        assert!(Hud::capture(&state, false).show_score());
        state.end_run();
        assert!(Hud::capture(&state, false).show_end_menu());
        assert_eq!(Hud::capture(&state, false).speed_text(), "10");
    }

    #[test]
    fn test_hud_tracks_invincibility() {
        let mut state = GameState::new(&Tuning::default(), 0.5, 1.5);
        state.start();
        assert!(!Hud::capture(&state, true).invincible);
        state.apply_power_up(PowerUp::Invincible);
        assert!(Hud::capture(&state, true).invincible);
    }

    #[test]
    fn test_wash_follows_resting_emphasis() {
        // Nothing at rest, whatever the resting level is
        assert_eq!(wash_alpha(0.5, 0.5), 0.0);
        assert_eq!(wash_alpha(0.8, 0.8), 0.0);
        assert_eq!(wash_alpha(0.3, 0.8), 0.0);
        // Same boost over a higher rest gives the same tint
        assert!((wash_alpha(1.5, 0.5) - wash_alpha(1.8, 0.8)).abs() < 1e-6);
        assert!(wash_alpha(1.5, 0.5) > 0.0);
        assert_eq!(wash_alpha(100.0, 0.5), 0.2);
    }
}
