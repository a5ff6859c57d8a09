//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - One step per frame, distance-based (no wall clock)
//! - Seeded RNG only
//! - Stable iteration order (segment window order, then insertion order)
//! - No rendering, audio or platform dependencies

pub mod collision;
pub mod curve;
pub mod entity;
pub mod player;
pub mod spawner;
pub mod state;
pub mod tick;
pub mod tube;

pub use collision::{CollisionReport, CollisionRules, resolve_collisions};
pub use curve::{CurveGenerator, PathEnd, SegmentPath, TubeCurve, Turn};
pub use entity::{Entity, EntityClass, EntityKind, PowerUp};
pub use player::Player;
pub use spawner::Spawner;
pub use state::{GameEvent, GamePhase, GameState};
pub use tick::{TickInput, TickReport, World, tick};
pub use tube::{AdvanceReport, EntitySlot, LOOKAHEAD, Segment, SegmentRoot, TubeManager};
