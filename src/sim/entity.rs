//! Things that float in the vessel

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Antibody power-up flavours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerUp {
    /// Clots stop being fatal for a while
    Invincible,
    /// Knocks the forward speed back down
    Speed,
}

/// Entity variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Virus,
    Clot,
    RedCell,
    Antibody(PowerUp),
}

impl EntityKind {
    #[inline]
    pub fn class(self) -> EntityClass {
        match self {
            EntityKind::Virus => EntityClass::Virus,
            EntityKind::Clot => EntityClass::Clot,
            EntityKind::RedCell => EntityClass::RedCell,
            EntityKind::Antibody(_) => EntityClass::Antibody,
        }
    }
}

/// Collection partition an entity lives in. Declaration order is scan order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityClass {
    Virus,
    Clot,
    RedCell,
    Antibody,
}

impl EntityClass {
    pub const COUNT: usize = 4;
    /// Collision scan order
    pub const ALL: [EntityClass; Self::COUNT] = [
        EntityClass::Virus,
        EntityClass::Clot,
        EntityClass::RedCell,
        EntityClass::Antibody,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// A spawned entity. `pos` is in the tube's view frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: u32,
    pub kind: EntityKind,
    pub pos: Vec3,
    pub radius: f32,
}

impl Entity {
    #[inline]
    pub fn class(&self) -> EntityClass {
        self.kind.class()
    }

    /// Power-up carried by an antibody
    pub fn power_up(&self) -> Option<PowerUp> {
        match self.kind {
            EntityKind::Antibody(p) => Some(p),
            _ => None,
        }
    }
}
