use crate::core::{PetError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Identifies a pet owner (a player).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifies a live (spawned) instance on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceId(pub Uuid);

impl InstanceId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Runtime-only identity of a pet record. Regenerated on load, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PetId(pub Uuid);

impl PetId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

// ============================================================================
// Pet Kinds
// ============================================================================

/// The fixed set of companion kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PetKind {
    Horse,
    Dog,
    Cat,
    Wolf,
    Parrot,
    Fox,
}

impl PetKind {
    pub const ALL: [PetKind; 6] = [
        PetKind::Horse,
        PetKind::Dog,
        PetKind::Cat,
        PetKind::Wolf,
        PetKind::Parrot,
        PetKind::Fox,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PetKind::Horse => "horse",
            PetKind::Dog => "dog",
            PetKind::Cat => "cat",
            PetKind::Wolf => "wolf",
            PetKind::Parrot => "parrot",
            PetKind::Fox => "fox",
        }
    }
}

impl fmt::Display for PetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PetKind {
    type Err = PetError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "horse" => Ok(PetKind::Horse),
            "dog" => Ok(PetKind::Dog),
            "cat" => Ok(PetKind::Cat),
            "wolf" => Ok(PetKind::Wolf),
            "parrot" => Ok(PetKind::Parrot),
            "fox" => Ok(PetKind::Fox),
            other => Err(PetError::InvalidKind(other.to_string())),
        }
    }
}

// ============================================================================
// Geometry
// ============================================================================

/// A point in the host world. Flee and follow distances are measured on the
/// horizontal (x, z) plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn horizontal_distance(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        (dx * dx + dz * dz).sqrt()
    }

    /// A point `magnitude` units further along the `from` -> `self` direction,
    /// measured on the horizontal plane. Returns `None` when the two points
    /// coincide and no direction exists.
    pub fn away_from(&self, from: &Position, magnitude: f64) -> Option<Position> {
        let dx = self.x - from.x;
        let dz = self.z - from.z;
        let distance = (dx * dx + dz * dz).sqrt();
        if distance <= f64::EPSILON {
            return None;
        }
        Some(Position::new(
            self.x + (dx / distance) * magnitude,
            self.y,
            self.z + (dz / distance) * magnitude,
        ))
    }

    /// The spot where instances are placed next to their owner.
    pub fn beside(&self) -> Position {
        Position::new(self.x + 2.0, self.y, self.z + 2.0)
    }
}

// ============================================================================
// Damage Sources
// ============================================================================

/// Creature categories known to the host. Spawned pets accept damage only from
/// hostile ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Creature {
    Zombie,
    Skeleton,
    Creeper,
    Spider,
    Enderman,
    Witch,
    Blaze,
    Slime,
    MagmaCube,
    Phantom,
    Ghast,
    Shulker,
    EnderDragon,
    Hoglin,
    Zoglin,
    PiglinBrute,
    Vex,
    Evoker,
    Vindicator,
    Pillager,
    Ravager,
    Wither,
    WitherSkeleton,
    // Non-hostile creatures a pet may still meet.
    Cow,
    Sheep,
    Pig,
    Chicken,
    Villager,
    IronGolem,
}

impl Creature {
    pub fn is_hostile(&self) -> bool {
        !matches!(
            self,
            Creature::Cow
                | Creature::Sheep
                | Creature::Pig
                | Creature::Chicken
                | Creature::Villager
                | Creature::IronGolem
        )
    }
}

/// Where a damage event originated. Projectiles are resolved to their shooter
/// by the host before arbitration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DamageSource {
    Player(PlayerId),
    Creature(Creature),
    /// Fall, fire, lava, drowning, suffocation, void, magic, lightning, ...
    Environment,
}
