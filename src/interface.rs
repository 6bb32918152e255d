use crate::config::KindStats;
use crate::core::{InstanceId, PetKind, PlayerId, Position, Result};
use async_trait::async_trait;

/// A status effect the engine grants to an owner while their pet is spawned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusEffect {
    Speed(u32),
    NightVision(u32),
    Invisibility,
}

impl StatusEffect {
    pub fn kind(&self) -> EffectKind {
        match self {
            StatusEffect::Speed(_) => EffectKind::Speed,
            StatusEffect::NightVision(_) => EffectKind::NightVision,
            StatusEffect::Invisibility => EffectKind::Invisibility,
        }
    }
}

/// Effect category, used for removal. Removing an effect the owner does not
/// have is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectKind {
    Speed,
    NightVision,
    Invisibility,
}

/// The balance-holding collaborator. Absence disables priced purchases and
/// revivals; free ones still work.
///
/// Calls are expected to complete in bounded time; an unavailable provider
/// should return an error rather than hang.
#[async_trait]
pub trait BalanceProvider: Send + Sync {
    async fn balance(&self, owner: PlayerId) -> Result<f64>;

    /// Returns `false` when the provider refused the withdrawal.
    async fn withdraw(&self, owner: PlayerId, amount: f64) -> Result<bool>;

    async fn deposit(&self, owner: PlayerId, amount: f64) -> Result<bool>;
}

/// Optional leveling collaborator. Errors and absence both read as level 0.
#[async_trait]
pub trait LevelProvider: Send + Sync {
    async fn level(&self, owner: PlayerId) -> Result<u32>;
}

/// The host environment that renders pets as live entities and exposes the
/// player/world primitives the engine needs.
#[async_trait]
pub trait LiveHost: Send + Sync {
    /// Creates a live instance beside the owner and returns its identifier.
    async fn spawn_instance(
        &self,
        owner: PlayerId,
        kind: PetKind,
        display_name: &str,
        max_health: f64,
        stats: &KindStats,
    ) -> Result<InstanceId>;

    async fn remove_instance(&self, instance: InstanceId) -> Result<()>;

    /// Whether the instance still exists and is alive on the host.
    async fn is_valid(&self, instance: InstanceId) -> bool;

    /// Current and maximum health of the instance, if it exists.
    async fn health(&self, instance: InstanceId) -> Option<(f64, f64)>;

    async fn set_health(&self, instance: InstanceId, health: f64) -> Result<()>;

    async fn set_display_name(&self, instance: InstanceId, name: &str) -> Result<()>;

    async fn position(&self, instance: InstanceId) -> Option<Position>;

    /// `None` when the owner is offline.
    async fn owner_position(&self, owner: PlayerId) -> Option<Position>;

    async fn teleport(&self, instance: InstanceId, to: Position) -> Result<()>;

    async fn apply_effect(&self, owner: PlayerId, effect: StatusEffect) -> Result<()>;

    async fn remove_effect(&self, owner: PlayerId, kind: EffectKind) -> Result<()>;

    /// Delivers a textual message to the owner; dropped if they are offline.
    async fn notify(&self, owner: PlayerId, message: &str);
}
