// ============================================================================
// Petkeeper Library
// ============================================================================

pub mod commands;
pub mod config;
pub mod core;
pub mod engine;
pub mod interface;
pub mod service;
pub mod shop;
pub mod storage;

// Re-export main types for convenience
pub use config::{KindConfig, KindStats, PetsConfig};
pub use core::{
    Creature, DamageSource, InstanceId, Pet, PetError, PetId, PetKind, PlayerId, Position, Result,
};
pub use engine::{ActiveBinding, DamageRuling, LifecycleEngine};
pub use interface::{BalanceProvider, EffectKind, LevelProvider, LiveHost, StatusEffect};
pub use service::{DeadPetSummary, PetListing, PetService, PetSummary, PurchaseReceipt};
pub use storage::{PetArchive, PetStore, StoredPet};

// ============================================================================
// High-level usage
// ============================================================================
//
// The host environment implements `LiveHost` (and optionally wires in a
// `BalanceProvider` and `LevelProvider`), opens a `PetService` over a data
// file, and starts the ticker:
//
// ```ignore
// let service = PetService::open(PetsConfig::default(), PetArchive::new(path), host)?
//     .with_economy(economy)
//     .with_levels(levels);
// service.start().await?;
// // ... dispatch player commands via `commands::dispatch` ...
// service.shutdown().await?;
// ```
