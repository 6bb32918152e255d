//! Lifecycle engine: the active-pet index, spawn/despawn, the periodic health
//! tick, damage arbitration, and proximity correction.
//!
//! The engine never owns pet records; it keeps a transient secondary index
//! (owner -> binding, instance -> owner) that moves in lockstep with the
//! store's alive set. Any record leaving the alive set leaves the index in the
//! same logical step.

use crate::config::PetsConfig;
use crate::core::{DamageSource, InstanceId, PetError, PetId, PetKind, PlayerId, Result};
use crate::interface::{EffectKind, LiveHost, StatusEffect};
use crate::storage::PetStore;
use std::collections::HashMap;

/// One spawned pet: the record it backs and the live instance it is bound to.
#[derive(Debug, Clone, Copy)]
pub struct ActiveBinding {
    pub pet: PetId,
    pub kind: PetKind,
    pub instance: InstanceId,
}

/// Verdict of damage arbitration for an incoming damage event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageRuling {
    /// The target is not a tracked pet; the host proceeds as usual.
    NotAPet,
    Allow,
    /// Owners cannot hurt their own pets; the owner gets told so.
    RejectOwnPet,
    /// Environment and non-hostile creatures never hurt pets.
    Reject,
}

#[derive(Default)]
pub struct LifecycleEngine {
    active: HashMap<PlayerId, ActiveBinding>,
    by_instance: HashMap<InstanceId, PlayerId>,
}

impl LifecycleEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self, owner: PlayerId) -> Option<&ActiveBinding> {
        self.active.get(&owner)
    }

    pub fn owner_of(&self, instance: InstanceId) -> Option<PlayerId> {
        self.by_instance.get(&instance).copied()
    }

    pub fn is_pet_instance(&self, instance: InstanceId) -> bool {
        self.by_instance.contains_key(&instance)
    }

    /// Spawns the given alive record as a live instance, applies the kind's
    /// stat descriptor and passive effects, and binds it in both the store
    /// and the index.
    pub async fn spawn(
        &mut self,
        store: &mut PetStore,
        config: &PetsConfig,
        host: &dyn LiveHost,
        owner: PlayerId,
        id: PetId,
    ) -> Result<()> {
        if self.active.contains_key(&owner) {
            return Err(PetError::AlreadySpawned);
        }

        let pet = store
            .find_alive(owner, id)
            .ok_or_else(|| PetError::PetNotFound(id.0.to_string()))?;
        let kind = pet.kind();
        let display_name = pet.display_name().to_string();
        let kind_config = config
            .kind(kind)
            .ok_or_else(|| PetError::InvalidKind(kind.to_string()))?;

        let instance = host
            .spawn_instance(
                owner,
                kind,
                &display_name,
                kind_config.max_health,
                &kind_config.stats,
            )
            .await?;

        if let Some(pet) = store.find_alive_mut(owner, id) {
            pet.set_max_health(kind_config.max_health);
            pet.set_current_health(kind_config.max_health);
            pet.bind_instance(instance);
        }
        self.active.insert(
            owner,
            ActiveBinding {
                pet: id,
                kind,
                instance,
            },
        );
        self.by_instance.insert(instance, owner);

        if let Some(level) = kind_config.speed_boost_level {
            host.apply_effect(owner, StatusEffect::Speed(level)).await?;
        }
        if let Some(level) = kind_config.night_vision_level {
            host.apply_effect(owner, StatusEffect::NightVision(level))
                .await?;
        }

        host.notify(
            owner,
            &format!("Your pet {} has been spawned!", display_name),
        )
        .await;
        Ok(())
    }

    /// Removes the live instance, clears the effects granted at spawn, and
    /// clears both index entries. No-op if nothing is spawned.
    pub async fn despawn(&mut self, store: &mut PetStore, host: &dyn LiveHost, owner: PlayerId) {
        let Some(binding) = self.active.remove(&owner) else {
            return;
        };
        self.by_instance.remove(&binding.instance);

        if let Some(pet) = store.find_alive_mut(owner, binding.pet) {
            pet.clear_instance();
        }
        if let Err(e) = host.remove_instance(binding.instance).await {
            log::warn!("Failed to remove instance {}: {}", binding.instance, e);
        }
        self.clear_owner_effects(host, owner).await;
    }

    pub async fn despawn_all(&mut self, store: &mut PetStore, host: &dyn LiveHost) {
        for owner in self.active.keys().copied().collect::<Vec<_>>() {
            self.despawn(store, host, owner).await;
        }
    }

    async fn clear_owner_effects(&self, host: &dyn LiveHost, owner: PlayerId) {
        for kind in [
            EffectKind::Speed,
            EffectKind::NightVision,
            EffectKind::Invisibility,
        ] {
            if let Err(e) = host.remove_effect(owner, kind).await {
                log::warn!("Failed to remove {:?} effect from {}: {}", kind, owner, e);
            }
        }
    }

    /// One sweep of the health tick over every active pair. A failing pair is
    /// logged and skipped; it never aborts the rest of the sweep.
    pub async fn tick(&mut self, store: &mut PetStore, config: &PetsConfig, host: &dyn LiveHost) {
        let pairs: Vec<(PlayerId, ActiveBinding)> =
            self.active.iter().map(|(o, b)| (*o, *b)).collect();

        for (owner, binding) in pairs {
            // A gone or invalid instance is an implicit death, not an error.
            let health = if host.is_valid(binding.instance).await {
                host.health(binding.instance).await
            } else {
                None
            };
            let Some((current, max)) = health else {
                self.handle_death(store, config, host, owner, binding).await;
                continue;
            };

            // The flee check runs on the refreshed health, before this tick's
            // heal step can lift a pet back over the threshold.
            if max > 0.0 && current / max <= config.flee_threshold {
                if self
                    .flee_and_despawn(store, config, host, owner, binding)
                    .await
                {
                    continue;
                }
            }

            let mut current = current;
            if current < max {
                current = (current + config.heal_rate).min(max);
                if let Err(e) = host.set_health(binding.instance, current).await {
                    log::warn!("Failed to heal pet of {}: {}", owner, e);
                    continue;
                }
            }
            store.update_health(owner, binding.pet, current, max);

            self.correct_proximity(config, host, owner).await;
        }
    }

    async fn handle_death(
        &mut self,
        store: &mut PetStore,
        config: &PetsConfig,
        host: &dyn LiveHost,
        owner: PlayerId,
        binding: ActiveBinding,
    ) {
        self.active.remove(&owner);
        self.by_instance.remove(&binding.instance);
        self.clear_owner_effects(host, owner).await;

        let display_name = store
            .find_alive(owner, binding.pet)
            .map(|p| p.display_name().to_string())
            .unwrap_or_default();
        store.mark_dead(owner, binding.pet);

        let hours = config.revival_window_ms / 3_600_000;
        host.notify(
            owner,
            &format!(
                "Your pet has died! Use 'pet revive {}' within {} hours to revive it for ${:.0}.",
                display_name, hours, config.revive_cost
            ),
        )
        .await;
        log::info!("Pet of player {} died", owner);
    }

    /// Deliberate forced retreat on low health: relocate the instance away
    /// from the owner along the owner -> pet vector, then despawn. Skipped
    /// when the owner is offline; returns whether the pet actually fled.
    async fn flee_and_despawn(
        &mut self,
        store: &mut PetStore,
        config: &PetsConfig,
        host: &dyn LiveHost,
        owner: PlayerId,
        binding: ActiveBinding,
    ) -> bool {
        let Some(owner_pos) = host.owner_position(owner).await else {
            return false;
        };
        let Some(pet_pos) = host.position(binding.instance).await else {
            return false;
        };
        let Some(target) = pet_pos.away_from(&owner_pos, config.flee_distance) else {
            return false;
        };

        if let Err(e) = host.teleport(binding.instance, target).await {
            log::warn!("Flee teleport failed for pet of {}: {}", owner, e);
        }
        host.notify(owner, "Your pet is low on health and has run away!")
            .await;
        self.despawn(store, host, owner).await;
        true
    }

    /// Brings an instance back next to its owner once it strays beyond the
    /// configured follow distance. Runs on demand and on tick.
    pub async fn correct_proximity(
        &self,
        config: &PetsConfig,
        host: &dyn LiveHost,
        owner: PlayerId,
    ) {
        let Some(binding) = self.active.get(&owner) else {
            return;
        };
        let Some(owner_pos) = host.owner_position(owner).await else {
            return;
        };
        let Some(pet_pos) = host.position(binding.instance).await else {
            return;
        };
        if pet_pos.horizontal_distance(&owner_pos) > config.follow_distance {
            if let Err(e) = host.teleport(binding.instance, owner_pos.beside()).await {
                log::warn!("Recall teleport failed for pet of {}: {}", owner, e);
            }
        }
    }

    /// Damage to a spawned pet is permitted only from a player other than the
    /// owner or from a hostile creature. With damage immunity disabled, every
    /// source is allowed through.
    pub fn arbitrate_damage(
        &self,
        config: &PetsConfig,
        instance: InstanceId,
        source: DamageSource,
    ) -> DamageRuling {
        let Some(owner) = self.owner_of(instance) else {
            return DamageRuling::NotAPet;
        };
        if !config.prevent_damage {
            return DamageRuling::Allow;
        }
        match source {
            DamageSource::Player(attacker) if attacker == owner => DamageRuling::RejectOwnPet,
            DamageSource::Player(_) => DamageRuling::Allow,
            DamageSource::Creature(creature) if creature.is_hostile() => DamageRuling::Allow,
            DamageSource::Creature(_) | DamageSource::Environment => DamageRuling::Reject,
        }
    }

    /// Toggles the fox's sneak invisibility for the owner.
    pub async fn handle_sneak(
        &self,
        config: &PetsConfig,
        host: &dyn LiveHost,
        owner: PlayerId,
        sneaking: bool,
    ) {
        let Some(binding) = self.active.get(&owner) else {
            return;
        };
        let grants_invisibility = config
            .kind(binding.kind)
            .is_some_and(|kc| kc.invisibility_on_sneak);
        if !grants_invisibility {
            return;
        }
        let result = if sneaking {
            host.apply_effect(owner, StatusEffect::Invisibility).await
        } else {
            host.remove_effect(owner, EffectKind::Invisibility).await
        };
        if let Err(e) = result {
            log::warn!("Sneak effect toggle failed for {}: {}", owner, e);
        }
    }

    /// Extra lives the owner's active pet grants; the counter itself is
    /// tracked by the host.
    pub fn extra_lives(&self, config: &PetsConfig, owner: PlayerId) -> u32 {
        self.active
            .get(&owner)
            .and_then(|b| config.kind(b.kind))
            .map(|kc| kc.extra_lives)
            .unwrap_or(0)
    }
}
