//! In-memory collaborator doubles shared by the integration suites.

#![allow(dead_code)]

use async_trait::async_trait;
use petkeeper::{
    BalanceProvider, EffectKind, InstanceId, KindStats, LevelProvider, LiveHost, PetError,
    PetKind, PlayerId, Position, Result, StatusEffect,
};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub struct FakeInstance {
    pub owner: PlayerId,
    pub kind: PetKind,
    pub display_name: String,
    pub health: f64,
    pub max_health: f64,
    pub position: Position,
    pub alive: bool,
}

/// A world host that keeps everything in maps: instances, online owners,
/// owner effects, and delivered messages.
#[derive(Default)]
pub struct MemoryHost {
    instances: Mutex<HashMap<InstanceId, FakeInstance>>,
    owners: Mutex<HashMap<PlayerId, Position>>,
    effects: Mutex<HashMap<PlayerId, HashMap<EffectKind, StatusEffect>>>,
    messages: Mutex<Vec<(PlayerId, String)>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Puts an owner online at the given position.
    pub fn place_owner(&self, owner: PlayerId, position: Position) {
        self.owners.lock().unwrap().insert(owner, position);
    }

    pub fn remove_owner(&self, owner: PlayerId) {
        self.owners.lock().unwrap().remove(&owner);
    }

    pub fn instance_of(&self, owner: PlayerId) -> Option<InstanceId> {
        self.instances
            .lock()
            .unwrap()
            .iter()
            .find(|(_, i)| i.owner == owner && i.alive)
            .map(|(id, _)| *id)
    }

    pub fn instance(&self, id: InstanceId) -> Option<FakeInstance> {
        self.instances.lock().unwrap().get(&id).cloned()
    }

    pub fn set_instance_health(&self, id: InstanceId, health: f64) {
        if let Some(instance) = self.instances.lock().unwrap().get_mut(&id) {
            instance.health = health.clamp(0.0, instance.max_health);
        }
    }

    /// Marks the instance as killed, as the host would after lethal damage.
    pub fn kill_instance(&self, id: InstanceId) {
        if let Some(instance) = self.instances.lock().unwrap().get_mut(&id) {
            instance.alive = false;
            instance.health = 0.0;
        }
    }

    pub fn has_effect(&self, owner: PlayerId, kind: EffectKind) -> bool {
        self.effects
            .lock()
            .unwrap()
            .get(&owner)
            .is_some_and(|m| m.contains_key(&kind))
    }

    pub fn messages_for(&self, owner: PlayerId) -> Vec<String> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter(|(o, _)| *o == owner)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

#[async_trait]
impl LiveHost for MemoryHost {
    async fn spawn_instance(
        &self,
        owner: PlayerId,
        kind: PetKind,
        display_name: &str,
        max_health: f64,
        _stats: &KindStats,
    ) -> Result<InstanceId> {
        let position = self
            .owners
            .lock()
            .unwrap()
            .get(&owner)
            .map(|p| p.beside())
            .unwrap_or(Position::new(0.0, 64.0, 0.0));
        let id = InstanceId::random();
        self.instances.lock().unwrap().insert(
            id,
            FakeInstance {
                owner,
                kind,
                display_name: display_name.to_string(),
                health: max_health,
                max_health,
                position,
                alive: true,
            },
        );
        Ok(id)
    }

    async fn remove_instance(&self, instance: InstanceId) -> Result<()> {
        self.instances.lock().unwrap().remove(&instance);
        Ok(())
    }

    async fn is_valid(&self, instance: InstanceId) -> bool {
        self.instances
            .lock()
            .unwrap()
            .get(&instance)
            .is_some_and(|i| i.alive)
    }

    async fn health(&self, instance: InstanceId) -> Option<(f64, f64)> {
        self.instances
            .lock()
            .unwrap()
            .get(&instance)
            .filter(|i| i.alive)
            .map(|i| (i.health, i.max_health))
    }

    async fn set_health(&self, instance: InstanceId, health: f64) -> Result<()> {
        let mut instances = self.instances.lock().unwrap();
        let instance = instances
            .get_mut(&instance)
            .ok_or_else(|| PetError::Host("no such instance".to_string()))?;
        instance.health = health.clamp(0.0, instance.max_health);
        Ok(())
    }

    async fn set_display_name(&self, instance: InstanceId, name: &str) -> Result<()> {
        let mut instances = self.instances.lock().unwrap();
        let instance = instances
            .get_mut(&instance)
            .ok_or_else(|| PetError::Host("no such instance".to_string()))?;
        instance.display_name = name.to_string();
        Ok(())
    }

    async fn position(&self, instance: InstanceId) -> Option<Position> {
        self.instances
            .lock()
            .unwrap()
            .get(&instance)
            .map(|i| i.position)
    }

    async fn owner_position(&self, owner: PlayerId) -> Option<Position> {
        self.owners.lock().unwrap().get(&owner).copied()
    }

    async fn teleport(&self, instance: InstanceId, to: Position) -> Result<()> {
        let mut instances = self.instances.lock().unwrap();
        let instance = instances
            .get_mut(&instance)
            .ok_or_else(|| PetError::Host("no such instance".to_string()))?;
        instance.position = to;
        Ok(())
    }

    async fn apply_effect(&self, owner: PlayerId, effect: StatusEffect) -> Result<()> {
        self.effects
            .lock()
            .unwrap()
            .entry(owner)
            .or_default()
            .insert(effect.kind(), effect);
        Ok(())
    }

    async fn remove_effect(&self, owner: PlayerId, kind: EffectKind) -> Result<()> {
        if let Some(effects) = self.effects.lock().unwrap().get_mut(&owner) {
            effects.remove(&kind);
        }
        Ok(())
    }

    async fn notify(&self, owner: PlayerId, message: &str) {
        if self.owners.lock().unwrap().contains_key(&owner) {
            self.messages
                .lock()
                .unwrap()
                .push((owner, message.to_string()));
        }
    }
}

/// A balance provider over a map. With `honest` unset it reports successful
/// withdrawals without touching the balance, which purchase verification
/// must catch.
pub struct MemoryEconomy {
    balances: Mutex<HashMap<PlayerId, f64>>,
    honest: bool,
}

impl MemoryEconomy {
    pub fn new() -> Self {
        Self {
            balances: Mutex::new(HashMap::new()),
            honest: true,
        }
    }

    pub fn dishonest() -> Self {
        Self {
            balances: Mutex::new(HashMap::new()),
            honest: false,
        }
    }

    pub fn credit(&self, owner: PlayerId, amount: f64) {
        *self.balances.lock().unwrap().entry(owner).or_insert(0.0) += amount;
    }

    pub fn balance_of(&self, owner: PlayerId) -> f64 {
        self.balances
            .lock()
            .unwrap()
            .get(&owner)
            .copied()
            .unwrap_or(0.0)
    }
}

#[async_trait]
impl BalanceProvider for MemoryEconomy {
    async fn balance(&self, owner: PlayerId) -> Result<f64> {
        Ok(self.balance_of(owner))
    }

    async fn withdraw(&self, owner: PlayerId, amount: f64) -> Result<bool> {
        let mut balances = self.balances.lock().unwrap();
        let balance = balances.entry(owner).or_insert(0.0);
        if *balance < amount {
            return Ok(false);
        }
        if self.honest {
            *balance -= amount;
        }
        Ok(true)
    }

    async fn deposit(&self, owner: PlayerId, amount: f64) -> Result<bool> {
        *self.balances.lock().unwrap().entry(owner).or_insert(0.0) += amount;
        Ok(true)
    }
}

/// A level provider that answers the same level for everyone.
pub struct FixedLevels(pub u32);

#[async_trait]
impl LevelProvider for FixedLevels {
    async fn level(&self, _owner: PlayerId) -> Result<u32> {
        Ok(self.0)
    }
}
