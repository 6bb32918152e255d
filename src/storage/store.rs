//! Authoritative in-memory pet collection, partitioned into alive and dead
//! sets per owner and written through to the snapshot archive.

use crate::core::{Pet, PetId, PetKind, PlayerId, Result};
use crate::storage::persistence::{PetArchive, StoredPet};
use chrono::Utc;
use std::collections::HashMap;

pub struct PetStore {
    alive: HashMap<PlayerId, Vec<Pet>>,
    dead: HashMap<PlayerId, Vec<Pet>>,
    archive: Option<PetArchive>,
}

impl PetStore {
    /// A store without durable backing. In-memory state only.
    pub fn in_memory() -> Self {
        Self {
            alive: HashMap::new(),
            dead: HashMap::new(),
            archive: None,
        }
    }

    /// Opens a store backed by `archive`, reloading whatever it holds. A
    /// record found with a death timestamp lands in the dead set regardless
    /// of stored position.
    pub fn open(archive: PetArchive) -> Result<Self> {
        let mut store = Self {
            alive: HashMap::new(),
            dead: HashMap::new(),
            archive: Some(archive),
        };
        store.load()?;
        Ok(store)
    }

    fn load(&mut self) -> Result<()> {
        let Some(archive) = &self.archive else {
            return Ok(());
        };
        let records = archive.load()?;
        self.alive.clear();
        self.dead.clear();
        for (owner, slots) in records {
            for stored in slots {
                let pet = stored.into_pet(owner);
                if pet.is_dead() {
                    self.dead.entry(owner).or_default().push(pet);
                } else {
                    self.alive.entry(owner).or_default().push(pet);
                }
            }
        }
        Ok(())
    }

    /// Writes the full collection to the archive. No-op without backing.
    pub fn persist(&self) -> Result<()> {
        let Some(archive) = &self.archive else {
            return Ok(());
        };
        let mut records: HashMap<PlayerId, Vec<StoredPet>> = HashMap::new();
        for (owner, pets) in &self.alive {
            records
                .entry(*owner)
                .or_default()
                .extend(pets.iter().map(StoredPet::from_pet));
        }
        for (owner, pets) in &self.dead {
            records
                .entry(*owner)
                .or_default()
                .extend(pets.iter().map(StoredPet::from_pet));
        }
        archive.save(&records)
    }

    /// Write-through persist; failures are logged, in-memory state stays
    /// authoritative until the next successful persist.
    fn persist_logged(&self) {
        if let Err(e) = self.persist() {
            log::warn!("Pet data persist failed: {}", e);
        }
    }

    pub fn add_pet(&mut self, pet: Pet) {
        self.alive.entry(pet.owner()).or_default().push(pet);
        self.persist_logged();
    }

    pub fn alive(&self, owner: PlayerId) -> &[Pet] {
        self.alive.get(&owner).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn dead(&self, owner: PlayerId) -> &[Pet] {
        self.dead.get(&owner).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_alive_kind(&self, owner: PlayerId, kind: PetKind) -> bool {
        self.alive(owner).iter().any(|p| p.kind() == kind)
    }

    pub fn find_alive(&self, owner: PlayerId, id: PetId) -> Option<&Pet> {
        self.alive(owner).iter().find(|p| p.id() == id)
    }

    pub fn find_alive_mut(&mut self, owner: PlayerId, id: PetId) -> Option<&mut Pet> {
        self.alive
            .get_mut(&owner)
            .and_then(|pets| pets.iter_mut().find(|p| p.id() == id))
    }

    pub fn find_alive_by_kind(&self, owner: PlayerId, kind: PetKind) -> Option<&Pet> {
        self.alive(owner).iter().find(|p| p.kind() == kind)
    }

    pub fn find_alive_by_generated_name(&self, owner: PlayerId, name: &str) -> Option<&Pet> {
        self.alive(owner)
            .iter()
            .find(|p| p.generated_name().eq_ignore_ascii_case(name))
    }

    /// Alive lookup by generated name first, display name second.
    pub fn find_alive_by_name(&self, owner: PlayerId, name: &str) -> Option<&Pet> {
        self.find_alive_by_generated_name(owner, name).or_else(|| {
            self.alive(owner)
                .iter()
                .find(|p| p.display_name().eq_ignore_ascii_case(name))
        })
    }

    /// Dead lookup by display or generated name, case-insensitive.
    pub fn find_dead_by_name(&self, owner: PlayerId, name: &str) -> Option<&Pet> {
        self.dead(owner).iter().find(|p| {
            p.display_name().eq_ignore_ascii_case(name)
                || p.generated_name().eq_ignore_ascii_case(name)
        })
    }

    /// Moves a record from the alive set to the dead set and stamps the
    /// current time. No-op if the record is already dead or unknown.
    pub fn mark_dead(&mut self, owner: PlayerId, id: PetId) {
        let Some(pets) = self.alive.get_mut(&owner) else {
            return;
        };
        let Some(index) = pets.iter().position(|p| p.id() == id) else {
            return;
        };
        let mut pet = pets.remove(index);
        pet.clear_instance();
        pet.set_died_at(Some(Utc::now().timestamp_millis()));
        self.dead.entry(owner).or_default().push(pet);
        self.persist_logged();
    }

    /// Moves a record from the dead set back to the alive set with full
    /// health. No-op if the record is not in the dead set.
    pub fn revive(&mut self, owner: PlayerId, id: PetId) {
        let Some(pets) = self.dead.get_mut(&owner) else {
            return;
        };
        let Some(index) = pets.iter().position(|p| p.id() == id) else {
            return;
        };
        let mut pet = pets.remove(index);
        if pets.is_empty() {
            self.dead.remove(&owner);
        }
        pet.revive();
        self.alive.entry(owner).or_default().push(pet);
        self.persist_logged();
    }

    /// Deletes a record from both sets. Returns the removed record, and
    /// prunes the owner entirely once both sets are empty.
    pub fn remove_permanently(&mut self, owner: PlayerId, id: PetId) -> Option<Pet> {
        let mut removed = None;
        if let Some(pets) = self.alive.get_mut(&owner) {
            if let Some(index) = pets.iter().position(|p| p.id() == id) {
                removed = Some(pets.remove(index));
            }
        }
        if removed.is_none() {
            if let Some(pets) = self.dead.get_mut(&owner) {
                if let Some(index) = pets.iter().position(|p| p.id() == id) {
                    removed = Some(pets.remove(index));
                }
            }
        }
        let alive_empty = self.alive.get(&owner).is_none_or(Vec::is_empty);
        let dead_empty = self.dead.get(&owner).is_none_or(Vec::is_empty);
        if alive_empty && dead_empty {
            self.alive.remove(&owner);
            self.dead.remove(&owner);
        }
        if removed.is_some() {
            self.persist_logged();
        }
        removed
    }

    /// Refreshes the health fields of an alive record. Health is not part of
    /// the durable layout, so this never persists.
    pub fn update_health(&mut self, owner: PlayerId, id: PetId, current: f64, max: f64) {
        if let Some(pet) = self.find_alive_mut(owner, id) {
            pet.set_max_health(max);
            pet.set_current_health(current);
        }
    }

    /// Sets or clears the display-name override of an alive record.
    pub fn rename(&mut self, owner: PlayerId, id: PetId, name: Option<String>) {
        if let Some(pet) = self.find_alive_mut(owner, id) {
            pet.set_custom_name(name);
            self.persist_logged();
        }
    }
}
