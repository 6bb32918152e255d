//! Durable snapshot of the pet collection.
//!
//! One JSON document keyed by owner identifier, each owner holding records in
//! slot order. Absence of a death timestamp means the record is alive.

use crate::core::{Pet, PetError, PetKind, PlayerId, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

/// The persisted form of one pet record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredPet {
    pub kind: PetKind,
    pub generated_name: String,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub custom_name: Option<String>,

    /// Epoch milliseconds; absent for alive records.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub death_timestamp: Option<i64>,
}

impl StoredPet {
    pub fn from_pet(pet: &Pet) -> Self {
        Self {
            kind: pet.kind(),
            generated_name: pet.generated_name().to_string(),
            custom_name: pet.custom_name().map(str::to_string),
            death_timestamp: pet.died_at(),
        }
    }

    pub fn into_pet(self, owner: PlayerId) -> Pet {
        let mut pet = Pet::new(owner, self.kind, self.generated_name);
        pet.set_custom_name(self.custom_name);
        pet.set_died_at(self.death_timestamp);
        pet
    }
}

/// Writes and reads the snapshot file. Writes go through a temp file in the
/// same directory, get synced, and are renamed into place.
pub struct PetArchive {
    path: PathBuf,
}

impl PetArchive {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, records: &HashMap<PlayerId, Vec<StoredPet>>) -> Result<()> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent)
            .map_err(|e| PetError::Persistence(format!("Failed to create data directory: {}", e)))?;

        let serialized = serde_json::to_vec_pretty(records)
            .map_err(|e| PetError::Persistence(format!("Failed to serialize pets: {}", e)))?;

        let mut temp = tempfile::NamedTempFile::new_in(&parent)
            .map_err(|e| PetError::Persistence(format!("Failed to create temp file: {}", e)))?;
        temp.write_all(&serialized)
            .map_err(|e| PetError::Persistence(format!("Failed to write snapshot: {}", e)))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| PetError::Persistence(format!("Failed to sync snapshot: {}", e)))?;
        temp.persist(&self.path)
            .map_err(|e| PetError::Persistence(format!("Failed to rename snapshot: {}", e)))?;
        Ok(())
    }

    /// Loads all records; a missing file reads as an empty collection.
    pub fn load(&self) -> Result<HashMap<PlayerId, Vec<StoredPet>>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let data = std::fs::read(&self.path)
            .map_err(|e| PetError::Persistence(format!("Failed to read snapshot: {}", e)))?;
        serde_json::from_slice(&data)
            .map_err(|e| PetError::Persistence(format!("Failed to parse snapshot: {}", e)))
    }
}
