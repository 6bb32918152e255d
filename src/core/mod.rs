pub mod error;
pub mod pet;
pub mod types;

pub use error::{PetError, Result};
pub use pet::Pet;
pub use types::{Creature, DamageSource, InstanceId, PetId, PetKind, PlayerId, Position};
