pub mod persistence;
pub mod store;

pub use persistence::{PetArchive, StoredPet};
pub use store::PetStore;
