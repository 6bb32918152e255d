//! Purchase and revival transaction flow.
//!
//! Both operations validate every precondition before touching the balance
//! provider, then run a check -> withdraw -> verify sequence so a provider
//! that reports success without mutating state cannot hand out free pets.

use crate::config::PetsConfig;
use crate::core::{Pet, PetError, PetId, PetKind, PlayerId, Result};
use crate::interface::{BalanceProvider, LevelProvider};
use crate::storage::PetStore;
use chrono::Utc;
use rand::Rng;

const NAME_PREFIXES: [&str; 10] = [
    "Fluffy", "Buddy", "Max", "Luna", "Charlie", "Bella", "Rocky", "Daisy", "Milo", "Zoe",
];
const NAME_SUFFIXES: [&str; 5] = ["I", "II", "III", "IV", "V"];

/// Draws a cosmetic generated name from the fixed prefix x suffix pool. Not
/// guaranteed unique.
pub fn generate_name(rng: &mut impl Rng) -> String {
    let prefix = NAME_PREFIXES[rng.gen_range(0..NAME_PREFIXES.len())];
    let suffix = NAME_SUFFIXES[rng.gen_range(0..NAME_SUFFIXES.len())];
    format!("{} {}", prefix, suffix)
}

/// Whether a death stamped at `died_at` is still within the revival grace
/// window. Pure elapsed-time math, all in epoch milliseconds.
pub fn within_revival_window(died_at: i64, now: i64, window_ms: i64) -> bool {
    now - died_at <= window_ms
}

/// Validates preconditions and charges the owner for a new pet of `kind`,
/// then creates and persists the record. Returns the id of the new record.
pub async fn purchase(
    store: &mut PetStore,
    config: &PetsConfig,
    economy: Option<&dyn BalanceProvider>,
    levels: Option<&dyn LevelProvider>,
    owner: PlayerId,
    kind: PetKind,
) -> Result<PetId> {
    if store.has_alive_kind(owner, kind) {
        return Err(PetError::AlreadyOwned(kind.to_string()));
    }

    let kind_config = config
        .kind(kind)
        .ok_or_else(|| PetError::InvalidKind(kind.to_string()))?;
    if !kind_config.enabled {
        return Err(PetError::KindDisabled(kind.to_string()));
    }

    if kind_config.required_level > 0 {
        let current = owner_level(levels, owner).await;
        if current < kind_config.required_level {
            return Err(PetError::LevelTooLow {
                required: kind_config.required_level,
                current,
            });
        }
    }

    if kind_config.price > 0.0 {
        charge(economy, owner, kind_config.price).await?;
    }

    let generated_name = generate_name(&mut rand::thread_rng());
    let mut pet = Pet::new(owner, kind, generated_name);
    pet.set_max_health(kind_config.max_health);
    pet.set_current_health(kind_config.max_health);
    let id = pet.id();
    store.add_pet(pet);
    log::info!("Player {} purchased a {} pet", owner, kind);
    Ok(id)
}

/// Revives a dead record if its grace window is still open, charging the
/// configured revival cost through the same check/withdraw/verify sequence
/// as a purchase.
pub async fn revive(
    store: &mut PetStore,
    config: &PetsConfig,
    economy: Option<&dyn BalanceProvider>,
    owner: PlayerId,
    id: PetId,
    died_at: i64,
) -> Result<()> {
    let now = Utc::now().timestamp_millis();
    if !within_revival_window(died_at, now, config.revival_window_ms) {
        return Err(PetError::RevivalWindowExpired);
    }

    if config.revive_cost > 0.0 {
        charge(economy, owner, config.revive_cost).await?;
    }

    store.revive(owner, id);
    log::info!("Player {} revived a pet", owner);
    Ok(())
}

async fn owner_level(levels: Option<&dyn LevelProvider>, owner: PlayerId) -> u32 {
    match levels {
        Some(provider) => provider.level(owner).await.unwrap_or(0),
        None => 0,
    }
}

/// Check -> withdraw -> verify. Verification requires the post-withdraw
/// balance to be strictly below the pre-withdraw balance; a provider that
/// reported success without taking the funds fails here, and since nothing
/// left the account no compensating deposit is issued.
async fn charge(
    economy: Option<&dyn BalanceProvider>,
    owner: PlayerId,
    amount: f64,
) -> Result<()> {
    let economy = economy.ok_or(PetError::EconomyUnavailable)?;

    let balance = economy.balance(owner).await?;
    if balance < amount {
        return Err(PetError::InsufficientFunds {
            needed: amount - balance,
        });
    }

    let withdrawn = economy.withdraw(owner, amount).await?;
    if !withdrawn {
        log::warn!("Withdrawal of {:.2} refused for player {}", amount, owner);
        return Err(PetError::PaymentFailed("withdrawal refused".to_string()));
    }

    let after = economy.balance(owner).await?;
    if after >= balance {
        log::warn!(
            "Withdrawal verification failed for player {}: balance did not decrease",
            owner
        );
        return Err(PetError::PaymentVerificationFailed);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_names_come_from_the_pool() {
        let mut rng = rand::thread_rng();
        for _ in 0..50 {
            let name = generate_name(&mut rng);
            let (prefix, suffix) = name.rsplit_once(' ').unwrap();
            assert!(NAME_PREFIXES.contains(&prefix));
            assert!(NAME_SUFFIXES.contains(&suffix));
        }
    }

    #[test]
    fn revival_window_boundaries() {
        let window = 6 * 60 * 60 * 1000;
        let died_at = 1_000_000;
        assert!(within_revival_window(died_at, died_at + window, window));
        assert!(!within_revival_window(died_at, died_at + window + 1, window));
    }
}
