//! The composition root: one facade owning the store, the lifecycle engine,
//! and the transaction flow behind a single mutual-exclusion domain, plus the
//! periodic health ticker.

use crate::config::PetsConfig;
use crate::core::{DamageSource, InstanceId, PetError, PetKind, PlayerId, Result};
use crate::engine::{DamageRuling, LifecycleEngine};
use crate::interface::{BalanceProvider, LevelProvider, LiveHost};
use crate::shop;
use crate::storage::{PetArchive, PetStore};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// One alive pet in a listing.
#[derive(Debug, Clone)]
pub struct PetSummary {
    pub kind: PetKind,
    pub display_name: String,
    pub generated_name: String,
    pub spawned: bool,
}

/// One dead pet in a listing. `revivable_for_ms` is `None` once the grace
/// window has closed.
#[derive(Debug, Clone)]
pub struct DeadPetSummary {
    pub kind: PetKind,
    pub display_name: String,
    pub revivable_for_ms: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct PetListing {
    pub alive: Vec<PetSummary>,
    pub dead: Vec<DeadPetSummary>,
}

/// Result of a successful purchase, for rendering.
#[derive(Debug, Clone)]
pub struct PurchaseReceipt {
    pub kind_name: String,
    pub generated_name: String,
}

struct ServiceState {
    store: PetStore,
    engine: LifecycleEngine,
    config: PetsConfig,
}

struct Ticker {
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Pet lifecycle service.
///
/// All mutations of the store and the active-pet index serialize behind one
/// tokio mutex, so spawn/despawn/tick/death-detection on the same owner never
/// race. Collaborators are injected once at construction; absent ones degrade
/// per operation (no economy disables priced purchases, no level provider
/// reads as level 0).
pub struct PetService {
    state: Arc<Mutex<ServiceState>>,
    host: Arc<dyn LiveHost>,
    economy: Option<Arc<dyn BalanceProvider>>,
    levels: Option<Arc<dyn LevelProvider>>,
    ticker: std::sync::Mutex<Option<Ticker>>,
}

impl PetService {
    /// Opens the service over a durable archive, reloading persisted pets.
    pub fn open(config: PetsConfig, archive: PetArchive, host: Arc<dyn LiveHost>) -> Result<Self> {
        let store = PetStore::open(archive)?;
        Ok(Self::with_store(config, store, host))
    }

    /// A service without durable backing, for embedding and tests.
    pub fn in_memory(config: PetsConfig, host: Arc<dyn LiveHost>) -> Self {
        Self::with_store(config, PetStore::in_memory(), host)
    }

    fn with_store(config: PetsConfig, store: PetStore, host: Arc<dyn LiveHost>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ServiceState {
                store,
                engine: LifecycleEngine::new(),
                config,
            })),
            host,
            economy: None,
            levels: None,
            ticker: std::sync::Mutex::new(None),
        }
    }

    /// Attach the balance-holding collaborator.
    pub fn with_economy(mut self, economy: Arc<dyn BalanceProvider>) -> Self {
        self.economy = Some(economy);
        self
    }

    /// Attach the optional leveling collaborator.
    pub fn with_levels(mut self, levels: Arc<dyn LevelProvider>) -> Self {
        self.levels = Some(levels);
        self
    }

    /// Starts the periodic health ticker. Idempotent.
    pub async fn start(&self) -> Result<()> {
        let period = self.state.lock().await.config.tick_interval;

        let mut ticker = self.ticker.lock()?;
        if ticker.is_some() {
            return Ok(());
        }

        let (stop, mut stopped) = watch::channel(false);
        let state = Arc::clone(&self.state);
        let host = Arc::clone(&self.host);

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let mut guard = state.lock().await;
                        let ServiceState { store, engine, config } = &mut *guard;
                        engine.tick(store, config, host.as_ref()).await;
                    }
                    _ = stopped.changed() => break,
                }
            }
        });

        *ticker = Some(Ticker { stop, handle });
        log::info!("Pet health ticker started");
        Ok(())
    }

    /// Stops the ticker, force-despawns every active pet, and flushes
    /// persistence before returning.
    pub async fn shutdown(&self) -> Result<()> {
        let ticker = { self.ticker.lock()?.take() };
        if let Some(ticker) = ticker {
            let _ = ticker.stop.send(true);
            let _ = ticker.handle.await;
        }

        let mut guard = self.state.lock().await;
        let ServiceState { store, engine, .. } = &mut *guard;
        engine.despawn_all(store, self.host.as_ref()).await;
        guard.store.persist()?;
        log::info!("Pet service shut down");
        Ok(())
    }

    /// Runs one tick sweep immediately. The ticker calls this on its period;
    /// exposed for hosts that drive their own scheduler.
    pub async fn tick_once(&self) {
        let mut guard = self.state.lock().await;
        let ServiceState {
            store,
            engine,
            config,
        } = &mut *guard;
        engine.tick(store, config, self.host.as_ref()).await;
    }

    pub async fn purchase(&self, owner: PlayerId, kind: PetKind) -> Result<PurchaseReceipt> {
        let mut guard = self.state.lock().await;
        let ServiceState { store, config, .. } = &mut *guard;
        let id = shop::purchase(
            store,
            config,
            self.economy.as_deref(),
            self.levels.as_deref(),
            owner,
            kind,
        )
        .await?;

        let generated_name = store
            .find_alive(owner, id)
            .map(|p| p.generated_name().to_string())
            .unwrap_or_default();
        let kind_name = config
            .kind(kind)
            .map(|kc| kc.display_name.clone())
            .unwrap_or_else(|| kind.to_string());
        Ok(PurchaseReceipt {
            kind_name,
            generated_name,
        })
    }

    /// Spawns the owner's pet of the given kind. The pet must be owned and
    /// alive, and nothing else may be spawned for this owner.
    pub async fn spawn(&self, owner: PlayerId, kind: PetKind) -> Result<String> {
        let mut guard = self.state.lock().await;
        let ServiceState {
            store,
            engine,
            config,
        } = &mut *guard;
        let pet = store
            .find_alive_by_kind(owner, kind)
            .ok_or_else(|| PetError::PetNotFound(kind.to_string()))?;
        let id = pet.id();
        let display_name = pet.display_name().to_string();
        engine
            .spawn(store, config, self.host.as_ref(), owner, id)
            .await?;
        Ok(display_name)
    }

    /// No-op if nothing is spawned.
    pub async fn despawn(&self, owner: PlayerId) {
        let mut guard = self.state.lock().await;
        let ServiceState { store, engine, .. } = &mut *guard;
        engine.despawn(store, self.host.as_ref(), owner).await;
    }

    pub async fn list(&self, owner: PlayerId) -> PetListing {
        let guard = self.state.lock().await;
        let now = Utc::now().timestamp_millis();
        let alive = guard
            .store
            .alive(owner)
            .iter()
            .map(|p| PetSummary {
                kind: p.kind(),
                display_name: p.display_name().to_string(),
                generated_name: p.generated_name().to_string(),
                spawned: guard
                    .engine
                    .active(owner)
                    .is_some_and(|b| b.pet == p.id()),
            })
            .collect();
        let dead = guard
            .store
            .dead(owner)
            .iter()
            .map(|p| {
                let remaining = p
                    .died_at()
                    .map(|died| guard.config.revival_window_ms - (now - died))
                    .filter(|ms| *ms >= 0);
                DeadPetSummary {
                    kind: p.kind(),
                    display_name: p.display_name().to_string(),
                    revivable_for_ms: remaining,
                }
            })
            .collect();
        PetListing { alive, dead }
    }

    /// Renames an alive pet, addressed by its immutable generated name. The
    /// live instance is renamed too, if spawned.
    pub async fn rename(&self, owner: PlayerId, generated_name: &str, new_name: &str) -> Result<()> {
        let mut guard = self.state.lock().await;
        let ServiceState { store, .. } = &mut *guard;
        let pet = store
            .find_alive_by_generated_name(owner, generated_name)
            .ok_or_else(|| PetError::PetNotFound(generated_name.to_string()))?;
        let id = pet.id();
        let instance = pet.instance();
        store.rename(owner, id, Some(new_name.to_string()));
        if let Some(instance) = instance {
            self.host.set_display_name(instance, new_name).await?;
        }
        Ok(())
    }

    /// Permanently deletes a pet, alive or dead, addressed by display or
    /// generated name. Despawns it first if currently active. Returns the
    /// released pet's display name.
    pub async fn release(&self, owner: PlayerId, name: &str) -> Result<String> {
        let mut guard = self.state.lock().await;
        let ServiceState { store, engine, .. } = &mut *guard;
        let pet = store
            .find_alive_by_name(owner, name)
            .or_else(|| store.find_dead_by_name(owner, name))
            .ok_or_else(|| PetError::PetNotFound(name.to_string()))?;
        let id = pet.id();
        let display_name = pet.display_name().to_string();

        if engine.active(owner).is_some_and(|b| b.pet == id) {
            engine.despawn(store, self.host.as_ref(), owner).await;
        }
        store.remove_permanently(owner, id);
        Ok(display_name)
    }

    /// Revives a dead pet by name, charging the configured revival cost.
    /// Returns the revived pet's display name.
    pub async fn revive(&self, owner: PlayerId, name: &str) -> Result<String> {
        let mut guard = self.state.lock().await;
        let ServiceState { store, config, .. } = &mut *guard;
        let pet = store
            .find_dead_by_name(owner, name)
            .ok_or_else(|| PetError::PetNotFound(name.to_string()))?;
        let id = pet.id();
        let display_name = pet.display_name().to_string();
        let died_at = pet
            .died_at()
            .ok_or_else(|| PetError::PetNotFound(name.to_string()))?;

        shop::revive(store, config, self.economy.as_deref(), owner, id, died_at).await?;
        Ok(display_name)
    }

    /// Arbitrates a damage event against a live instance. Owners attacking
    /// their own pet are told off.
    pub async fn handle_damage(&self, instance: InstanceId, source: DamageSource) -> DamageRuling {
        let guard = self.state.lock().await;
        let ruling = guard.engine.arbitrate_damage(&guard.config, instance, source);
        drop(guard);
        if ruling == DamageRuling::RejectOwnPet {
            if let DamageSource::Player(attacker) = source {
                self.host
                    .notify(attacker, "You cannot hurt your own pet!")
                    .await;
            }
        }
        ruling
    }

    /// Proximity correction, driven by owner movement.
    pub async fn handle_owner_move(&self, owner: PlayerId) {
        let guard = self.state.lock().await;
        guard
            .engine
            .correct_proximity(&guard.config, self.host.as_ref(), owner)
            .await;
    }

    /// Owners leaving the world take their spawned pet with them.
    pub async fn handle_owner_quit(&self, owner: PlayerId) {
        self.despawn(owner).await;
    }

    pub async fn handle_sneak(&self, owner: PlayerId, sneaking: bool) {
        let guard = self.state.lock().await;
        guard
            .engine
            .handle_sneak(&guard.config, self.host.as_ref(), owner, sneaking)
            .await;
    }

    pub async fn extra_lives(&self, owner: PlayerId) -> u32 {
        let guard = self.state.lock().await;
        guard.engine.extra_lives(&guard.config, owner)
    }

    /// Whether a live instance belongs to a tracked pet. Hosts use this to
    /// suppress death drops.
    pub async fn is_pet_instance(&self, instance: InstanceId) -> bool {
        self.state.lock().await.engine.is_pet_instance(instance)
    }

    pub async fn persist(&self) -> Result<()> {
        self.state.lock().await.store.persist()
    }
}

impl Drop for PetService {
    fn drop(&mut self) {
        if let Ok(mut ticker) = self.ticker.lock() {
            if let Some(ticker) = ticker.take() {
                ticker.handle.abort();
            }
        }
    }
}
