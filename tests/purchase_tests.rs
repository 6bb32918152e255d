//! Purchase and revival transaction flow tests.

mod common;

use chrono::Utc;
use common::{FixedLevels, MemoryEconomy, MemoryHost};
use petkeeper::{
    PetArchive, PetError, PetKind, PetService, PetsConfig, PlayerId, Position, StoredPet,
};
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;

fn online_owner(host: &MemoryHost) -> PlayerId {
    let owner = PlayerId::random();
    host.place_owner(owner, Position::new(0.0, 64.0, 0.0));
    owner
}

#[tokio::test]
async fn purchase_creates_record_and_charges_balance() {
    let host = Arc::new(MemoryHost::new());
    let economy = Arc::new(MemoryEconomy::new());
    let service =
        PetService::in_memory(PetsConfig::default(), host.clone()).with_economy(economy.clone());

    let owner = online_owner(&host);
    economy.credit(owner, 100_000.0);

    let receipt = service.purchase(owner, PetKind::Cat).await.unwrap();
    assert_eq!(receipt.kind_name, "Lucky Cat");
    assert!(!receipt.generated_name.is_empty());
    assert_eq!(economy.balance_of(owner), 50_000.0);

    let listing = service.list(owner).await;
    assert_eq!(listing.alive.len(), 1);
    assert_eq!(listing.alive[0].kind, PetKind::Cat);
    assert!(!listing.alive[0].spawned);
}

#[tokio::test]
async fn duplicate_kind_is_rejected_without_charging() {
    let host = Arc::new(MemoryHost::new());
    let economy = Arc::new(MemoryEconomy::new());
    let service =
        PetService::in_memory(PetsConfig::default(), host.clone()).with_economy(economy.clone());

    let owner = online_owner(&host);
    economy.credit(owner, 200_000.0);
    service.purchase(owner, PetKind::Cat).await.unwrap();
    let balance_after_first = economy.balance_of(owner);

    let err = service.purchase(owner, PetKind::Cat).await.unwrap_err();
    assert!(matches!(err, PetError::AlreadyOwned(_)));
    assert_eq!(economy.balance_of(owner), balance_after_first);
    assert_eq!(service.list(owner).await.alive.len(), 1);
}

#[tokio::test]
async fn disabled_and_unconfigured_kinds_are_rejected() {
    let host = Arc::new(MemoryHost::new());
    let economy = Arc::new(MemoryEconomy::new());

    let mut config = PetsConfig::default();
    config.kinds.get_mut(&PetKind::Dog).unwrap().enabled = false;
    config.kinds.remove(&PetKind::Fox);

    let service = PetService::in_memory(config, host.clone()).with_economy(economy.clone());
    let owner = online_owner(&host);
    economy.credit(owner, 1_000_000.0);

    assert!(matches!(
        service.purchase(owner, PetKind::Dog).await.unwrap_err(),
        PetError::KindDisabled(_)
    ));
    assert!(matches!(
        service.purchase(owner, PetKind::Fox).await.unwrap_err(),
        PetError::InvalidKind(_)
    ));
}

#[tokio::test]
async fn level_gate_uses_provider_and_defaults_to_zero() {
    let host = Arc::new(MemoryHost::new());
    let economy = Arc::new(MemoryEconomy::new());

    // Horse requires level 10.
    let service = PetService::in_memory(PetsConfig::default(), host.clone())
        .with_economy(economy.clone())
        .with_levels(Arc::new(FixedLevels(3)));
    let owner = online_owner(&host);
    economy.credit(owner, 1_000_000.0);

    let err = service.purchase(owner, PetKind::Horse).await.unwrap_err();
    assert!(matches!(
        err,
        PetError::LevelTooLow {
            required: 10,
            current: 3
        }
    ));

    // No provider at all reads as level 0.
    let ungated = PetService::in_memory(PetsConfig::default(), host.clone())
        .with_economy(economy.clone());
    assert!(matches!(
        ungated.purchase(owner, PetKind::Horse).await.unwrap_err(),
        PetError::LevelTooLow { current: 0, .. }
    ));

    // A sufficient level passes the gate.
    let leveled = PetService::in_memory(PetsConfig::default(), host.clone())
        .with_economy(economy.clone())
        .with_levels(Arc::new(FixedLevels(10)));
    leveled.purchase(owner, PetKind::Horse).await.unwrap();
}

#[tokio::test]
async fn priced_purchase_requires_economy_but_free_does_not() {
    let host = Arc::new(MemoryHost::new());
    let mut config = PetsConfig::default();
    config.kinds.get_mut(&PetKind::Parrot).unwrap().price = 0.0;

    let service = PetService::in_memory(config, host.clone());
    let owner = online_owner(&host);

    assert!(matches!(
        service.purchase(owner, PetKind::Cat).await.unwrap_err(),
        PetError::EconomyUnavailable
    ));
    service.purchase(owner, PetKind::Parrot).await.unwrap();
}

#[tokio::test]
async fn insufficient_funds_reports_the_shortfall() {
    let host = Arc::new(MemoryHost::new());
    let economy = Arc::new(MemoryEconomy::new());
    let service =
        PetService::in_memory(PetsConfig::default(), host.clone()).with_economy(economy.clone());

    let owner = online_owner(&host);
    economy.credit(owner, 10_000.0);

    let err = service.purchase(owner, PetKind::Cat).await.unwrap_err();
    match err {
        PetError::InsufficientFunds { needed } => assert_eq!(needed, 40_000.0),
        other => panic!("expected InsufficientFunds, got {:?}", other),
    }
    assert_eq!(economy.balance_of(owner), 10_000.0);
}

#[tokio::test]
async fn unverified_withdrawal_aborts_without_a_record() {
    let host = Arc::new(MemoryHost::new());
    // Reports success without actually taking the money.
    let economy = Arc::new(MemoryEconomy::dishonest());
    let service =
        PetService::in_memory(PetsConfig::default(), host.clone()).with_economy(economy.clone());

    let owner = online_owner(&host);
    economy.credit(owner, 100_000.0);

    let err = service.purchase(owner, PetKind::Cat).await.unwrap_err();
    assert!(matches!(err, PetError::PaymentVerificationFailed));
    assert_eq!(economy.balance_of(owner), 100_000.0);
    assert!(service.list(owner).await.alive.is_empty());
}

fn archive_with_dead_pet(dir: &TempDir, owner: PlayerId, died_at: i64) -> PetArchive {
    let archive = PetArchive::new(dir.path().join("pets.json"));
    let mut records = HashMap::new();
    records.insert(
        owner,
        vec![StoredPet {
            kind: PetKind::Dog,
            generated_name: "Rocky II".to_string(),
            custom_name: None,
            death_timestamp: Some(died_at),
        }],
    );
    archive.save(&records).unwrap();
    PetArchive::new(dir.path().join("pets.json"))
}

#[tokio::test]
async fn revive_within_window_charges_and_restores() {
    let dir = TempDir::new().unwrap();
    let host = Arc::new(MemoryHost::new());
    let economy = Arc::new(MemoryEconomy::new());
    let owner = PlayerId::random();
    host.place_owner(owner, Position::new(0.0, 64.0, 0.0));

    let archive = archive_with_dead_pet(&dir, owner, Utc::now().timestamp_millis() - 60_000);
    let service = PetService::open(PetsConfig::default(), archive, host.clone())
        .unwrap()
        .with_economy(economy.clone());
    economy.credit(owner, 60_000.0);

    let name = service.revive(owner, "rocky ii").await.unwrap();
    assert_eq!(name, "Rocky II");
    assert_eq!(economy.balance_of(owner), 10_000.0);

    let listing = service.list(owner).await;
    assert_eq!(listing.alive.len(), 1);
    assert!(listing.dead.is_empty());
}

#[tokio::test]
async fn revive_after_window_is_rejected() {
    let dir = TempDir::new().unwrap();
    let host = Arc::new(MemoryHost::new());
    let economy = Arc::new(MemoryEconomy::new());
    let owner = PlayerId::random();
    host.place_owner(owner, Position::new(0.0, 64.0, 0.0));

    let window = PetsConfig::default().revival_window_ms;
    let archive =
        archive_with_dead_pet(&dir, owner, Utc::now().timestamp_millis() - window - 60_000);
    let service = PetService::open(PetsConfig::default(), archive, host.clone())
        .unwrap()
        .with_economy(economy.clone());
    economy.credit(owner, 60_000.0);

    let err = service.revive(owner, "Rocky II").await.unwrap_err();
    assert!(matches!(err, PetError::RevivalWindowExpired));
    assert_eq!(economy.balance_of(owner), 60_000.0);
    assert_eq!(service.list(owner).await.dead.len(), 1);
    // The record stays, permanently non-revivable.
    assert!(service.list(owner).await.dead[0].revivable_for_ms.is_none());
}

#[tokio::test]
async fn free_revival_works_without_economy() {
    let dir = TempDir::new().unwrap();
    let host = Arc::new(MemoryHost::new());
    let owner = PlayerId::random();
    host.place_owner(owner, Position::new(0.0, 64.0, 0.0));

    let archive = archive_with_dead_pet(&dir, owner, Utc::now().timestamp_millis());
    let config = PetsConfig::default().revive_cost(0.0);
    let service = PetService::open(config, archive, host.clone()).unwrap();

    service.revive(owner, "Rocky II").await.unwrap();
    assert_eq!(service.list(owner).await.alive.len(), 1);
}
