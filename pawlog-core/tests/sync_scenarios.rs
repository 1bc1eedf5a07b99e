//! End-to-end scenarios across repositories, sync engines and stores.

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::json;
use std::sync::{Arc, Mutex};
use tokio::sync::{oneshot, Notify};

use pawlog_core::models::{ActivityKind, VetContact};
use pawlog_core::remote::RemoteCollection;
use pawlog_core::store::MemoryBackend;
use pawlog_core::{
    ActivitySession, ConflictPolicy, LocalStore, MemoryRemoteStore, OfflineRemoteStore,
    PendingOp, Pet, RemoteError, RemoteStore, Repository, SqliteBackend, Species, SyncEngine,
    SyncState, WireRecord, Workspace,
};

struct Device {
    store: LocalStore,
    pets: Repository<Pet>,
    engine: SyncEngine<Pet>,
}

fn device(remote: &MemoryRemoteStore) -> Device {
    let store = LocalStore::in_memory();
    let remote: Arc<MemoryRemoteStore> = Arc::new(remote.clone());
    Device {
        pets: Repository::new(store.clone(), remote.clone()),
        engine: SyncEngine::new(store.clone(), remote),
        store,
    }
}

#[tokio::test]
async fn test_offline_create_is_pushed_after_reconnect() {
    let remote = MemoryRemoteStore::new();
    let phone = device(&remote);
    remote.set_online(false);

    let pet = Pet::new("owner-1", "Biscuit", Species::Dog)
        .with_breed("Beagle")
        .with_birth_date(NaiveDate::from_ymd_opt(2021, 6, 1).unwrap())
        .with_vet(VetContact {
            name: "Dr. Osei".to_string(),
            phone: None,
            clinic: Some("Northside".to_string()),
            address: None,
        });
    let created = phone.pets.create(pet).await.unwrap();
    assert!(!created.id.is_empty());
    assert!(remote.records("pets").is_empty());
    assert_eq!(phone.engine.pending().await.unwrap().len(), 1);

    remote.set_online(true);
    let report = phone.engine.push().await;
    assert_eq!(report.pushed, 1);
    assert!(phone.engine.pending().await.unwrap().is_empty());

    let records = remote.records("pets");
    assert_eq!(records.len(), 1);
    let wire = &records[0];
    assert_eq!(wire["id"], json!(created.id));
    assert_eq!(wire["owner_id"], json!("owner-1"));
    assert_eq!(wire["birth_date"], json!("2021-06-01"));
    assert!(wire["created_at"].as_str().unwrap().ends_with('Z'));
    assert!(wire["vet"].is_string());
    assert!(wire.get("ownerId").is_none());
    assert!(wire.get("birthDate").is_none());
}

#[tokio::test]
async fn test_two_devices_converge_on_union() {
    let remote = MemoryRemoteStore::new();
    let phone = device(&remote);
    let tablet = device(&remote);

    let a = phone.pets.create(Pet::new("owner-1", "Ada", Species::Cat)).await.unwrap();
    let b = tablet.pets.create(Pet::new("owner-1", "Bo", Species::Dog)).await.unwrap();

    phone.engine.sync("owner-1").await;
    tablet.engine.sync("owner-1").await;
    phone.engine.sync("owner-1").await;

    let mut expected = vec![a.id.clone(), b.id.clone()];
    expected.sort();
    for dev in [&phone, &tablet] {
        let mut ids: Vec<String> = dev.pets.get_all().await.unwrap().into_iter().map(|p| p.id).collect();
        ids.sort();
        assert_eq!(ids, expected);
    }

    let diff = phone.engine.diagnostic_diff("owner-1").await.unwrap();
    assert!(diff.is_in_sync());
}

#[tokio::test]
async fn test_push_twice_equals_push_once() {
    let remote = MemoryRemoteStore::new();
    let phone = device(&remote);
    remote.set_online(false);
    for name in ["A", "B", "C"] {
        phone.pets.create(Pet::new("owner-1", name, Species::Fish)).await.unwrap();
    }
    remote.set_online(true);

    phone.engine.push().await;
    let once = remote.records("pets");
    phone.engine.push().await;
    assert_eq!(remote.records("pets"), once);
    assert_eq!(once.len(), 3);
}

#[tokio::test]
async fn test_pull_policies_on_conflicting_id() {
    for (policy, expected_name) in [
        (ConflictPolicy::PreferLocal, "Local"),
        (ConflictPolicy::PreferRemote, "Remote"),
        (ConflictPolicy::Reject, "Local"),
    ] {
        let remote = MemoryRemoteStore::new();
        let phone = device(&remote);
        remote.set_online(false);
        phone
            .pets
            .create(Pet::new("owner-1", "Local", Species::Dog).with_id("shared"))
            .await
            .unwrap();
        remote.set_online(true);

        let theirs = Pet::new("owner-1", "Remote", Species::Dog).with_id("shared");
        remote.insert("pets", pawlog_core::to_wire(&theirs).unwrap());

        let engine = phone.engine.clone().with_policy(policy);
        let report = engine.pull("owner-1").await;
        assert_eq!(report.conflicts, vec!["shared".to_string()], "{}", policy);

        let stored = phone.pets.get_by_id("shared").await.unwrap().unwrap();
        assert_eq!(stored.name, expected_name, "{}", policy);
    }
}

#[tokio::test]
async fn test_diff_reports_both_sides() {
    let remote = MemoryRemoteStore::new();
    let phone = device(&remote);
    remote.set_online(false);
    phone.pets.create(Pet::new("o", "A", Species::Dog).with_id("A")).await.unwrap();
    phone.pets.create(Pet::new("o", "B", Species::Dog).with_id("B")).await.unwrap();
    remote.set_online(true);
    for id in ["B", "C"] {
        let pet = Pet::new("o", id, Species::Dog).with_id(id);
        remote.insert("pets", pawlog_core::to_wire(&pet).unwrap());
    }

    let diff = phone.engine.diagnostic_diff("o").await.unwrap();
    assert_eq!(diff.local_only_ids.iter().collect::<Vec<_>>(), vec!["A"]);
    assert_eq!(diff.remote_only_ids.iter().collect::<Vec<_>>(), vec!["C"]);
}

#[tokio::test]
async fn test_concurrent_creates_lose_nothing() {
    let remote = MemoryRemoteStore::new();
    let phone = device(&remote);

    let mut handles = Vec::new();
    for i in 0..40 {
        let pets = phone.pets.clone();
        handles.push(tokio::spawn(async move {
            pets.create(Pet::new("owner-1", format!("Pet {}", i), Species::Rabbit))
                .await
                .unwrap()
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(phone.pets.get_all().await.unwrap().len(), 40);
    assert_eq!(remote.records("pets").len(), 40);
}

#[tokio::test]
async fn test_outbox_flush_sends_exactly_failed_mirrors() {
    let remote = MemoryRemoteStore::new();
    let phone = device(&remote);
    let kept = phone.pets.create(Pet::new("o", "Kept", Species::Dog)).await.unwrap();

    remote.set_online(false);
    let offline = phone.pets.create(Pet::new("o", "Offline", Species::Cat)).await.unwrap();
    remote.set_online(true);

    // A record changed behind the remote's back is not part of the flush
    let sneaky = Pet::new("o", "Sneaky", Species::Bird).with_id("sneaky");
    phone.store.set("pets", &[kept.clone(), offline.clone(), sneaky]).await.unwrap();

    let report = phone.engine.push_pending().await;
    assert_eq!(report.pending_flushed, 1);
    let mut ids = remote.ids("pets");
    ids.sort();
    let mut expected = vec![kept.id, offline.id];
    expected.sort();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn test_local_writes_survive_unreachable_remote() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("pawlog.db");

    let pet_id = {
        let store = LocalStore::new(SqliteBackend::open(&db_path).await.unwrap());
        let ws = Workspace::new(store, Arc::new(OfflineRemoteStore));
        let pet = ws.pets.create(Pet::new("owner-1", "Mochi", Species::Cat)).await.unwrap();
        let started = Utc.with_ymd_and_hms(2025, 4, 2, 8, 0, 0).unwrap();
        ws.activities
            .create(ActivitySession::new("owner-1", pet.id.clone(), ActivityKind::Play, started, 20))
            .await
            .unwrap();

        let engine = ws.engine("pets").unwrap();
        let report = engine.sync("owner-1").await;
        assert_eq!(report.push_failed, 1);
        assert!(report.pull_error.is_some());
        assert_eq!(engine.state(), SyncState::Idle);
        pet.id
    };

    let store = LocalStore::new(SqliteBackend::open(&db_path).await.unwrap());
    let ws = Workspace::new(store, Arc::new(OfflineRemoteStore));
    let pet = ws.pets.get_by_id(&pet_id).await.unwrap().unwrap();
    assert_eq!(pet.name, "Mochi");
    assert_eq!(ws.activities.find_by_pet(&pet_id).await.unwrap().len(), 1);
    assert_eq!(ws.pets.outbox().list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_shared_backend_devices_see_each_other() {
    let backend = MemoryBackend::new();
    let remote = Arc::new(MemoryRemoteStore::new());
    let first: Repository<Pet> = Repository::new(LocalStore::new(backend.clone()), remote.clone());
    let second: Repository<Pet> = Repository::new(LocalStore::new(backend), remote);

    let pet = first.create(Pet::new("o", "Shared", Species::Dog)).await.unwrap();
    assert_eq!(second.get_by_id(&pet.id).await.unwrap(), Some(pet));
}

/// Remote whose next upsert waits until the test releases it.
struct HeldUpsertRemote {
    inner: MemoryRemoteStore,
    entered: Notify,
    release: Mutex<Option<oneshot::Receiver<()>>>,
}

impl HeldUpsertRemote {
    fn new(inner: MemoryRemoteStore) -> Self {
        Self {
            inner,
            entered: Notify::new(),
            release: Mutex::new(None),
        }
    }

    fn hold_next_upsert(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.release.lock().unwrap() = Some(rx);
        tx
    }
}

#[async_trait]
impl RemoteStore for HeldUpsertRemote {
    async fn upsert(
        &self,
        collection: RemoteCollection,
        record: WireRecord,
    ) -> Result<WireRecord, RemoteError> {
        let held = self.release.lock().unwrap().take();
        if let Some(release) = held {
            self.entered.notify_one();
            let _ = release.await;
        }
        self.inner.upsert(collection, record).await
    }

    async fn delete_by_id(&self, collection: RemoteCollection, id: &str) -> Result<(), RemoteError> {
        self.inner.delete_by_id(collection, id).await
    }

    async fn query_by_owner(
        &self,
        collection: RemoteCollection,
        owner_id: &str,
    ) -> Result<Vec<WireRecord>, RemoteError> {
        self.inner.query_by_owner(collection, owner_id).await
    }
}

#[tokio::test]
async fn test_late_update_mirror_keeps_queued_delete() {
    let backend = MemoryRemoteStore::new();
    let remote = Arc::new(HeldUpsertRemote::new(backend.clone()));
    let store = LocalStore::in_memory();
    let pets: Repository<Pet> = Repository::new(store.clone(), remote.clone());

    let rex = pets
        .create(Pet::new("o", "Rex", Species::Dog))
        .await
        .unwrap();
    assert_eq!(backend.ids("pets"), vec![rex.id.clone()]);

    // The update commits locally, then its mirror stalls in flight.
    let release = remote.hold_next_upsert();
    let updater = {
        let pets = pets.clone();
        let mut renamed = rex.clone();
        renamed.name = "Rexie".to_string();
        let id = rex.id.clone();
        tokio::spawn(async move { pets.update(&id, renamed).await })
    };
    remote.entered.notified().await;

    backend.set_online(false);
    assert!(pets.delete(&rex.id).await.unwrap());
    let queued = pets.outbox().list().await.unwrap();
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].op, PendingOp::Delete);

    backend.set_online(true);
    release.send(()).unwrap();
    assert!(updater.await.unwrap().unwrap().is_some());

    let queued = pets.outbox().list().await.unwrap();
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].op, PendingOp::Delete);

    let engine: SyncEngine<Pet> = SyncEngine::new(store, remote);
    let report = engine.sync("o").await;
    assert_eq!(report.pulled, 0);
    assert!(pets.get_by_id(&rex.id).await.unwrap().is_none());
    assert!(backend.ids("pets").is_empty());
    assert!(pets.outbox().list().await.unwrap().is_empty());
}
