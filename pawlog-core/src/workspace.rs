//! One repository and one sync engine per entity type over a shared store.

use std::sync::Arc;
use std::time::Duration;

use crate::models::{ActivitySession, FoodItem, HealthRecord, Meal, Medication, Pet, User};
use crate::remote::{RemoteStore, DEFAULT_CALL_TIMEOUT};
use crate::repository::Repository;
use crate::store::LocalStore;
use crate::sync::{ConflictPolicy, Reconcile, SyncEngine, SyncReport};

/// Everything a client needs to read, write and reconcile its records.
///
/// All members share the same [`LocalStore`] (and so the same collection
/// locks) and the same remote.
#[derive(Clone)]
pub struct Workspace {
    pub pets: Repository<Pet>,
    pub activities: Repository<ActivitySession>,
    pub health_records: Repository<HealthRecord>,
    pub meals: Repository<Meal>,
    pub food_items: Repository<FoodItem>,
    pub medications: Repository<Medication>,
    pub users: Repository<User>,
    engines: Engines,
}

#[derive(Clone)]
struct Engines {
    pets: SyncEngine<Pet>,
    activities: SyncEngine<ActivitySession>,
    health_records: SyncEngine<HealthRecord>,
    meals: SyncEngine<Meal>,
    food_items: SyncEngine<FoodItem>,
    medications: SyncEngine<Medication>,
    users: SyncEngine<User>,
}

impl Workspace {
    pub fn new(store: LocalStore, remote: Arc<dyn RemoteStore>) -> Self {
        Self::with_options(store, remote, ConflictPolicy::default(), DEFAULT_CALL_TIMEOUT)
    }

    pub fn with_options(
        store: LocalStore,
        remote: Arc<dyn RemoteStore>,
        policy: ConflictPolicy,
        call_timeout: Duration,
    ) -> Self {
        fn repo<T: crate::models::Entity>(
            store: &LocalStore,
            remote: &Arc<dyn RemoteStore>,
            call_timeout: Duration,
        ) -> Repository<T> {
            Repository::new(store.clone(), Arc::clone(remote)).with_call_timeout(call_timeout)
        }

        fn engine<T: crate::models::Entity>(
            store: &LocalStore,
            remote: &Arc<dyn RemoteStore>,
            policy: ConflictPolicy,
            call_timeout: Duration,
        ) -> SyncEngine<T> {
            SyncEngine::new(store.clone(), Arc::clone(remote))
                .with_policy(policy)
                .with_call_timeout(call_timeout)
        }

        Self {
            pets: repo(&store, &remote, call_timeout),
            activities: repo(&store, &remote, call_timeout),
            health_records: repo(&store, &remote, call_timeout),
            meals: repo(&store, &remote, call_timeout),
            food_items: repo(&store, &remote, call_timeout),
            medications: repo(&store, &remote, call_timeout),
            users: repo(&store, &remote, call_timeout),
            engines: Engines {
                pets: engine(&store, &remote, policy, call_timeout),
                activities: engine(&store, &remote, policy, call_timeout),
                health_records: engine(&store, &remote, policy, call_timeout),
                meals: engine(&store, &remote, policy, call_timeout),
                food_items: engine(&store, &remote, policy, call_timeout),
                medications: engine(&store, &remote, policy, call_timeout),
                users: engine(&store, &remote, policy, call_timeout),
            },
        }
    }

    /// Every collection's engine, users first.
    pub fn engines(&self) -> Vec<&dyn Reconcile> {
        let e = &self.engines;
        vec![
            &e.users,
            &e.pets,
            &e.activities,
            &e.health_records,
            &e.meals,
            &e.food_items,
            &e.medications,
        ]
    }

    /// Engine for a collection by name, e.g. `"pets"`.
    pub fn engine(&self, collection: &str) -> Option<&dyn Reconcile> {
        self.engines()
            .into_iter()
            .find(|engine| engine.collection() == collection)
    }

    /// Names of all synced collections.
    pub fn collections(&self) -> Vec<&'static str> {
        self.engines().iter().map(|engine| engine.collection()).collect()
    }

    /// Runs a full sync of every collection, one after another.
    pub async fn sync_all(&self, owner_id: &str) -> Vec<SyncReport> {
        let mut reports = Vec::new();
        for engine in self.engines() {
            reports.push(engine.sync(owner_id).await);
        }
        reports
    }

    /// Retries the outbox of every collection.
    pub async fn push_pending_all(&self) -> Vec<SyncReport> {
        let mut reports = Vec::new();
        for engine in self.engines() {
            reports.push(engine.push_pending().await);
        }
        reports
    }
}
