//! Common test utilities for integration tests
//!
//! Provides a migrated in-memory store, orchestrator wiring and repository
//! wrappers that inject failures or write conflicts.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, TimeZone};
use uuid::Uuid;

use levelup::adapters::sqlite::create_migrated_test_pool;
use levelup::domain::errors::{DomainError, DomainResult};
use levelup::domain::models::{
    CompleteTaskRequest, StatsRecord, StreakRecord, TaskData, TaskRecord, UnlockedAchievement,
    UserId,
};
use levelup::domain::ports::{
    AchievementRepository, CompletionNotifier, NullNotifier, StatsRepository, StreakRepository,
    Versioned,
};
use levelup::services::{CompletionOrchestrator, Repositories, TransactionRunner};

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
pub fn setup_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Repositories over a fresh in-memory database.
pub async fn sqlite_repositories() -> Repositories {
    let pool = create_migrated_test_pool()
        .await
        .expect("Failed to create test database");
    Repositories::sqlite(pool)
}

/// A runner that tolerates heavy contention without slowing tests down.
pub fn patient_runner() -> TransactionRunner {
    TransactionRunner::new(50, 1, 10)
}

pub fn orchestrator(repositories: Repositories) -> CompletionOrchestrator {
    orchestrator_with_notifier(repositories, Arc::new(NullNotifier))
}

pub fn orchestrator_with_notifier(
    repositories: Repositories,
    notifier: Arc<dyn CompletionNotifier>,
) -> CompletionOrchestrator {
    CompletionOrchestrator::new(repositories, notifier, patient_runner())
}

/// A local instant at a fixed offset.
pub fn local_time(
    offset_hours: i32,
    (y, m, d): (i32, u32, u32),
    (h, min): (u32, u32),
) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(offset_hours * 3600)
        .expect("valid offset")
        .with_ymd_and_hms(y, m, d, h, min, 0)
        .single()
        .expect("unambiguous local time")
}

/// Insert an open task and return its id.
pub async fn seed_task(repositories: &Repositories, user_id: &UserId, category: &str) -> Uuid {
    let task = TaskRecord::new("study session", category);
    repositories
        .tasks
        .create(user_id, &task)
        .await
        .expect("Failed to seed task");
    task.id
}

pub fn completion(
    user_id: &UserId,
    task_id: Uuid,
    minutes: Option<u64>,
    now: DateTime<FixedOffset>,
) -> CompleteTaskRequest {
    CompleteTaskRequest {
        user_id: user_id.clone(),
        task_id,
        task_data: TaskData {
            category: None,
            time_spent_seconds: minutes.map(|m| m * 60),
        },
        now,
    }
}

fn unavailable(what: &str) -> DomainError {
    DomainError::StoreUnavailable(format!("{what} is offline"))
}

/// Stats store that is down for every operation.
pub struct UnavailableStatsRepository;

#[async_trait]
impl StatsRepository for UnavailableStatsRepository {
    async fn load(&self, _user_id: &UserId) -> DomainResult<Option<Versioned<StatsRecord>>> {
        Err(unavailable("stats store"))
    }

    async fn store(
        &self,
        _user_id: &UserId,
        _record: &StatsRecord,
        _expected_version: Option<u64>,
    ) -> DomainResult<u64> {
        Err(unavailable("stats store"))
    }
}

/// Streak store that is down for every operation.
pub struct UnavailableStreakRepository;

#[async_trait]
impl StreakRepository for UnavailableStreakRepository {
    async fn load(&self, _user_id: &UserId) -> DomainResult<Option<Versioned<StreakRecord>>> {
        Err(unavailable("streak store"))
    }

    async fn store(
        &self,
        _user_id: &UserId,
        _record: &StreakRecord,
        _expected_version: Option<u64>,
    ) -> DomainResult<u64> {
        Err(unavailable("streak store"))
    }
}

/// Wraps a streak store and reports a conflict for the first `conflicts`
/// writes, as if another device committed first.
pub struct ContendedStreakRepository {
    inner: Arc<dyn StreakRepository>,
    conflicts: u32,
    pub stores: AtomicU32,
}

impl ContendedStreakRepository {
    pub fn new(inner: Arc<dyn StreakRepository>, conflicts: u32) -> Self {
        Self {
            inner,
            conflicts,
            stores: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl StreakRepository for ContendedStreakRepository {
    async fn load(&self, user_id: &UserId) -> DomainResult<Option<Versioned<StreakRecord>>> {
        self.inner.load(user_id).await
    }

    async fn store(
        &self,
        user_id: &UserId,
        record: &StreakRecord,
        expected_version: Option<u64>,
    ) -> DomainResult<u64> {
        let attempt = self.stores.fetch_add(1, Ordering::SeqCst);
        if attempt < self.conflicts {
            return Err(DomainError::ConcurrencyConflict {
                entity: "streak".to_string(),
                id: user_id.to_string(),
            });
        }
        self.inner.store(user_id, record, expected_version).await
    }
}

/// Reads unlocks from the real store but rejects every batch write.
pub struct ReadOnlyAchievementRepository {
    inner: Arc<dyn AchievementRepository>,
}

impl ReadOnlyAchievementRepository {
    pub fn new(inner: Arc<dyn AchievementRepository>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl AchievementRepository for ReadOnlyAchievementRepository {
    async fn list_unlocked(&self, user_id: &UserId) -> DomainResult<Vec<UnlockedAchievement>> {
        self.inner.list_unlocked(user_id).await
    }

    async fn insert_batch(
        &self,
        _user_id: &UserId,
        _unlocks: &[UnlockedAchievement],
    ) -> DomainResult<()> {
        Err(unavailable("achievement store"))
    }
}
