//! Client-side task cache kept in line with server snapshots.
//!
//! Snapshots replace the cached tasks field by field according to a merge
//! policy table. Everything is server-wins except the accumulated focus
//! time, which clients bump optimistically and which must never move
//! backwards when a stale snapshot lands.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{TaskRecord, UserId};
use crate::domain::ports::{TaskFilter, TaskRepository};

/// Mergeable task fields. The id is the join key and is never merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskField {
    Title,
    Completed,
    CompletedAt,
    Category,
    TimeSpentSeconds,
    TotalTimeLogged,
    CreatedAt,
    UpdatedAt,
    Version,
}

impl TaskField {
    pub const ALL: [Self; 9] = [
        Self::Title,
        Self::Completed,
        Self::CompletedAt,
        Self::Category,
        Self::TimeSpentSeconds,
        Self::TotalTimeLogged,
        Self::CreatedAt,
        Self::UpdatedAt,
        Self::Version,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    ServerWins,
    Max,
}

impl MergePolicy {
    fn resolve<T: Ord + Clone>(self, local: &T, server: &T) -> T {
        match self {
            Self::ServerWins => server.clone(),
            Self::Max => local.max(server).clone(),
        }
    }
}

/// Field → policy table consulted on every merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePolicyTable {
    policies: BTreeMap<TaskField, MergePolicy>,
}

impl Default for MergePolicyTable {
    fn default() -> Self {
        Self::server_wins().with(TaskField::TotalTimeLogged, MergePolicy::Max)
    }
}

impl MergePolicyTable {
    /// Every field takes the server value.
    pub fn server_wins() -> Self {
        Self {
            policies: TaskField::ALL
                .iter()
                .map(|f| (*f, MergePolicy::ServerWins))
                .collect(),
        }
    }

    pub fn with(mut self, field: TaskField, policy: MergePolicy) -> Self {
        self.policies.insert(field, policy);
        self
    }

    pub fn policy_for(&self, field: TaskField) -> MergePolicy {
        self.policies
            .get(&field)
            .copied()
            .unwrap_or(MergePolicy::ServerWins)
    }

    /// Merge one server copy over the local copy of the same task.
    pub fn merge(&self, local: &TaskRecord, server: &TaskRecord) -> TaskRecord {
        let p = |field| self.policy_for(field);
        TaskRecord {
            id: server.id,
            title: p(TaskField::Title).resolve(&local.title, &server.title),
            completed: p(TaskField::Completed).resolve(&local.completed, &server.completed),
            completed_at: p(TaskField::CompletedAt)
                .resolve(&local.completed_at, &server.completed_at),
            category: p(TaskField::Category).resolve(&local.category, &server.category),
            time_spent_seconds: p(TaskField::TimeSpentSeconds)
                .resolve(&local.time_spent_seconds, &server.time_spent_seconds),
            total_time_logged: p(TaskField::TotalTimeLogged)
                .resolve(&local.total_time_logged, &server.total_time_logged),
            created_at: p(TaskField::CreatedAt).resolve(&local.created_at, &server.created_at),
            updated_at: p(TaskField::UpdatedAt).resolve(&local.updated_at, &server.updated_at),
            version: p(TaskField::Version).resolve(&local.version, &server.version),
        }
    }
}

/// Full task list for one user as the server sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub user_id: UserId,
    pub tasks: Vec<TaskRecord>,
    pub taken_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub inserted: usize,
    pub updated: usize,
    pub removed: usize,
    /// Tasks whose local focus time was ahead of the server and was kept.
    pub kept_local_time: usize,
}

/// Local mirror of one user's tasks.
#[derive(Debug, Clone, Default)]
pub struct LocalTaskCache {
    tasks: BTreeMap<Uuid, TaskRecord>,
    policies: MergePolicyTable,
}

impl LocalTaskCache {
    pub fn new(policies: MergePolicyTable) -> Self {
        Self {
            tasks: BTreeMap::new(),
            policies,
        }
    }

    pub fn get(&self, id: Uuid) -> Option<&TaskRecord> {
        self.tasks.get(&id)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &TaskRecord> {
        self.tasks.values()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Merge a server snapshot into the cache.
    ///
    /// Tasks absent from the snapshot are dropped; new ones are taken as is.
    pub fn reconcile(&mut self, snapshot: Vec<TaskRecord>) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let mut next = BTreeMap::new();

        for server in snapshot {
            let merged = match self.tasks.remove(&server.id) {
                Some(local) => {
                    let merged = self.policies.merge(&local, &server);
                    if merged.total_time_logged > server.total_time_logged {
                        report.kept_local_time += 1;
                    }
                    if merged != local {
                        report.updated += 1;
                    }
                    merged
                }
                None => {
                    report.inserted += 1;
                    server
                }
            };
            next.insert(merged.id, merged);
        }

        report.removed = self.tasks.len();
        self.tasks = next;
        report
    }

    /// Optimistically add focus time to a cached task when a timer stops.
    ///
    /// Returns the new local total.
    pub fn log_time_locally(&mut self, task_id: Uuid, seconds: u64) -> DomainResult<u64> {
        let task = self
            .tasks
            .get_mut(&task_id)
            .ok_or(DomainError::TaskNotFound(task_id))?;
        task.total_time_logged = task.total_time_logged.saturating_add(seconds);
        Ok(task.total_time_logged)
    }
}

/// Keeps a shared [`LocalTaskCache`] fed from a snapshot channel.
#[derive(Clone)]
pub struct ClientStateReconciler {
    user_id: UserId,
    cache: Arc<RwLock<LocalTaskCache>>,
}

impl ClientStateReconciler {
    pub fn new(user_id: UserId, policies: MergePolicyTable) -> Self {
        Self {
            user_id,
            cache: Arc::new(RwLock::new(LocalTaskCache::new(policies))),
        }
    }

    pub fn cache(&self) -> Arc<RwLock<LocalTaskCache>> {
        self.cache.clone()
    }

    pub async fn apply(&self, snapshot: TaskSnapshot) -> Option<ReconcileReport> {
        if snapshot.user_id != self.user_id {
            return None;
        }
        let report = self.cache.write().await.reconcile(snapshot.tasks);
        debug!(
            user_id = %self.user_id,
            inserted = report.inserted,
            updated = report.updated,
            removed = report.removed,
            "snapshot reconciled"
        );
        Some(report)
    }

    pub async fn log_time_locally(&self, task_id: Uuid, seconds: u64) -> DomainResult<u64> {
        self.cache.write().await.log_time_locally(task_id, seconds)
    }

    /// Apply snapshots until the channel closes.
    pub fn spawn(self, mut receiver: broadcast::Receiver<TaskSnapshot>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(snapshot) => {
                        self.apply(snapshot).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // Snapshots are full state, the next one catches us up.
                        warn!(
                            user_id = %self.user_id,
                            skipped,
                            "reconciler lagged behind snapshots"
                        );
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!(
                            user_id = %self.user_id,
                            "snapshot channel closed, reconciler stopping"
                        );
                        break;
                    }
                }
            }
        })
    }
}

/// Publishes full task snapshots read from the store.
#[derive(Clone)]
pub struct TaskSnapshotPublisher {
    tasks: Arc<dyn TaskRepository>,
    sender: broadcast::Sender<TaskSnapshot>,
}

impl TaskSnapshotPublisher {
    pub fn new(tasks: Arc<dyn TaskRepository>, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { tasks, sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TaskSnapshot> {
        self.sender.subscribe()
    }

    /// Read the user's tasks and send them to every subscriber.
    ///
    /// Returns how many subscribers received the snapshot.
    pub async fn publish(&self, user_id: &UserId) -> DomainResult<usize> {
        let tasks = self.tasks.list(user_id, TaskFilter::default()).await?;
        let snapshot = TaskSnapshot {
            user_id: user_id.clone(),
            tasks,
            taken_at: Utc::now(),
        };
        Ok(self.sender.send(snapshot).unwrap_or(0))
    }
}
