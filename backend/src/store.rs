//! Group persistence.
//!
//! [`GroupStore`] is the document-store contract the service is written
//! against. [`MemoryStore`] implements it in process, optionally mirroring
//! every committed write to a JSON snapshot file.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use santa_core::{Assignments, Group, GroupDraft, GroupId, GroupStatus, Member};
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

const CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("group {0} not found")]
    NotFound(GroupId),
    #[error("update precondition failed")]
    ConditionFailed,
    #[error("{0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A partial update to one group document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupPatch {
    /// Set-union the member into the roster.
    AddMember(Member),
    /// Write the assignments and mark the group generated.
    CompleteDraw(Assignments),
}

impl GroupPatch {
    fn apply(self, group: &mut Group) {
        match self {
            GroupPatch::AddMember(member) => {
                group.add_member(member);
            }
            GroupPatch::CompleteDraw(assignments) => {
                group.assignments = assignments;
                group.status = GroupStatus::Generated;
            }
        }
    }
}

/// Precondition checked atomically with an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    StatusIs(GroupStatus),
}

impl Condition {
    fn holds(&self, group: &Group) -> bool {
        match self {
            Condition::StatusIs(status) => group.status == *status,
        }
    }
}

/// Live feed of a group's committed snapshots. Dropping it unsubscribes.
pub struct Subscription {
    rx: broadcast::Receiver<Group>,
}

impl Subscription {
    /// Waits for the next snapshot; `None` once the group's feed is gone.
    /// A receiver that fell behind gets the newest queued snapshot and
    /// drops the ones in between.
    pub async fn next(&mut self) -> Option<Group> {
        loop {
            match self.rx.recv().await {
                Ok(group) => return Some(group),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "subscriber lagged, skipping ahead");
                    if let Some(latest) = self.drain() {
                        return Some(latest);
                    }
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    fn drain(&mut self) -> Option<Group> {
        let mut latest = None;
        loop {
            match self.rx.try_recv() {
                Ok(group) => latest = Some(group),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return latest,
            }
        }
    }
}

pub trait GroupStore: Send + Sync + 'static {
    fn create(&self, draft: GroupDraft) -> impl Future<Output = StoreResult<GroupId>> + Send;

    fn get_by_id(&self, id: &str) -> impl Future<Output = StoreResult<Group>> + Send;

    /// Applies `patch` if `condition` holds, returning the stored document.
    fn update_by_id(
        &self,
        id: &str,
        patch: GroupPatch,
        condition: Option<Condition>,
    ) -> impl Future<Output = StoreResult<Group>> + Send;

    fn subscribe(&self, id: &str) -> impl Future<Output = StoreResult<Subscription>> + Send;

    fn query_by_member_email(
        &self,
        email: &str,
    ) -> impl Future<Output = StoreResult<Vec<Group>>> + Send;
}

#[derive(Clone)]
pub struct MemoryStore {
    groups: Arc<RwLock<HashMap<GroupId, Group>>>,
    channels: Arc<RwLock<HashMap<GroupId, broadcast::Sender<Group>>>>,
    persist_path: Option<PathBuf>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            groups: Arc::new(RwLock::new(HashMap::new())),
            channels: Arc::new(RwLock::new(HashMap::new())),
            persist_path: None,
        }
    }
}

impl MemoryStore {
    /// Loads groups from `path` if it holds a snapshot, and writes every
    /// later change back to it. A missing file starts an empty store; an
    /// unreadable one is an error, since the next write would replace it.
    pub async fn with_persistence(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let mut store = Self::default();
        store.persist_path = Some(path.clone());

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(store),
            Err(err) => {
                tracing::error!(path = %path.display(), %err, "could not read snapshot");
                return Err(StoreError::Unavailable(format!(
                    "reading {}: {err}",
                    path.display()
                )));
            }
        };

        let saved = serde_json::from_slice::<HashMap<GroupId, Group>>(&bytes).map_err(|err| {
            tracing::error!(path = %path.display(), %err, "snapshot is corrupt");
            StoreError::Unavailable(format!("parsing {}: {err}", path.display()))
        })?;
        tracing::info!(groups = saved.len(), path = %path.display(), "loaded snapshot");
        *store.groups.write().await = saved;
        Ok(store)
    }

    /// Stores `group`, writing the snapshot file first so a failed write
    /// leaves memory untouched. The file is replaced by rename, so readers
    /// never see a partial snapshot.
    async fn commit(&self, groups: &mut HashMap<GroupId, Group>, group: Group) -> StoreResult<()> {
        if let Some(path) = &self.persist_path {
            let mut snapshot = groups.clone();
            snapshot.insert(group.id.clone(), group.clone());
            let json = serde_json::to_vec_pretty(&snapshot)
                .map_err(|err| StoreError::Unavailable(err.to_string()))?;

            let tmp = temp_path(path);
            let written = match tokio::fs::write(&tmp, json).await {
                Ok(()) => tokio::fs::rename(&tmp, path).await,
                Err(err) => Err(err),
            };
            if let Err(err) = written {
                tracing::error!(path = %path.display(), %err, "persist failed");
                let _ = tokio::fs::remove_file(&tmp).await;
                return Err(StoreError::Unavailable(err.to_string()));
            }
        }
        groups.insert(group.id.clone(), group);
        Ok(())
    }

    /// Sends `group` to its subscribers and forgets the channel once the
    /// last one is gone.
    async fn notify(&self, group: &Group) {
        let mut channels = self.channels.write().await;
        let Some(tx) = channels.get(&group.id) else {
            return;
        };
        if tx.receiver_count() == 0 {
            channels.remove(&group.id);
        } else {
            let _ = tx.send(group.clone());
        }
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

impl GroupStore for MemoryStore {
    async fn create(&self, draft: GroupDraft) -> StoreResult<GroupId> {
        let id = Uuid::new_v4().to_string();
        let group = Group::from_draft(id.clone(), draft, now_millis());

        let mut groups = self.groups.write().await;
        self.commit(&mut groups, group).await?;
        drop(groups);

        Ok(id)
    }

    async fn get_by_id(&self, id: &str) -> StoreResult<Group> {
        self.groups
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn update_by_id(
        &self,
        id: &str,
        patch: GroupPatch,
        condition: Option<Condition>,
    ) -> StoreResult<Group> {
        let mut groups = self.groups.write().await;
        let current = groups
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if let Some(condition) = condition {
            if !condition.holds(current) {
                return Err(StoreError::ConditionFailed);
            }
        }

        let mut updated = current.clone();
        patch.apply(&mut updated);
        if updated == *current {
            return Ok(updated);
        }

        self.commit(&mut groups, updated.clone()).await?;
        drop(groups);

        self.notify(&updated).await;
        Ok(updated)
    }

    async fn subscribe(&self, id: &str) -> StoreResult<Subscription> {
        if !self.groups.read().await.contains_key(id) {
            return Err(StoreError::NotFound(id.to_string()));
        }
        let rx = self
            .channels
            .write()
            .await
            .entry(id.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe();
        Ok(Subscription { rx })
    }

    async fn query_by_member_email(&self, email: &str) -> StoreResult<Vec<Group>> {
        let mut matches: Vec<Group> = self
            .groups
            .read()
            .await
            .values()
            .filter(|g| g.has_member(email))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(matches)
    }
}
