//! The in-memory content store.
//!
//! [`ContentStore`] owns the current [`Snapshot`] and keeps it in step with the database and the
//! local cache:
//!
//! - [`ContentStore::load`] reads the database when it is reachable, the cache otherwise, and
//!   falls back to the seed defaults; a read never fails.
//! - every mutation bumps a revision and wakes the debouncer, which saves once the edits have
//!   been quiet for `sync.save_debounce`.
//! - the poller reloads from the database every `sync.poll_interval` while connected, subject
//!   to the configured [`ConflictPolicy`].

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::{
    sync::{Mutex, Notify, RwLock},
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;

use super::{cache::LocalCache, remote::RemoteSync};
use crate::{
    config::{ConflictPolicy, SyncConfig},
    content::{
        ContactPatch, CvPatch, ProfilePatch, Project, Skill, Snapshot, StoredFile, defaults,
        merge::{Merged, merge_over_defaults},
    },
};

/// Where the current content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotSource {
    Remote,
    Cache,
    Defaults,
}

/// How far a save got.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SaveOutcome {
    /// Written to the database and mirrored to the cache
    Remote,
    /// Written to the local cache only
    LocalOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct LastSave {
    #[schema(value_type = String, format = "date-time")]
    pub at: DateTime<Utc>,
    pub outcome: SaveOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct StoreStatus {
    pub is_loading: bool,
    pub is_database_connected: bool,
    /// Edits made since the last save
    pub pending_edits: bool,
    pub revision: u64,
    pub last_save: Option<LastSave>,
}

struct State {
    snapshot: Snapshot,
    is_loading: bool,
    is_database_connected: bool,
    revision: u64,
    saved_revision: u64,
    last_save: Option<LastSave>,
}

struct Inner {
    remote: Arc<RemoteSync>,
    cache: LocalCache,
    save_debounce: Duration,
    poll_interval: Duration,
    conflict_policy: ConflictPolicy,
    state: RwLock<State>,
    /// Held for the whole of a load, save or reset so they never interleave
    persist: Mutex<()>,
    edited: Notify,
}

/// Shared handle to the content store. Cheap to clone.
#[derive(Clone)]
pub struct ContentStore {
    inner: Arc<Inner>,
}

impl ContentStore {
    pub fn new(remote: Arc<RemoteSync>, config: &SyncConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                remote,
                cache: LocalCache::new(&config.cache_dir),
                save_debounce: config.save_debounce,
                poll_interval: config.poll_interval,
                conflict_policy: config.conflict_policy,
                state: RwLock::new(State {
                    snapshot: defaults::seed(),
                    is_loading: true,
                    is_database_connected: false,
                    revision: 0,
                    saved_revision: 0,
                    last_save: None,
                }),
                persist: Mutex::new(()),
                edited: Notify::new(),
            }),
        }
    }

    pub fn remote(&self) -> &Arc<RemoteSync> {
        &self.inner.remote
    }

    /// Reload content, preferring the database, then the cache, then the seed defaults.
    ///
    /// Edits made while the read is in flight are kept under
    /// [`ConflictPolicy::PreserveLocalEdits`] and stay pending either way.
    #[instrument(skip(self))]
    pub async fn load(&self) -> SnapshotSource {
        let _persist = self.inner.persist.lock().await;
        let started_at = {
            let mut state = self.inner.state.write().await;
            state.is_loading = true;
            state.revision
        };

        let mut connected = self.inner.remote.check_availability().await;
        let (snapshot, source) = if connected {
            match self.inner.remote.load_all().await {
                Ok(Some(document)) => (self.merged(merge_over_defaults(&document), "database"), SnapshotSource::Remote),
                Ok(None) => {
                    info!("No stored content yet, using defaults");
                    (defaults::seed(), SnapshotSource::Defaults)
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load content from database, falling back to cache");
                    connected = false;
                    self.from_cache().await
                }
            }
        } else {
            self.from_cache().await
        };

        let mut state = self.inner.state.write().await;
        let edited_meanwhile = state.revision != started_at;
        if edited_meanwhile && self.inner.conflict_policy == ConflictPolicy::PreserveLocalEdits {
            debug!(started_at, revision = state.revision, "Keeping edits made during reload");
        } else {
            state.snapshot = snapshot;
            state.saved_revision = state.saved_revision.max(started_at);
        }
        state.is_database_connected = connected;
        state.is_loading = false;
        drop(state);

        info!(?source, connected, "Content loaded");
        source
    }

    async fn from_cache(&self) -> (Snapshot, SnapshotSource) {
        match self.inner.cache.read().await {
            Some(document) => (self.merged(merge_over_defaults(&document), "cache"), SnapshotSource::Cache),
            None => (defaults::seed(), SnapshotSource::Defaults),
        }
    }

    fn merged(&self, merged: Merged, origin: &str) -> Snapshot {
        if !merged.fallbacks.is_empty() {
            warn!(origin, fallbacks = ?merged.fallbacks, "Stored content had invalid sections, using defaults for them");
        }
        merged.snapshot
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.inner.state.read().await.snapshot.clone()
    }

    pub async fn status(&self) -> StoreStatus {
        let state = self.inner.state.read().await;
        StoreStatus {
            is_loading: state.is_loading,
            is_database_connected: state.is_database_connected,
            pending_edits: state.revision != state.saved_revision,
            revision: state.revision,
            last_save: state.last_save,
        }
    }

    /// Apply `edit` and schedule a debounced save. Returns the content after the edit.
    async fn mutate<F>(&self, edit: F) -> Snapshot
    where
        F: FnOnce(&mut Snapshot),
    {
        let mut state = self.inner.state.write().await;
        edit(&mut state.snapshot);
        state.revision += 1;
        let snapshot = state.snapshot.clone();
        drop(state);

        self.inner.edited.notify_one();
        snapshot
    }

    pub async fn update_profile(&self, patch: ProfilePatch) -> Snapshot {
        self.mutate(|s| patch.apply(&mut s.profile)).await
    }

    pub async fn update_contact(&self, patch: ContactPatch) -> Snapshot {
        self.mutate(|s| patch.apply(&mut s.contact)).await
    }

    pub async fn update_cv(&self, patch: CvPatch) -> Snapshot {
        self.mutate(|s| patch.apply(&mut s.cv)).await
    }

    pub async fn update_skills(&self, skills: Vec<Skill>) -> Snapshot {
        self.mutate(|s| s.skills = skills).await
    }

    pub async fn update_projects(&self, projects: Vec<Project>) -> Snapshot {
        self.mutate(|s| s.projects = projects).await
    }

    pub async fn set_profile_image(&self, url: String) -> Snapshot {
        self.mutate(|s| s.profile.profile_image = url).await
    }

    /// Point a project at a new image. Returns `None` when no project has `project_id`.
    pub async fn set_project_image(&self, project_id: &str, url: String) -> Option<Snapshot> {
        if !self.inner.state.read().await.snapshot.projects.iter().any(|p| p.id == project_id) {
            return None;
        }
        let snapshot = self
            .mutate(|s| {
                if let Some(project) = s.projects.iter_mut().find(|p| p.id == project_id) {
                    project.image = url;
                }
            })
            .await;
        Some(snapshot)
    }

    pub async fn set_cv_file(&self, url: String, file: StoredFile) -> Snapshot {
        self.mutate(|s| {
            s.cv.url = url;
            s.cv.file = Some(file);
        })
        .await
    }

    /// Forget the uploaded CV, returning the URL it was served from.
    pub async fn clear_cv(&self) -> String {
        let mut previous = String::new();
        self.mutate(|s| {
            previous = std::mem::take(&mut s.cv.url);
            s.cv.file = None;
        })
        .await;
        previous
    }

    /// Persist the current content: to the database when connected, always to the cache.
    #[instrument(skip(self))]
    pub async fn save(&self) -> SaveOutcome {
        let _persist = self.inner.persist.lock().await;
        self.save_locked().await
    }

    /// Save with the persist lock already held.
    async fn save_locked(&self) -> SaveOutcome {
        let (snapshot, revision, connected) = {
            let state = self.inner.state.read().await;
            (state.snapshot.clone(), state.revision, state.is_database_connected)
        };

        let outcome = if connected && self.inner.remote.save_all(&snapshot).await {
            SaveOutcome::Remote
        } else {
            SaveOutcome::LocalOnly
        };

        if let Err(e) = self.inner.cache.write(&snapshot).await {
            warn!(error = %e, "Failed to write local cache");
        }

        let mut state = self.inner.state.write().await;
        state.saved_revision = state.saved_revision.max(revision);
        state.last_save = Some(LastSave { at: Utc::now(), outcome });
        drop(state);

        match outcome {
            SaveOutcome::Remote => debug!(revision, "Content saved"),
            SaveOutcome::LocalOnly => warn!(revision, "Content saved to local cache only"),
        }
        outcome
    }

    /// Replace all content with the seed defaults and drop the cache.
    ///
    /// When connected the defaults are saved straight away; offline the store is left with no
    /// pending edits so the debouncer does not resurrect the cache.
    #[instrument(skip(self))]
    pub async fn reset(&self) -> Option<SaveOutcome> {
        let _persist = self.inner.persist.lock().await;
        let connected = {
            let mut state = self.inner.state.write().await;
            state.snapshot = defaults::seed();
            state.revision += 1;
            state.is_database_connected
        };

        if let Err(e) = self.inner.cache.clear().await {
            warn!(error = %e, "Failed to clear local cache");
        }

        if connected {
            return Some(self.save_locked().await);
        }

        let mut state = self.inner.state.write().await;
        state.saved_revision = state.revision;
        None
    }

    /// Start the debouncer and the poller. Both stop when `shutdown` is cancelled.
    pub fn spawn_background(&self, shutdown: CancellationToken) -> Vec<JoinHandle<()>> {
        let debouncer = {
            let store = self.clone();
            let shutdown = shutdown.clone();
            tokio::spawn(async move { store.run_debouncer(shutdown).await })
        };
        let poller = {
            let store = self.clone();
            tokio::spawn(async move { store.run_poller(shutdown).await })
        };
        vec![debouncer, poller]
    }

    async fn run_debouncer(&self, shutdown: CancellationToken) {
        debug!(debounce = ?self.inner.save_debounce, "Save debouncer started");
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    self.save_if_pending().await;
                    break;
                }
                _ = self.inner.edited.notified() => {}
            }

            // Restart the quiet period on every further edit
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        self.save_if_pending().await;
                        debug!("Save debouncer shutting down");
                        return;
                    }
                    _ = self.inner.edited.notified() => continue,
                    _ = tokio::time::sleep(self.inner.save_debounce) => break,
                }
            }

            self.save_if_pending().await;
        }
        debug!("Save debouncer shutting down");
    }

    async fn save_if_pending(&self) {
        let pending = {
            let state = self.inner.state.read().await;
            state.revision != state.saved_revision
        };
        if pending {
            self.save().await;
        }
    }

    async fn run_poller(&self, shutdown: CancellationToken) {
        let period = self.inner.poll_interval;
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!("Content poller shutting down");
                    return;
                }
                _ = ticker.tick() => {}
            }

            let status = self.status().await;
            if !status.is_database_connected || status.is_loading {
                continue;
            }
            if self.inner.conflict_policy == ConflictPolicy::PreserveLocalEdits && status.pending_edits {
                debug!("Skipping reload while edits are pending");
                continue;
            }
            self.load().await;
        }
    }
}
