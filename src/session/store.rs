//! Multi-account session store.
//!
//! Holds every identity signed in on this client plus the pointer to the one
//! currently authorizing requests. Admin staff often operate a school from
//! two or three accounts (e.g. registrar and accountant); the store lets them
//! switch without re-entering credentials.
//!
//! ## Invariants
//! - At most one record per `user_id` (upserts are last-write-wins)
//! - The active pointer is either unset or names a present record
//!
//! Both hold after every operation and are repaired on load if a stale blob
//! violates them.
//!
//! ## Persistence
//! Every mutation writes the whole aggregate as JSON through the configured
//! [`StateStore`] backend before returning. The in-memory state is the
//! authority within a running process: a failed write is logged at WARN and
//! the operation still succeeds, the next start may simply not see it.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;

use super::storage::{StateStore, StorageError, AUTH_STORAGE_KEY};

/// Profile of the user owning a stored credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// One locally stored credential plus its owning user's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub user_id: String,
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Unix timestamp after which the token is no longer valid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    pub user: UserProfile,
}

impl IdentityRecord {
    /// Whether the credential has expired as of `now` (Unix seconds).
    /// Records without an expiry never expire locally.
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at.is_some_and(|t| t <= now)
    }
}

/// The persisted aggregate: every known identity plus the active pointer.
///
/// `sessions` is a Vec to preserve insertion order for account listings;
/// key uniqueness is enforced by the store's operations, not the container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthStorage {
    #[serde(default)]
    pub active_user_id: Option<String>,
    #[serde(default)]
    pub sessions: Vec<IdentityRecord>,
}

impl AuthStorage {
    fn position_of(&self, user_id: &str) -> Option<usize> {
        self.sessions.iter().position(|r| r.user_id == user_id)
    }

    /// Repair a loaded aggregate: collapse duplicate keys (keeping the
    /// newest record in the oldest slot, matching upsert semantics) and
    /// clear an active pointer that names no record.
    fn repair(&mut self) {
        let mut deduped: Vec<IdentityRecord> = Vec::with_capacity(self.sessions.len());
        for record in self.sessions.drain(..) {
            match deduped.iter().position(|r| r.user_id == record.user_id) {
                Some(idx) => deduped[idx] = record,
                None => deduped.push(record),
            }
        }
        self.sessions = deduped;

        if let Some(active) = &self.active_user_id {
            if self.position_of(active).is_none() {
                tracing::warn!(user_id = %active, "dropping dangling active pointer from stored state");
                self.active_user_id = None;
            }
        }
    }
}

/// Errors surfaced to callers of the session store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("no stored session for user `{user_id}`")]
    NotFound { user_id: String },
}

/// Thread-safe store over the [`AuthStorage`] aggregate.
///
/// All mutations run under one internal mutex, so overlapping calls
/// (including two racing account switches) serialize. Subscribers observe a
/// generation counter that bumps on every mutation.
pub struct SessionStore {
    state: Mutex<AuthStorage>,
    backend: Arc<dyn StateStore>,
    generation: watch::Sender<u64>,
}

impl SessionStore {
    /// Load the store from the backend. A missing key yields an empty store
    /// (first use); an unreadable or corrupt blob is logged and also yields
    /// an empty store — nothing here is allowed to take the client down.
    pub fn open(backend: Arc<dyn StateStore>) -> Self {
        let mut state = match backend.read(AUTH_STORAGE_KEY) {
            Ok(Some(blob)) => match serde_json::from_str::<AuthStorage>(&blob) {
                Ok(state) => state,
                Err(e) => {
                    tracing::warn!(error = %e, "stored auth state is corrupt; starting empty");
                    AuthStorage::default()
                }
            },
            Ok(None) => AuthStorage::default(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read stored auth state; starting empty");
                AuthStorage::default()
            }
        };
        state.repair();

        let (generation, _) = watch::channel(0);
        Self {
            state: Mutex::new(state),
            backend,
            generation,
        }
    }

    // ── Reads ───────────────────────────────────────────────────

    /// The identity currently authorizing requests, if any.
    pub fn active_identity(&self) -> Option<IdentityRecord> {
        let state = self.state.lock();
        let active = state.active_user_id.as_deref()?;
        state
            .sessions
            .iter()
            .find(|r| r.user_id == active)
            .cloned()
    }

    /// Every known identity, in insertion order of the current snapshot.
    pub fn identities(&self) -> Vec<IdentityRecord> {
        self.state.lock().sessions.clone()
    }

    /// Number of identities currently stored.
    pub fn len(&self) -> usize {
        self.state.lock().sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Watch for mutations; the value is a generation counter.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.generation.subscribe()
    }

    // ── Mutations ───────────────────────────────────────────────

    /// Insert or replace the record keyed by `record.user_id`
    /// (last-write-wins). A replacement keeps the entry's original list
    /// position. The active pointer only moves when `activate` is set.
    pub fn add_or_update(&self, record: IdentityRecord, activate: bool) {
        let mut state = self.state.lock();
        match state.position_of(&record.user_id) {
            Some(idx) => {
                tracing::info!(user_id = %record.user_id, "replacing stored session");
                state.sessions[idx] = record.clone();
            }
            None => {
                tracing::info!(user_id = %record.user_id, "adding session");
                state.sessions.push(record.clone());
            }
        }
        if activate {
            state.active_user_id = Some(record.user_id);
        }
        self.persist(&state);
        drop(state);
        self.notify();
    }

    /// Re-point the active pointer at an already stored identity.
    ///
    /// Callers switching accounts must follow this with credential-scoped
    /// invalidation of any response caches, so no cached data from the
    /// previous identity survives the switch.
    pub fn switch_active(&self, user_id: &str) -> Result<(), SessionError> {
        let mut state = self.state.lock();
        if state.position_of(user_id).is_none() {
            return Err(SessionError::NotFound {
                user_id: user_id.to_string(),
            });
        }
        tracing::info!(user_id = %user_id, "switching active session");
        state.active_user_id = Some(user_id.to_string());
        self.persist(&state);
        drop(state);
        self.notify();
        Ok(())
    }

    /// Remove one identity. Removing the active one falls back to the first
    /// remaining entry in insertion order, or none when the store empties.
    pub fn remove(&self, user_id: &str) -> Result<(), SessionError> {
        let mut state = self.state.lock();
        let Some(idx) = state.position_of(user_id) else {
            return Err(SessionError::NotFound {
                user_id: user_id.to_string(),
            });
        };
        state.sessions.remove(idx);
        tracing::info!(user_id = %user_id, "removed session");

        if state.active_user_id.as_deref() == Some(user_id) {
            state.active_user_id = state.sessions.first().map(|r| r.user_id.clone());
            match &state.active_user_id {
                Some(next) => tracing::info!(user_id = %next, "active session fell back"),
                None => tracing::info!("no sessions remain"),
            }
        }
        self.persist(&state);
        drop(state);
        self.notify();
        Ok(())
    }

    /// Drop every identity and clear the active pointer (full logout).
    pub fn clear_all(&self) {
        let mut state = self.state.lock();
        state.sessions.clear();
        state.active_user_id = None;
        tracing::info!("cleared all sessions");
        self.persist(&state);
        drop(state);
        self.notify();
    }

    // ── Internals ───────────────────────────────────────────────

    fn persist(&self, state: &AuthStorage) {
        if let Err(e) = self.try_persist(state) {
            tracing::warn!(error = %e, "failed to persist auth state; continuing with in-memory state");
        }
    }

    fn try_persist(&self, state: &AuthStorage) -> Result<(), StorageError> {
        let blob = serde_json::to_string(state)?;
        self.backend.write(AUTH_STORAGE_KEY, &blob)
    }

    fn notify(&self) {
        self.generation.send_modify(|g| *g += 1);
    }
}

// ── Tests ───────────────────────────────────────────────────────
