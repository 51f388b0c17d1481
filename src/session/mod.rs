//! Multi-account session management.
//!
//! Provides:
//! - A session store holding every locally known identity and the pointer to
//!   the one currently authorizing requests
//! - A key-value persistence seam with SQLite and in-memory backends
//! - Render-time guards that redirect on authentication state
//!
//! ## Design Decisions
//! - The store is an explicit owned object wired in by the composition root,
//!   never a process-wide singleton — tests construct isolated instances.
//! - In-memory state is the authority within a running process; persistence
//!   writes that fail are logged and swallowed so nothing here is fatal.
//! - Removing the active identity falls back to the first remaining entry in
//!   insertion order (or none when the store empties).

pub mod guard;
pub mod storage;
pub mod store;

pub use guard::{guest_only, require_auth, GuardOutcome, Navigator};
pub use storage::{MemoryStateStore, SqliteStateStore, StateStore, StorageError};
pub use store::{AuthStorage, IdentityRecord, SessionError, SessionStore, UserProfile};
