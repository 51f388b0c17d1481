//! Render-time auth guards.
//!
//! Authenticated screens wrap themselves in `require_auth`; the sign-in and
//! sign-up screens wrap themselves in `guest_only`. Both are pure functions
//! of the store's active identity evaluated at render time; a redirect is a
//! one-shot side effect performed through the [`Navigator`] collaborator.

use super::store::SessionStore;

/// Route shown to signed-out visitors.
pub const SIGN_IN_ROUTE: &str = "/auth/sign-in";

/// Landing route for authenticated staff.
pub const DASHBOARD_ROUTE: &str = "/dashboard";

/// Client-side navigation collaborator.
pub trait Navigator {
    fn navigate(&self, path: &str);
}

/// What a guard decided for the current render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Render the wrapped content.
    Render,
    /// Navigate away instead of rendering.
    Redirect(&'static str),
}

impl GuardOutcome {
    /// Perform the redirect, if any. Returns whether rendering may proceed.
    pub fn enforce(self, navigator: &dyn Navigator) -> bool {
        match self {
            GuardOutcome::Render => true,
            GuardOutcome::Redirect(path) => {
                tracing::debug!(path = %path, "guard redirect");
                navigator.navigate(path);
                false
            }
        }
    }
}

/// Redirect to sign-in unless an active identity exists.
pub fn require_auth(store: &SessionStore) -> GuardOutcome {
    if store.active_identity().is_some() {
        GuardOutcome::Render
    } else {
        GuardOutcome::Redirect(SIGN_IN_ROUTE)
    }
}

/// Redirect signed-in staff to the dashboard; render for guests.
pub fn guest_only(store: &SessionStore) -> GuardOutcome {
    if store.active_identity().is_some() {
        GuardOutcome::Redirect(DASHBOARD_ROUTE)
    } else {
        GuardOutcome::Render
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::storage::MemoryStateStore;
    use crate::session::store::{IdentityRecord, UserProfile};
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Default)]
    struct RecordingNavigator {
        visited: Mutex<Vec<String>>,
    }

    impl Navigator for RecordingNavigator {
        fn navigate(&self, path: &str) {
            self.visited.lock().push(path.to_string());
        }
    }

    fn signed_in_store() -> SessionStore {
        let store = SessionStore::open(Arc::new(MemoryStateStore::default()));
        store.add_or_update(
            IdentityRecord {
                user_id: "u1".to_string(),
                token: "tok".to_string(),
                refresh_token: None,
                expires_at: None,
                user: UserProfile {
                    id: "u1".to_string(),
                    email: "u1@school.test".to_string(),
                    name: None,
                    role: None,
                },
            },
            true,
        );
        store
    }

    #[test]
    fn require_auth_redirects_guests_to_sign_in() {
        let store = SessionStore::open(Arc::new(MemoryStateStore::default()));
        assert_eq!(
            require_auth(&store),
            GuardOutcome::Redirect(SIGN_IN_ROUTE)
        );
    }

    #[test]
    fn require_auth_renders_for_signed_in() {
        let store = signed_in_store();
        assert_eq!(require_auth(&store), GuardOutcome::Render);
    }

    #[test]
    fn guest_only_redirects_signed_in_to_dashboard() {
        let store = signed_in_store();
        assert_eq!(
            guest_only(&store),
            GuardOutcome::Redirect(DASHBOARD_ROUTE)
        );
    }

    #[test]
    fn guest_only_renders_for_guests() {
        let store = SessionStore::open(Arc::new(MemoryStateStore::default()));
        assert_eq!(guest_only(&store), GuardOutcome::Render);
    }

    #[test]
    fn enforce_navigates_once_and_blocks_render() {
        let navigator = RecordingNavigator::default();
        let store = SessionStore::open(Arc::new(MemoryStateStore::default()));

        assert!(!require_auth(&store).enforce(&navigator));
        assert_eq!(*navigator.visited.lock(), [SIGN_IN_ROUTE.to_string()]);
    }

    #[test]
    fn enforce_is_a_noop_when_rendering() {
        let navigator = RecordingNavigator::default();
        let store = signed_in_store();

        assert!(require_auth(&store).enforce(&navigator));
        assert!(navigator.visited.lock().is_empty());
    }

    #[test]
    fn guards_track_state_transitions() {
        let store = signed_in_store();
        assert_eq!(require_auth(&store), GuardOutcome::Render);

        store.clear_all();
        assert_eq!(
            require_auth(&store),
            GuardOutcome::Redirect(SIGN_IN_ROUTE)
        );
        assert_eq!(guest_only(&store), GuardOutcome::Render);
    }
}
