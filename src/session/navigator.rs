//! Where the user is and how to send them back to the sign-in entry point.
//! The gateway calls [`Navigator::redirect_to_login`] after an irrecoverable
//! refresh failure, unless the user is already on a guest route.

use crate::api::routes::{self, paths};
use std::sync::{
    Mutex, PoisonError,
    atomic::{AtomicUsize, Ordering},
};
use tracing::warn;

pub trait Navigator: Send + Sync {
    /// Path of the view currently shown to the user.
    fn current_route(&self) -> String;

    /// Sends the user to the unauthenticated entry point.
    fn redirect_to_login(&self);

    /// Redirects unless the current route is guest-accessible, which would loop.
    /// Returns `true` if a redirect happened.
    fn session_expired(&self) -> bool {
        if routes::is_guest_route(&self.current_route()) {
            return false;
        }
        self.redirect_to_login();
        true
    }
}

/// In-process route holder used by the terminal front end and tests.
#[derive(Debug)]
pub struct RouteTracker {
    current: Mutex<String>,
    redirects: AtomicUsize,
}

impl RouteTracker {
    #[must_use]
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            current: Mutex::new(initial.into()),
            redirects: AtomicUsize::new(0),
        }
    }

    pub fn navigate(&self, route: impl Into<String>) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = route.into();
    }

    #[must_use]
    pub fn redirects(&self) -> usize {
        self.redirects.load(Ordering::SeqCst)
    }
}

impl Default for RouteTracker {
    fn default() -> Self {
        Self::new(paths::DASHBOARD)
    }
}

impl Navigator for RouteTracker {
    fn current_route(&self) -> String {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn redirect_to_login(&self) {
        warn!("session expired, returning to sign-in");
        self.redirects.fetch_add(1, Ordering::SeqCst);
        self.navigate(paths::LOGIN);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_expired_redirects_from_protected_route() {
        let tracker = RouteTracker::new("/merchants/42");
        assert!(tracker.session_expired());
        assert_eq!(tracker.redirects(), 1);
        assert_eq!(tracker.current_route(), paths::LOGIN);
    }

    #[test]
    fn session_expired_does_not_loop_on_guest_routes() {
        for route in [paths::LOGIN, paths::SET_PASSWORD, "/reset-password?token=abc"] {
            let tracker = RouteTracker::new(route);
            assert!(!tracker.session_expired());
            assert_eq!(tracker.redirects(), 0);
        }
    }
}
