//! Single-flight session refresh.
//!
//! Flow Overview:
//! 1) The first request that sees a `401` becomes the leader and runs the refresh.
//! 2) Requests that fail while the leader is in flight queue a `oneshot` waiter
//!    (FIFO) and receive the leader's outcome.
//! 3) A request whose `401` was caused by a token that has already been replaced
//!    skips the refresh and replays with the current token.
//!
//! The in-flight flag and the waiter queue are the only shared state; the lock is
//! never held across an `.await`.

use crate::error::ApiError;
use secrecy::{ExposeSecret, SecretString};
use std::{
    collections::VecDeque,
    future::Future,
    mem,
    sync::{Mutex, MutexGuard, PoisonError},
};
use tokio::sync::oneshot;
use tracing::debug;

pub(crate) type RefreshResult = Result<SecretString, ApiError>;

#[derive(Default)]
struct GateState {
    in_flight: bool,
    waiters: VecDeque<oneshot::Sender<RefreshResult>>,
}

#[derive(Default)]
pub(crate) struct RefreshGate {
    state: Mutex<GateState>,
}

impl RefreshGate {
    /// Obtains a fresh session token, running `refresh` only if no other caller
    /// is already doing so and `stale` is still the current token.
    pub(crate) async fn refresh<C, F, Fut>(
        &self,
        stale: Option<&SecretString>,
        current: C,
        refresh: F,
    ) -> RefreshResult
    where
        C: Fn() -> Option<SecretString>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = RefreshResult>,
    {
        let waiter = {
            let mut state = self.lock();
            if state.in_flight {
                let (tx, rx) = oneshot::channel();
                state.waiters.push_back(tx);
                Some(rx)
            } else {
                if let Some(token) = superseded(stale, current()) {
                    debug!("session token already refreshed, replaying");
                    return Ok(token);
                }
                state.in_flight = true;
                None
            }
        };

        if let Some(rx) = waiter {
            debug!("refresh in flight, queued behind leader");
            return rx.await.unwrap_or_else(|_| Err(interrupted()));
        }

        let mut flight = Flight {
            gate: self,
            settled: false,
        };
        let result = refresh().await;
        flight.settle(&result);
        result
    }

    #[cfg(test)]
    pub(crate) fn is_in_flight(&self) -> bool {
        self.lock().in_flight
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Returns the current token if it differs from the one that was rejected.
fn superseded(stale: Option<&SecretString>, current: Option<SecretString>) -> Option<SecretString> {
    let current = current?;
    match stale {
        Some(stale) if stale.expose_secret() == current.expose_secret() => None,
        Some(_) => Some(current),
        None => None,
    }
}

fn interrupted() -> ApiError {
    ApiError::AuthenticationExpired("Session refresh was interrupted.".to_string())
}

/// Leader bookkeeping. Dropping an unsettled flight (the leader's future was
/// cancelled) releases the gate and fails every queued waiter.
struct Flight<'a> {
    gate: &'a RefreshGate,
    settled: bool,
}

impl Flight<'_> {
    fn settle(&mut self, result: &RefreshResult) {
        self.settled = true;
        let waiters = {
            let mut state = self.gate.lock();
            state.in_flight = false;
            mem::take(&mut state.waiters)
        };
        for waiter in waiters {
            let _ = waiter.send(result.clone());
        }
    }
}

impl Drop for Flight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.settle(&Err(interrupted()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };
    use std::time::Duration;

    fn secret(value: &str) -> SecretString {
        SecretString::from(value)
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_refresh() {
        let gate = Arc::new(RefreshGate::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let stale = secret("old");

        let run = |gate: Arc<RefreshGate>, calls: Arc<AtomicUsize>, stale: SecretString| async move {
            gate.refresh(
                Some(&stale),
                || Some(secret("old")),
                || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok(secret("new"))
                },
            )
            .await
        };

        let (a, b, c) = tokio::join!(
            run(gate.clone(), calls.clone(), stale.clone()),
            run(gate.clone(), calls.clone(), stale.clone()),
            run(gate.clone(), calls.clone(), stale.clone()),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        for result in [a, b, c] {
            assert_eq!(
                result.map(|token| token.expose_secret().to_string()),
                Ok("new".to_string())
            );
        }
        assert!(!gate.is_in_flight());
    }

    #[tokio::test]
    async fn waiters_share_the_failure() {
        let gate = Arc::new(RefreshGate::default());
        let stale = secret("old");

        let leader = gate.refresh(
            Some(&stale),
            || Some(secret("old")),
            || async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Err(ApiError::AuthenticationExpired("refresh rejected".to_string()))
            },
        );
        let follower = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            gate.refresh(Some(&stale), || Some(secret("old")), || async {
                Ok(secret("unexpected"))
            })
            .await
        };

        let (leader, follower) = tokio::join!(leader, follower);
        assert!(matches!(leader, Err(ApiError::AuthenticationExpired(_))));
        assert!(matches!(follower, Err(ApiError::AuthenticationExpired(message)) if message == "refresh rejected"));
    }

    #[tokio::test]
    async fn superseded_token_skips_refresh() {
        let gate = RefreshGate::default();
        let stale = secret("old");
        let result = gate
            .refresh(Some(&stale), || Some(secret("new")), || async {
                Err(ApiError::Network("should not run".to_string()))
            })
            .await;
        assert_eq!(
            result.map(|token| token.expose_secret().to_string()),
            Ok("new".to_string())
        );
    }

    #[tokio::test]
    async fn cancelled_leader_releases_waiters() {
        let gate = Arc::new(RefreshGate::default());
        let stale = secret("old");

        let leader = {
            let gate = gate.clone();
            let stale = stale.clone();
            tokio::spawn(async move {
                gate.refresh(Some(&stale), || Some(secret("old")), || async {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(secret("never"))
                })
                .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(gate.is_in_flight());

        let follower = {
            let gate = gate.clone();
            tokio::spawn(async move {
                gate.refresh(Some(&stale), || Some(secret("old")), || async {
                    Ok(secret("unused"))
                })
                .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        leader.abort();

        let follower = follower.await;
        assert!(matches!(follower, Ok(Err(ApiError::AuthenticationExpired(_)))));
        assert!(!gate.is_in_flight());
    }
}
