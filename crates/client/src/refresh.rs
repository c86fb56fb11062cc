//! Single-flight coordination for token refresh.
//!
//! The first caller to need a refresh starts it; every caller that arrives
//! while it is in flight awaits the same shared future instead of issuing its
//! own network call. The slot is cleared when the refresh settles, so the next
//! failure after that starts a fresh refresh.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};

use offerdesk_auth::Session;

use crate::RefreshError;

type SharedRefresh<T> = Shared<BoxFuture<'static, Result<T, RefreshError>>>;

struct InFlight<T> {
    id: u64,
    future: SharedRefresh<T>,
}

type Slot<T> = Mutex<Option<InFlight<T>>>;

/// Explicit single-flight coordinator owned by the client.
///
/// Without a timeout, a refresh that never settles blocks every waiter
/// indefinitely.
pub struct RefreshCoordinator<T = Session> {
    slot: Arc<Slot<T>>,
    started: AtomicU64,
    timeout: Option<Duration>,
}

fn lock<T>(slot: &Slot<T>) -> MutexGuard<'_, Option<InFlight<T>>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T> RefreshCoordinator<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
            started: AtomicU64::new(0),
            timeout,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Whether a refresh is currently in flight.
    pub fn is_refreshing(&self) -> bool {
        lock(&self.slot).is_some()
    }

    /// Number of refreshes started over the coordinator's lifetime.
    pub fn refreshes_started(&self) -> u64 {
        self.started.load(Ordering::SeqCst)
    }

    /// Await the in-flight refresh, or start one with `start` if none is running.
    ///
    /// `start` is only invoked when this caller becomes the leader.
    pub async fn run<F, Fut>(&self, start: F) -> Result<T, RefreshError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, RefreshError>> + Send + 'static,
    {
        let flight = {
            let mut slot = lock(&self.slot);
            match slot.as_ref() {
                Some(in_flight) => {
                    tracing::debug!(flight = in_flight.id, "joining in-flight token refresh");
                    in_flight.future.clone()
                }
                None => {
                    let id = self.started.fetch_add(1, Ordering::SeqCst) + 1;
                    tracing::debug!(flight = id, "starting token refresh");
                    let future =
                        settle(Arc::downgrade(&self.slot), id, self.timeout, start())
                            .boxed()
                            .shared();
                    *slot = Some(InFlight {
                        id,
                        future: future.clone(),
                    });
                    future
                }
            }
        };

        flight.await
    }
}

/// Drive the refresh, then release the slot if it still belongs to this flight.
async fn settle<T, Fut>(
    slot: Weak<Slot<T>>,
    id: u64,
    timeout: Option<Duration>,
    refresh: Fut,
) -> Result<T, RefreshError>
where
    Fut: Future<Output = Result<T, RefreshError>>,
{
    let outcome = match timeout {
        Some(limit) => tokio::time::timeout(limit, refresh)
            .await
            .unwrap_or(Err(RefreshError::TimedOut(limit))),
        None => refresh.await,
    };

    if let Some(slot) = slot.upgrade() {
        let mut guard = lock(&slot);
        if guard.as_ref().is_some_and(|in_flight| in_flight.id == id) {
            *guard = None;
        }
    }

    outcome
}
