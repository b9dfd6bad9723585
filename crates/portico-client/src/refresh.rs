//! Single-flight token refresh.
//!
//! Any number of requests can hit a 401 at the same moment. The first one to
//! reach [`RefreshCoordinator::refresh`] runs the refresher; everyone arriving
//! while it is in flight is queued and released with its outcome.

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::credentials::AuthOptions;
use crate::error::Result;
use crate::normalize::{TransportFailure, normalize};

type Waiter = oneshot::Sender<Option<String>>;

#[derive(Debug, Default)]
enum RefreshState {
    #[default]
    Idle,
    Refreshing {
        waiters: Vec<Waiter>,
    },
}

/// Deduplicates concurrent refresh attempts for one dispatcher.
#[derive(Debug, Default)]
pub struct RefreshCoordinator {
    state: Mutex<RefreshState>,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a refresh is in flight.
    pub fn is_refreshing(&self) -> bool {
        matches!(*self.state.lock(), RefreshState::Refreshing { .. })
    }

    /// Number of callers currently waiting on the in-flight refresh.
    pub fn waiter_count(&self) -> usize {
        match &*self.state.lock() {
            RefreshState::Idle => 0,
            RefreshState::Refreshing { waiters } => waiters.len(),
        }
    }

    /// Obtain a new access token, sharing one refresh among concurrent callers.
    ///
    /// Returns `Ok(None)` when no refresher is configured, or when this caller
    /// waited on a refresh that failed. Only the caller that actually ran the
    /// refresher sees its error.
    ///
    /// `cancel` only applies while waiting on someone else's refresh: a
    /// cancelled waiter leaves the queue with a canceled error. The refresher
    /// itself always runs to completion so the other waiters get its outcome.
    pub async fn refresh(
        &self,
        auth: &AuthOptions,
        cancel: Option<&CancellationToken>,
    ) -> Result<Option<String>> {
        let Some(refresher) = auth.refresher.as_ref() else {
            return Ok(None);
        };

        // Check-and-set under the lock; nothing here may await.
        let waiter = {
            let mut state = self.state.lock();
            match &mut *state {
                RefreshState::Refreshing { waiters } => {
                    let (tx, rx) = oneshot::channel();
                    waiters.push(tx);
                    tracing::debug!(position = waiters.len(), "waiting on in-flight token refresh");
                    Some(rx)
                }
                RefreshState::Idle => {
                    *state = RefreshState::Refreshing {
                        waiters: Vec::new(),
                    };
                    None
                }
            }
        };

        if let Some(rx) = waiter {
            let token = match cancel {
                Some(cancel) => tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        tracing::debug!("stopped waiting on token refresh: request canceled");
                        return Err(normalize(TransportFailure::Canceled));
                    }
                    token = rx => token.unwrap_or(None),
                },
                None => rx.await.unwrap_or(None),
            };
            if token.is_none() {
                tracing::warn!("token refresh did not produce a token");
            }
            return Ok(token);
        }

        let mut flight = InFlight {
            coordinator: self,
            settled: false,
        };

        tracing::info!("refreshing access token");
        let refresh_token = auth.provider.refresh_token();
        match refresher.refresh(refresh_token).await {
            Ok(tokens) => {
                auth.provider.set_tokens(&tokens);
                flight.settle(Some(tokens.access_token.clone()));
                tracing::info!("access token refreshed");
                Ok(Some(tokens.access_token))
            }
            Err(e) => {
                flight.settle(None);
                tracing::warn!(error = %e, "token refresh failed");
                Err(e)
            }
        }
    }

    /// Reset to idle and release every waiter, in enqueue order.
    fn release(&self, token: Option<String>) {
        let waiters = match std::mem::take(&mut *self.state.lock()) {
            RefreshState::Idle => Vec::new(),
            RefreshState::Refreshing { waiters } => waiters,
        };
        for waiter in waiters {
            // A waiter whose request was dropped is simply gone.
            let _ = waiter.send(token.clone());
        }
    }
}

/// Settles the refresh even if the initiating future is dropped mid-flight.
struct InFlight<'a> {
    coordinator: &'a RefreshCoordinator,
    settled: bool,
}

impl InFlight<'_> {
    fn settle(&mut self, token: Option<String>) {
        self.settled = true;
        self.coordinator.release(token);
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.coordinator.release(None);
        }
    }
}
