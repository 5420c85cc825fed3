//! Cancellation carried through adapter boundary calls.
//!
//! A [`CallContext`] travels with every platform call. When its [`CancelToken`]
//! fires the in-flight call is abandoned and resolves with [`ApiError::Cancelled`];
//! side effects the platform already applied are left in place.

use crate::error::ApiError;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

/// Cloneable cancellation signal. All clones observe the same state.
#[derive(Clone, Debug)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the token is cancelled.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                // Sender is owned by every clone, so this only happens on teardown
                std::future::pending::<()>().await;
            }
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-call context handed to adapters.
#[derive(Clone, Debug, Default)]
pub struct CallContext {
    cancel: Option<CancelToken>,
}

impl CallContext {
    /// Context with no cancellation path.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_cancel(token: CancelToken) -> Self {
        Self {
            cancel: Some(token),
        }
    }

    pub fn token(&self) -> Option<&CancelToken> {
        self.cancel.as_ref()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    /// Fail fast if already cancelled.
    pub fn check(&self, operation: &str) -> Result<(), ApiError> {
        if self.is_cancelled() {
            return Err(ApiError::Cancelled(operation.to_string()));
        }
        Ok(())
    }

    /// Race `fut` against this context's token.
    pub async fn run<T, F>(&self, operation: &str, fut: F) -> Result<T, ApiError>
    where
        F: Future<Output = Result<T, ApiError>>,
    {
        self.check(operation)?;
        match &self.cancel {
            None => fut.await,
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(ApiError::Cancelled(operation.to_string())),
                    result = fut => result,
                }
            }
        }
    }
}
