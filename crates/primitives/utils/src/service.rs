//! Cooperative cancellation for Remora services.
//!
//! Every long-running task (snapshot discovery, the replay consumer, the
//! divergence watcher) receives a [`ServiceContext`] at construction and is
//! expected to wind down promptly once it is cancelled. Cancellation is
//! hierarchical: [`ServiceContext::child`] scopes create local tokens which
//! can be cancelled without affecting the rest of the node, while
//! [`ServiceContext::cancel_global`] stops everything. This is what lets the
//! divergence watcher take the whole node down gracefully when the replayed
//! chain no longer matches its canonical source, instead of aborting the
//! process from a worker thread.

use std::future::Future;

/// Handle over the cancellation state of a service.
///
/// Cheap to clone; clones observe the same global token. A context created
/// with [`ServiceContext::child`] additionally carries a local token scoped
/// to that subtree of services.
#[derive(Clone, Default)]
pub struct ServiceContext {
    token_global: tokio_util::sync::CancellationToken,
    token_local: Option<tokio_util::sync::CancellationToken>,
}

impl ServiceContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stops all services sharing this context's global scope.
    pub fn cancel_global(&self) {
        tracing::info!("🔌 Gracefully shutting down node");

        self.token_global.cancel();
    }

    /// Stops all services under the same local context scope.
    ///
    /// A local scope is created by calling [`ServiceContext::child`]. For a
    /// context without a local scope this is equivalent to
    /// [`ServiceContext::cancel_global`].
    pub fn cancel_local(&self) {
        self.token_local.as_ref().unwrap_or(&self.token_global).cancel();
    }

    /// A future which completes when this context is cancelled, globally or
    /// locally.
    ///
    /// Use this to race against other futures in a [`tokio::select`] or to
    /// keep a task alive for as long as the service itself.
    pub async fn cancelled(&self) {
        let token_global = &self.token_global;
        let token_local = self.token_local.as_ref().unwrap_or(&self.token_global);

        tokio::select! {
            _ = token_global.cancelled() => {}
            _ = token_local.cancelled() => {}
        }
    }

    /// Checks if this context was cancelled, without waiting.
    ///
    /// Suitable inside synchronous sections or alongside short sleeps; prefer
    /// [`ServiceContext::cancelled`] when waiting on a cancel-safe future.
    #[inline(always)]
    pub fn is_cancelled(&self) -> bool {
        self.token_global.is_cancelled() || self.token_local.as_ref().map(|t| t.is_cancelled()).unwrap_or(false)
    }

    /// Runs a [`Future`] until this context is cancelled.
    ///
    /// The future must be cancel-safe: it will be dropped mid-flight if the
    /// service is cancelled.
    ///
    /// # Returns
    ///
    /// The return value of the future wrapped in [`Some`], or [`None`] if the
    /// service was cancelled first.
    pub async fn run_until_cancelled<T, F>(&self, f: F) -> Option<T>
    where
        T: Sized + Send + Sync,
        F: Future<Output = T>,
    {
        tokio::select! {
            res = f => Some(res),
            _ = self.cancelled() => None
        }
    }

    /// Creates a new [`ServiceContext`] as a child of the current context.
    ///
    /// Any service using the new context can be cancelled together with its
    /// own children without affecting the global scope, while global
    /// cancellation still reaches it.
    pub fn child(&self) -> Self {
        let token_local = self.token_local.as_ref().unwrap_or(&self.token_global).child_token();

        Self { token_local: Some(token_local), ..Clone::clone(self) }
    }
}
