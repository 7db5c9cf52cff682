//! Cancellable, deadline-bearing operation context.
//!
//! Every client operation takes a [`Context`] as its first argument. A
//! context is a [`CancellationToken`] plus an optional deadline. Deriving a
//! context with [`Context::child`] or [`Context::with_timeout`] yields one
//! that is cancelled whenever its parent is, but can also be cancelled on
//! its own without affecting the parent.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::{Error, Result};

/// Cancellation signal and optional deadline shared by one operation.
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A root context that is never cancelled unless [`cancel`](Self::cancel)
    /// is called on it.
    pub fn background() -> Self {
        Self::default()
    }

    /// Build a root context around an existing token.
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Derive a context cancelled together with this one.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Derive a child context whose deadline is at most `timeout` from now.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derive a child context with the earlier of the two deadlines.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    /// Cancel this context and every context derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// The underlying cancellation token.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// The deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether the context was cancelled or its deadline has passed.
    pub fn is_done(&self) -> bool {
        self.token.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Resolves once the context is cancelled or its deadline passes.
    pub async fn done(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.token.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.token.cancelled().await,
        }
    }

    /// The `Canceled` error describing why this context is done.
    pub fn canceled_error(&self) -> Error {
        if self.token.is_cancelled() {
            Error::Canceled("context canceled".to_string())
        } else {
            Error::Canceled("deadline exceeded".to_string())
        }
    }

    /// Fail fast if the context is already done.
    pub fn check(&self) -> Result<()> {
        if self.is_done() {
            return Err(self.canceled_error());
        }
        Ok(())
    }

    /// Drive `fut` to completion unless the context finishes first, in
    /// which case `fut` is dropped and `Canceled` is returned.
    pub async fn run<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.check()?;
        tokio::select! {
            biased;
            _ = self.done() => Err(self.canceled_error()),
            result = fut => result,
        }
    }
}
