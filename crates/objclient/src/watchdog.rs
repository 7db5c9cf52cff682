//! Stall detection for streaming transfers.
//!
//! [`StallGuard`] wraps an [`AsyncRead`] together with the [`Context`] of the
//! operation it feeds. A background task watches the byte counter; when a
//! whole inactivity period passes without a single byte being read, the task
//! cancels the context so the SDK call sharing it is torn down instead of
//! hanging forever.
//!
//! The guard must be closed (or dropped) by its owner. Closing cancels the
//! context and releases the wrapped source; the watchdog task exits as soon
//! as it observes the cancellation.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};
use std::time::Duration;

use tokio::io::{AsyncRead, ReadBuf};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::context::Context;

/// Inactivity window after which a transfer is considered stalled.
pub const DEFAULT_STALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Counters shared between the reader and its watchdog task.
#[derive(Debug)]
struct Progress {
    origin: Instant,
    /// Bytes read since the watchdog last looked.
    unchecked: AtomicU64,
    /// Nanoseconds after `origin` of the most recent non-empty read.
    last_read: AtomicU64,
    total: AtomicU64,
    closed: AtomicBool,
    finished: AtomicBool,
    stalled: AtomicBool,
}

impl Progress {
    fn new() -> Self {
        Self {
            origin: Instant::now(),
            unchecked: AtomicU64::new(0),
            last_read: AtomicU64::new(0),
            total: AtomicU64::new(0),
            closed: AtomicBool::new(false),
            finished: AtomicBool::new(false),
            stalled: AtomicBool::new(false),
        }
    }

    fn record(&self, n: usize) {
        let elapsed = u64::try_from(self.origin.elapsed().as_nanos()).unwrap_or(u64::MAX);
        self.last_read.store(elapsed, Ordering::Release);
        self.unchecked.fetch_add(n as u64, Ordering::AcqRel);
        self.total.fetch_add(n as u64, Ordering::Relaxed);
    }

    fn last_read_at(&self) -> Instant {
        self.origin + Duration::from_nanos(self.last_read.load(Ordering::Acquire))
    }
}

/// Reader wrapper that cancels its operation when the transfer stalls.
pub struct StallGuard<R> {
    inner: Option<R>,
    progress: Arc<Progress>,
    ctx: Context,
    done: Option<Pin<Box<dyn Future<Output = ()> + Send>>>,
}

impl<R> StallGuard<R> {
    /// Wrap `inner` and start the watchdog task.
    ///
    /// `ctx` should be a context owned by this transfer (usually a
    /// [`Context::child`] of the caller's); it is cancelled on stall and on
    /// close. Must be called from within a Tokio runtime.
    pub fn new(inner: R, ctx: Context, period: Duration) -> Self {
        let progress = Arc::new(Progress::new());
        tokio::spawn(watch(Arc::clone(&progress), ctx.clone(), period));

        let done_ctx = ctx.clone();
        Self {
            inner: Some(inner),
            progress,
            ctx,
            done: Some(Box::pin(async move { done_ctx.done().await })),
        }
    }

    /// Release the stream. Safe to call any number of times, including
    /// after the watchdog has already cancelled the operation.
    pub fn close(&mut self) {
        if self.progress.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.ctx.cancel();
        self.inner.take();
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.progress.closed.load(Ordering::Acquire)
    }

    /// Whether the watchdog aborted the transfer for inactivity.
    pub fn is_stalled(&self) -> bool {
        self.progress.stalled.load(Ordering::Acquire)
    }

    /// Total number of bytes passed through so far.
    pub fn bytes_read(&self) -> u64 {
        self.progress.total.load(Ordering::Relaxed)
    }

    /// The operation context this guard cancels.
    pub fn context(&self) -> &Context {
        &self.ctx
    }
}

impl<R> Drop for StallGuard<R> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<R> std::fmt::Debug for StallGuard<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StallGuard")
            .field("bytes_read", &self.bytes_read())
            .field("closed", &self.is_closed())
            .field("stalled", &self.is_stalled())
            .finish_non_exhaustive()
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for StallGuard<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut TaskContext<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();

        let cancelled = match this.done.as_mut() {
            Some(done) => done.as_mut().poll(cx).is_ready(),
            None => true,
        };
        if cancelled {
            this.done = None;
            this.inner.take();
            return Poll::Ready(Err(this.ctx.canceled_error().into_io()));
        }

        let Some(inner) = this.inner.as_mut() else {
            return Poll::Ready(Err(this.ctx.canceled_error().into_io()));
        };

        let before = buf.filled().len();
        let result = Pin::new(inner).poll_read(cx, buf);
        if let Poll::Ready(Ok(())) = &result {
            let n = buf.filled().len() - before;
            if n > 0 {
                this.progress.record(n);
            } else if buf.remaining() > 0 {
                // EOF: nothing left to stall on.
                this.progress.finished.store(true, Ordering::Release);
            }
        }
        result
    }
}

async fn watch(progress: Arc<Progress>, ctx: Context, period: Duration) {
    let mut next_check = progress.origin + period;
    loop {
        tokio::select! {
            _ = ctx.done() => return,
            _ = tokio::time::sleep_until(next_check) => {}
        }

        if progress.closed.load(Ordering::Acquire) || progress.finished.load(Ordering::Acquire) {
            debug!("Watchdog stopped after {} bytes", progress.total.load(Ordering::Relaxed));
            return;
        }

        if progress.unchecked.swap(0, Ordering::AcqRel) == 0 {
            warn!(
                "No data transferred for {:?} after {} bytes, cancelling stalled stream",
                period,
                progress.total.load(Ordering::Relaxed)
            );
            progress.stalled.store(true, Ordering::Release);
            ctx.cancel();
            return;
        }

        next_check = progress.last_read_at() + period;
    }
}
