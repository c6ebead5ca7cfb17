//! Stoppable listener tasks.
//!
//! Both discovery listeners run as spawned Tokio tasks that own their socket.
//! A [`ListenerHandle`] is the caller's side of such a task: it can be awaited
//! like a future (completing when the listener finds something) or stopped,
//! which makes the task drop its socket and return [`ListenOutcome::Stopped`].
//!
//! Stopping is race-free in one direction: if the task already produced a
//! result before the stop signal arrived, [`ListenerHandle::stop`] returns
//! that result instead of discarding it.

use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::warn;

/// How a listener task finished.
#[derive(Debug)]
pub enum ListenOutcome<T> {
    /// The listener received what it was waiting for.
    Found(T),
    /// The listener was stopped, or its task ended abnormally.
    Stopped,
}

impl<T> ListenOutcome<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, ListenOutcome::Found(_))
    }
}

/// Caller-side handle to a running listener task.
///
/// Dropping the handle also stops the task: the stop channel's sender is
/// dropped, which the task observes the same way as an explicit stop.
#[derive(Debug)]
pub struct ListenerHandle<T> {
    local_addr: SocketAddr,
    stop_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<ListenOutcome<T>>,
}

impl<T: Send + 'static> ListenerHandle<T> {
    /// Spawns `listen` on the Tokio runtime, handing it the receiving end of
    /// a fresh stop channel.
    pub(crate) fn spawn<F, Fut>(local_addr: SocketAddr, listen: F) -> Self
    where
        F: FnOnce(oneshot::Receiver<()>) -> Fut,
        Fut: Future<Output = ListenOutcome<T>> + Send + 'static,
    {
        let (stop_tx, stop_rx) = oneshot::channel();
        let task = tokio::spawn(listen(stop_rx));
        Self {
            local_addr,
            stop_tx: Some(stop_tx),
            task,
        }
    }

    /// Address the listener's socket is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Signals the task to stop and waits until it has released its socket.
    ///
    /// Returns the task's outcome, which is `Found` if the listener completed
    /// before the signal was observed.
    pub async fn stop(mut self) -> ListenOutcome<T> {
        if let Some(stop_tx) = self.stop_tx.take() {
            // The task may already have returned; a closed channel is fine.
            let _ = stop_tx.send(());
        }
        self.await
    }
}

impl<T> Future for ListenerHandle<T> {
    type Output = ListenOutcome<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let local_addr = self.local_addr;
        Pin::new(&mut self.task).poll(cx).map(|joined| match joined {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(%local_addr, "listener task ended abnormally: {e}");
                ListenOutcome::Stopped
            }
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
