//! Load tracking for bulk operations.
//!
//! Background loads register their join handles here so a caller can wait
//! for "every load started so far has settled", e.g. after deserializing a
//! whole scene or before exporting it.
//!
//! Handles stay registered until their task finishes. Waiting only borrows
//! them, so a cancelled `settled()` or several concurrent ones never lose
//! track of a load.

use std::sync::Arc;

use futures::FutureExt;
use futures::future::{self, BoxFuture, Shared};
use parking_lot::Mutex;
use tokio::task::{AbortHandle, JoinHandle};

struct TrackedLoad {
    handle: AbortHandle,
    done: Shared<BoxFuture<'static, ()>>,
}

impl TrackedLoad {
    fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

#[derive(Clone, Default)]
pub struct LoadTracker {
    pending: Arc<Mutex<Vec<TrackedLoad>>>,
}

impl LoadTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&self, handle: JoinHandle<()>) {
        let abort = handle.abort_handle();
        let done = handle
            .map(|result| {
                if let Err(err) = result {
                    log::error!("Background load task failed: {err}");
                }
            })
            .boxed()
            .shared();

        let mut pending = self.pending.lock();
        pending.retain(|load| !load.is_finished());
        pending.push(TrackedLoad {
            handle: abort,
            done,
        });
    }

    /// Number of tracked loads that have not finished yet.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.lock().iter().filter(|load| !load.is_finished()).count()
    }

    /// Waits until every tracked load, including ones registered while
    /// waiting, has finished. Cancel safe.
    pub async fn settled(&self) {
        loop {
            let waiting: Vec<_> = {
                let mut pending = self.pending.lock();
                pending.retain(|load| !load.is_finished());
                pending.iter().map(|load| load.done.clone()).collect()
            };
            if waiting.is_empty() {
                return;
            }
            future::join_all(waiting).await;
        }
    }
}
