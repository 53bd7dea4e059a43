//! Bounded queue feeding the background clear worker.

use std::sync::{Mutex, PoisonError};

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::types::{ConversationId, Position};

pub(crate) const QUEUE_CAPACITY: usize = 256;

pub(crate) enum ClearJob {
    /// Fold pending entries up to `cutoff` into the watermark. `None` means
    /// nothing was pending when the clear was requested.
    Clear {
        conversation: ConversationId,
        cutoff: Option<Position>,
    },
    /// Answered once every job queued before it has run.
    Flush(oneshot::Sender<()>),
}

#[derive(Default)]
pub(crate) struct ClearQueue {
    tx: Mutex<Option<mpsc::Sender<ClearJob>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl ClearQueue {
    /// Returns `false` if a worker is already attached.
    pub(crate) fn attach(&self, tx: mpsc::Sender<ClearJob>, worker: JoinHandle<()>) -> bool {
        let mut slot = self.tx.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            worker.abort();
            return false;
        }
        *slot = Some(tx);
        *self.worker.lock().unwrap_or_else(PoisonError::into_inner) = Some(worker);
        true
    }

    pub(crate) fn sender(&self) -> Option<mpsc::Sender<ClearJob>> {
        self.tx.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Hand `job` to the worker. The job comes back when there is no worker
    /// or the queue is full.
    pub(crate) fn try_push(&self, job: ClearJob) -> Result<(), ClearJob> {
        let Some(tx) = self.sender() else {
            return Err(job);
        };
        tx.try_send(job).map_err(|e| {
            tracing::warn!("Clear queue full or closed: {e}");
            e.into_inner()
        })
    }

    /// Drop the sender so the worker drains and stops. Returns its handle.
    pub(crate) fn close(&self) -> Option<JoinHandle<()>> {
        self.tx.lock().unwrap_or_else(PoisonError::into_inner).take();
        self.worker.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}
