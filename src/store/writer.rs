//! Background commit writer
//!
//! The engine never waits for persistence. Commits go into an unbounded
//! channel and a blocking task applies them to the store in order. A commit
//! that fails is logged and dropped; the engine's state is not rolled back.

use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::audit::AuditRecorder;
use crate::store::{Commit, CommitSink, DataStore, StoreError, StoreResult};

pub struct StoreWriter<S> {
    tx: UnboundedSender<Commit>,
    handle: JoinHandle<S>,
}

impl<S> StoreWriter<S>
where
    S: DataStore + AuditRecorder + Send + 'static,
{
    /// Start draining commits into `store`
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(mut store: S) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Commit>();
        let handle = tokio::task::spawn_blocking(move || {
            while let Some(commit) = rx.blocking_recv() {
                match commit.apply_to(&mut store) {
                    Ok(()) => debug!(
                        ops = commit.ops.len(),
                        audited = commit.audit.is_some(),
                        "Commit persisted"
                    ),
                    Err(error) => warn!(
                        %error,
                        ops = ?commit.ops.iter().map(|op| op.label()).collect::<Vec<_>>(),
                        "Failed to persist commit"
                    ),
                }
            }
            store
        });
        Self { tx, handle }
    }

    /// A sink feeding this writer, for handing to the engine
    pub fn sink(&self) -> WriterSink {
        WriterSink {
            tx: self.tx.clone(),
        }
    }

    /// Close the channel, wait for queued commits and return the store
    ///
    /// Every sink handed out must be dropped first, or this waits forever.
    pub async fn shutdown(self) -> StoreResult<S> {
        drop(self.tx);
        self.handle
            .await
            .map_err(|e| StoreError::Internal(format!("writer task failed: {}", e)))
    }
}

/// Sending half of a [`StoreWriter`]
#[derive(Clone)]
pub struct WriterSink {
    tx: UnboundedSender<Commit>,
}

impl CommitSink for WriterSink {
    fn submit(&self, commit: &Commit) {
        if self.tx.send(commit.clone()).is_err() {
            warn!("Store writer has stopped, commit not persisted");
        }
    }
}
