//! Background writer for fire-and-forget database work.
//!
//! Jobs are queued on an unbounded channel and applied in order by a single
//! tokio task. Failures are logged and dropped; callers never wait on a job
//! unless they ask to via [`BackgroundWriter::flush`].

use sea_orm::{DatabaseConnection, TransactionTrait};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::db::{tokens, users};
use crate::error::{AppError, AppResult};

/// Work item for the background writer.
#[derive(Debug)]
pub enum BackgroundJob {
    /// Persist the fingerprint of a freshly issued token.
    RecordToken { fingerprint: String, user_id: Uuid },
    /// Remove a user and every token issued to them.
    DeleteUser { user_id: Uuid },
    /// Signal once every job queued before it has been applied.
    Flush(oneshot::Sender<()>),
}

/// Handle for queueing background jobs.
#[derive(Clone, Debug)]
pub struct BackgroundWriter {
    sender: mpsc::UnboundedSender<BackgroundJob>,
}

impl BackgroundWriter {
    /// Spawn the worker task and return a handle to it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(db: DatabaseConnection) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(run(db, receiver));
        Self { sender }
    }

    /// Handle whose worker does not run until [`HeldWorker::release`].
    #[cfg(test)]
    pub(crate) fn held(db: DatabaseConnection) -> (Self, HeldWorker) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, HeldWorker { db, receiver })
    }

    /// Queue a job. Never blocks and never fails the caller.
    pub fn dispatch(&self, job: BackgroundJob) {
        if let Err(e) = self.sender.send(job) {
            warn!("Background writer unavailable, dropping job: {:?}", e.0);
        }
    }

    /// Wait until every job queued so far has been applied.
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        self.dispatch(BackgroundJob::Flush(tx));
        let _ = rx.await;
    }
}

/// Worker that has not been spawned yet. Jobs queue up until it is released.
#[cfg(test)]
pub(crate) struct HeldWorker {
    db: DatabaseConnection,
    receiver: mpsc::UnboundedReceiver<BackgroundJob>,
}

#[cfg(test)]
impl HeldWorker {
    pub(crate) fn release(self) {
        tokio::spawn(run(self.db, self.receiver));
    }
}

async fn run(db: DatabaseConnection, mut receiver: mpsc::UnboundedReceiver<BackgroundJob>) {
    info!("Starting background writer");

    while let Some(job) = receiver.recv().await {
        apply(&db, job).await;
    }

    info!("Background writer stopped");
}

async fn apply(db: &DatabaseConnection, job: BackgroundJob) {
    match job {
        BackgroundJob::RecordToken {
            fingerprint,
            user_id,
        } => match tokens::insert(db, &fingerprint, user_id).await {
            Ok(_) => debug!("Recorded token for user {}", user_id),
            Err(AppError::Conflict(_)) => debug!("Token for user {} already recorded", user_id),
            Err(e) => error!("Failed to record token for user {}: {}", user_id, e),
        },
        BackgroundJob::DeleteUser { user_id } => match delete_user(db, user_id).await {
            Ok(true) => info!("Deleted user {}", user_id),
            Ok(false) => debug!("User {} was already gone", user_id),
            Err(e) => error!("Failed to delete user {}: {}", user_id, e),
        },
        BackgroundJob::Flush(done) => {
            let _ = done.send(());
        }
    }
}

async fn delete_user(db: &DatabaseConnection, user_id: Uuid) -> AppResult<bool> {
    let txn = db.begin().await?;
    let deleted = users::delete(&txn, user_id).await?;
    txn.commit().await?;
    Ok(deleted)
}
