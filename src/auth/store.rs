//! Server-side record of issued token fingerprints.

use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::db::tokens;
use crate::error::AppResult;
use crate::models::TokenRecord;
use crate::services::background::{BackgroundJob, BackgroundWriter};

/// Fingerprint store. Recording is asynchronous; lookups and revocation are not.
///
/// A token resolved right after login may not be visible yet. Revoking it
/// in that window removes nothing, and the record lands afterwards.
#[derive(Clone, Debug)]
pub struct TokenStore {
    db: DatabaseConnection,
    writer: BackgroundWriter,
}

impl TokenStore {
    pub fn new(db: DatabaseConnection, writer: BackgroundWriter) -> Self {
        Self { db, writer }
    }

    /// Queue a fingerprint for persistence. Returns immediately.
    pub fn record(&self, fingerprint: String, user_id: Uuid) {
        self.writer.dispatch(BackgroundJob::RecordToken {
            fingerprint,
            user_id,
        });
    }

    /// Look up a fingerprint.
    pub async fn exists(&self, fingerprint: &str) -> AppResult<Option<TokenRecord>> {
        tokens::find_by_fingerprint(&self.db, fingerprint).await
    }

    /// Delete every record with this fingerprint. Revoking twice is not an error.
    pub async fn revoke(&self, fingerprint: &str) -> AppResult<u64> {
        tokens::delete_by_fingerprint(&self.db, fingerprint).await
    }

    /// Wait for queued records to be written.
    pub async fn flush(&self) {
        self.writer.flush().await;
    }
}
