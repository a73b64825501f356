//! Authentication: credential hashing, session tokens, token resolution and
//! the request guards built on top of them.

mod extractor;
pub mod password;
pub mod resolver;
pub mod store;
pub mod token;

use sea_orm::DatabaseConnection;
use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;
use tracing::warn;
use uuid::Uuid;

pub use extractor::{AccountScope, AdminUser, AuthenticatedUser, BootstrapAdmin, OptionalUser};
pub use password::CredentialHasher;
pub use resolver::ResolveError;
pub use store::TokenStore;
pub use token::{TokenCodec, TokenError};

use crate::config::{AdminScope, Config};
use crate::error::AppResult;
use crate::models::User;
use crate::services::background::BackgroundWriter;

/// Bootstrap admin key, required to create accounts over HTTP.
///
/// `Debug` never prints the value and the comparison is constant-time.
#[derive(Clone)]
pub struct AdminKey(Option<SecretString>);

impl AdminKey {
    pub fn new(key: Option<String>) -> Self {
        Self(key.map(SecretString::from))
    }

    /// Compare `provided` with the configured key. Always false when no key is configured.
    pub fn verify(&self, provided: &str) -> bool {
        match &self.0 {
            Some(secret) => {
                let expected = secret.expose_secret();
                // ct_eq yields false for unequal lengths without an early exit
                expected.as_bytes().ct_eq(provided.as_bytes()).into()
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for AdminKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Some(_) => write!(f, "AdminKey([REDACTED])"),
            None => write!(f, "AdminKey(None)"),
        }
    }
}

/// Everything the guards and handlers need to authenticate a request.
///
/// Built once at startup from [`Config`] and shared as `web::Data`.
#[derive(Clone, Debug)]
pub struct AuthContext {
    pub db: DatabaseConnection,
    pub codec: TokenCodec,
    pub store: TokenStore,
    pub hasher: CredentialHasher,
    pub writer: BackgroundWriter,
    pub admin_scope: AdminScope,
    pub accept_account_id_header: bool,
}

impl AuthContext {
    /// Build the context and start its background writer.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: &Config, db: DatabaseConnection) -> AppResult<Self> {
        let writer = BackgroundWriter::start(db.clone());

        Ok(Self {
            codec: TokenCodec::new(config.jwt_secret.clone(), config.token_ttl_days),
            store: TokenStore::new(db.clone(), writer.clone()),
            hasher: CredentialHasher::new(config.hash_cost)?,
            writer,
            admin_scope: config.admin_scope,
            accept_account_id_header: config.accept_account_id_header,
            db,
        })
    }

    /// Resolve a presented token to its user.
    pub async fn resolve(&self, token: &str) -> Result<User, ResolveError> {
        resolver::resolve(&self.db, &self.codec, &self.store, token).await
    }

    /// Issue a token for `user`, queue its fingerprint and attach it to the user.
    ///
    /// Signing failures are logged and leave `user.token` empty; the caller
    /// still gets the user back.
    pub fn attach_session(&self, user: &mut User) {
        match self.codec.issue(user.id, user.account_id) {
            Ok(token) => {
                if let Some(fingerprint) = TokenCodec::fingerprint(&token) {
                    self.store.record(fingerprint, user.id);
                }
                user.token = Some(token);
            }
            Err(e) => {
                warn!("Could not issue session token for user {}: {}", user.id, e);
                user.token = None;
            }
        }
    }

    /// Account filter for the admin surface: `None` means every account.
    pub fn admin_account_filter(&self, caller: &User) -> Option<Uuid> {
        match self.admin_scope {
            AdminScope::Global => None,
            AdminScope::Tenant => Some(caller.account_id),
        }
    }
}
