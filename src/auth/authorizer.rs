//! Token issuance and authorization decisions
//!
//! The authorizer owns the signing secret and orchestrates the URI engine,
//! token codec, and metadata filter. It holds no mutable state; the clock
//! and token store are injected read-only collaborators, so a single
//! instance is shared freely across concurrent request tasks.

use crate::auth::metadata;
use crate::auth::tokens::{self, TokenClaims, TokenError, TokenType};
use crate::clock::Clock;
use crate::config::AuthConfig;
use crate::server::{AuthMiddleware, Handler, RouterResource};
use crate::storage::{StoreError, TokenStore};
use crate::uri::{Uri, UriError};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced at the authorization boundary
///
/// Nothing else escapes: URI and token failures are classified into the
/// first three kinds, while store failures and cancellation pass through
/// unchanged.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Signature, format, expiry, unknown type tag, or a malformed
    /// embedded resource or id. Surfaces as 401.
    #[error("invalid token: {0}")]
    InvalidToken(#[source] TokenError),

    /// A valid token of the wrong type for the operation. Surfaces as 400.
    #[error("invalid token type: expected {expected}, got {got}")]
    InvalidTokenType { expected: TokenType, got: TokenType },

    /// A caller-supplied URI failed to parse or carried unparseable
    /// metadata. Surfaces as 400.
    #[error("invalid uri: {0}")]
    InvalidUri(#[source] UriError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Issues tokens and answers per-request authorization queries
pub struct Authorizer {
    config: AuthConfig,
    clock: Arc<dyn Clock>,
    store: Arc<dyn TokenStore>,
}

impl Authorizer {
    pub fn new(config: AuthConfig, clock: Arc<dyn Clock>, store: Arc<dyn TokenStore>) -> Self {
        Self {
            config,
            clock,
            store,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Mint a token identifying `user_id` until `expires_at`
    ///
    /// User tokens carry no resource list of their own; what they may do is
    /// attached when grants are delegated to them.
    pub fn create_user_token(&self, user_id: Uuid, expires_at: i64) -> String {
        let claims = TokenClaims {
            id: user_id.to_string(),
            issued_at: self.clock.now(),
            expires_at,
            token_type: TokenType::User,
            allowed_resources: Vec::new(),
        };

        tokens::mint(&claims, self.config.secret())
    }

    /// Mint a service token carrying `allowed_resources`
    ///
    /// A revocation record keyed by the new token id is persisted before
    /// the token is signed, so an id never circulates without its record.
    pub async fn create_service_token(
        &self,
        owner_id: &str,
        allowed_resources: Vec<Uri>,
        expires_at: i64,
    ) -> Result<String, AuthError> {
        let id = self.store.generate_token_id();
        let now = self.clock.now();

        self.store.create_service_token(&id, owner_id, now).await?;

        let claims = TokenClaims {
            id,
            issued_at: now,
            expires_at,
            token_type: TokenType::Service,
            allowed_resources,
        };

        Ok(tokens::mint(&claims, self.config.secret()))
    }

    /// Delete the revocation record behind a service token
    pub async fn invalidate_service_token(&self, token: &str) -> Result<(), AuthError> {
        let claims = self.verify(token)?;
        self.store.delete_service_token(&claims.id).await?;
        Ok(())
    }

    /// Extract the user id from a user token
    pub fn user_id_from_token(&self, token: &str) -> Result<Uuid, AuthError> {
        let claims = self.verify(token)?;

        if claims.token_type != TokenType::User {
            return Err(AuthError::InvalidTokenType {
                expected: TokenType::User,
                got: claims.token_type,
            });
        }

        Uuid::parse_str(&claims.id)
            .map_err(|e| AuthError::InvalidToken(TokenError::DecodeError(e.to_string())))
    }

    /// Extract the type tag from any valid token
    pub fn token_type_from_token(&self, token: &str) -> Result<TokenType, AuthError> {
        Ok(self.verify(token)?.token_type)
    }

    /// Verify a token and return its full claim set
    pub fn claims_from_token(&self, token: &str) -> Result<TokenClaims, AuthError> {
        self.verify(token)
    }

    /// The subset of `requested` URIs this token currently authorizes
    ///
    /// The token's grants and the requested URIs are both trimmed by the
    /// metadata filter against a single clock read, then each surviving
    /// request is admitted if any surviving grant is its superset. Output
    /// order follows the input. A malformed grant inside the token makes
    /// the whole token untrusted; malformed requested metadata blames the
    /// caller instead.
    pub fn authorized_resources(
        &self,
        token: &str,
        requested: Vec<Uri>,
    ) -> Result<Vec<Uri>, AuthError> {
        let now = self.clock.now();
        let claims = self.verify_at(token, now)?;

        let grants = metadata::filter_in_force(claims.allowed_resources, now)
            .map_err(|e| AuthError::InvalidToken(TokenError::MalformedResource(e.to_string())))?;
        let requested = metadata::filter_in_force(requested, now).map_err(AuthError::InvalidUri)?;

        Ok(requested
            .into_iter()
            .filter(|request| grants.iter().any(|grant| grant.is_superset_of(request)))
            .collect())
    }

    /// Wrap `next` so it only runs for requests this authorizer admits
    pub fn with_auth_middleware<H: Handler>(
        self: Arc<Self>,
        resource: Arc<dyn RouterResource>,
        next: H,
    ) -> AuthMiddleware<H> {
        AuthMiddleware::new(self, resource, next)
    }

    fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        self.verify_at(token, self.clock.now())
    }

    fn verify_at(&self, token: &str, now: i64) -> Result<TokenClaims, AuthError> {
        tokens::verify(token, self.config.secret(), now).map_err(AuthError::InvalidToken)
    }
}
