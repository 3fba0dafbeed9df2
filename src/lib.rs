//! Turnstile - capability-token authorization core for multi-tenant services
//!
//! Answers one question per request: does the caller's signed token carry a
//! grant covering this handler, on this resource, with these arguments?
//! Grants and requests are both structured resource identifiers; admission
//! is the superset relation between them.

pub mod auth;
pub mod clock;
pub mod config;
pub mod server;
pub mod storage;
pub mod uri;

pub use auth::{AuthError, Authorizer, TokenClaims, TokenError, TokenType};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{AuthConfig, ConfigError};
pub use server::{AuthMiddleware, Handler, RequestContext, RouterResource};
pub use storage::{MemoryTokenStore, ServiceTokenRecord, StoreError, TokenStore};
pub use uri::{RequestParams, Uri, UriError};
