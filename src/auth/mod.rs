//! Token issuance, verification, and authorization decisions

mod authorizer;
pub mod metadata;
pub mod tokens;

pub use authorizer::{AuthError, Authorizer};
pub use tokens::{TokenClaims, TokenError, TokenType};
