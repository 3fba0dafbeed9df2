//! CLI command definitions

use clap::{Parser, Subcommand};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "turnstile")]
#[command(about = "Capability-token authorization core", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Token signing secret
    #[arg(long, env = "TURNSTILE_SECRET", global = true)]
    pub secret: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Mint and inspect tokens
    Token {
        #[command(subcommand)]
        command: TokenCommands,
    },

    /// Parse a resource URI and print its canonical form
    Uri {
        /// URI to parse
        uri: String,
    },

    /// Check which of the given URIs a token authorizes
    ///
    /// Examples:
    ///   turnstile check --token "$TOKEN" 'hs:hs_auth:api:v2:GetUser'
    ///   turnstile check --token "$TOKEN" 'hs:hs_auth:api:v2:GetUser?path_id%3Dme' 'hs:hs_notify'
    Check {
        /// Token to evaluate
        #[arg(long)]
        token: String,

        /// Requested resource URI(s)
        #[arg(required = true)]
        uris: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum TokenCommands {
    /// Mint a user token
    User {
        /// User id (defaults to a fresh UUID)
        #[arg(long)]
        id: Option<Uuid>,

        /// Token lifetime in seconds
        #[arg(long, env = "TURNSTILE_USER_TOKEN_TTL")]
        ttl: Option<i64>,
    },

    /// Mint a service token carrying resource grants
    ///
    /// Examples:
    ///   turnstile token service --owner ops 'hs:hs_auth:api:v2'
    ///   turnstile token service --owner ops 'hs:hs_auth:api:v2:GetUser?path_id%3Dme'
    Service {
        /// Owning principal id
        #[arg(long)]
        owner: String,

        /// Granted resource URI(s)
        #[arg(required = true)]
        grants: Vec<String>,

        /// Token lifetime in seconds
        #[arg(long, env = "TURNSTILE_SERVICE_TOKEN_TTL")]
        ttl: Option<i64>,
    },

    /// Verify a token and print its claims
    Inspect {
        /// Token to verify
        token: String,
    },
}
