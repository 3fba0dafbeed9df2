//! Turnstile CLI entry point

mod cli;

use crate::cli::{Cli, Commands, TokenCommands};
use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use turnstile::{AuthConfig, Authorizer, Clock, MemoryTokenStore, SystemClock, Uri};
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = || -> Result<AuthConfig> {
        let secret = cli
            .secret
            .clone()
            .context("TURNSTILE_SECRET or --secret required")?;
        AuthConfig::new(secret).context("Invalid signing secret")
    };

    match cli.command {
        Commands::Token { command } => token(config()?, command).await,
        Commands::Uri { uri } => {
            let parsed = Uri::parse(&uri).context("Invalid URI")?;
            println!("{parsed}");
            Ok(())
        }
        Commands::Check { token, uris } => check(config()?, token, uris),
    }
}

fn new_authorizer(config: AuthConfig) -> Arc<Authorizer> {
    Arc::new(Authorizer::new(
        config,
        Arc::new(SystemClock),
        Arc::new(MemoryTokenStore::new()),
    ))
}

async fn token(config: AuthConfig, command: TokenCommands) -> Result<()> {
    match command {
        TokenCommands::User { id, ttl } => {
            let ttl = ttl.unwrap_or_else(|| config.user_token_ttl_secs());
            let authorizer = new_authorizer(config);

            let user_id = id.unwrap_or_else(Uuid::new_v4);
            let expires_at = SystemClock.now() + ttl;
            let token = authorizer.create_user_token(user_id, expires_at);

            println!("{token}");
            println!();
            println!("User ID: {user_id}");
            println!("Expires: {expires_at}");
        }
        TokenCommands::Service { owner, grants, ttl } => {
            let ttl = ttl.unwrap_or_else(|| config.service_token_ttl_secs());
            let authorizer = new_authorizer(config);

            let resources = grants
                .iter()
                .map(|g| Uri::parse(g).with_context(|| format!("Invalid grant URI: {g}")))
                .collect::<Result<Vec<_>>>()?;

            let expires_at = SystemClock.now() + ttl;
            let token = authorizer
                .create_service_token(&owner, resources.clone(), expires_at)
                .await?;

            println!("{token}");
            println!();
            println!("Owner: {owner}");
            println!("Expires: {expires_at}");
            println!("Grants:");
            for resource in &resources {
                println!("  {resource}");
            }
        }
        TokenCommands::Inspect { token } => {
            let authorizer = new_authorizer(config);
            let claims = authorizer
                .claims_from_token(&token)
                .context("Invalid token")?;

            println!("ID:      {}", claims.id);
            println!("Type:    {}", claims.token_type);
            println!("Issued:  {}", claims.issued_at);
            println!("Expires: {}", claims.expires_at);
            println!("Resources:");
            if claims.allowed_resources.is_empty() {
                println!("  (none)");
            } else {
                for resource in &claims.allowed_resources {
                    println!("  {resource}");
                }
            }
        }
    }

    Ok(())
}

fn check(config: AuthConfig, token: String, uris: Vec<String>) -> Result<()> {
    let authorizer = new_authorizer(config);

    let requested = uris
        .iter()
        .map(|u| Uri::parse(u).with_context(|| format!("Invalid URI: {u}")))
        .collect::<Result<Vec<_>>>()?;

    let authorized = authorizer
        .authorized_resources(&token, requested)
        .context("Authorization check failed")?;

    if authorized.is_empty() {
        println!("unauthorized");
    } else {
        println!("authorized:");
        for resource in &authorized {
            println!("  {resource}");
        }
    }

    Ok(())
}
