mod api;
mod auth;
mod catalog;
mod config;
mod console;
mod credentials;
mod error;
mod models;
mod session;
mod submit;
#[cfg(test)]
mod testing;

use api::HttpBallotApi;
use auth::AuthGate;
use catalog::CandidateCatalog;
use config::Config;
use credentials::{Credentials, FileStore, KeyValueStore, SECURE_TOKEN_KEY};
use log::{error, info};
use session::{BallotSession, SessionState};
use std::sync::Arc;
use submit::VoteSubmitter;

#[tokio::main]
async fn main() {
    // Initialize logging
    dotenvy::dotenv().ok();
    env_logger::init();

    if let Err(e) = run().await {
        error!("Ballot booth failed to start: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = Config::from_env()?;
    info!("Using ballot API at {}", config.api_base);

    let api = Arc::new(HttpBallotApi::new(&config.api_base)?);

    // Credential stores; the login step that normally fills them happens before the ballot
    let secure = Arc::new(FileStore::new(config.secure_store_path()));
    let cache = Arc::new(FileStore::new(config.cache_path()));
    if let Some(token) = &config.seed_token {
        secure.set(SECURE_TOKEN_KEY, token).await?;
    }
    let credentials = Credentials::new(secure, cache);

    let input = console::stdin_lines();
    let biometric = Arc::new(console::ConsoleBiometric::new(config.biometrics, input.clone()));
    let presenter = Arc::new(console::ConsolePresenter::new(config.confirmation_window));

    let mut session = BallotSession::new(
        AuthGate::new(biometric),
        VoteSubmitter::new(api.clone(), credentials),
        presenter,
    );

    // A catalog failure has already been shown to the voter
    if session.load(&CandidateCatalog::new(api)).await.is_ok() {
        console::run(&mut session, input).await;
    }

    match session.state() {
        SessionState::Closed => info!("[{}] Session closed", session.id()),
        SessionState::Error(reason) => error!("[{}] Session failed: {}", session.id(), reason),
        other => info!("[{}] Session ended in {:?}", session.id(), other),
    }
    Ok(())
}
