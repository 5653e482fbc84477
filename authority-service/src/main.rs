//! # Warden Authority Service
//!
//! The **authority-service** is the token authority for a multi-tenant
//! organization: it issues, validates, refreshes, and revokes signed
//! bearer credentials, and serves as the identity lookup downstream
//! services consult on every gated request.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        HTTP Layer (api/)                        │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────────┐ │
//! │  │   routes    │  │  handlers   │  │    DTOs (Request/Res)   │ │
//! │  └──────┬──────┘  └──────┬──────┘  └────────────┬────────────┘ │
//! └─────────┼────────────────┼─────────────────────┼───────────────┘
//!           │                │                      │
//!           ▼                ▼                      ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  Authority Facade (facade.rs)                   │
//! │  Login, Logout, Refresh, Check, Auth, Destroy, SwitchTenant      │
//! └───────┬──────────────────────────┬──────────────────────────────┘
//!         │                          │
//!         ▼                          ▼
//! ┌──────────────────────┐   ┌──────────────────────────────────────┐
//! │  Token Manager (token/) │ │   Identity Cache (identity/)        │
//! │  Generator ⊕ Store       │ │   + Directory / Password clients   │
//! └──────────────────────┘   └──────────────────────────────────────┘
//! ```
//!
//! ## API Endpoints
//!
//! See [`api`] for the full route table under `/api/v1/warden`.
//!
//! ## Configuration
//!
//! Loaded once at startup from a YAML file (`--config`, default
//! `./configs/config.yml`), overlaid by `WARDEN__*` environment variables.
//! See [`shared::config::AppConfig`].
//!
//! ## Shutdown
//!
//! The process exits `0` after a graceful shutdown triggered by SIGTERM,
//! SIGINT, or SIGQUIT, and nonzero if configuration fails to load (§6).

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use clap::Parser;
use reqwest::Client as HttpClient;
use shared::{
    config::{AppConfig, DEFAULT_CONFIG_PATH},
    redis_client::RedisClient,
    tracing_config,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};
use tracing::info;

mod api;
mod clients;
mod facade;
mod identity;
mod token;

use api::routes;
use clients::{DirectoryClient, PasswordVerifierClient};
use facade::AuthorityFacade;
use identity::IdentityCache;
use token::{RedisTokenStore, SignedAccessGenerator, TokenManager, TokenManagerConfig, TokenStore};

/// Command-line arguments (§6: one flag, `--config`).
#[derive(Parser, Debug)]
#[command(name = "authority", about = "Warden token authority service")]
struct Args {
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,
}

/// Shared application state injected into all request handlers.
///
/// Holds only the Authority Facade — every lower-level collaborator
/// (Token Manager, Identity Cache, Directory/Password clients) is wired
/// once at startup and owned by the facade, not re-exposed to handlers.
pub struct AppState {
    pub facade: Arc<AuthorityFacade>,
}

/// Application entry point.
///
/// # Initialization Sequence
///
/// 1. Parse CLI flags, load YAML configuration (+ `WARDEN__*` env overlay)
/// 2. Initialize structured logging/tracing
/// 3. Connect to Redis
/// 4. Build the Signed Access Generator (C1) and Token Store (C2)
/// 5. Build the Token Manager (C3) over C1+C2
/// 6. Build the Directory Client (C6), Identity Cache (C4), and Password
///    Verifier Client (C7)
/// 7. Build the Authority Facade (C5) over C3+C4+C7
/// 8. Configure and start the HTTP server, awaiting SIGTERM/SIGINT/SIGQUIT
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();

    // ─────────────────────────────────────────────────────────────────────
    // Step 1: Load configuration
    // ─────────────────────────────────────────────────────────────────────
    let config = AppConfig::load(&args.config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;

    // ─────────────────────────────────────────────────────────────────────
    // Step 2: Initialize structured logging
    // ─────────────────────────────────────────────────────────────────────
    tracing_config::init_tracing("authority-service", !config.is_debug());

    info!(port = %config.port, model = ?config.model, "starting authority-service");

    // ─────────────────────────────────────────────────────────────────────
    // Step 3: Connect to Redis
    // ─────────────────────────────────────────────────────────────────────
    let redis = RedisClient::new(&config.redis)
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

    // ─────────────────────────────────────────────────────────────────────
    // Steps 4–7: Wire the token core and its collaborators
    // ─────────────────────────────────────────────────────────────────────
    let generator = Arc::new(
        SignedAccessGenerator::new(&config.jwt)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?,
    );
    let store: Arc<dyn TokenStore> =
        Arc::new(RedisTokenStore::new(redis.clone(), config.redis.namespace.clone()));
    let manager = Arc::new(TokenManager::new(
        store,
        generator,
        TokenManagerConfig::from(&config.jwt),
    ));

    let http_client = HttpClient::builder()
        .timeout(Duration::from_secs(config.internal_net.timeout_seconds))
        .pool_max_idle_per_host(config.internal_net.max_idle_conns)
        .build()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

    let directory = DirectoryClient::new(http_client.clone(), &config.org_api);
    let identity = Arc::new(IdentityCache::new(
        redis.clone(),
        directory,
        config.redis.namespace.clone(),
        Duration::from_secs((config.org_api.exp.max(0) as u64) * 60),
        Duration::from_secs((config.jwt.access_token_exp.max(0) as u64) * 3600),
    ));
    let password_verifier = Arc::new(PasswordVerifierClient::new(http_client, &config.org_api));

    let facade = Arc::new(AuthorityFacade::new(manager, identity, password_verifier));
    let app_state = web::Data::new(AppState { facade });

    // ─────────────────────────────────────────────────────────────────────
    // Step 8: Configure and start the HTTP server
    // ─────────────────────────────────────────────────────────────────────
    let bind_addr = format!("0.0.0.0:{}", config.port);
    info!(addr = %bind_addr, "server listening");

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .app_data(app_state.clone())
            .configure(routes::configure)
    })
    .bind(&bind_addr)?
    .run();

    let handle = server.handle();

    tokio::select! {
        result = server => result?,
        _ = shutdown_signal() => {
            info!("shutdown signal received, draining in-flight requests");
            handle.stop(true).await;
        }
    }

    info!("authority-service exited cleanly");
    Ok(())
}

/// Resolves once any of SIGTERM, SIGINT, or SIGQUIT is received.
async fn shutdown_signal() {
    let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
    let mut sigquit = signal(SignalKind::quit()).expect("failed to install SIGQUIT handler");

    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM"),
        _ = sigint.recv() => info!("received SIGINT"),
        _ = sigquit.recv() => info!("received SIGQUIT"),
    }
}
