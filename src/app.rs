/*
 * Responsibility
 * - Config loading → dependency construction → Router assembly
 * - Middleware application (http plumbing / CORS / bearer authentication)
 * - axum::serve() startup
 */
use std::net::SocketAddr;
use std::{panic, process, sync::Arc};

use anyhow::Result;
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::Config;
use crate::middleware;
use crate::repos::user_repo::{PgUserStore, UserStore};
use crate::services::auth::{
    flow::AuthFlow,
    password::PasswordVerifier,
    token::{SigningKey, TokenService},
};
use crate::state::AppState;

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,identity_api=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    // Keep the default hook as a fallback (prints to stderr with location/payload).
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // Always surface panics via tracing so they don't get "lost"
        // (stderr can be hidden depending on how the process is launched).
        tracing::error!(?info, "panic");

        // In development, fail fast: crash the whole process so we notice immediately.
        // In production, prefer the default behavior (stderr) and let the server keep running.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    let abort_on_panic = !config.app_env.is_production();
    init_panic_hook(abort_on_panic);

    tracing::info!(
        "starting API in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config).await?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    // ConnectInfo feeds the peer address into the principal's request details.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

async fn build_state(config: &Config) -> Result<AppState> {
    let db = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!().run(&db).await?;

    // The signing key lives exactly as long as the process: every token this
    // instance issues is verifiable only by this instance, and none survive
    // a restart.
    let key = SigningKey::generate();
    let tokens = Arc::new(TokenService::new(&key, config.token_ttl_seconds));

    let users: Arc<dyn UserStore> = Arc::new(PgUserStore::new(db));
    let passwords = PasswordVerifier::new(config.bcrypt_cost);
    let auth = Arc::new(AuthFlow::new(users.clone(), passwords, tokens.clone()));

    Ok(AppState::new(auth, tokens, users))
}

fn build_router(state: AppState, config: &Config) -> Router {
    // Bearer authentication runs on every v1 request. It only attaches the
    // security context; rejecting anonymous callers is the handlers' job.
    let v1 = middleware::auth::apply(api::v1::routes(), state.clone());

    let router = Router::new().nest("/api/v1", v1).with_state(state);

    let router = middleware::cors::apply(router, config);
    let router = middleware::security_headers::apply(router);
    middleware::http::apply(router)
}
