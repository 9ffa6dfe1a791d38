use std::sync::Arc;

use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use keygate::config::Config;
use keygate::db::{AppState, create_pool, init_db, init_log_db};
use keygate::handlers;
use keygate::lifecycle;

#[derive(Parser, Debug)]
#[command(name = "keygate")]
#[command(about = "License key issuance and activation server")]
struct Cli {
    /// Mint a batch of license keys, print them, and exit (no server)
    #[arg(long, value_name = "COUNT")]
    mint: Option<usize>,

    /// Validity in days for minted keys
    #[arg(long, default_value_t = 30)]
    days: i64,

    /// Owner label attached to minted keys
    #[arg(long, requires = "mint")]
    label: Option<String>,
}

/// Offline batch minting, replacing ad hoc key-generation scripts.
/// Keys are persisted through the normal creation path, then printed in a
/// copy-paste friendly block.
fn mint_batch(state: &AppState, count: usize, days: i64, label: Option<&str>) {
    assert!(count >= 1, "--mint needs a count of at least 1");
    assert!(days >= 1, "--days must be at least 1");

    let licenses = lifecycle::create_batch(state, count, days, label, Some("cli"))
        .expect("Failed to mint license batch");

    let plan = licenses.first().map(|l| l.plan.as_str()).unwrap_or("-");
    println!();
    println!("--- {} KEYS ({} days, {}) ---", licenses.len(), days, plan);
    for license in &licenses {
        println!("  {}", license.key);
    }
    println!("--- END ---");
    println!();

    tracing::info!("Minted {} license keys ({} days)", licenses.len(), days);
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "keygate=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    if config.dev_mode {
        tracing::info!("Dev mode enabled");
    }

    // License table and activation log live in separate database files,
    // each behind its own pool.
    let db_pool = create_pool(&config.database_path).expect("Failed to create database pool");
    let log_pool =
        create_pool(&config.log_database_path).expect("Failed to create log database pool");

    {
        let conn = db_pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize database");
    }
    {
        let conn = log_pool.get().expect("Failed to get log connection");
        init_log_db(&conn).expect("Failed to initialize log database");
    }

    let state = AppState {
        db: db_pool,
        logs: log_pool,
        key_prefix: config.key_prefix.clone(),
        admin_tokens: Arc::new(config.admin_tokens.clone()),
    };

    // Batch minting mode: do the work and exit without serving.
    if let Some(count) = cli.mint {
        mint_batch(&state, count, cli.days, cli.label.as_deref());
        return;
    }

    if state.admin_tokens.is_empty() {
        tracing::warn!("ADMIN_TOKENS is empty; the admin surface will reject every request");
    }

    // Client and admin surfaces run as independent listeners sharing the
    // same store handle.
    let client_app = handlers::public::router()
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());
    let admin_app = handlers::admin::router(state.clone())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let client_listener = tokio::net::TcpListener::bind(&config.addr())
        .await
        .expect("Failed to bind client API address");
    let admin_listener = tokio::net::TcpListener::bind(&config.admin_addr())
        .await
        .expect("Failed to bind admin API address");

    tracing::info!("Client API listening on {}", config.addr());
    tracing::info!("   - POST /activate");
    tracing::info!("   - POST /verify");
    tracing::info!("   - POST /deactivate");
    tracing::info!("Admin API listening on {}", config.admin_addr());

    let client_server =
        axum::serve(client_listener, client_app).with_graceful_shutdown(shutdown_signal());
    let admin_server =
        axum::serve(admin_listener, admin_app).with_graceful_shutdown(shutdown_signal());

    let (client_result, admin_result) = tokio::join!(client_server, admin_server);
    client_result.expect("Client API server failed");
    admin_result.expect("Admin API server failed");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping listeners");
}
