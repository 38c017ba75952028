//! Service binary: configuration, tracing, database, HTTP ingress.

use std::error::Error;
use std::sync::Arc;

use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use storefront_approvals::adapters::access::InstructionAccessAssigner;
use storefront_approvals::adapters::admins::ConfiguredAdmins;
use storefront_approvals::adapters::http::{approval_router, ApprovalAppState};
use storefront_approvals::adapters::postgres::{self, PostgresOrderStore};
use storefront_approvals::adapters::telegram::{TelegramChannel, TelegramClientConfig};
use storefront_approvals::application::{
    CallbackDispatcher, DecideOrderHandler, ProvisioningEngine, RequestReviewHandler,
};
use storefront_approvals::config::{AppConfig, ServerConfig};
use storefront_approvals::domain::foundation::ChatId;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load()?;
    config.validate()?;
    init_tracing(&config.server);

    let pool = postgres::connect(&config.database).await?;
    tracing::info!("Connected to PostgreSQL");
    if config.database.run_migrations {
        postgres::run_migrations(&pool).await?;
        tracing::info!("Migrations applied");
    }

    let mut store = PostgresOrderStore::new(pool);
    if let Some(lock_timeout) = config.database.lock_timeout() {
        store = store.with_lock_timeout(lock_timeout);
    }
    let store = Arc::new(store);

    let channel = Arc::new(TelegramChannel::new(
        TelegramClientConfig::new(config.telegram.bot_token.clone())
            .with_base_url(config.telegram.api_base_url.clone())
            .with_request_timeout(config.telegram.request_timeout()),
    )?);
    let admins = Arc::new(ConfiguredAdmins::new(
        config.approval.admin_ids(),
        ChatId::new(config.telegram.admin_chat_id.trim())?,
    ));

    let workflow = Arc::new(DecideOrderHandler::new(
        store.clone(),
        channel.clone(),
        admins.clone(),
        ProvisioningEngine::new(Arc::new(InstructionAccessAssigner::new())),
        config.approval.transaction_timeout(),
    ));
    let dispatcher = CallbackDispatcher::new(workflow, channel.clone(), admins.clone())
        .with_already_decided_notice(config.approval.notify_admin_on_already_decided);
    let review_requests = RequestReviewHandler::new(store, channel, admins);

    let state = ApprovalAppState {
        dispatcher: Arc::new(dispatcher),
        review_requests: Arc::new(review_requests),
        webhook_secret: config.telegram.webhook_secret.clone(),
        internal_token: config.server.internal_api_token.clone(),
    };
    if state.webhook_secret.is_none() {
        tracing::warn!("No webhook secret configured; Telegram webhook is unauthenticated");
    }

    let app = approval_router()
        .with_state(state)
        .layer(TimeoutLayer::new(config.server.request_timeout()))
        .layer(TraceLayer::new_for_http());

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, environment = ?config.server.environment, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shut down");
    Ok(())
}

/// JSON lines in production, human-readable otherwise. `RUST_LOG` overrides
/// the configured filter.
fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(server.log_level.clone()));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if server.is_production() {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
