//! Academy-rs server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use academy_api::{middleware::AppState, router as api_router};
use academy_common::Config;
use academy_core::{
    ActivityLogService, AssignmentService, LifecycleService, NoopProvider, PaymentProvider,
    PaymentService, PricingEngine, PricingService, StatsService, UserService, WiseProvider,
};
use academy_db::repositories::{
    ActivityLogRepository, AssignmentRepository, PaymentRepository, PricingRuleRepository,
    UserRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "academy=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting academy-rs server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database and run migrations
    let db = academy_db::init(&config).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    academy_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let assignment_repo = AssignmentRepository::new(Arc::clone(&db));
    let payment_repo = PaymentRepository::new(Arc::clone(&db));
    let activity_log_repo = ActivityLogRepository::new(Arc::clone(&db));
    let pricing_rule_repo = PricingRuleRepository::new(Arc::clone(&db));

    // Initialize services
    let activity_log_service = ActivityLogService::new(activity_log_repo);

    let user_service = UserService::new(user_repo.clone(), activity_log_service.clone());

    let lifecycle_service = LifecycleService::new(
        assignment_repo.clone(),
        payment_repo.clone(),
        activity_log_service.clone(),
    );

    let pricing_service = PricingService::new(
        pricing_rule_repo,
        PricingEngine::new(config.pricing.currency.clone()),
    );

    let assignment_service = AssignmentService::new(
        assignment_repo.clone(),
        user_repo.clone(),
        lifecycle_service.clone(),
        pricing_service,
        activity_log_service.clone(),
    );

    // Payment provider from config; unconfigured credentials degrade to
    // recorded-but-uncollectable payments rather than a startup failure
    let provider: Arc<dyn PaymentProvider> = match WiseProvider::from_config(&config.payment) {
        Some(provider) => {
            info!("Payment provider configured (wise)");
            Arc::new(provider)
        }
        None => {
            info!("Payment provider not configured; checkouts will be degraded");
            Arc::new(NoopProvider)
        }
    };

    let payment_service = PaymentService::new(
        payment_repo.clone(),
        assignment_repo.clone(),
        lifecycle_service.clone(),
        activity_log_service.clone(),
        provider,
        config.payment.clone(),
    );

    let stats_service = StatsService::new(user_repo, assignment_repo, payment_repo);

    // Create app state
    let state = AppState {
        user_service,
        assignment_service,
        lifecycle_service,
        payment_service,
        activity_log_service,
        stats_service,
    };

    // Build router
    let app = Router::new()
        .nest("/api", api_router())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            academy_api::middleware::auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
