mod config;
mod db;
mod models;
mod responses;
mod routes;
mod services;
mod state;
mod usage;
pub mod utils;

use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderValue;
use axum::http::Method;
use axum::{
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use config::Config;
use db::postgres_organization_repository::PostgresOrganizationRepository;
use db::postgres_report_repository::PostgresReportRepository;
use responses::JsonResponse;
use routes::organizations::{create_organization, get_organization};
use routes::reports::{create_report, get_report, list_reports};
use routes::usage::{check_payment, get_usage};
use services::stripe::LiveStripeService;
use sqlx::PgPool;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::db::{
    organization_repository::OrganizationRepository, report_repository::ReportRepository,
};
use crate::services::stripe::StripeService;
use crate::state::AppState;
use crate::usage::UsageMeter;
use crate::utils::plan_limits::PlanLimits;

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber).unwrap();

    let rate_limit_ms: u64 = std::env::var("RATE_LIMITER_MILLISECONDS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        // Default: 200ms/token (~5 req/sec)
        .unwrap_or(200);
    let rate_limit_burst: u32 = std::env::var("RATE_LIMITER_BURST")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        // Default: allow short bursts during client polling
        .unwrap_or(20);
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond(rate_limit_ms)
            .burst_size(rate_limit_burst)
            .use_headers()
            .error_handler(|_err| {
                JsonResponse::too_many_requests(
                    "Too many requests. Please wait a moment and try again.",
                )
                .into_response()
            })
            .finish()
            .unwrap(),
    );

    // ✅ Background task to cleanup old IPs
    let governor_limiter = governor_conf.limiter().clone();
    std::thread::spawn(move || {
        let interval = std::time::Duration::from_secs(60);
        loop {
            std::thread::sleep(interval);
            governor_limiter.retain_recent();
        }
    });

    let config = Arc::new(Config::from_env());

    let pg_pool = establish_connection(&config.database_url).await;
    let organization_repo = Arc::new(PostgresOrganizationRepository {
        pool: pg_pool.clone(),
    }) as Arc<dyn OrganizationRepository>;

    let report_repo = Arc::new(PostgresReportRepository {
        pool: pg_pool.clone(),
    }) as Arc<dyn ReportRepository>;

    let plan_limits = PlanLimits {
        starter_monthly_reports: config.starter_monthly_report_limit,
        professional_monthly_reports: config.professional_monthly_report_limit,
    };
    let usage = UsageMeter::new(organization_repo.clone(), report_repo.clone(), plan_limits);

    let stripe =
        Arc::new(LiveStripeService::from_settings(&config.stripe)) as Arc<dyn StripeService>;

    let state = AppState {
        organization_repo,
        report_repo,
        usage,
        stripe,
        config: config.clone(),
    };

    let cors = CorsLayer::new()
        .allow_origin(config.frontend_origin.parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    let organization_routes = Router::new()
        .route("/", post(create_organization))
        .route("/{organization_id}", get(get_organization))
        .route("/{organization_id}/usage", get(get_usage))
        .route("/{organization_id}/usage/payment-check", get(check_payment))
        .route(
            "/{organization_id}/reports",
            post(create_report).get(list_reports),
        )
        .route("/{organization_id}/reports/{report_id}", get(get_report));

    let app = Router::new()
        .route("/", get(root))
        .nest("/api/organizations", organization_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(GovernorLayer {
            config: governor_conf.clone(),
        })
        .layer(cors);

    let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));

    let listener = TcpListener::bind(addr).await.unwrap();
    println!("Running at http://{}", addr);
    axum::serve(listener, make_service).await.unwrap();
}

/// A simple root route.
async fn root() -> Response {
    JsonResponse::success("Hello, Valora!").into_response()
}

/// Establish a connection to the database and verify it.
async fn establish_connection(database_url: &str) -> PgPool {
    let pool = PgPool::connect(database_url)
        .await
        .expect("Failed to connect to the database");

    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .expect("Failed to verify database connection");

    info!("✅ Successfully connected to the database");
    pool
}
