// Cardology Forecast - Web Server
// REST API with Axum over the load-once card repository

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use cardology_forecast::{
    AppConfig, BirthCard, CardDetails, CardReading, CardRepository, DirectorySource,
    ReadingRequest, TableSource,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

const DATA_UNAVAILABLE: &str = "data unavailable, please retry";

/// Shared application state
struct AppState<S: TableSource> {
    repo: Arc<CardRepository<S>>,
}

impl<S: TableSource> Clone for AppState<S> {
    fn clone(&self) -> Self {
        AppState {
            repo: self.repo.clone(),
        }
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Response {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
        .into_response()
    }

    fn fail(status: StatusCode, message: impl Into<String>) -> Response {
        (
            status,
            Json(Self {
                success: false,
                data: None,
                error: Some(message.into()),
            }),
        )
            .into_response()
    }
}

/// Query string for GET /api/reading
#[derive(Debug, Deserialize)]
struct ReadingQuery {
    #[serde(default)]
    name: String,
    month: u32,
    day: u32,
    year: i32,
}

impl From<ReadingQuery> for ReadingRequest {
    fn from(query: ReadingQuery) -> Self {
        ReadingRequest::new(query.name, query.month, query.day, query.year)
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    ApiResponse::ok("OK")
}

/// GET /api/reading - Full reading for one person
async fn get_reading<S: TableSource + 'static>(
    State(state): State<AppState<S>>,
    Query(query): Query<ReadingQuery>,
) -> Response {
    let request = ReadingRequest::from(query);

    // Bad input is the caller's problem, not a data outage
    if let Err(e) = request.birth_date() {
        return ApiResponse::<CardReading>::fail(StatusCode::BAD_REQUEST, e.to_string());
    }

    if let Err(e) = state.repo.tables().await {
        error!("reading: {:#}", e);
        return ApiResponse::<CardReading>::fail(StatusCode::SERVICE_UNAVAILABLE, DATA_UNAVAILABLE);
    }

    match state.repo.reading(&request).await {
        Ok(reading) => ApiResponse::ok(reading),
        Err(e) => {
            warn!("reading rejected: {:#}", e);
            ApiResponse::<CardReading>::fail(StatusCode::BAD_REQUEST, e.to_string())
        }
    }
}

/// GET /api/birth-card/:month/:day - Birth card for a calendar day
async fn get_birth_card<S: TableSource + 'static>(
    State(state): State<AppState<S>>,
    Path((month, day)): Path<(u32, u32)>,
) -> Response {
    match state.repo.birth_card(month, day).await {
        Ok(card) => ApiResponse::ok(card),
        Err(e) => {
            error!("birth card: {:#}", e);
            ApiResponse::<BirthCard>::fail(StatusCode::SERVICE_UNAVAILABLE, DATA_UNAVAILABLE)
        }
    }
}

/// GET /api/cards/:card - Activation and profile for a card
async fn get_card<S: TableSource + 'static>(
    State(state): State<AppState<S>>,
    Path(card): Path<String>,
) -> Response {
    match state.repo.card_details(&card).await {
        Ok(details) => ApiResponse::ok(details),
        Err(e) => {
            error!("card details: {:#}", e);
            ApiResponse::<CardDetails>::fail(StatusCode::SERVICE_UNAVAILABLE, DATA_UNAVAILABLE)
        }
    }
}

/// Build the router (shared by main and tests)
fn app<S: TableSource + 'static>(repo: Arc<CardRepository<S>>) -> Router {
    let state = AppState { repo };

    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/reading", get(get_reading::<S>))
        .route("/birth-card/:month/:day", get(get_birth_card::<S>))
        .route("/cards/:card", get(get_card::<S>))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cardology_forecast=info,tower_http=info".into()),
        )
        .init();

    println!("🌐 Cardology Forecast - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = AppConfig::load()?;
    let source = DirectorySource::new(&config.data_dir).with_files(config.files.clone());
    let repo = Arc::new(CardRepository::new(source).with_rule(config.current_period_rule));

    // A failed warm-up is not fatal: tables load again on the next request
    match repo.preload().await {
        Ok(()) => println!("✓ Reference tables loaded from {}", config.data_dir.display()),
        Err(e) => {
            eprintln!("⚠️  Reference tables not loaded yet: {:#}", e);
            eprintln!("   Requests will retry the load.");
        }
    }

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %config.bind_addr, "listening");

    println!("\n🚀 Server running on http://{}", config.bind_addr);
    println!("   API: http://{}/api/reading?month=1&day=1&year=1990", config.bind_addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app(repo)).await?;
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
