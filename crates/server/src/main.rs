use std::{
    net::SocketAddr,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use dispatch::{Catalog, Dispatcher, StatusSummary};
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{HealthResponse, StatsResponse},
};
use storage::CounterStore;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod app_state;
mod bot;
mod config;
mod telegram;
mod transport;

use app_state::AppState;
use config::{load_settings, parse_api_url, prepare_stats_path, Settings};
use telegram::TelegramTransport;

const HOME_PAGE: &str = r#"
<h1>🤖 Telegram Bot для кафедры ТиМ МФОР</h1>
<p>Бот успешно работает!</p>
<p><a href="/health">Проверить статус</a></p>
<p><a href="/stats">Посмотреть статистику</a></p>
"#;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings();
    let stats_path = prepare_stats_path(&settings.stats_file)?;
    let catalog = Arc::new(Catalog::department());
    let store = CounterStore::load(&stats_path, &catalog.counter_schema());
    let dispatcher = Dispatcher::new(catalog, store);

    let bot_running = Arc::new(AtomicBool::new(false));
    spawn_bot(&settings, dispatcher.clone(), bot_running.clone())?;

    let state = AppState {
        status: dispatcher.status().clone(),
        bot_running,
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, stats_file = %stats_path.display(), "status server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Starts the chat loop in the background. A missing token leaves the status
/// server running with the bot reported as down.
fn spawn_bot(
    settings: &Settings,
    dispatcher: Dispatcher,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let Some(token) = settings.bot_token.clone() else {
        error!("BOT_TOKEN is not set; telegram bot will not start");
        return Ok(());
    };

    let api_base = parse_api_url(&settings.telegram_api_url)?;
    let keyboard = dispatcher.catalog().keyboard().to_vec();
    let transport = TelegramTransport::new(api_base, token, keyboard, settings.poll_timeout())?
        .with_retry_delay(settings.retry_delay());

    tokio::spawn(async move {
        if let Err(error) = bot::run(dispatcher, Arc::new(transport), running.clone()).await {
            running.store(false, Ordering::SeqCst);
            error!(error = %format!("{error:#}"), "telegram bot exited");
        }
    });
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/stats/reset", post(reset_stats))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn unix_timestamp() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

async fn home() -> Html<&'static str> {
    Html(HOME_PAGE)
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(
        unix_timestamp(),
        state.bot_running.load(Ordering::SeqCst),
    ))
}

type HandlerError = (StatusCode, Json<ApiError>);

// The store lock may be held across a file write, so it is only taken on a
// blocking thread.
async fn stats(State(state): State<Arc<AppState>>) -> Result<Json<StatsResponse>, HandlerError> {
    let status = state.status.clone();
    let summary = tokio::task::spawn_blocking(move || status.summary())
        .await
        .map_err(status_task_failed)?;
    Ok(stats_body(summary))
}

/// Zeroes the live counters; the admin CLI resets through here while the
/// server is up.
async fn reset_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatsResponse>, HandlerError> {
    let status = state.status.clone();
    let summary = tokio::task::spawn_blocking(move || {
        status.reset_all();
        status.summary()
    })
    .await
    .map_err(status_task_failed)?;
    Ok(stats_body(summary))
}

fn stats_body(summary: StatusSummary) -> Json<StatsResponse> {
    Json(StatsResponse::running(summary.counts, summary.total, unix_timestamp()))
}

fn status_task_failed(error: tokio::task::JoinError) -> HandlerError {
    error!(%error, "status task failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiError::new(ErrorCode::Internal, "counters unavailable")),
    )
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ApiError::new(ErrorCode::NotFound, "no such endpoint")),
    )
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
