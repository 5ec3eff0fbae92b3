use anyhow::Result;
use axum::extract::{Query, State};
use axum::response::Json;
use axum::routing::{delete, get};
use axum::Router;
use chrono::{Local, TimeDelta};
use data_ingestion::{DatasetCache, Feed};
use log::info;
use price_metrics::to_frame;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::config::DashboardConfig;
use crate::dashboard::{DashboardParams, DashboardRequest, DashboardView, build_dashboard, date_span};
use crate::error::ApiError;

/// Shared application state: the feed, the dataset cache and the loaded config.
struct AppState<F> {
    feed: Arc<F>,
    cache: Arc<DatasetCache>,
    config: Arc<DashboardConfig>,
}

impl<F> Clone for AppState<F> {
    fn clone(&self) -> Self {
        Self {
            feed: self.feed.clone(),
            cache: self.cache.clone(),
            config: self.config.clone(),
        }
    }
}

impl<F: Feed> AppState<F> {
    async fn view(&self, params: DashboardParams) -> Result<DashboardView, ApiError> {
        let request = DashboardRequest::parse(params, &self.config.defaults)?;
        let history = TimeDelta::days(self.config.feed.history_days);
        let now = Local::now().naive_local();
        build_dashboard(self.feed.as_ref(), &self.cache, history, &request, now).await
    }
}

async fn health() -> &'static str {
    "ok"
}

/// GET /dashboard returns the full view as JSON.
async fn get_dashboard<F: Feed + 'static>(
    State(state): State<AppState<F>>,
    Query(params): Query<DashboardParams>,
) -> Result<Json<DashboardView>, ApiError> {
    Ok(Json(state.view(params).await?))
}

/// GET /dashboard/table returns the raw-data table as text.
async fn get_table<F: Feed + 'static>(
    State(state): State<AppState<F>>,
    Query(params): Query<DashboardParams>,
) -> Result<String, ApiError> {
    let view = state.view(params).await?;
    if !view.has_data() {
        return Ok(format!("{} ({}): no data\n", view.symbol, view.window));
    }

    let table = to_frame(&view.rows)?;
    let span = date_span(&view)
        .map(|(from, to)| format!(", {} to {}", from, to))
        .unwrap_or_default();
    Ok(format!("{} ({}{})\n{}\n", view.symbol, view.window, span, table))
}

/// DELETE /cache drops every memoized dataset.
async fn clear_cache<F: Feed + 'static>(State(state): State<AppState<F>>) -> Json<Value> {
    let dropped = state.cache.clear();
    info!("Cache cleared, {} datasets dropped", dropped);
    Json(json!({ "dropped": dropped }))
}

pub struct Server<F> {
    state: AppState<F>,
}

impl<F: Feed + 'static> Server<F> {
    pub fn init(feed: F, cache: DatasetCache, config: DashboardConfig) -> Self {
        let state = AppState {
            feed: Arc::new(feed),
            cache: Arc::new(cache),
            config: Arc::new(config),
        };

        Self { state }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(health))
            .route("/dashboard", get(get_dashboard::<F>))
            .route("/dashboard/table", get(get_table::<F>))
            .route("/cache", delete(clear_cache::<F>))
            .with_state(self.state.clone())
    }

    pub async fn run(&self) -> Result<()> {
        let addr = self.state.config.server.address();
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        info!("HTTP server running on {}", addr);
        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}
