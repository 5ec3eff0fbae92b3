use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use data_ingestion::DataIngestionError;
use log::error;
use price_metrics::MetricsError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Ingestion(#[from] DataIngestionError),

    #[error(transparent)]
    Metrics(#[from] MetricsError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Ingestion(DataIngestionError::EmptySymbolList) => StatusCode::BAD_REQUEST,
            ApiError::Ingestion(e) if e.is_retrieval() => StatusCode::BAD_GATEWAY,
            ApiError::Ingestion(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Metrics(MetricsError::UnknownWindow(_)) => StatusCode::BAD_REQUEST,
            ApiError::Metrics(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        let feed_down = ApiError::from(DataIngestionError::FeedError {
            symbol: "X".to_string(),
            message: "timeout".to_string(),
        });
        assert_eq!(feed_down.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(feed_down.into_response().status(), StatusCode::BAD_GATEWAY);

        assert_eq!(ApiError::from(DataIngestionError::EmptySymbolList).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::from(MetricsError::UnknownWindow("2w".to_string())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::BadRequest("x".to_string()).status(), StatusCode::BAD_REQUEST);
    }
}
