//! HTTP API server implementation using Axum

use axum::{
    Router,
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use harvest_core::Query;
use harvest_protocol::{Codec, CodecError, CodecRegistry, CountResponse, ErrorResponse, endpoints};
use harvest_query::{Catalog, Evaluator};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

/// Shared application state, read-only after startup
#[derive(Clone)]
pub struct AppState {
    pub evaluator: Arc<Evaluator>,
    pub catalog: Arc<Catalog>,
    pub codecs: Arc<CodecRegistry>,
}

impl AppState {
    /// Bodies are decoded no deeper than the evaluator's depth bound allows
    pub fn new(evaluator: Evaluator, catalog: Catalog, codecs: CodecRegistry) -> Self {
        let codecs = codecs.with_max_nesting(evaluator.translator().max_nesting());
        Self {
            evaluator: Arc::new(evaluator),
            catalog: Arc::new(catalog),
            codecs: Arc::new(codecs),
        }
    }

    /// Codec for the response, chosen from the `Accept` header
    fn response_codec(&self, headers: &HeaderMap) -> Result<Codec, ApiError> {
        let accept = headers.get(header::ACCEPT).and_then(|v| v.to_str().ok());
        Ok(self.codecs.best_match(accept)?)
    }

    /// Decode and shape-check a request body
    fn decode_query(&self, headers: &HeaderMap, body: &[u8], reply: Codec) -> Result<Query, ApiError> {
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok());

        let payload: Value = self.codecs.decode(content_type, body).map_err(|e| match e {
            CodecError::NestingLimit(_) => {
                ApiError::evaluation(self.evaluator.translator().depth_error(), reply)
            }
            e => ApiError::from(e).with_codec(reply),
        })?;

        Query::from_value(payload).map_err(|e| ApiError::evaluation(e, reply))
    }
}

/// Error rendered as `{"error": ...}` in the negotiated encoding
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    codec: Codec,
}

impl ApiError {
    fn evaluation(e: harvest_core::Error, codec: Codec) -> Self {
        let status = if e.is_client_error() {
            StatusCode::UNPROCESSABLE_ENTITY
        } else {
            error!("Evaluation failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        };

        Self {
            status,
            message: e.message(),
            codec,
        }
    }

    fn internal(message: impl Into<String>, codec: Codec) -> Self {
        let message = message.into();
        error!("Internal error: {}", message);
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message,
            codec,
        }
    }

    fn with_codec(mut self, codec: Codec) -> Self {
        self.codec = codec;
        self
    }
}

impl From<CodecError> for ApiError {
    fn from(e: CodecError) -> Self {
        let status = match &e {
            CodecError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            CodecError::NotAcceptable(_) => StatusCode::NOT_ACCEPTABLE,
            CodecError::Decode(_) => StatusCode::BAD_REQUEST,
            CodecError::NestingLimit(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CodecError::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        Self {
            status,
            message: e.to_string(),
            codec: Codec::Json,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        debug!("Request failed with {}: {}", self.status, self.message);
        match encode(self.codec, self.status, &ErrorResponse::new(self.message.clone())) {
            Ok(response) => response,
            Err(_) => (self.status, self.message).into_response(),
        }
    }
}

/// Create HTTP server router
pub fn create_router(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .route(endpoints::ROOT, get(root))
        .route(endpoints::CATALOG, get(catalog))
        .route(endpoints::VALIDATE, post(validate))
        .route(endpoints::PLAN, post(plan))
        .route(endpoints::IDENTS, post(idents))
        .route(endpoints::COUNT, post(count))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn encode<T: Serialize>(codec: Codec, status: StatusCode, value: &T) -> Result<Response, ApiError> {
    let body = codec.encode(value)?;
    Ok((
        status,
        [(header::CONTENT_TYPE, HeaderValue::from_static(codec.media_type()))],
        body,
    )
        .into_response())
}

/// Run an evaluation on the blocking pool; engine calls may block on I/O
async fn evaluate<T, F>(state: &AppState, codec: Codec, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&Evaluator) -> harvest_core::Result<T> + Send + 'static,
{
    let evaluator = Arc::clone(&state.evaluator);
    tokio::task::spawn_blocking(move || f(evaluator.as_ref()))
        .await
        .map_err(|e| ApiError::internal(e.to_string(), codec))?
        .map_err(|e| ApiError::evaluation(e, codec))
}

// ==================== Liveness ====================

async fn root() -> StatusCode {
    StatusCode::NO_CONTENT
}

// ==================== Catalog ====================

async fn catalog(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, ApiError> {
    let codec = state.response_codec(&headers)?;
    encode(codec, StatusCode::OK, state.catalog.as_ref())
}

// ==================== Evaluation ====================

async fn validate(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let codec = state.response_codec(&headers)?;
    let query = state.decode_query(&headers, &body, codec)?;

    evaluate(&state, codec, move |evaluator| evaluator.check(&query)).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn plan(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let codec = state.response_codec(&headers)?;
    let query = state.decode_query(&headers, &body, codec)?;

    let plan = evaluate(&state, codec, move |evaluator| evaluator.plan(&query)).await?;
    encode(codec, StatusCode::OK, &plan)
}

async fn idents(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let codec = state.response_codec(&headers)?;
    let query = state.decode_query(&headers, &body, codec)?;

    let idents = evaluate(&state, codec, move |evaluator| evaluator.idents(&query)).await?;
    encode(codec, StatusCode::OK, &idents)
}

async fn count(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let codec = state.response_codec(&headers)?;
    let query = state.decode_query(&headers, &body, codec)?;

    let count = evaluate(&state, codec, move |evaluator| evaluator.count(&query)).await?;
    encode(codec, StatusCode::OK, &CountResponse { count })
}
