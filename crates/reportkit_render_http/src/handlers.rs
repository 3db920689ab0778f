//! HTTP request handlers.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use reportkit_render::{
    EnumDocumentKind, SpecRenderOptions, SpecRenderedDocument, render_document,
    render_error_document,
};
use serde::Serialize;
use tracing::{error, info};

use crate::ApiState;

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}

/// Liveness for the whole service.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "report-generator",
    })
}

/// `GET` on the workbook endpoint.
pub async fn health_excel() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "excel-chart-generator",
    })
}

/// `GET` on the deck endpoint.
pub async fn health_ppt() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "ppt-generator",
    })
}

/// Plain `OPTIONS`; the CORS layer answers real preflights and adds headers here.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

pub async fn generate_excel(State(state): State<ApiState>, body: Bytes) -> Response {
    generate(state, body, EnumDocumentKind::Workbook).await
}

pub async fn generate_ppt(State(state): State<ApiState>, body: Bytes) -> Response {
    generate(state, body, EnumDocumentKind::Deck).await
}

/// Render off the async runtime. Always answers 200 with an attachment.
async fn generate(state: ApiState, body: Bytes, kind: EnumDocumentKind) -> Response {
    info!(kind = ?kind, n_bytes = body.len(), "generate request");
    let assets = state.assets.clone();
    let result = tokio::task::spawn_blocking(move || {
        render_document(&body, kind, &assets, &SpecRenderOptions::now())
    })
    .await;

    let doc = match result {
        Ok(doc) => doc,
        Err(err) => {
            error!(kind = ?kind, error = %err, "render task failed");
            render_error_document(kind, &format!("Critical Handler Error: {err}"), &[])
        }
    };
    create_attachment_response(doc)
}

fn create_attachment_response(doc: SpecRenderedDocument) -> Response {
    let content_disposition = HeaderValue::try_from(format!("attachment; filename=\"{}\"", doc.filename))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
    let content_type = HeaderValue::try_from(doc.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, content_disposition),
        ],
        doc.bytes,
    )
        .into_response()
}
