//! Conversation export endpoint.
//!
//! # Responsibility
//! - Render posted markdown as an HTML, PDF or Word attachment.
//!
//! # Invariants
//! - `format` defaults to `pdf`; only empty markdown is rejected.
//! - PDF output needs a configured Gotenberg endpoint.

use crate::error::ApiError;
use crate::extract::{ApiJson, AuthUser};
use crate::gotenberg::html_to_pdf;
use crate::state::AppState;
use axum::extract::State;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use log::info;
use serde::Deserialize;
use std::time::{SystemTime, UNIX_EPOCH};
use stratai_core::export::{
    export_filename, markdown_to_docx, markdown_to_html, ExportFormat, DEFAULT_EXPORT_TITLE,
};

#[derive(Deserialize)]
pub(crate) struct ExportBody {
    #[serde(default)]
    markdown: String,
    #[serde(default)]
    format: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

pub(crate) async fn export(
    State(state): State<AppState>,
    AuthUser(_actor): AuthUser,
    ApiJson(body): ApiJson<ExportBody>,
) -> Result<Response, ApiError> {
    if body.markdown.is_empty() {
        return Err(ApiError::BadRequest(
            "no markdown content provided".to_string(),
        ));
    }
    let format = match body.format.as_deref() {
        Some(value) => value
            .parse::<ExportFormat>()
            .map_err(|err| ApiError::BadRequest(err.to_string()))?,
        None => ExportFormat::default(),
    };
    let title = body
        .title
        .as_deref()
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .unwrap_or(DEFAULT_EXPORT_TITLE);

    let bytes = match format {
        ExportFormat::Html => markdown_to_html(&body.markdown, title).into_bytes(),
        ExportFormat::Docx => markdown_to_docx(&body.markdown, title)?,
        ExportFormat::Pdf => {
            let html = markdown_to_html(&body.markdown, title);
            let base_url = state.gotenberg_url().ok_or_else(|| {
                ApiError::BadRequest("pdf export is not configured on this server".to_string())
            })?;
            html_to_pdf(state.http(), base_url, html).await?
        }
    };

    let unix_seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default();
    let filename = export_filename(&body.markdown, format, unix_seconds);
    info!(
        "event=conversation_export module=api status=ok format={} bytes={}",
        format.extension(),
        bytes.len()
    );

    Ok((
        [
            (CONTENT_TYPE, format.content_type().to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}
