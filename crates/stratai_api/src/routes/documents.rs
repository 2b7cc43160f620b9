//! Document upload, read, delete and sharing endpoints.
//!
//! # Responsibility
//! - Expose `/api/spaces/:id/documents` and `/api/documents/:id`.
//! - Read and replace a document's visibility under `/api/documents/:id/share`.
//!
//! # Invariants
//! - Only the owner may read or change sharing; everyone else gets 404.
//! - `areas` visibility requires a non-empty `areaIds` list.

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, AuthUser};
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use stratai_core::model::area::AreaId;
use stratai_core::model::document::{DocumentId, NewDocument};
use stratai_core::model::space::SpaceId;
use stratai_core::{DocumentService, SharingService};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ShareBody {
    visibility: String,
    #[serde(default)]
    area_ids: Option<Vec<AreaId>>,
}

pub(crate) async fn list(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(space_id): ApiPath<SpaceId>,
) -> Result<Json<Value>, ApiError> {
    let documents = state
        .with_store(move |store| Ok(DocumentService::new(store).list_documents(actor, space_id)?))
        .await?;
    Ok(Json(json!({ "documents": documents })))
}

pub(crate) async fn create(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(space_id): ApiPath<SpaceId>,
    ApiJson(body): ApiJson<NewDocument>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let document = state
        .with_store(move |store| {
            Ok(DocumentService::new(store).create_document(actor, space_id, &body)?)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "document": document }))))
}

pub(crate) async fn get_one(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(document_id): ApiPath<DocumentId>,
) -> Result<Json<Value>, ApiError> {
    let (document, content) = state
        .with_store(move |store| Ok(DocumentService::new(store).get_document(actor, document_id)?))
        .await?;
    Ok(Json(json!({ "document": document, "content": content })))
}

pub(crate) async fn remove(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(document_id): ApiPath<DocumentId>,
) -> Result<Json<Value>, ApiError> {
    state
        .with_store(move |store| {
            Ok(DocumentService::new(store).delete_document(actor, document_id)?)
        })
        .await?;
    Ok(Json(json!({ "success": true })))
}

pub(crate) async fn get_sharing(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(document_id): ApiPath<DocumentId>,
) -> Result<Json<Value>, ApiError> {
    let sharing = state
        .with_store(move |store| Ok(SharingService::new(store).get_sharing(actor, document_id)?))
        .await?;
    Ok(Json(json!({ "sharing": sharing })))
}

pub(crate) async fn set_sharing(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(document_id): ApiPath<DocumentId>,
    ApiJson(body): ApiJson<ShareBody>,
) -> Result<Json<Value>, ApiError> {
    let sharing = state
        .with_store(move |store| {
            Ok(SharingService::new(store).set_sharing(
                actor,
                document_id,
                &body.visibility,
                body.area_ids.as_deref(),
            )?)
        })
        .await?;
    Ok(Json(json!({ "sharing": sharing })))
}
