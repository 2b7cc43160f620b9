//! `/api/spaces/:id/areas` and `/api/areas/:id`.
//!
//! # Invariants
//! - Areas the caller cannot see answer 404, including on update and delete.
//! - Deleting the General area answers 400.

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, AuthUser};
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use stratai_core::model::area::{AreaId, AreaPatch, NewArea};
use stratai_core::model::space::SpaceId;
use stratai_core::AreaService;

pub(crate) async fn list(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(space_id): ApiPath<SpaceId>,
) -> Result<Json<Value>, ApiError> {
    let areas = state
        .with_store(move |store| Ok(AreaService::new(store).list_areas(actor, space_id)?))
        .await?;
    Ok(Json(json!({ "areas": areas })))
}

pub(crate) async fn create(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(space_id): ApiPath<SpaceId>,
    ApiJson(body): ApiJson<NewArea>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let area = state
        .with_store(move |store| Ok(AreaService::new(store).create_area(actor, space_id, &body)?))
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "area": area }))))
}

pub(crate) async fn get_one(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(area_id): ApiPath<AreaId>,
) -> Result<Json<Value>, ApiError> {
    let area = state
        .with_store(move |store| Ok(AreaService::new(store).get_area(actor, area_id)?))
        .await?;
    Ok(Json(json!({ "area": area })))
}

pub(crate) async fn update(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(area_id): ApiPath<AreaId>,
    ApiJson(patch): ApiJson<AreaPatch>,
) -> Result<Json<Value>, ApiError> {
    let area = state
        .with_store(move |store| Ok(AreaService::new(store).update_area(actor, area_id, &patch)?))
        .await?;
    Ok(Json(json!({ "area": area })))
}

pub(crate) async fn remove(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(area_id): ApiPath<AreaId>,
) -> Result<Json<Value>, ApiError> {
    state
        .with_store(move |store| Ok(AreaService::new(store).delete_area(actor, area_id)?))
        .await?;
    Ok(Json(json!({ "success": true })))
}
