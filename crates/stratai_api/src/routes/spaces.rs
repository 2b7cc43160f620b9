//! Space endpoints.

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, AuthUser};
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use stratai_core::model::space::SpaceId;
use stratai_core::model::user::UserId;
use stratai_core::SpaceService;

#[derive(Deserialize)]
pub(crate) struct CreateSpaceBody {
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AddSpaceMemberBody {
    user_id: UserId,
    role: String,
}

pub(crate) async fn list(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> Result<Json<Value>, ApiError> {
    let spaces = state
        .with_store(move |store| Ok(SpaceService::new(store).list_spaces(actor)?))
        .await?;
    Ok(Json(json!({ "spaces": spaces })))
}

pub(crate) async fn create(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiJson(body): ApiJson<CreateSpaceBody>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let (space, general) = state
        .with_store(move |store| Ok(SpaceService::new(store).create_space(actor, &body.name)?))
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "space": space, "generalArea": general })),
    ))
}

pub(crate) async fn get_one(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(space_id): ApiPath<SpaceId>,
) -> Result<Json<Value>, ApiError> {
    let (space, role) = state
        .with_store(move |store| Ok(SpaceService::new(store).get_space(actor, space_id)?))
        .await?;
    Ok(Json(json!({ "space": space, "role": role })))
}

pub(crate) async fn add_member(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(space_id): ApiPath<SpaceId>,
    ApiJson(body): ApiJson<AddSpaceMemberBody>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let member = state
        .with_store(move |store| {
            Ok(SpaceService::new(store).add_space_member(actor, space_id, body.user_id, &body.role)?)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "member": member }))))
}
