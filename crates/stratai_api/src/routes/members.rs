//! Area membership endpoints and candidate search.
//!
//! # Invariants
//! - A request body names exactly one of `userId` / `groupId`.
//! - The `owner` role is never granted, changed, or removed here.

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, AuthUser};
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use stratai_core::model::area::AreaId;
use stratai_core::model::member::{AreaMemberId, MemberTarget};
use stratai_core::model::user::{GroupId, UserId};
use stratai_core::MemberService;

/// Wire shape of an invite: exactly one of `userId` or `groupId`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AddMemberBody {
    #[serde(default)]
    user_id: Option<UserId>,
    #[serde(default)]
    group_id: Option<GroupId>,
    role: String,
}

impl AddMemberBody {
    fn target(&self) -> Result<MemberTarget, ApiError> {
        match (self.user_id, self.group_id) {
            (Some(user_id), None) => Ok(MemberTarget::User(user_id)),
            (None, Some(group_id)) => Ok(MemberTarget::Group(group_id)),
            _ => Err(ApiError::BadRequest(
                "exactly one of userId or groupId is required".to_string(),
            )),
        }
    }
}

#[derive(Deserialize)]
pub(crate) struct UpdateRoleBody {
    role: String,
}

#[derive(Deserialize)]
pub(crate) struct SearchParams {
    #[serde(default)]
    q: String,
}

pub(crate) async fn list(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(area_id): ApiPath<AreaId>,
) -> Result<Json<Value>, ApiError> {
    let members = state
        .with_store(move |store| Ok(MemberService::new(store).list_members(actor, area_id)?))
        .await?;
    Ok(Json(json!({ "members": members })))
}

pub(crate) async fn add(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(area_id): ApiPath<AreaId>,
    ApiJson(body): ApiJson<AddMemberBody>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let target = body.target()?;
    let member = state
        .with_store(move |store| {
            Ok(MemberService::new(store).add_member(actor, area_id, target, &body.role)?)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "member": member }))))
}

pub(crate) async fn update_role(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath((area_id, member_id)): ApiPath<(AreaId, AreaMemberId)>,
    ApiJson(body): ApiJson<UpdateRoleBody>,
) -> Result<Json<Value>, ApiError> {
    let member = state
        .with_store(move |store| {
            Ok(MemberService::new(store).update_member_role(actor, area_id, member_id, &body.role)?)
        })
        .await?;
    Ok(Json(json!({ "member": member })))
}

pub(crate) async fn remove(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath((area_id, member_id)): ApiPath<(AreaId, AreaMemberId)>,
) -> Result<Json<Value>, ApiError> {
    state
        .with_store(move |store| {
            Ok(MemberService::new(store).remove_member(actor, area_id, member_id)?)
        })
        .await?;
    Ok(Json(json!({ "success": true })))
}

pub(crate) async fn search(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(area_id): ApiPath<AreaId>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Value>, ApiError> {
    let results = state
        .with_store(move |store| {
            Ok(MemberService::new(store).search_candidates(actor, area_id, &params.q)?)
        })
        .await?;
    Ok(Json(json!({ "results": results })))
}
