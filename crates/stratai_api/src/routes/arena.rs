//! Arena battle endpoints; battles are visible only to the user who started them.

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, AuthUser};
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use stratai_core::model::arena::{ArenaAction, BattleId};
use stratai_core::ArenaService;

#[derive(Deserialize)]
pub(crate) struct StartBattleBody {
    prompt: String,
    models: Vec<String>,
}

pub(crate) async fn start(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiJson(body): ApiJson<StartBattleBody>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let battle = state
        .with_store(move |store| {
            Ok(ArenaService::new(store).start_battle(actor, &body.prompt, &body.models)?)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "battle": battle }))))
}

pub(crate) async fn get_one(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(battle_id): ApiPath<BattleId>,
) -> Result<Json<Value>, ApiError> {
    let battle = state
        .with_store(move |store| Ok(ArenaService::new(store).get_battle(actor, battle_id)?))
        .await?;
    Ok(Json(json!({ "battle": battle })))
}

pub(crate) async fn apply(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(battle_id): ApiPath<BattleId>,
    ApiJson(action): ApiJson<ArenaAction>,
) -> Result<Json<Value>, ApiError> {
    let battle = state
        .with_store(move |store| {
            Ok(ArenaService::new(store).apply_action(actor, battle_id, &action)?)
        })
        .await?;
    Ok(Json(json!({ "battle": battle })))
}
