//! Route table.
//!
//! Every route answers cross-origin requests from any origin.

mod areas;
mod arena;
mod documents;
mod export;
mod members;
mod spaces;

use crate::extract::USER_ID_HEADER;
use crate::state::AppState;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, Method};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/spaces", get(spaces::list).post(spaces::create))
        .route("/api/spaces/:id", get(spaces::get_one))
        .route("/api/spaces/:id/members", post(spaces::add_member))
        .route(
            "/api/spaces/:id/areas",
            get(areas::list).post(areas::create),
        )
        .route(
            "/api/spaces/:id/documents",
            get(documents::list).post(documents::create),
        )
        .route(
            "/api/areas/:id",
            get(areas::get_one).patch(areas::update).delete(areas::remove),
        )
        .route(
            "/api/areas/:id/members",
            get(members::list).post(members::add),
        )
        .route("/api/areas/:id/members/search", get(members::search))
        .route(
            "/api/areas/:id/members/:member_id",
            patch(members::update_role).delete(members::remove),
        )
        .route(
            "/api/documents/:id",
            get(documents::get_one).delete(documents::remove),
        )
        .route(
            "/api/documents/:id/share",
            get(documents::get_sharing).post(documents::set_sharing),
        )
        .route("/api/arena/battles", post(arena::start))
        .route("/api/arena/battles/:id", get(arena::get_one))
        .route("/api/arena/battles/:id/actions", post(arena::apply))
        .route("/api/export", post(export::export))
        .with_state(state)
        .layer(cors_layer())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(USER_ID_HEADER)])
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
