//! HTTP surface of the StratAI backend.
//!
//! # Responsibility
//! - Map REST routes onto `stratai_core` services.
//! - Authenticate callers from the gateway-provided user header.
//! - Translate service errors into JSON error responses.
//!
//! # Invariants
//! - Handlers never touch SQLite on the async runtime threads.
//! - Records the caller may not access answer 404, never 403.

pub mod error;
pub mod extract;
pub mod gotenberg;
mod routes;
pub mod state;

pub use error::ApiError;
pub use extract::{AuthUser, USER_ID_HEADER};
pub use routes::router;
pub use state::AppState;

use log::info;
use tokio::net::TcpListener;

/// Serves the API on an already bound listener until the task is dropped.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    info!("event=http_serve module=api status=ok addr={}", addr);
    axum::serve(listener, router(state)).await
}
