//! Core domain logic for the StratAI workspace backend.
//! Spaces, areas, documents and arena battles live here; transports build
//! on the services exported below.

pub mod db;
pub mod export;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::{open_db, open_db_in_memory, share, DbError, SharedConnection};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use repo::{RepoError, RepoResult, SqliteStore};
pub use service::arena_service::ArenaService;
pub use service::area_service::AreaService;
pub use service::document_service::DocumentService;
pub use service::member_service::MemberService;
pub use service::sharing_service::SharingService;
pub use service::space_service::SpaceService;
pub use service::{ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
