//! Shared application state.

use crate::error::ApiError;
use std::sync::Arc;
use std::time::Duration;
use stratai_core::{DbError, RepoError, SharedConnection, SqliteStore};

/// Upper bound for one Gotenberg conversion.
pub const PDF_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct AppState {
    conn: SharedConnection,
    gotenberg_url: Option<Arc<str>>,
    http: reqwest::Client,
}

impl AppState {
    pub fn new(conn: SharedConnection, gotenberg_url: Option<String>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(PDF_TIMEOUT)
            .build()
            .map_err(|err| ApiError::internal(format!("failed to build http client: {err}")))?;
        let gotenberg_url = gotenberg_url
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .map(Arc::from);
        Ok(Self {
            conn,
            gotenberg_url,
            http,
        })
    }

    pub(crate) fn gotenberg_url(&self) -> Option<&str> {
        self.gotenberg_url.as_deref()
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Runs synchronous storage work on the blocking pool.
    pub(crate) async fn with_store<T, F>(&self, op: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: for<'c> FnOnce(SqliteStore<'c>) -> Result<T, ApiError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| ApiError::from(RepoError::Db(DbError::Poisoned)))?;
            let store = SqliteStore::try_new(&guard)?;
            op(store)
        })
        .await
        .map_err(|err| ApiError::internal(format!("storage task failed: {err}")))?
    }
}
