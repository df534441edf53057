//! Request-scoped execution context
//!
//! The database handle produced at startup is installed into a base
//! context once. Every request derives its own copy carrying request
//! metadata; repository operations look the handle up here and fail with
//! [`AppError::StorageUnavailable`] when it is missing.

use crate::db::DbPool;
use crate::errors::{AppError, Result};

#[derive(Clone, Debug, Default)]
pub struct ExecutionContext {
    db: Option<DbPool>,
    request_id: Option<String>,
}

impl ExecutionContext {
    /// Empty context with no collaborators installed
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the shared database handle
    pub fn with_db(mut self, db: DbPool) -> Self {
        self.db = Some(db);
        self
    }

    /// Derive a context for one request
    pub fn for_request(&self, request_id: impl Into<String>) -> Self {
        Self {
            db: self.db.clone(),
            request_id: Some(request_id.into()),
        }
    }

    /// Look up the database handle
    pub fn db(&self) -> Result<&DbPool> {
        self.db.as_ref().ok_or(AppError::StorageUnavailable)
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }
}
