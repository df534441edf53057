//! Request-scoped context extraction

use axum::{extract::FromRequestParts, http::request::Parts};
use notarium_common::{AppError, ExecutionContext, ReceiptRepository};
use uuid::Uuid;

use crate::AppState;

/// Execution context derived from the base context for one request
#[derive(Debug, Clone)]
pub struct RequestContext(pub ExecutionContext);

impl RequestContext {
    /// Receipt repository bound to this request
    pub fn receipts(&self) -> ReceiptRepository {
        ReceiptRepository::new(self.0.clone())
    }
}

impl FromRequestParts<AppState> for RequestContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let request_id = parts
            .headers
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Ok(Self(state.ctx.for_request(request_id)))
    }
}
