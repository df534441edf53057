//! Receipt handlers

use axum::{
    extract::Path,
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::extract::RequestContext;
use notarium_common::{
    errors::{AppError, Result},
    Chainpoint, Receipt,
};

/// Request to store a receipt for an already built proof
#[derive(Debug, Deserialize, Validate)]
pub struct CreateReceiptRequest {
    #[validate(length(min = 1, max = 1024))]
    pub filename: String,

    pub proof: Chainpoint,
}

/// Receipt with its decoded proof
#[derive(Debug, Serialize, Deserialize)]
pub struct ReceiptResponse {
    pub id: i32,
    pub target_hash: String,
    pub transaction_hash: String,
    pub filename: String,
    pub date: String,
    pub created_at: String,
    pub proof: serde_json::Value,
}

/// Receipt metadata without the proof body
#[derive(Debug, Serialize, Deserialize)]
pub struct ReceiptSummary {
    pub id: i32,
    pub target_hash: String,
    pub transaction_hash: String,
    pub filename: String,
    pub date: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReceiptListResponse {
    pub receipts: Vec<ReceiptSummary>,
    pub count: usize,
}

impl TryFrom<Receipt> for ReceiptResponse {
    type Error = AppError;

    fn try_from(receipt: Receipt) -> Result<Self> {
        let proof = receipt.decode_proof::<serde_json::Value>()?;

        Ok(Self {
            id: receipt.id,
            target_hash: receipt.target_hash,
            transaction_hash: receipt.transaction_hash,
            filename: receipt.filename,
            date: receipt.date.to_rfc3339(),
            created_at: receipt.created_at.to_rfc3339(),
            proof,
        })
    }
}

impl From<Receipt> for ReceiptSummary {
    fn from(receipt: Receipt) -> Self {
        Self {
            id: receipt.id,
            target_hash: receipt.target_hash,
            transaction_hash: receipt.transaction_hash,
            filename: receipt.filename,
            date: receipt.date.to_rfc3339(),
        }
    }
}

/// Store a receipt for a proof produced by the anchoring service
pub async fn create_receipt(
    ctx: RequestContext,
    Json(request): Json<CreateReceiptRequest>,
) -> Result<(StatusCode, Json<ReceiptResponse>)> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    // Chainpoint target hashes are whole-byte hex digests
    let target_hash = &request.proof.target_hash;
    if target_hash.is_empty() || hex::decode(target_hash).is_err() {
        return Err(AppError::InvalidFormat {
            message: format!("target hash {:?} is not a hex digest", target_hash),
        });
    }

    let receipt = ctx
        .receipts()
        .insert(Utc::now(), &request.filename, &request.proof)
        .await?;

    Ok((StatusCode::CREATED, Json(ReceiptResponse::try_from(receipt)?)))
}

/// Latest live receipt for a target hash
pub async fn get_receipt(
    ctx: RequestContext,
    Path(hash): Path<String>,
) -> Result<Json<ReceiptResponse>> {
    let receipt = ctx
        .receipts()
        .find_latest_by_hash(&hash)
        .await?
        .ok_or_else(|| AppError::ReceiptNotFound { hash: hash.clone() })?;

    Ok(Json(ReceiptResponse::try_from(receipt)?))
}

/// List live receipts
pub async fn list_receipts(ctx: RequestContext) -> Result<Json<ReceiptListResponse>> {
    let receipts = match ctx.receipts().list_all().await {
        Ok(receipts) => receipts,
        Err(AppError::NoReceipts) => Vec::new(),
        Err(e) => return Err(e),
    };

    let receipts: Vec<ReceiptSummary> = receipts.into_iter().map(Into::into).collect();

    Ok(Json(ReceiptListResponse {
        count: receipts.len(),
        receipts,
    }))
}

/// Soft-delete every receipt for a target hash
pub async fn delete_receipts(
    ctx: RequestContext,
    Path(hash): Path<String>,
) -> Result<StatusCode> {
    ctx.receipts().delete_by_hash(&hash).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_router, AppState};
    use axum::{
        body::{to_bytes, Body},
        http::Request,
        Router,
    };
    use notarium_common::{config::DatabaseConfig, db, AppConfig, ExecutionContext};
    use serde_json::json;
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn app() -> Router {
        let mut config = AppConfig::default();
        config.database = DatabaseConfig::with_url("sqlite::memory:");
        config.database.max_connections = 1;
        config.database.connect_attempts = 1;

        let pool = db::bootstrap(&config.database).await.unwrap();
        create_router(AppState {
            config: Arc::new(config),
            ctx: ExecutionContext::new().with_db(pool),
        })
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<serde_json::Value>) -> (StatusCode, Vec<u8>) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header("content-type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    fn create_body(hash: &str, filename: &str) -> serde_json::Value {
        json!({
            "filename": filename,
            "proof": {
                "targetHash": hash,
                "merkleRoot": "ff",
                "anchors": [{ "type": "ETHData", "sourceId": "0xfeed" }]
            }
        })
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let app = app().await;

        let (status, _) = send(&app, "POST", "/v1/receipts", Some(create_body("abcd", "deed.pdf"))).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(&app, "GET", "/v1/receipts/abcd", None).await;
        assert_eq!(status, StatusCode::OK);

        let receipt: ReceiptResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(receipt.filename, "deed.pdf");
        assert_eq!(receipt.transaction_hash, "0xfeed");
        assert_eq!(receipt.proof["targetHash"], "abcd");
    }

    #[tokio::test]
    async fn test_unknown_hash_is_404() {
        let app = app().await;
        let (status, _) = send(&app, "GET", "/v1/receipts/0000", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_rejects_non_hex_hash() {
        let app = app().await;
        let (status, _) = send(&app, "POST", "/v1/receipts", Some(create_body("not-hex", "a.pdf"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_rejects_odd_length_hash() {
        let app = app().await;
        let (status, _) = send(&app, "POST", "/v1/receipts", Some(create_body("abc", "a.pdf"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_error_response_keeps_request_id() {
        let app = app().await;
        let request = Request::builder()
            .uri("/v1/receipts/0000")
            .header("x-request-id", "req-42")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()["x-request-id"], "req-42");
    }

    #[tokio::test]
    async fn test_rejects_empty_filename() {
        let app = app().await;
        let (status, _) = send(&app, "POST", "/v1/receipts", Some(create_body("abcd", ""))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_empty_list_is_ok() {
        let app = app().await;
        let (status, body) = send(&app, "GET", "/v1/receipts", None).await;
        assert_eq!(status, StatusCode::OK);

        let list: ReceiptListResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(list.count, 0);
    }

    #[tokio::test]
    async fn test_delete_hides_receipt() {
        let app = app().await;
        send(&app, "POST", "/v1/receipts", Some(create_body("abcd", "a.pdf"))).await;
        send(&app, "POST", "/v1/receipts", Some(create_body("ef01", "b.pdf"))).await;

        let (status, _) = send(&app, "DELETE", "/v1/receipts/abcd", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, "DELETE", "/v1/receipts/abcd", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, body) = send(&app, "GET", "/v1/receipts", None).await;
        let list: ReceiptListResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(list.count, 1);
        assert_eq!(list.receipts[0].target_hash, "ef01");
    }

    #[tokio::test]
    async fn test_missing_handle_is_unavailable() {
        let app = create_router(AppState {
            config: Arc::new(AppConfig::default()),
            ctx: ExecutionContext::new(),
        });

        let (status, _) = send(&app, "GET", "/v1/receipts/abcd", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
