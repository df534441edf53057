//! Receipt repository
//!
//! Hash-keyed operations over the `receipts` table. Every call looks the
//! database handle up in the caller's execution context, so a context
//! without a handle fails with `StorageUnavailable` rather than touching a
//! global. Receipts are never updated; deletion only sets `deleted_at`, and
//! every read filters soft-deleted rows out.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    Select, Set,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::db::models::*;
use crate::errors::{AppError, Result};
use crate::execution::ExecutionContext;
use crate::metrics::{self, QueryTimer};
use crate::proof::AnchoredProof;

/// Repository for receipt persistence
#[derive(Clone, Debug)]
pub struct ReceiptRepository {
    ctx: ExecutionContext,
}

impl ReceiptRepository {
    /// Create a repository bound to the given execution context
    pub fn new(ctx: ExecutionContext) -> Self {
        Self { ctx }
    }

    fn conn(&self) -> Result<&DatabaseConnection> {
        Ok(self.ctx.db()?.conn())
    }

    /// Live receipts only
    fn live() -> Select<ReceiptEntity> {
        ReceiptEntity::find().filter(ReceiptColumn::DeletedAt.is_null())
    }

    /// Store a new receipt for `proof`
    ///
    /// The proof is serialized before anything is written, so a proof that
    /// cannot be encoded leaves the store untouched. `transaction_hash` is
    /// snapshotted from the first anchor, or left empty.
    pub async fn insert<P>(&self, now: DateTime<Utc>, filename: &str, proof: &P) -> Result<Receipt>
    where
        P: AnchoredProof + Serialize,
    {
        let json_data = serde_json::to_vec(proof).map_err(AppError::Serialization)?;
        let target_hash = proof.target_hash().to_string();
        let transaction_hash = proof.first_anchor_source().unwrap_or_default().to_string();

        let conn = self.conn()?;
        let timer = QueryTimer::start("insert");
        let created = Utc::now();

        let receipt = ReceiptActiveModel {
            created_at: Set(created),
            updated_at: Set(created),
            deleted_at: Set(None),
            target_hash: Set(target_hash.clone()),
            transaction_hash: Set(transaction_hash),
            filename: Set(filename.to_string()),
            date: Set(now),
            json_data: Set(json_data),
            ..Default::default()
        };

        let result = receipt.insert(conn).await;
        timer.finish(result.is_ok());
        let receipt = result.map_err(|e| AppError::storage("insert", Some(&target_hash), e))?;

        metrics::record_insert();
        debug!(
            id = receipt.id,
            target_hash = %receipt.target_hash,
            transaction_hash = %receipt.transaction_hash,
            filename = %receipt.filename,
            date = %receipt.date,
            request_id = self.ctx.request_id(),
            "Receipt inserted"
        );

        Ok(receipt)
    }

    /// Most recently inserted live receipt for `hash`
    pub async fn find_latest_by_hash(&self, hash: &str) -> Result<Option<Receipt>> {
        let conn = self.conn()?;
        let timer = QueryTimer::start("find_latest_by_hash");

        let result = Self::live()
            .filter(ReceiptColumn::TargetHash.eq(hash))
            .order_by_desc(ReceiptColumn::Id)
            .one(conn)
            .await;

        timer.finish(result.is_ok());
        result.map_err(|e| AppError::storage("find_latest_by_hash", Some(hash), e))
    }

    /// Soft-delete every live receipt for `hash`
    ///
    /// Deleting a hash with no live receipts succeeds and returns 0.
    pub async fn delete_by_hash(&self, hash: &str) -> Result<u64> {
        let conn = self.conn()?;
        let timer = QueryTimer::start("delete_by_hash");
        let now = Utc::now();

        let result = ReceiptEntity::update_many()
            .col_expr(ReceiptColumn::DeletedAt, Expr::value(Some(now)))
            .col_expr(ReceiptColumn::UpdatedAt, Expr::value(now))
            .filter(ReceiptColumn::TargetHash.eq(hash))
            .filter(ReceiptColumn::DeletedAt.is_null())
            .exec(conn)
            .await;

        timer.finish(result.is_ok());
        let rows = result
            .map_err(|e| AppError::storage("delete_by_hash", Some(hash), e))?
            .rows_affected;

        metrics::record_delete(rows);
        info!(
            target_hash = %hash,
            rows,
            request_id = self.ctx.request_id(),
            "Receipts deleted"
        );

        Ok(rows)
    }

    /// Every live receipt in insertion order
    ///
    /// An empty store is reported as [`AppError::NoReceipts`] instead of an
    /// empty list; existing callers depend on that.
    pub async fn list_all(&self) -> Result<Vec<Receipt>> {
        let conn = self.conn()?;
        let timer = QueryTimer::start("list_all");

        let result = Self::live()
            .order_by_asc(ReceiptColumn::Id)
            .all(conn)
            .await;

        timer.finish(result.is_ok());
        let receipts = result.map_err(|e| AppError::storage("list_all", None, e))?;

        if receipts.is_empty() {
            return Err(AppError::NoReceipts);
        }

        Ok(receipts)
    }
}
