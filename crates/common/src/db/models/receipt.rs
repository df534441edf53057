//! Receipt entity

use sea_orm::entity::prelude::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "receipts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,

    /// Soft-delete marker, rows with a value here are invisible to reads
    #[sea_orm(nullable, indexed)]
    pub deleted_at: Option<DateTimeUtc>,

    #[sea_orm(column_type = "Text", indexed)]
    pub target_hash: String,

    /// Source id of the first anchor at insertion time, empty if none
    #[sea_orm(column_type = "Text")]
    pub transaction_hash: String,

    #[sea_orm(column_type = "Text")]
    pub filename: String,

    pub date: DateTimeUtc,

    /// Serialized proof, stored verbatim
    #[sea_orm(column_type = "Blob")]
    #[serde(skip)]
    pub json_data: Vec<u8>,
}

impl Model {
    /// Decode the stored proof into the caller's proof type
    pub fn decode_proof<P: DeserializeOwned>(&self) -> crate::errors::Result<P> {
        serde_json::from_slice(&self.json_data).map_err(AppError::Deserialization)
    }

    /// Whether the receipt has been soft-deleted
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn receipt_with(json_data: &[u8]) -> Model {
        let now = Utc::now();
        Model {
            id: 1,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            target_hash: "abcd".into(),
            transaction_hash: String::new(),
            filename: "deed.pdf".into(),
            date: now,
            json_data: json_data.to_vec(),
        }
    }

    #[test]
    fn test_decode_proof() {
        let receipt = receipt_with(br#"{"targetHash":"abcd"}"#);
        let proof: serde_json::Value = receipt.decode_proof().unwrap();
        assert_eq!(proof["targetHash"], "abcd");
        assert!(!receipt.is_deleted());
    }

    #[test]
    fn test_corrupt_proof_is_deserialization_error() {
        let receipt = receipt_with(b"not json");
        let result = receipt.decode_proof::<serde_json::Value>();
        assert!(matches!(result, Err(AppError::Deserialization(_))));
    }
}
