//! SeaORM entity models
//!
//! Database entities for Notarium

mod receipt;

pub use receipt::{
    Entity as ReceiptEntity,
    Model as Receipt,
    ActiveModel as ReceiptActiveModel,
    Column as ReceiptColumn,
};
