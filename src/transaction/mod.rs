//! Transaction management for the budget tracker.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and the `TransactionFields` accepted from clients
//! - Lenient coercion of the monetary amounts sent by clients
//! - Storage of the free-form `date` and `category` values as JSON text
//! - Database functions for storing, querying, and deleting transactions
//! - Route handlers for the transaction endpoints

mod coercion;
mod core;
mod create_endpoint;
mod delete_endpoint;
mod delete_multiple_endpoint;
mod edit_endpoint;
mod list_endpoint;

pub use self::core::{
    Transaction, TransactionFields, create_transaction, create_transaction_table,
    decode_json_column, encode_json_column, get_all_transactions, map_transaction_row,
};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::{MessageResponse, delete_transaction, delete_transaction_endpoint};
pub use delete_multiple_endpoint::{delete_transactions, delete_transactions_endpoint};
pub use edit_endpoint::{edit_transaction_endpoint, replace_transaction};
pub use list_endpoint::get_transactions_endpoint;

#[cfg(test)]
pub use self::core::{count_transactions, get_transaction};
