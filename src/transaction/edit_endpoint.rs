use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State, rejection::JsonRejection},
    response::{IntoResponse, Response},
};
use rusqlite::{Connection, params};

use crate::{
    AppState, Error,
    database_id::TransactionId,
    transaction::{Transaction, TransactionFields, encode_json_column, map_transaction_row},
};

/// The state needed to edit a transaction.
#[derive(Debug, Clone)]
pub struct EditTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

const FAILURE_MESSAGE: &str = "Failed to update transaction";

/// A route handler for replacing the fields of a transaction, responds with
/// the updated transaction.
///
/// The ID in the path is the only ID that counts, any ID in the body is ignored.
pub async fn edit_transaction_endpoint(
    State(state): State<EditTransactionState>,
    Path(transaction_id): Path<TransactionId>,
    body: Result<Json<TransactionFields>, JsonRejection>,
) -> Response {
    let Json(fields) = match body {
        Ok(body) => body,
        Err(rejection) => return Error::from(rejection).into_json_response(FAILURE_MESSAGE),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_json_response(FAILURE_MESSAGE);
        }
    };

    match replace_transaction(&transaction_id, &fields, &connection) {
        Ok(transaction) => Json(transaction).into_response(),
        Err(Error::UpdateMissingTransaction) => {
            tracing::debug!("Could not update transaction {transaction_id}: not found");
            Error::UpdateMissingTransaction.into_json_response(FAILURE_MESSAGE)
        }
        Err(error) => error.into_json_response(FAILURE_MESSAGE),
    }
}

/// Overwrite the date, category and amounts of the transaction with `id`.
///
/// The ID and creation time are left untouched. Concurrent updates to the
/// same transaction are last-write-wins.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingTransaction] if `id` does not refer to a transaction,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn replace_transaction(
    id: &str,
    fields: &TransactionFields,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(
            "UPDATE \"transaction\" \
            SET \
                date = ?1, \
                category = ?2, \
                deposits = ?3, \
                withdrawals = ?4 \
            WHERE id = ?5 \
            RETURNING id, date, category, deposits, withdrawals, created_at",
        )?
        .query_row(
            params![
                encode_json_column(&fields.date),
                encode_json_column(&fields.category),
                fields.deposits,
                fields.withdrawals,
                id,
            ],
            map_transaction_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::UpdateMissingTransaction,
            error => error.into(),
        })
}
