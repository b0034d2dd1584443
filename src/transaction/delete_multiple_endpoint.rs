use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State, rejection::JsonRejection},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error, database_id::TransactionId, transaction::delete_endpoint::MessageResponse,
};

/// The state needed to delete a batch of transactions.
#[derive(Debug, Clone)]
pub struct DeleteTransactionsState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteTransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The IDs of the transactions to delete.
#[derive(Debug, Deserialize)]
pub struct DeleteTransactionsRequest {
    ids: Vec<TransactionId>,
}

const FAILURE_MESSAGE: &str = "Failed to delete transactions";

/// A route handler for deleting many transactions at once, responds with how
/// many were actually deleted.
///
/// IDs that do not match a transaction are skipped without error. A body
/// without a list of string IDs is a failure, not an empty batch.
pub async fn delete_transactions_endpoint(
    State(state): State<DeleteTransactionsState>,
    body: Result<Json<DeleteTransactionsRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
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

    match delete_transactions(&request.ids, &connection) {
        Ok(deleted_count) => Json(MessageResponse {
            message: format!("{deleted_count} transactions deleted successfully"),
        })
        .into_response(),
        Err(error) => error.into_json_response(FAILURE_MESSAGE),
    }
}

type RowsAffected = usize;

/// Delete every transaction whose ID is in `ids`.
///
/// Each ID is deleted with its own statement, so a failure part way through
/// leaves the earlier deletions in place.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn delete_transactions(
    ids: &[TransactionId],
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    let mut statement = connection.prepare("DELETE FROM \"transaction\" WHERE id = ?1")?;
    let mut rows_affected = 0;

    for id in ids {
        rows_affected += statement.execute([id])?;
    }

    Ok(rows_affected)
}
