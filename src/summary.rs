//! Per-category totals over all transactions.
//!
//! The summary is recomputed from the database on every request, there is no
//! cached copy that could go stale after a write.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{AppState, Error, transaction::decode_json_column};

/// The totals for a single category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    /// The category exactly as it was stored, `null` for transactions without one.
    pub category: Value,
    /// The sum of deposits across the category.
    pub total_deposits: f64,
    /// The sum of withdrawals across the category.
    pub total_withdrawals: f64,
    /// The number of transactions in the category.
    pub count: i64,
}

/// Group every transaction by category and total up each group.
///
/// Returns one row per distinct category value. Transactions without a
/// category form their own group, and values of different JSON types never
/// share a group (`"42"` is not `42`). The order of the rows is unspecified.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_summary(connection: &Connection) -> Result<Vec<CategorySummary>, Error> {
    connection
        .prepare(
            "SELECT category, SUM(deposits), SUM(withdrawals), COUNT(*) \
            FROM \"transaction\" \
            GROUP BY category",
        )?
        .query_map([], map_summary_row)?
        .map(|maybe_summary| maybe_summary.map_err(Error::from))
        .collect()
}

fn map_summary_row(row: &Row) -> Result<CategorySummary, rusqlite::Error> {
    Ok(CategorySummary {
        category: decode_json_column(row, 0)?,
        total_deposits: row.get(1)?,
        total_withdrawals: row.get(2)?,
        count: row.get(3)?,
    })
}

/// The state needed to summarise transactions.
#[derive(Debug, Clone)]
pub struct SummaryState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SummaryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

const FAILURE_MESSAGE: &str = "Failed to generate summary";

/// A route handler that responds with the per-category totals as a JSON array.
pub async fn get_summary_endpoint(State(state): State<SummaryState>) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_json_response(FAILURE_MESSAGE);
        }
    };

    match get_summary(&connection) {
        Ok(summary) => Json(summary).into_response(),
        Err(error) => error.into_json_response(FAILURE_MESSAGE),
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use serde_json::{Value, json};

    use crate::{
        initialize_db,
        summary::{CategorySummary, get_summary},
        transaction::{
            Transaction, TransactionFields, create_transaction, delete_transaction,
            replace_transaction,
        },
    };

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize_db(&connection).unwrap();
        connection
    }

    fn must_get_sorted_summary(connection: &Connection) -> Vec<CategorySummary> {
        let mut summary = get_summary(connection).expect("could not get summary");
        summary.sort_by_key(|row| row.category.to_string());
        summary
    }

    fn summary_row(
        category: Value,
        total_deposits: f64,
        total_withdrawals: f64,
        count: i64,
    ) -> CategorySummary {
        CategorySummary {
            category,
            total_deposits,
            total_withdrawals,
            count,
        }
    }

    #[test]
    fn groups_by_category() {
        let connection = get_test_connection();
        for fields in [
            Transaction::build("2025-03-01", Some("food")).withdrawals(10.0),
            Transaction::build("2025-03-01", Some("food")).deposits(5.0),
            Transaction::build("2025-03-01", Some("rent")).withdrawals(100.0),
        ] {
            create_transaction(fields, &connection).unwrap();
        }

        let summary = must_get_sorted_summary(&connection);

        assert_eq!(
            summary,
            vec![
                summary_row(json!("food"), 5.0, 10.0, 2),
                summary_row(json!("rent"), 0.0, 100.0, 1),
            ]
        );
    }

    #[test]
    fn missing_category_forms_its_own_group() {
        let connection = get_test_connection();
        for fields in [
            Transaction::build("2025-03-01", None).deposits(1.5),
            Transaction::build("2025-03-01", None).deposits(2.5),
            Transaction::build("2025-03-01", Some("")).deposits(4.0),
        ] {
            create_transaction(fields, &connection).unwrap();
        }

        let summary = must_get_sorted_summary(&connection);

        assert_eq!(
            summary,
            vec![
                summary_row(json!(""), 4.0, 0.0, 1),
                summary_row(json!(null), 4.0, 0.0, 2),
            ]
        );
    }

    #[test]
    fn numbers_and_strings_are_different_categories() {
        let connection = get_test_connection();
        for category in [json!(42), json!("42"), json!(42)] {
            let fields = TransactionFields {
                date: json!("2025-03-01"),
                category,
                deposits: 1.0,
                withdrawals: 0.0,
            };
            create_transaction(fields, &connection).unwrap();
        }

        let summary = must_get_sorted_summary(&connection);

        assert_eq!(
            summary,
            vec![
                summary_row(json!("42"), 1.0, 0.0, 1),
                summary_row(json!(42), 2.0, 0.0, 2),
            ]
        );
    }

    #[test]
    fn empty_database_has_empty_summary() {
        let connection = get_test_connection();

        assert_eq!(get_summary(&connection), Ok(vec![]));
    }

    #[test]
    fn reflects_updates_and_deletes() {
        let connection = get_test_connection();
        let food = create_transaction(
            Transaction::build("2025-03-01", Some("food")).withdrawals(10.0),
            &connection,
        )
        .unwrap();
        let rent = create_transaction(
            Transaction::build("2025-03-01", Some("rent")).withdrawals(100.0),
            &connection,
        )
        .unwrap();

        replace_transaction(
            &food.id,
            &Transaction::build("2025-03-01", Some("rent")).withdrawals(20.0),
            &connection,
        )
        .unwrap();

        assert_eq!(
            must_get_sorted_summary(&connection),
            vec![summary_row(json!("rent"), 0.0, 120.0, 2)]
        );

        delete_transaction(&rent.id, &connection).unwrap();

        assert_eq!(
            must_get_sorted_summary(&connection),
            vec![summary_row(json!("rent"), 0.0, 20.0, 1)]
        );
    }
}
