//! Defines the core data models and database queries for transactions.

use rusqlite::{Connection, Row, types::Type};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Error, database_id::TransactionId, transaction::coercion::deserialize_amount};

#[cfg(test)]
use crate::transaction::coercion::normalize_amount;

// ============================================================================
// MODELS
// ============================================================================

/// A deposit into or withdrawal from an account, grouped under a category.
///
/// `date` and `category` are free-form: they are stored and returned exactly
/// as the client sent them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction, assigned by the database.
    pub id: TransactionId,
    /// When the transaction happened, `null` if the client did not say.
    pub date: Value,
    /// The label used to group transactions in the summary, `null` if there is none.
    pub category: Value,
    /// The amount of money paid in.
    pub deposits: f64,
    /// The amount of money taken out.
    pub withdrawals: f64,
    /// When the transaction was first saved.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[cfg(test)]
impl Transaction {
    /// Create the fields for a new transaction with zero deposits and withdrawals.
    ///
    /// Shortcut for [TransactionFields] for discoverability.
    pub fn build(date: &str, category: Option<&str>) -> TransactionFields {
        TransactionFields {
            date: Value::from(date),
            category: category.map_or(Value::Null, Value::from),
            deposits: 0.0,
            withdrawals: 0.0,
        }
    }
}

/// The client-editable fields of a [Transaction].
///
/// This is the JSON body accepted when creating or replacing a transaction.
/// Any `id` or `createdAt` sent by the client is not part of this type and is
/// therefore dropped during deserialization.
///
/// Nothing here is validated. `date` and `category` accept any JSON value and
/// default to `null`. `deposits` and `withdrawals` are coerced: a missing
/// field, `null`, or a value that cannot be read as a number becomes zero.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TransactionFields {
    /// When the transaction happened.
    #[serde(default)]
    pub date: Value,

    /// The category of the transaction, e.g. "Groceries" or "Rent".
    ///
    /// Transactions are summarised by exact category value, so `"42"` and `42`
    /// are different groups and every `null` category shares one group.
    #[serde(default)]
    pub category: Value,

    /// The amount of money paid in.
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub deposits: f64,

    /// The amount of money taken out.
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub withdrawals: f64,
}

#[cfg(test)]
impl TransactionFields {
    /// Set the deposits, replacing non-finite amounts with zero.
    pub fn deposits(mut self, deposits: f64) -> Self {
        self.deposits = normalize_amount(deposits);
        self
    }

    /// Set the withdrawals, replacing non-finite amounts with zero.
    pub fn withdrawals(mut self, withdrawals: f64) -> Self {
        self.withdrawals = normalize_amount(withdrawals);
        self
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create a new transaction in the database.
///
/// The ID and creation time are assigned here and never change afterwards.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn create_transaction(
    fields: TransactionFields,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let id = Uuid::new_v4().to_string();
    let created_at = OffsetDateTime::now_utc();

    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\" (id, date, category, deposits, withdrawals, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING id, date, category, deposits, withdrawals, created_at",
        )?
        .query_row(
            (
                id,
                encode_json_column(&fields.date),
                encode_json_column(&fields.category),
                fields.deposits,
                fields.withdrawals,
                created_at,
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
#[cfg(test)]
pub fn get_transaction(id: &str, connection: &Connection) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "SELECT id, date, category, deposits, withdrawals, created_at \
            FROM \"transaction\" WHERE id = :id",
        )?
        .query_row(&[(":id", &id)], map_transaction_row)?;

    Ok(transaction)
}

/// Retrieve every transaction in the database in the order they were created.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn get_all_transactions(connection: &Connection) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, date, category, deposits, withdrawals, created_at \
            FROM \"transaction\" ORDER BY rowid",
        )?
        .query_map([], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Get the total number of transactions in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
#[cfg(test)]
pub fn count_transactions(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM \"transaction\";", [], |row| {
            row.get(0)
        })
        .map_err(|error| error.into())
}

/// Create the transaction table and its indexes in the database.
///
/// `date` and `category` hold the client's JSON value as JSON text, or `NULL`
/// for a JSON `null`.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id TEXT PRIMARY KEY NOT NULL,
                date TEXT,
                category TEXT,
                deposits REAL NOT NULL,
                withdrawals REAL NOT NULL,
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_date ON \"transaction\"(date);",
        (),
    )?;

    // Used by the summary query.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_category ON \"transaction\"(category);",
        (),
    )?;

    Ok(())
}

/// Encode a free-form field for storage. JSON `null` is stored as SQL `NULL`
/// so that it groups the same way as a missing value.
pub fn encode_json_column(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        value => Some(value.to_string()),
    }
}

/// Read a column written with [encode_json_column] back into a JSON value.
pub fn decode_json_column(row: &Row, index: usize) -> Result<Value, rusqlite::Error> {
    let Some(text) = row.get::<_, Option<String>>(index)? else {
        return Ok(Value::Null);
    };

    serde_json::from_str(&text).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(error))
    })
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let date = decode_json_column(row, 1)?;
    let category = decode_json_column(row, 2)?;
    let deposits = row.get(3)?;
    let withdrawals = row.get(4)?;
    let created_at = row.get(5)?;

    Ok(Transaction {
        id,
        date,
        category,
        deposits,
        withdrawals,
        created_at,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod database_tests {
    use std::collections::HashSet;

    use rusqlite::Connection;
    use serde_json::json;

    use crate::{
        Error,
        db::initialize,
        transaction::{
            Transaction, TransactionFields, count_transactions, create_transaction,
            get_all_transactions, get_transaction,
        },
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn create_succeeds() {
        let conn = get_test_connection();

        let result = create_transaction(
            Transaction::build("2025-10-05", Some("food"))
                .deposits(12.3)
                .withdrawals(4.5),
            &conn,
        );

        match result {
            Ok(transaction) => {
                assert!(!transaction.id.is_empty());
                assert_eq!(transaction.date, json!("2025-10-05"));
                assert_eq!(transaction.category, json!("food"));
                assert_eq!(transaction.deposits, 12.3);
                assert_eq!(transaction.withdrawals, 4.5);
            }
            Err(error) => panic!("Unexpected error: {error}"),
        }
    }

    #[test]
    fn create_stores_date_and_category_as_sent() {
        let conn = get_test_connection();
        let fields = TransactionFields {
            date: json!("2025-01-15T10:00:00.000Z"),
            category: json!(42),
            deposits: 0.0,
            withdrawals: 0.0,
        };

        let transaction = create_transaction(fields, &conn).expect("Could not create transaction");

        assert_eq!(transaction.date, json!("2025-01-15T10:00:00.000Z"));
        assert_eq!(transaction.category, json!(42));
        assert_eq!(get_transaction(&transaction.id, &conn), Ok(transaction));
    }

    #[test]
    fn create_without_date_or_category_stores_null() {
        let conn = get_test_connection();
        let fields = TransactionFields {
            date: json!(null),
            category: json!(null),
            deposits: 1.0,
            withdrawals: 0.0,
        };

        let transaction = create_transaction(fields, &conn).expect("Could not create transaction");

        assert_eq!(transaction.date, json!(null));
        assert_eq!(transaction.category, json!(null));
    }

    #[test]
    fn create_assigns_unique_ids() {
        let conn = get_test_connection();

        let ids: HashSet<_> = (0..50)
            .map(|_| {
                create_transaction(Transaction::build("2025-10-05", None), &conn)
                    .expect("Could not create transaction")
                    .id
            })
            .collect();

        assert_eq!(ids.len(), 50);
    }

    #[test]
    fn create_stores_non_finite_amounts_as_zero() {
        let conn = get_test_connection();

        let transaction = create_transaction(
            Transaction::build("2025-10-05", None)
                .deposits(f64::NAN)
                .withdrawals(f64::INFINITY),
            &conn,
        )
        .expect("Could not create transaction");

        assert_eq!(transaction.deposits, 0.0);
        assert_eq!(transaction.withdrawals, 0.0);
    }

    #[test]
    fn get_returns_created_transaction() {
        let conn = get_test_connection();
        let want = create_transaction(
            Transaction::build("2025-10-05", Some("rent")).withdrawals(100.0),
            &conn,
        )
        .expect("Could not create transaction");

        let got = get_transaction(&want.id, &conn);

        assert_eq!(got, Ok(want));
    }

    #[test]
    fn get_fails_on_unknown_id() {
        let conn = get_test_connection();

        let result = get_transaction("not-a-real-id", &conn);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn get_all_returns_transactions_in_insertion_order() {
        let conn = get_test_connection();
        let want: Vec<_> = ["c", "a", "b"]
            .into_iter()
            .map(|category| {
                create_transaction(Transaction::build("2025-10-05", Some(category)), &conn)
                    .expect("Could not create transaction")
            })
            .collect();

        let got = get_all_transactions(&conn).expect("Could not get transactions");

        assert_eq!(want, got);
    }

    #[test]
    fn get_all_on_empty_database() {
        let conn = get_test_connection();

        let got = get_all_transactions(&conn).expect("Could not get transactions");

        assert!(got.is_empty());
    }

    #[test]
    fn get_count() {
        let conn = get_test_connection();
        let want_count = 20;
        for i in 1..=want_count {
            create_transaction(
                Transaction::build("2025-10-05", None).deposits(i as f64),
                &conn,
            )
            .expect("Could not create transaction");
        }

        let got_count = count_transactions(&conn).expect("Could not get count");

        assert_eq!(want_count, got_count);
    }
}
