//! Defines the app level error type and its conversion to JSON error responses.
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// Tried to update a transaction that does not exist
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// Tried to delete a transaction that does not exist
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// The request body could not be read as the JSON the endpoint expects.
    #[error("could not read the request body: {0}")]
    InvalidRequestBody(String),
}

impl From<JsonRejection> for Error {
    fn from(value: JsonRejection) -> Self {
        Error::InvalidRequestBody(value.body_text())
    }
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

/// The JSON body sent to the client when a request fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// A short, human-readable description of what went wrong.
    pub error: String,
}

/// The message shown to the client when a transaction ID does not resolve.
pub const TRANSACTION_NOT_FOUND: &str = "Transaction not found";

impl Error {
    /// Convert the error into a JSON error response.
    ///
    /// Missing records map to 404. Everything else is a 500 that carries
    /// `failure_message` instead of the error details, which are only logged.
    pub fn into_json_response(self, failure_message: &str) -> Response {
        match self {
            Error::NotFound | Error::UpdateMissingTransaction | Error::DeleteMissingTransaction => {
                json_error(StatusCode::NOT_FOUND, TRANSACTION_NOT_FOUND)
            }
            error => {
                tracing::error!("{failure_message}: {error}");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, failure_message)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        self.into_json_response("Something went wrong")
    }
}

fn json_error(status_code: StatusCode, message: &str) -> Response {
    (
        status_code,
        Json(ErrorResponse {
            error: message.to_owned(),
        }),
    )
        .into_response()
}
