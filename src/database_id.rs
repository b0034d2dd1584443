//! Database ID type definition.

/// The ID of a transaction: a random UUID (v4) in its hyphenated string form.
///
/// IDs are generated by the database layer and are treated as opaque strings
/// everywhere else, so an ID that is not a valid UUID simply matches nothing.
pub type TransactionId = String;
