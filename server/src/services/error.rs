//! Error type shared by the CRUD services.

/// `SQLSTATE` for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";
/// `SQLSTATE` for `foreign_key_violation`.
const FOREIGN_KEY_VIOLATION: &str = "23503";
/// `SQLSTATE` for `undefined_table`.
const UNDEFINED_TABLE: &str = "42P01";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("conflict: {0}")]
    Conflict(String),
    /// The backing table has not been created. Carries the database message
    /// (`relation "..." does not exist`) so clients can show a setup notice.
    #[error("{0}")]
    SchemaMissing(String),
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl StoreError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid { field, reason: reason.into() }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if matches!(err, sqlx::Error::RowNotFound) {
            return Self::NotFound;
        }
        let Some((code, message)) = err
            .as_database_error()
            .and_then(|db| Some((db.code()?.into_owned(), db.message().to_owned())))
        else {
            return Self::Database(err);
        };
        match code.as_str() {
            UNIQUE_VIOLATION => Self::Conflict(message),
            FOREIGN_KEY_VIOLATION => Self::Invalid { field: "reference", reason: message },
            UNDEFINED_TABLE => Self::SchemaMissing(message),
            _ => Self::Database(err),
        }
    }
}

/// Trim a required text field, rejecting blanks.
pub(crate) fn required(field: &'static str, value: &str) -> Result<String, StoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StoreError::invalid(field, "must not be empty"));
    }
    Ok(trimmed.to_owned())
}

/// Trim an optional text field, folding blanks to `None`.
pub(crate) fn optional(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_owned)
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
