//! Repository error types
//!
//! Structured errors for catalog store operations, so the top-level handler
//! can tell a timeout (504) apart from any other infrastructure failure (500).

use std::fmt;

/// Operation being performed when the repository error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryOperation {
    /// Opening the connection pool
    Connect,
    /// Counting records that match a filter
    Count,
    /// Fetching one ordered page of records
    FetchPage,
    /// Finding a single record by id
    FindById,
    /// Saving an updated record
    Update,
    /// Removing a record
    Delete,
    /// Applying schema migrations
    Migrate,
}

impl fmt::Display for RepositoryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect => write!(f, "connect"),
            Self::Count => write!(f, "count"),
            Self::FetchPage => write!(f, "fetch_page"),
            Self::FindById => write!(f, "find_by_id"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
            Self::Migrate => write!(f, "migrate"),
        }
    }
}

/// Category of repository error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryErrorKind {
    /// Failed to connect to the store
    ConnectionFailed,
    /// Operation timed out
    Timeout,
    /// Query was rejected by the store
    QueryFailed,
    /// Row could not be decoded into a record
    Decode,
    /// Other unclassified error
    Other,
}

impl fmt::Display for RepositoryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionFailed => write!(f, "connection_failed"),
            Self::Timeout => write!(f, "timeout"),
            Self::QueryFailed => write!(f, "query_failed"),
            Self::Decode => write!(f, "decode"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Structured repository error with operation context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryError {
    /// The operation being performed when the error occurred
    pub operation: RepositoryOperation,
    /// The category of error
    pub kind: RepositoryErrorKind,
    /// Human-readable error message (never sent to clients)
    pub message: String,
    /// Table the operation targeted
    pub table: Option<&'static str>,
}

impl RepositoryError {
    /// Create a new repository error
    pub fn new(
        operation: RepositoryOperation,
        kind: RepositoryErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            table: None,
        }
    }

    /// Attach the table name
    #[must_use]
    pub fn on_table(mut self, table: &'static str) -> Self {
        self.table = Some(table);
        self
    }
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Repository {} error during {}: {}",
            self.kind, self.operation, self.message
        )?;
        if let Some(table) = self.table {
            write!(f, " [table: {}]", table)?;
        }
        Ok(())
    }
}

impl std::error::Error for RepositoryError {}

#[cfg(feature = "database")]
impl RepositoryError {
    /// Classify a sqlx error raised while performing `operation`
    pub fn from_sqlx(operation: RepositoryOperation, err: sqlx::Error) -> Self {
        use sqlx::Error as E;
        let kind = match &err {
            E::PoolTimedOut => RepositoryErrorKind::Timeout,
            E::PoolClosed | E::Io(_) | E::Tls(_) | E::WorkerCrashed => {
                RepositoryErrorKind::ConnectionFailed
            }
            E::ColumnDecode { .. } | E::Decode(_) | E::ColumnNotFound(_) => {
                RepositoryErrorKind::Decode
            }
            // 57014 = query_canceled, raised by statement_timeout
            E::Database(db_err) if db_err.code().as_deref() == Some("57014") => {
                RepositoryErrorKind::Timeout
            }
            E::Database(_) | E::Protocol(_) => RepositoryErrorKind::QueryFailed,
            _ => RepositoryErrorKind::Other,
        };
        Self::new(operation, kind, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_formatting() {
        let err = RepositoryError::new(
            RepositoryOperation::FetchPage,
            RepositoryErrorKind::QueryFailed,
            "syntax error",
        )
        .on_table("BoardGames");
        assert_eq!(
            err.to_string(),
            "Repository query_failed error during fetch_page: syntax error [table: BoardGames]"
        );
    }

    #[cfg(feature = "database")]
    #[test]
    fn test_pool_timeout_is_classified_as_timeout() {
        let err = RepositoryError::from_sqlx(RepositoryOperation::Count, sqlx::Error::PoolTimedOut);
        assert_eq!(err.kind, RepositoryErrorKind::Timeout);

        let err = RepositoryError::from_sqlx(RepositoryOperation::Count, sqlx::Error::PoolClosed);
        assert_eq!(err.kind, RepositoryErrorKind::ConnectionFailed);
    }
}
