//! Crate-level error type.
//!
//! Each module has its own error enum; [`Error`] wraps them for callers that
//! drive several components at once (the dashboard binary). [`ErrorKind`]
//! collapses them to the four failure modes a caller actually branches on.

use std::fmt;

use thiserror::Error;

use crate::account::DerivationError;
use crate::amount::AmountError;
use crate::chain::{QueryError, SnapshotError};
use crate::resolver::ResolveError;

/// Any error the dashboard core can surface.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Amount(#[from] AmountError),

    #[error(transparent)]
    Derivation(#[from] DerivationError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// Failure taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Account hashing or encoding is unavailable. Nothing may be derived.
    DerivationUnavailable,
    /// A user-supplied amount cannot be encoded exactly.
    InvalidAmount,
    /// The chain does not expose the storage the operation needs.
    SchemaMismatch,
    /// A query failed in a way a retry could fix.
    TransientQueryFailure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DerivationUnavailable => "derivation_unavailable",
            Self::InvalidAmount => "invalid_amount",
            Self::SchemaMismatch => "schema_mismatch",
            Self::TransientQueryFailure => "transient_query_failure",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    /// Which failure mode this is.
    ///
    /// A bad module tag or address cannot be derived from, so it counts as
    /// [`ErrorKind::DerivationUnavailable`]. An unreadable snapshot is the
    /// offline equivalent of a chain with the wrong schema.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Amount(_) => ErrorKind::InvalidAmount,
            Self::Derivation(_) => ErrorKind::DerivationUnavailable,
            Self::Query(QueryError::Transient { .. }) => ErrorKind::TransientQueryFailure,
            Self::Query(QueryError::SchemaMismatch { .. }) => ErrorKind::SchemaMismatch,
            Self::Resolve(ResolveError::SchemaMismatch { .. }) => ErrorKind::SchemaMismatch,
            Self::Snapshot(_) => ErrorKind::SchemaMismatch,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::parse_amount;

    #[test]
    fn test_kinds() {
        let amount: Error = parse_amount("abc", 12).unwrap_err().into();
        assert_eq!(amount.kind(), ErrorKind::InvalidAmount);

        let derivation: Error = DerivationError::Unavailable("no hash".into()).into();
        assert_eq!(derivation.kind(), ErrorKind::DerivationUnavailable);

        let transient: Error = QueryError::transient("halalLending", "loans", "timeout").into();
        assert_eq!(transient.kind(), ErrorKind::TransientQueryFailure);

        let schema: Error = ResolveError::SchemaMismatch {
            pallet: "halalLending".into(),
            item: "loans".into(),
        }
        .into();
        assert_eq!(schema.kind(), ErrorKind::SchemaMismatch);
    }

    #[test]
    fn test_display_is_transparent() {
        let err: Error = parse_amount("abc", 12).unwrap_err().into();
        assert!(err.to_string().starts_with("invalid amount \"abc\""));
    }
}
