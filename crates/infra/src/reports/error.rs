use thiserror::Error;

use aggreports_core::{CodecError, ValidationError};

use crate::store::StoreError;

/// Failure of a reporting operation.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The query ran but matched nothing.
    #[error("{operation}: no matching records")]
    NoResults { operation: &'static str },

    #[error("{operation}: {source}")]
    Store {
        operation: &'static str,
        #[source]
        source: StoreError,
    },
}

impl ReportError {
    pub(crate) fn store(operation: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| ReportError::Store { operation, source }
    }

    pub fn is_no_results(&self) -> bool {
        matches!(self, ReportError::NoResults { .. })
    }

    /// Operation name for `NoResults` and `Store` failures.
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            ReportError::NoResults { operation } | ReportError::Store { operation, .. } => {
                Some(*operation)
            }
            ReportError::Validation(_) | ReportError::Codec(_) => None,
        }
    }
}
