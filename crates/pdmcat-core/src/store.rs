//! Store handles that may have failed to open.
//!
//! A backing store that cannot be reached at startup does not abort the
//! process; every operation routed through its handle reports
//! `StoreUnavailable` instead.

use pdmcat_types::error::{IngestError, StoreKind};

/// An opened store, or the reason it could not be opened.
pub enum StoreHandle<S> {
    Ready(S),
    Unavailable { store: StoreKind, reason: String },
}

impl<S> StoreHandle<S> {
    /// Build a handle from the result of opening a store.
    pub fn from_result<E: std::fmt::Display>(store: StoreKind, result: Result<S, E>) -> Self {
        match result {
            Ok(s) => StoreHandle::Ready(s),
            Err(err) => {
                tracing::error!(%store, error = %err, "store unavailable");
                StoreHandle::Unavailable {
                    store,
                    reason: err.to_string(),
                }
            }
        }
    }

    /// The store, or a `StoreUnavailable` error.
    pub fn get(&self) -> Result<&S, IngestError> {
        match self {
            StoreHandle::Ready(s) => Ok(s),
            StoreHandle::Unavailable { store, reason } => Err(IngestError::StoreUnavailable {
                store: *store,
                reason: reason.clone(),
            }),
        }
    }
}
