use thiserror::Error;

/// Error taxonomy shared by every operation the worker exposes.
///
/// `Upstream` wraps transport and backend failures without retrying them;
/// the caller decides whether to retry. `TaxonomyMismatch` is an internal
/// invariant violation and always aborts the call.
#[derive(Debug, Error)]
pub enum SignalError {
    #[error("invalid resource: {0}")]
    InvalidResource(String),
    #[error(transparent)]
    Upstream(#[from] anyhow::Error),
    #[error("prediction backend not implemented: {0}")]
    BackendUnimplemented(String),
    #[error("taxonomy mismatch: {0}")]
    TaxonomyMismatch(String),
}
