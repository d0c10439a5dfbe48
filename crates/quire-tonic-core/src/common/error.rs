//! Error type for the record service.
//!
//! [`Error`] wraps the domain failures of [`quire::Error`] together with the
//! failures that only exist at the RPC boundary, and implements
//! `From<Error> for tonic::Status` so handlers can use `?` directly.
//!
//! ## Status mapping
//! - `Record(MalformedIdentifier)` -> `INTERNAL`
//! - `Record(NotFound)` -> `NOT_FOUND`
//! - `Record(Store)` -> `INTERNAL`
//! - `ChannelError` -> `INTERNAL`
//! - `RequestCancelled` -> `CANCELLED`
//! - `InvalidRequest` -> `INVALID_ARGUMENT`

use tonic::Status;

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the record service.
#[derive(Clone, thiserror::Error, Debug)]
pub enum Error {
    /// A repository operation failed.
    #[error(transparent)]
    Record(#[from] quire::Error),

    /// Internal channel send/receive failure (e.g. the response stream was
    /// closed).
    #[error("Channel error: {context}")]
    ChannelError { context: String },

    /// The client went away before the call finished.
    #[error("Request cancelled by client")]
    RequestCancelled,

    /// The request is structurally incomplete.
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },
}

impl From<Error> for Status {
    fn from(err: Error) -> Self {
        match err {
            Error::Record(quire::Error::MalformedIdentifier { input, .. }) => {
                Status::internal(format!("failed to parse record id {input:?}"))
            }
            Error::Record(quire::Error::NotFound { id }) => {
                Status::not_found(format!("record {id} not found"))
            }
            Error::Record(e @ quire::Error::Store { .. }) => {
                Status::internal(format!("internal error: {e}"))
            }
            Error::ChannelError { context } => {
                Status::internal(format!("Channel error: {context}"))
            }
            Error::RequestCancelled => Status::cancelled("Request was cancelled"),
            Error::InvalidRequest { reason } => Status::invalid_argument(reason),
        }
    }
}
