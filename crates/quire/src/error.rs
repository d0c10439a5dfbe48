use crate::RecordId;

/// Result alias used throughout `quire`.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All failures the record domain can surface.
///
/// The repository never retries; each variant is handed to the caller as soon
/// as it happens.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The caller supplied an identifier that is not a valid encoding of a
    /// [`RecordId`]. Raised before the store is contacted.
    #[error("malformed identifier {input:?}: {reason}")]
    MalformedIdentifier { input: String, reason: String },

    /// No document matches the key.
    #[error("record {id} not found")]
    NotFound { id: RecordId },

    /// Any failure talking to the store or decoding what it returned.
    #[error("store error: {context}")]
    Store { context: String },
}

impl Error {
    pub(crate) fn malformed(input: &str, reason: impl Into<String>) -> Self {
        Self::MalformedIdentifier {
            input: input.to_owned(),
            reason: reason.into(),
        }
    }

    pub(crate) fn store(context: impl Into<String>) -> Self {
        Self::Store {
            context: context.into(),
        }
    }

    /// Returns `true` for [`Error::NotFound`].
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
