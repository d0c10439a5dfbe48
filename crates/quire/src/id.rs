use crate::{Error, Result};
use core::{fmt, str::FromStr};

/// Number of bytes in a store key.
pub const RECORD_ID_LEN: usize = 12;

/// Number of characters in the hex text form of a [`RecordId`].
pub const ENCODED_RECORD_ID_LEN: usize = RECORD_ID_LEN * 2;

/// The store-assigned binary key of a record.
///
/// The layout matches a document-store object id: 12 opaque bytes. Outside
/// the store the key travels as 24 lowercase hex characters, produced by
/// [`RecordId::encode`] and parsed by [`RecordId::decode`].
///
/// ```
/// use quire::RecordId;
///
/// let id = RecordId::decode("65f1c2a9e4b0a1b2c3d4e5f6").unwrap();
/// assert_eq!(id.encode(), "65f1c2a9e4b0a1b2c3d4e5f6");
/// assert!(RecordId::decode("not-a-valid-id").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId([u8; RECORD_ID_LEN]);

impl RecordId {
    /// Wraps raw key bytes as handed out by the store.
    pub const fn from_bytes(bytes: [u8; RECORD_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Returns the raw key bytes.
    pub const fn to_bytes(self) -> [u8; RECORD_ID_LEN] {
        self.0
    }

    /// Renders the key as lowercase hex. Total: every key has exactly one text
    /// form.
    pub fn encode(&self) -> String {
        hex::encode(self.0)
    }

    /// Parses the text form of a key.
    ///
    /// Only the canonical form is accepted (exactly
    /// [`ENCODED_RECORD_ID_LEN`] lowercase hex digits), so that
    /// `decode(s)?.encode() == s` holds for every accepted `s`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedIdentifier`] if the input has the wrong
    /// length, contains an uppercase digit, or contains a non-hex character.
    pub fn decode(s: &str) -> Result<Self> {
        if s.len() != ENCODED_RECORD_ID_LEN {
            return Err(Error::malformed(
                s,
                format!(
                    "expected {ENCODED_RECORD_ID_LEN} hex characters, found {}",
                    s.len()
                ),
            ));
        }
        if let Some(index) = s.bytes().position(|b| b.is_ascii_uppercase()) {
            return Err(Error::malformed(
                s,
                format!("uppercase character at index {index}"),
            ));
        }

        let mut bytes = [0_u8; RECORD_ID_LEN];
        hex::decode_to_slice(s, &mut bytes).map_err(|e| Error::malformed(s, e.to_string()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", self.encode())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for RecordId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::decode(s)
    }
}
