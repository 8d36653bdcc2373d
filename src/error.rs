use crate::{KEY_LEN, OUT_LEN};

/// The error type for every fallible operation in this crate.
///
/// These are all contract violations by the caller. Nothing in the hash engine
/// does I/O, so there is nothing to retry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A keyed hash was constructed from a key that isn't exactly
    /// [`KEY_LEN`](crate::KEY_LEN) bytes long. Carries the length that was
    /// given.
    #[error("keys must be {expected} bytes long, got {0}", expected = KEY_LEN)]
    InvalidKeyLength(usize),

    /// Zero output bytes were requested.
    #[error("the output length must be at least 1 byte")]
    InvalidOutputLength,

    /// Input or a finalize call arrived after the hasher already produced
    /// output. Call [`Hasher::reset`](crate::Hasher::reset) to start over.
    #[error("the hasher has already been finalized")]
    UseAfterFinalize,

    /// A hash string contained something other than hex digits.
    #[error("invalid hex character: {0:?}")]
    InvalidHexCharacter(char),

    /// A hash string had the wrong number of characters. Carries the length
    /// that was given.
    #[error("expected {expected} hex characters, got {0}", expected = 2 * OUT_LEN)]
    InvalidHexLength(usize),
}

#[cfg(feature = "std")]
impl From<Error> for std::io::Error {
    fn from(err: Error) -> Self {
        let kind = match err {
            Error::UseAfterFinalize => std::io::ErrorKind::Other,
            _ => std::io::ErrorKind::InvalidInput,
        };
        std::io::Error::new(kind, err)
    }
}
