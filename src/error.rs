use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// Decode ran out of bytes for a header field, chunk, or delta.
    #[error("Buffer truncated")]
    TruncatedBuffer,
    /// Packet status chunk could not be read.
    #[error("Packet status chunk must be 2 bytes")]
    MalformedChunk,
    /// Receive delta outside the representable tick range.
    #[error("Delta exceed limit")]
    DeltaOutOfRange,
    /// Run length does not fit into the 13-bit chunk field.
    #[error("Run length exceed limit")]
    RunLengthOverflow,
    /// Packet map covers more positions than the status count field can hold.
    #[error("Too many packet statuses")]
    TooManyPacketStatuses,
    /// Declared sequence number range crosses 65535.
    #[error("Sequence number range wraps")]
    SequenceNumberWrap,
    /// Buffer is too short.
    #[error("Buffer too short to be written")]
    BufferTooShort,

    #[error("{0}")]
    Util(#[from] util::Error),

    #[error("{0}")]
    Other(String),
}

impl From<Error> for util::Error {
    fn from(e: Error) -> Self {
        util::Error::from_std(e)
    }
}

impl PartialEq<util::Error> for Error {
    fn eq(&self, other: &util::Error) -> bool {
        if let Some(down) = other.downcast_ref::<Error>() {
            return self == down;
        }
        false
    }
}
