#![allow(dead_code)]

use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, PartialEq)]
#[non_exhaustive]
pub enum Error {
    //Session errors
    /// Arena refused to provide memory.
    #[error("arena: out of memory")]
    ErrOutOfMemory,
    /// Configured packet buffer can't hold even a minimal packet.
    #[error("buffer: insufficient space for packet")]
    ErrInsufficientBufferSpace,
    /// Inbound datagram failed structural validation.
    #[error("malformed rtcp packet")]
    ErrMalformedPacket,
    /// Collaborator has nothing to provide or accept.
    #[error("no data")]
    ErrNoData,
    #[error("buffer: full")]
    ErrBufferFull,

    //RTCP errors
    /// Packet lost exceeds maximum amount of packets
    /// that can possibly be lost.
    #[error("Invalid total lost count")]
    InvalidTotalLost,
    /// Packet contains an invalid header.
    #[error("Invalid header")]
    InvalidHeader,
    /// Packet contains empty compound.
    #[error("Empty compound packet")]
    EmptyCompound,
    /// Too many reports.
    #[error("Too many reports")]
    TooManyReports,
    /// Too many chunks.
    #[error("Too many chunks")]
    TooManyChunks,
    /// Too many sources.
    #[error("too many sources")]
    TooManySources,
    /// Packet received is too short.
    #[error("Packet too short to be read")]
    PacketTooShort,
    /// Buffer is too short.
    #[error("Buffer too short to be written")]
    BufferTooShort,
    /// Wrong packet type.
    #[error("Wrong packet type")]
    WrongType,
    /// SDES received is too long.
    #[error("SDES must be < 255 octets long")]
    SdesTextTooLong,
    /// SDES type is missing.
    #[error("SDES item missing type")]
    SdesMissingType,
    /// Reason is too long.
    #[error("Reason must be < 255 octets long")]
    ReasonTooLong,
    /// Invalid packet version.
    #[error("Invalid packet version")]
    BadVersion,
    /// Invalid padding value.
    #[error("Invalid padding value")]
    WrongPadding,
    /// Declared packet length exceeds the datagram.
    #[error("Packet length exceeds datagram size")]
    PacketLengthOverflow,
    /// Extended report block is shorter than its type requires.
    #[error("XR block too short for its type")]
    XrBlockTooShort,
    /// Extended report block length exceeds the enclosing packet.
    #[error("XR block length exceeds packet")]
    XrBlockLengthOverflow,
    /// DLRR block length isn't a multiple of the sub-block size.
    #[error("DLRR block length is not a multiple of 3 words")]
    DlrrBlockLength,

    //Third Party Error
    #[error("{0}")]
    Io(#[source] IoError),
    #[error("{0}")]
    Std(#[source] StdError),

    //Other Errors
    #[error("Other Session Err: {0}")]
    OtherSessionErr(String),
    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn from_std<T>(error: T) -> Self
    where
        T: std::error::Error + Send + Sync + 'static,
    {
        Error::Std(StdError(Box::new(error)))
    }

    pub fn downcast_ref<T: std::error::Error + 'static>(&self) -> Option<&T> {
        if let Error::Std(s) = self {
            return s.0.downcast_ref();
        }

        None
    }
}

#[derive(Debug, Error)]
#[error("io error: {0}")]
pub struct IoError(#[from] pub io::Error);

// Workaround for wanting PartialEq for io::Error.
impl PartialEq for IoError {
    fn eq(&self, other: &Self) -> bool {
        self.0.kind() == other.0.kind()
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(IoError(e))
    }
}

/// An escape hatch to preserve stack traces when we don't know the error.
///
/// Collaborators such as packet writers and participants live outside this
/// workspace and produce their own error types. By using `Error::from_std`
/// the underlying error is preserved and can be recovered with
/// `Error::downcast_ref`.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct StdError(pub Box<dyn std::error::Error + Send + Sync>);

impl PartialEq for StdError {
    fn eq(&self, _: &Self) -> bool {
        false
    }
}
