//! # Error Definitions

/// Why an envelope could not be encoded or decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Fault {
    /// The underlying gridpack structure was invalid or truncated.
    #[error(transparent)]
    Pack(#[from] gridpack::Error),
    /// A variant name outside the protocol was found.
    #[error("unknown {context} variant '{name}'")]
    UnknownVariant { context: &'static str, name: String },
    /// A required map key was absent.
    #[error("missing field '{0}'")]
    MissingField(&'static str),
    /// A known map key appeared more than once.
    #[error("duplicate field '{0}'")]
    DuplicateField(&'static str),
    /// The envelope declares a protocol version this build does not speak.
    #[error("unsupported protocol version {0}")]
    Version(u32),
    /// Grid text contains a NUL character, which the engine cannot receive.
    #[error("grid contains a NUL character at byte {0}")]
    NulInGrid(usize),
}

/// Envelope codec failures, split by direction of travel.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A request could not be encoded, or an inbound request could not be decoded.
    #[error("malformed request: {0}")]
    MalformedRequest(Fault),
    /// A response could not be decoded, or an outbound response could not be encoded.
    #[error("malformed response: {0}")]
    MalformedResponse(Fault),
}

pub type Result<T> = std::result::Result<T, Error>;
