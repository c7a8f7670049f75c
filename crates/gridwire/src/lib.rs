//! # Gridwire
//!
//! The envelope protocol spoken between a solver client and a solver engine.
//!
//! ## Architecture
//!
//! Typed envelopes (`Request`, `Response`) are mapped onto `gridpack` containers.
//! Both directions are provided: a client encodes requests and decodes responses,
//! an engine decodes requests and encodes responses.
//!
//! Decoding is strict about shape: an unknown variant, a missing field, a
//! truncated buffer or trailing garbage is an error, never a guess.

mod error;
mod frame;
mod types;


pub use error::Error;
pub use error::Fault;
pub use error::Result;
pub use frame::PROTOCOL_VERSION;
pub use frame::decode_request;
pub use frame::decode_response;
pub use frame::encode_request;
pub use frame::encode_response;
pub use types::ErrorCode;
pub use types::Payload;
pub use types::PayloadKind;
pub use types::Request;
pub use types::RequestBody;
pub use types::RequestId;
pub use types::RequestKind;
pub use types::Response;
pub use types::ResponseBody;
