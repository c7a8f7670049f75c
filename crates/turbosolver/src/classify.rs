//! Turns a decoded response body into the outcome its caller sees.

use gridwire::Payload;
use gridwire::RequestKind;
use gridwire::ResponseBody;

use crate::error::Error;
use crate::error::Result;

/// Classifies `body` as the answer to a request of kind `expected`.
///
/// An engine error code becomes `Error::Engine`; a payload of any kind other
/// than the one `expected` is answered by becomes `Error::UnexpectedVariant`.
pub fn classify(expected: RequestKind, body: ResponseBody) -> Result<Payload> {
    match body {
        ResponseBody::Err(code) => Err(Error::Engine(code)),
        ResponseBody::Ok(payload) => {
            let found = payload.kind();
            if found == expected.answered_by() {
                Ok(payload)
            } else {
                Err(Error::UnexpectedVariant { expected, found })
            }
        }
    }
}
