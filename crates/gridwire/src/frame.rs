//! # Envelope Frames
//!
//! Maps `Request` and `Response` onto gridpack containers.
//!
//! ```text
//! Req  := Variant("Req",  Map { v: u32, id: u32, body: Variant(kind, Map {..}) })
//! Resp := Variant("Resp", Map { v: u32, id: u32, body: Ok(Variant(kind, ..)) | Err(Map { code: s32 }) })
//! ```
//!
//! ## Invariants
//! - **Exact Framing**: Every container must be consumed exactly; trailing bytes fail.
//! - **Loud Discriminants**: Unknown envelope, request or payload names fail decoding.
//! - **Field Tolerance**: Unknown map keys are ignored; missing or repeated known keys fail.

use gridpack::Decoder;
use gridpack::Encoder;

use crate::error::Error;
use crate::error::Fault;
use crate::error::Result;
use crate::types::ErrorCode;
use crate::types::Payload;
use crate::types::Request;
use crate::types::RequestBody;
use crate::types::RequestId;
use crate::types::Response;
use crate::types::ResponseBody;

/// Version of the nested `Ok(payload) | Err(code)` response shape.
///
/// Version 1 was the flat payload set without an error arm; it is not accepted.
pub const PROTOCOL_VERSION: u32 = 2;

type FaultResult<T> = std::result::Result<T, Fault>;

/// Encodes a request envelope.
///
/// Fails with `MalformedRequest` for text the engine cannot receive.
pub fn encode_request(req: &Request) -> Result<Vec<u8>> {
    write_request(req).map_err(Error::MalformedRequest)
}

/// Decodes a request envelope (engine side).
pub fn decode_request(bytes: &[u8]) -> Result<Request> {
    read_request(bytes).map_err(Error::MalformedRequest)
}

/// Encodes a response envelope (engine side).
pub fn encode_response(resp: &Response) -> Result<Vec<u8>> {
    write_response(resp).map_err(Error::MalformedResponse)
}

/// Decodes a response envelope.
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    read_response(bytes).map_err(Error::MalformedResponse)
}

// Writing

fn write_request(req: &Request) -> FaultResult<Vec<u8>> {
    let mut enc = Encoder::new();
    begin_envelope(&mut enc, "Req", req.id)?;

    match &req.body {
        RequestBody::CreateSolver { grid } => {
            if let Some(at) = grid.find('\0') {
                return Err(Fault::NulInGrid(at));
            }
            enc.variant_begin("CreateSolver")?;
            enc.map_begin()?;
            enc.entry_str("grid", grid)?;
            enc.map_end()?;
        }
        RequestBody::Solve { id } => {
            enc.variant_begin("Solve")?;
            write_solver_id(&mut enc, *id)?;
        }
        RequestBody::Destroy { id } => {
            enc.variant_begin("Destroy")?;
            write_solver_id(&mut enc, *id)?;
        }
    }
    enc.variant_end()?; // kind

    end_envelope(enc)
}

fn write_response(resp: &Response) -> FaultResult<Vec<u8>> {
    let mut enc = Encoder::new();
    begin_envelope(&mut enc, "Resp", resp.id)?;

    match &resp.body {
        ResponseBody::Ok(payload) => {
            enc.ok_begin()?;
            match payload {
                Payload::SolverCreated { id } => {
                    enc.variant_begin("SolverCreated")?;
                    write_solver_id(&mut enc, *id)?;
                }
                Payload::SolveResult { solution } => {
                    enc.variant_begin("SolveResult")?;
                    enc.map_begin()?;
                    enc.entry_str("solution", solution)?;
                    enc.map_end()?;
                }
                Payload::SolverDestroyed => {
                    enc.variant_begin("SolverDestroyed")?;
                    enc.unit()?;
                }
            }
            enc.variant_end()?;
            enc.ok_end()?;
        }
        ResponseBody::Err(code) => {
            enc.err_begin()?;
            enc.map_begin()?;
            enc.entry_s32("code", code.0)?;
            enc.map_end()?;
            enc.err_end()?;
        }
    }

    end_envelope(enc)
}

fn begin_envelope(enc: &mut Encoder, name: &str, id: RequestId) -> FaultResult<()> {
    enc.variant_begin(name)?;
    enc.map_begin()?;
    enc.entry_u32("v", PROTOCOL_VERSION)?;
    enc.entry_u32("id", id.0)?;
    enc.variant_begin("body")?;
    Ok(())
}

fn end_envelope(mut enc: Encoder) -> FaultResult<Vec<u8>> {
    enc.variant_end()?; // body
    enc.map_end()?;
    enc.variant_end()?; // envelope
    Ok(enc.into_bytes()?)
}

fn write_solver_id(enc: &mut Encoder, id: i32) -> FaultResult<()> {
    enc.map_begin()?;
    enc.entry_s32("id", id)?;
    enc.map_end()?;
    Ok(())
}

// Reading

fn read_request(bytes: &[u8]) -> FaultResult<Request> {
    let (id, mut body) = open_envelope(bytes, "Req")?;
    let (kind, payload) = body.variant()?;
    body.finish()?;

    let body = match kind {
        "CreateSolver" => {
            let grid = scalar(field(payload, "grid")?, |d| d.str())?;
            RequestBody::CreateSolver { grid: grid.to_string() }
        }
        "Solve" => RequestBody::Solve { id: read_solver_id(payload)? },
        "Destroy" => RequestBody::Destroy { id: read_solver_id(payload)? },
        other => return Err(unknown("request", other)),
    };

    Ok(Request { id, body })
}

fn read_response(bytes: &[u8]) -> FaultResult<Response> {
    let (id, mut body) = open_envelope(bytes, "Resp")?;
    let outcome = body.outcome()?;
    body.finish()?;

    let body = match outcome {
        Ok(mut ok) => {
            let (kind, payload) = ok.variant()?;
            ok.finish()?;
            let payload = match kind {
                "SolverCreated" => Payload::SolverCreated { id: read_solver_id(payload)? },
                "SolveResult" => {
                    let solution = scalar(field(payload, "solution")?, |d| d.str())?;
                    Payload::SolveResult { solution: solution.to_string() }
                }
                "SolverDestroyed" => {
                    scalar(payload, |d| d.unit())?;
                    Payload::SolverDestroyed
                }
                other => return Err(unknown("payload", other)),
            };
            ResponseBody::Ok(payload)
        }
        Err(err) => {
            let code = scalar(field(err, "code")?, |d| d.s32())?;
            ResponseBody::Err(ErrorCode(code))
        }
    };

    Ok(Response { id, body })
}

/// Checks the envelope name and header, returning the id and a view of `body`.
fn open_envelope<'a>(bytes: &'a [u8], expected: &'static str) -> FaultResult<(RequestId, Decoder<'a>)> {
    let mut dec = Decoder::new(bytes);
    let (name, mut inner) = dec.variant()?;
    dec.finish()?;
    if name != expected {
        return Err(unknown("envelope", name));
    }

    let mut map = inner.map()?;
    inner.finish()?;

    let mut version = None;
    let mut id = None;
    let mut body = None;

    while let Some((key, mut val)) = map.next()? {
        match key {
            "v" => set_once(&mut version, "v", scalar(val, |d| d.u32())?)?,
            "id" => set_once(&mut id, "id", RequestId(scalar(val, |d| d.u32())?))?,
            "body" => set_once(&mut body, "body", val)?,
            _ => val.skip()?,
        }
    }

    let version = version.ok_or(Fault::MissingField("v"))?;
    if version != PROTOCOL_VERSION {
        return Err(Fault::Version(version));
    }

    Ok((
        id.ok_or(Fault::MissingField("id"))?,
        body.ok_or(Fault::MissingField("body"))?,
    ))
}

/// Enters a map and returns the value stored under `key`.
fn field<'a>(mut dec: Decoder<'a>, key: &'static str) -> FaultResult<Decoder<'a>> {
    let mut map = dec.map()?;
    dec.finish()?;

    let mut found = None;
    while let Some((k, val)) = map.next()? {
        if k == key {
            set_once(&mut found, key, val)?;
        }
    }
    found.ok_or(Fault::MissingField(key))
}

/// Reads one item that must fill the whole value.
fn scalar<'a, T>(
    mut dec: Decoder<'a>,
    read: impl FnOnce(&mut Decoder<'a>) -> gridpack::Result<T>,
) -> FaultResult<T> {
    let value = read(&mut dec)?;
    dec.finish()?;
    Ok(value)
}

fn set_once<T>(slot: &mut Option<T>, key: &'static str, value: T) -> FaultResult<()> {
    if slot.replace(value).is_some() {
        return Err(Fault::DuplicateField(key));
    }
    Ok(())
}

fn read_solver_id(dec: Decoder<'_>) -> FaultResult<i32> {
    scalar(field(dec, "id")?, |d| d.s32())
}

fn unknown(context: &'static str, name: &str) -> Fault {
    Fault::UnknownVariant { context, name: name.to_string() }
}
