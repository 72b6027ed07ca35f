/*!
Error types for the record codec.

[`Error`] classifies every failure into one of a few caller-recoverable
categories, each with a stable negative status code for the C ABI.
[`Diagnostic`] carries an error together with its rendered message in a
fixed-size buffer, so diagnostics never allocate.
*/

use super::*;
use core::fmt::{self, Write};
use thiserror::Error;

/// The destination buffer is smaller than `mcbor_len`
pub const MCBOR_ERR_CAPACITY: i32 = -1;
/// The input ended before the record did
pub const MCBOR_ERR_TRUNCATED: i32 = -2;
/// The input is not an encoding of the expected record
pub const MCBOR_ERR_SCHEMA: i32 = -3;
/// Bytes remain after the record
pub const MCBOR_ERR_TRAILING: i32 = -4;
/// Unknown key, null pointer, or unencodable value
pub const MCBOR_ERR_ARGUMENT: i32 = -5;

/// The reason a well-formed item does not match the schema.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mismatch {
    #[error("expected key {expected}, found {found}")]
    Key { expected: u32, found: u64 },

    #[error("expected an array of {expected} items, found {found}")]
    FieldCount { expected: usize, found: usize },

    #[error("expected {expected}, found {found}")]
    Type {
        expected: &'static str,
        found: &'static str,
    },

    #[error("expected {expected} bytes, found {found}")]
    Width { expected: usize, found: usize },

    #[error("expected at most {max} bytes, found {found}")]
    TooLong { max: usize, found: usize },

    #[error("value {found} exceeds maximum {max}")]
    Range { max: u64, found: u64 },

    #[error("value {found} outside {min}..={max}")]
    IntRange { min: i64, max: i64, found: i128 },

    #[error("tagged items are not permitted")]
    Tagged,

    #[error("indefinite-length items are not permitted")]
    Indefinite,

    #[error("text is not valid UTF-8")]
    Utf8,

    #[error(transparent)]
    Malformed(cbor::decode::Error),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("Buffer too small: need {needed} bytes, have {available}")]
    Capacity { needed: usize, available: usize },

    #[error("Input truncated while reading {field}")]
    Truncated { field: &'static str },

    #[error("Schema mismatch in {field}: {reason}")]
    SchemaMismatch {
        field: &'static str,
        reason: Mismatch,
    },

    #[error("{0} bytes of trailing data after record")]
    TrailingData(usize),

    #[error("Invalid record key {0}")]
    InvalidKey(u64),

    #[error("Null {0} pointer")]
    NullPointer(&'static str),

    #[error("Record is not encodable: {0}")]
    Unencodable(cbor::encode::Error),
}

impl Error {
    /// The C ABI status code for this error, always negative
    pub const fn code(&self) -> i32 {
        match self {
            Error::Capacity { .. } => MCBOR_ERR_CAPACITY,
            Error::Truncated { .. } => MCBOR_ERR_TRUNCATED,
            Error::SchemaMismatch { .. } => MCBOR_ERR_SCHEMA,
            Error::TrailingData(_) => MCBOR_ERR_TRAILING,
            Error::InvalidKey(_) | Error::NullPointer(_) | Error::Unencodable(_) => {
                MCBOR_ERR_ARGUMENT
            }
        }
    }

    pub(crate) fn mismatch(field: &'static str, reason: Mismatch) -> Self {
        Error::SchemaMismatch { field, reason }
    }
}

impl From<cbor::encode::Error> for Error {
    fn from(e: cbor::encode::Error) -> Self {
        match e {
            cbor::encode::Error::BufferTooSmall { needed, available } => {
                Error::Capacity { needed, available }
            }
            e => Error::Unencodable(e),
        }
    }
}

fn field_error(field: &'static str, e: cbor::decode::Error) -> Error {
    match e {
        cbor::decode::Error::NotEnoughData => Error::Truncated { field },
        cbor::decode::Error::InvalidUtf8(_) => Error::mismatch(field, Mismatch::Utf8),
        e => Error::mismatch(field, Mismatch::Malformed(e)),
    }
}

// Failures outside any field are attributed to the record header
impl From<cbor::decode::Error> for Error {
    fn from(e: cbor::decode::Error) -> Self {
        field_error("header", e)
    }
}

/// Attributes a low-level decode failure to the field being read.
pub trait CaptureFieldErr<T> {
    fn map_field_err(self, field: &'static str) -> Result<T, Error>;
}

impl<T> CaptureFieldErr<T> for Result<T, cbor::decode::Error> {
    fn map_field_err(self, field: &'static str) -> Result<T, Error> {
        self.map_err(|e| field_error(field, e))
    }
}

/// Size of the message buffer held by a [`Diagnostic`]
pub const DIAGNOSTIC_CAPACITY: usize = 128;

/// Longest prefix of `s` that fits `max` bytes without splitting a character
pub(crate) fn clip(s: &str, max: usize) -> &str {
    let mut end = max.min(s.len());
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

struct BoundedWriter<'a> {
    buf: &'a mut [u8],
    len: usize,
}

impl Write for BoundedWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let s = clip(s, self.buf.len() - self.len);
        self.buf[self.len..self.len + s.len()].copy_from_slice(s.as_bytes());
        self.len += s.len();
        // Keep formatting, the remainder is dropped
        Ok(())
    }
}

/// A decode error with its message rendered into a bounded buffer.
#[derive(Clone)]
pub struct Diagnostic {
    error: Error,
    buf: [u8; DIAGNOSTIC_CAPACITY],
    len: usize,
}

impl Diagnostic {
    pub fn new(error: Error) -> Self {
        let mut buf = [0u8; DIAGNOSTIC_CAPACITY];
        let mut w = BoundedWriter {
            buf: &mut buf,
            len: 0,
        };
        _ = write!(w, "{error}");
        let len = w.len;
        Self { error, buf, len }
    }

    pub fn error(&self) -> Error {
        self.error
    }

    pub fn code(&self) -> i32 {
        self.error.code()
    }

    pub fn as_str(&self) -> &str {
        // BoundedWriter only ever stores whole characters
        core::str::from_utf8(&self.buf[..self.len]).unwrap_or_default()
    }

    /// Copy the message into `out`, truncated at a character boundary.
    /// Returns the number of bytes written.
    pub fn copy_to(&self, out: &mut [u8]) -> usize {
        let msg = clip(self.as_str(), out.len());
        out[..msg.len()].copy_from_slice(msg.as_bytes());
        msg.len()
    }
}

impl From<Error> for Diagnostic {
    fn from(error: Error) -> Self {
        Self::new(error)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostic")
            .field("error", &self.error)
            .field("message", &self.as_str())
            .finish()
    }
}

// The message already renders the error, so there is no separate source
impl core::error::Error for Diagnostic {}
