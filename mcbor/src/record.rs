/*!
The generic record engine.

Every [`Record`] is encoded as `[key, field0, field1, ...]`, a definite
array with one item per schema field plus the key. Decoding checks the
framing, the key and each field against the schema before handing the
field to the record, and attributes every failure to the field where it
was detected.
*/

use super::*;
use cbor::decode::{self, Value};
use cbor::encode::{Encoder, ToCbor, Writer};

// Deepest nesting consumed inside a mismatched field
const MAX_NESTING: usize = 16;

/// A fixed-layout record described by a static [`Schema`].
pub trait Record: Default {
    const SCHEMA: Schema;

    /// The value of field `index`, where `index < SCHEMA.fields.len()`
    fn field(&self, index: usize) -> FieldValue<'_>;

    /// Store a decoded value into field `index`.
    ///
    /// `value` has already been checked against the field's [`FieldKind`].
    fn set_field(&mut self, index: usize, value: FieldValue<'_>) -> Result<(), Mismatch>;

    /// Exact number of bytes [`Record::encode`] writes
    fn encoded_len(&self) -> usize {
        cbor::encode::emitted_len(&Encoded(self))
    }

    /// Encode into `buf`, returning the number of bytes written.
    ///
    /// Fails with [`Error::Capacity`] before writing anything if `buf` is
    /// shorter than [`Record::encoded_len`].
    fn encode(&self, buf: &mut [u8]) -> Result<usize, Error> {
        cbor::encode::emit(&Encoded(self), buf).map_err(Into::into)
    }

    /// Decode a record from the start of `data`, returning it and the
    /// number of bytes it occupied.
    fn decode_prefix(data: &[u8]) -> Result<(Self, usize), Error> {
        parse_record(data)
    }

    /// Decode a record that must occupy all of `data`.
    fn decode(data: &[u8]) -> Result<Self, Error> {
        let (record, len) = Self::decode_prefix(data)?;
        if len < data.len() {
            return Err(Error::TrailingData(data.len() - len));
        }
        Ok(record)
    }
}

/// Decode a record, rendering any failure into a bounded [`Diagnostic`].
pub fn decode_diagnosed<R: Record>(data: &[u8]) -> Result<R, Diagnostic> {
    R::decode(data).map_err(Diagnostic::new)
}

struct Encoded<'a, R: ?Sized>(&'a R);

impl<R: Record> ToCbor for Encoded<'_, R> {
    fn to_cbor<W: Writer>(&self, encoder: &mut Encoder<W>) -> Result<(), cbor::encode::Error> {
        let schema = &R::SCHEMA;
        encoder.emit_array(Some(schema.item_count()), |a| {
            a.emit(&schema.key.id())?;
            for index in 0..schema.fields.len() {
                a.emit(&self.0.field(index))?;
            }
            Ok(())
        })
    }
}

/// Check a decoded item against the kind of field it should be.
fn check_kind<'a>(kind: FieldKind, value: Value<'a, '_>) -> Result<FieldValue<'a>, Mismatch> {
    match (kind, value) {
        (FieldKind::Uint(width), Value::UnsignedInteger(v)) => {
            if v > width.max_uint() {
                Err(Mismatch::Range {
                    max: width.max_uint(),
                    found: v,
                })
            } else {
                Ok(FieldValue::Uint(v))
            }
        }
        (FieldKind::Int(width), Value::UnsignedInteger(v)) => i64::try_from(v)
            .ok()
            .filter(|v| *v <= width.max_int())
            .map(FieldValue::Int)
            .ok_or(Mismatch::IntRange {
                min: width.min_int(),
                max: width.max_int(),
                found: v.into(),
            }),
        (FieldKind::Int(width), Value::NegativeInteger(v)) => i64::try_from(v)
            .ok()
            .map(|v| -1 - v)
            .filter(|v| *v >= width.min_int())
            .map(FieldValue::Int)
            .ok_or(Mismatch::IntRange {
                min: width.min_int(),
                max: width.max_int(),
                found: -1 - i128::from(v),
            }),
        (FieldKind::Bool, Value::False) => Ok(FieldValue::Bool(false)),
        (FieldKind::Bool, Value::True) => Ok(FieldValue::Bool(true)),
        (FieldKind::Bytes(n), Value::Bytes(b)) => {
            if b.len() != n {
                Err(Mismatch::Width {
                    expected: n,
                    found: b.len(),
                })
            } else {
                Ok(FieldValue::Bytes(b))
            }
        }
        (FieldKind::Text(n), Value::Text(s)) => {
            if s.len() > n {
                Err(Mismatch::TooLong {
                    max: n,
                    found: s.len(),
                })
            } else {
                Ok(FieldValue::Text(s))
            }
        }
        (FieldKind::Bytes(_), Value::ByteStream(_)) | (FieldKind::Text(_), Value::TextStream(_)) => {
            Err(Mismatch::Indefinite)
        }
        (kind, value) => Err(Mismatch::Type {
            expected: kind.type_name(),
            found: value.type_name(),
        }),
    }
}

fn parse_field<'a>(
    a: &mut decode::Array<'a>,
    field: &'static str,
    kind: FieldKind,
) -> Result<FieldValue<'a>, Error> {
    let (value, _) = a
        .parse_value(|mut value, _, tags| -> Result<_, decode::Error> {
            // Skipping settles an indefinite length, so name it first
            let found = value.type_name();
            // No field holds a container, but its items must still be read
            // so that running out of input inside one is reported as such
            value.skip(MAX_NESTING)?;
            if !tags.is_empty() {
                return Ok(Err(Mismatch::Tagged));
            }
            if let Value::Array(_) | Value::Map(_) = value {
                return Ok(Err(Mismatch::Type {
                    expected: kind.type_name(),
                    found,
                }));
            }
            Ok(check_kind(kind, value))
        })
        .map_field_err(field)?;
    value.map_err(|reason| Error::mismatch(field, reason))
}

fn parse_record<R: Record>(data: &[u8]) -> Result<(R, usize), Error> {
    let schema = &R::SCHEMA;
    let mut record = R::default();
    let parsed = decode::try_parse_value(data, |value, _, tags| {
        if !tags.is_empty() {
            return Err(Error::mismatch(schema.name, Mismatch::Tagged));
        }
        let a = match value {
            Value::Array(a) => a,
            value => {
                return Err(Error::mismatch(
                    schema.name,
                    Mismatch::Type {
                        expected: "Definite-length Array",
                        found: value.type_name(),
                    },
                ));
            }
        };
        match a.len() {
            None => return Err(Error::mismatch(schema.name, Mismatch::Indefinite)),
            Some(found) if found != schema.item_count() => {
                return Err(Error::mismatch(
                    schema.name,
                    Mismatch::FieldCount {
                        expected: schema.item_count(),
                        found,
                    },
                ));
            }
            Some(_) => {}
        }

        match parse_field(a, "key", FieldKind::Uint(Width::W64))? {
            FieldValue::Uint(key) if key == u64::from(schema.key.id()) => {}
            FieldValue::Uint(found) => {
                return Err(Error::mismatch(
                    "key",
                    Mismatch::Key {
                        expected: schema.key.id(),
                        found,
                    },
                ));
            }
            value => {
                return Err(Error::mismatch(
                    "key",
                    Mismatch::Type {
                        expected: "Unsigned Integer",
                        found: value.type_name(),
                    },
                ));
            }
        }

        for (index, field) in schema.fields.iter().enumerate() {
            let value = parse_field(a, field.name, field.kind)?;
            record
                .set_field(index, value)
                .map_err(|reason| Error::mismatch(field.name, reason))?;
        }
        Ok(())
    })?;

    match parsed {
        Some(((), len)) => Ok((record, len)),
        None => Err(Error::Truncated { field: "header" }),
    }
}
