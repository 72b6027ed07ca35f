/*!
Static descriptions of record layouts.

A [`Schema`] lists the fields of one record type in wire order. The record
engine consumes schemas generically, so adding a record type means writing
a schema and a [`Record`](super::Record) impl, never a new codec.
*/

use super::*;
use cbor::encode::{Encoder, ToCbor, Writer};

/// Width of an integer field, in bytes on the C side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    W8,
    W16,
    W32,
    W64,
}

impl Width {
    pub const fn bytes(self) -> usize {
        match self {
            Width::W8 => 1,
            Width::W16 => 2,
            Width::W32 => 4,
            Width::W64 => 8,
        }
    }

    pub const fn max_uint(self) -> u64 {
        match self {
            Width::W8 => u8::MAX as u64,
            Width::W16 => u16::MAX as u64,
            Width::W32 => u32::MAX as u64,
            Width::W64 => u64::MAX,
        }
    }

    pub const fn min_int(self) -> i64 {
        match self {
            Width::W8 => i8::MIN as i64,
            Width::W16 => i16::MIN as i64,
            Width::W32 => i32::MIN as i64,
            Width::W64 => i64::MIN,
        }
    }

    pub const fn max_int(self) -> i64 {
        match self {
            Width::W8 => i8::MAX as i64,
            Width::W16 => i16::MAX as i64,
            Width::W32 => i32::MAX as i64,
            Width::W64 => i64::MAX,
        }
    }
}

/// The wire type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Major type 0, at most `Width::max_uint`
    Uint(Width),
    /// Major type 0 or 1, within the range of the width
    Int(Width),
    /// Simple values 20 and 21
    Bool,
    /// Definite byte string of exactly `N` bytes
    Bytes(usize),
    /// Definite text string of at most `N` bytes
    Text(usize),
}

impl FieldKind {
    pub const fn type_name(self) -> &'static str {
        match self {
            FieldKind::Uint(_) => "Unsigned Integer",
            FieldKind::Int(_) => "Integer",
            FieldKind::Bool => "Boolean",
            FieldKind::Bytes(_) => "Definite-length Byte String",
            FieldKind::Text(_) => "Definite-length Text String",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    pub name: &'static str,
    pub key: Key,
    pub fields: &'static [Field],
}

impl Schema {
    /// Number of items in the encoded array, the key included
    pub const fn item_count(&self) -> usize {
        self.fields.len() + 1
    }
}

/// A single field value, borrowed from a record or from the input buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Uint(u64),
    Int(i64),
    Bool(bool),
    Bytes(&'a [u8]),
    Text(&'a str),
}

impl FieldValue<'_> {
    pub const fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Uint(_) => "Unsigned Integer",
            FieldValue::Int(_) => "Integer",
            FieldValue::Bool(_) => "Boolean",
            FieldValue::Bytes(_) => "Definite-length Byte String",
            FieldValue::Text(_) => "Definite-length Text String",
        }
    }
}

impl ToCbor for FieldValue<'_> {
    fn to_cbor<W: Writer>(&self, encoder: &mut Encoder<W>) -> Result<(), cbor::encode::Error> {
        match self {
            FieldValue::Uint(v) => encoder.emit(v),
            FieldValue::Int(v) => encoder.emit(v),
            FieldValue::Bool(v) => encoder.emit(v),
            FieldValue::Bytes(v) => encoder.emit(*v),
            FieldValue::Text(v) => encoder.emit(*v),
        }
    }
}
