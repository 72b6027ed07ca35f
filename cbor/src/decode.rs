use thiserror::Error;

pub use super::decode_seq::{Array, Map, Sequence};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("Not enough data for encoded value")]
    NotEnoughData,

    #[error("Invalid minor-type value {0}")]
    InvalidMinorValue(u8),

    #[error("Tags with no following value")]
    JustTags,

    #[error("Incorrect type, expected {0}, found {1}")]
    IncorrectType(&'static str, &'static str),

    #[error("Chunked string contains an invalid chunk")]
    InvalidChunk,

    #[error("Invalid simple type {0}")]
    InvalidSimpleType(u8),

    #[error("Integer does not fit the target type")]
    IntegerOverflow,

    #[error("Array or map has additional items")]
    AdditionalItems,

    #[error("Map has a key with no value")]
    PartialMap,

    #[error("Maximum recursion depth reached")]
    MaxRecursion,

    #[error(transparent)]
    InvalidUtf8(#[from] core::str::Utf8Error),
}

pub trait FromCbor: Sized {
    type Error: From<Error>;

    fn try_from_cbor(data: &[u8]) -> Result<Option<(Self, bool, usize)>, Self::Error>;
}

/// The tag numbers preceding an item, decoded lazily.
#[derive(Debug, Clone, Copy)]
pub struct Tags<'a> {
    data: &'a [u8],
}

impl Tags<'_> {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Iterator for Tags<'_> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        let (&head, rest) = self.data.split_first()?;
        // Already validated by parse_tags
        let (tag, len, _) = parse_uint_minor(head & 0x1F, rest).ok()?;
        self.data = &rest[len..];
        Some(tag)
    }
}

/// The definite chunks of an indefinite-length string, already validated.
#[derive(Debug, Clone, Copy)]
pub struct Chunks<'a> {
    data: &'a [u8],
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        let (&head, rest) = self.data.split_first()?;
        if head == 0xFF {
            return None;
        }
        let (chunk, len) = parse_data_minor(head & 0x1F, rest).ok()?;
        self.data = &rest[len..];
        Some(chunk)
    }
}

#[derive(Debug)]
pub enum Value<'a, 'b> {
    UnsignedInteger(u64),
    NegativeInteger(u64),
    Bytes(&'a [u8]),
    ByteStream(Chunks<'a>),
    Text(&'a str),
    TextStream(Chunks<'a>),
    Array(&'b mut Array<'a>),
    Map(&'b mut Map<'a>),
    False,
    True,
    Null,
    Undefined,
    Simple(u8),
    Float(f64),
}

impl Value<'_, '_> {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::UnsignedInteger(_) => "Unsigned Integer",
            Value::NegativeInteger(_) => "Negative Integer",
            Value::Bytes(_) => "Definite-length Byte String",
            Value::ByteStream(_) => "Indefinite-length Byte String",
            Value::Text(_) => "Definite-length Text String",
            Value::TextStream(_) => "Indefinite-length Text String",
            Value::Array(a) if a.is_definite() => "Definite-length Array",
            Value::Array(_) => "Indefinite-length Array",
            Value::Map(m) if m.is_definite() => "Definite-length Map",
            Value::Map(_) => "Indefinite-length Map",
            Value::False => "False",
            Value::True => "True",
            Value::Null => "Null",
            Value::Undefined => "Undefined",
            Value::Simple(_) => "Simple Value",
            Value::Float(_) => "Float",
        }
    }

    /// Consume any items nested inside this one, descending at most
    /// `max_recursion` levels.
    pub fn skip(&mut self, max_recursion: usize) -> Result<(), Error> {
        match self {
            Value::Array(a) => {
                let depth = max_recursion.checked_sub(1).ok_or(Error::MaxRecursion)?;
                a.skip_to_end(depth)
            }
            Value::Map(m) => {
                let depth = max_recursion.checked_sub(1).ok_or(Error::MaxRecursion)?;
                m.skip_to_end(depth)
            }
            _ => Ok(()),
        }
    }
}

fn parse_tags(data: &[u8]) -> Result<(Tags<'_>, usize), Error> {
    let mut offset = 0;
    while let Some(&head) = data.get(offset) {
        if head >> 5 != 6 {
            break;
        }
        let (_, len, _) = parse_uint_minor(head & 0x1F, &data[offset + 1..])?;
        offset += len + 1;
    }
    Ok((
        Tags {
            data: &data[..offset],
        },
        offset,
    ))
}

fn read_be<const N: usize>(data: &[u8]) -> Result<[u8; N], Error> {
    data.get(0..N)
        .and_then(|b| b.try_into().ok())
        .ok_or(Error::NotEnoughData)
}

/// Returns (value, bytes consumed after the initial byte, shortest form)
pub(super) fn parse_uint_minor(minor: u8, data: &[u8]) -> Result<(u64, usize, bool), Error> {
    match minor {
        24 => {
            let [v] = read_be::<1>(data)?;
            Ok((v as u64, 1, v >= 24))
        }
        25 => {
            let v = u16::from_be_bytes(read_be(data)?) as u64;
            Ok((v, 2, v > u8::MAX as u64))
        }
        26 => {
            let v = u32::from_be_bytes(read_be(data)?) as u64;
            Ok((v, 4, v > u16::MAX as u64))
        }
        27 => {
            let v = u64::from_be_bytes(read_be(data)?);
            Ok((v, 8, v > u32::MAX as u64))
        }
        val if val < 24 => Ok((val as u64, 0, true)),
        _ => Err(Error::InvalidMinorValue(minor)),
    }
}

/// Returns (content, bytes consumed after the initial byte)
fn parse_data_minor(minor: u8, data: &[u8]) -> Result<(&[u8], usize), Error> {
    let (data_len, len, _) = parse_uint_minor(minor, data)?;
    let end = usize::try_from(data_len)
        .ok()
        .and_then(|n| n.checked_add(len))
        .filter(|end| *end <= data.len())
        .ok_or(Error::NotEnoughData)?;
    Ok((&data[len..end], end))
}

/// Validates the chunks of an indefinite-length string.
/// Returns (chunks, bytes consumed after the initial byte, all chunks shortest)
fn parse_data_chunked(major: u8, data: &[u8]) -> Result<(Chunks<'_>, usize, bool), Error> {
    let mut offset = 0;
    let mut shortest = true;
    loop {
        let Some(&head) = data.get(offset) else {
            return Err(Error::NotEnoughData);
        };
        offset += 1;
        if head == 0xFF {
            break;
        }
        if head >> 5 != major || head & 0x1F == 31 {
            return Err(Error::InvalidChunk);
        }

        let (_, _, s) = parse_uint_minor(head & 0x1F, &data[offset..])?;
        let (chunk, chunk_len) = parse_data_minor(head & 0x1F, &data[offset..])?;
        if major == 3 {
            core::str::from_utf8(chunk)?;
        }
        shortest = shortest && s;
        offset += chunk_len;
    }
    Ok((
        Chunks {
            data: &data[..offset],
        },
        offset,
        shortest,
    ))
}

/// Parse a single item from the start of `data`.
///
/// Returns `Ok(None)` if `data` is empty, otherwise the result of `f` and the
/// number of bytes the item occupies. The `bool` passed to `f` is true when
/// the item head used the shortest possible encoding.
pub fn try_parse_value<'a, T, F, E>(data: &'a [u8], f: F) -> Result<Option<(T, usize)>, E>
where
    F: FnOnce(Value<'a, '_>, bool, Tags<'a>) -> Result<T, E>,
    E: From<Error>,
{
    let (tags, mut offset) = parse_tags(data)?;
    let Some(&head) = data.get(offset) else {
        if !tags.is_empty() {
            return Err(Error::JustTags.into());
        } else {
            return Ok(None);
        }
    };

    let r = match (head >> 5, head & 0x1F) {
        (0, minor) => {
            let (v, len, shortest) = parse_uint_minor(minor, &data[offset + 1..])?;
            offset += len + 1;
            f(Value::UnsignedInteger(v), shortest, tags)
        }
        (1, minor) => {
            let (v, len, shortest) = parse_uint_minor(minor, &data[offset + 1..])?;
            offset += len + 1;
            f(Value::NegativeInteger(v), shortest, tags)
        }
        (2, 31) => {
            /* Indefinite length byte string */
            let (chunks, len, shortest) = parse_data_chunked(2, &data[offset + 1..])?;
            offset += len + 1;
            f(Value::ByteStream(chunks), shortest, tags)
        }
        (2, minor) => {
            /* Known length byte string */
            let (_, _, shortest) = parse_uint_minor(minor, &data[offset + 1..])?;
            let (t, len) = parse_data_minor(minor, &data[offset + 1..])?;
            offset += len + 1;
            f(Value::Bytes(t), shortest, tags)
        }
        (3, 31) => {
            /* Indefinite length text string */
            let (chunks, len, shortest) = parse_data_chunked(3, &data[offset + 1..])?;
            offset += len + 1;
            f(Value::TextStream(chunks), shortest, tags)
        }
        (3, minor) => {
            /* Known length text string */
            let (_, _, shortest) = parse_uint_minor(minor, &data[offset + 1..])?;
            let (t, len) = parse_data_minor(minor, &data[offset + 1..])?;
            offset += len + 1;
            let s = core::str::from_utf8(t).map_err(Error::from)?;
            f(Value::Text(s), shortest, tags)
        }
        (4, 31) => {
            /* Indefinite length array */
            let mut a = Array::new(data, None, offset + 1);
            let r = f(Value::Array(&mut a), true, tags)?;
            a.complete()?;
            offset = a.offset();
            Ok(r)
        }
        (4, minor) => {
            /* Known length array */
            let (count, len, shortest) = parse_uint_minor(minor, &data[offset + 1..])?;
            let count = usize::try_from(count).map_err(|_| Error::NotEnoughData)?;
            let mut a = Array::new(data, Some(count), offset + len + 1);
            let r = f(Value::Array(&mut a), shortest, tags)?;
            a.complete()?;
            offset = a.offset();
            Ok(r)
        }
        (5, 31) => {
            /* Indefinite length map */
            let mut m = Map::new(data, None, offset + 1);
            let r = f(Value::Map(&mut m), true, tags)?;
            m.complete()?;
            offset = m.offset();
            Ok(r)
        }
        (5, minor) => {
            /* Known length map */
            let (count, len, shortest) = parse_uint_minor(minor, &data[offset + 1..])?;
            let count = usize::try_from(count)
                .ok()
                .and_then(|c| c.checked_mul(2))
                .ok_or(Error::NotEnoughData)?;
            let mut m = Map::new(data, Some(count), offset + len + 1);
            let r = f(Value::Map(&mut m), shortest, tags)?;
            m.complete()?;
            offset = m.offset();
            Ok(r)
        }
        (6, _) => unreachable!(),
        (7, 20) => {
            offset += 1;
            f(Value::False, true, tags)
        }
        (7, 21) => {
            offset += 1;
            f(Value::True, true, tags)
        }
        (7, 22) => {
            offset += 1;
            f(Value::Null, true, tags)
        }
        (7, 23) => {
            offset += 1;
            f(Value::Undefined, true, tags)
        }
        (7, minor @ 0..=19) => {
            offset += 1;
            f(Value::Simple(minor), true, tags)
        }
        (7, 24) => {
            let [v] = read_be::<1>(&data[offset + 1..])?;
            if v < 32 {
                return Err(Error::InvalidSimpleType(v).into());
            }
            offset += 2;
            f(Value::Simple(v), true, tags)
        }
        (7, 25) => {
            /* FP16 */
            let v = half::f16::from_be_bytes(read_be(&data[offset + 1..])?);
            offset += 3;
            f(Value::Float(v.into()), true, tags)
        }
        (7, 26) => {
            /* FP32 */
            let v = f32::from_be_bytes(read_be(&data[offset + 1..])?);
            offset += 5;
            let shortest = half::f16::from_f32(v).to_f32() != v && !v.is_nan();
            f(Value::Float(v.into()), shortest, tags)
        }
        (7, 27) => {
            /* FP64 */
            let v = f64::from_be_bytes(read_be(&data[offset + 1..])?);
            offset += 9;
            let shortest = (v as f32) as f64 != v && !v.is_nan();
            f(Value::Float(v), shortest, tags)
        }
        (7, minor) => Err(Error::InvalidSimpleType(minor).into()),
        (8.., _) => unreachable!(),
    };
    r.map(|r| Some((r, offset)))
}

pub fn parse_value<'a, T, F, E>(data: &'a [u8], f: F) -> Result<(T, usize), E>
where
    F: FnOnce(Value<'a, '_>, bool, Tags<'a>) -> Result<T, E>,
    E: From<Error>,
{
    try_parse_value(data, f)?.ok_or(Error::NotEnoughData.into())
}

pub fn try_parse_array<'a, T, F, E>(data: &'a [u8], f: F) -> Result<Option<(T, usize)>, E>
where
    F: FnOnce(&mut Array<'a>, bool, Tags<'a>) -> Result<T, E>,
    E: From<Error>,
{
    try_parse_value(data, |value, shortest, tags| match value {
        Value::Array(a) => f(a, shortest, tags),
        value => Err(Error::IncorrectType("Array", value.type_name()).into()),
    })
}

pub fn parse_array<'a, T, F, E>(data: &'a [u8], f: F) -> Result<(T, usize), E>
where
    F: FnOnce(&mut Array<'a>, bool, Tags<'a>) -> Result<T, E>,
    E: From<Error>,
{
    try_parse_array(data, f)?.ok_or(Error::NotEnoughData.into())
}

fn major_type_name(major: u8) -> &'static str {
    match major {
        0 => "Unsigned Integer",
        1 => "Negative Integer",
        2 => "Byte String",
        3 => "Text String",
        4 => "Array",
        5 => "Map",
        6 => "Tag",
        _ => "Simple Value",
    }
}

fn parse_sequence_header(
    data: &[u8],
    major: u8,
    expected: &'static str,
) -> Result<(Option<usize>, usize), Error> {
    let (&head, rest) = data.split_first().ok_or(Error::NotEnoughData)?;
    if head >> 5 != major {
        return Err(Error::IncorrectType(expected, major_type_name(head >> 5)));
    }
    if head & 0x1F == 31 {
        return Ok((None, 1));
    }
    let (count, len, _) = parse_uint_minor(head & 0x1F, rest)?;
    let count = usize::try_from(count).map_err(|_| Error::IntegerOverflow)?;
    Ok((Some(count), len + 1))
}

/// Parse only the head of an array, leaving the items to the caller.
///
/// Returns the item count (`None` if indefinite) and the length of the head.
pub fn parse_array_header(data: &[u8]) -> Result<(Option<usize>, usize), Error> {
    parse_sequence_header(data, 4, "Array")
}

/// Parse only the head of a map, returning the pair count and head length.
pub fn parse_map_header(data: &[u8]) -> Result<(Option<usize>, usize), Error> {
    parse_sequence_header(data, 5, "Map")
}

pub fn parse_detail<T>(data: &[u8]) -> Result<(T, bool, usize), T::Error>
where
    T: FromCbor,
{
    T::try_from_cbor(data)?.ok_or(Error::NotEnoughData.into())
}

pub fn parse<T>(data: &[u8]) -> Result<T, T::Error>
where
    T: FromCbor,
{
    parse_detail(data).map(|(v, _, _)| v)
}

impl FromCbor for u64 {
    type Error = Error;

    fn try_from_cbor(data: &[u8]) -> Result<Option<(Self, bool, usize)>, Self::Error> {
        try_parse_value(data, |value, shortest, tags| match value {
            Value::UnsignedInteger(n) => Ok((n, shortest && tags.is_empty())),
            value => Err(Error::IncorrectType("Unsigned Integer", value.type_name())),
        })
        .map(|o| o.map(|((v, s), len)| (v, s, len)))
    }
}

impl FromCbor for i64 {
    type Error = Error;

    fn try_from_cbor(data: &[u8]) -> Result<Option<(Self, bool, usize)>, Self::Error> {
        try_parse_value(data, |value, shortest, tags| match value {
            Value::UnsignedInteger(n) => Ok((
                i64::try_from(n).map_err(|_| Error::IntegerOverflow)?,
                shortest && tags.is_empty(),
            )),
            Value::NegativeInteger(n) => Ok((
                -1 - i64::try_from(n).map_err(|_| Error::IntegerOverflow)?,
                shortest && tags.is_empty(),
            )),
            value => Err(Error::IncorrectType("Integer", value.type_name())),
        })
        .map(|o| o.map(|((v, s), len)| (v, s, len)))
    }
}

macro_rules! impl_narrow_from_cbor {
    ($wide:ty; $($ty:ty),*) => {
        $(
            impl FromCbor for $ty {
                type Error = Error;

                fn try_from_cbor(data: &[u8]) -> Result<Option<(Self, bool, usize)>, Self::Error> {
                    match <$wide>::try_from_cbor(data)? {
                        Some((v, s, len)) => Ok(Some((
                            <$ty>::try_from(v).map_err(|_| Error::IntegerOverflow)?,
                            s,
                            len,
                        ))),
                        None => Ok(None),
                    }
                }
            }
        )*
    };
}

impl_narrow_from_cbor!(u64; u8, u16, u32, usize);
impl_narrow_from_cbor!(i64; i8, i16, i32, isize);

impl FromCbor for f64 {
    type Error = Error;

    fn try_from_cbor(data: &[u8]) -> Result<Option<(Self, bool, usize)>, Self::Error> {
        try_parse_value(data, |value, shortest, tags| match value {
            Value::Float(f) => Ok((f, shortest && tags.is_empty())),
            value => Err(Error::IncorrectType("Float", value.type_name())),
        })
        .map(|o| o.map(|((v, s), len)| (v, s, len)))
    }
}

impl FromCbor for bool {
    type Error = Error;

    fn try_from_cbor(data: &[u8]) -> Result<Option<(Self, bool, usize)>, Self::Error> {
        try_parse_value(data, |value, shortest, tags| match value {
            Value::False => Ok((false, shortest && tags.is_empty())),
            Value::True => Ok((true, shortest && tags.is_empty())),
            value => Err(Error::IncorrectType("Boolean", value.type_name())),
        })
        .map(|o| o.map(|((v, s), len)| (v, s, len)))
    }
}
