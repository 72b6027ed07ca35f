/*!
Item-level C ABI for hand-written codecs.

Encoders return the number of bytes written, or -1 if `dst` is too small
(nothing is written) or an argument is invalid. Decoders read one item from
the start of `src` and return the number of bytes consumed; `bytes`/`str`
decoders return the number of bytes copied and `array`/`map` decoders the
item count, 0 if indefinite. Every decoder returns -1 on failure and leaves
`dst` untouched.
*/

use super::*;
use cbor::decode::{self, FromCbor, Value};
use cbor::encode::{self as enc, Cursor, Encoder, Null, Simple, ToCbor, Undefined};
use core::ffi::c_char;
use tracing::debug;

fn emit_status(result: Result<usize, Error>) -> i32 {
    match result {
        Ok(len) => i32::try_from(len).unwrap_or(i32::MAX),
        Err(e) => {
            debug!("{e}");
            -1
        }
    }
}

fn len_u32(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

/// # Safety
/// `dst` must be valid for writes of `dstlen` bytes.
unsafe fn emit_into<T>(dst: *mut u8, dstlen: u32, value: &T) -> i32
where
    T: ToCbor + ?Sized,
{
    emit_status(
        unsafe { output(dst, dstlen, "dst") }
            .and_then(|buf| enc::emit(value, buf).map_err(Error::from)),
    )
}

/// # Safety
/// `src` must be valid for reads of `srclen` bytes.
unsafe fn parse_from<T>(dst: *mut T, src: *const u8, srclen: u32) -> i32
where
    T: FromCbor<Error = decode::Error>,
{
    let result = unsafe { input(src, srclen, "src") }.and_then(|data| {
        if dst.is_null() {
            return Err(Error::NullPointer("dst"));
        }
        let (value, _, len) = decode::parse_detail::<T>(data)?;
        unsafe { dst.write(value) };
        Ok(len)
    });
    emit_status(result)
}

macro_rules! define_enc_len {
    ($($fn:ident: $ty:ty),* $(,)?) => {
        $(
            /// Number of bytes the matching encoder writes for `val`
            #[unsafe(no_mangle)]
            pub extern "C" fn $fn(val: $ty) -> u32 {
                len_u32(enc::emitted_len(&val))
            }
        )*
    };
}

macro_rules! define_enc {
    ($($fn:ident: $ty:ty),* $(,)?) => {
        $(
            /// # Safety
            /// `dst` must be valid for writes of `dstlen` bytes.
            #[unsafe(no_mangle)]
            pub unsafe extern "C" fn $fn(dst: *mut u8, dstlen: u32, val: $ty) -> i32 {
                unsafe { emit_into(dst, dstlen, &val) }
            }
        )*
    };
}

macro_rules! define_dec {
    ($($fn:ident: $ty:ty),* $(,)?) => {
        $(
            /// # Safety
            /// A non-null `dst` must be valid for writes, and `src` valid for
            /// reads of `srclen` bytes.
            #[unsafe(no_mangle)]
            pub unsafe extern "C" fn $fn(dst: *mut $ty, src: *const u8, srclen: u32) -> i32 {
                unsafe { parse_from(dst, src, srclen) }
            }
        )*
    };
}

define_enc_len!(
    mcbor_enc_u8_len: u8,
    mcbor_enc_u16_len: u16,
    mcbor_enc_u32_len: u32,
    mcbor_enc_u64_len: u64,
    mcbor_enc_i8_len: i8,
    mcbor_enc_i16_len: i16,
    mcbor_enc_i32_len: i32,
    mcbor_enc_i64_len: i64,
);

define_enc!(
    mcbor_enc_u8: u8,
    mcbor_enc_u16: u16,
    mcbor_enc_u32: u32,
    mcbor_enc_u64: u64,
    mcbor_enc_i8: i8,
    mcbor_enc_i16: i16,
    mcbor_enc_i32: i32,
    mcbor_enc_i64: i64,
    mcbor_enc_bool: bool,
);

define_dec!(
    mcbor_dec_u8: u8,
    mcbor_dec_u16: u16,
    mcbor_dec_u32: u32,
    mcbor_dec_u64: u64,
    mcbor_dec_i8: i8,
    mcbor_dec_i16: i16,
    mcbor_dec_i32: i32,
    mcbor_dec_i64: i64,
    mcbor_dec_bool: bool,
);

/// Encode a C `char` as the unsigned integer of its byte value.
///
/// # Safety
/// `dst` must be valid for writes of `dstlen` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mcbor_enc_char(dst: *mut u8, dstlen: u32, val: c_char) -> i32 {
    unsafe { emit_into(dst, dstlen, &(val as u8)) }
}

/// Decode a C `char`. Values above 255 do not fit and fail.
///
/// # Safety
/// A non-null `dst` must be valid for a one-byte write, and `src` valid for
/// reads of `srclen` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mcbor_dec_char(dst: *mut c_char, src: *const u8, srclen: u32) -> i32 {
    unsafe { parse_from(dst.cast::<u8>(), src, srclen) }
}

/// # Safety
/// `dst` must be valid for writes of `dstlen` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mcbor_enc_null(dst: *mut u8, dstlen: u32) -> i32 {
    unsafe { emit_into(dst, dstlen, &Null) }
}

/// # Safety
/// `dst` must be valid for writes of `dstlen` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mcbor_enc_undefined(dst: *mut u8, dstlen: u32) -> i32 {
    unsafe { emit_into(dst, dstlen, &Undefined) }
}

/// Encode an unassigned simple value; 20 to 31 are rejected.
///
/// # Safety
/// `dst` must be valid for writes of `dstlen` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mcbor_enc_simple(dst: *mut u8, dstlen: u32, val: u8) -> i32 {
    unsafe { emit_into(dst, dstlen, &Simple(val)) }
}

/// # Safety
/// `dst` must be valid for writes of `dstlen` bytes.
unsafe fn emit_header(dst: *mut u8, dstlen: u32, major_map: bool, count: u32) -> i32 {
    let result = unsafe { output(dst, dstlen, "dst") }.and_then(|buf| {
        let mut e = Encoder::new(Cursor::new(buf));
        if major_map {
            e.emit_map_header(Some(count as usize))?;
        } else {
            e.emit_array_header(Some(count as usize))?;
        }
        Ok(e.offset())
    });
    emit_status(result)
}

/// Encode the head of a definite array of `count` items.
///
/// # Safety
/// `dst` must be valid for writes of `dstlen` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mcbor_enc_array(dst: *mut u8, dstlen: u32, count: u32) -> i32 {
    unsafe { emit_header(dst, dstlen, false, count) }
}

/// Encode the head of a definite map of `count` pairs.
///
/// # Safety
/// `dst` must be valid for writes of `dstlen` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mcbor_enc_map(dst: *mut u8, dstlen: u32, count: u32) -> i32 {
    unsafe { emit_header(dst, dstlen, true, count) }
}

/// Encoded length of the byte string at `src`.
///
/// # Safety
/// `src` must be valid for reads of `srclen` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mcbor_enc_bytes_len(src: *const u8, srclen: u32) -> u32 {
    match unsafe { input(src, srclen, "src") } {
        Ok(data) => len_u32(enc::emitted_len(data)),
        Err(_) => 0,
    }
}

/// # Safety
/// `dst` must be valid for writes of `dstlen` bytes, and `src` for reads of
/// `srclen` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mcbor_enc_bytes(
    dst: *mut u8,
    dstlen: u32,
    src: *const u8,
    srclen: u32,
) -> i32 {
    match unsafe { input(src, srclen, "src") } {
        Ok(data) => unsafe { emit_into(dst, dstlen, data) },
        Err(e) => emit_status(Err(e)),
    }
}

/// # Safety
/// `src` must be valid for reads of `srclen` bytes.
unsafe fn input_str<'a>(src: *const c_char, srclen: u32) -> Result<&'a str, Error> {
    let data = unsafe { input(src.cast(), srclen, "src") }?;
    core::str::from_utf8(data).map_err(|_| Error::mismatch("src", Mismatch::Utf8))
}

/// Encoded length of the UTF-8 text at `src`, or 0 if it is not valid UTF-8.
///
/// # Safety
/// `src` must be valid for reads of `srclen` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mcbor_enc_str_len(src: *const c_char, srclen: u32) -> u32 {
    match unsafe { input_str(src, srclen) } {
        Ok(s) => len_u32(enc::emitted_len(s)),
        Err(_) => 0,
    }
}

/// Encode `srclen` bytes of UTF-8 text, not including any NUL terminator.
///
/// # Safety
/// `dst` must be valid for writes of `dstlen` bytes, and `src` for reads of
/// `srclen` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mcbor_enc_str(
    dst: *mut u8,
    dstlen: u32,
    src: *const c_char,
    srclen: u32,
) -> i32 {
    match unsafe { input_str(src, srclen) } {
        Ok(s) => unsafe { emit_into(dst, dstlen, s) },
        Err(e) => emit_status(Err(e)),
    }
}

/// # Safety
/// `src` must be valid for reads of `srclen` bytes.
unsafe fn parse_unit(
    src: *const u8,
    srclen: u32,
    expected: &'static str,
    want: fn(&Value) -> bool,
) -> i32 {
    let result = unsafe { input(src, srclen, "src") }.and_then(|data| {
        let ((), len) = decode::parse_value(data, |value, _, tags| {
            if tags.is_empty() && want(&value) {
                Ok(())
            } else {
                Err(decode::Error::IncorrectType(expected, value.type_name()))
            }
        })?;
        Ok(len)
    });
    emit_status(result)
}

/// # Safety
/// `src` must be valid for reads of `srclen` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mcbor_dec_null(src: *const u8, srclen: u32) -> i32 {
    unsafe { parse_unit(src, srclen, "Null", |v| matches!(v, Value::Null)) }
}

/// # Safety
/// `src` must be valid for reads of `srclen` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mcbor_dec_undefined(src: *const u8, srclen: u32) -> i32 {
    unsafe { parse_unit(src, srclen, "Undefined", |v| matches!(v, Value::Undefined)) }
}

/// Decode any simple value, including false, true, null and undefined.
///
/// # Safety
/// A non-null `dst` must be valid for writes, and `src` valid for reads of
/// `srclen` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mcbor_dec_simple(dst: *mut u8, src: *const u8, srclen: u32) -> i32 {
    let result = unsafe { input(src, srclen, "src") }.and_then(|data| {
        if dst.is_null() {
            return Err(Error::NullPointer("dst"));
        }
        let (simple, len) = decode::parse_value(data, |value, _, _| match value {
            Value::False => Ok(20),
            Value::True => Ok(21),
            Value::Null => Ok(22),
            Value::Undefined => Ok(23),
            Value::Simple(v) => Ok(v),
            value => Err(decode::Error::IncorrectType("Simple Value", value.type_name())),
        })?;
        unsafe { dst.write(simple) };
        Ok(len)
    });
    emit_status(result)
}

/// # Safety
/// `dst` must be valid for writes of `dstlen` bytes, and `src` for reads of
/// `srclen` bytes.
unsafe fn copy_string(
    dst: *mut u8,
    dstlen: u32,
    src: *const u8,
    srclen: u32,
    text: bool,
) -> i32 {
    let result = unsafe { input(src, srclen, "src") }.and_then(|data| {
        let (content, _) = decode::parse_value(data, |value, _, _| match value {
            Value::Bytes(b) if !text => Ok(b),
            Value::Text(s) if text => Ok(s.as_bytes()),
            value => Err(decode::Error::IncorrectType(
                if text { "Text String" } else { "Byte String" },
                value.type_name(),
            )),
        })?;
        let out = unsafe { output(dst, dstlen, "dst") }?;
        let available = out.len();
        let Some(out) = out.get_mut(..content.len()) else {
            return Err(Error::Capacity {
                needed: content.len(),
                available,
            });
        };
        out.copy_from_slice(content);
        Ok(content.len())
    });
    emit_status(result)
}

/// Copy the content of a definite byte string into `dst`.
///
/// # Safety
/// `dst` must be valid for writes of `dstlen` bytes, and `src` for reads of
/// `srclen` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mcbor_dec_bytes(
    dst: *mut u8,
    dstlen: u32,
    src: *const u8,
    srclen: u32,
) -> i32 {
    unsafe { copy_string(dst, dstlen, src, srclen, false) }
}

/// Copy the content of a definite text string into `dst`, not NUL terminated.
///
/// # Safety
/// `dst` must be valid for writes of `dstlen` bytes, and `src` for reads of
/// `srclen` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mcbor_dec_str(
    dst: *mut u8,
    dstlen: u32,
    src: *const u8,
    srclen: u32,
) -> i32 {
    unsafe { copy_string(dst, dstlen, src, srclen, true) }
}

fn count_status(result: Result<(Option<usize>, usize), decode::Error>) -> i32 {
    match result {
        Ok((Some(count), _)) => i32::try_from(count).unwrap_or(-1),
        Ok((None, _)) => 0,
        Err(e) => {
            debug!("{e}");
            -1
        }
    }
}

/// Item count of the array at the start of `src`, 0 if indefinite.
///
/// # Safety
/// `src` must be valid for reads of `srclen` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mcbor_dec_array(src: *const u8, srclen: u32) -> i32 {
    match unsafe { input(src, srclen, "src") } {
        Ok(data) => count_status(decode::parse_array_header(data)),
        Err(e) => emit_status(Err(e)),
    }
}

/// Pair count of the map at the start of `src`, 0 if indefinite.
///
/// # Safety
/// `src` must be valid for reads of `srclen` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mcbor_dec_map(src: *const u8, srclen: u32) -> i32 {
    match unsafe { input(src, srclen, "src") } {
        Ok(data) => count_status(decode::parse_map_header(data)),
        Err(e) => emit_status(Err(e)),
    }
}
