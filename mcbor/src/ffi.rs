/*!
The C ABI declared in `include/mcbor.h`.

Every entry point validates its pointers, converts them into borrowed
slices and records, and defers to the safe API. Failures are reported as
the negative `MCBOR_ERR_*` codes; nothing is written to a destination
unless the whole operation succeeds.
*/

use super::*;
use core::ffi::c_void;
use tracing::{debug, trace};

mod primitive;

pub use primitive::*;

/// Borrow `len` bytes at `ptr`, accepting a null `ptr` only when `len` is 0.
///
/// # Safety
/// A non-null `ptr` must be valid for reads of `len` bytes for `'a`.
unsafe fn input<'a>(ptr: *const u8, len: u32, what: &'static str) -> Result<&'a [u8], Error> {
    if len == 0 {
        Ok(&[])
    } else if ptr.is_null() {
        Err(Error::NullPointer(what))
    } else {
        Ok(unsafe { core::slice::from_raw_parts(ptr, len as usize) })
    }
}

/// Borrow `len` writable bytes at `ptr`, accepting a null `ptr` only when `len` is 0.
///
/// # Safety
/// A non-null `ptr` must be valid for writes of `len` bytes for `'a`, and
/// not aliased.
unsafe fn output<'a>(ptr: *mut u8, len: u32, what: &'static str) -> Result<&'a mut [u8], Error> {
    if len == 0 {
        Ok(&mut [])
    } else if ptr.is_null() {
        Err(Error::NullPointer(what))
    } else {
        Ok(unsafe { core::slice::from_raw_parts_mut(ptr, len as usize) })
    }
}

/// The single place a `(key, void*)` pair becomes a typed record.
///
/// # Safety
/// A non-null `ptr` must point to a valid record of the type `key` names.
unsafe fn any_record<'a>(key: u32, ptr: *const c_void) -> Result<AnyRecord<'a>, Error> {
    let key = Key::try_from(key)?;
    if ptr.is_null() {
        return Err(Error::NullPointer("record"));
    }
    match key {
        Key::Person => Ok(AnyRecord::Person(unsafe { &*ptr.cast::<Person>() })),
    }
}

fn status(result: Result<usize, Error>, op: &'static str) -> i32 {
    match result {
        Ok(len) => {
            trace!(op, len, "ok");
            i32::try_from(len).unwrap_or(i32::MAX)
        }
        Err(e) => {
            debug!(op, code = e.code(), "{e}");
            e.code()
        }
    }
}

/// Number of bytes `mcbor_encode` writes for the record at `ptr`.
///
/// Returns 0 for an unknown key or a null `ptr`.
///
/// # Safety
/// A non-null `ptr` must point to a valid record of the type `key` names.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mcbor_len(key: u32, ptr: *const c_void) -> u32 {
    match unsafe { any_record(key, ptr) } {
        Ok(record) => u32::try_from(record.encoded_len()).unwrap_or(u32::MAX),
        Err(e) => {
            debug!(op = "mcbor_len", "{e}");
            0
        }
    }
}

/// Encode the record at `ptr` into `dst`.
///
/// Returns the number of bytes written, or a negative `MCBOR_ERR_*` code.
///
/// # Safety
/// `dst` must be valid for writes of `dstlen` bytes, and a non-null `ptr`
/// must point to a valid record of the type `key` names.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mcbor_encode(
    dst: *mut u8,
    dstlen: u32,
    key: u32,
    ptr: *const c_void,
) -> i32 {
    let result = unsafe { any_record(key, ptr) }
        .and_then(|record| record.encode(unsafe { output(dst, dstlen, "dst") }?));
    status(result, "mcbor_encode")
}

/// Encode a person, as `mcbor_encode(dst, dstlen, PERSON, src)`.
///
/// # Safety
/// `dst` must be valid for writes of `dstlen` bytes, and a non-null `src`
/// must point to a valid person.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn encode_person(dst: *mut u8, dstlen: u32, src: *const Person) -> i32 {
    unsafe { mcbor_encode(dst, dstlen, Key::Person.id(), src.cast()) }
}

/// # Safety
/// A non-null `dst` must be valid for writes of one person, and `bytes`
/// valid for reads of `len` bytes.
unsafe fn decode_into(dst: *mut Person, bytes: *const u8, len: u32) -> Result<usize, Error> {
    if dst.is_null() {
        return Err(Error::NullPointer("dst"));
    }
    let data = unsafe { input(bytes, len, "bytes") }?;
    let person = Person::decode(data)?;
    unsafe { dst.write(person) };
    Ok(data.len())
}

/// Decode a person from `bytes`.
///
/// Returns the number of bytes consumed, always `len`, or a negative
/// `MCBOR_ERR_*` code. `dst` is only written on success.
///
/// # Safety
/// A non-null `dst` must be valid for writes of one person, and `bytes`
/// valid for reads of `len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn decode_person(dst: *mut Person, bytes: *const u8, len: u32) -> i32 {
    status(unsafe { decode_into(dst, bytes, len) }, "decode_person")
}

/// Decode a person from `bytes`, describing any failure in `errmsg`.
///
/// On entry `*errmsg_len` is the capacity of `errmsg`. On failure the
/// message is written, truncated at a character boundary, and
/// `*errmsg_len` is set to its length. On success `*errmsg_len` is set to 0
/// and `errmsg` is untouched.
///
/// # Safety
/// As `decode_person`; in addition a non-null `errmsg_len` must be valid for
/// reads and writes, and `errmsg` valid for writes of `*errmsg_len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn decode_person_w_errmsg(
    dst: *mut Person,
    errmsg: *mut u8,
    errmsg_len: *mut u32,
    bytes: *const u8,
    len: u32,
) -> i32 {
    if errmsg_len.is_null() {
        return status(Err(Error::NullPointer("errmsg_len")), "decode_person_w_errmsg");
    }
    let capacity = unsafe { *errmsg_len };

    match unsafe { decode_into(dst, bytes, len) } {
        Ok(len) => {
            unsafe { *errmsg_len = 0 };
            status(Ok(len), "decode_person_w_errmsg")
        }
        Err(e) => {
            let written = match unsafe { output(errmsg, capacity, "errmsg") } {
                Ok(out) => Diagnostic::new(e).copy_to(out),
                Err(_) => 0,
            };
            // written <= capacity
            unsafe { *errmsg_len = written as u32 };
            status(Err(e), "decode_person_w_errmsg")
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use hex_literal::hex;

    const ALICE: [u8; 12] = hex!("830048416c69636500000007");

    #[test]
    fn test_encode_person() {
        let p = Person::new("Alice", 7);
        let len = unsafe { mcbor_len(Key::Person.id(), (&p as *const Person).cast()) };
        assert_eq!(len, 12);

        let mut buf = [0u8; 12];
        let n = unsafe { encode_person(buf.as_mut_ptr(), buf.len() as u32, &p) };
        assert_eq!(n, 12);
        assert_eq!(buf, ALICE);
    }

    #[test]
    fn test_capacity_boundary() {
        let p = Person::new("Alice", 7);
        let mut buf = [0xAAu8; 16];
        for n in 0..12u32 {
            assert_eq!(
                unsafe { encode_person(buf.as_mut_ptr(), n, &p) },
                MCBOR_ERR_CAPACITY
            );
            assert_eq!(buf, [0xAA; 16]);
        }
        for n in 12..=16u32 {
            assert_eq!(unsafe { encode_person(buf.as_mut_ptr(), n, &p) }, 12);
        }
    }

    #[test]
    fn test_decode_person() {
        let mut p = Person::default();
        let n = unsafe { decode_person(&mut p, ALICE.as_ptr(), ALICE.len() as u32) };
        assert_eq!(n, 12);
        assert_eq!(p, Person::new("Alice", 7));
    }

    #[test]
    fn test_decode_failure_leaves_dst() {
        let before = Person::new("Bob", 3);
        let mut p = before;
        for len in 0..ALICE.len() as u32 {
            assert_eq!(
                unsafe { decode_person(&mut p, ALICE.as_ptr(), len) },
                MCBOR_ERR_TRUNCATED
            );
            assert_eq!(p, before);
        }

        let mut trailing = [0u8; 13];
        trailing[..12].copy_from_slice(&ALICE);
        assert_eq!(
            unsafe { decode_person(&mut p, trailing.as_ptr(), 13) },
            MCBOR_ERR_TRAILING
        );
        assert_eq!(p, before);
    }

    #[test]
    fn test_errmsg() {
        // name is only 2 bytes
        let short = hex!("830042486907");
        let mut p = Person::default();
        let mut msg = [0u8; 64];
        let mut msg_len = msg.len() as u32;
        let n = unsafe {
            decode_person_w_errmsg(
                &mut p,
                msg.as_mut_ptr(),
                &mut msg_len,
                short.as_ptr(),
                short.len() as u32,
            )
        };
        assert_eq!(n, MCBOR_ERR_SCHEMA);
        assert_eq!(
            &msg[..msg_len as usize],
            b"Schema mismatch in name: expected 8 bytes, found 2"
        );

        // Clipped to the caller's capacity
        let mut msg_len = 6;
        let n = unsafe {
            decode_person_w_errmsg(
                &mut p,
                msg.as_mut_ptr(),
                &mut msg_len,
                short.as_ptr(),
                short.len() as u32,
            )
        };
        assert_eq!(n, MCBOR_ERR_SCHEMA);
        assert_eq!(msg_len, 6);
        assert_eq!(&msg[..6], b"Schema");

        // Success clears the length and leaves the message alone
        let mut msg = [0xAAu8; 8];
        let mut msg_len = msg.len() as u32;
        let n = unsafe {
            decode_person_w_errmsg(
                &mut p,
                msg.as_mut_ptr(),
                &mut msg_len,
                ALICE.as_ptr(),
                ALICE.len() as u32,
            )
        };
        assert_eq!(n, 12);
        assert_eq!(msg_len, 0);
        assert_eq!(msg, [0xAA; 8]);
    }

    #[test]
    fn test_bad_arguments() {
        let p = Person::new("Alice", 7);
        let mut buf = [0u8; 16];
        assert_eq!(unsafe { mcbor_len(1, (&p as *const Person).cast()) }, 0);
        assert_eq!(unsafe { mcbor_len(0, core::ptr::null()) }, 0);
        assert_eq!(
            unsafe { mcbor_encode(buf.as_mut_ptr(), 16, 1, (&p as *const Person).cast()) },
            MCBOR_ERR_ARGUMENT
        );
        assert_eq!(
            unsafe { encode_person(core::ptr::null_mut(), 16, &p) },
            MCBOR_ERR_ARGUMENT
        );
        assert_eq!(
            unsafe { decode_person(core::ptr::null_mut(), ALICE.as_ptr(), 12) },
            MCBOR_ERR_ARGUMENT
        );
        let mut out = Person::default();
        assert_eq!(
            unsafe { decode_person(&mut out, core::ptr::null(), 12) },
            MCBOR_ERR_ARGUMENT
        );
        assert_eq!(
            unsafe {
                decode_person_w_errmsg(
                    &mut out,
                    core::ptr::null_mut(),
                    core::ptr::null_mut(),
                    ALICE.as_ptr(),
                    12,
                )
            },
            MCBOR_ERR_ARGUMENT
        );
    }

    #[test]
    fn test_header_declarations() {
        let header = include_str!("../include/mcbor.h");
        for decl in [
            "#define VERSION 2",
            "PERSON = 0,",
            "uint32_t mcbor_len(enum CBOR_KEY key, const void *ptr);",
            "int32_t mcbor_encode(uint8_t *dst, uint32_t dstlen, enum CBOR_KEY key, const void *ptr);",
            "int32_t encode_person(uint8_t *dst, uint32_t dstlen, const struct person *src);",
            "int32_t decode_person(struct person *dst, const uint8_t *bytes, uint32_t len);",
            "int32_t mcbor_enc_char(uint8_t *dst, uint32_t dstlen, char val);",
            "int32_t mcbor_dec_char(char *dst, const uint8_t *src, uint32_t srclen);",
        ] {
            assert!(header.contains(decl), "missing from mcbor.h: {decl}");
        }
        assert_eq!(crate::VERSION, 2);
    }
}
