/*!
Schema-driven CBOR codec for fixed-layout records.

Each record type describes its fields once, as a static [`Schema`], and a
single generic engine encodes and decodes every record against its schema.
A record is encoded as a definite-length CBOR array holding the record
[`Key`] followed by the fields in schema order:

```text
person { name: "Alice\0\0\0", id: 7 }
  83                        array(3)
     00                     key: PERSON
     48 416c696365000000    name: bytes(8)
     07                     id: 7
```

Encoding never allocates and writes only into caller-owned buffers, and
decoding never reads past the end of its input. The same engine backs the
C ABI exported from [`ffi`], declared in `include/mcbor.h`.
*/
#![cfg_attr(not(feature = "std"), no_std)]

use mcbor_cbor as cbor;

mod any;
mod error;
mod key;
mod person;
mod record;
mod schema;

pub mod ffi;

/// Codec generation version, checked by bindings at build time.
pub const VERSION: u32 = 2;

pub use any::AnyRecord;
pub use error::{
    CaptureFieldErr, DIAGNOSTIC_CAPACITY, Diagnostic, Error, MCBOR_ERR_ARGUMENT,
    MCBOR_ERR_CAPACITY, MCBOR_ERR_SCHEMA, MCBOR_ERR_TRAILING, MCBOR_ERR_TRUNCATED, Mismatch,
};
pub use key::Key;
pub use person::Person;
pub use record::{Record, decode_diagnosed};
pub use schema::{Field, FieldKind, FieldValue, Schema, Width};

#[cfg(all(feature = "panic-handler", not(feature = "std"), not(test)))]
#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
    loop {}
}

#[cfg(test)]
mod person_tests;
