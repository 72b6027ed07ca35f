use super::*;
use hex_literal::hex;

const ALICE: [u8; 12] = hex!("830048416c69636500000007");

fn alice() -> Person {
    Person {
        name: *b"Alice\0\0\0",
        id: 7,
    }
}

#[test]
fn alice_vector() {
    let p = alice();
    assert_eq!(p, Person::new("Alice", 7));
    assert_eq!(p.encoded_len(), ALICE.len());

    let mut buf = [0u8; 32];
    let len = p.encode(&mut buf).unwrap();
    assert_eq!(buf[..len], ALICE);
    assert_eq!(Person::decode(&ALICE), Ok(p));
    assert_eq!(p.name_str(), Ok("Alice"));
}

#[test]
fn round_trip() {
    let mut buf = [0u8; 32];
    for (name, id) in [
        (*b"\0\0\0\0\0\0\0\0", 0),
        (*b"Alice\0\0\0", 7),
        (*b"12345678", 23),
        (*b"\xff\xfe\0abc\0\x01", 24),
        (*b"Zz\0\0\0\0\0\0", 255),
    ] {
        let p = Person { name, id };
        let len = p.encode(&mut buf).unwrap();
        assert_eq!(len, p.encoded_len());
        assert_eq!(Person::decode(&buf[..len]), Ok(p));
    }
}

#[test]
fn length_tracks_id() {
    // Ids below 24 fit the initial byte
    assert_eq!(Person::new("", 23).encoded_len(), 12);
    assert_eq!(Person::new("", 24).encoded_len(), 13);
    assert_eq!(Person::new("", 255).encoded_len(), 13);
}

#[test]
fn capacity_boundary() {
    let p = Person::new("Alice", 200);
    let needed = p.encoded_len();
    for n in 0..needed {
        let mut buf = [0x55u8; 16];
        assert_eq!(
            p.encode(&mut buf[..n]),
            Err(Error::Capacity {
                needed,
                available: n
            })
        );
        assert_eq!(buf, [0x55; 16]);
    }
    for n in needed..=16 {
        let mut buf = [0u8; 16];
        assert_eq!(p.encode(&mut buf[..n]), Ok(needed));
    }
}

#[test]
fn truncation() {
    for len in 0..ALICE.len() {
        assert!(
            matches!(Person::decode(&ALICE[..len]), Err(Error::Truncated { .. })),
            "prefix of {len} bytes"
        );
    }
    assert_eq!(Person::decode(&[]), Err(Error::Truncated { field: "header" }));
    assert_eq!(
        Person::decode(&ALICE[..1]),
        Err(Error::Truncated { field: "key" })
    );
    assert_eq!(
        Person::decode(&ALICE[..5]),
        Err(Error::Truncated { field: "name" })
    );
    assert_eq!(
        Person::decode(&ALICE[..11]),
        Err(Error::Truncated { field: "id" })
    );
}

#[test]
fn trailing_data() {
    let mut buf = [0u8; 14];
    buf[..12].copy_from_slice(&ALICE);
    assert_eq!(Person::decode(&buf), Err(Error::TrailingData(2)));
    assert_eq!(Person::decode_prefix(&buf), Ok((alice(), 12)));
}

fn mismatch(data: &[u8]) -> (&'static str, Mismatch) {
    match Person::decode(data) {
        Err(Error::SchemaMismatch { field, reason }) => (field, reason),
        r => panic!("expected a schema mismatch, got {r:?}"),
    }
}

#[test]
fn schema_mismatch() {
    // 2-byte name
    assert_eq!(
        mismatch(&hex!("830042416c07")),
        (
            "name",
            Mismatch::Width {
                expected: 8,
                found: 2
            }
        )
    );
    // Unknown key
    assert_eq!(
        mismatch(&hex!("830148416c69636500000007")),
        (
            "key",
            Mismatch::Key {
                expected: 0,
                found: 1
            }
        )
    );
    // Missing id
    assert_eq!(
        mismatch(&hex!("820048416c696365000000")),
        (
            "person",
            Mismatch::FieldCount {
                expected: 3,
                found: 2
            }
        )
    );
    // Not an array
    assert_eq!(
        mismatch(&hex!("48416c696365000000")),
        (
            "person",
            Mismatch::Type {
                expected: "Definite-length Array",
                found: "Definite-length Byte String"
            }
        )
    );
    // id out of range
    assert_eq!(
        mismatch(&hex!("830048416c6963650000001901f4")),
        (
            "id",
            Mismatch::Range {
                max: 255,
                found: 500
            }
        )
    );
    // Negative id
    assert_eq!(
        mismatch(&hex!("830048416c69636500000026")),
        (
            "id",
            Mismatch::Type {
                expected: "Unsigned Integer",
                found: "Negative Integer"
            }
        )
    );
    // name as text
    assert_eq!(
        mismatch(&hex!("830068416c69636500000007")),
        (
            "name",
            Mismatch::Type {
                expected: "Definite-length Byte String",
                found: "Definite-length Text String"
            }
        )
    );
    // Tagged id
    assert_eq!(
        mismatch(&hex!("830048416c696365000000c107")),
        ("id", Mismatch::Tagged)
    );
    // Tagged record
    assert_eq!(
        mismatch(&hex!("d818830048416c69636500000007")),
        ("person", Mismatch::Tagged)
    );
    // Indefinite record and name
    assert_eq!(
        mismatch(&hex!("9f0048416c69636500000007ff")),
        ("person", Mismatch::Indefinite)
    );
    assert_eq!(
        mismatch(&hex!("83005f44416c69634400000000ff07")),
        ("name", Mismatch::Indefinite)
    );
    // Malformed item heads
    assert_eq!(
        mismatch(&hex!("831c")),
        (
            "key",
            Mismatch::Malformed(cbor::decode::Error::InvalidMinorValue(28))
        )
    );
    assert_eq!(
        mismatch(&hex!("83001c")),
        (
            "name",
            Mismatch::Malformed(cbor::decode::Error::InvalidMinorValue(28))
        )
    );
}

#[test]
fn nested_items() {
    // Containers in a field are a type mismatch once fully read
    assert_eq!(
        mismatch(&hex!("8300810007")),
        (
            "name",
            Mismatch::Type {
                expected: "Definite-length Byte String",
                found: "Definite-length Array"
            }
        )
    );
    assert_eq!(
        mismatch(&hex!("8300a1000007")),
        (
            "name",
            Mismatch::Type {
                expected: "Definite-length Byte String",
                found: "Definite-length Map"
            }
        )
    );
    assert_eq!(
        mismatch(&hex!("83009f8001ff07")),
        (
            "name",
            Mismatch::Type {
                expected: "Definite-length Byte String",
                found: "Indefinite-length Array"
            }
        )
    );
    // Running out of input inside one is still truncation
    assert_eq!(
        Person::decode(&hex!("830081")),
        Err(Error::Truncated { field: "name" })
    );
    assert_eq!(
        Person::decode(&hex!("8300a100")),
        Err(Error::Truncated { field: "name" })
    );
}

#[test]
fn lenient_heads() {
    // Non-shortest heads are accepted
    assert_eq!(
        Person::decode(&hex!("8318005808416c696365000000190007")),
        Ok(alice())
    );
}

#[test]
fn diagnostics() {
    let d = decode_diagnosed::<Person>(&hex!("830042416c07")).unwrap_err();
    assert_eq!(d.code(), MCBOR_ERR_SCHEMA);
    assert_eq!(
        d.as_str(),
        "Schema mismatch in name: expected 8 bytes, found 2"
    );
    assert_eq!(decode_diagnosed::<Person>(&ALICE).unwrap(), alice());
}

#[test]
fn names() {
    // Truncated at a character boundary, never mid-character
    let p = Person::new("Jürgen Müller", 1);
    assert_eq!(&p.name, b"J\xc3\xbcrgen ");
    assert_eq!(p.name_str(), Ok("Jürgen "));

    let p = Person::new("Zoë Åberg", 2);
    assert_eq!(p.name_str(), Ok("Zoë Åb"));
    assert_eq!(p.name_bytes().len(), 8);

    let p = Person {
        name: *b"\xffbad\0\0\0\0",
        id: 0,
    };
    assert!(p.name_str().is_err());
}

#[test]
fn any_record() {
    let p = alice();
    let any = AnyRecord::from(&p);
    assert_eq!(any.key(), Key::Person);
    assert_eq!(any.encoded_len(), 12);
    let mut buf = [0u8; 12];
    assert_eq!(any.encode(&mut buf), Ok(12));
    assert_eq!(buf, ALICE);
    assert_eq!(
        any.encode(&mut buf[..11]),
        Err(Error::Capacity {
            needed: 12,
            available: 11
        })
    );
}

#[test]
fn json_view() {
    let p = alice();
    let json = serde_json::to_string(&p).unwrap();
    assert_eq!(json, r#"{"name":"Alice","id":7}"#);
    assert_eq!(serde_json::from_str::<Person>(&json).unwrap(), p);

    let long: Person = serde_json::from_str(r#"{"name":"Bartholomew","id":9}"#).unwrap();
    assert_eq!(&long.name, b"Bartholo");

    let bad = Person {
        name: *b"\xff\0\0\0\0\0\0\0",
        id: 1,
    };
    assert!(serde_json::to_string(&bad).is_err());
}
