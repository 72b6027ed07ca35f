#![no_main]

use libfuzzer_sys::fuzz_target;
use mcbor::{Person, Record};

fuzz_target!(|data: &[u8]| {
    let Some((head, rest)) = data.split_first_chunk::<9>() else {
        return;
    };
    let mut name = [0u8; 8];
    name.copy_from_slice(&head[..8]);
    let p = Person { name, id: head[8] };

    let mut buf = [0u8; 32];
    let cap = rest.first().map_or(buf.len(), |n| usize::from(*n) % buf.len());
    match p.encode(&mut buf[..cap]) {
        Ok(len) => {
            assert_eq!(len, p.encoded_len());
            assert_eq!(Person::decode(&buf[..len]), Ok(p));
        }
        Err(e) => {
            assert_eq!(e.code(), mcbor::MCBOR_ERR_CAPACITY);
            assert!(cap < p.encoded_len());
        }
    }
});
