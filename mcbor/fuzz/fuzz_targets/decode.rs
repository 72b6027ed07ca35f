#![no_main]

use libfuzzer_sys::fuzz_target;
use mcbor::Record;

fuzz_target!(|data: &[u8]| {
    if let Ok(p) = mcbor::Person::decode(data) {
        // Anything accepted must re-encode within its input length
        assert!(p.encoded_len() <= data.len());
    }
    if let Err(d) = mcbor::decode_diagnosed::<mcbor::Person>(data) {
        assert!(d.code() < 0);
        assert!(d.as_str().len() <= mcbor::DIAGNOSTIC_CAPACITY);
    }
});
