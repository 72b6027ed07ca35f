#![no_main]

use libfuzzer_sys::fuzz_target;
use mcbor::Person;

fuzz_target!(|data: &[u8]| {
    let Ok(len) = u32::try_from(data.len()) else {
        return;
    };
    let before = Person::new("fuzz", 1);
    let mut p = before;
    let mut msg = [0u8; 40];
    let mut msg_len = msg.len() as u32;
    let n = unsafe {
        mcbor::ffi::decode_person_w_errmsg(
            &mut p,
            msg.as_mut_ptr(),
            &mut msg_len,
            data.as_ptr(),
            len,
        )
    };
    if n < 0 {
        assert_eq!(p, before);
        assert!(msg_len as usize <= msg.len());
        assert!(std::str::from_utf8(&msg[..msg_len as usize]).is_ok());
    } else {
        assert_eq!(n as u32, len);
        assert_eq!(msg_len, 0);
    }
});
