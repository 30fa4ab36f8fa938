#![no_main]

use libfuzzer_sys::fuzz_target;
use tests::proto2::Proto2Message;
use tests::roundtrip;

fuzz_target!(|data: &[u8]| {
    let _ = roundtrip::<Proto2Message>(data).unwrap_error();
});
