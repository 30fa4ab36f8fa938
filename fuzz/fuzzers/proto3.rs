#![no_main]

use libfuzzer_sys::fuzz_target;
use tests::proto3::TestAllTypes;
use tests::roundtrip;

fuzz_target!(|data: &[u8]| {
    let _ = roundtrip::<TestAllTypes>(data).unwrap_error();
});
