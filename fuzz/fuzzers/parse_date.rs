#![no_main]

use libfuzzer_sys::fuzz_target;
use protokit_types::Timestamp;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(timestamp) = text.parse::<Timestamp>() {
        assert!(timestamp.is_valid());
        assert_eq!(timestamp.to_string().parse::<Timestamp>(), Ok(timestamp));
    }
});
