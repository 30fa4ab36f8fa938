#![no_main]

use libfuzzer_sys::fuzz_target;
use protokit_types::Duration;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(duration) = text.parse::<Duration>() {
        assert!(duration.is_valid());
        assert_eq!(duration.to_string().parse::<Duration>(), Ok(duration.normalized()));
    }
});
