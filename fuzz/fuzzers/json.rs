#![no_main]

use libfuzzer_sys::fuzz_target;
use protokit::Message;
use tests::proto3::TestAllTypes;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(message) = TestAllTypes::from_json(text) {
        // Any payloads of unregistered types have no binary form.
        if let Ok(bytes) = message.encode_to_vec() {
            tests::check_message(&TestAllTypes::decode(&bytes).unwrap());
        }
    }
});
