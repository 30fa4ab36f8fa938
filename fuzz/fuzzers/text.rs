#![no_main]

use libfuzzer_sys::fuzz_target;
use protokit::Message;
use tests::proto2::{extension_registry, Proto2Message};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let registry = extension_registry();
    let options = Default::default();
    if let Ok(message) = Proto2Message::from_text_with(text, &options, Some(&registry)) {
        let printed = message.to_text().unwrap();
        let again = Proto2Message::from_text_with(&printed, &options, Some(&registry)).unwrap();
        assert_eq!(again.to_text().unwrap(), printed);
    }
});
