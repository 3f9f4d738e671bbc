#![no_main]

use libfuzzer_sys::fuzz_target;
use markup::{ParseOptions, parse_fragment_with};

fuzz_target!(|data: &[u8]| {
    let input = String::from_utf8_lossy(data);
    let options = ParseOptions { max_depth: 64 };
    if let Ok(node) = parse_fragment_with(&input, &options) {
        assert!(!node.is_text(), "fragment root must be an element");
    }
});
