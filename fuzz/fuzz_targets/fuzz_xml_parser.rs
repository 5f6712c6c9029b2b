#![no_main]

use arbor_xml::{ParserConfig, parse, parse_with_config};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // The parser works on text; lossy decoding keeps every input useful.
    let input = String::from_utf8_lossy(data);

    let result = parse(&input);
    assert_eq!(result.root.text(), input, "tree must reproduce the input");
    assert_eq!(result.root.span().end, input.len());
    for error in &result.errors {
        assert!(error.range.end <= input.len(), "error range out of bounds");
    }

    // A tiny depth limit exercises the nesting guard on the same input.
    let shallow = parse_with_config(&input, &ParserConfig::default().with_max_tag_depth(2));
    assert_eq!(shallow.root.text(), input);
});
