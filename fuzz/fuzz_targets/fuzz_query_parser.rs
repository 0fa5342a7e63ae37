#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parsing and compiling arbitrary text must never panic
    if let Ok(predicate) = rgq::query::parse_query(data) {
        let _ = rgq::compile::compile(&predicate).map(|invocation| invocation.args());
    }
});
