//! Fuzz target for replay script parsing.

#![no_main]

use std::path::Path;

use boxlabel::script::Script;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }

    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };

    let _ = Script::parse(raw, Path::new("<fuzz>"));
});
