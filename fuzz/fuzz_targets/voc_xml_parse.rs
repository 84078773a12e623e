//! Fuzz target for Pascal VOC XML decoding.
//!
//! Arbitrary bytes go to the VOC reader; malformed objects must be skipped
//! and bad documents rejected without panicking.

#![no_main]

use boxlabel::ir::io_voc_xml::from_voc_xml_slice;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    if let Ok(document) = from_voc_xml_slice(data) {
        for object in &document.objects {
            assert!(object.bbox.is_ordered());
            assert!(!object.label.is_empty());
        }
    }
});
