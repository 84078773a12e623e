use std::path::Path;

use boxlabel::ir::io_voc_xml::{decode_voc, encode_voc};
use boxlabel::ir::Annotation;
use boxlabel::report::Report;
use proptest::prelude::*;

mod proptest_helpers;

/// Already-normalized labels that still need XML escaping.
fn arb_xml_label() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[a-z&<>'\"][a-z0-9&<>'\" _]{0,8}[a-z0-9&<>]")
        .expect("valid label regex")
}

proptest! {
    #![proptest_config(proptest_helpers::proptest_config())]

    #[test]
    fn voc_roundtrip_preserves_pixel_bounds_and_labels(
        (size, bbox) in proptest_helpers::arb_image_with_pixel_box(),
        label in arb_xml_label(),
    ) {
        let annotation = Annotation::new(bbox, &label).expect("valid box");
        let mut report = Report::new("export");
        let xml = encode_voc("img & co.jpg", size, &[annotation], &mut report);
        prop_assert_eq!(report.warning_count(), 0);

        let document = decode_voc(&xml, Path::new("prop.xml")).expect("decode");
        prop_assert_eq!(document.filename.as_deref(), Some("img & co.jpg"));
        prop_assert_eq!(document.size, Some(size));
        prop_assert_eq!(document.malformed, 0);
        prop_assert_eq!(document.objects.len(), 1);
        prop_assert_eq!(&document.objects[0].label, &label);
        prop_assert_eq!(document.objects[0].bbox, bbox);
    }

    #[test]
    fn voc_reencode_is_stable(
        (size, bbox) in proptest_helpers::arb_image_with_box(),
    ) {
        let annotation = Annotation::new(bbox, "palma").expect("valid box");
        let mut report = Report::new("export");
        let first = encode_voc("a.jpg", size, &[annotation], &mut report);

        let decoded = decode_voc(&first, Path::new("a.xml")).expect("decode");
        let again: Vec<Annotation> = decoded
            .objects
            .iter()
            .map(|obj| Annotation::new(obj.bbox, &obj.label).expect("decoded box is valid"))
            .collect();
        let second = encode_voc("a.jpg", size, &again, &mut report);
        prop_assert_eq!(first, second);
    }
}
