//! Pascal VOC XML reader and writer.
//!
//! One XML document describes one image. Writing rounds box edges to
//! integer pixels; reading accepts float bounds, normalizes corner order
//! and skips malformed `<object>` entries instead of failing the document.

use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::Node;

use super::classes::normalize_label;
use super::model::{Annotation, ImageSize};
use super::{BBoxXYXY, ImageSpace};
use crate::error::BoxlabelError;
use crate::report::{IssueCode, Report};

pub const VOC_XML_EXTENSION: &str = "xml";

/// A decoded VOC document.
#[derive(Clone, Debug, PartialEq)]
pub struct VocDocument {
    /// Contents of `<filename>`, if present.
    pub filename: Option<String>,
    /// Contents of `<size>`, if present and numeric.
    pub size: Option<ImageSize>,
    /// Well-formed objects in document order.
    pub objects: Vec<VocObject>,
    /// Number of `<object>` entries skipped as malformed.
    pub malformed: usize,
}

/// One `<object>` entry.
#[derive(Clone, Debug, PartialEq)]
pub struct VocObject {
    /// Trimmed, lower-cased `<name>`.
    pub label: String,
    /// Ordered `<bndbox>` bounds.
    pub bbox: BBoxXYXY<ImageSpace>,
}

/// Encode one image's boxes as a VOC XML document.
///
/// Boxes whose rounded bounds collapse (`xmin >= xmax` or `ymin >= ymax`)
/// are left out and recorded in `report`.
pub fn encode_voc(
    image_name: &str,
    size: ImageSize,
    annotations: &[Annotation],
    report: &mut Report,
) -> String {
    let mut xml = String::new();

    xml.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
    xml.push_str("<annotation>\n");
    xml.push_str("\t<folder>unknown</folder>\n");
    xml.push_str(&format!("\t<filename>{}</filename>\n", xml_escape(image_name)));
    xml.push_str("\t<source>\n\t\t<database>Unknown</database>\n\t</source>\n");
    xml.push_str("\t<size>\n");
    xml.push_str(&format!("\t\t<width>{}</width>\n", size.width));
    xml.push_str(&format!("\t\t<height>{}</height>\n", size.height));
    xml.push_str("\t\t<depth>3</depth>\n");
    xml.push_str("\t</size>\n");
    xml.push_str("\t<segmented>0</segmented>\n");

    for annotation in annotations {
        let [xmin, ymin, xmax, ymax] = annotation.bbox().round_to_pixels();
        if xmin >= xmax || ymin >= ymax {
            report.warn(
                IssueCode::DegenerateVocBox,
                format!(
                    "{image_name}: skipping '{}' in VOC XML; rounded bounds collapse",
                    annotation.label()
                ),
            );
            continue;
        }

        xml.push_str("\t<object>\n");
        xml.push_str(&format!("\t\t<name>{}</name>\n", xml_escape(annotation.label())));
        xml.push_str("\t\t<pose>Unspecified</pose>\n");
        xml.push_str("\t\t<truncated>0</truncated>\n");
        xml.push_str("\t\t<difficult>0</difficult>\n");
        xml.push_str("\t\t<bndbox>\n");
        xml.push_str(&format!("\t\t\t<xmin>{xmin}</xmin>\n"));
        xml.push_str(&format!("\t\t\t<ymin>{ymin}</ymin>\n"));
        xml.push_str(&format!("\t\t\t<xmax>{xmax}</xmax>\n"));
        xml.push_str(&format!("\t\t\t<ymax>{ymax}</ymax>\n"));
        xml.push_str("\t\t</bndbox>\n");
        xml.push_str("\t</object>\n");
    }

    xml.push_str("</annotation>\n");
    xml
}

/// Read and decode a VOC XML file.
pub fn read_voc_file(path: &Path) -> Result<VocDocument, BoxlabelError> {
    let xml = fs::read_to_string(path).map_err(|source| BoxlabelError::DecodeFailure {
        path: path.to_path_buf(),
        message: source.to_string(),
    })?;
    decode_voc(&xml, path)
}

/// Decode VOC XML from a UTF-8 string.
///
/// Only a document that is not XML, or whose root is not `<annotation>`,
/// fails as a whole.
pub fn decode_voc(xml: &str, path: &Path) -> Result<VocDocument, BoxlabelError> {
    let document =
        roxmltree::Document::parse(xml).map_err(|source| BoxlabelError::DecodeFailure {
            path: path.to_path_buf(),
            message: source.to_string(),
        })?;

    let annotation = document.root_element();
    if annotation.tag_name().name() != "annotation" {
        return Err(BoxlabelError::DecodeFailure {
            path: path.to_path_buf(),
            message: "missing <annotation> root element".to_string(),
        });
    }

    let filename = optional_child_text(annotation, "filename");
    let size = child_element(annotation, "size").and_then(|size| {
        let width = optional_child_text(size, "width")?.parse::<f64>().ok()?;
        let height = optional_child_text(size, "height")?.parse::<f64>().ok()?;
        (width >= 0.0 && height >= 0.0)
            .then(|| ImageSize::new(width.round() as u32, height.round() as u32))
    });

    let mut objects = Vec::new();
    let mut malformed = 0;
    for object in annotation
        .children()
        .filter(|node| node.is_element() && node.tag_name().name() == "object")
    {
        match parse_object(object) {
            Some(parsed) => objects.push(parsed),
            None => {
                malformed += 1;
                log::debug!("{}: skipping malformed <object>", path.display());
            }
        }
    }

    Ok(VocDocument {
        filename,
        size,
        objects,
        malformed,
    })
}

/// Decode VOC XML from bytes. The input must be valid UTF-8.
pub fn from_voc_xml_slice(bytes: &[u8]) -> Result<VocDocument, BoxlabelError> {
    let xml = std::str::from_utf8(bytes).map_err(|source| BoxlabelError::DecodeFailure {
        path: PathBuf::from("<memory>"),
        message: format!("input is not valid UTF-8: {source}"),
    })?;
    decode_voc(xml, Path::new("<memory>"))
}

fn parse_object(object: Node<'_, '_>) -> Option<VocObject> {
    let label = normalize_label(&optional_child_text(object, "name")?);
    if label.is_empty() {
        return None;
    }

    let bndbox = child_element(object, "bndbox")?;
    let xmin = parse_f64_child(bndbox, "xmin")?;
    let ymin = parse_f64_child(bndbox, "ymin")?;
    let xmax = parse_f64_child(bndbox, "xmax")?;
    let ymax = parse_f64_child(bndbox, "ymax")?;

    Some(VocObject {
        label,
        bbox: BBoxXYXY::from_xyxy(xmin, ymin, xmax, ymax).normalized(),
    })
}

fn parse_f64_child(node: Node<'_, '_>, tag: &str) -> Option<f64> {
    optional_child_text(node, tag)?
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

fn child_element<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|child| child.is_element() && child.tag_name().name() == tag)
}

fn optional_child_text(node: Node<'_, '_>, tag: &str) -> Option<String> {
    child_element(node, tag)
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(ToOwned::to_owned)
}

fn xml_escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// True when the path has an `.xml` extension (case-insensitive).
pub fn has_xml_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(VOC_XML_EXTENSION))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotation(x1: f64, y1: f64, x2: f64, y2: f64, label: &str) -> Annotation {
        Annotation::new(BBoxXYXY::from_xyxy(x1, y1, x2, y2), label).expect("valid box")
    }

    #[test]
    fn decode_extracts_objects_and_normalizes() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<annotation>
  <filename>img1.jpg</filename>
  <size>
    <width>640</width>
    <height>480</height>
    <depth>3</depth>
  </size>
  <object>
    <name> Palma </name>
    <bndbox>
      <xmin>30</xmin>
      <ymin>40</ymin>
      <xmax>10</xmax>
      <ymax>20.5</ymax>
    </bndbox>
  </object>
</annotation>"#;

        let doc = decode_voc(xml, Path::new("sample.xml")).expect("parse xml");
        assert_eq!(doc.filename.as_deref(), Some("img1.jpg"));
        assert_eq!(doc.size, Some(ImageSize::new(640, 480)));
        assert_eq!(doc.malformed, 0);
        assert_eq!(
            doc.objects,
            vec![VocObject {
                label: "palma".to_string(),
                bbox: BBoxXYXY::from_xyxy(10.0, 20.5, 30.0, 40.0),
            }]
        );
    }

    #[test]
    fn decode_skips_malformed_objects() {
        let xml = r#"<annotation>
  <object><name>palma</name></object>
  <object>
    <name>tenar</name>
    <bndbox><xmin>a</xmin><ymin>1</ymin><xmax>2</xmax><ymax>3</ymax></bndbox>
  </object>
  <object>
    <bndbox><xmin>0</xmin><ymin>1</ymin><xmax>2</xmax><ymax>3</ymax></bndbox>
  </object>
  <object>
    <name>lateral</name>
    <bndbox><xmin>0</xmin><ymin>1</ymin><xmax>2</xmax><ymax>3</ymax></bndbox>
  </object>
</annotation>"#;

        let doc = decode_voc(xml, Path::new("sample.xml")).expect("parse xml");
        assert_eq!(doc.malformed, 3);
        assert_eq!(doc.objects.len(), 1);
        assert_eq!(doc.objects[0].label, "lateral");
        assert!(doc.filename.is_none());
    }

    #[test]
    fn decode_rejects_non_xml_and_wrong_root() {
        let err = decode_voc("not xml <", Path::new("bad.xml")).unwrap_err();
        assert!(matches!(err, BoxlabelError::DecodeFailure { .. }));

        let err = decode_voc("<dataset/>", Path::new("bad.xml")).unwrap_err();
        assert!(matches!(err, BoxlabelError::DecodeFailure { .. }));
    }

    #[test]
    fn encode_writes_schema_and_rounds_bounds() {
        let mut report = Report::new("export");
        let xml = encode_voc(
            "hand.jpg",
            ImageSize::new(100, 200),
            &[annotation(10.4, 10.5, 50.0, 60.6, "palma")],
            &mut report,
        );

        assert!(xml.contains("<filename>hand.jpg</filename>"));
        assert!(xml.contains("<width>100</width>"));
        assert!(xml.contains("<depth>3</depth>"));
        assert!(xml.contains("<segmented>0</segmented>"));
        assert!(xml.contains("<pose>Unspecified</pose>"));
        assert!(xml.contains("<xmin>10</xmin>"));
        assert!(xml.contains("<ymin>11</ymin>"));
        assert!(xml.contains("<ymax>61</ymax>"));
        assert_eq!(report.warning_count(), 0);
    }

    #[test]
    fn encode_skips_boxes_that_collapse_when_rounded() {
        let mut report = Report::new("export");
        let xml = encode_voc(
            "hand.jpg",
            ImageSize::new(100, 200),
            &[annotation(10.1, 10.0, 10.3, 60.0, "palma")],
            &mut report,
        );
        assert!(!xml.contains("<object>"));
        assert_eq!(report.count_of(IssueCode::DegenerateVocBox), 1);
    }

    #[test]
    fn encode_escapes_text_fields() {
        let mut report = Report::new("export");
        let xml = encode_voc(
            "a<b>&'\".jpg",
            ImageSize::new(10, 10),
            &[annotation(0.0, 0.0, 5.0, 5.0, "x&y")],
            &mut report,
        );
        assert!(xml.contains("<filename>a&lt;b&gt;&amp;&apos;&quot;.jpg</filename>"));
        assert!(xml.contains("<name>x&amp;y</name>"));

        let doc = decode_voc(&xml, Path::new("escaped.xml")).expect("reparse");
        assert_eq!(doc.filename.as_deref(), Some("a<b>&'\".jpg"));
        assert_eq!(doc.objects[0].label, "x&y");
    }

    #[test]
    fn has_xml_extension_is_case_insensitive() {
        assert!(has_xml_extension(Path::new("a/B.XML")));
        assert!(!has_xml_extension(Path::new("a/b.txt")));
    }
}
