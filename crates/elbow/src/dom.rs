//! Thin helpers over `roxmltree` shared by extraction and rewrite.

use crate::error::Result;
use roxmltree::{Document, Node, ParsingOptions};

pub const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// Parses an SVG document. DTDs are allowed because exported diagrams commonly carry one.
pub fn parse(text: &str) -> Result<Document<'_>> {
    let opts = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    Ok(Document::parse_with_options(text, opts)?)
}

/// `true` for `<name>` in the SVG namespace or in no namespace at all.
pub fn is_svg_element(node: Node<'_, '_>, name: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == name
        && matches!(node.tag_name().namespace(), None | Some(SVG_NS))
}

/// Lenient numeric attribute parsing: missing, unparsable or non-finite values become 0.
pub fn parse_number(raw: Option<&str>) -> f64 {
    let Some(raw) = raw else {
        return 0.0;
    };
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_suffix("px").unwrap_or(trimmed).trim_end();
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => {
            tracing::trace!(value = raw, "unparsable number, using 0");
            0.0
        }
    }
}

pub fn number_attr(node: Node<'_, '_>, name: &str) -> f64 {
    parse_number(node.attribute(name))
}

/// Id of the first `<marker>` that declares one.
pub fn first_marker_id<'a>(doc: &'a Document<'_>) -> Option<&'a str> {
    doc.descendants()
        .filter(|n| is_svg_element(*n, "marker"))
        .find_map(|n| n.attribute("id"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_number_defaults_to_zero() {
        assert_eq!(parse_number(None), 0.0);
        assert_eq!(parse_number(Some("")), 0.0);
        assert_eq!(parse_number(Some("abc")), 0.0);
        assert_eq!(parse_number(Some("NaN")), 0.0);
        assert_eq!(parse_number(Some(" 12.5 ")), 12.5);
        assert_eq!(parse_number(Some("40px")), 40.0);
        assert_eq!(parse_number(Some("-3e1")), -30.0);
    }

    #[test]
    fn svg_elements_match_with_or_without_namespace() {
        let text = r#"<svg xmlns="http://www.w3.org/2000/svg"><rect/><foo:rect xmlns:foo="urn:x"/></svg>"#;
        let doc = parse(text).unwrap();
        let rects: Vec<_> = doc
            .descendants()
            .filter(|n| is_svg_element(*n, "rect"))
            .collect();
        assert_eq!(rects.len(), 1);

        let bare = parse("<svg><rect/></svg>").unwrap();
        assert_eq!(
            bare.descendants()
                .filter(|n| is_svg_element(*n, "rect"))
                .count(),
            1
        );
    }

    #[test]
    fn first_marker_id_skips_markers_without_id() {
        let doc = parse(
            r#"<svg><defs><marker/><marker id="arrow"/><marker id="dot"/></defs></svg>"#,
        )
        .unwrap();
        assert_eq!(first_marker_id(&doc), Some("arrow"));
        let none = parse("<svg/>").unwrap();
        assert_eq!(first_marker_id(&none), None);
    }
}
