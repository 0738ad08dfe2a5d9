//! Candidate box extraction.
//!
//! Every `<rect>` is resolved to absolute coordinates by summing the `translate(..)` offsets of
//! its ancestor `<g>` elements. Rects that look like background panels or gradient fills are
//! dropped.

use crate::config::RouteConfig;
use crate::dom::{is_svg_element, number_attr};
use crate::geom::{DiagramBox, Vector, vector};
use regex::Regex;
use roxmltree::{Document, Node};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Why a rect was not accepted as a candidate box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusion {
    Degenerate,
    Oversized,
    PaintServerFill,
}

fn re_translate() -> &'static Regex {
    static ONCE: OnceLock<Regex> = OnceLock::new();
    ONCE.get_or_init(|| Regex::new(r"^\s*translate\s*\(([^()]*)\)\s*$").unwrap())
}

/// Parses a transform that is exactly one `translate(tx [ty])`.
///
/// Any other transform (scale, rotate, matrix, chained steps) yields `None`.
pub fn parse_translate(transform: &str) -> Option<Vector> {
    let caps = re_translate().captures(transform)?;
    let args = caps.get(1)?.as_str();
    let mut nums = args
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<f64>().ok().filter(|v| v.is_finite()));
    let tx = nums.next()??;
    let ty = match nums.next() {
        Some(v) => v?,
        None => 0.0,
    };
    if nums.next().is_some() {
        return None;
    }
    Some(vector(tx, ty))
}

/// Sum of the translate offsets of every ancestor `<g>`.
pub fn ancestor_offset(node: Node<'_, '_>) -> Vector {
    node.ancestors()
        .skip(1)
        .filter(|a| is_svg_element(*a, "g"))
        .filter_map(|a| a.attribute("transform"))
        .filter_map(parse_translate)
        .fold(vector(0.0, 0.0), |acc, v| acc + v)
}

fn fill_references_paint_server(fill: Option<&str>, style: Option<&str>) -> bool {
    if fill.is_some_and(|f| f.contains("url(")) {
        return true;
    }
    style.is_some_and(|s| {
        s.split(';').any(|decl| {
            decl.split_once(':')
                .is_some_and(|(k, v)| k.trim() == "fill" && v.contains("url("))
        })
    })
}

/// Applies the exclusion rules in order; the first match wins.
pub fn classify(
    bounds: &DiagramBox,
    fill: Option<&str>,
    style: Option<&str>,
    config: &RouteConfig,
) -> Option<Exclusion> {
    if bounds.width <= 0.0 || bounds.height <= 0.0 {
        return Some(Exclusion::Degenerate);
    }
    if bounds.width > config.max_box_width || bounds.height > config.max_box_height {
        return Some(Exclusion::Oversized);
    }
    if fill_references_paint_server(fill, style) {
        return Some(Exclusion::PaintServerFill);
    }
    None
}

/// Resolves a `<rect>` to absolute coordinates, ignoring exclusion rules.
pub fn rect_bounds(rect: Node<'_, '_>) -> DiagramBox {
    let local = DiagramBox::new(
        number_attr(rect, "x"),
        number_attr(rect, "y"),
        number_attr(rect, "width"),
        number_attr(rect, "height"),
    );
    local.translated(ancestor_offset(rect))
}

/// Candidate boxes in document order.
pub fn extract_boxes(doc: &Document<'_>, config: &RouteConfig) -> Vec<DiagramBox> {
    let mut out = Vec::new();
    for rect in doc.descendants().filter(|n| is_svg_element(*n, "rect")) {
        let bounds = rect_bounds(rect);
        match classify(
            &bounds,
            rect.attribute("fill"),
            rect.attribute("style"),
            config,
        ) {
            None => out.push(bounds),
            Some(reason) => {
                tracing::trace!(?reason, x = bounds.x, y = bounds.y, "rect excluded");
            }
        }
    }
    out
}

/// Buckets boxes by `round(y / bucket)`, keyed by the bucket index.
///
/// Halves round to even so that the buckets are stable for coordinates that sit exactly between
/// two rows.
pub fn group_rows(boxes: &[DiagramBox], bucket: f64) -> BTreeMap<i64, Vec<DiagramBox>> {
    let mut rows: BTreeMap<i64, Vec<DiagramBox>> = BTreeMap::new();
    if !(bucket.is_finite() && bucket > 0.0) {
        return rows;
    }
    for b in boxes {
        let key = (b.y / bucket).round_ties_even() as i64;
        rows.entry(key).or_default().push(*b);
    }
    rows
}
