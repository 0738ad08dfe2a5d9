use crate::config::RouteConfig;
use crate::dom::{is_svg_element, number_attr};
use crate::geom::{Point, point};
use regex::Regex;
use roxmltree::Node;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorKind {
    Line,
    Path,
}

/// Raw endpoints of an existing connector element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Connector {
    pub kind: ConnectorKind,
    pub start: Point,
    pub end: Point,
}

fn re_path_token() -> &'static Regex {
    static ONCE: OnceLock<Regex> = OnceLock::new();
    ONCE.get_or_init(|| {
        Regex::new(r"[A-Za-z]|[-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?").unwrap()
    })
}

/// Absolute `M`/`L` coordinate pairs of a path, in order.
///
/// Implicit pairs following a command are included. Numbers belonging to any other command
/// (relative ones included) are ignored.
pub fn move_line_pairs(d: &str) -> Vec<Point> {
    let mut pairs = Vec::new();
    let mut absolute_move_line = false;
    let mut pending: Option<f64> = None;
    for tok in re_path_token().find_iter(d) {
        let tok = tok.as_str();
        if tok.len() == 1 && tok.as_bytes()[0].is_ascii_alphabetic() {
            absolute_move_line = matches!(tok, "M" | "L");
            pending = None;
            continue;
        }
        if !absolute_move_line {
            continue;
        }
        let Ok(v) = tok.parse::<f64>() else {
            continue;
        };
        match pending.take() {
            None => pending = Some(v),
            Some(x) => pairs.push(point(x, v)),
        }
    }
    pairs
}

/// First and last absolute `M`/`L` pair, or `None` when fewer than two pairs exist.
pub fn path_endpoints(d: &str) -> Option<(Point, Point)> {
    let pairs = move_line_pairs(d);
    if pairs.len() < 2 {
        return None;
    }
    Some((*pairs.first()?, *pairs.last()?))
}

pub fn line_endpoints(line: Node<'_, '_>) -> (Point, Point) {
    (
        point(number_attr(line, "x1"), number_attr(line, "y1")),
        point(number_attr(line, "x2"), number_attr(line, "y2")),
    )
}

/// Whether `node` is a connector under the config's selection rules.
pub fn connector_kind(node: Node<'_, '_>, config: &RouteConfig) -> Option<ConnectorKind> {
    let kind = if config.select_paths && is_svg_element(node, "path") {
        ConnectorKind::Path
    } else if config.select_lines && is_svg_element(node, "line") {
        ConnectorKind::Line
    } else {
        return None;
    };
    if config.require_marker_end && !node.has_attribute("marker-end") {
        return None;
    }
    Some(kind)
}

/// Reads the raw endpoints of a selected connector element.
pub fn read_connector(node: Node<'_, '_>, kind: ConnectorKind) -> Option<Connector> {
    let (start, end) = match kind {
        ConnectorKind::Line => line_endpoints(node),
        ConnectorKind::Path => path_endpoints(node.attribute("d")?)?,
    };
    Some(Connector { kind, start, end })
}
