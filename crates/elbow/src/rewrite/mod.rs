//! Document rewrite: builds a replacement plan over the parsed tree, then splices the new
//! connector tags into the source text.

mod tag;

use crate::boxes::{extract_boxes, group_rows};
use crate::config::{ConnectorStyle, RouteConfig};
use crate::connector::{ConnectorKind, connector_kind, read_connector};
use crate::dom::{first_marker_id, parse};
use crate::error::Result;
use crate::matching::match_connector;
use crate::repair::escape_bare_ampersands;
use crate::route::{RoutedPath, route};
use roxmltree::{Document, Node};
use std::borrow::Cow;
use std::ops::Range;
use tag::{TagBuilder, prefix_of};

/// Visual attributes carried over when a `<line>` becomes a `<path>`.
pub const LINE_COPY_ATTRIBUTES: [&str; 6] = [
    "stroke",
    "stroke-width",
    "fill",
    "marker-start",
    "marker-end",
    "stroke-dasharray",
];

/// Why a document was left as it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Skip {
    TooFewBoxes { found: usize },
    NoConnectors,
    NoRoutableConnectors,
    AlreadyNormalized,
}

impl std::fmt::Display for Skip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Skip::TooFewBoxes { found } => write!(f, "not enough boxes found ({found})"),
            Skip::NoConnectors => f.write_str("no connectors found"),
            Skip::NoRoutableConnectors => f.write_str("no routable connectors"),
            Skip::AlreadyNormalized => f.write_str("connectors already normalized"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectorCounts {
    pub fixed: usize,
    pub not_fixed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rewrite {
    Changed {
        svg: String,
        counts: ConnectorCounts,
    },
    Unchanged {
        reason: Skip,
        counts: ConnectorCounts,
    },
}

impl Rewrite {
    pub fn is_changed(&self) -> bool {
        matches!(self, Rewrite::Changed { .. })
    }

    pub fn counts(&self) -> ConnectorCounts {
        match self {
            Rewrite::Changed { counts, .. } | Rewrite::Unchanged { counts, .. } => *counts,
        }
    }

    /// Output text: the rewritten document, or `input` itself when nothing changed.
    pub fn text<'a>(&'a self, input: &'a str) -> &'a str {
        match self {
            Rewrite::Changed { svg, .. } => svg,
            Rewrite::Unchanged { .. } => input,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Edit {
    range: Range<usize>,
    replacement: String,
}

fn apply_style(tag: &mut TagBuilder<'_>, style: &ConnectorStyle, marker_url: &str) {
    if let Some(dash) = &style.dash_array {
        tag.set("stroke-dasharray", dash.as_str());
    }
    if let Some(width) = &style.stroke_width {
        tag.set("stroke-width", width.as_str());
    }
    if style.ensure_marker_end {
        tag.set("marker-end", marker_url);
    }
    if let Some(opacity) = &style.default_opacity {
        tag.set_if_absent("opacity", opacity.as_str());
    }
}

/// New start tag for an existing `<path>`; only the start tag is replaced.
fn path_edit(
    source: &str,
    node: Node<'_, '_>,
    routed: &RoutedPath,
    config: &RouteConfig,
    marker_url: &str,
) -> Option<Edit> {
    let start = node.range().start;
    let (mut tag, len) = TagBuilder::lex(&source[start..])?;
    tag.set("d", routed.to_path_data());
    apply_style(&mut tag, &config.style, marker_url);
    Some(Edit {
        range: start..start + len,
        replacement: tag.finish(),
    })
}

/// Replaces a whole `<line>` element with a self-closing `<path>`.
fn line_edit(
    source: &str,
    node: Node<'_, '_>,
    routed: &RoutedPath,
    config: &RouteConfig,
    marker_url: &str,
) -> Option<Edit> {
    let range = node.range();
    let (line_tag, _) = TagBuilder::lex(&source[range.start..])?;
    let mut tag = TagBuilder::new_element(format!("{}path", prefix_of(line_tag.qname())));
    tag.set("d", routed.to_path_data());
    for name in LINE_COPY_ATTRIBUTES {
        if let Some(value) = node.attribute(name) {
            tag.set(name, value);
        }
    }
    if node.attribute("fill").is_none_or(|f| f == "none") {
        tag.set("fill", "none");
    }
    apply_style(&mut tag, &config.style, marker_url);
    Some(Edit {
        range,
        replacement: tag.finish(),
    })
}

fn apply_edits(source: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by_key(|e| e.range.start);
    let mut out = String::with_capacity(source.len() + edits.len() * 32);
    let mut last = 0usize;
    for edit in edits {
        if edit.range.start < last {
            tracing::debug!(at = edit.range.start, "overlapping connector edit dropped");
            continue;
        }
        out.push_str(&source[last..edit.range.start]);
        out.push_str(&edit.replacement);
        last = edit.range.end;
    }
    out.push_str(&source[last..]);
    out
}

/// Reroutes every selected connector in `input`.
///
/// Documents that end up with no effective edit are reported as [`Rewrite::Unchanged`] and the
/// caller keeps the input bytes as they are. Bare ampersands are escaped only when `input` does
/// not parse as it is.
pub fn rewrite_svg(input: &str, config: &RouteConfig) -> Result<Rewrite> {
    match parse(input) {
        Ok(doc) => rewrite_document(input, &doc, config),
        Err(err) => {
            let Cow::Owned(repaired) = escape_bare_ampersands(input) else {
                return Err(err);
            };
            tracing::debug!("escaped bare ampersands after a failed parse");
            let doc = parse(&repaired)?;
            rewrite_document(&repaired, &doc, config)
        }
    }
}

fn rewrite_document(source: &str, doc: &Document<'_>, config: &RouteConfig) -> Result<Rewrite> {
    let boxes = extract_boxes(doc, config);
    if boxes.len() < config.min_boxes {
        return Ok(Rewrite::Unchanged {
            reason: Skip::TooFewBoxes { found: boxes.len() },
            counts: ConnectorCounts::default(),
        });
    }
    tracing::debug!(
        boxes = boxes.len(),
        rows = group_rows(&boxes, config.row_bucket).len(),
        "candidate boxes"
    );

    let connectors: Vec<(Node<'_, '_>, ConnectorKind)> = doc
        .descendants()
        .filter_map(|n| connector_kind(n, config).map(|k| (n, k)))
        .collect();
    if connectors.is_empty() {
        return Ok(Rewrite::Unchanged {
            reason: Skip::NoConnectors,
            counts: ConnectorCounts::default(),
        });
    }

    let marker_id = first_marker_id(doc).unwrap_or(config.style.fallback_marker_id.as_str());
    let marker_url = format!("url(#{marker_id})");

    let mut counts = ConnectorCounts::default();
    let mut edits = Vec::new();
    for (node, kind) in connectors {
        let routed = read_connector(node, kind)
            .and_then(|c| match_connector(&c, &boxes, config.policy))
            .map(|m| route(&m, config));
        let Some(routed) = routed else {
            tracing::debug!(at = node.range().start, ?kind, "connector not routable");
            counts.not_fixed += 1;
            continue;
        };
        let edit = match kind {
            ConnectorKind::Path => path_edit(source, node, &routed, config, &marker_url),
            ConnectorKind::Line => line_edit(source, node, &routed, config, &marker_url),
        };
        match edit {
            Some(edit) => {
                tracing::debug!(d = %routed.to_path_data(), ?kind, "connector rerouted");
                counts.fixed += 1;
                edits.push(edit);
            }
            None => {
                tracing::debug!(at = node.range().start, "connector start tag not understood");
                counts.not_fixed += 1;
            }
        }
    }

    if edits.is_empty() {
        return Ok(Rewrite::Unchanged {
            reason: Skip::NoRoutableConnectors,
            counts,
        });
    }
    if edits
        .iter()
        .all(|e| source[e.range.clone()] == *e.replacement)
    {
        return Ok(Rewrite::Unchanged {
            reason: Skip::AlreadyNormalized,
            counts,
        });
    }

    Ok(Rewrite::Changed {
        svg: apply_edits(source, edits),
        counts,
    })
}
