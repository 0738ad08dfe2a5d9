//! Right-angle path routing and path-data formatting.

use crate::config::RouteConfig;
use crate::geom::{DiagramBox, Point, point};
use crate::matching::Matched;
use std::fmt::Write as _;

/// How consecutive waypoints are written as path commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segments {
    /// `M x y L x y ...` through every waypoint.
    LineTo,
    /// `M x1 y1 H x2 V y2` (waypoints: start, bend at `(x2, y1)`, end).
    HorizontalThenVertical,
    /// `M x1 y1 V y2 H x2` (waypoints: start, bend at `(x1, y2)`, end).
    VerticalThenHorizontal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoutedPath {
    pub waypoints: Vec<Point>,
    pub segments: Segments,
}

/// Formats a coordinate with one decimal; negative zero prints as `0.0`.
pub fn format_coord(v: f64) -> String {
    let rounded = (v * 10.0).round() / 10.0;
    let v = if rounded == 0.0 { 0.0 } else { v };
    format!("{v:.1}")
}

impl RoutedPath {
    pub fn start(&self) -> Option<Point> {
        self.waypoints.first().copied()
    }

    pub fn end(&self) -> Option<Point> {
        self.waypoints.last().copied()
    }

    /// Number of right-angle turns.
    pub fn bends(&self) -> usize {
        self.waypoints.len().saturating_sub(2)
    }

    /// Path data, space separated, one decimal per coordinate.
    pub fn to_path_data(&self) -> String {
        let mut out = String::new();
        let Some(first) = self.waypoints.first() else {
            return out;
        };
        let _ = write!(out, "M {} {}", format_coord(first.x), format_coord(first.y));
        match self.segments {
            Segments::LineTo => {
                for p in &self.waypoints[1..] {
                    let _ = write!(out, " L {} {}", format_coord(p.x), format_coord(p.y));
                }
            }
            Segments::HorizontalThenVertical => {
                if let Some(end) = self.waypoints.last().filter(|_| self.waypoints.len() > 1) {
                    let _ = write!(out, " H {} V {}", format_coord(end.x), format_coord(end.y));
                }
            }
            Segments::VerticalThenHorizontal => {
                if let Some(end) = self.waypoints.last().filter(|_| self.waypoints.len() > 1) {
                    let _ = write!(out, " V {} H {}", format_coord(end.y), format_coord(end.x));
                }
            }
        }
        out
    }
}

/// Boxes whose top edges are closer than the threshold share a row.
pub fn is_same_row(source: &DiagramBox, target: &DiagramBox, config: &RouteConfig) -> bool {
    (source.y - target.y).abs() < config.same_row_threshold
}

/// Directional routing between two matched boxes.
///
/// Same-row arrows run center to center. Otherwise the arrow leaves the source's bottom-center,
/// drops by the clearance, runs horizontally when the target is not aligned, and ends on the
/// target's top-center.
pub fn route_directional(
    source: &DiagramBox,
    target: &DiagramBox,
    config: &RouteConfig,
) -> RoutedPath {
    if is_same_row(source, target, config) {
        return RoutedPath {
            waypoints: vec![source.center(), target.center()],
            segments: Segments::LineTo,
        };
    }

    let start = source.center_bottom();
    let end = target.center_top();
    let step = point(start.x, start.y + config.clearance);
    let waypoints = if (step.x - end.x).abs() > config.align_tolerance {
        vec![start, step, point(end.x, step.y), end]
    } else {
        vec![start, step, end]
    };
    RoutedPath {
        waypoints,
        segments: Segments::LineTo,
    }
}

/// Picks the bend for a single-bend route by comparing the two candidate lengths.
///
/// Both candidates always have the same Manhattan length, so the comparison settles on
/// horizontal-first every time. The comparison is kept so that a real preference can replace
/// it without touching callers.
pub fn choose_bend(start: Point, end: Point) -> Segments {
    let horizontal_first = (end.x - start.x).abs() + (end.y - start.y).abs();
    let vertical_first = horizontal_first;
    if horizontal_first <= vertical_first {
        Segments::HorizontalThenVertical
    } else {
        Segments::VerticalThenHorizontal
    }
}

/// Attachment-point routing: exactly one bend between two snapped points.
pub fn route_single_bend(start: Point, end: Point) -> RoutedPath {
    let segments = choose_bend(start, end);
    let bend = match segments {
        Segments::VerticalThenHorizontal => point(start.x, end.y),
        Segments::HorizontalThenVertical | Segments::LineTo => point(end.x, start.y),
    };
    RoutedPath {
        waypoints: vec![start, bend, end],
        segments,
    }
}

pub fn route(matched: &Matched, config: &RouteConfig) -> RoutedPath {
    match matched {
        Matched::Boxes { source, target } => route_directional(source, target, config),
        Matched::Snapped { start, end } => route_single_bend(*start, *end),
    }
}
