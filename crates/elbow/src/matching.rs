//! Nearest-box matching for connector endpoints.

use crate::config::Policy;
use crate::connector::Connector;
use crate::geom::{DiagramBox, Point, distance};

/// Result of matching a connector against the candidate boxes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Matched {
    /// Directional policy: the boxes the arrow leaves and enters.
    Boxes {
        source: DiagramBox,
        target: DiagramBox,
    },
    /// Attachment policy: endpoints snapped onto edge midpoints.
    Snapped { start: Point, end: Point },
}

/// Index of the box whose `anchor` point is closest to `p`.
///
/// Ties keep the first box in iteration order.
pub fn nearest_box_by<F>(p: Point, boxes: &[DiagramBox], anchor: F) -> Option<usize>
where
    F: Fn(&DiagramBox) -> Point,
{
    let mut best: Option<(usize, f64)> = None;
    for (idx, b) in boxes.iter().enumerate() {
        let d = distance(p, anchor(b));
        if best.is_none_or(|(_, best_d)| d < best_d) {
            best = Some((idx, d));
        }
    }
    best.map(|(idx, _)| idx)
}

/// Box whose bottom-center is nearest to an arrow's start.
pub fn nearest_source(p: Point, boxes: &[DiagramBox]) -> Option<DiagramBox> {
    nearest_box_by(p, boxes, DiagramBox::center_bottom).map(|i| boxes[i])
}

/// Box whose top-center is nearest to an arrow's end.
pub fn nearest_target(p: Point, boxes: &[DiagramBox]) -> Option<DiagramBox> {
    nearest_box_by(p, boxes, DiagramBox::center_top).map(|i| boxes[i])
}

/// Closest edge midpoint over all boxes.
pub fn snap_to_attachment(p: Point, boxes: &[DiagramBox]) -> Option<Point> {
    let mut best: Option<(Point, f64)> = None;
    for ap in boxes.iter().flat_map(DiagramBox::attachment_points) {
        let d = distance(p, ap);
        if best.is_none_or(|(_, best_d)| d < best_d) {
            best = Some((ap, d));
        }
    }
    best.map(|(ap, _)| ap)
}

/// `None` when there are no boxes to match against.
pub fn match_connector(
    connector: &Connector,
    boxes: &[DiagramBox],
    policy: Policy,
) -> Option<Matched> {
    match policy {
        Policy::Directional => Some(Matched::Boxes {
            source: nearest_source(connector.start, boxes)?,
            target: nearest_target(connector.end, boxes)?,
        }),
        Policy::Attachment => Some(Matched::Snapped {
            start: snap_to_attachment(connector.start, boxes)?,
            end: snap_to_attachment(connector.end, boxes)?,
        }),
    }
}
