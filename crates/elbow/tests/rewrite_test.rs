use elbow::dom::parse;
use elbow::geom::point;
use elbow::{DiagramBox, Policy, Rewrite, RouteConfig, Skip, extract_boxes, rewrite_svg};

const TWO_ROWS: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="400" height="300" viewBox="0 0 400 300">
  <defs>
    <marker id="arrow" markerWidth="6" markerHeight="6"><path d="M0,0 L6,3 L0,6 z"/></marker>
    <linearGradient id="bg"><stop offset="0"/></linearGradient>
  </defs>
  <rect width="400" height="300" fill="url(#bg)"/>
  <g transform="translate(50, 50)">
    <rect x="0" y="0" width="100" height="40" fill="#fff"/>
    <text x="50" y="25">R&amp;D</text>
  </g>
  <g transform="translate(200,150)">
    <rect x="0" y="0" width="100" height="40" fill="#fff"/>
  </g>
  <path d="M 98 92 L 240 148" stroke="#333" marker-end="url(#old)"/>
</svg>
"##;

fn changed(out: Rewrite) -> String {
    match out {
        Rewrite::Changed { svg, .. } => svg,
        Rewrite::Unchanged { reason, .. } => panic!("expected a change, got: {reason}"),
    }
}

#[test]
fn box_extraction_composes_translate_offsets() {
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg">
      <g transform="translate(10,20)"><rect x="5" y="5" width="30" height="30"/></g>
    </svg>"#;
    let doc = parse(svg).unwrap();
    let boxes = extract_boxes(&doc, &RouteConfig::default());
    assert_eq!(boxes, vec![DiagramBox::new(15.0, 25.0, 30.0, 30.0)]);
}

#[test]
fn box_extraction_sums_nested_groups_once_per_rect() {
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg">
      <g transform="translate(10,20)">
        <g transform="translate(1 2)"><rect x="5" y="5" width="30" height="30"/></g>
        <g transform="scale(2)"><rect width="10" height="10"/></g>
      </g>
      <rect x="7" y="8" width="9" height="9"/>
    </svg>"#;
    let doc = parse(svg).unwrap();
    let boxes = extract_boxes(&doc, &RouteConfig::default());
    assert_eq!(
        boxes,
        vec![
            DiagramBox::new(16.0, 27.0, 30.0, 30.0),
            DiagramBox::new(10.0, 20.0, 10.0, 10.0),
            DiagramBox::new(7.0, 8.0, 9.0, 9.0),
        ]
    );
}

#[test]
fn background_and_gradient_rects_are_never_candidates() {
    let cfg = RouteConfig::default();
    for width in [501.0, 640.0, 1200.5, 10_000.0] {
        let svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><rect width="{width}" height="40"/></svg>"#
        );
        let doc = parse(&svg).unwrap();
        assert!(extract_boxes(&doc, &cfg).is_empty(), "width {width}");
    }
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg"><rect width="10" height="40" fill="url(#g)"/><rect width="0" height="40"/></svg>"#;
    let doc = parse(svg).unwrap();
    assert!(extract_boxes(&doc, &cfg).is_empty());
}

#[test]
fn directional_routes_cross_row_arrows_with_clearance() {
    let out = changed(rewrite_svg(TWO_ROWS, &RouteConfig::default()).unwrap());
    assert!(out.contains(
        r##"<path d="M 100.0 90.0 L 100.0 94.0 L 250.0 94.0 L 250.0 150.0" stroke="#333" marker-end="url(#arrow)" stroke-dasharray="1.5,1.5" stroke-width="0.5" opacity="0.8"/>"##
    ));
    // Everything outside the connector is untouched.
    assert!(out.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
    assert!(out.contains("<text x=\"50\" y=\"25\">R&amp;D</text>"));
    assert!(out.contains(r#"<path d="M0,0 L6,3 L0,6 z"/>"#));
}

#[test]
fn directional_pass_is_idempotent() {
    let cfg = RouteConfig::default();
    let first = changed(rewrite_svg(TWO_ROWS, &cfg).unwrap());
    let second = rewrite_svg(&first, &cfg).unwrap();
    assert_eq!(
        second,
        Rewrite::Unchanged {
            reason: Skip::AlreadyNormalized,
            counts: elbow::ConnectorCounts {
                fixed: 1,
                not_fixed: 0
            },
        }
    );
    assert_eq!(second.text(&first), first);
}

#[test]
fn same_row_arrows_run_center_to_center() {
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg">
      <rect x="0" y="0" width="100" height="40"/>
      <rect x="200" y="10" width="100" height="40"/>
      <path d="M 100 20 L 200 30" marker-end="url(#a)" opacity="0.3"/>
    </svg>"#;
    let out = changed(rewrite_svg(svg, &RouteConfig::default()).unwrap());
    assert!(out.contains(r#"d="M 50.0 20.0 L 250.0 30.0""#));
    // An existing opacity is preserved; the missing marker falls back to `arrowhead`.
    assert!(out.contains(r#"marker-end="url(#arrowhead)""#));
    assert!(out.contains(r#"opacity="0.3""#));
    assert!(!out.contains(r#"opacity="0.8""#));
}

#[test]
fn paths_without_marker_end_are_not_connectors() {
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg">
      <rect x="0" y="0" width="100" height="40"/>
      <rect x="0" y="100" width="100" height="40"/>
      <path d="M 50 40 L 50 100"/>
    </svg>"#;
    assert_eq!(
        rewrite_svg(svg, &RouteConfig::default()).unwrap(),
        Rewrite::Unchanged {
            reason: Skip::NoConnectors,
            counts: Default::default(),
        }
    );
}

#[test]
fn unroutable_paths_are_counted_and_left_alone() {
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg">
      <rect x="0" y="0" width="100" height="40"/>
      <rect x="0" y="100" width="100" height="40"/>
      <path d="M 50 40 V 100" marker-end="url(#a)"/>
      <path d="M 50 40 L 60 100" marker-end="url(#a)"/>
    </svg>"#;
    let out = rewrite_svg(svg, &RouteConfig::default()).unwrap();
    assert_eq!(out.counts().fixed, 1);
    assert_eq!(out.counts().not_fixed, 1);
    let text = changed(out);
    assert!(text.contains(r#"<path d="M 50 40 V 100" marker-end="url(#a)"/>"#));
    assert!(text.contains(r#"d="M 50.0 40.0 L 50.0 44.0 L 50.0 100.0""#));
}

#[test]
fn too_few_boxes_leave_the_document_unchanged() {
    for svg in [
        r#"<svg xmlns="http://www.w3.org/2000/svg"><path d="M 0 0 L 5 5" marker-end="url(#a)"/></svg>"#,
        r#"<svg xmlns="http://www.w3.org/2000/svg"><rect width="10" height="10"/><path d="M 0 0 L 5 5" marker-end="url(#a)"/></svg>"#,
    ] {
        for policy in [Policy::Directional, Policy::Attachment] {
            let out = rewrite_svg(svg, &RouteConfig::for_policy(policy)).unwrap();
            assert!(matches!(
                out,
                Rewrite::Unchanged {
                    reason: Skip::TooFewBoxes { .. },
                    ..
                }
            ));
            assert_eq!(out.text(svg).as_bytes(), svg.as_bytes());
        }
    }
}

#[test]
fn attachment_policy_converts_lines_to_single_bend_paths() {
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg">
  <rect x="0" y="0" width="100" height="40"/>
  <rect x="0" y="100" width="100" height="40"/>
  <line id="c1" x1="50" y1="40" x2="50" y2="100" stroke="black" stroke-width="2" marker-end="url(#m)"></line>
</svg>"#;
    let cfg = RouteConfig::for_policy(Policy::Attachment);
    let out = changed(rewrite_svg(svg, &cfg).unwrap());
    let expected = r#"<path d="M 50.0 40.0 H 50.0 V 100.0" stroke="black" stroke-width="2" marker-end="url(#m)" fill="none"/>"#;
    assert!(out.contains(expected), "{out}");
    assert!(!out.contains("<line"));

    let doc = parse(&out).unwrap();
    let path = doc
        .descendants()
        .find(|n| n.has_tag_name("path"))
        .unwrap();
    let pairs: Vec<_> = path
        .attribute("d")
        .unwrap()
        .split_whitespace()
        .collect();
    assert_eq!(pairs, ["M", "50.0", "40.0", "H", "50.0", "V", "100.0"]);
    let start = point(50.0, 40.0);
    let end = point(50.0, 100.0);
    assert_eq!(
        elbow::route::route_single_bend(start, end).waypoints,
        vec![start, point(50.0, 40.0), end]
    );
}

#[test]
fn attachment_policy_snaps_off_center_endpoints() {
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg">
  <rect x="0" y="0" width="100" height="40"/>
  <rect x="200" y="100" width="100" height="40"/>
  <line x1="95" y1="22" x2="245" y2="101"/>
</svg>"#;
    let cfg = RouteConfig::for_policy(Policy::Attachment);
    let out = changed(rewrite_svg(svg, &cfg).unwrap());
    assert!(out.contains(r#"<path d="M 100.0 20.0 H 250.0 V 100.0" fill="none"/>"#), "{out}");
}

#[test]
fn directional_policy_can_also_take_lines() {
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg">
  <defs><marker id="tip"/></defs>
  <rect x="0" y="0" width="100" height="40"/>
  <rect x="150" y="100" width="100" height="40"/>
  <line x1="50" y1="40" x2="200" y2="100" stroke="gray" class="edge"/>
</svg>"#;
    let mut cfg = RouteConfig::default();
    cfg.select_lines = true;
    cfg.require_marker_end = false;
    let out = changed(rewrite_svg(svg, &cfg).unwrap());
    assert!(out.contains(
        r#"<path d="M 50.0 40.0 L 50.0 44.0 L 200.0 44.0 L 200.0 100.0" stroke="gray" fill="none" stroke-dasharray="1.5,1.5" stroke-width="0.5" marker-end="url(#tip)" opacity="0.8"/>"#
    ), "{out}");
    let again = rewrite_svg(&out, &cfg).unwrap();
    assert_eq!(again.text(&out), out);
}

#[test]
fn bare_ampersands_are_repaired_when_parsing_fails() {
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg">
  <rect x="0" y="0" width="100" height="40"/>
  <rect x="0" y="100" width="100" height="40"/>
  <text>Q&A</text>
  <path d="M 50 40 L 50 100" marker-end="url(#a)"/>
</svg>"#;
    let out = changed(rewrite_svg(svg, &RouteConfig::default()).unwrap());
    assert!(out.contains("<text>Q&amp;A</text>"));
}

#[test]
fn malformed_documents_fail() {
    assert!(rewrite_svg("<svg><rect></svg>", &RouteConfig::default()).is_err());
}

#[test]
fn valid_documents_keep_cdata_and_comments_byte_for_byte() {
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg">
  <style><![CDATA[ text::after { content: "R & D"; } ]]></style>
  <script><![CDATA[ if (a && b) { run(); } ]]></script>
  <!-- R & D -->
  <rect x="0" y="0" width="100" height="40"/>
  <rect x="0" y="100" width="100" height="40"/>
  <path d="M 50 40 L 50 100" marker-end="url(#a)"/>
</svg>"#;
    let out = changed(rewrite_svg(svg, &RouteConfig::default()).unwrap());
    assert!(out.contains("<script><![CDATA[ if (a && b) { run(); } ]]></script>"), "{out}");
    assert!(out.contains(r#"content: "R & D";"#), "{out}");
    assert!(out.contains("<!-- R & D -->"), "{out}");
    assert!(out.contains(r#"d="M 50.0 40.0 L 50.0 44.0 L 50.0 100.0""#));
}

#[test]
fn repair_of_invalid_documents_leaves_cdata_alone() {
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg">
  <script><![CDATA[ if (a && b) { run(); } ]]></script>
  <text>Q&A</text>
  <rect x="0" y="0" width="100" height="40"/>
  <rect x="0" y="100" width="100" height="40"/>
  <path d="M 50 40 L 50 100" marker-end="url(#a)"/>
</svg>"#;
    let out = changed(rewrite_svg(svg, &RouteConfig::default()).unwrap());
    assert!(out.contains("<text>Q&amp;A</text>"));
    assert!(out.contains("<![CDATA[ if (a && b) { run(); } ]]>"), "{out}");
}

#[test]
fn existing_arrow_decoration_is_overwritten() {
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg">
  <rect x="0" y="0" width="100" height="40"/>
  <rect x="0" y="100" width="100" height="40"/>
  <path d="M 50 40 L 50 100" stroke-dasharray="5,5" stroke-width="2" marker-end="url(#a)"/>
</svg>"#;
    let out = changed(rewrite_svg(svg, &RouteConfig::default()).unwrap());
    assert!(
        out.contains(
            r#"<path d="M 50.0 40.0 L 50.0 44.0 L 50.0 100.0" stroke-dasharray="1.5,1.5" stroke-width="0.5" marker-end="url(#arrowhead)" opacity="0.8"/>"#
        ),
        "{out}"
    );
    assert!(!out.contains("5,5"));
    assert!(!out.contains(r#"stroke-width="2""#));
}
