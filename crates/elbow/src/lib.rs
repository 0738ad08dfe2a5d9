#![forbid(unsafe_code)]

//! Reroutes connector arrows in SVG diagrams into right-angle paths between boxes.
//!
//! A pass over one document:
//! - collects candidate boxes (`<rect>` resolved through ancestor `translate(..)` offsets,
//!   minus background panels and gradient fills),
//! - matches each connector's endpoints to boxes under a [`Policy`],
//! - routes a new axis-aligned path and splices it, with normalized decoration, back into the
//!   source text. Bytes outside the rewritten connectors are preserved.
//!
//! ```
//! use elbow::{Policy, Rewrite, RouteConfig, rewrite_svg};
//!
//! let svg = r#"<svg xmlns="http://www.w3.org/2000/svg">
//!   <rect x="0" y="0" width="100" height="40"/>
//!   <rect x="0" y="100" width="100" height="40"/>
//!   <line x1="50" y1="40" x2="50" y2="100"/>
//! </svg>"#;
//! let config = RouteConfig::for_policy(Policy::Attachment);
//! let Rewrite::Changed { svg: out, .. } = rewrite_svg(svg, &config).unwrap() else {
//!     panic!("expected a rewrite");
//! };
//! assert!(out.contains(r#"d="M 50.0 40.0 H 50.0 V 100.0""#));
//! ```

pub mod batch;
pub mod boxes;
pub mod config;
pub mod connector;
pub mod dom;
pub mod error;
pub mod geom;
pub mod matching;
pub mod repair;
pub mod rewrite;
pub mod route;

pub use batch::{
    BatchOptions, BatchReport, FilePattern, FileReport, FileStatus, Job, discover, process_file,
    run_batch,
};
pub use boxes::extract_boxes;
pub use config::{ConnectorStyle, Policy, RouteConfig};
pub use connector::{Connector, ConnectorKind};
pub use error::{Error, Result};
pub use geom::{DiagramBox, Point, Side};
pub use matching::{Matched, match_connector};
pub use rewrite::{ConnectorCounts, Rewrite, Skip, rewrite_svg};
pub use route::{RoutedPath, Segments, route};
