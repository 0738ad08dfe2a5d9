use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

/// How connector endpoints are matched to boxes and how the new path is shaped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    /// Arrow semantics: the source sits above the target. Start snaps to the nearest
    /// bottom-center, end to the nearest top-center, and cross-row arrows step down by the
    /// clearance before turning.
    #[default]
    Directional,
    /// Generic connectors: each endpoint snaps to the nearest edge midpoint of any box and the
    /// two points are joined with a single bend.
    Attachment,
}

impl FromStr for Policy {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "directional" | "arrow" | "arrows" => Ok(Self::Directional),
            "attachment" | "attach" | "snap" => Ok(Self::Attachment),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for Policy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Policy::Directional => f.write_str("directional"),
            Policy::Attachment => f.write_str("attachment"),
        }
    }
}

/// Attribute normalization applied to every rerouted connector.
///
/// `None` leaves the attribute as it was.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectorStyle {
    /// Overwrites `stroke-dasharray`.
    pub dash_array: Option<String>,
    /// Overwrites `stroke-width`.
    pub stroke_width: Option<String>,
    /// Sets `opacity` only when the connector has none.
    pub default_opacity: Option<String>,
    /// Points `marker-end` at the document's first `<marker id>`.
    pub ensure_marker_end: bool,
    /// Marker id used when the document declares no marker.
    pub fallback_marker_id: String,
}

impl Default for ConnectorStyle {
    fn default() -> Self {
        Self::directional()
    }
}

impl ConnectorStyle {
    pub fn directional() -> Self {
        Self {
            dash_array: Some("1.5,1.5".to_string()),
            stroke_width: Some("0.5".to_string()),
            default_opacity: Some("0.8".to_string()),
            ensure_marker_end: true,
            fallback_marker_id: "arrowhead".to_string(),
        }
    }

    /// Geometry only: the connector keeps its own decoration.
    pub fn untouched() -> Self {
        Self {
            dash_array: None,
            stroke_width: None,
            default_opacity: None,
            ensure_marker_end: false,
            fallback_marker_id: "arrowhead".to_string(),
        }
    }
}

/// Layout rules for one rewrite pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    pub policy: Policy,
    /// Rects wider than this are treated as background panels.
    pub max_box_width: f64,
    /// Rects taller than this are treated as background panels.
    pub max_box_height: f64,
    /// Boxes whose top edges differ by less than this are on the same row.
    pub same_row_threshold: f64,
    /// Vertical step below the source box before any horizontal run.
    pub clearance: f64,
    /// Horizontal misalignment up to this is drawn as a straight drop.
    pub align_tolerance: f64,
    /// Bucket height for [`crate::boxes::group_rows`].
    pub row_bucket: f64,
    /// Documents with fewer candidate boxes are skipped.
    pub min_boxes: usize,
    pub select_paths: bool,
    pub select_lines: bool,
    /// Only elements carrying a `marker-end` attribute count as connectors.
    pub require_marker_end: bool,
    pub style: ConnectorStyle,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self::for_policy(Policy::Directional)
    }
}

impl RouteConfig {
    pub fn for_policy(policy: Policy) -> Self {
        let base = Self {
            policy,
            max_box_width: 500.0,
            max_box_height: 300.0,
            same_row_threshold: 30.0,
            clearance: 4.0,
            align_tolerance: 1.0,
            row_bucket: 20.0,
            min_boxes: 2,
            select_paths: true,
            select_lines: false,
            require_marker_end: true,
            style: ConnectorStyle::directional(),
        };
        match policy {
            Policy::Directional => base,
            Policy::Attachment => Self {
                select_paths: false,
                select_lines: true,
                require_marker_end: false,
                style: ConnectorStyle::untouched(),
                ..base
            },
        }
    }

    /// Overlays a JSON config on the defaults of the policy it names (or `fallback` when the
    /// document does not name one).
    pub fn from_json_str(text: &str, fallback: Policy) -> Result<Self> {
        let incoming: Value = serde_json::from_str(text)?;
        let policy = match incoming.get("policy") {
            Some(v) => serde_json::from_value::<Policy>(v.clone())?,
            None => fallback,
        };
        let mut merged = serde_json::to_value(Self::for_policy(policy))?;
        deep_merge_value(&mut merged, &incoming);
        Ok(serde_json::from_value(merged)?)
    }
}

fn deep_merge_value(base: &mut Value, incoming: &Value) {
    match (base, incoming) {
        (Value::Object(base_map), Value::Object(in_map)) => {
            for (key, in_value) in in_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge_value(base_value, in_value),
                    None => {
                        base_map.insert(key.clone(), in_value.clone());
                    }
                }
            }
        }
        (base_slot, in_value) => {
            *base_slot = in_value.clone();
        }
    }
}
