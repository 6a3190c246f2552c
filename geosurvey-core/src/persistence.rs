//! The tool-placement persistence format. Not part of the
//! measurement core proper — placements for the flag/path/ellipse/
//! dip-strike/polygon tools are owned by the surrounding toolkit — but
//! this is the one contract the core must preserve round-trip, so its
//! shape lives here rather than being re-derived by every caller.

use serde::{Deserialize, Serialize};

/// One lng/lat handle on a tool placement (a polygon corner, a path
/// waypoint, an ellipse control point, ...).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

/// A serialized tool placement. Every field beyond `center` is optional
/// on the wire; missing keys take the defaults documented per field, and
/// unrecognized keys are silently ignored — serde's default behavior for
/// struct deserialization, with no `deny_unknown_fields`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ToolPlacement {
    pub center: LngLat,
    /// Local tangent frame the placement was authored in; `None` means
    /// "derive it from `center`" (the `east/north/normal` tangent basis).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame: Option<[f64; 9]>,
    pub handles: Vec<LngLat>,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_scale_distance")]
    pub scale_distance: f64,
    pub text: String,
    pub minimized: bool,
    /// Extra scalar per handle (e.g. the path tool's height samples);
    /// `positions.len()` need not match `handles.len()` — the core
    /// doesn't interpret this, it only has to preserve it.
    pub positions: Vec<f64>,
}

fn default_color() -> String {
    "#ffffff".to_string()
}

fn default_scale_distance() -> f64 {
    1.0
}

impl Default for ToolPlacement {
    fn default() -> Self {
        Self {
            center: LngLat { lng: 0.0, lat: 0.0 },
            frame: None,
            handles: Vec::new(),
            color: default_color(),
            scale_distance: default_scale_distance(),
            text: String::new(),
            minimized: false,
            positions: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_preserves_recognized_fields() {
        let placement = ToolPlacement {
            center: LngLat { lng: 0.1, lat: 0.2 },
            frame: None,
            handles: vec![LngLat { lng: 0.1, lat: 0.2 }, LngLat { lng: 0.3, lat: 0.4 }],
            color: "#ff00ff".to_string(),
            scale_distance: 2.5,
            text: "survey area".to_string(),
            minimized: true,
            positions: vec![1.0, 2.0, 3.0],
        };

        let json = serde_json::to_string(&placement).unwrap();
        let back: ToolPlacement = serde_json::from_str(&json).unwrap();
        assert_eq!(placement, back);
    }

    #[test]
    fn missing_keys_take_documented_defaults() {
        let json = r#"{"center": {"lng": 1.0, "lat": 2.0}}"#;
        let placement: ToolPlacement = serde_json::from_str(json).unwrap();
        assert_eq!(placement.color, "#ffffff");
        assert_eq!(placement.scale_distance, 1.0);
        assert!(placement.handles.is_empty());
        assert!(!placement.minimized);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let json = r#"{"center": {"lng": 0.0, "lat": 0.0}, "totallyUnknownKey": 123}"#;
        let placement: ToolPlacement = serde_json::from_str(json).unwrap();
        assert_eq!(placement.center, LngLat { lng: 0.0, lat: 0.0 });
    }
}
