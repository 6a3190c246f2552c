//! Recognized settings. Deserialized with `serde`, falling back to
//! the documented default for any key that's absent
//! (`#[serde(default = "...")]` per field rather than a blanket
//! `Default` derive, so each default is documented next to the field it
//! belongs to).

use serde::{Deserialize, Serialize};

use crate::error::SessionError;

fn default_height_diff() -> f64 {
    1.002
}

fn default_max_attempt() -> u32 {
    10
}

fn default_max_points() -> usize {
    1000
}

fn default_sleekness_deg() -> f64 {
    15.0
}

fn default_num_samples() -> u32 {
    16
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Multiplicative terrain tolerance along any refined edge; must be
    /// >= 1.0.
    #[serde(default = "default_height_diff")]
    pub height_diff: f64,
    /// Outer refinement iterations; must be >= 1.
    #[serde(default = "default_max_attempt")]
    pub max_attempt: u32,
    /// Global refinement point budget; must be >= the corner count.
    #[serde(default = "default_max_points")]
    pub max_points: usize,
    /// Minimum triangle angle, in degrees; must be in `(0, 60)`.
    #[serde(default = "default_sleekness_deg")]
    pub sleekness_deg: f64,
    /// Samples per segment; used only by the path/ellipse tools, not by
    /// the polygon engine itself, but carried here since it is part of
    /// the same recognized settings document.
    #[serde(default = "default_num_samples")]
    pub num_samples: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            height_diff: default_height_diff(),
            max_attempt: default_max_attempt(),
            max_points: default_max_points(),
            sleekness_deg: default_sleekness_deg(),
            num_samples: default_num_samples(),
        }
    }
}

impl Settings {
    /// Validates the documented ranges, given the polygon's corner
    /// count (a lower bound for `max_points`).
    pub fn validate(&self, corner_count: usize) -> Result<(), SessionError> {
        if self.height_diff < 1.0 {
            return Err(SessionError::InvalidSettings {
                field: "height_diff",
                reason: format!("must be >= 1.0, got {}", self.height_diff),
            });
        }
        if self.max_attempt < 1 {
            return Err(SessionError::InvalidSettings {
                field: "max_attempt",
                reason: "must be >= 1".to_string(),
            });
        }
        if self.max_points < corner_count {
            return Err(SessionError::InvalidSettings {
                field: "max_points",
                reason: format!("must be >= corner count ({corner_count})"),
            });
        }
        if !(self.sleekness_deg > 0.0 && self.sleekness_deg < 60.0) {
            return Err(SessionError::InvalidSettings {
                field: "sleekness",
                reason: "must be strictly between 0 and 60 degrees".to_string(),
            });
        }
        Ok(())
    }

    pub fn sleekness_radians(&self) -> f64 {
        self.sleekness_deg.to_radians()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let s = Settings::default();
        assert_eq!(s.height_diff, 1.002);
        assert_eq!(s.max_attempt, 10);
        assert_eq!(s.max_points, 1000);
        assert_eq!(s.sleekness_deg, 15.0);
    }

    #[test]
    fn missing_keys_in_json_fall_back_to_defaults() {
        let parsed: Settings = serde_json::from_str(r#"{"max_attempt": 3}"#).unwrap();
        assert_eq!(parsed.max_attempt, 3);
        assert_eq!(parsed.height_diff, Settings::default().height_diff);
    }

    #[test]
    fn rejects_out_of_range_sleekness() {
        let s = Settings {
            sleekness_deg: 75.0,
            ..Settings::default()
        };
        assert!(s.validate(4).is_err());
    }

    #[test]
    fn rejects_max_points_below_corner_count() {
        let s = Settings {
            max_points: 2,
            ..Settings::default()
        };
        assert!(s.validate(4).is_err());
    }
}
