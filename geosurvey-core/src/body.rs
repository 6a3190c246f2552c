//! External collaborator contracts: the body height oracle and the
//! spherical cartesian/geodetic converters. These are consumed, not
//! defined, by the engine — the surrounding toolkit owns the textured
//! ellipsoid and its renderer; the core only needs a pure function back
//! from it.

use nalgebra::Vector3;

/// A synchronous, pure, deterministic terrain-height source.
/// `lng ∈ [-π, π]`, `lat ∈ [-π/2, π/2]`; returns meters. Implementations
/// must never block — the engine is single-threaded per invocation
/// and calls this inline during integration and refinement.
pub trait BodyHeightOracle {
    fn height(&self, lng: f64, lat: f64) -> f64;
}

/// A flat, constant-height body — useful for testing the area/volume
/// pipeline in isolation from any real terrain data.
pub struct FlatBody {
    pub height: f64,
}

impl BodyHeightOracle for FlatBody {
    fn height(&self, _lng: f64, _lat: f64) -> f64 {
        self.height
    }
}

impl<F> BodyHeightOracle for F
where
    F: Fn(f64, f64) -> f64,
{
    fn height(&self, lng: f64, lat: f64) -> f64 {
        self(lng, lat)
    }
}

/// Converts `(lng, lat, height)` on a sphere of radius `r` to cartesian
/// coordinates. Ellipsoidal bodies are approximated by `r = r_x`.
pub fn to_cartesian(lng: f64, lat: f64, r: f64, h: f64) -> Vector3<f64> {
    let radius = r + h;
    let cos_lat = lat.cos();
    Vector3::new(
        radius * cos_lat * lng.cos(),
        radius * lat.sin(),
        radius * cos_lat * lng.sin(),
    )
}

/// Inverse of [`to_cartesian`]: recovers `(lng, lat, height)` for a point
/// assumed to lie near a sphere of radius `r`.
pub fn from_cartesian(p: Vector3<f64>, r: f64) -> (f64, f64, f64) {
    let radius = p.norm();
    let lng = p.z.atan2(p.x);
    let lat = (p.y / radius.max(f64::EPSILON)).clamp(-1.0, 1.0).asin();
    (lng, lat, radius - r)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn round_trips_through_cartesian() {
        let (lng, lat, h) = (0.3, -0.2, 12.5);
        let p = to_cartesian(lng, lat, 1000.0, h);
        let (lng2, lat2, h2) = from_cartesian(p, 1000.0);
        assert_relative_eq!(lng, lng2, epsilon = 1e-9);
        assert_relative_eq!(lat, lat2, epsilon = 1e-9);
        assert_relative_eq!(h, h2, epsilon = 1e-6);
    }

    #[test]
    fn flat_body_always_returns_configured_height() {
        let body = FlatBody { height: 42.0 };
        assert_eq!(body.height(0.1, 0.2), 42.0);
        assert_eq!(body.height(-1.0, 1.0), 42.0);
    }
}
