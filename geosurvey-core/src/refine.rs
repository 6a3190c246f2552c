//! Adaptive mesh refinement (C5): repeatedly inserts edge midpoints
//! into skinny triangles and into edges whose terrain disagrees with a
//! straight-line interpolation between their endpoints, until both
//! criteria are satisfied everywhere or a budget runs out.

use std::collections::HashSet;

use ordered_float::OrderedFloat;

use crate::body::{from_cartesian, BodyHeightOracle};
use crate::error::Diagnostics;
use crate::geometry::{distance, BoundingBox, Point};
use crate::mesh::{self, ProjectionBasis};
use crate::settings::Settings;
use crate::site::Site;
use crate::voronoi::{self, Triangulation};

/// The refined point set and the interior triangles over it, ready for
/// integration (C6).
pub struct RefinedMesh {
    pub points: Vec<Point>,
    pub triangles: Vec<[u32; 3]>,
}

/// Runs the refinement loop starting from an already edge-recovered
/// mesh. `points` is extended in place with new interior
/// (Steiner) points; the original boundary's addresses never move, so
/// the polygon's edges stay intact without re-running edge recovery.
pub fn refine(
    mut points: Vec<Point>,
    mut triangulation: Triangulation,
    basis: &ProjectionBasis,
    body: &dyn BodyHeightOracle,
    settings: &Settings,
    diagnostics: &mut Diagnostics,
) -> RefinedMesh {
    let mut converged = false;

    for _ in 0..settings.max_attempt {
        let interior = mesh::interior_triangles(&triangulation, &points);
        let mut to_split: HashSet<(u32, u32)> = HashSet::new();

        for &[a, b, c] in &interior {
            if let Some(edge) = sleekness_violation(&points, a, b, c, settings) {
                to_split.insert(edge);
            }
            for &(p, q) in &[(a, b), (b, c), (c, a)] {
                if terrain_mismatch(&points, p, q, basis, body, settings) {
                    to_split.insert(normalized_pair(p, q));
                }
            }
        }

        if to_split.is_empty() {
            converged = true;
            break;
        }

        let budget = settings.max_points.saturating_sub(points.len());
        let mut edges: Vec<(u32, u32)> = to_split.into_iter().collect();
        if edges.len() > budget {
            edges.truncate(budget);
        }
        if edges.is_empty() {
            break;
        }

        for (a, b) in &edges {
            points.push(midpoint(points[*a as usize], points[*b as usize]));
        }
        triangulation = triangulate(&points);
    }

    if !converged {
        diagnostics.refinement_budget_exhausted = true;
    }

    let triangles = mesh::interior_triangles(&triangulation, &points);
    RefinedMesh { points, triangles }
}

fn triangulate(points: &[Point]) -> Triangulation {
    let sites: Vec<Site> = points
        .iter()
        .enumerate()
        .map(|(i, p)| Site::new(i as u32, *p))
        .collect();
    let bbox = BoundingBox::around(points, 1.0, 1.0);
    voronoi::run(&sites, &bbox)
}

/// The sleekness test, per the two side-length formulas: a triangle is
/// too sleek if any pair of its sides satisfies
/// `shorter * (1/sin θ) < longer`, or if any cyclic permutation satisfies
/// `a + b < c * (1/cos θ)` (the classic near-collinear sliver check,
/// `c` being the side opposite the permutation's "apex"). A sleek
/// triangle gets its longest side — not the side that tripped the
/// test — queued for a midpoint split.
fn sleekness_violation(points: &[Point], a: u32, b: u32, c: u32, settings: &Settings) -> Option<(u32, u32)> {
    let pa = points[a as usize];
    let pb = points[b as usize];
    let pc = points[c as usize];

    // Side lengths opposite each named vertex: side_a = |bc|, etc.
    let side_a = distance(&pb, &pc).into_inner();
    let side_b = distance(&pa, &pc).into_inner();
    let side_c = distance(&pa, &pb).into_inner();

    let theta = settings.sleekness_radians();
    let inv_sin = 1.0 / theta.sin();
    let inv_cos = 1.0 / theta.cos();

    let too_thin = [(side_a, side_b), (side_b, side_c), (side_c, side_a)]
        .into_iter()
        .any(|(x, y)| {
            let (shorter, longer) = if x <= y { (x, y) } else { (y, x) };
            shorter * inv_sin < longer
        });
    let near_collinear = side_a + side_b < side_c * inv_cos
        || side_b + side_c < side_a * inv_cos
        || side_c + side_a < side_b * inv_cos;

    if !too_thin && !near_collinear {
        return None;
    }

    if side_a >= side_b && side_a >= side_c {
        Some(normalized_pair(b, c))
    } else if side_b >= side_a && side_b >= side_c {
        Some(normalized_pair(a, c))
    } else {
        Some(normalized_pair(a, b))
    }
}

/// Samples the body oracle at the edge's quarter, mid, and
/// three-quarter points and compares each against a straight-line
/// interpolation of the endpoint heights; a ratio beyond
/// `settings.height_diff` queues the edge for a midpoint split.
fn terrain_mismatch(
    points: &[Point],
    a: u32,
    b: u32,
    basis: &ProjectionBasis,
    body: &dyn BodyHeightOracle,
    settings: &Settings,
) -> bool {
    let pa = points[a as usize];
    let pb = points[b as usize];
    let ha = body_height(basis, body, pa);
    let hb = body_height(basis, body, pb);
    if !ha.is_finite() || !hb.is_finite() {
        return false;
    }

    for t in [0.25, 0.5, 0.75] {
        let sample = lerp(pa, pb, t);
        let actual = body_height(basis, body, sample);
        if !actual.is_finite() {
            continue;
        }
        let expected = ha + (hb - ha) * t;
        if height_ratio_exceeds(actual, expected, settings.height_diff) {
            return true;
        }
    }
    false
}

fn height_ratio_exceeds(actual: f64, expected: f64, tolerance: f64) -> bool {
    let (lo, hi) = (actual.min(expected).abs(), actual.max(expected).abs());
    if lo < f64::EPSILON {
        return hi > f64::EPSILON;
    }
    hi / lo > tolerance
}

fn body_height(basis: &ProjectionBasis, body: &dyn BodyHeightOracle, p: Point) -> f64 {
    let cartesian = basis.lift(p);
    let (lng, lat, _) = from_cartesian(cartesian, basis.radius);
    body.height(lng, lat)
}

fn lerp(a: Point, b: Point, t: f64) -> Point {
    Point::new(
        a.x + (b.x - a.x) * OrderedFloat(t),
        a.y + (b.y - a.y) * OrderedFloat(t),
    )
}

fn midpoint(a: Point, b: Point) -> Point {
    lerp(a, b, 0.5)
}

fn normalized_pair(a: u32, b: u32) -> (u32, u32) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::FlatBody;
    use crate::settings::Settings;

    #[test]
    fn sleekness_violation_detects_needle_triangle() {
        let points = vec![
            Point::from_f64(0.0, 0.0),
            Point::from_f64(1.0, 0.0),
            Point::from_f64(0.5, 0.01),
        ];
        let settings = Settings::default();
        assert!(sleekness_violation(&points, 0, 1, 2, &settings).is_some());
    }

    #[test]
    fn sleekness_violation_passes_equilateral() {
        let points = vec![
            Point::from_f64(0.0, 0.0),
            Point::from_f64(1.0, 0.0),
            Point::from_f64(0.5, 0.866_025_4),
        ];
        let settings = Settings::default();
        assert!(sleekness_violation(&points, 0, 1, 2, &settings).is_none());
    }

    #[test]
    fn terrain_mismatch_detects_large_height_jump() {
        let points = vec![Point::from_f64(-0.1, 0.0), Point::from_f64(0.1, 0.0)];
        let basis = ProjectionBasis {
            centroid: nalgebra::Vector3::new(1000.0, 0.0, 0.0),
            normal: nalgebra::Vector3::new(1.0, 0.0, 0.0),
            east: nalgebra::Vector3::new(0.0, 0.0, 1.0),
            north: nalgebra::Vector3::new(0.0, 1.0, 0.0),
            max_dist: 1.0,
            radius: 1000.0,
        };
        let body = |_lng: f64, lat: f64| if lat > 0.0 { 500.0 } else { 0.0 };
        let settings = Settings::default();
        assert!(terrain_mismatch(&points, 0, 1, &basis, &body, &settings));
    }

    #[test]
    fn terrain_mismatch_passes_flat_body() {
        let points = vec![Point::from_f64(-0.1, 0.0), Point::from_f64(0.1, 0.0)];
        let basis = ProjectionBasis {
            centroid: nalgebra::Vector3::new(1000.0, 0.0, 0.0),
            normal: nalgebra::Vector3::new(1.0, 0.0, 0.0),
            east: nalgebra::Vector3::new(0.0, 0.0, 1.0),
            north: nalgebra::Vector3::new(0.0, 1.0, 0.0),
            max_dist: 1.0,
            radius: 1000.0,
        };
        let body = FlatBody { height: 10.0 };
        let settings = Settings::default();
        assert!(!terrain_mismatch(&points, 0, 1, &basis, &body, &settings));
    }

    #[test]
    fn refine_respects_max_points_budget() {
        let points = vec![
            Point::from_f64(0.0, 0.0),
            Point::from_f64(1.0, 0.0),
            Point::from_f64(0.5, 0.02),
        ];
        let triangulation = triangulate(&points);
        let basis = ProjectionBasis {
            centroid: nalgebra::Vector3::new(1000.0, 0.0, 0.0),
            normal: nalgebra::Vector3::new(1.0, 0.0, 0.0),
            east: nalgebra::Vector3::new(0.0, 0.0, 1.0),
            north: nalgebra::Vector3::new(0.0, 1.0, 0.0),
            max_dist: 1.0,
            radius: 1000.0,
        };
        let body = FlatBody { height: 0.0 };
        let mut settings = Settings::default();
        settings.max_points = points.len();
        let mut diagnostics = Diagnostics::default();

        let refined = refine(points.clone(), triangulation, &basis, &body, &settings, &mut diagnostics);
        assert_eq!(refined.points.len(), points.len());
        assert!(diagnostics.refinement_budget_exhausted);
    }
}
