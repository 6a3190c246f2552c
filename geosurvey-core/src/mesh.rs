//! Polygon mesh construction and repair (C4): projects the user's
//! 3D corners to a 2D tangent-plane disk, triangulates them, and iterates
//! inserting intersection points until every polygon edge survives into
//! the Delaunay dual (or the iteration budget runs out), then filters
//! the triangulation down to the triangles actually inside the polygon.

use std::collections::BTreeMap;

use nalgebra::Vector3;
use ordered_float::OrderedFloat;

use crate::error::Diagnostics;
use crate::geometry::{distance, segment_intersection, BoundingBox, Point};
use crate::site::Site;
use crate::voronoi::{self, Triangulation};

/// The safety band near-endpoint intersection crossings are rejected
/// with, relative to each segment's own length.
pub const INTERSECTION_SAFETY_BAND: f64 = 0.01;
/// Maximum edge-recovery iterations before giving up and flagging
/// `EdgeRecoveryExhausted`.
pub const MAX_EDGE_RECOVERY_ITERATIONS: usize = 5;
/// Fuzzy band for the point-in-polygon test, in projected-plane units:
/// a query point within this distance of a boundary edge counts as
/// interior.
pub const INTERIOR_TEST_EPSILON: f64 = 0.001;

/// The tangent-plane basis a polygon was projected through, kept
/// around so the refiner and integrator can lift refined points back to
/// the body the same way.
#[derive(Debug, Clone, Copy)]
pub struct ProjectionBasis {
    pub centroid: Vector3<f64>,
    pub normal: Vector3<f64>,
    pub east: Vector3<f64>,
    pub north: Vector3<f64>,
    pub max_dist: f64,
    pub radius: f64,
}

impl ProjectionBasis {
    /// Lifts a point from the unit-disk plane coordinates back onto the
    /// body's sphere of radius `radius`.
    pub fn lift(&self, p: Point) -> Vector3<f64> {
        let (x, y) = (p.x.into_inner(), p.y.into_inner());
        let offset = self.east * (x * self.max_dist) + self.north * (y * self.max_dist);
        (self.centroid + offset).normalize() * self.radius
    }
}

/// Builds the deterministic tangent basis: `north` is
/// chosen so `n . north = 0` and `east = -(n x north)`, flipped so the
/// basis is consistent across the southern hemisphere.
fn tangent_basis(normal: Vector3<f64>) -> (Vector3<f64>, Vector3<f64>) {
    let mut north = if normal.y.abs() < f64::EPSILON {
        Vector3::new(0.0, 1.0, 0.0)
    } else {
        let y_north = (normal.x * normal.x + normal.z * normal.z) / normal.y;
        Vector3::new(-normal.x, y_north, -normal.z).normalize()
    };
    if normal.y < 0.0 {
        north = -north;
    }
    let east = -(normal.cross(&north));
    (east.normalize(), north)
}

/// Projects the user's 3D corners into the unit disk. Returns
/// `None` when the polygon's extent exceeds one hemisphere (`d > r`),
/// which the façade surfaces as `Diagnostics::polygon_too_large`.
pub fn project_polygon(corners: &[Vector3<f64>], radius: f64) -> Option<(ProjectionBasis, Vec<Point>)> {
    if corners.is_empty() || radius <= 0.0 {
        return None;
    }

    let centroid: Vector3<f64> =
        corners.iter().fold(Vector3::zeros(), |acc, p| acc + p) / corners.len() as f64;
    let normal = centroid.normalize();

    let d = corners
        .iter()
        .map(|p| (p - centroid).norm())
        .fold(0.0_f64, f64::max);
    if d > radius {
        return None;
    }

    let (east, north) = tangent_basis(normal);
    let max_dist = 1.2 * radius * d / (radius * radius - d * d).max(f64::EPSILON).sqrt();
    if !max_dist.is_finite() || max_dist <= 0.0 {
        return None;
    }

    let plane_point = normal * radius;
    let mut sites = Vec::with_capacity(corners.len());
    for p in corners {
        let rel = p - plane_point;
        let x = rel.dot(&east) / max_dist;
        let y = rel.dot(&north) / max_dist;
        sites.push(Point::from_f64(x, y));
    }

    // Filter duplicate consecutive points before assigning addresses.
    let mut deduped: Vec<Point> = Vec::with_capacity(sites.len());
    for p in sites {
        if deduped.last().map(|last| points_equal(*last, p)) != Some(true) {
            deduped.push(p);
        }
    }
    if deduped.len() > 1 && points_equal(deduped[0], *deduped.last().unwrap()) {
        deduped.pop();
    }

    let basis = ProjectionBasis {
        centroid,
        normal,
        east,
        north,
        max_dist,
        radius,
    };
    Some((basis, deduped))
}

fn points_equal(a: Point, b: Point) -> bool {
    a.x == b.x && a.y == b.y
}

/// Result of the edge-recovery loop: the final, possibly-extended
/// cyclic corner list and the last triangulation run over it.
pub struct RecoveredMesh {
    pub boundary: Vec<Point>,
    pub triangulation: Triangulation,
}

/// Runs C2+C3 over `boundary`, inserting intersection points for any
/// polygon edge missing from the Delaunay dual, up to
/// `MAX_EDGE_RECOVERY_ITERATIONS` times.
pub fn recover_edges(mut boundary: Vec<Point>, diagnostics: &mut Diagnostics) -> RecoveredMesh {
    let mut triangulation = Triangulation::default();

    for _ in 0..MAX_EDGE_RECOVERY_ITERATIONS {
        let sites: Vec<Site> = boundary
            .iter()
            .enumerate()
            .map(|(i, p)| Site::new(i as u32, *p))
            .collect();
        let bbox = BoundingBox::around(&boundary, 1.0, 1.0);
        triangulation = voronoi::run(&sites, &bbox);

        let n = boundary.len() as u32;
        let missing: Vec<u32> = (0..n)
            .filter(|&i| !triangulation.has_edge(i, (i + 1) % n))
            .collect();
        if missing.is_empty() {
            return RecoveredMesh {
                boundary,
                triangulation,
            };
        }

        let mut insertions: BTreeMap<usize, Vec<Point>> = BTreeMap::new();
        for &i in &missing {
            let j = (i + 1) % n;
            let edge = [boundary[i as usize], boundary[j as usize]];

            let mut hits: Vec<Point> = triangulation
                .delaunay_edges
                .iter()
                .filter_map(|&(a, b)| {
                    let candidate = [boundary[a as usize], boundary[b as usize]];
                    segment_intersection(edge, candidate, INTERSECTION_SAFETY_BAND)
                })
                .collect();
            hits.sort_by_key(|p| distance(&edge[0], p));
            if !hits.is_empty() {
                insertions.entry(j as usize).or_default().extend(hits);
            }
        }

        if insertions.is_empty() {
            // Every missing edge failed to find a recoverable crossing;
            // further iterations would not change anything.
            break;
        }

        for (&pos, points) in insertions.iter().rev() {
            for p in points.iter().rev() {
                boundary.insert(pos, *p);
            }
        }
    }

    diagnostics.edge_recovery_exhausted = true;
    diagnostics
        .push_warning("area may be incorrect; concave or self-intersecting polygon");
    RecoveredMesh {
        boundary,
        triangulation,
    }
}

/// Standard crossing-number point-in-polygon test, augmented with a
/// fuzzy band: a query point within `epsilon` of any boundary edge counts
/// as interior.
pub fn point_in_polygon(poly: &[Point], p: &Point, epsilon: f64) -> bool {
    let n = poly.len();
    if n < 3 {
        return false;
    }

    for i in 0..n {
        let a = poly[i];
        let b = poly[(i + 1) % n];
        if distance_point_to_segment(p, &a, &b) <= epsilon {
            return true;
        }
    }

    let (px, py) = (p.x.into_inner(), p.y.into_inner());
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = (poly[i].x.into_inner(), poly[i].y.into_inner());
        let (xj, yj) = (poly[j].x.into_inner(), poly[j].y.into_inner());
        let crosses = (yi > py) != (yj > py);
        if crosses {
            let x_intersect = xj + (py - yj) / (yi - yj) * (xi - xj);
            if px < x_intersect {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

fn distance_point_to_segment(p: &Point, a: &Point, b: &Point) -> f64 {
    let ab = *b - *a;
    let ap = *p - *a;
    let len_sq = (ab.x * ab.x + ab.y * ab.y).into_inner();
    if len_sq < f64::EPSILON {
        return distance(p, a).into_inner();
    }
    let t = ((ap.x * ab.x + ap.y * ab.y).into_inner() / len_sq).clamp(0.0, 1.0);
    let proj = Point::new(a.x + ab.x * OrderedFloat(t), a.y + ab.y * OrderedFloat(t));
    distance(p, &proj).into_inner()
}

/// Keeps only the Delaunay triangles whose centroid tests as interior to
/// `boundary`.
pub fn interior_triangles(triangulation: &Triangulation, boundary: &[Point]) -> Vec<[u32; 3]> {
    triangulation
        .triangles
        .iter()
        .copied()
        .filter(|&[a, b, c]| {
            let centroid = Point::new(
                (boundary[a as usize].x + boundary[b as usize].x + boundary[c as usize].x) / 3.0,
                (boundary[a as usize].y + boundary[b as usize].y + boundary[c as usize].y) / 3.0,
            );
            point_in_polygon(boundary, &centroid, INTERIOR_TEST_EPSILON)
        })
        .collect()
}
