//! Surface integration (C6): lifts the refined mesh onto the body,
//! sums true 3D triangle areas for the surface area, fits a least-squares
//! reference plane through the user's corners' lifted positions (not the
//! refined/edge-recovery-extended point set), and accumulates signed
//! prism volume against that plane, splitting any triangle the plane
//! passes through into an all-one-side corner triangle and an
//! all-other-side quadrilateral.

use nalgebra::{Matrix3, Vector3};

use crate::body::{from_cartesian, to_cartesian, BodyHeightOracle};
use crate::error::Diagnostics;
use crate::geometry::Point;
use crate::mesh::ProjectionBasis;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegrationResult {
    pub area: f64,
    /// Volume of terrain above the fitted reference plane.
    pub pvol: f64,
    /// Volume of terrain below the fitted reference plane, as a
    /// nonnegative magnitude (net volume is `pvol - nvol`).
    pub nvol: f64,
}

/// A mesh vertex's position in the local `(east, north)` world-unit plane
/// and its signed elevation above the fitted reference plane.
type PlaneVertex = ((f64, f64), f64);

/// `corners` is the original, pre-edge-recovery polygon boundary (§4.5:
/// "the least-squares plane through the user's corners"); `points`/
/// `triangles` is the refined mesh those corners grew into. The two are
/// kept separate because edge recovery and refinement insert points that
/// shift addresses and are not part of the user's input.
pub fn integrate(
    points: &[Point],
    triangles: &[[u32; 3]],
    corners: &[Point],
    basis: &ProjectionBasis,
    body: &dyn BodyHeightOracle,
    diagnostics: &mut Diagnostics,
) -> IntegrationResult {
    if triangles.is_empty() {
        return IntegrationResult {
            area: 0.0,
            pvol: 0.0,
            nvol: 0.0,
        };
    }

    let corner_plane_points: Vec<((f64, f64), f64)> = corners
        .iter()
        .filter_map(|&p| {
            let surface = lift_to_surface(basis, body, p)?;
            let rel = surface - basis.centroid;
            Some(((rel.dot(&basis.east), rel.dot(&basis.north)), rel.dot(&basis.normal)))
        })
        .collect();
    diagnostics.oracle_failures += (corners.len() - corner_plane_points.len()) as u32;

    let corner_world_xy: Vec<(f64, f64)> = corner_plane_points.iter().map(|&(xy, _)| xy).collect();
    let corner_elevation: Vec<f64> = corner_plane_points.iter().map(|&(_, e)| e).collect();
    let (a, b, c) = fit_reference_plane(&corner_world_xy, &corner_elevation);

    let surface_points: Vec<Option<Vector3<f64>>> =
        points.iter().map(|&p| lift_to_surface(basis, body, p)).collect();
    diagnostics.oracle_failures += surface_points.iter().filter(|sp| sp.is_none()).count() as u32;

    let mut area = 0.0;
    let mut pvol = 0.0;
    let mut nvol = 0.0;

    for &[i, j, k] in triangles {
        let (i, j, k) = (i as usize, j as usize, k as usize);
        // §7 OracleFailure: a triangle touched by a failed height sample
        // contributes zero to both accumulators rather than falling back
        // to a bare-sphere point.
        let (Some(pi), Some(pj), Some(pk)) = (surface_points[i], surface_points[j], surface_points[k])
        else {
            continue;
        };

        area += triangle_area_3d(pi, pj, pk);

        let verts: [PlaneVertex; 3] = [
            plane_vertex(pi, basis, a, b, c),
            plane_vertex(pj, basis, a, b, c),
            plane_vertex(pk, basis, a, b, c),
        ];
        accumulate_signed_volume(verts, &mut pvol, &mut nvol);
    }

    IntegrationResult { area, pvol, nvol }
}

/// A lifted surface point's `(east, north)` plane coordinates and its
/// signed elevation above the fitted reference plane `a*x + b*y + c`.
fn plane_vertex(p: Vector3<f64>, basis: &ProjectionBasis, a: f64, b: f64, c: f64) -> PlaneVertex {
    let rel = p - basis.centroid;
    let (x, y) = (rel.dot(&basis.east), rel.dot(&basis.north));
    let elevation = rel.dot(&basis.normal);
    ((x, y), elevation - (a * x + b * y + c))
}

/// Queries the body at `p`'s geodetic coordinates and lifts it to the
/// true surface point. Returns `None` on a non-finite reading — an
/// oracle failure, which the caller counts and treats as "this sample
/// contributes nothing" rather than substituting a fallback height.
fn lift_to_surface(basis: &ProjectionBasis, body: &dyn BodyHeightOracle, p: Point) -> Option<Vector3<f64>> {
    let sphere_point = basis.lift(p);
    let (lng, lat, _) = from_cartesian(sphere_point, basis.radius);
    let height = body.height(lng, lat);
    if height.is_finite() {
        Some(to_cartesian(lng, lat, basis.radius, height))
    } else {
        None
    }
}

/// Fits `elevation = a*x + b*y + c` by ordinary least squares via the 3x3
/// normal equations. Falls back to a flat plane at the mean elevation
/// when the system is singular (fewer than 3 non-collinear points).
fn fit_reference_plane(world_xy: &[(f64, f64)], elevation: &[f64]) -> (f64, f64, f64) {
    let n = world_xy.len() as f64;
    let (mut sxx, mut sxy, mut sx, mut syy, mut sy) = (0.0, 0.0, 0.0, 0.0, 0.0);
    let (mut sxe, mut sye, mut se) = (0.0, 0.0, 0.0);
    for (&(x, y), &e) in world_xy.iter().zip(elevation) {
        sxx += x * x;
        sxy += x * y;
        sx += x;
        syy += y * y;
        sy += y;
        sxe += x * e;
        sye += y * e;
        se += e;
    }

    let m = Matrix3::new(sxx, sxy, sx, sxy, syy, sy, sx, sy, n);
    let rhs = Vector3::new(sxe, sye, se);
    match m.lu().solve(&rhs) {
        Some(sol) => (sol.x, sol.y, sol.z),
        None => (0.0, 0.0, elevation.iter().sum::<f64>() / n.max(1.0)),
    }
}

fn triangle_area_3d(a: Vector3<f64>, b: Vector3<f64>, c: Vector3<f64>) -> f64 {
    0.5 * (b - a).cross(&(c - a)).norm()
}

fn planar_area(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> f64 {
    0.5 * ((b.0 - a.0) * (c.1 - a.1) - (c.0 - a.0) * (b.1 - a.1)).abs()
}

/// Adds the prism volume of one all-one-side triangle to `pvol` or
/// `nvol`, whichever its average height falls on.
fn add_simplex_volume(a: PlaneVertex, b: PlaneVertex, c: PlaneVertex, pvol: &mut f64, nvol: &mut f64) {
    let area = planar_area(a.0, b.0, c.0);
    let avg_height = (a.1 + b.1 + c.1) / 3.0;
    let volume = area * avg_height;
    if volume >= 0.0 {
        *pvol += volume;
    } else {
        *nvol += -volume;
    }
}

/// The point where the segment from `a` to `b` crosses height zero.
fn crossing_point(a: PlaneVertex, b: PlaneVertex) -> (f64, f64) {
    let t = a.1 / (a.1 - b.1);
    (a.0 .0 + t * (b.0 .0 - a.0 .0), a.0 .1 + t * (b.0 .1 - a.0 .1))
}

/// Splits a triangle whose vertices don't all share the reference
/// plane's sign into the one-vertex corner triangle and the two-vertex
/// quadrilateral (as two triangles) to handle the crossing case.
fn accumulate_signed_volume(verts: [PlaneVertex; 3], pvol: &mut f64, nvol: &mut f64) {
    let positive: Vec<usize> = (0..3).filter(|&i| verts[i].1 > 0.0).collect();
    let negative: Vec<usize> = (0..3).filter(|&i| verts[i].1 < 0.0).collect();

    if positive.is_empty() || negative.is_empty() {
        add_simplex_volume(verts[0], verts[1], verts[2], pvol, nvol);
        return;
    }

    let lone_idx = if positive.len() == 1 { positive[0] } else { negative[0] };
    let others: Vec<usize> = (0..3).filter(|&i| i != lone_idx).collect();
    let (o1, o2) = (others[0], others[1]);

    let cross1 = crossing_point(verts[lone_idx], verts[o1]);
    let cross2 = crossing_point(verts[lone_idx], verts[o2]);

    add_simplex_volume(verts[lone_idx], (cross1, 0.0), (cross2, 0.0), pvol, nvol);
    add_simplex_volume(verts[o1], verts[o2], (cross2, 0.0), pvol, nvol);
    add_simplex_volume(verts[o1], (cross2, 0.0), (cross1, 0.0), pvol, nvol);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::FlatBody;
    use crate::mesh;

    fn small_square_corners(r: f64, half_extent: f64) -> Vec<Vector3<f64>> {
        vec![
            Vector3::new(r, -half_extent, -half_extent).normalize() * r,
            Vector3::new(r, -half_extent, half_extent).normalize() * r,
            Vector3::new(r, half_extent, half_extent).normalize() * r,
            Vector3::new(r, half_extent, -half_extent).normalize() * r,
        ]
    }

    #[test]
    fn flat_body_yields_near_zero_net_volume() {
        let r = 1000.0;
        let corners = small_square_corners(r, 5.0);
        let (basis, boundary) = mesh::project_polygon(&corners, r).unwrap();
        let original_boundary = boundary.clone();
        let mut diagnostics = Diagnostics::default();
        let recovered = mesh::recover_edges(boundary, &mut diagnostics);
        let triangles = mesh::interior_triangles(&recovered.triangulation, &recovered.boundary);

        let body = FlatBody { height: 0.0 };
        let result = integrate(
            &recovered.boundary,
            &triangles,
            &original_boundary,
            &basis,
            &body,
            &mut diagnostics,
        );

        assert!(result.area > 0.0);
        assert!(result.pvol < 1e-6);
        assert!(result.nvol < 1e-6);
    }

    #[test]
    fn surface_area_approximates_flat_square() {
        let r = 1000.0;
        let half_extent = 5.0;
        let corners = small_square_corners(r, half_extent);
        let (basis, boundary) = mesh::project_polygon(&corners, r).unwrap();
        let original_boundary = boundary.clone();
        let mut diagnostics = Diagnostics::default();
        let recovered = mesh::recover_edges(boundary, &mut diagnostics);
        let triangles = mesh::interior_triangles(&recovered.triangulation, &recovered.boundary);

        let body = FlatBody { height: 0.0 };
        let result = integrate(
            &recovered.boundary,
            &triangles,
            &original_boundary,
            &basis,
            &body,
            &mut diagnostics,
        );

        let expected = (2.0 * half_extent) * (2.0 * half_extent);
        assert!(
            (result.area - expected).abs() / expected < 0.05,
            "area {} too far from flat approximation {}",
            result.area,
            expected
        );
    }

    #[test]
    fn oracle_nan_excludes_affected_triangles_from_area_and_volume() {
        let r = 1000.0;
        let corners = small_square_corners(r, 5.0);
        let (basis, boundary) = mesh::project_polygon(&corners, r).unwrap();
        let original_boundary = boundary.clone();
        let mut diagnostics = Diagnostics::default();
        let recovered = mesh::recover_edges(boundary, &mut diagnostics);
        let triangles = mesh::interior_triangles(&recovered.triangulation, &recovered.boundary);

        let body = |_lng: f64, _lat: f64| f64::NAN;
        let result = integrate(
            &recovered.boundary,
            &triangles,
            &original_boundary,
            &basis,
            &body,
            &mut diagnostics,
        );

        // Every sample failed, so every triangle is excluded: area and
        // volume are zero, never NaN and never the bare-sphere area.
        assert!(diagnostics.oracle_failures > 0);
        assert_eq!(result.area, 0.0);
        assert_eq!(result.pvol, 0.0);
        assert_eq!(result.nvol, 0.0);
    }

    #[test]
    fn empty_triangle_list_yields_zeroed_result() {
        let mut diagnostics = Diagnostics::default();
        let basis = ProjectionBasis {
            centroid: Vector3::new(1000.0, 0.0, 0.0),
            normal: Vector3::new(1.0, 0.0, 0.0),
            east: Vector3::new(0.0, 0.0, 1.0),
            north: Vector3::new(0.0, 1.0, 0.0),
            max_dist: 1.0,
            radius: 1000.0,
        };
        let body = FlatBody { height: 0.0 };
        let result = integrate(&[], &[], &[], &basis, &body, &mut diagnostics);
        assert_eq!(result, IntegrationResult { area: 0.0, pvol: 0.0, nvol: 0.0 });
    }
}
