//! The measurement session façade (C7): the one public entry point
//! that ties projection, edge recovery, refinement, and integration
//! together behind a single `compute` call.

use std::collections::HashSet;

use crate::body::{from_cartesian, to_cartesian, BodyHeightOracle};
use crate::error::{Diagnostics, SessionError};
use crate::geometry::Point;
use crate::integrate;
use crate::mesh::{self, ProjectionBasis};
use crate::persistence::LngLat;
use crate::refine;
use crate::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBoxLngLat {
    pub min: LngLat,
    pub max: LngLat,
}

/// The full result of one `compute` call: the measurements plus enough
/// of the mesh to draw an overlay, and the soft-failure record.
#[derive(Debug, Clone)]
pub struct ComputeOutput {
    pub area: f64,
    pub pvol: f64,
    pub nvol: f64,
    pub mesh_segments: Vec<[LngLat; 2]>,
    pub bounding_box: BoundingBoxLngLat,
    pub diagnostics: Diagnostics,
}

/// Validates inputs, then projects, repairs, refines, and integrates the
/// polygon against `body`. Only the three conditions in [`SessionError`]
/// abort the call; everything else — a too-large polygon, exhausted edge
/// recovery, an oracle that returned NaN, a refinement budget hit —
/// reports by value through `ComputeOutput::diagnostics` instead.
pub fn compute(
    corners: &[LngLat],
    radius: f64,
    body: &dyn BodyHeightOracle,
    settings: &Settings,
) -> Result<ComputeOutput, SessionError> {
    if corners.len() < 3 {
        return Err(SessionError::TooFewCorners(corners.len()));
    }
    if !(radius > 0.0) {
        return Err(SessionError::InvalidBodyRadius(radius));
    }
    settings.validate(corners.len())?;

    let mut diagnostics = Diagnostics::default();
    let bounding_box = lnglat_bounding_box(corners);

    let corners_3d: Vec<_> = corners
        .iter()
        .map(|c| to_cartesian(c.lng, c.lat, radius, 0.0))
        .collect();

    let Some((basis, boundary)) = mesh::project_polygon(&corners_3d, radius) else {
        diagnostics.polygon_too_large = true;
        diagnostics.push_warning("polygon exceeds one hemisphere; no area or volume was computed");
        return Ok(zero_output(bounding_box, diagnostics));
    };

    let original_corners = boundary.clone();
    let recovered = mesh::recover_edges(boundary, &mut diagnostics);
    let refined = refine::refine(
        recovered.boundary,
        recovered.triangulation,
        &basis,
        body,
        settings,
        &mut diagnostics,
    );

    let result = integrate::integrate(
        &refined.points,
        &refined.triangles,
        &original_corners,
        &basis,
        body,
        &mut diagnostics,
    );
    let mesh_segments = mesh_segments(&refined.points, &refined.triangles, &basis);

    Ok(ComputeOutput {
        area: result.area,
        pvol: result.pvol,
        nvol: result.nvol,
        mesh_segments,
        bounding_box,
        diagnostics,
    })
}

fn zero_output(bounding_box: BoundingBoxLngLat, diagnostics: Diagnostics) -> ComputeOutput {
    ComputeOutput {
        area: 0.0,
        pvol: 0.0,
        nvol: 0.0,
        mesh_segments: Vec::new(),
        bounding_box,
        diagnostics,
    }
}

fn lnglat_bounding_box(corners: &[LngLat]) -> BoundingBoxLngLat {
    let mut min = corners[0];
    let mut max = corners[0];
    for c in corners {
        min.lng = min.lng.min(c.lng);
        min.lat = min.lat.min(c.lat);
        max.lng = max.lng.max(c.lng);
        max.lat = max.lat.max(c.lat);
    }
    BoundingBoxLngLat { min, max }
}

/// The refined triangulation's unique edges, lifted back to lng/lat for
/// a caller to render as an overlay.
fn mesh_segments(points: &[Point], triangles: &[[u32; 3]], basis: &ProjectionBasis) -> Vec<[LngLat; 2]> {
    let mut edges: HashSet<(u32, u32)> = HashSet::new();
    for &[a, b, c] in triangles {
        for &(p, q) in &[(a, b), (b, c), (c, a)] {
            edges.insert(if p <= q { (p, q) } else { (q, p) });
        }
    }

    edges
        .into_iter()
        .map(|(a, b)| [to_lnglat(basis, points[a as usize]), to_lnglat(basis, points[b as usize])])
        .collect()
}

fn to_lnglat(basis: &ProjectionBasis, p: Point) -> LngLat {
    let (lng, lat, _) = from_cartesian(basis.lift(p), basis.radius);
    LngLat { lng, lat }
}
