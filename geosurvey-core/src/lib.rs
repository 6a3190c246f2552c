//! A sweep-line polygon area/volume engine for measuring user-drawn
//! polygons on a spherical body: project onto a tangent plane, triangulate
//! with Fortune's algorithm, recover edges a naive Delaunay triangulation
//! drops, refine the mesh against the body's terrain, then integrate
//! surface area and signed volume over the result.
//!
//! [`session::compute`] is the one entry point most callers need; the
//! rest of the modules are exposed for callers that want to drive the
//! pipeline's individual stages (e.g. to draw the intermediate mesh).

pub mod beachline;
pub mod body;
pub mod error;
pub mod geometry;
pub mod integrate;
pub mod mesh;
pub mod persistence;
pub mod refine;
pub mod session;
pub mod settings;
pub mod site;
pub mod voronoi;

#[cfg(test)]
mod test_utils;

pub use body::{BodyHeightOracle, FlatBody};
pub use error::{Diagnostics, SessionError};
pub use persistence::{LngLat, ToolPlacement};
pub use session::{compute, BoundingBoxLngLat, ComputeOutput};
pub use settings::Settings;
