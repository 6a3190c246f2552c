//! Error taxonomy. Only the handful of *hard* failures a caller can
//! fix before calling `compute` again are modeled as an actual error
//! type; the rest of the taxonomy (`PolygonTooLarge`,
//! `EdgeRecoveryExhausted`, `NonFinite`, `OracleFailure`) are *soft*
//! failures that never abort the computation — nothing is thrown out of
//! `compute`; all surfaces return by value with diagnostic flags — so
//! they live on [`Diagnostics`] instead, returned alongside a normal
//! (possibly zeroed) result.

use thiserror::Error;

/// Hard failures the façade refuses outright, before any geometry runs.
///
/// - `TooFewCorners`: fewer than 3 polygon corners were supplied.
/// - `InvalidBodyRadius`: the body radius is not strictly positive.
/// - `InvalidSettings`: a settings field is outside its documented range.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("a polygon needs at least 3 corners, got {0}")]
    TooFewCorners(usize),

    #[error("body radius must be positive, got {0}")]
    InvalidBodyRadius(f64),

    #[error("invalid setting `{field}`: {reason}")]
    InvalidSettings { field: &'static str, reason: String },
}

/// Soft, non-fatal conditions the façade records while still returning a
/// value. A fresh `Diagnostics` with every flag `false`/`None` is the
/// common case.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    /// `max_i |P_i - C| > r`; the façade returns a zero result.
    pub polygon_too_large: bool,
    /// The edge-recovery loop ran its full iteration budget without
    /// covering every polygon edge; the result may be inaccurate.
    pub edge_recovery_exhausted: bool,
    /// Number of sub-triangle corners the body oracle returned NaN height
    /// for; each contributed zero to the area/volume accumulators.
    pub oracle_failures: u32,
    /// Refinement stopped because `maxPoints` or `maxAttempt` was hit
    /// rather than because both criteria were satisfied everywhere.
    pub refinement_budget_exhausted: bool,
    /// Free-form warnings meant for a human, e.g. "area may be incorrect;
    /// concave or self-intersecting polygon".
    pub warnings: Vec<String>,
}

impl Diagnostics {
    pub fn push_warning(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{message}");
        self.warnings.push(message);
    }
}
