//! The ground-model collaborator boundary.
//!
//! The coupling driver is generic over anything that can advance the
//! subsurface domain between two communication points. The built-in
//! [`ConductionColumn`] backend serves tests and demos; production setups
//! substitute an adapter to an external simulator.

mod conduction;

pub use conduction::{ConductionColumn, ConductionParams};

/// State of the subsurface domain after one completed advance.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverResponse {
    /// Ground temperature per fine layer at the end of the window \[K\].
    pub wall_temperature: Vec<f64>,
    /// Pressure at the interior observation points \[Pa\].
    pub interior_pressure: Vec<f64>,
    /// Air mass fraction at the interior observation points.
    pub interior_moisture: Vec<f64>,
    /// Temperature at the interior observation points \[K\].
    pub interior_temperature: Vec<f64>,
}

#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    #[error("ground model failed to converge over [{start_time}, {end_time}] s")]
    NonConvergence { start_time: f64, end_time: f64 },

    #[error("ground model returned {actual} {field} values, expected {expected}")]
    ShapeMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("ground model backend failure: {0}")]
    Backend(String),
}

/// Advances the subsurface domain across one communication window.
pub trait GroundSolver {
    /// Runs the ground model over `[start_time, end_time]`.
    ///
    /// `wall_temperature` holds the fine-mesh temperatures at `start_time`
    /// and `heat_flux` the per-layer forcing active across the whole window,
    /// both in top-down layer order. A call either completes the window or
    /// fails; there are no partial advances.
    fn advance(
        &mut self,
        start_time: f64,
        end_time: f64,
        wall_temperature: &[f64],
        heat_flux: &[f64],
        ambient_temperature: f64,
    ) -> Result<SolverResponse, SolverError>;
}
