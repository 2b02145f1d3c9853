//! Per-call input and output records exchanged with the borefield model.

use serde::{Deserialize, Serialize};

/// Inputs supplied by the borefield model for one coupling call.
#[derive(Debug, Clone, PartialEq)]
pub struct StepInputs {
    /// Heat flux from each borefield segment into the ground \[W\].
    pub heat_flux: Vec<f64>,
    /// Borehole wall temperature per segment \[K\]; read only when the first
    /// call seeds the session.
    pub start_temperature: Vec<f64>,
    /// Outdoor dry-bulb temperature \[K\].
    pub ambient_temperature: f64,
    /// Current simulation time \[s\].
    pub time: f64,
}

/// Outputs returned to the borefield model after one coupling call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutputs {
    /// Borehole wall temperature per coarse segment \[K\].
    pub wall_temperature: Vec<f64>,
    /// Pressure at the interior observation points \[Pa\].
    pub interior_pressure: Vec<f64>,
    /// Air mass fraction at the interior observation points.
    pub interior_moisture: Vec<f64>,
    /// Temperature at the interior observation points \[K\].
    pub interior_temperature: Vec<f64>,
}
