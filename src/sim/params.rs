//! Session-constant coupling parameters.

/// Tunables of a coupling session. The defaults match the borefield model's
/// communication setup; they rarely need to change.
#[derive(Debug, Clone, PartialEq)]
pub struct CouplingParams {
    /// Smallest time advance treated as a real step \[s\]. Calls that move
    /// time by this much or less are event-iteration re-evaluations and
    /// replay the previous outputs.
    pub min_step: f64,
    /// Number of interior observation points reported by the ground model.
    pub interior_points: usize,
    /// Interior pressure reported for the startup instant \[Pa\].
    pub initial_pressure: f64,
    /// Interior air mass fraction reported for the startup instant.
    pub initial_moisture: f64,
    /// Interior temperature reported for the startup instant \[K\].
    pub initial_temperature: f64,
}

impl Default for CouplingParams {
    fn default() -> Self {
        Self {
            min_step: 1e-2,
            interior_points: 10,
            initial_pressure: 101_343.01,
            initial_moisture: 10.5,
            initial_temperature: 15.06 + 273.15,
        }
    }
}
