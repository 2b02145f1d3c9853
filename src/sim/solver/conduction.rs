//! A self-contained heat conduction backend.
//!
//! One vertical soil column, explicit Euler in time. Deliberately simple: it
//! stands in for a full subsurface simulator so that sessions can run without
//! external processes, with physically plausible (not validated) output.

use crate::mesh::Layer;

use super::{GroundSolver, SolverError, SolverResponse};

const GRAVITY: f64 = 9.81;
const WATER_DENSITY: f64 = 998.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ConductionParams {
    /// Ground thermal conductivity \[W/(m·K)\].
    pub conductivity: f64,
    /// Volumetric heat capacity of the ground \[J/(m³·K)\].
    pub volumetric_heat_capacity: f64,
    /// Pressure at the surface datum \[Pa\].
    pub surface_pressure: f64,
    /// Air mass fraction reported at the observation points; constant in
    /// this backend.
    pub moisture: f64,
    /// Depths of the interior observation points \[m\].
    pub observation_depths: Vec<f64>,
}

impl Default for ConductionParams {
    fn default() -> Self {
        Self {
            conductivity: 2.3,
            volumetric_heat_capacity: 2.2e6,
            surface_pressure: 101_325.0,
            moisture: 10.5,
            observation_depths: (0..10).map(|i| 5.0 + 10.0 * i as f64).collect(),
        }
    }
}

/// Transient conduction through a stack of soil layers, forced by the
/// per-layer borehole heat flux and by the ambient temperature at the
/// surface.
#[derive(Debug, Clone)]
pub struct ConductionColumn {
    params: ConductionParams,
    layers: Vec<Layer>,
    /// Heat capacity per layer \[J/K\].
    capacities: Vec<f64>,
    /// Conductance between adjacent layer centers \[W/K\].
    conductances: Vec<f64>,
    /// Conductance from the first layer center to the surface \[W/K\].
    surface_conductance: f64,
}

impl ConductionColumn {
    pub fn new(layers: &[Layer], params: ConductionParams) -> Self {
        debug_assert!(!layers.is_empty(), "conduction column needs layers");

        let centers: Vec<f64> = layers
            .iter()
            .map(|l| 0.5 * (l.upper_bound + l.lower_bound))
            .collect();
        let capacities = layers
            .iter()
            .map(|l| params.volumetric_heat_capacity * l.thickness)
            .collect();
        let conductances = centers
            .windows(2)
            .map(|pair| params.conductivity / (pair[1] - pair[0]))
            .collect();
        let surface_conductance = params.conductivity / centers[0];

        Self {
            params,
            layers: layers.to_vec(),
            capacities,
            conductances,
            surface_conductance,
        }
    }

    /// Number of substeps keeping the explicit scheme stable over `window`.
    fn stable_substeps(&self, window: f64) -> usize {
        let n = self.layers.len();
        let mut limit = f64::INFINITY;
        for i in 0..n {
            let mut conductance = if i == 0 {
                self.surface_conductance
            } else {
                self.conductances[i - 1]
            };
            if i + 1 < n {
                conductance += self.conductances[i];
            }
            limit = limit.min(self.capacities[i] / conductance);
        }
        ((window / (0.5 * limit)).ceil() as usize).max(1)
    }

    fn substep(&self, temps: &mut [f64], heat_flux: &[f64], ambient: f64, dt: f64) {
        let n = temps.len();
        let mut rates = vec![0.0; n];
        rates[0] += self.surface_conductance * (ambient - temps[0]);
        for i in 0..n - 1 {
            let exchange = self.conductances[i] * (temps[i + 1] - temps[i]);
            rates[i] += exchange;
            rates[i + 1] -= exchange;
        }
        for i in 0..n {
            temps[i] += dt * (rates[i] + heat_flux[i]) / self.capacities[i];
        }
    }

    /// Temperature of the layer containing `depth`; clamped to the column.
    fn sample(&self, temps: &[f64], depth: f64) -> f64 {
        for (layer, &t) in self.layers.iter().zip(temps) {
            if depth < layer.lower_bound {
                return t;
            }
        }
        temps[temps.len() - 1]
    }
}

impl GroundSolver for ConductionColumn {
    fn advance(
        &mut self,
        start_time: f64,
        end_time: f64,
        wall_temperature: &[f64],
        heat_flux: &[f64],
        ambient_temperature: f64,
    ) -> Result<SolverResponse, SolverError> {
        let n = self.layers.len();
        check_shape("wall temperature", n, wall_temperature.len())?;
        check_shape("heat flux", n, heat_flux.len())?;

        let mut temps = wall_temperature.to_vec();
        let window = end_time - start_time;
        if window > 0.0 {
            let substeps = self.stable_substeps(window);
            let dt = window / substeps as f64;
            log::trace!(
                "conduction column: {substeps} substeps of {dt:.1} s over [{start_time}, {end_time}] s"
            );
            for _ in 0..substeps {
                self.substep(&mut temps, heat_flux, ambient_temperature, dt);
            }
        }

        if temps.iter().any(|t| !t.is_finite()) {
            return Err(SolverError::NonConvergence {
                start_time,
                end_time,
            });
        }

        let interior_pressure = self
            .params
            .observation_depths
            .iter()
            .map(|&depth| self.params.surface_pressure + WATER_DENSITY * GRAVITY * depth)
            .collect();
        let interior_temperature = self
            .params
            .observation_depths
            .iter()
            .map(|&depth| self.sample(&temps, depth))
            .collect();
        let interior_moisture = vec![self.params.moisture; self.params.observation_depths.len()];

        Ok(SolverResponse {
            wall_temperature: temps,
            interior_pressure,
            interior_moisture,
            interior_temperature,
        })
    }
}

fn check_shape(field: &'static str, expected: usize, actual: usize) -> Result<(), SolverError> {
    if actual != expected {
        return Err(SolverError::ShapeMismatch {
            field,
            expected,
            actual,
        });
    }
    Ok(())
}
