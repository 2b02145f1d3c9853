//! Co-simulation coupling between a Modelica borefield model and a
//! subsurface ground simulator.
//!
//! The borefield model discretizes the borehole into a handful of uniform
//! segments, while the ground model resolves a much finer stack of soil
//! layers. This crate builds the two depth partitions, transfers
//! temperatures and heat fluxes between them in a conservation-preserving
//! way, and drives the ground model across each communication window with
//! explicit, caller-held session state.
//!
//! ```
//! use ground_cosim::{
//!     build_layers, ConductionColumn, ConductionParams, Coupling, CouplingParams, DepthRecord,
//!     SegmentGrid, SessionState, StepInputs,
//! };
//!
//! fn main() -> Result<(), ground_cosim::Error> {
//!     let layers = build_layers(&[DepthRecord::new("L01", 2.5), DepthRecord::new("L02", 4.0)])?;
//!     let solver = ConductionColumn::new(&layers, ConductionParams::default());
//!     let grid = SegmentGrid::new(2, 2.0);
//!     let mut coupling = Coupling::new(layers, &grid, solver, CouplingParams::default())?;
//!
//!     let mut state = SessionState::Uninitialized;
//!     for hour in 0..3 {
//!         let inputs = StepInputs {
//!             heat_flux: vec![35.0, 35.0],
//!             start_temperature: vec![283.15, 283.15],
//!             ambient_temperature: 278.15,
//!             time: hour as f64 * 3600.0,
//!         };
//!         let (outputs, next) = coupling.step(state, &inputs)?;
//!         println!("t = {:5} s: wall = {:?}", inputs.time, outputs.wall_temperature);
//!         state = next;
//!     }
//!     Ok(())
//! }
//! ```

pub mod mesh;
pub mod sim;

pub use mesh::{
    build_layers, DepthRecord, GeometryError, Layer, MapDirection, MappingError, MeshMap,
    SegmentGrid,
};
pub use sim::{
    ConductionColumn, ConductionParams, CoSimState, Coupling, CouplingParams, GroundSolver,
    SessionState, SolverError, SolverResponse, StateContinuityError, StepInputs, StepOutputs,
};

/// Any error a coupling session can produce.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("input vector `{name}` has {actual} elements, expected {expected}")]
    InvalidInput {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    StateContinuity(#[from] StateContinuityError),

    #[error(transparent)]
    Solver(#[from] SolverError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
