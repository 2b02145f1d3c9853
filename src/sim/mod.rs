//! The co-simulation driver and its collaborators.

mod driver;
mod io;
mod params;
pub mod solver;
mod state;

pub use driver::Coupling;
pub use io::{StepInputs, StepOutputs};
pub use params::CouplingParams;
pub use solver::{ConductionColumn, ConductionParams, GroundSolver, SolverError, SolverResponse};
pub use state::{CoSimState, SessionState, StateContinuityError};
