//! The coupling driver.
//!
//! One value of [`Coupling`] orchestrates a whole session: it maps fields
//! between the two depth partitions, decides whether a call is a real time
//! advance or an event re-evaluation, and hands the communication window to
//! the ground model.

use crate::{
    mesh::{Layer, MapDirection, MeshMap, SegmentGrid},
    Error,
};

use super::{
    io::{StepInputs, StepOutputs},
    params::CouplingParams,
    solver::{GroundSolver, SolverError, SolverResponse},
    state::{CoSimState, SessionState, StateContinuityError},
};

/// Session driver, generic over the ground model backend.
///
/// The driver itself is memoryless: all inter-call state travels through the
/// [`SessionState`] passed into and returned from [`Coupling::step`], so a
/// session can be suspended, persisted, and resumed at any call boundary.
#[derive(Debug)]
pub struct Coupling<S> {
    fine: Vec<Layer>,
    coarse: Vec<f64>,
    params: CouplingParams,
    solver: S,
}

impl<S: GroundSolver> Coupling<S> {
    /// Pairs the fine mesh with the segment grid and validates the pairing,
    /// so a geometry problem fails the session at startup instead of
    /// mid-run.
    pub fn new(
        fine: Vec<Layer>,
        grid: &SegmentGrid,
        solver: S,
        params: CouplingParams,
    ) -> Result<Self, Error> {
        let coarse = grid.boundaries();
        MeshMap::new(&fine, &coarse)?;
        Ok(Self {
            fine,
            coarse,
            params,
            solver,
        })
    }

    pub fn fine_layers(&self) -> &[Layer] {
        &self.fine
    }

    pub fn segment_count(&self) -> usize {
        self.coarse.len() - 1
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    /// Executes one coupling call at `inputs.time`.
    ///
    /// The first call of a session seeds the state and passes the supplied
    /// temperatures through unchanged. Later calls either replay the
    /// previous outputs, when time has not advanced beyond the event
    /// threshold, or run the ground model across `[last_time, inputs.time]`.
    /// That window is driven by the heat flux stored at the previous call;
    /// the flux supplied now is stored for the next window.
    pub fn step(
        &mut self,
        state: SessionState,
        inputs: &StepInputs,
    ) -> Result<(StepOutputs, SessionState), Error> {
        let segments = self.coarse.len() - 1;
        check_input("heat flux", segments, inputs.heat_flux.len())?;
        check_input("start temperature", segments, inputs.start_temperature.len())?;
        let map = MeshMap::new(&self.fine, &self.coarse)?;

        let prior = match state {
            SessionState::Uninitialized => {
                log::debug!("seeding session at t = {} s", inputs.time);
                let wall_fine = map.map(&inputs.start_temperature, MapDirection::RefineValue)?;
                let outputs = StepOutputs {
                    wall_temperature: inputs.start_temperature.clone(),
                    interior_pressure: vec![
                        self.params.initial_pressure;
                        self.params.interior_points
                    ],
                    interior_moisture: vec![
                        self.params.initial_moisture;
                        self.params.interior_points
                    ],
                    interior_temperature: vec![
                        self.params.initial_temperature;
                        self.params.interior_points
                    ],
                };
                let seeded = CoSimState {
                    last_time: inputs.time,
                    heat_flux: inputs.heat_flux.clone(),
                    wall_temperature: wall_fine,
                    last_outputs: outputs.clone(),
                };
                return Ok((outputs, SessionState::Ready(seeded)));
            }
            SessionState::Ready(prior) => prior,
        };

        self.check_continuity(&prior)?;

        let dt = inputs.time - prior.last_time;
        if dt <= self.params.min_step {
            log::trace!(
                "re-evaluation at t = {} s (dt = {:e} s); replaying previous outputs",
                inputs.time,
                dt
            );
            let outputs = prior.last_outputs.clone();
            return Ok((outputs, SessionState::Ready(prior)));
        }

        // The flux stored at the previous call is the forcing for this
        // window; the flux supplied now becomes active on the next one.
        let flux_fine = map.map(&prior.heat_flux, MapDirection::RefineFlux)?;
        log::debug!(
            "advancing ground model over [{}, {}] s",
            prior.last_time,
            inputs.time
        );
        let response = self.solver.advance(
            prior.last_time,
            inputs.time,
            &prior.wall_temperature,
            &flux_fine,
            inputs.ambient_temperature,
        )?;
        self.check_response(&response)?;

        let wall_coarse = map.map(&response.wall_temperature, MapDirection::CoarsenValue)?;
        let outputs = StepOutputs {
            wall_temperature: wall_coarse,
            interior_pressure: response.interior_pressure,
            interior_moisture: response.interior_moisture,
            interior_temperature: response.interior_temperature,
        };
        let next = CoSimState {
            last_time: inputs.time,
            heat_flux: inputs.heat_flux.clone(),
            wall_temperature: response.wall_temperature,
            last_outputs: outputs.clone(),
        };
        Ok((outputs, SessionState::Ready(next)))
    }

    /// A resumed or caller-supplied state must match the session geometry,
    /// including the outputs a re-evaluation would replay.
    fn check_continuity(&self, state: &CoSimState) -> Result<(), StateContinuityError> {
        let segments = self.coarse.len() - 1;
        let points = self.params.interior_points;
        let outputs = &state.last_outputs;
        let checks = [
            ("wall temperature", self.fine.len(), state.wall_temperature.len()),
            ("heat flux", segments, state.heat_flux.len()),
            ("output wall temperature", segments, outputs.wall_temperature.len()),
            ("interior pressure", points, outputs.interior_pressure.len()),
            ("interior moisture", points, outputs.interior_moisture.len()),
            ("interior temperature", points, outputs.interior_temperature.len()),
        ];
        for (field, expected, actual) in checks {
            if actual != expected {
                return Err(StateContinuityError::MeshMismatch {
                    field,
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }

    fn check_response(&self, response: &SolverResponse) -> Result<(), SolverError> {
        let points = self.params.interior_points;
        let checks = [
            ("wall temperature", self.fine.len(), response.wall_temperature.len()),
            ("interior pressure", points, response.interior_pressure.len()),
            ("interior moisture", points, response.interior_moisture.len()),
            ("interior temperature", points, response.interior_temperature.len()),
        ];
        for (field, expected, actual) in checks {
            if expected != actual {
                return Err(SolverError::ShapeMismatch {
                    field,
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }
}

fn check_input(name: &'static str, expected: usize, actual: usize) -> Result<(), Error> {
    if actual != expected {
        return Err(Error::InvalidInput {
            name,
            expected,
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;

    use super::*;

    /// Replays a canned response and records every advance it is asked for.
    struct RecordingSolver {
        response: SolverResponse,
        calls: Vec<RecordedCall>,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct RecordedCall {
        start_time: f64,
        end_time: f64,
        wall_temperature: Vec<f64>,
        heat_flux: Vec<f64>,
        ambient_temperature: f64,
    }

    impl GroundSolver for RecordingSolver {
        fn advance(
            &mut self,
            start_time: f64,
            end_time: f64,
            wall_temperature: &[f64],
            heat_flux: &[f64],
            ambient_temperature: f64,
        ) -> Result<SolverResponse, SolverError> {
            self.calls.push(RecordedCall {
                start_time,
                end_time,
                wall_temperature: wall_temperature.to_vec(),
                heat_flux: heat_flux.to_vec(),
                ambient_temperature,
            });
            Ok(self.response.clone())
        }
    }

    struct FailingSolver;

    impl GroundSolver for FailingSolver {
        fn advance(
            &mut self,
            start_time: f64,
            end_time: f64,
            _wall_temperature: &[f64],
            _heat_flux: &[f64],
            _ambient_temperature: f64,
        ) -> Result<SolverResponse, SolverError> {
            Err(SolverError::NonConvergence {
                start_time,
                end_time,
            })
        }
    }

    /// Three fine layers [0, 1], [1, 10], [10, 22] against two segments of
    /// ten metres; the last layer reaches past the segment domain.
    fn fine_mesh() -> Vec<Layer> {
        [0.0, 1.0, 10.0, 22.0]
            .windows(2)
            .enumerate()
            .map(|(i, pair)| Layer {
                id: format!("D{i}"),
                thickness: pair[1] - pair[0],
                upper_bound: pair[0],
                lower_bound: pair[1],
            })
            .collect()
    }

    fn params() -> CouplingParams {
        CouplingParams {
            interior_points: 3,
            ..CouplingParams::default()
        }
    }

    fn recording_coupling(response: SolverResponse) -> Coupling<RecordingSolver> {
        Coupling::new(
            fine_mesh(),
            &SegmentGrid::new(2, 10.0),
            RecordingSolver {
                response,
                calls: Vec::new(),
            },
            params(),
        )
        .unwrap()
    }

    fn canned_response() -> SolverResponse {
        SolverResponse {
            wall_temperature: vec![284.0, 286.0, 290.0],
            interior_pressure: vec![101_400.0, 101_500.0, 101_600.0],
            interior_moisture: vec![10.5, 10.5, 10.5],
            interior_temperature: vec![285.0, 286.0, 287.0],
        }
    }

    fn inputs(time: f64, heat_flux: [f64; 2]) -> StepInputs {
        StepInputs {
            heat_flux: heat_flux.to_vec(),
            start_temperature: vec![285.0, 287.0],
            ambient_temperature: 278.15,
            time,
        }
    }

    #[test]
    fn first_call_seeds_and_passes_temperatures_through() {
        let mut coupling = recording_coupling(canned_response());
        let (outputs, state) = coupling
            .step(SessionState::Uninitialized, &inputs(0.0, [30.0, 60.0]))
            .unwrap();

        assert_eq!(outputs.wall_temperature, vec![285.0, 287.0]);
        assert_eq!(outputs.interior_pressure, vec![101_343.01; 3]);
        assert_eq!(outputs.interior_moisture, vec![10.5; 3]);
        assert_eq!(outputs.interior_temperature, vec![15.06 + 273.15; 3]);

        let SessionState::Ready(state) = state else {
            panic!("seeding must leave the session ready");
        };
        assert_eq!(state.last_time, 0.0);
        assert_eq!(state.heat_flux, vec![30.0, 60.0]);
        // Refined onto the fine mesh; the trailing layer takes the last
        // segment's value.
        assert_eq!(state.wall_temperature, vec![285.0, 285.0, 287.0]);
        assert!(coupling.solver().calls.is_empty());
    }

    #[test_log::test]
    fn repeated_time_replays_the_previous_outputs() {
        let mut coupling = recording_coupling(canned_response());
        let call = inputs(0.0, [30.0, 60.0]);
        let (first, state) = coupling.step(SessionState::Uninitialized, &call).unwrap();
        let (replayed, state) = coupling.step(state, &call).unwrap();

        assert_eq!(replayed, first);
        let (again, _) = coupling.step(state, &call).unwrap();
        assert_eq!(again, first);
        assert!(coupling.solver().calls.is_empty());
    }

    #[test]
    fn small_and_negative_advances_replay_too() {
        let mut coupling = recording_coupling(canned_response());
        let (_, state) = coupling
            .step(SessionState::Uninitialized, &inputs(100.0, [30.0, 60.0]))
            .unwrap();

        let (_, state) = coupling.step(state, &inputs(100.005, [0.0, 0.0])).unwrap();
        let (_, state) = coupling.step(state, &inputs(95.0, [0.0, 0.0])).unwrap();
        assert!(coupling.solver().calls.is_empty());

        // The replays must not have touched the stored state.
        let SessionState::Ready(state) = state else {
            panic!("session lost its state");
        };
        assert_eq!(state.last_time, 100.0);
        assert_eq!(state.heat_flux, vec![30.0, 60.0]);
    }

    #[test]
    fn physical_step_runs_on_the_previously_stored_flux() {
        let mut coupling = recording_coupling(canned_response());
        let (_, state) = coupling
            .step(SessionState::Uninitialized, &inputs(0.0, [30.0, 60.0]))
            .unwrap();
        let (outputs, state) = coupling.step(state, &inputs(3600.0, [99.0, 99.0])).unwrap();

        let calls = &coupling.solver().calls;
        assert_eq!(calls.len(), 1);
        let call = &calls[0];
        assert_eq!(call.start_time, 0.0);
        assert_eq!(call.end_time, 3600.0);
        assert_eq!(call.wall_temperature, vec![285.0, 285.0, 287.0]);
        assert_eq!(call.ambient_temperature, 278.15);
        // Width-ratio refinement of the flux stored at seeding time, not of
        // the flux supplied with this call.
        assert_approx_eq!(call.heat_flux[0], 30.0 * 1.0 / 10.0, 1e-12);
        assert_approx_eq!(call.heat_flux[1], 30.0 * 9.0 / 10.0, 1e-12);
        assert_approx_eq!(call.heat_flux[2], 60.0 * 10.0 / 10.0, 1e-12);

        // Coarsened response per segment: clipped, length-weighted averages.
        assert_approx_eq!(
            outputs.wall_temperature[0],
            (1.0 * 284.0 + 9.0 * 286.0) / 10.0,
            1e-12
        );
        assert_approx_eq!(outputs.wall_temperature[1], 290.0, 1e-12);
        assert_eq!(outputs.interior_pressure, vec![101_400.0, 101_500.0, 101_600.0]);

        let SessionState::Ready(state) = state else {
            panic!("session lost its state");
        };
        assert_eq!(state.last_time, 3600.0);
        assert_eq!(state.heat_flux, vec![99.0, 99.0]);
        assert_eq!(state.wall_temperature, canned_response().wall_temperature);
        assert_eq!(state.last_outputs, outputs);
    }

    #[test]
    fn caller_supplied_state_replaces_the_previous_one() {
        let mut coupling = recording_coupling(canned_response());
        let handcrafted = SessionState::Ready(CoSimState {
            last_time: 7200.0,
            heat_flux: vec![10.0, 20.0],
            wall_temperature: vec![280.0, 281.0, 282.0],
            last_outputs: StepOutputs {
                wall_temperature: vec![280.9, 282.0],
                interior_pressure: vec![0.0; 3],
                interior_moisture: vec![0.0; 3],
                interior_temperature: vec![0.0; 3],
            },
        });

        coupling
            .step(handcrafted, &inputs(10_800.0, [0.0, 0.0]))
            .unwrap();
        let call = &coupling.solver().calls[0];
        assert_eq!(call.start_time, 7200.0);
        assert_eq!(call.wall_temperature, vec![280.0, 281.0, 282.0]);
        assert_approx_eq!(call.heat_flux[0], 1.0, 1e-12);
    }

    #[test]
    fn state_from_a_different_mesh_is_rejected() {
        let mut coupling = recording_coupling(canned_response());
        let foreign = SessionState::Ready(CoSimState {
            last_time: 0.0,
            heat_flux: vec![10.0, 20.0],
            wall_temperature: vec![280.0; 31],
            last_outputs: StepOutputs {
                wall_temperature: vec![280.0, 280.0],
                interior_pressure: vec![0.0; 3],
                interior_moisture: vec![0.0; 3],
                interior_temperature: vec![0.0; 3],
            },
        });

        let err = coupling
            .step(foreign, &inputs(3600.0, [0.0, 0.0]))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::StateContinuity(StateContinuityError::MeshMismatch {
                field: "wall temperature",
                expected: 3,
                actual: 31,
            })
        ));
    }

    #[test]
    fn state_with_misshapen_stored_outputs_is_rejected() {
        let mut coupling = recording_coupling(canned_response());
        // Primary vectors match the session geometry, but the stored outputs
        // came from a session with a different interior resolution. A
        // re-evaluation at the unchanged timestamp would replay them.
        let stale = SessionState::Ready(CoSimState {
            last_time: 0.0,
            heat_flux: vec![30.0, 60.0],
            wall_temperature: vec![285.0, 285.0, 287.0],
            last_outputs: StepOutputs {
                wall_temperature: vec![285.0, 287.0],
                interior_pressure: vec![101_343.01; 2],
                interior_moisture: vec![10.5; 2],
                interior_temperature: vec![288.21; 2],
            },
        });

        let err = coupling.step(stale, &inputs(0.0, [30.0, 60.0])).unwrap_err();
        assert!(matches!(
            err,
            Error::StateContinuity(StateContinuityError::MeshMismatch {
                field: "interior pressure",
                expected: 3,
                actual: 2,
            })
        ));
        assert!(coupling.solver().calls.is_empty());
    }

    #[test]
    fn input_vector_lengths_are_checked_first() {
        let mut coupling = recording_coupling(canned_response());
        let bad = StepInputs {
            heat_flux: vec![1.0, 2.0, 3.0],
            start_temperature: vec![285.0, 287.0],
            ambient_temperature: 278.15,
            time: 0.0,
        };
        let err = coupling.step(SessionState::Uninitialized, &bad).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidInput {
                name: "heat flux",
                expected: 2,
                actual: 3,
            }
        ));
    }

    #[test]
    fn solver_failure_fails_the_step() {
        let mut coupling = Coupling::new(
            fine_mesh(),
            &SegmentGrid::new(2, 10.0),
            FailingSolver,
            params(),
        )
        .unwrap();

        let (_, state) = coupling
            .step(SessionState::Uninitialized, &inputs(0.0, [30.0, 60.0]))
            .unwrap();
        let err = coupling.step(state, &inputs(3600.0, [30.0, 60.0])).unwrap_err();
        assert!(matches!(
            err,
            Error::Solver(SolverError::NonConvergence { .. })
        ));
    }

    #[test]
    fn short_solver_response_is_rejected() {
        let mut response = canned_response();
        response.interior_temperature.truncate(2);
        let mut coupling = recording_coupling(response);

        let (_, state) = coupling
            .step(SessionState::Uninitialized, &inputs(0.0, [30.0, 60.0]))
            .unwrap();
        let err = coupling.step(state, &inputs(3600.0, [30.0, 60.0])).unwrap_err();
        assert!(matches!(
            err,
            Error::Solver(SolverError::ShapeMismatch {
                field: "interior temperature",
                expected: 3,
                actual: 2,
            })
        ));
    }

    #[test]
    fn mismatched_mesh_pairing_fails_construction() {
        // Fine partition stops short of the segment domain.
        let short: Vec<Layer> = fine_mesh().into_iter().take(2).collect();
        let result = Coupling::new(
            short,
            &SegmentGrid::new(2, 10.0),
            FailingSolver,
            params(),
        );
        assert!(matches!(result, Err(Error::Mapping(_))));
    }
}
