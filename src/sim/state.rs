//! The explicit inter-step memory of a coupling session.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use super::io::StepOutputs;

/// Everything remembered between two coupling calls. Callers hold this value
/// and pass it back unchanged; the driver keeps nothing else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoSimState {
    /// Time of the last executed call \[s\].
    pub last_time: f64,
    /// Heat flux per coarse segment reported at `last_time` \[W\]. Drives the
    /// ground model over the next communication window.
    pub heat_flux: Vec<f64>,
    /// Ground temperature over the fine mesh at `last_time` \[K\].
    pub wall_temperature: Vec<f64>,
    /// Outputs emitted at `last_time`, replayed verbatim when the borefield
    /// model re-evaluates the same instant.
    pub last_outputs: StepOutputs,
}

/// A coupling session as seen from outside the driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionState {
    /// No call has run yet; the next one seeds the session.
    Uninitialized,
    /// At least one call has completed.
    Ready(CoSimState),
}

#[derive(Debug, thiserror::Error)]
pub enum StateContinuityError {
    #[error("no persisted session state at `{path}`", path = .path.display())]
    Missing { path: PathBuf },

    #[error("persisted session state at `{path}` could not be read", path = .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("persisted session state at `{path}` is corrupt", path = .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("session state carries {actual} {field} entries but the mesh has {expected}")]
    MeshMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
}

impl SessionState {
    pub fn is_ready(&self) -> bool {
        matches!(self, SessionState::Ready(_))
    }

    /// Time of the last executed call, if any \[s\].
    pub fn last_time(&self) -> Option<f64> {
        match self {
            SessionState::Uninitialized => None,
            SessionState::Ready(state) => Some(state.last_time),
        }
    }

    /// Persists the session state as JSON.
    pub fn store(&self, path: impl AsRef<Path>) -> Result<(), crate::Error> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), text)?;
        Ok(())
    }

    /// Restores a previously stored session state.
    pub fn resume(path: impl AsRef<Path>) -> Result<Self, StateContinuityError> {
        let path = path.as_ref();
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                return Err(StateContinuityError::Missing {
                    path: path.to_path_buf(),
                });
            }
            Err(source) => {
                return Err(StateContinuityError::Unreadable {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        serde_json::from_str(&text).map_err(|source| StateContinuityError::Corrupt {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> SessionState {
        SessionState::Ready(CoSimState {
            last_time: 3600.0,
            heat_flux: vec![42.0; 10],
            wall_temperature: vec![284.0; 31],
            last_outputs: StepOutputs {
                wall_temperature: vec![284.2; 10],
                interior_pressure: vec![101_343.01; 10],
                interior_moisture: vec![10.5; 10],
                interior_temperature: vec![288.21; 10],
            },
        })
    }

    #[test]
    fn store_and_resume_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let state = sample_state();
        state.store(&path).unwrap();
        let resumed = SessionState::resume(&path).unwrap();
        assert_eq!(resumed, state);
    }

    #[test]
    fn resume_reports_a_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = SessionState::resume(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, StateContinuityError::Missing { .. }));
    }

    #[test]
    fn resume_reports_a_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{\"Ready\":").unwrap();

        let err = SessionState::resume(&path).unwrap_err();
        assert!(matches!(err, StateContinuityError::Corrupt { .. }));
    }

    #[test]
    fn uninitialized_has_no_last_time() {
        assert_eq!(SessionState::Uninitialized.last_time(), None);
        assert_eq!(sample_state().last_time(), Some(3600.0));
    }
}
