//! Field transfer between the fine layer partition and the coarse segment
//! partition of the depth axis.

use itertools::Itertools;

use super::layers::Layer;

/// Which quantity is transferred, and in which direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapDirection {
    /// Coarse segment values onto the fine layers. Intensive quantities such
    /// as temperature; a contained layer takes its segment's value unchanged.
    RefineValue,
    /// Coarse segment fluxes onto the fine layers, scaled by the width ratio
    /// so that the depth-integrated quantity is conserved. The blend for a
    /// boundary-crossing layer normalizes by a single segment width;
    /// conservation is therefore exact only on evenly spaced coarse
    /// boundaries, the kind a [`SegmentGrid`](super::SegmentGrid) produces.
    RefineFlux,
    /// Fine layer values onto the coarse segments as length-weighted averages
    /// over the clipped overlaps.
    CoarsenValue,
}

#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    #[error("fine partition has no layers")]
    EmptyFinePartition,

    #[error("coarse partition needs at least two boundaries, got {0}")]
    DegenerateCoarsePartition(usize),

    #[error("coarse boundaries are not strictly increasing ({previous} m followed by {next} m)")]
    UnorderedBoundaries { previous: f64, next: f64 },

    #[error(
        "fine partition [{fine_start}, {fine_end}] m does not cover the coarse domain \
         [{coarse_start}, {coarse_end}] m"
    )]
    SpanMismatch {
        fine_start: f64,
        fine_end: f64,
        coarse_start: f64,
        coarse_end: f64,
    },

    #[error("layer `{id}` [{upper_bound}, {lower_bound}] m overlaps no coarse segment")]
    Unclassifiable {
        id: String,
        upper_bound: f64,
        lower_bound: f64,
    },

    #[error("expected {expected} source values, got {actual}")]
    ValueCountMismatch { expected: usize, actual: usize },
}

/// How a fine layer sits relative to the coarse segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Overlap {
    /// Entirely inside segment `s`.
    Within(usize),
    /// Starts inside the last segment and reaches past the domain end.
    PastEnd,
    /// Crosses the interior boundary with index `j`.
    Split(usize),
}

/// Transfer operator between the two session-constant depth partitions.
///
/// Both partitions share their origin, and the fine partition must reach at
/// least to the end of the coarse domain; fine layers below the domain end
/// carry the remainder of the last segment.
#[derive(Debug, Clone)]
pub struct MeshMap<'a> {
    fine: &'a [Layer],
    coarse: &'a [f64],
}

impl<'a> MeshMap<'a> {
    pub fn new(fine: &'a [Layer], coarse: &'a [f64]) -> Result<Self, MappingError> {
        if fine.is_empty() {
            return Err(MappingError::EmptyFinePartition);
        }
        if coarse.len() < 2 {
            return Err(MappingError::DegenerateCoarsePartition(coarse.len()));
        }
        if let Some((&previous, &next)) = coarse.iter().tuple_windows().find(|(lo, hi)| hi <= lo) {
            return Err(MappingError::UnorderedBoundaries { previous, next });
        }

        debug_assert!(
            fine.windows(2).all(|w| w[0].lower_bound == w[1].upper_bound),
            "fine layers must tile the depth axis contiguously"
        );
        debug_assert!(
            fine.iter().all(|l| l.upper_bound < l.lower_bound),
            "fine layers must have positive extent"
        );

        let fine_start = fine[0].upper_bound;
        let fine_end = fine[fine.len() - 1].lower_bound;
        let coarse_start = coarse[0];
        let coarse_end = coarse[coarse.len() - 1];
        if fine_start != coarse_start || fine_end < coarse_end {
            return Err(MappingError::SpanMismatch {
                fine_start,
                fine_end,
                coarse_start,
                coarse_end,
            });
        }

        Ok(Self { fine, coarse })
    }

    pub fn fine_count(&self) -> usize {
        self.fine.len()
    }

    pub fn segment_count(&self) -> usize {
        self.coarse.len() - 1
    }

    /// Maps `values` across the partitions. The source resolution is implied
    /// by the direction: per coarse segment for the refining directions, per
    /// fine layer for the coarsening one.
    pub fn map(&self, values: &[f64], direction: MapDirection) -> Result<Vec<f64>, MappingError> {
        match direction {
            MapDirection::RefineValue => {
                self.check_source(values, self.segment_count())?;
                self.refine_value(values)
            }
            MapDirection::RefineFlux => {
                self.check_source(values, self.segment_count())?;
                self.refine_flux(values)
            }
            MapDirection::CoarsenValue => {
                self.check_source(values, self.fine_count())?;
                Ok(self.coarsen_value(values))
            }
        }
    }

    fn check_source(&self, values: &[f64], expected: usize) -> Result<(), MappingError> {
        if values.len() != expected {
            return Err(MappingError::ValueCountMismatch {
                expected,
                actual: values.len(),
            });
        }
        Ok(())
    }

    /// Places each fine layer relative to the coarse segments. Layers that
    /// start above the coarse origin or at/below the domain end overlap no
    /// segment and cannot be classified.
    fn classify(&self, layer: &Layer) -> Result<Overlap, MappingError> {
        let ub = layer.upper_bound;
        let lb = layer.lower_bound;
        let segments = self.segment_count();

        let unclassifiable = || MappingError::Unclassifiable {
            id: layer.id.clone(),
            upper_bound: ub,
            lower_bound: lb,
        };

        if ub < self.coarse[0] {
            return Err(unclassifiable());
        }
        // First boundary strictly below the layer top; its segment holds `ub`.
        let j = self
            .coarse
            .iter()
            .skip(1)
            .position(|&b| ub < b)
            .map(|i| i + 1)
            .ok_or_else(unclassifiable)?;

        if lb <= self.coarse[j] {
            Ok(Overlap::Within(j - 1))
        } else if j == segments {
            Ok(Overlap::PastEnd)
        } else {
            Ok(Overlap::Split(j))
        }
    }

    fn refine_value(&self, values: &[f64]) -> Result<Vec<f64>, MappingError> {
        self.fine
            .iter()
            .map(|layer| {
                Ok(match self.classify(layer)? {
                    Overlap::Within(s) => values[s],
                    Overlap::PastEnd => values[values.len() - 1],
                    Overlap::Split(j) => {
                        let boundary = self.coarse[j];
                        let above = boundary - layer.upper_bound;
                        let below = layer.lower_bound - boundary;
                        (above * values[j - 1] + below * values[j]) / layer.thickness
                    }
                })
            })
            .collect()
    }

    fn refine_flux(&self, values: &[f64]) -> Result<Vec<f64>, MappingError> {
        self.fine
            .iter()
            .map(|layer| {
                Ok(match self.classify(layer)? {
                    Overlap::Within(s) => {
                        let width = self.coarse[s + 1] - self.coarse[s];
                        values[s] * layer.thickness / width
                    }
                    Overlap::PastEnd => {
                        let last = values.len() - 1;
                        let width = self.coarse[last + 1] - self.coarse[last];
                        let covered = self.coarse[last + 1] - layer.upper_bound;
                        values[last] * covered / width
                    }
                    Overlap::Split(j) => {
                        let boundary = self.coarse[j];
                        let width = boundary - self.coarse[j - 1];
                        let above = boundary - layer.upper_bound;
                        let below = layer.lower_bound - boundary;
                        (above * values[j - 1] + below * values[j]) / width
                    }
                })
            })
            .collect()
    }

    /// Length-weighted average of the fine values over each coarse segment.
    /// Every overlap is clipped to the segment, so a fine layer spanning an
    /// entire segment contributes its full width.
    fn coarsen_value(&self, values: &[f64]) -> Vec<f64> {
        self.coarse
            .iter()
            .tuple_windows()
            .map(|(&seg_start, &seg_end)| {
                let mut weighted = 0.0;
                for (layer, &value) in self.fine.iter().zip(values) {
                    let clip = layer.lower_bound.min(seg_end) - layer.upper_bound.max(seg_start);
                    if clip > 0.0 {
                        weighted += clip * value;
                    }
                }
                weighted / (seg_end - seg_start)
            })
            .collect()
    }
}
