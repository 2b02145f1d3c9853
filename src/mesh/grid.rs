//! The borefield model's coarse segment partition of the depth axis.

/// Uniform segmentation of the borehole depth range, as seen by the borefield
/// model. Session-constant.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentGrid {
    /// Number of segments.
    pub count: usize,
    /// Height of each segment \[m\].
    pub height: f64,
}

impl SegmentGrid {
    pub fn new(count: usize, height: f64) -> Self {
        debug_assert!(count >= 1, "segment grid needs at least one segment");
        debug_assert!(height > 0.0, "segment height must be positive");
        Self { count, height }
    }

    /// The `count + 1` segment boundaries, top down from the surface \[m\].
    pub fn boundaries(&self) -> Vec<f64> {
        (0..=self.count).map(|i| i as f64 * self.height).collect()
    }

    /// Depth of the deepest segment boundary \[m\].
    pub fn domain_end(&self) -> f64 {
        self.count as f64 * self.height
    }
}

/// Ten segments of ten metres, matching the borefield model's discretization.
impl Default for SegmentGrid {
    fn default() -> Self {
        Self::new(10, 10.0)
    }
}
