//! Construction of the fine depth partition from cumulative layer markers.

/// Label of the synthetic near-surface layer.
pub const SURFACE_LAYER_ID: &str = "A4m";

/// Thickness of the synthetic near-surface layer \[m\].
pub const SURFACE_LAYER_THICKNESS: f64 = 1.0;

/// Depth marker of the synthetic near-surface layer \[m\]. Anchors the
/// thickness recurrence for the first supplied record.
pub const SURFACE_LAYER_DEPTH: f64 = 1.5;

/// One raw geometry record: an element label and its cumulative depth marker
/// below the surface \[m\], in top-down order.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthRecord {
    pub id: String,
    pub depth: f64,
}

impl DepthRecord {
    pub fn new(id: impl Into<String>, depth: f64) -> Self {
        Self {
            id: id.into(),
            depth,
        }
    }
}

/// One element of the fine mesh. Depth is positive downward; layers tile the
/// axis contiguously from the surface, so `upper_bound < lower_bound` and each
/// layer's `upper_bound` equals its predecessor's `lower_bound`.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub id: String,
    /// Vertical extent \[m\].
    pub thickness: f64,
    /// Depth of the layer top \[m\].
    pub upper_bound: f64,
    /// Depth of the layer bottom \[m\].
    pub lower_bound: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum GeometryError {
    #[error("no depth records supplied")]
    NoRecords,

    #[error("record `{id}` at {depth} m yields non-positive thickness {thickness} m")]
    NonPositiveThickness { id: String, depth: f64, thickness: f64 },
}

/// Builds the fine depth partition from cumulative depth markers.
///
/// The synthetic near-surface layer is always prepended. Each subsequent
/// thickness follows the recurrence `t[i] = 2·(d[i] − (d[i−1] + t[i−1]/2))`,
/// and boundaries accumulate downward from 0, so the result is a contiguous,
/// strictly monotonic partition starting at the surface.
pub fn build_layers(records: &[DepthRecord]) -> Result<Vec<Layer>, GeometryError> {
    if records.is_empty() {
        return Err(GeometryError::NoRecords);
    }

    let mut layers = Vec::with_capacity(records.len() + 1);
    layers.push(Layer {
        id: SURFACE_LAYER_ID.to_string(),
        thickness: SURFACE_LAYER_THICKNESS,
        upper_bound: 0.0,
        lower_bound: SURFACE_LAYER_THICKNESS,
    });

    let mut prev_depth = SURFACE_LAYER_DEPTH;
    let mut prev_thickness = SURFACE_LAYER_THICKNESS;
    let mut bottom = SURFACE_LAYER_THICKNESS;

    for record in records {
        let thickness = 2.0 * (record.depth - (prev_depth + prev_thickness / 2.0));
        if thickness <= 0.0 {
            return Err(GeometryError::NonPositiveThickness {
                id: record.id.clone(),
                depth: record.depth,
                thickness,
            });
        }

        let upper_bound = bottom;
        bottom += thickness;
        layers.push(Layer {
            id: record.id.clone(),
            thickness,
            upper_bound,
            lower_bound: bottom,
        });

        prev_depth = record.depth;
        prev_thickness = thickness;
    }

    Ok(layers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn records(depths: &[f64]) -> Vec<DepthRecord> {
        depths
            .iter()
            .enumerate()
            .map(|(i, &depth)| DepthRecord::new(format!("L{:02}", i + 1), depth))
            .collect()
    }

    #[test]
    fn surface_layer_is_prepended() {
        let layers = build_layers(&records(&[2.5])).unwrap();
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0].id, SURFACE_LAYER_ID);
        assert_eq!(layers[0].upper_bound, 0.0);
        assert_eq!(layers[0].lower_bound, 1.0);
        // 2·(2.5 − (1.5 + 0.5)) = 1.0
        assert_approx_eq!(layers[1].thickness, 1.0, 1e-12);
        assert_eq!(layers[1].upper_bound, 1.0);
        assert_eq!(layers[1].lower_bound, 2.0);
    }

    #[test]
    fn thickness_recurrence_chains_downward() {
        let layers = build_layers(&records(&[2.5, 4.0, 7.0])).unwrap();
        let thicknesses: Vec<f64> = layers.iter().map(|l| l.thickness).collect();
        for (actual, expected) in thicknesses.iter().zip([1.0, 1.0, 2.0, 4.0]) {
            assert_approx_eq!(actual, expected, 1e-12);
        }
        assert_approx_eq!(layers.last().unwrap().lower_bound, 8.0, 1e-12);
    }

    #[test]
    fn partition_is_contiguous_and_covers_its_span() {
        let layers = build_layers(&records(&[2.5, 4.0, 7.0, 11.0, 18.0])).unwrap();

        let total: f64 = layers.iter().map(|l| l.thickness).sum();
        let span = layers.last().unwrap().lower_bound - layers[0].upper_bound;
        assert_approx_eq!(total, span, 1e-12);

        for pair in layers.windows(2) {
            assert!(pair[0].upper_bound < pair[0].lower_bound);
            assert_eq!(pair[0].lower_bound, pair[1].upper_bound);
        }
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(build_layers(&[]), Err(GeometryError::NoRecords)));
    }

    #[test]
    fn shallow_marker_is_rejected() {
        // A marker above the previous layer's implied bottom inverts the partition.
        let err = build_layers(&records(&[1.9])).unwrap_err();
        match err {
            GeometryError::NonPositiveThickness { id, thickness, .. } => {
                assert_eq!(id, "L01");
                assert!(thickness <= 0.0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
