//! Geometry of the two depth discretizations and the transfer between them.
//!
//! The borefield model sees a coarse, uniform segmentation of the borehole;
//! the ground simulator resolves a finer stack of layers built from
//! cumulative depth markers. Both partitions are fixed for the lifetime of a
//! session.

mod grid;
mod layers;
mod mapping;

pub use grid::SegmentGrid;
pub use layers::{
    build_layers, DepthRecord, GeometryError, Layer, SURFACE_LAYER_DEPTH, SURFACE_LAYER_ID,
    SURFACE_LAYER_THICKNESS,
};
pub use mapping::{MapDirection, MappingError, MeshMap};
