//! Classification of polylines by the raster surface they cross.
//!
//! Each polyline is resampled into evenly spaced points, every point is mapped
//! to an output class through the raster cell under it, the per-point classes
//! are smoothed so short excursions do not fragment the line, and the result is
//! cut into one sub-line per contiguous class run.
//!
//! The crate is I/O free: rasters are reached through [`grid::RasterSource`] and
//! lines arrive as [`geometry::Polyline`] values.

pub mod classes;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod pipeline;
pub mod segment;
pub mod smooth;
pub mod walk;

pub use classes::{parse_values, ClassDef, ClassTable, ClassValue};
pub use error::{ClassifyError, Result};
pub use geometry::{Point, Polyline};
pub use grid::{CellData, CellType, GridExtent, RasterGrid, RasterSource};
pub use pipeline::{
    classify, classify_all, survey, survey_all, total_counts, Classification, ClassCounts,
    ClassifiedLine, ClassifyParams,
};
pub use segment::{emit_segments, OutputSegment};
pub use smooth::SmoothingStrategy;
pub use walk::{walk_line, LineWalk, SamplePoint};
