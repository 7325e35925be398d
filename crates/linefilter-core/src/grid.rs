//! Integer raster grids and nearest-cell lookup.

use serde::{Deserialize, Serialize};

use crate::error::{ClassifyError, Result};
use crate::geometry::Point;

/// Native cell width of a classification raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellType {
    I8,
    U8,
    I16,
    U16,
}

/// Row-major cell storage in the grid's native width.
#[derive(Debug, Clone, PartialEq)]
pub enum CellData {
    I8(Vec<i8>),
    U8(Vec<u8>),
    I16(Vec<i16>),
    U16(Vec<u16>),
}

impl CellData {
    pub fn len(&self) -> usize {
        match self {
            CellData::I8(v) => v.len(),
            CellData::U8(v) => v.len(),
            CellData::I16(v) => v.len(),
            CellData::U16(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn cell_type(&self) -> CellType {
        match self {
            CellData::I8(_) => CellType::I8,
            CellData::U8(_) => CellType::U8,
            CellData::I16(_) => CellType::I16,
            CellData::U16(_) => CellType::U16,
        }
    }

    #[inline]
    fn get(&self, idx: usize) -> i64 {
        match self {
            CellData::I8(v) => i64::from(v[idx]),
            CellData::U8(v) => i64::from(v[idx]),
            CellData::I16(v) => i64::from(v[idx]),
            CellData::U16(v) => i64::from(v[idx]),
        }
    }
}

/// Georeferenced extent of a north-up grid.
///
/// `cell_size_y` is stored positive; rows grow southwards from `top`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridExtent {
    pub left: f64,
    pub top: f64,
    pub cell_size_x: f64,
    pub cell_size_y: f64,
    pub rows: usize,
    pub cols: usize,
}

impl GridExtent {
    pub fn new(left: f64, top: f64, cell_size_x: f64, cell_size_y: f64, rows: usize, cols: usize) -> Self {
        Self { left, top, cell_size_x, cell_size_y, rows, cols }
    }

    pub fn bottom(&self) -> f64 {
        self.top - self.cell_size_y * self.rows as f64
    }

    pub fn right(&self) -> f64 {
        self.left + self.cell_size_x * self.cols as f64
    }

    /// Cell (col, row) containing `p`, or `OutOfBounds`.
    pub fn cell_of(&self, p: Point) -> Result<(usize, usize)> {
        let col = ((p.x - self.left) / self.cell_size_x).floor();
        let row = ((self.top - p.y) / self.cell_size_y).floor();

        let inside = col >= 0.0 && row >= 0.0 && col < self.cols as f64 && row < self.rows as f64;
        if !inside {
            return Err(ClassifyError::OutOfBounds {
                x: p.x,
                y: p.y,
                col: saturating_index(col),
                row: saturating_index(row),
                cols: self.cols,
                rows: self.rows,
            });
        }
        Ok((col as usize, row as usize))
    }
}

fn saturating_index(v: f64) -> i64 {
    if v.is_nan() {
        i64::MIN
    } else {
        v.clamp(i64::MIN as f64, i64::MAX as f64) as i64
    }
}

/// Read-only access to a classification raster.
pub trait RasterSource: Sync {
    fn extent(&self) -> &GridExtent;
    fn cell_type(&self) -> CellType;
    /// Value of the cell at (col, row). Callers guarantee the index is in range.
    fn value_at(&self, col: usize, row: usize) -> i64;
    /// Raw value flagged as nodata, if the raster declares one.
    fn nodata(&self) -> Option<i64>;

    /// Raw value of the cell containing `p` (nearest cell, no interpolation).
    fn raw_value(&self, p: Point) -> Result<i64> {
        let (col, row) = self.extent().cell_of(p)?;
        Ok(self.value_at(col, row))
    }
}

/// In-memory integer raster.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterGrid {
    extent: GridExtent,
    data: CellData,
    nodata: Option<i64>,
}

impl RasterGrid {
    /// Build a grid; `data` must hold exactly `rows * cols` cells and the cell
    /// sizes must be positive.
    pub fn new(extent: GridExtent, data: CellData) -> Result<Self> {
        if data.len() != extent.rows * extent.cols {
            return Err(ClassifyError::InvalidConfiguration(format!(
                "raster has {} cells, expected {}x{}",
                data.len(),
                extent.cols,
                extent.rows
            )));
        }
        if !(extent.cell_size_x > 0.0 && extent.cell_size_y > 0.0) {
            return Err(ClassifyError::InvalidConfiguration(format!(
                "raster cell size must be positive, got {}x{}",
                extent.cell_size_x, extent.cell_size_y
            )));
        }
        Ok(Self { extent, data, nodata: None })
    }

    pub fn with_nodata(mut self, nodata: Option<i64>) -> Self {
        self.nodata = nodata;
        self
    }

}

impl RasterSource for RasterGrid {
    fn extent(&self) -> &GridExtent {
        &self.extent
    }

    fn cell_type(&self) -> CellType {
        self.data.cell_type()
    }

    #[inline]
    fn value_at(&self, col: usize, row: usize) -> i64 {
        debug_assert!(
            col < self.extent.cols && row < self.extent.rows,
            "cell ({col}, {row}) outside {}x{} grid",
            self.extent.cols,
            self.extent.rows
        );
        self.data.get(row * self.extent.cols + col)
    }

    fn nodata(&self) -> Option<i64> {
        self.nodata
    }
}
