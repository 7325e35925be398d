//! Per-polyline classification pipeline:
//! walk → raster lookup → class mapping → smoothing → segments.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::classes::ClassTable;
use crate::error::Result;
use crate::geometry::{Point, Polyline};
use crate::grid::RasterSource;
use crate::segment::{emit_segments, OutputSegment};
use crate::smooth::{smooth, SmoothingStrategy};
use crate::walk::{check_walk_params, walk_line, SamplePoint};

// ── Parameters ────────────────────────────────────────────────────────────────

/// Resampling and smoothing parameters shared by every polyline in a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifyParams {
    /// Target spacing between samples, in raster CRS units.
    pub step_length: f64,
    /// Distance within which the walk jumps straight to the next vertex.
    pub stretch: f64,
    pub strategy: SmoothingStrategy,
}

impl Default for ClassifyParams {
    fn default() -> Self {
        Self {
            step_length: 10.0,
            stretch: 1.0,
            strategy: SmoothingStrategy::SeedPropagate,
        }
    }
}

impl ClassifyParams {
    pub fn validate(&self) -> Result<()> {
        check_walk_params(self.step_length, self.stretch)
    }
}

// ── Frequency table ───────────────────────────────────────────────────────────

/// Occurrence count of each raw raster value seen while sampling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ClassCounts(BTreeMap<i64, u64>);

impl ClassCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, raw: i64) {
        *self.0.entry(raw).or_insert(0) += 1;
    }

    pub fn merge(&mut self, other: &ClassCounts) {
        for (&raw, &n) in &other.0 {
            *self.0.entry(raw).or_insert(0) += n;
        }
    }

    pub fn get(&self, raw: i64) -> u64 {
        self.0.get(&raw).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// (raw value, count) pairs in ascending raw-value order.
    pub fn iter(&self) -> impl Iterator<Item = (i64, u64)> + '_ {
        self.0.iter().map(|(&k, &v)| (k, v))
    }
}

impl FromIterator<i64> for ClassCounts {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        let mut counts = ClassCounts::new();
        for raw in iter {
            counts.record(raw);
        }
        counts
    }
}

// ── Results ───────────────────────────────────────────────────────────────────

/// Parallel per-sample arrays for one polyline; all have the same length.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedLine {
    pub samples: Vec<SamplePoint>,
    pub raw: Vec<i64>,
    pub mapped: Vec<usize>,
    pub final_class: Vec<usize>,
}

impl ClassifiedLine {
    pub fn points(&self) -> Vec<Point> {
        self.samples.iter().map(|s| s.point).collect()
    }
}

/// Complete result for one polyline.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub line: ClassifiedLine,
    pub segments: Vec<OutputSegment>,
    pub raw_counts: ClassCounts,
}

// ── Pipeline ──────────────────────────────────────────────────────────────────

/// Sample `line` and read the raw raster value under every sample.
fn sample_raw<R: RasterSource + ?Sized>(
    line: &Polyline,
    grid: &R,
    params: &ClassifyParams,
) -> Result<(Vec<SamplePoint>, Vec<i64>)> {
    let samples: Vec<SamplePoint> = walk_line(line, params.step_length, params.stretch)?.collect();
    let raw = samples
        .iter()
        .map(|s| grid.raw_value(s.point))
        .collect::<Result<Vec<i64>>>()?;
    Ok((samples, raw))
}

/// Raw-value frequency table for one polyline, without class mapping.
pub fn survey<R: RasterSource + ?Sized>(
    line: &Polyline,
    grid: &R,
    params: &ClassifyParams,
) -> Result<ClassCounts> {
    let (_, raw) = sample_raw(line, grid, params)?;
    Ok(raw.into_iter().collect())
}

/// Classify one polyline into per-class segments.
///
/// Any failure (too few vertices, a sample outside the raster, a value no class
/// claims) aborts the whole polyline; no partial segments are returned.
pub fn classify<R: RasterSource + ?Sized>(
    line: &Polyline,
    grid: &R,
    table: &ClassTable,
    params: &ClassifyParams,
) -> Result<Classification> {
    let (samples, raw) = sample_raw(line, grid, params)?;
    let nodata = grid.nodata();
    let mapped = raw
        .iter()
        .map(|&v| table.map(v, nodata))
        .collect::<Result<Vec<usize>>>()?;

    let final_class = smooth(&mapped, &table.thresholds(), params.strategy);
    let points: Vec<Point> = samples.iter().map(|s| s.point).collect();
    let segments = emit_segments(&points, &final_class);
    log::debug!(
        "{} vertices -> {} samples -> {} segments",
        line.len(),
        samples.len(),
        segments.len()
    );

    let raw_counts = raw.iter().copied().collect();
    Ok(Classification {
        line: ClassifiedLine { samples, raw, mapped, final_class },
        segments,
        raw_counts,
    })
}

/// Classify independent polylines, in parallel when the `threading` feature is
/// enabled. Results keep input order.
pub fn classify_all<R: RasterSource + ?Sized>(
    lines: &[Polyline],
    grid: &R,
    table: &ClassTable,
    params: &ClassifyParams,
) -> Vec<Result<Classification>> {
    #[cfg(feature = "threading")]
    {
        use rayon::prelude::*;
        lines.par_iter().map(|l| classify(l, grid, table, params)).collect()
    }
    #[cfg(not(feature = "threading"))]
    {
        lines.iter().map(|l| classify(l, grid, table, params)).collect()
    }
}

/// Frequency tables for independent polylines, in input order.
pub fn survey_all<R: RasterSource + ?Sized>(
    lines: &[Polyline],
    grid: &R,
    params: &ClassifyParams,
) -> Vec<Result<ClassCounts>> {
    #[cfg(feature = "threading")]
    {
        use rayon::prelude::*;
        lines.par_iter().map(|l| survey(l, grid, params)).collect()
    }
    #[cfg(not(feature = "threading"))]
    {
        lines.iter().map(|l| survey(l, grid, params)).collect()
    }
}

/// Merge the frequency tables of every successful result.
pub fn total_counts<'a, I>(results: I) -> ClassCounts
where
    I: IntoIterator<Item = &'a Result<Classification>>,
{
    let mut total = ClassCounts::new();
    for c in results.into_iter().flatten() {
        total.merge(&c.raw_counts);
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classes::{ClassDef, ClassValue};
    use crate::error::ClassifyError;
    use crate::grid::{CellData, GridExtent, RasterGrid};

    /// 10 columns of 10 m over x in [0, 100), values 0 left of x=50, 1 right.
    fn split_grid() -> RasterGrid {
        let extent = GridExtent::new(0.0, 10.0, 10.0, 10.0, 2, 10);
        let row: Vec<u8> = (0..10).map(|c| u8::from(c >= 5)).collect();
        let data = [row.clone(), row].concat();
        RasterGrid::new(extent, CellData::U8(data)).unwrap()
    }

    fn two_class_table(min_steps: usize) -> ClassTable {
        ClassTable::new(vec![
            ClassDef::new("left", vec![ClassValue::Value(0)], min_steps),
            ClassDef::new("right", vec![ClassValue::Value(1)], min_steps),
        ])
        .unwrap()
    }

    #[test]
    fn counts_merge_and_total() {
        let mut a: ClassCounts = [1, 1, 2].into_iter().collect();
        let b: ClassCounts = [2, 5].into_iter().collect();
        a.merge(&b);
        assert_eq!(a.get(1), 2);
        assert_eq!(a.get(2), 2);
        assert_eq!(a.get(5), 1);
        assert_eq!(a.get(7), 0);
        assert_eq!(a.total(), 5);
        assert_eq!(a.iter().map(|(k, _)| k).collect::<Vec<_>>(), vec![1, 2, 5]);
    }

    #[test]
    fn classified_arrays_are_aligned() {
        let line = Polyline::from_coords(&[(0.0, 5.0), (99.0, 5.0)]);
        let c = classify(&line, &split_grid(), &two_class_table(1), &ClassifyParams::default()).unwrap();
        let n = c.line.samples.len();
        assert_eq!(c.line.raw.len(), n);
        assert_eq!(c.line.mapped.len(), n);
        assert_eq!(c.line.final_class.len(), n);
        assert_eq!(c.raw_counts.total(), n as u64);
    }

    #[test]
    fn out_of_bounds_sample_aborts_the_line() {
        let line = Polyline::from_coords(&[(0.0, 5.0), (150.0, 5.0)]);
        let err = classify(&line, &split_grid(), &two_class_table(1), &ClassifyParams::default())
            .unwrap_err();
        assert!(matches!(err, ClassifyError::OutOfBounds { .. }));
    }

    #[test]
    fn unknown_value_aborts_the_line() {
        let table = ClassTable::new(vec![ClassDef::new("left", vec![ClassValue::Value(0)], 1)]).unwrap();
        let line = Polyline::from_coords(&[(0.0, 5.0), (90.0, 5.0)]);
        let err = classify(&line, &split_grid(), &table, &ClassifyParams::default()).unwrap_err();
        assert_eq!(err, ClassifyError::UnknownClass(1));
    }

    #[test]
    fn survey_ignores_class_table() {
        let line = Polyline::from_coords(&[(0.0, 5.0), (90.0, 5.0)]);
        let counts = survey(&line, &split_grid(), &ClassifyParams::default()).unwrap();
        assert_eq!(counts.get(0), 5);
        assert_eq!(counts.get(1), 5);
    }

    #[test]
    fn batch_keeps_order_and_merges_successes_only() {
        let lines = vec![
            Polyline::from_coords(&[(0.0, 5.0), (40.0, 5.0)]),
            Polyline::from_coords(&[(0.0, 5.0)]),
            Polyline::from_coords(&[(60.0, 5.0), (90.0, 5.0)]),
        ];
        let results = classify_all(&lines, &split_grid(), &two_class_table(1), &ClassifyParams::default());
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().segments[0].class, 0);
        assert!(matches!(results[1], Err(ClassifyError::InsufficientVertices { found: 1 })));
        assert_eq!(results[2].as_ref().unwrap().segments[0].class, 1);

        let total = total_counts(&results);
        assert_eq!(total.get(0), 5);
        assert_eq!(total.get(1), 4);
    }

    #[test]
    fn nodata_token_matches_declared_nodata() {
        let extent = GridExtent::new(0.0, 1.0, 1.0, 1.0, 1, 4);
        let grid = RasterGrid::new(extent, CellData::I16(vec![-9999, -9999, 3, 3]))
            .unwrap()
            .with_nodata(Some(-9999));
        let table = ClassTable::new(vec![
            ClassDef::new("gap", vec![ClassValue::NoData], 1),
            ClassDef::new("data", vec![ClassValue::Value(3)], 1),
        ])
        .unwrap();
        let params = ClassifyParams { step_length: 1.0, stretch: 0.0, ..Default::default() };
        let line = Polyline::from_coords(&[(0.5, 0.5), (3.5, 0.5)]);
        let c = classify(&line, &grid, &table, &params).unwrap();
        assert_eq!(c.line.mapped, vec![0, 0, 1, 1]);
        assert_eq!(c.segments.len(), 2);
    }

    #[test]
    fn invalid_params_are_reported() {
        let params = ClassifyParams { step_length: -1.0, ..Default::default() };
        assert!(params.validate().is_err());
        assert!(ClassifyParams::default().validate().is_ok());
    }
}
