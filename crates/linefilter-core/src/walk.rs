//! Polyline resampling: walks a polyline and yields evenly spaced sample
//! points, one vertex-to-vertex segment at a time.
//!
//! Each segment of length `d` is split into `steps = max(1, round(d / step_length))`
//! equal sub-steps. The walk stops short of a segment's end vertex as soon as the
//! next sub-step would land within `stretch` of it, so no near-zero trailing
//! sample is produced. The final vertex of the polyline is always emitted.

use std::iter::FusedIterator;

use crate::error::{ClassifyError, Result};
use crate::geometry::{Point, Polyline};

/// A sample point on the walked line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePoint {
    pub point: Point,
    /// True when the point is an original polyline vertex.
    pub is_vertex: bool,
}

/// Validate resampling parameters shared by every walk.
pub fn check_walk_params(step_length: f64, stretch: f64) -> Result<()> {
    if !(step_length.is_finite() && step_length > 0.0) {
        return Err(ClassifyError::InvalidParameter {
            name: "step_length",
            value: step_length,
            reason: "must be a finite value > 0",
        });
    }
    if !(stretch.is_finite() && stretch >= 0.0) {
        return Err(ClassifyError::InvalidParameter {
            name: "stretch",
            value: stretch,
            reason: "must be a finite value >= 0",
        });
    }
    Ok(())
}

/// Number of equal sub-steps for a segment of length `distance`.
/// Rounds half up and never returns less than 1.
#[inline]
pub fn segment_steps(distance: f64, step_length: f64) -> usize {
    ((distance / step_length + 0.5).floor() as usize).max(1)
}

/// Start a lazy walk over `line`.
///
/// Fails with `InsufficientVertices` for lines with fewer than two vertices and
/// with `InvalidParameter` for a non-positive `step_length` or negative `stretch`.
pub fn walk_line(line: &Polyline, step_length: f64, stretch: f64) -> Result<LineWalk<'_>> {
    check_walk_params(step_length, stretch)?;
    if line.vertices.len() < 2 {
        return Err(ClassifyError::InsufficientVertices {
            found: line.vertices.len(),
        });
    }
    Ok(LineWalk {
        vertices: &line.vertices,
        step_length,
        stretch,
        seg: 0,
        segment: None,
        finished: false,
    })
}

/// Per-segment walk state.
#[derive(Debug, Clone, Copy)]
struct SegmentCursor {
    end: Point,
    cur: Point,
    dx: f64,
    dy: f64,
    steps: usize,
    taken: usize,
}

/// Iterator over the sample points of one polyline. Finite and not restartable.
#[derive(Debug, Clone)]
pub struct LineWalk<'a> {
    vertices: &'a [Point],
    step_length: f64,
    stretch: f64,
    /// Index of the current segment's start vertex.
    seg: usize,
    segment: Option<SegmentCursor>,
    finished: bool,
}

impl LineWalk<'_> {
    fn open_segment(&self) -> SegmentCursor {
        let start = self.vertices[self.seg];
        let end = self.vertices[self.seg + 1];
        let steps = segment_steps(start.distance(end), self.step_length);
        SegmentCursor {
            end,
            cur: start,
            dx: (end.x - start.x) / steps as f64,
            dy: (end.y - start.y) / steps as f64,
            steps,
            taken: 0,
        }
    }
}

impl Iterator for LineWalk<'_> {
    type Item = SamplePoint;

    fn next(&mut self) -> Option<SamplePoint> {
        if self.finished {
            return None;
        }
        if self.seg + 1 >= self.vertices.len() {
            self.finished = true;
            let last = *self.vertices.last()?;
            return Some(SamplePoint { point: last, is_vertex: true });
        }

        let mut cursor = match self.segment {
            Some(c) => c,
            None => self.open_segment(),
        };

        let out = SamplePoint {
            point: cursor.cur,
            is_vertex: cursor.taken == 0,
        };
        cursor.cur = Point::new(cursor.cur.x + cursor.dx, cursor.cur.y + cursor.dy);
        cursor.taken += 1;

        if cursor.taken >= cursor.steps || cursor.cur.distance(cursor.end) <= self.stretch {
            self.segment = None;
            self.seg += 1;
        } else {
            self.segment = Some(cursor);
        }
        Some(out)
    }
}

impl FusedIterator for LineWalk<'_> {}
