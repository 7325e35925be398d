//! Re-segmentation of a classified sample sequence into per-class sub-lines.

use serde::Serialize;

use crate::geometry::Point;

/// One contiguous run of a single final class, as geometry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputSegment {
    pub class: usize,
    pub points: Vec<Point>,
}

/// Segment under construction.
#[derive(Debug)]
struct SegmentAccumulator {
    class: usize,
    points: Vec<Point>,
}

impl SegmentAccumulator {
    fn open(class: usize, first: Point) -> Self {
        Self { class, points: vec![first] }
    }

    /// Close with `boundary` as the last point (shared with the next segment).
    fn close(mut self, boundary: Point) -> OutputSegment {
        self.points.push(boundary);
        OutputSegment { class: self.class, points: self.points }
    }
}

/// Group consecutive equal-class samples into segments.
///
/// A segment ends at the first point of the next class, so neighbouring segments
/// share their boundary point. When only the very last sample differs from its
/// predecessor it already closes the previous segment and contributes no
/// segment of its own, which keeps every segment at two or more points.
///
/// `points` and `classes` must have the same length. An empty input yields no
/// segments; a single point yields one single-point segment.
pub fn emit_segments(points: &[Point], classes: &[usize]) -> Vec<OutputSegment> {
    debug_assert_eq!(points.len(), classes.len());

    let mut out = Vec::new();
    let Some((&first, &first_class)) = points.first().zip(classes.first()) else {
        return out;
    };

    let mut acc = SegmentAccumulator::open(first_class, first);
    for (&p, &class) in points.iter().zip(classes).skip(1) {
        if class == acc.class {
            acc.points.push(p);
        } else {
            let next = SegmentAccumulator::open(class, p);
            out.push(std::mem::replace(&mut acc, next).close(p));
        }
    }

    if acc.points.len() >= 2 || out.is_empty() {
        out.push(OutputSegment { class: acc.class, points: acc.points });
    } else {
        log::debug!("dropping trailing single-sample run of class {}", acc.class);
    }
    out
}
