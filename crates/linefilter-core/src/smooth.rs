//! Run-length smoothing of per-sample class sequences.
//!
//! A class switch is only honoured once the line has stayed in the new class for
//! at least that class's `min_steps` samples. Runs that meet their threshold are
//! *anchors*; every other run is absorbed into a neighbouring anchor region.
//!
//! Two policies are provided:
//!
//! * [`SmoothingStrategy::SeedPropagate`]: find the anchor closest to the middle
//!   of the line (left cursor checked before right at equal distance), then
//!   propagate outwards to both ends, each deficient sample taking the class of
//!   the last anchor passed on the way out.
//! * [`SmoothingStrategy::ForwardRun`]: one left-to-right pass over runs; a
//!   deficient run takes the class of the previous anchor, and runs before the
//!   first anchor take that anchor's class.
//!
//! When no run qualifies as an anchor the input is returned unchanged.

use serde::{Deserialize, Serialize};

/// Smoothing policy applied to the mapped class sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SmoothingStrategy {
    #[default]
    SeedPropagate,
    ForwardRun,
}

/// Length of the maximal constant run containing each position.
///
/// ```text
/// 0 0 0 0 1 1 1 0 0 1 1 1 1 1 1  <- classes
/// 4 4 4 4 3 3 3 2 2 6 6 6 6 6 6  <- run lengths
/// ```
pub fn run_lengths(classes: &[usize]) -> Vec<usize> {
    let mut counts = vec![0; classes.len()];
    let mut start = 0;
    for end in 1..=classes.len() {
        if end == classes.len() || classes[start] != classes[end] {
            counts[start..end].fill(end - start);
            start = end;
        }
    }
    counts
}

#[inline]
fn is_anchor(classes: &[usize], runs: &[usize], min_steps: &[usize], i: usize) -> bool {
    runs[i] >= min_steps[classes[i]]
}

/// Search outwards from the middle for the first anchor position.
///
/// Both cursors start at `n / 2`; each step checks the left cursor before the
/// right one, then moves them apart by one (clamped at the ends).
pub fn find_anchor(classes: &[usize], runs: &[usize], min_steps: &[usize]) -> Option<usize> {
    let n = classes.len();
    if n == 0 {
        return None;
    }
    let (mut lo, mut hi) = (n / 2, n / 2);
    loop {
        if is_anchor(classes, runs, min_steps, lo) {
            return Some(lo);
        }
        if is_anchor(classes, runs, min_steps, hi) {
            return Some(hi);
        }
        if lo == 0 && hi == n - 1 {
            return None;
        }
        lo = lo.saturating_sub(1);
        hi = (hi + 1).min(n - 1);
    }
}

/// Propagate anchor classes outwards from `anchor` to both ends of the line.
/// The first and last samples are smoothed like any other.
pub fn propagate(classes: &[usize], runs: &[usize], min_steps: &[usize], anchor: usize) -> Vec<usize> {
    let mut out = classes.to_vec();

    let mut absorb = |i: usize, governing: &mut usize| {
        if is_anchor(classes, runs, min_steps, i) {
            *governing = classes[i];
        } else {
            out[i] = *governing;
        }
    };

    let mut governing = classes[anchor];
    for i in (0..=anchor).rev() {
        absorb(i, &mut governing);
    }
    let mut governing = classes[anchor];
    for i in anchor..classes.len() {
        absorb(i, &mut governing);
    }
    out
}

fn forward_run(classes: &[usize], runs: &[usize], min_steps: &[usize]) -> Vec<usize> {
    let mut out = classes.to_vec();
    let mut governing: Option<usize> = None;
    let mut start = 0;
    while start < classes.len() {
        let len = runs[start];
        let end = start + len;
        let class = classes[start];
        if len >= min_steps[class] {
            if governing.is_none() {
                out[..start].fill(class);
            }
            governing = Some(class);
        } else if let Some(g) = governing {
            out[start..end].fill(g);
        }
        start = end;
    }
    out
}

/// Smooth `classes` given per-class minimum run lengths (`min_steps[class]`).
///
/// Returns a sequence of the same length. Every class index in `classes` must
/// be a valid index into `min_steps`.
pub fn smooth(classes: &[usize], min_steps: &[usize], strategy: SmoothingStrategy) -> Vec<usize> {
    let runs = run_lengths(classes);
    match strategy {
        SmoothingStrategy::SeedPropagate => match find_anchor(classes, &runs, min_steps) {
            Some(anchor) => {
                log::debug!("smoothing from anchor {anchor} of {}", classes.len());
                propagate(classes, &runs, min_steps, anchor)
            }
            None => {
                log::debug!("no anchor run in {} samples, leaving classes unsmoothed", classes.len());
                classes.to_vec()
            }
        },
        SmoothingStrategy::ForwardRun => forward_run(classes, &runs, min_steps),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_lengths_match_block_sizes() {
        let classes = [0, 0, 0, 0, 1, 1, 1, 0, 0, 1, 1, 1, 1, 1, 1];
        assert_eq!(
            run_lengths(&classes),
            vec![4, 4, 4, 4, 3, 3, 3, 2, 2, 6, 6, 6, 6, 6, 6]
        );
        assert_eq!(run_lengths(&[]), Vec::<usize>::new());
        assert_eq!(run_lengths(&[3]), vec![1]);
    }

    #[test]
    fn seed_search_checks_left_cursor_first() {
        // Middle sample (index 2) is deficient; indices 1 and 3 both anchor at
        // distance one, and the left one must win.
        let classes = [0, 0, 1, 2, 2];
        let min_steps = [2, 2, 2];
        let runs = run_lengths(&classes);
        assert_eq!(find_anchor(&classes, &runs, &min_steps), Some(1));
        assert_eq!(
            smooth(&classes, &min_steps, SmoothingStrategy::SeedPropagate),
            vec![0, 0, 0, 2, 2]
        );
    }

    #[test]
    fn seed_search_reaches_the_ends() {
        let classes = [0, 1, 2, 3, 4, 4];
        let min_steps = [1, 9, 9, 9, 9];
        let runs = run_lengths(&classes);
        assert_eq!(find_anchor(&classes, &runs, &min_steps), Some(0));
    }

    #[test]
    fn without_anchor_input_is_returned() {
        let classes = [0, 1, 0, 1, 1];
        let min_steps = [3, 3];
        for strategy in [SmoothingStrategy::SeedPropagate, SmoothingStrategy::ForwardRun] {
            assert_eq!(smooth(&classes, &min_steps, strategy), classes.to_vec());
        }
    }

    #[test]
    fn deficient_runs_take_the_class_of_the_anchor_passed_last() {
        let classes = [0, 0, 0, 1, 2, 2, 2];
        let min_steps = [2, 2, 2];
        assert_eq!(
            smooth(&classes, &min_steps, SmoothingStrategy::SeedPropagate),
            vec![0, 0, 0, 0, 2, 2, 2]
        );
    }

    #[test]
    fn deficient_runs_at_both_ends_are_absorbed() {
        let classes = [1, 0, 0, 0, 0, 2];
        let min_steps = [3, 3, 3];
        assert_eq!(
            smooth(&classes, &min_steps, SmoothingStrategy::SeedPropagate),
            vec![0; 6]
        );
    }

    #[test]
    fn noise_inside_a_long_run_is_removed() {
        let classes = [0, 0, 0, 0, 1, 0, 0, 0, 1, 1, 0, 0];
        let min_steps = [1, 3];
        assert_eq!(
            smooth(&classes, &min_steps, SmoothingStrategy::SeedPropagate),
            vec![0; 12]
        );
    }

    #[test]
    fn anchor_keeps_its_own_class() {
        let classes = [1, 1, 1, 0, 0];
        let min_steps = [5, 3];
        let out = smooth(&classes, &min_steps, SmoothingStrategy::SeedPropagate);
        assert_eq!(out, vec![1, 1, 1, 1, 1]);
    }

    #[test]
    fn already_smooth_sequences_are_unchanged() {
        let classes = [2, 2, 0, 0, 0, 1, 1, 1, 1, 2, 2];
        let min_steps = [3, 2, 2];
        for strategy in [SmoothingStrategy::SeedPropagate, SmoothingStrategy::ForwardRun] {
            let once = smooth(&classes, &min_steps, strategy);
            assert_eq!(once, classes.to_vec());
            assert_eq!(smooth(&once, &min_steps, strategy), once);
        }
    }

    #[test]
    fn strategies_differ_on_asymmetric_input() {
        let classes = [0, 0, 1, 2, 2, 2, 2, 2, 2];
        let min_steps = [2, 2, 2];
        assert_eq!(
            smooth(&classes, &min_steps, SmoothingStrategy::SeedPropagate),
            vec![0, 0, 2, 2, 2, 2, 2, 2, 2]
        );
        assert_eq!(
            smooth(&classes, &min_steps, SmoothingStrategy::ForwardRun),
            vec![0, 0, 0, 2, 2, 2, 2, 2, 2]
        );
    }

    #[test]
    fn forward_run_backfills_before_first_anchor() {
        let classes = [1, 2, 0, 0, 0, 1];
        let min_steps = [3, 3, 3];
        assert_eq!(
            smooth(&classes, &min_steps, SmoothingStrategy::ForwardRun),
            vec![0; 6]
        );
    }

    #[test]
    fn empty_sequence_smooths_to_empty() {
        assert!(smooth(&[], &[1], SmoothingStrategy::SeedPropagate).is_empty());
        assert!(smooth(&[], &[1], SmoothingStrategy::ForwardRun).is_empty());
    }

    #[test]
    fn strategy_names_deserialize_kebab_case() {
        let s: SmoothingStrategy = serde_json::from_str("\"forward-run\"").unwrap();
        assert_eq!(s, SmoothingStrategy::ForwardRun);
    }
}
