// Run-length encoding of boolean masks into shaded intervals.

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum IntervalError {
    #[error("mask has {mask} samples but domain has {domain}")]
    LengthMismatch { mask: usize, domain: usize },
}

/// Closed-open span of sample positions `[start, end)`.
///
/// `end` is the first position after the run, which equals the domain length
/// when the run reaches the last sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Interval {
    pub start: usize,
    pub end: usize,
}

impl Interval {
    /// Index values bounding this interval, end exclusive.
    ///
    /// A run that reaches the end of the domain has no following sample, so
    /// its end is extended by the last index step (or by 1 for a single
    /// sample domain) to keep it the same width as an inner run.
    pub fn bounds(&self, domain: &[i64]) -> Option<(i64, i64)> {
        let start = *domain.get(self.start)?;
        let end = match domain.get(self.end) {
            Some(&end) => end,
            None => match domain {
                [.., prev, last] => last + (last - prev),
                [last] => last + 1,
                [] => return None,
            },
        };
        Some((start, end))
    }
}

/// Split the true positions of `mask` into maximal contiguous runs.
///
/// `domain` only fixes the expected length; index values are looked up later
/// through [`Interval::bounds`].
pub fn encode<T>(mask: &[bool], domain: &[T]) -> Result<Vec<Interval>, IntervalError> {
    if mask.len() != domain.len() {
        return Err(IntervalError::LengthMismatch {
            mask: mask.len(),
            domain: domain.len(),
        });
    }
    Ok(encode_mask(mask))
}

fn encode_mask(mask: &[bool]) -> Vec<Interval> {
    let mut intervals = Vec::new();
    let mut open: Option<usize> = None;

    for (i, &set) in mask.iter().enumerate() {
        match (set, open) {
            (true, None) => open = Some(i),
            (false, Some(start)) => {
                intervals.push(Interval { start, end: i });
                open = None;
            }
            _ => {}
        }
    }

    if let Some(start) = open {
        intervals.push(Interval {
            start,
            end: mask.len(),
        });
    }

    intervals
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn iv(start: usize, end: usize) -> Interval {
        Interval { start, end }
    }

    #[test]
    fn test_mixed_mask() {
        let mask = [false, false, true, true, true, false, true];
        let domain: Vec<i64> = (0..=6).collect();
        let intervals = encode(&mask, &domain).unwrap();
        assert_eq!(intervals, vec![iv(2, 5), iv(6, 7)]);
    }

    #[test]
    fn test_empty_mask() {
        let domain: [u8; 0] = [];
        assert!(encode(&[], &domain).unwrap().is_empty());
    }

    #[test]
    fn test_all_true_and_all_false() {
        let domain = ["a", "b", "c"];
        assert_eq!(encode(&[true; 3], &domain).unwrap(), vec![iv(0, 3)]);
        assert!(encode(&[false; 3], &domain).unwrap().is_empty());
    }

    #[test]
    fn test_length_mismatch() {
        let err = encode(&[true, false], &[1, 2, 3]).unwrap_err();
        assert_eq!(err, IntervalError::LengthMismatch { mask: 2, domain: 3 });
    }

    #[test]
    fn test_bounds_use_domain_values() {
        let domain = [10, 15, 20, 25];
        let intervals = encode(&[false, true, false, true], &domain).unwrap();
        assert_eq!(intervals[0].bounds(&domain), Some((15, 20)));
        // Trailing run is as wide as the inner one.
        assert_eq!(intervals[1].bounds(&domain), Some((25, 30)));
    }

    #[test]
    fn test_single_sample_trailing_run_has_width() {
        let domain: Vec<i64> = (0..=6).collect();
        let mask = [false, false, true, true, true, false, true];
        let spans: Vec<(i64, i64)> = encode(&mask, &domain)
            .unwrap()
            .iter()
            .filter_map(|interval| interval.bounds(&domain))
            .collect();
        assert_eq!(spans, vec![(2, 5), (6, 7)]);

        let single = [42];
        let intervals = encode(&[true], &single).unwrap();
        assert_eq!(intervals[0].bounds(&single), Some((42, 43)));
    }

    proptest! {
        #[test]
        fn prop_intervals_cover_exactly_true_positions(
            mask in prop::collection::vec(any::<bool>(), 0..200),
        ) {
            let intervals = encode_mask(&mask);

            for pair in intervals.windows(2) {
                // Sorted, disjoint and not mergeable.
                prop_assert!(pair[0].end < pair[1].start);
            }
            for interval in &intervals {
                prop_assert!(interval.start < interval.end);
            }

            let mut covered = vec![false; mask.len()];
            for interval in &intervals {
                for i in interval.start..interval.end {
                    covered[i] = true;
                }
            }
            prop_assert_eq!(covered, mask);
        }

        #[test]
        fn prop_reencoding_is_idempotent(
            mask in prop::collection::vec(any::<bool>(), 0..200),
        ) {
            let intervals = encode_mask(&mask);
            let mut rebuilt = vec![false; mask.len()];
            for interval in &intervals {
                rebuilt[interval.start..interval.end].fill(true);
            }
            prop_assert_eq!(encode_mask(&rebuilt), intervals);
        }
    }
}
