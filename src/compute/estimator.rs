//! Complexity estimation via compressed length.
//!
//! The compressed length of a trace stands in for its (uncomputable)
//! Kolmogorov complexity. Lower values mean a more regular local pattern.
//! The proxy is order-sensitive, so traces compared against each other must
//! come from the same neighborhood template.

use crate::schema::EstimatorKind;

/// Capability interface for anything that can score a byte sequence.
///
/// Implementations must be pure: the same input always yields the same
/// output.
pub trait ComplexityEstimator: Send + Sync {
    /// Estimate the complexity of an ordered byte sequence.
    fn estimate(&self, sequence: &[u8]) -> usize;
}

/// LZ4 block-compressed length.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lz4Estimator;

impl ComplexityEstimator for Lz4Estimator {
    #[inline]
    fn estimate(&self, sequence: &[u8]) -> usize {
        lz4_flex::block::compress(sequence).len()
    }
}

/// Run-length encoded size: two bytes (value, count) per run.
///
/// Runs longer than 255 bytes are split. Useful where a test needs outputs
/// it can work out by hand.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunLengthEstimator;

impl ComplexityEstimator for RunLengthEstimator {
    fn estimate(&self, sequence: &[u8]) -> usize {
        let mut runs = 0;
        let mut iter = sequence.iter();
        let Some(&first) = iter.next() else {
            return 0;
        };

        let mut current = first;
        let mut length = 1usize;
        for &byte in iter {
            if byte == current && length < u8::MAX as usize {
                length += 1;
            } else {
                runs += 1;
                current = byte;
                length = 1;
            }
        }
        runs += 1;

        runs * 2
    }
}

impl EstimatorKind {
    /// Instantiate the selected estimator.
    pub fn build(self) -> Box<dyn ComplexityEstimator> {
        match self {
            EstimatorKind::Lz4 => Box::new(Lz4Estimator),
            EstimatorKind::RunLength => Box::new(RunLengthEstimator),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lz4_deterministic() {
        let trace: Vec<u8> = (0..49).map(|i| if i % 7 == 0 { 255 } else { 0 }).collect();
        let estimator = Lz4Estimator;

        assert_eq!(estimator.estimate(&trace), estimator.estimate(&trace));
        assert_eq!(estimator.estimate(&trace), Lz4Estimator.estimate(&trace.clone()));
    }

    #[test]
    fn test_lz4_prefers_regular_traces() {
        let uniform = vec![0u8; 49];
        let mut state = 7u64;
        let irregular: Vec<u8> = (0..49)
            .map(|_| {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                if state >> 63 == 1 { 255 } else { 0 }
            })
            .collect();

        let estimator = Lz4Estimator;
        assert!(estimator.estimate(&uniform) < estimator.estimate(&irregular));
    }

    #[test]
    fn test_run_length_counts_runs() {
        let estimator = RunLengthEstimator;

        assert_eq!(estimator.estimate(&[]), 0);
        assert_eq!(estimator.estimate(&[0, 0, 0]), 2);
        assert_eq!(estimator.estimate(&[0, 255, 255, 0]), 6);
    }

    #[test]
    fn test_run_length_splits_long_runs() {
        let estimator = RunLengthEstimator;
        assert_eq!(estimator.estimate(&[7u8; 255]), 2);
        assert_eq!(estimator.estimate(&[7u8; 256]), 4);
    }

    #[test]
    fn test_kind_builds_matching_estimator() {
        let trace = [0u8, 0, 255, 255, 255, 0];
        assert_eq!(
            EstimatorKind::RunLength.build().estimate(&trace),
            RunLengthEstimator.estimate(&trace)
        );
        assert_eq!(
            EstimatorKind::Lz4.build().estimate(&trace),
            Lz4Estimator.estimate(&trace)
        );
    }
}
