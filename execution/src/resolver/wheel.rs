//! Weighted segment selection and landing-zone offsets.

use crate::rng::PlayRng;

/// Result of a weighted draw.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeightedDraw {
    pub index: usize,
    /// The raw draw `r`, in `[0, total_weight)`.
    pub draw: f64,
    pub total_weight: f64,
}

/// Select the first index whose cumulative weight exceeds `r`.
///
/// Returns `None` when the weights are empty, contain a negative or
/// non-finite value, or sum to zero.
pub fn select_weighted(weights: &[f64], r: f64) -> Option<usize> {
    total_weight(weights)?;
    let mut cumulative = 0.0;
    for (index, weight) in weights.iter().enumerate() {
        cumulative += weight;
        if cumulative > r {
            return Some(index);
        }
    }
    // r landed on the rounding edge of the final sum
    weights.iter().rposition(|w| *w > 0.0)
}

/// Draw `r` in `[0, Σw)` and select a segment.
pub fn weighted_index(weights: &[f64], rng: &mut PlayRng) -> Option<WeightedDraw> {
    let total_weight = total_weight(weights)?;
    let draw = rng.unit() * total_weight;
    let index = select_weighted(weights, draw)?;
    Some(WeightedDraw {
        index,
        draw,
        total_weight,
    })
}

/// Random stop offset from the winning segment's center, in degrees.
///
/// The offset stays within `landing_zone` of the segment so the stop angle
/// never touches a neighbouring segment.
pub fn landing_offset(segment_angle: f64, landing_zone: f64, rng: &mut PlayRng) -> f64 {
    let half = segment_angle * landing_zone.clamp(0.0, 1.0) / 2.0;
    if half <= 0.0 {
        return 0.0;
    }
    rng.range(-half, half)
}

fn total_weight(weights: &[f64]) -> Option<f64> {
    if weights.is_empty() || weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return None;
    }
    let total: f64 = weights.iter().sum();
    (total > 0.0).then_some(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_weighted_boundaries() {
        let weights = [1.0, 0.0, 2.0, 1.0];
        assert_eq!(select_weighted(&weights, 0.0), Some(0));
        assert_eq!(select_weighted(&weights, 0.999), Some(0));
        // Zero-weight segments are never selected.
        assert_eq!(select_weighted(&weights, 1.0), Some(2));
        assert_eq!(select_weighted(&weights, 2.999), Some(2));
        assert_eq!(select_weighted(&weights, 3.0), Some(3));
        assert_eq!(select_weighted(&weights, 4.0), Some(3));
    }

    #[test]
    fn test_invalid_weights() {
        assert_eq!(select_weighted(&[], 0.0), None);
        assert_eq!(select_weighted(&[0.0, 0.0], 0.0), None);
        assert_eq!(select_weighted(&[1.0, -0.5], 0.0), None);
        assert_eq!(select_weighted(&[f64::INFINITY], 0.0), None);
        let mut rng = PlayRng::new(3);
        assert!(weighted_index(&[0.0], &mut rng).is_none());
    }

    #[test]
    fn test_weighted_frequencies_chi_square() {
        let weights = [1.0, 2.0, 3.0, 4.0, 0.0, 10.0];
        let total: f64 = weights.iter().sum();
        let trials = 20_000usize;
        let mut counts = [0usize; 6];
        let mut rng = PlayRng::new(0xDEADBEEF);
        for _ in 0..trials {
            let draw = weighted_index(&weights, &mut rng).expect("valid weights");
            assert!(draw.draw >= 0.0 && draw.draw < total);
            counts[draw.index] += 1;
        }
        assert_eq!(counts[4], 0, "zero-weight segment selected");

        let mut chi_square = 0.0;
        for (count, weight) in counts.iter().zip(weights.iter()) {
            if *weight == 0.0 {
                continue;
            }
            let expected = trials as f64 * weight / total;
            let diff = *count as f64 - expected;
            chi_square += diff * diff / expected;
        }
        // 4 degrees of freedom, p = 0.001 critical value is 18.47.
        assert!(chi_square < 18.47, "chi-square too large: {chi_square}");
    }

    #[test]
    fn test_landing_offset_stays_in_zone() {
        let mut rng = PlayRng::new(11);
        for _ in 0..1_000 {
            let offset = landing_offset(72.0, 0.8, &mut rng);
            assert!(offset >= -28.8 && offset < 28.8);
        }
        assert_eq!(landing_offset(72.0, 0.0, &mut rng), 0.0);
    }
}
