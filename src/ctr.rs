//! Click-through-rate benchmark model.
//!
//! Industry-average CTR by organic ranking position, with linear
//! interpolation for fractional positions and a decay curve past the first
//! page. Every function here is pure and bit-reproducible for identical
//! input; the scorers depend on that for deterministic batch output.

/// Expected CTR for integer positions 1 through 10.
pub const CTR_BY_POSITION: [f64; 10] = [
    0.31, 0.24, 0.18, 0.13, 0.09, 0.06, 0.04, 0.03, 0.025, 0.02,
];

/// Expected CTR for a given average ranking position.
///
/// Positions in [1, 10] interpolate linearly between the neighboring integer
/// benchmarks. Positions past 10 decay as `0.02 * 10 / position` with a
/// 0.005 floor. Positions below 1 (and non-finite input) clamp to the
/// position-1 benchmark rather than crashing.
pub fn expected_ctr(position: f64) -> f64 {
    if !(position > 1.0) {
        return CTR_BY_POSITION[0];
    }
    if position <= 10.0 {
        let lower = position.floor();
        let upper = position.ceil();
        let low = CTR_BY_POSITION[lower as usize - 1];
        let high = CTR_BY_POSITION[upper as usize - 1];
        low + (high - low) * (position - lower)
    } else {
        (0.02 * 10.0 / position).max(0.005)
    }
}

/// Gap between the benchmark CTR for this position and the observed CTR,
/// floored at zero: an over-performing query has no CTR opportunity.
pub fn ctr_gap(position: f64, actual_ctr: f64) -> f64 {
    (expected_ctr(position) - actual_ctr).max(0.0)
}

/// Additional clicks available from closing the CTR gap alone.
pub fn traffic_potential(impressions: u64, gap: f64) -> u64 {
    (impressions as f64 * gap).floor() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_benchmarks_match_table() {
        assert_eq!(expected_ctr(1.0), 0.31);
        assert_eq!(expected_ctr(2.0), 0.24);
        assert_eq!(expected_ctr(5.0), 0.09);
        assert_eq!(expected_ctr(10.0), 0.02);
    }

    #[test]
    fn benchmarks_monotonically_non_increasing() {
        for p in 1..10 {
            assert!(
                expected_ctr(p as f64) >= expected_ctr((p + 1) as f64),
                "expected_ctr({}) < expected_ctr({})",
                p,
                p + 1
            );
        }
    }

    #[test]
    fn fractional_positions_interpolate() {
        // Halfway between position 1 (0.31) and position 2 (0.24)
        let mid = expected_ctr(1.5);
        assert!((mid - 0.275).abs() < 1e-12, "got {mid}");

        // Position 4.2 between 0.13 and 0.09
        let p42 = expected_ctr(4.2);
        assert!((p42 - 0.122).abs() < 1e-12, "got {p42}");
    }

    #[test]
    fn past_first_page_decays_with_floor() {
        let p20 = expected_ctr(20.0);
        assert!((p20 - 0.01).abs() < 1e-12, "got {p20}");

        // Deep positions bottom out at the floor
        assert_eq!(expected_ctr(50.0), 0.005);
        assert_eq!(expected_ctr(1000.0), 0.005);
    }

    #[test]
    fn positions_below_one_clamp_to_top() {
        assert_eq!(expected_ctr(0.5), 0.31);
        assert_eq!(expected_ctr(-3.0), 0.31);
        assert_eq!(expected_ctr(f64::NAN), 0.31);
    }

    #[test]
    fn gap_floors_at_zero() {
        // Position 2 benchmark is 0.24; an actual CTR above it yields no gap
        assert_eq!(ctr_gap(2.0, 0.30), 0.0);
        let gap = ctr_gap(2.0, 0.05);
        assert!((gap - 0.19).abs() < 1e-12, "got {gap}");
    }

    #[test]
    fn traffic_potential_floors() {
        assert_eq!(traffic_potential(500, 0.042), 21);
        assert_eq!(traffic_potential(0, 0.31), 0);
        assert_eq!(traffic_potential(99, 0.0), 0);
    }
}
