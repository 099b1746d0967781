use statrs::function::factorial::ln_binomial;

/// Tables this much more likely than the observed one still count as "as extreme"
const RELATIVE_TOLERANCE: f64 = 1e-7;

/// Two-sided Fisher exact test p-value for the 2x2 table `[[a, b], [c, d]]`.
///
/// Sums the hypergeometric probability of every table with the same margins
/// that is no more likely than the observed table. Probabilities are compared
/// in log space, so cohorts with thousands of alleles stay finite.
pub fn fisher_exact_two_sided(a: u64, b: u64, c: u64, d: u64) -> f64 {
    let total = a + b + c + d;
    if total == 0 {
        return 1.0;
    }
    let row1 = a + b;
    let col1 = a + c;

    let ln_norm = ln_binomial(total, col1);
    let ln_pmf = |x: u64| ln_binomial(row1, x) + ln_binomial(total - row1, col1 - x) - ln_norm;

    let observed = ln_pmf(a);
    let threshold = observed + RELATIVE_TOLERANCE.ln_1p();
    let lo = col1.saturating_sub(total - row1);
    let hi = row1.min(col1);

    let p: f64 = (lo..=hi)
        .map(ln_pmf)
        .filter(|&ln_p| ln_p <= threshold)
        .map(|ln_p| (ln_p - observed).exp())
        .sum::<f64>()
        * observed.exp();

    p.min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case((1, 9, 11, 3), 0.002_759_456)]
    #[case((3, 1, 1, 3), 0.485_714_286)]
    #[case((5, 0, 15, 20), 0.047_124_047)]
    #[case((7, 2, 193, 198), 0.174_734_806)]
    #[case((3, 1, 197, 199), 0.623_113_199)]
    #[case((10, 10, 990, 990), 1.0)]
    #[case((30, 10, 970, 990), 0.002_008_334)]
    #[case((0, 12, 1000, 988), 0.000_472_341)]
    #[case((2, 2, 2, 2), 1.0)]
    #[case((0, 0, 10, 10), 1.0)]
    #[case((0, 0, 0, 0), 1.0)]
    fn test_known_p_values(#[case] table: (u64, u64, u64, u64), #[case] expected: f64) {
        let (a, b, c, d) = table;
        let p = fisher_exact_two_sided(a, b, c, d);
        assert!(
            (p - expected).abs() < 1e-6,
            "table {:?}: got {}, expected {}",
            table,
            p,
            expected
        );
    }

    #[test]
    fn test_symmetric_under_transpose() {
        let p = fisher_exact_two_sided(4, 10, 16, 30);
        let transposed = fisher_exact_two_sided(4, 16, 10, 30);
        assert!((p - transposed).abs() < 1e-9);
    }

    #[test]
    fn test_large_cohort_stays_finite() {
        // 1000 probands and 1000 controls, 4000 alleles in total
        let p = fisher_exact_two_sided(25, 40, 1975, 1960);
        assert!(p.is_finite() && p > 0.0 && p <= 1.0, "p = {}", p);
    }

    #[test]
    fn test_bounded() {
        for (a, b, c, d) in [(0, 5, 5, 0), (10, 0, 0, 10), (1, 1, 1, 1), (0, 0, 0, 3)] {
            let p = fisher_exact_two_sided(a, b, c, d);
            assert!(p > 0.0 && p <= 1.0, "p = {}", p);
        }
    }
}
