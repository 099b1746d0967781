use crate::core::roster::SampleRoster;
use crate::rewrite::stats::{CohortCounts, RecordStats};

pub const PROBAND_DENOMINATOR: &str = "proband_denominator";
pub const PROBAND_VARIANT_COUNT: &str = "proband_variant_count";
pub const PROBAND_ALLELE_COUNT: &str = "proband_allele_count";
pub const CONTROL_DENOMINATOR: &str = "control_denominator";
pub const CONTROL_VARIANT_COUNT: &str = "control_variant_count";
pub const CONTROL_ALLELE_COUNT: &str = "control_allele_count";

const PROBAND_COLUMNS: [&str; 3] = [
    PROBAND_DENOMINATOR,
    PROBAND_VARIANT_COUNT,
    PROBAND_ALLELE_COUNT,
];
const ALL_COLUMNS: [&str; 6] = [
    PROBAND_DENOMINATOR,
    PROBAND_VARIANT_COUNT,
    PROBAND_ALLELE_COUNT,
    CONTROL_DENOMINATOR,
    CONTROL_VARIANT_COUNT,
    CONTROL_ALLELE_COUNT,
];

/// Trailing statistic columns appended to every rewritten record.
///
/// Resolved once per run from the configuration and the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnPlan {
    None,
    Probands,
    ProbandsAndControls,
}

impl ColumnPlan {
    pub fn resolve(count_genotypes: bool, roster: &SampleRoster) -> Self {
        match (count_genotypes, roster.has_controls()) {
            (false, _) => ColumnPlan::None,
            (true, false) => ColumnPlan::Probands,
            (true, true) => ColumnPlan::ProbandsAndControls,
        }
    }

    pub fn header_names(&self) -> &'static [&'static str] {
        match self {
            ColumnPlan::None => &[],
            ColumnPlan::Probands => &PROBAND_COLUMNS,
            ColumnPlan::ProbandsAndControls => &ALL_COLUMNS,
        }
    }

    pub fn num_columns(&self) -> usize {
        self.header_names().len()
    }

    /// Render statistic values in header order
    pub fn values(&self, stats: &RecordStats) -> Vec<String> {
        let mut values = Vec::with_capacity(self.num_columns());
        match self {
            ColumnPlan::None => {}
            ColumnPlan::Probands => push_counts(&mut values, &stats.probands),
            ColumnPlan::ProbandsAndControls => {
                push_counts(&mut values, &stats.probands);
                push_counts(&mut values, &stats.controls.unwrap_or_default());
            }
        }
        values
    }
}

fn push_counts(values: &mut Vec<String>, counts: &CohortCounts) {
    values.push(counts.denominator.to_string());
    values.push(counts.variant_count.to_string());
    values.push(counts.allele_count().to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::roster::RosterPolicy;

    #[test]
    fn test_plan_resolution() {
        let no_controls = SampleRoster::from_samples(vec!["S1".into(), "S2".into()]).unwrap();
        let with_controls = SampleRoster::from_lists(
            vec!["S1".into(), "S2".into()],
            Some(vec!["S1".into()]),
            None,
            RosterPolicy::Reject,
        )
        .unwrap();

        assert_eq!(ColumnPlan::resolve(false, &with_controls), ColumnPlan::None);
        assert_eq!(ColumnPlan::resolve(true, &no_controls), ColumnPlan::Probands);
        assert_eq!(
            ColumnPlan::resolve(true, &with_controls),
            ColumnPlan::ProbandsAndControls
        );
        assert_eq!(ColumnPlan::None.num_columns(), 0);
        assert_eq!(ColumnPlan::Probands.num_columns(), 3);
        assert_eq!(ColumnPlan::ProbandsAndControls.num_columns(), 6);
    }

    #[test]
    fn test_values_order() {
        let stats = RecordStats {
            probands: CohortCounts {
                denominator: 3,
                variant_count: 2,
                het_count: 1,
                hom_count: 1,
            },
            controls: Some(CohortCounts {
                denominator: 5,
                variant_count: 1,
                het_count: 0,
                hom_count: 1,
            }),
        };
        assert_eq!(
            ColumnPlan::ProbandsAndControls.values(&stats),
            vec!["3", "2", "3", "5", "1", "2"]
        );
        assert_eq!(ColumnPlan::Probands.values(&stats), vec!["3", "2", "3"]);
        assert!(ColumnPlan::None.values(&stats).is_empty());
    }
}
