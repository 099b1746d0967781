use crate::core::decode::DecodedGenotype;
use crate::core::genotype::GenotypeClass;
use crate::core::roster::SampleRoster;

/// Genotype tallies for one cohort at one variant
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CohortCounts {
    /// Individuals contributing to the statistic
    pub denominator: u32,
    /// Individuals with any non-reference call
    pub variant_count: u32,
    pub het_count: u32,
    pub hom_count: u32,
}

impl CohortCounts {
    pub fn new(cohort_size: usize) -> Self {
        Self {
            denominator: cohort_size as u32,
            ..Default::default()
        }
    }

    #[inline]
    pub fn observe(&mut self, class: GenotypeClass, include_nocalls: bool) {
        match class {
            GenotypeClass::Reference => {}
            GenotypeClass::NoCall => {
                if include_nocalls {
                    self.denominator += 1;
                }
            }
            GenotypeClass::Heterozygous => {
                self.variant_count += 1;
                self.het_count += 1;
            }
            GenotypeClass::HomozygousAlt => {
                self.variant_count += 1;
                self.hom_count += 1;
            }
            GenotypeClass::VariantOther => self.variant_count += 1,
        }
    }

    #[inline]
    pub fn allele_count(&self) -> u32 {
        self.het_count + 2 * self.hom_count
    }
}

/// Proband and (when present) control counts for one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordStats {
    pub probands: CohortCounts,
    pub controls: Option<CohortCounts>,
}

impl RecordStats {
    pub fn from_decoded(
        decoded: &[DecodedGenotype],
        roster: &SampleRoster,
        include_nocalls: bool,
    ) -> Self {
        let mut probands = CohortCounts::new(roster.num_probands());
        let mut controls = roster
            .has_controls()
            .then(|| CohortCounts::new(roster.num_controls()));

        for entry in decoded {
            let class = entry.genotype.class;
            if roster.is_proband(entry.index) {
                probands.observe(class, include_nocalls);
            }
            if let Some(ref mut controls) = controls {
                if roster.is_control(entry.index) {
                    controls.observe(class, include_nocalls);
                }
            }
        }

        Self { probands, controls }
    }
}
