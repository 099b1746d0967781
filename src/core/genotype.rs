use crate::core::errors::CohortError;

const NO_CALL: &str = ".";

/// Classification of a single normalized genotype code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenotypeClass {
    /// All alleles are 0
    Reference,
    /// One allele 0, the other alternate (in either order)
    Heterozygous,
    /// Both alleles alternate
    HomozygousAlt,
    /// At least one allele is the no-call token
    NoCall,
    /// Non-reference code that is not a diploid het/hom call (haploid, polyploid)
    VariantOther,
}

impl GenotypeClass {
    /// Anything that is neither reference nor a no-call
    #[inline]
    pub fn is_variant(self) -> bool {
        !matches!(self, GenotypeClass::Reference | GenotypeClass::NoCall)
    }
}

/// A genotype code after phasing is dropped and alternate alleles are collapsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Genotype {
    /// Normalized code, `/`-separated, every alternate allele written as `1`
    pub code: String,
    pub class: GenotypeClass,
    /// True when an allele index >= 2 was collapsed to 1
    pub collapsed: bool,
}

impl Genotype {
    /// Normalize and classify a raw code such as `0|1`, `1/2` or `./.`
    ///
    /// The collapse is lossy: `1/2` becomes `1/1` and classifies as
    /// [`GenotypeClass::HomozygousAlt`]. Only the presence of a non-reference
    /// allele survives, not which one.
    pub fn parse(raw: &str) -> Result<Self, CohortError> {
        let raw = raw.trim();
        let malformed = || CohortError::MalformedGenotype {
            code: raw.to_string(),
        };
        if raw.is_empty() {
            return Err(malformed());
        }

        let mut alleles: Vec<Option<u8>> = Vec::with_capacity(2);
        let mut collapsed = false;
        for allele in raw.split(['/', '|']) {
            if allele == NO_CALL {
                alleles.push(None);
                continue;
            }
            if allele.is_empty() || !allele.bytes().all(|b| b.is_ascii_digit()) {
                return Err(malformed());
            }
            // any index >= 2, however many digits, is just "alternate"
            if allele.bytes().all(|b| b == b'0') {
                alleles.push(Some(0));
            } else if allele == "1" {
                alleles.push(Some(1));
            } else {
                collapsed = true;
                alleles.push(Some(1));
            }
        }

        let class = classify(&alleles);
        let code = alleles
            .iter()
            .map(|a| match a {
                Some(0) => "0",
                Some(_) => "1",
                None => NO_CALL,
            })
            .collect::<Vec<_>>()
            .join("/");

        Ok(Self {
            code,
            class,
            collapsed,
        })
    }

    #[inline]
    pub fn is_variant(&self) -> bool {
        self.class.is_variant()
    }
}

fn classify(alleles: &[Option<u8>]) -> GenotypeClass {
    if alleles.iter().any(Option::is_none) {
        return GenotypeClass::NoCall;
    }
    if alleles.iter().all(|a| *a == Some(0)) {
        return GenotypeClass::Reference;
    }
    match alleles {
        [Some(0), Some(1)] | [Some(1), Some(0)] => GenotypeClass::Heterozygous,
        [Some(1), Some(1)] => GenotypeClass::HomozygousAlt,
        _ => GenotypeClass::VariantOther,
    }
}
