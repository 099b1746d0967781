use crate::core::config::{ArityPolicy, StreamConfig};
use crate::core::errors::CohortError;
use crate::core::genotype::Genotype;
use crate::core::roster::SampleRoster;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use csv::StringRecord;
use log::warn;

/// One genotype vector entry joined to its roster sample
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedGenotype<'r> {
    /// Position in the roster and in the genotype vector
    pub index: usize,
    pub sample: &'r str,
    pub genotype: Genotype,
}

/// Decode a comma-separated genotype vector against the roster
pub fn decode_vector<'r>(
    field: &str,
    roster: &'r SampleRoster,
) -> std::result::Result<Vec<DecodedGenotype<'r>>, CohortError> {
    let codes: Vec<&str> = field.split(',').collect();
    decode_codes(&codes, roster)
}

fn decode_codes<'r>(
    codes: &[&str],
    roster: &'r SampleRoster,
) -> std::result::Result<Vec<DecodedGenotype<'r>>, CohortError> {
    if codes.len() != roster.len() {
        return Err(CohortError::GenotypeArity {
            expected: roster.len(),
            found: codes.len(),
        });
    }

    codes
        .iter()
        .zip(roster.samples())
        .enumerate()
        .map(|(index, (code, sample))| {
            Genotype::parse(code).map(|genotype| DecodedGenotype {
                index,
                sample,
                genotype,
            })
        })
        .collect()
}

/// Pull the genotype field out of a record and decode it.
///
/// Returns `Ok(None)` when the record was dropped under [`ArityPolicy::Skip`].
/// Multiallelic collapses are logged here so every mode reports them the same way.
pub fn decode_record<'r>(
    record: &StringRecord,
    line: u64,
    config: &StreamConfig,
    roster: &'r SampleRoster,
) -> Result<Option<Vec<DecodedGenotype<'r>>>> {
    let field = record
        .get(config.genotype_idx())
        .ok_or(CohortError::MissingField {
            line,
            index: config.genotype_field,
            found: record.len(),
        })?;

    let codes: Vec<&str> = field.split(',').collect();
    let decoded = match decode_codes(&codes, roster) {
        Ok(decoded) => decoded,
        Err(CohortError::GenotypeArity { expected, found })
            if config.arity_policy == ArityPolicy::Skip =>
        {
            warn!(
                "Line {}: skipping record with {} genotypes (roster has {} samples)",
                line, found, expected
            );
            return Ok(None);
        }
        Err(e) => return Err(e).wrap_err(format!("Failed to decode genotypes on line {}", line)),
    };

    for entry in decoded.iter().filter(|d| d.genotype.collapsed) {
        warn!(
            "Line {}: multiallelic genotype '{}' for sample {} collapsed to '{}'",
            line, codes[entry.index], entry.sample, entry.genotype.code
        );
    }

    Ok(Some(decoded))
}

/// Number of genotypes in a decoded record that were collapsed
pub fn count_collapsed(decoded: &[DecodedGenotype]) -> usize {
    decoded.iter().filter(|d| d.genotype.collapsed).count()
}
