use thiserror::Error;

/// Domain errors raised while resolving rosters and processing variant tables.
///
/// Run functions return `color_eyre::Result`, so these surface wrapped in a
/// report; use `Report::downcast_ref::<CohortError>()` to inspect the kind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CohortError {
    #[error("Missing input: {what} ({reason})")]
    MissingInput { what: String, reason: String },

    #[error("Genotype vector has {found} entries but the sample roster has {expected}")]
    GenotypeArity { expected: usize, found: usize },

    #[error("Line {line}: genotype field {index} requested but the record has {found} fields")]
    MissingField {
        line: u64,
        index: usize,
        found: usize,
    },

    #[error("Malformed genotype code '{code}'")]
    MalformedGenotype { code: String },

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Line {line}: invalid value '{value}' in column '{column}'")]
    InvalidValue {
        line: u64,
        column: String,
        value: String,
    },

    #[error("Gene '{gene}': derived {cohort} reference allele count is negative ({max_count} individuals, {alleles} alternate alleles)")]
    NegativeDerivedCount {
        gene: String,
        cohort: String,
        max_count: u64,
        alleles: u64,
    },

    #[error("Roster inconsistency: {0}")]
    RosterConsistency(String),
}
