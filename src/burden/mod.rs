pub mod fisher;
pub mod output;

use crate::burden::fisher::fisher_exact_two_sided;
use crate::burden::output::{write_rows, GeneBurdenRow};
use crate::core::errors::CohortError;
use crate::core::utils::{create_spinner, record_line, table_reader};
use crate::rewrite::schema::{
    CONTROL_ALLELE_COUNT, CONTROL_DENOMINATOR, PROBAND_ALLELE_COUNT, PROBAND_DENOMINATOR,
};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use csv::StringRecord;
use indexmap::IndexMap;
use log::{debug, info, warn};
use std::io::{Read, Write};

/// Positions of the columns the burden test reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BurdenColumns {
    pub gene: usize,
    pub proband_denominator: usize,
    pub proband_alleles: usize,
    /// `(denominator, alleles)` when the table carries control statistics
    pub controls: Option<(usize, usize)>,
}

impl BurdenColumns {
    pub fn from_header(header: &StringRecord, gene_column: &str) -> Result<Self, CohortError> {
        let find = |name: &str| header.iter().position(|h| h == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| {
                CohortError::Schema(format!("required column '{}' not found in header", name))
            })
        };

        let gene = require(gene_column)?;
        let proband_denominator = require(PROBAND_DENOMINATOR)?;
        let proband_alleles = require(PROBAND_ALLELE_COUNT)?;

        let controls = match (find(CONTROL_DENOMINATOR), find(CONTROL_ALLELE_COUNT)) {
            (Some(denominator), Some(alleles)) => Some((denominator, alleles)),
            (None, None) => None,
            (Some(_), None) => {
                return Err(CohortError::Schema(format!(
                    "'{}' present without '{}'",
                    CONTROL_DENOMINATOR, CONTROL_ALLELE_COUNT
                )))
            }
            (None, Some(_)) => {
                return Err(CohortError::Schema(format!(
                    "'{}' present without '{}'",
                    CONTROL_ALLELE_COUNT, CONTROL_DENOMINATOR
                )))
            }
        };

        Ok(Self {
            gene,
            proband_denominator,
            proband_alleles,
            controls,
        })
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GeneTally {
    pub proband_alleles: u64,
    pub control_alleles: u64,
    pub max_proband_count: u64,
    pub max_control_count: u64,
    pub records: u64,
}

impl GeneTally {
    fn observe(&mut self, proband_count: u64, proband_alleles: u64, controls: Option<(u64, u64)>) {
        self.proband_alleles += proband_alleles;
        self.max_proband_count = self.max_proband_count.max(proband_count);
        if let Some((control_count, control_alleles)) = controls {
            self.control_alleles += control_alleles;
            self.max_control_count = self.max_control_count.max(control_count);
        }
        self.records += 1;
    }
}

/// Per-gene accumulator, in the order genes are first seen
#[derive(Debug, Default, Clone)]
pub struct GeneBurden {
    tallies: IndexMap<String, GeneTally>,
}

impl GeneBurden {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(
        &mut self,
        gene: &str,
        proband_count: u64,
        proband_alleles: u64,
        controls: Option<(u64, u64)>,
    ) {
        if let Some(tally) = self.tallies.get_mut(gene) {
            tally.observe(proband_count, proband_alleles, controls);
        } else {
            let mut tally = GeneTally::default();
            tally.observe(proband_count, proband_alleles, controls);
            self.tallies.insert(gene.to_string(), tally);
        }
    }

    pub fn get(&self, gene: &str) -> Option<&GeneTally> {
        self.tallies.get(gene)
    }

    pub fn num_genes(&self) -> usize {
        self.tallies.len()
    }

    /// Derive reference allele counts and test every gene.
    ///
    /// A negative derived count is reported and its row gets no p-value; the
    /// counts themselves are left as they are.
    pub fn finish(self) -> Result<Vec<GeneBurdenRow>> {
        self.tallies
            .into_iter()
            .map(|(gene, tally)| -> Result<GeneBurdenRow> {
                let proband_ref_alleles =
                    2 * tally.max_proband_count as i64 - tally.proband_alleles as i64;
                let control_ref_alleles =
                    2 * tally.max_control_count as i64 - tally.control_alleles as i64;

                let derived = [
                    (
                        "proband",
                        proband_ref_alleles,
                        tally.max_proband_count,
                        tally.proband_alleles,
                    ),
                    (
                        "control",
                        control_ref_alleles,
                        tally.max_control_count,
                        tally.control_alleles,
                    ),
                ];
                let mut anomalous = false;
                for (cohort, ref_alleles, max_count, alleles) in derived {
                    if ref_alleles < 0 {
                        anomalous = true;
                        warn!(
                            "{}",
                            CohortError::NegativeDerivedCount {
                                gene: gene.clone(),
                                cohort: cohort.to_string(),
                                max_count,
                                alleles,
                            }
                        );
                    }
                }

                let fisher_p_value = if anomalous {
                    None
                } else {
                    Some(fisher_exact_two_sided(
                        tally.proband_alleles,
                        tally.control_alleles,
                        proband_ref_alleles as u64,
                        control_ref_alleles as u64,
                    ))
                };

                Ok(GeneBurdenRow {
                    gene,
                    proband_alleles: tally.proband_alleles,
                    control_alleles: tally.control_alleles,
                    max_proband_count: tally.max_proband_count,
                    max_control_count: tally.max_control_count,
                    proband_ref_alleles,
                    control_ref_alleles,
                    fisher_p_value,
                })
            })
            .collect()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BurdenSummary {
    pub records: u64,
    pub genes: usize,
    pub anomalous_genes: usize,
}

fn parse_count(record: &StringRecord, idx: usize, column: &str, line: u64) -> Result<u64> {
    let value = record.get(idx).unwrap_or_default();
    value.trim().parse::<u64>().map_err(|_| {
        CohortError::InvalidValue {
            line,
            column: column.to_string(),
            value: value.to_string(),
        }
        .into()
    })
}

/// Aggregate an annotated, statistic-bearing table per gene and write the burden table
pub fn run_burden<R: Read, W: Write>(
    reader: R,
    writer: W,
    gene_column: &str,
    delimiter: u8,
) -> Result<BurdenSummary> {
    let mut reader = table_reader(reader, delimiter);
    let mut records = reader.records();

    let header = records
        .next()
        .ok_or_else(|| CohortError::Schema("input table has no header line".to_string()))?
        .wrap_err("Failed to read header line")?;
    let columns = BurdenColumns::from_header(&header, gene_column)?;
    if columns.controls.is_none() {
        info!("No control columns found, control allele counts will be 0");
    }

    let spinner = create_spinner("Aggregating allele counts per gene...");
    let mut burden = GeneBurden::new();
    let mut summary = BurdenSummary::default();

    for result in records {
        let record = result.wrap_err("Failed to read input record")?;
        let line = record_line(&record);

        let gene = record.get(columns.gene).unwrap_or_default().trim();
        if gene.is_empty() {
            debug!("Line {}: no gene annotation, skipping", line);
            continue;
        }

        let proband_count =
            parse_count(&record, columns.proband_denominator, PROBAND_DENOMINATOR, line)?;
        let proband_alleles =
            parse_count(&record, columns.proband_alleles, PROBAND_ALLELE_COUNT, line)?;
        let controls = match columns.controls {
            Some((denominator, alleles)) => Some((
                parse_count(&record, denominator, CONTROL_DENOMINATOR, line)?,
                parse_count(&record, alleles, CONTROL_ALLELE_COUNT, line)?,
            )),
            None => None,
        };

        burden.observe(gene, proband_count, proband_alleles, controls);
        summary.records += 1;
    }

    spinner.set_message("Testing genes...");
    let rows = burden.finish()?;
    spinner.finish_and_clear();

    summary.genes = rows.len();
    summary.anomalous_genes = rows.iter().filter(|r| r.is_anomalous()).count();
    write_rows(writer, &rows)?;

    info!(
        "Tested {} genes from {} records ({} with negative derived counts)",
        summary.genes, summary.records, summary.anomalous_genes
    );
    Ok(summary)
}
