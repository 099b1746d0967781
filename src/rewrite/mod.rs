pub mod schema;
pub mod stats;

use crate::core::config::StreamConfig;
use crate::core::decode::{count_collapsed, decode_record, DecodedGenotype};
use crate::core::roster::SampleRoster;
use crate::core::utils::{record_line, table_reader, table_writer};
use crate::rewrite::schema::ColumnPlan;
use crate::rewrite::stats::RecordStats;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use csv::StringRecord;
use log::{info, warn};
use rayon::prelude::*;
use std::io::{Read, Write};

/// Records decoded in parallel before the batch is written out in order
const BATCH_SIZE: usize = 10_000;

#[derive(Debug, Clone)]
pub struct RewriteConfig {
    pub stream: StreamConfig,
    /// Emit `sample(genotype)` instead of bare sample names
    pub append_genotype: bool,
    /// Joins the sample tokens of the rewritten genotype field
    pub separator: String,
    /// Count no-calls into the cohort denominators
    pub include_nocalls: bool,
    /// Append the per-record cohort statistic columns
    pub count_genotypes: bool,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            stream: StreamConfig::default(),
            append_genotype: false,
            separator: ",".to_string(),
            include_nocalls: false,
            count_genotypes: false,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RewriteSummary {
    pub records_written: u64,
    pub records_skipped: u64,
    pub genotypes_collapsed: u64,
}

#[derive(Debug, Clone)]
pub struct RewrittenRecord {
    pub record: StringRecord,
    /// Genotypes in this record that went through multiallelic collapse
    pub collapsed: usize,
}

/// Rewrites the genotype field of each record into carrier sample names
#[derive(Debug)]
pub struct Rewriter<'a> {
    roster: &'a SampleRoster,
    config: &'a RewriteConfig,
    plan: ColumnPlan,
}

impl<'a> Rewriter<'a> {
    pub fn new(roster: &'a SampleRoster, config: &'a RewriteConfig) -> Self {
        let plan = ColumnPlan::resolve(config.count_genotypes, roster);
        Self {
            roster,
            config,
            plan,
        }
    }

    pub fn plan(&self) -> ColumnPlan {
        self.plan
    }

    /// Header line with the statistic column names appended
    pub fn header(&self, header: &StringRecord) -> StringRecord {
        let mut out = header.clone();
        for name in self.plan.header_names() {
            out.push_field(name);
        }
        out
    }

    /// Carrier tokens joined in roster order; empty when nobody carries a variant
    pub fn rewrite_field(&self, decoded: &[DecodedGenotype]) -> String {
        decoded
            .iter()
            .filter(|d| d.genotype.is_variant())
            .map(|d| {
                if self.config.append_genotype {
                    format!("{}({})", d.sample, d.genotype.code)
                } else {
                    d.sample.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(&self.config.separator)
    }

    /// Rewrite one data record. `None` means the record was skipped.
    pub fn rewrite(&self, record: &StringRecord, line: u64) -> Result<Option<RewrittenRecord>> {
        let Some(decoded) = decode_record(record, line, &self.config.stream, self.roster)? else {
            return Ok(None);
        };

        let genotype_idx = self.config.stream.genotype_idx();
        let field = self.rewrite_field(&decoded);

        let mut out = StringRecord::with_capacity(record.as_slice().len(), record.len());
        for (idx, value) in record.iter().enumerate() {
            if idx == genotype_idx {
                out.push_field(&field);
            } else {
                out.push_field(value);
            }
        }

        if self.plan != ColumnPlan::None {
            let stats = RecordStats::from_decoded(&decoded, self.roster, self.config.include_nocalls);
            for value in self.plan.values(&stats) {
                out.push_field(&value);
            }
        }

        Ok(Some(RewrittenRecord {
            record: out,
            collapsed: count_collapsed(&decoded),
        }))
    }
}

/// Stream a variant table through the rewriter, preserving record order
pub fn run_rewrite<R: Read, W: Write>(
    reader: R,
    writer: W,
    roster: &SampleRoster,
    config: &RewriteConfig,
) -> Result<RewriteSummary> {
    let rewriter = Rewriter::new(roster, config);
    let mut reader = table_reader(reader, config.stream.delimiter);
    let mut writer = table_writer(writer, config.stream.delimiter);
    let mut summary = RewriteSummary::default();

    let mut records = reader.records();
    let header = match records.next() {
        Some(result) => result.wrap_err("Failed to read header line")?,
        None => {
            warn!("Input table is empty, nothing to rewrite");
            return Ok(summary);
        }
    };
    writer.write_record(&rewriter.header(&header))?;

    let mut batch: Vec<StringRecord> = Vec::with_capacity(BATCH_SIZE);
    loop {
        batch.clear();
        for result in records.by_ref().take(BATCH_SIZE) {
            batch.push(result.wrap_err("Failed to read input record")?);
        }
        if batch.is_empty() {
            break;
        }

        let rewritten = batch
            .par_iter()
            .map(|record| rewriter.rewrite(record, record_line(record)))
            .collect::<Result<Vec<_>>>()?;

        for result in rewritten {
            match result {
                Some(rewritten) => {
                    writer.write_record(&rewritten.record)?;
                    summary.records_written += 1;
                    summary.genotypes_collapsed += rewritten.collapsed as u64;
                }
                None => summary.records_skipped += 1,
            }
        }
    }
    writer.flush()?;

    info!(
        "Rewrote {} records ({} skipped, {} multiallelic genotypes collapsed)",
        summary.records_written, summary.records_skipped, summary.genotypes_collapsed
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ArityPolicy;
    use crate::core::errors::CohortError;
    use crate::core::roster::RosterPolicy;

    fn roster() -> SampleRoster {
        SampleRoster::from_samples(vec!["S1".into(), "S2".into(), "S3".into()]).unwrap()
    }

    fn config(append_genotype: bool, count_genotypes: bool) -> RewriteConfig {
        RewriteConfig {
            stream: StreamConfig::new(b'\t', 3, ArityPolicy::Abort),
            append_genotype,
            separator: ";".to_string(),
            include_nocalls: false,
            count_genotypes,
        }
    }

    fn rewrite_fields(rewriter: &Rewriter, fields: &[&str]) -> Vec<String> {
        let record = StringRecord::from(fields.to_vec());
        rewriter
            .rewrite(&record, 2)
            .unwrap()
            .unwrap()
            .record
            .iter()
            .map(String::from)
            .collect()
    }

    fn run(input: &str, roster: &SampleRoster, config: &RewriteConfig) -> Result<String> {
        let mut out = Vec::new();
        run_rewrite(input.as_bytes(), &mut out, roster, config)?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn test_rewrite_sample_names() {
        let roster = roster();
        let config = config(false, true);
        let rewriter = Rewriter::new(&roster, &config);
        let fields = rewrite_fields(&rewriter, &["chr1", "100", "0/1,0/0,1/1", "GENE1"]);
        assert_eq!(fields, vec!["chr1", "100", "S1;S3", "GENE1", "3", "2", "3"]);
    }

    #[test]
    fn test_rewrite_appends_genotype() {
        let roster = roster();
        let config = config(true, false);
        let rewriter = Rewriter::new(&roster, &config);
        let fields = rewrite_fields(&rewriter, &["chr1", "100", "0/1,0/0,1|1"]);
        assert_eq!(fields, vec!["chr1", "100", "S1(0/1);S3(1/1)"]);
    }

    #[test]
    fn test_all_reference_rewrites_to_empty_field() {
        let roster = roster();
        let config = config(false, true);
        let rewriter = Rewriter::new(&roster, &config);
        let fields = rewrite_fields(&rewriter, &["chr1", "100", "0/0,0/0,0/0"]);
        assert_eq!(fields, vec!["chr1", "100", "", "3", "0", "0"]);
    }

    #[test]
    fn test_nocalls_counted_but_not_emitted() {
        let roster = roster();
        let mut config = config(false, true);
        config.include_nocalls = true;
        let rewriter = Rewriter::new(&roster, &config);
        let fields = rewrite_fields(&rewriter, &["chr1", "100", "./.,0/0,0/1"]);
        assert_eq!(fields, vec!["chr1", "100", "S3", "4", "1", "1"]);
    }

    #[test]
    fn test_multiallelic_genotype_is_written_collapsed() {
        let roster = roster();
        let config = config(true, false);
        let rewriter = Rewriter::new(&roster, &config);
        let record = StringRecord::from(vec!["chr1", "100", "0/2,0/0,0/0"]);
        let rewritten = rewriter.rewrite(&record, 2).unwrap().unwrap();
        assert_eq!(rewritten.record.get(2), Some("S1(0/1)"));
        assert_eq!(rewritten.collapsed, 1);
    }

    #[test]
    fn test_token_count_matches_variant_entries() {
        let roster = roster();
        let config = config(false, false);
        let rewriter = Rewriter::new(&roster, &config);
        for vector in ["0/1,./.,1/1", "0/0,0/0,0/0", "1/0,0|1,1/2", "./.,./.,0/0"] {
            let expected = vector
                .split(',')
                .filter(|code| !matches!(*code, "0/0" | "./."))
                .count();
            let fields = rewrite_fields(&rewriter, &["chr1", "1", vector]);
            let tokens = fields[2].split(';').filter(|t| !t.is_empty()).count();
            assert_eq!(tokens, expected, "vector {}", vector);
        }
    }

    #[test]
    fn test_run_rewrite_header_and_controls() {
        let roster = SampleRoster::from_lists(
            vec!["S1".into(), "S2".into(), "S3".into()],
            Some(vec!["S1".into(), "S2".into()]),
            None,
            RosterPolicy::Reject,
        )
        .unwrap();
        let config = config(false, true);
        let input = "CHROM\tPOS\tGT\n\
                     chr1\t100\t0/1,0/0,1/1\n\
                     chr1\t200\t1/1,0/1,0/0\n";
        let output = run(input, &roster, &config).unwrap();
        assert_eq!(
            output,
            "CHROM\tPOS\tGT\tproband_denominator\tproband_variant_count\tproband_allele_count\tcontrol_denominator\tcontrol_variant_count\tcontrol_allele_count\n\
             chr1\t100\tS1;S3\t2\t1\t1\t1\t1\t2\n\
             chr1\t200\tS1;S2\t2\t2\t3\t1\t0\t0\n"
        );
    }

    #[test]
    fn test_run_rewrite_without_stats_keeps_header() {
        let roster = roster();
        let config = config(false, false);
        let input = "CHROM\tPOS\tGT\nchr1\t100\t0/1,0/0,1/1\n";
        let output = run(input, &roster, &config).unwrap();
        assert_eq!(output, "CHROM\tPOS\tGT\nchr1\t100\tS1;S3\n");
    }

    #[test]
    fn test_run_rewrite_aborts_on_arity_mismatch() {
        let roster = roster();
        let config = config(false, false);
        let input = "CHROM\tPOS\tGT\nchr1\t100\t0/1,0/0\nchr1\t200\t0/1,0/0,0/0\n";
        let err = run(input, &roster, &config).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CohortError>(),
            Some(CohortError::GenotypeArity {
                expected: 3,
                found: 2
            })
        ));
    }

    #[test]
    fn test_run_rewrite_skips_arity_mismatch() {
        let roster = roster();
        let mut config = config(false, false);
        config.stream.arity_policy = ArityPolicy::Skip;
        let input = "CHROM\tPOS\tGT\nchr1\t100\t0/1,0/0\nchr1\t200\t0/1,0/0,0/0\n";
        let mut out = Vec::new();
        let summary = run_rewrite(input.as_bytes(), &mut out, &roster, &config).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "CHROM\tPOS\tGT\nchr1\t200\tS1\n"
        );
        assert_eq!(summary.records_written, 1);
        assert_eq!(summary.records_skipped, 1);
    }

    #[test]
    fn test_run_rewrite_preserves_order_across_batches() {
        let roster = roster();
        let config = config(false, false);
        let mut input = String::from("CHROM\tPOS\tGT\n");
        let mut expected = input.clone();
        for pos in 0..(BATCH_SIZE + 25) {
            let (vector, field) = if pos % 2 == 0 {
                ("0/1,0/0,0/0", "S1")
            } else {
                ("0/0,0/0,1/1", "S3")
            };
            input.push_str(&format!("chr1\t{}\t{}\n", pos, vector));
            expected.push_str(&format!("chr1\t{}\t{}\n", pos, field));
        }
        assert_eq!(run(&input, &roster, &config).unwrap(), expected);
    }

    #[test]
    fn test_empty_input() {
        let roster = roster();
        let config = config(false, true);
        assert_eq!(run("", &roster, &config).unwrap(), "");
    }
}
