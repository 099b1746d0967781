use crate::core::config::StreamConfig;
use crate::core::decode::{decode_record, DecodedGenotype};
use crate::core::roster::SampleRoster;
use crate::core::utils::{create_spinner, record_line, table_reader};
use bitvec::prelude::*;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;
use std::io::{Read, Write};

/// Samples with at least one non-reference genotype anywhere in the stream
#[derive(Debug, Clone)]
pub struct CarrierSet {
    carriers: BitVec,
}

impl CarrierSet {
    pub fn new(num_samples: usize) -> Self {
        Self {
            carriers: bitvec![0; num_samples],
        }
    }

    pub fn observe(&mut self, decoded: &[DecodedGenotype]) {
        for entry in decoded.iter().filter(|d| d.genotype.is_variant()) {
            self.carriers.set(entry.index, true);
        }
    }

    pub fn len(&self) -> usize {
        self.carriers.count_ones()
    }

    pub fn is_empty(&self) -> bool {
        self.carriers.not_any()
    }

    /// Carrier names in roster order
    pub fn samples<'r>(&'r self, roster: &'r SampleRoster) -> impl Iterator<Item = &'r str> {
        self.carriers
            .iter_ones()
            .filter_map(move |idx| roster.sample_at(idx))
    }

    pub fn render(&self, roster: &SampleRoster, separator: &str) -> String {
        self.samples(roster).collect::<Vec<_>>().join(separator)
    }
}

/// Fold the whole stream into a [`CarrierSet`] and write it as one delimited line
pub fn run_carriers<R: Read, W: Write>(
    reader: R,
    mut writer: W,
    roster: &SampleRoster,
    config: &StreamConfig,
    separator: &str,
) -> Result<CarrierSet> {
    let spinner = create_spinner("Collecting carriers...");
    let mut reader = table_reader(reader, config.delimiter);
    let mut carriers = CarrierSet::new(roster.len());
    let mut num_records = 0u64;

    // first line is the header
    for result in reader.records().skip(1) {
        let record = result.wrap_err("Failed to read input record")?;
        if let Some(decoded) = decode_record(&record, record_line(&record), config, roster)? {
            carriers.observe(&decoded);
            num_records += 1;
        }
    }
    spinner.finish_and_clear();

    writeln!(writer, "{}", carriers.render(roster, separator))?;
    writer.flush()?;

    info!(
        "Found {} carrier samples across {} records",
        carriers.len(),
        num_records
    );
    Ok(carriers)
}
