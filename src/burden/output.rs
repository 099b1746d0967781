use color_eyre::Result;
use serde::{Serialize, Serializer};
use std::io::Write;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneBurdenRow {
    pub gene: String,
    pub proband_alleles: u64,
    pub control_alleles: u64,
    pub max_proband_count: u64,
    pub max_control_count: u64,
    pub proband_ref_alleles: i64,
    pub control_ref_alleles: i64,
    /// `None` when the table could not be built (negative derived counts)
    #[serde(serialize_with = "serialize_p_value")]
    pub fisher_p_value: Option<f64>,
}

impl GeneBurdenRow {
    pub fn is_anomalous(&self) -> bool {
        self.proband_ref_alleles < 0 || self.control_ref_alleles < 0
    }
}

fn serialize_p_value<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(p) => serializer.serialize_f64(*p),
        None => serializer.serialize_str("NA"),
    }
}

/// Write the rows as a tab-separated table with a header line
pub fn write_rows<W: Write>(writer: W, rows: &[GeneBurdenRow]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(writer);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
