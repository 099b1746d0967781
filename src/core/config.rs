/// What to do with a record whose genotype vector does not match the roster length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArityPolicy {
    /// Fail the whole run on the first mismatched record
    #[default]
    Abort,
    /// Drop the record with a warning and keep going
    Skip,
}

/// How the input table is laid out
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Field delimiter of the input (and rewritten output) table
    pub delimiter: u8,
    /// 1-based index of the genotype vector field
    pub genotype_field: usize,
    pub arity_policy: ArityPolicy,
}

impl StreamConfig {
    pub fn new(delimiter: u8, genotype_field: usize, arity_policy: ArityPolicy) -> Self {
        Self {
            delimiter,
            genotype_field,
            arity_policy,
        }
    }

    /// 0-based position of the genotype field
    #[inline]
    pub fn genotype_idx(&self) -> usize {
        self.genotype_field - 1
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self::new(b'\t', 1, ArityPolicy::Abort)
    }
}

/// Parse a delimiter argument: `\t`, `tab`, or a single ASCII character
pub fn parse_delimiter(s: &str) -> Result<u8, String> {
    match s {
        "\\t" | "tab" | "\t" => Ok(b'\t'),
        _ => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii() => Ok(c as u8),
                _ => Err(format!(
                    "Delimiter must be a single ASCII character or 'tab', got '{}'",
                    s
                )),
            }
        }
    }
}

/// Parse a 1-based field index
pub fn parse_field_index(s: &str) -> Result<usize, String> {
    let idx: usize = s
        .parse()
        .map_err(|_| format!("Field index must be a positive integer, got '{}'", s))?;
    if idx == 0 {
        return Err("Field index is 1-based; 0 is not a valid column".to_string());
    }
    Ok(idx)
}
