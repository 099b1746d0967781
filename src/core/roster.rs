use crate::core::errors::CohortError;
use color_eyre::Result;
use indexmap::IndexSet;
use log::{debug, warn};
use std::path::Path;

/// What to do with proband/control identifiers that are not in the sample list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RosterPolicy {
    #[default]
    Reject,
    /// Warn and drop the unknown identifiers
    Ignore,
}

/// Resolve an identifier list from either an inline delimited string or a file.
///
/// If `spec` names an existing file its content is used: a single delimited
/// line when it contains `delimiter`, otherwise one identifier per line.
/// A single entry containing a path separator must be a readable file.
pub fn resolve_identifiers(spec: &str, delimiter: char) -> Result<Vec<String>> {
    let path = Path::new(spec);
    let content = if path.is_file() {
        std::fs::read_to_string(path).map_err(|e| CohortError::MissingInput {
            what: format!("identifier file '{}'", path.display()),
            reason: e.to_string(),
        })?
    } else if !spec.contains(delimiter) && looks_like_path(spec) {
        let reason = if path.exists() {
            "not a regular file"
        } else {
            "no such file"
        };
        return Err(CohortError::MissingInput {
            what: format!("identifier file '{}'", path.display()),
            reason: reason.to_string(),
        }
        .into());
    } else {
        debug!("Treating '{}' as an inline identifier list", spec);
        spec.to_string()
    };

    let ids: Vec<String> = if content.contains(delimiter) {
        content.split(delimiter).map(|s| s.trim().to_string()).collect()
    } else {
        content.lines().map(|s| s.trim().to_string()).collect()
    };

    Ok(ids.into_iter().filter(|s| !s.is_empty()).collect())
}

fn looks_like_path(spec: &str) -> bool {
    spec.contains('/') || spec.contains(std::path::MAIN_SEPARATOR)
}

/// The ordered sample list and its proband/control partition.
///
/// Position `i` in `samples` is the position of that sample in every genotype
/// vector, so the sample order is never changed.
#[derive(Debug, Clone)]
pub struct SampleRoster {
    samples: IndexSet<String>,
    probands: IndexSet<String>,
    controls: IndexSet<String>,
    is_proband: Vec<bool>,
    is_control: Vec<bool>,
}

impl SampleRoster {
    /// Resolve the roster from sample, proband and control specifications
    pub fn resolve(
        samples: &str,
        probands: Option<&str>,
        controls: Option<&str>,
        delimiter: char,
        policy: RosterPolicy,
    ) -> Result<Self> {
        if samples.trim().is_empty() {
            return Err(CohortError::MissingInput {
                what: "samples".to_string(),
                reason: "no sample specification given".to_string(),
            }
            .into());
        }
        let samples = resolve_identifiers(samples, delimiter)?;
        let probands = probands
            .map(|spec| resolve_identifiers(spec, delimiter))
            .transpose()?;
        let controls = controls
            .map(|spec| resolve_identifiers(spec, delimiter))
            .transpose()?;

        let roster = Self::from_lists(samples, probands, controls, policy)?;
        debug!(
            "Probands: [{}]; controls: [{}]",
            roster.probands().collect::<Vec<_>>().join(", "),
            roster.controls().collect::<Vec<_>>().join(", ")
        );
        Ok(roster)
    }

    /// Roster where every sample is a proband and there are no controls
    pub fn from_samples(samples: Vec<String>) -> Result<Self> {
        Self::from_lists(samples, None, None, RosterPolicy::Reject)
    }

    pub fn from_lists(
        samples: Vec<String>,
        probands: Option<Vec<String>>,
        controls: Option<Vec<String>>,
        policy: RosterPolicy,
    ) -> Result<Self> {
        if samples.is_empty() {
            return Err(CohortError::MissingInput {
                what: "samples".to_string(),
                reason: "sample specification resolved to no identifiers".to_string(),
            }
            .into());
        }

        let mut sample_set = IndexSet::with_capacity(samples.len());
        for sample in samples {
            if sample_set.contains(&sample) {
                return Err(CohortError::RosterConsistency(format!(
                    "Duplicate sample '{}' in sample list",
                    sample
                ))
                .into());
            }
            sample_set.insert(sample);
        }

        let probands = match probands {
            Some(ids) => restrict_to_samples(ids, &sample_set, "probands", policy)?,
            None => sample_set.clone(),
        };

        let controls = match controls {
            Some(ids) => restrict_to_samples(ids, &sample_set, "controls", policy)?,
            None => sample_set
                .iter()
                .filter(|s| !probands.contains(*s))
                .cloned()
                .collect(),
        };

        let is_proband = sample_set.iter().map(|s| probands.contains(s)).collect();
        let is_control = sample_set.iter().map(|s| controls.contains(s)).collect();

        debug!(
            "Roster: {} samples, {} probands, {} controls",
            sample_set.len(),
            probands.len(),
            controls.len()
        );

        Ok(Self {
            samples: sample_set,
            probands,
            controls,
            is_proband,
            is_control,
        })
    }

    /// Number of samples, which is also the expected genotype vector length
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> impl Iterator<Item = &str> {
        self.samples.iter().map(String::as_str)
    }

    pub fn probands(&self) -> impl Iterator<Item = &str> {
        self.probands.iter().map(String::as_str)
    }

    pub fn controls(&self) -> impl Iterator<Item = &str> {
        self.controls.iter().map(String::as_str)
    }

    pub fn num_probands(&self) -> usize {
        self.probands.len()
    }

    pub fn num_controls(&self) -> usize {
        self.controls.len()
    }

    pub fn has_controls(&self) -> bool {
        !self.controls.is_empty()
    }

    /// Sample name at a genotype vector position
    pub fn sample_at(&self, idx: usize) -> Option<&str> {
        self.samples.get_index(idx).map(String::as_str)
    }

    #[inline]
    pub fn is_proband(&self, idx: usize) -> bool {
        self.is_proband[idx]
    }

    #[inline]
    pub fn is_control(&self, idx: usize) -> bool {
        self.is_control[idx]
    }
}

fn restrict_to_samples(
    ids: Vec<String>,
    samples: &IndexSet<String>,
    set_name: &str,
    policy: RosterPolicy,
) -> Result<IndexSet<String>> {
    let mut kept = IndexSet::with_capacity(ids.len());
    let mut unknown = Vec::new();

    for id in ids {
        if samples.contains(&id) {
            if !kept.insert(id.clone()) {
                debug!("Dropping duplicate '{}' from {}", id, set_name);
            }
        } else {
            unknown.push(id);
        }
    }

    if !unknown.is_empty() {
        match policy {
            RosterPolicy::Reject => {
                return Err(CohortError::RosterConsistency(format!(
                    "{} not found in sample list: {}",
                    set_name,
                    unknown.join(", ")
                ))
                .into());
            }
            RosterPolicy::Ignore => {
                warn!(
                    "Ignoring {} {} not found in sample list: {}",
                    unknown.len(),
                    set_name,
                    unknown.join(", ")
                );
            }
        }
    }

    Ok(kept)
}
