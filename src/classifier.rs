//! Per-run outcome classification against the golden execution
//!
//! Precedence is fixed: a missing required field makes a run critical no
//! matter what its comparison fields say; only fully parsed runs can be
//! corrupted or silent.

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::outcome::{OutcomeClass, PerClass};
use crate::record::{GoldenRecord, RunRecord, RunTable};
use fnv::FnvHashMap;
use serde::Serialize;

/// Mapping from run id to outcome class
///
/// Labels keep the order of the classified records.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Classification {
    labels: Vec<(String, OutcomeClass)>,
    #[serde(skip)]
    index: FnvHashMap<String, usize>,
}

impl Classification {
    fn push(&mut self, id: &str, class: OutcomeClass) {
        self.index.insert(id.to_string(), self.labels.len());
        self.labels.push((id.to_string(), class));
    }

    pub fn get(&self, id: &str) -> Option<OutcomeClass> {
        self.index.get(id).map(|&i| self.labels[i].1)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// `(run_id, class)` pairs in record order
    pub fn iter(&self) -> impl Iterator<Item = (&str, OutcomeClass)> {
        self.labels.iter().map(|(id, c)| (id.as_str(), *c))
    }

    /// Classes in record order
    pub fn classes(&self) -> impl Iterator<Item = OutcomeClass> + '_ {
        self.labels.iter().map(|(_, c)| *c)
    }

    pub fn counts(&self) -> PerClass<usize> {
        let mut counts = PerClass::default();
        for class in self.classes() {
            *counts.get_mut(class) += 1;
        }
        counts
    }

    /// Run ids carrying a given class
    pub fn runs_with(&self, class: OutcomeClass) -> Vec<&str> {
        self.iter()
            .filter(|&(_, c)| c == class)
            .map(|(id, _)| id)
            .collect()
    }

    /// Per-class proportions over the whole population
    pub fn rates(&self) -> Result<PerClass<f64>> {
        self.counts()
            .proportions()
            .ok_or_else(|| AnalysisError::insufficient(1, 0))
    }
}

/// Classify a single record
///
/// Comparison is on typed values; a compare field missing from the golden
/// record is not compared.
pub fn classify_record<S: AsRef<str>>(
    record: &RunRecord,
    golden: &GoldenRecord,
    required_fields: &[S],
    compare_fields: &[S],
) -> OutcomeClass {
    if required_fields
        .iter()
        .any(|field| record.get(field.as_ref()).is_none())
    {
        return OutcomeClass::Critical;
    }

    let differs = compare_fields.iter().any(|field| {
        let field = field.as_ref();
        match (record.get(field), golden.get(field)) {
            (Some(value), Some(expected)) => value != expected,
            _ => false,
        }
    });

    if differs {
        OutcomeClass::Corruption
    } else {
        OutcomeClass::Silent
    }
}

/// Classify every record against the golden record
///
/// Every record gets exactly one class. Empty `records` or an empty `golden`
/// yield an empty classification so callers can compose over empty subtrees.
///
/// # Example
/// ```
/// use seuscope::classifier::classify;
/// use seuscope::outcome::OutcomeClass;
/// use seuscope::record::{GoldenRecord, RunRecord};
///
/// let golden = GoldenRecord::new().with_field("a", 1).with_field("b", 2);
/// let runs = vec![
///     RunRecord::new("R1").with_field("a", 1).with_field("b", 2),
///     RunRecord::new("R2").with_field("a", 1).with_null("b"),
///     RunRecord::new("R3").with_field("a", 5).with_field("b", 2),
/// ];
///
/// let fields = ["a", "b"];
/// let labels = classify(&runs, &golden, &fields, &fields);
/// assert_eq!(labels.get("R1"), Some(OutcomeClass::Silent));
/// assert_eq!(labels.get("R2"), Some(OutcomeClass::Critical));
/// assert_eq!(labels.get("R3"), Some(OutcomeClass::Corruption));
/// ```
pub fn classify<'a, I, S>(
    records: I,
    golden: &GoldenRecord,
    required_fields: &[S],
    compare_fields: &[S],
) -> Classification
where
    I: IntoIterator<Item = &'a RunRecord>,
    S: AsRef<str>,
{
    let mut classification = Classification::default();
    if golden.is_empty() {
        return classification;
    }

    for record in records {
        let class = classify_record(record, golden, required_fields, compare_fields);
        classification.push(&record.id, class);
    }

    if !classification.is_empty() {
        let counts = classification.counts();
        tracing::debug!(
            runs = classification.len(),
            sefi = counts.critical,
            sdc = counts.corruption,
            ne = counts.silent,
            "Classified runs"
        );
    }

    classification
}

/// Classify with the field sets of a configuration
pub fn classify_with<'a, I>(
    records: I,
    golden: &GoldenRecord,
    config: &AnalysisConfig,
) -> Classification
where
    I: IntoIterator<Item = &'a RunRecord>,
{
    classify(
        records,
        golden,
        &config.required_fields,
        &config.compare_fields,
    )
}

/// Check that every configured field exists somewhere in the campaign
///
/// A single run missing a field is normal (it makes that run critical). A
/// field that neither the golden record nor any run carries points at a
/// misconfiguration and is reported as `MissingField`, as is a configuration
/// with no fields at all.
pub fn validate_fields(
    records: &RunTable,
    golden: &GoldenRecord,
    config: &AnalysisConfig,
) -> Result<()> {
    if config.required_fields.is_empty() && config.compare_fields.is_empty() {
        return Err(AnalysisError::MissingField(
            "no required or comparison fields configured".to_string(),
        ));
    }
    if records.is_empty() || golden.is_empty() {
        return Ok(());
    }

    for field in config.required_fields.iter().chain(&config.compare_fields) {
        if !golden.contains(field) && !records.any_has_field(field) {
            return Err(AnalysisError::MissingField(format!(
                "'{}' is configured but present in neither the golden record nor any run",
                field
            )));
        }
    }

    Ok(())
}
