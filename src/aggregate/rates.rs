// Per-node and per-register rate tables

use crate::campaign::Campaign;
use crate::classifier::{classify_record, classify_with};
use crate::error::{AnalysisError, Result};
use crate::outcome::{OutcomeClass, PerClass};
use crate::probability::{adjusted_probability, AdjustedErrorProbability};
use crate::rate::{confidence_interval, windowed_rate, ConfidenceInterval, WindowPoint};
use crate::record::RunRecord;
use crate::register_tree::NodeId;
use fnv::FnvHashMap;
use serde::Serialize;

/// Class rates of one child node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChildRates {
    pub name: String,
    pub path: String,
    pub n_runs: usize,
    pub rates: PerClass<f64>,
}

/// Class proportions of one register group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegisterClassProportions {
    pub register: String,
    pub n_runs: usize,
    pub proportions: PerClass<f64>,
}

/// Hit count and observable error rate of one register
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegisterErrorSummary {
    pub register: String,
    pub hits: usize,
    /// Runs classified critical or corrupted
    pub errors: usize,
    pub error_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldMismatch {
    pub field: String,
    pub rate: f64,
}

/// How often each comparison field diverged from the golden run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldMismatchRates {
    pub n_runs: usize,
    pub fields: Vec<FieldMismatch>,
    /// Fraction of runs missing at least one required field
    pub failed_to_parse: f64,
}

/// Class rates over every run below `node`
///
/// # Errors
/// `InsufficientData` when no run falls under the node.
pub fn error_rate_by_type(campaign: &Campaign, node: NodeId) -> Result<PerClass<f64>> {
    campaign.classify_node(node).rates()
}

/// Class rates of each child of `node`
///
/// Rows are ordered by ascending silent rate, so the children with the largest
/// share of critical and corrupted runs come first. Children without any run
/// are left out.
pub fn error_rate_by_type_in_children(campaign: &Campaign, node: NodeId) -> Vec<ChildRates> {
    let tree = campaign.tree();
    let mut rows = Vec::new();

    for &child in tree.children(node) {
        let labels = campaign.classify_node(child);
        let Some(rates) = labels.counts().proportions() else {
            tracing::debug!(path = tree.node(child).path(), "No runs under child, skipping");
            continue;
        };

        let child_node = tree.node(child);
        rows.push(ChildRates {
            name: child_node.name().to_string(),
            path: child_node.path().to_string(),
            n_runs: labels.len(),
            rates,
        });
    }

    rows.sort_by(|a, b| a.rates.silent.total_cmp(&b.rates.silent));
    rows
}

/// Group runs by their key under `field`, keeping first-appearance order
fn group_by_key<'a>(runs: &[&'a RunRecord], field: &str) -> Vec<(String, Vec<&'a RunRecord>)> {
    let mut index: FnvHashMap<String, usize> = FnvHashMap::default();
    let mut groups: Vec<(String, Vec<&RunRecord>)> = Vec::new();
    let mut unkeyed = 0usize;

    for &run in runs {
        let Some(key) = run.key_value(field) else {
            unkeyed += 1;
            continue;
        };
        match index.get(&key) {
            Some(&i) => groups[i].1.push(run),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push((key, vec![run]));
            }
        }
    }

    if unkeyed > 0 {
        tracing::debug!(field, unkeyed, "Runs without a grouping value were skipped");
    }

    groups
}

/// Class proportions per register value below `node`
///
/// Runs are grouped by the literal value of `register_field` (falling back to
/// the target path), not by tree position, so one row appears per register
/// even when several registers share a leaf block. Classes absent from a group
/// are reported as 0.
pub fn stacked_register_error_class(
    campaign: &Campaign,
    node: NodeId,
    register_field: &str,
) -> Vec<RegisterClassProportions> {
    let runs = campaign.runs_under(node);

    group_by_key(&runs, register_field)
        .into_iter()
        .filter_map(|(register, group)| {
            let labels = classify_with(group, campaign.golden(), campaign.config());
            let proportions = labels.counts().proportions()?;
            Some(RegisterClassProportions {
                register,
                n_runs: labels.len(),
                proportions,
            })
        })
        .collect()
}

/// Hits and error rate per register, most error-prone first
pub fn error_rate_summary(campaign: &Campaign, node: NodeId) -> Vec<RegisterErrorSummary> {
    let runs = campaign.runs_under(node);
    let field = campaign.config().register_field.as_str();

    let mut rows: Vec<RegisterErrorSummary> = group_by_key(&runs, field)
        .into_iter()
        .filter_map(|(register, group)| {
            let labels = classify_with(group, campaign.golden(), campaign.config());
            if labels.is_empty() {
                return None;
            }
            let errors = labels.classes().filter(|c| c.is_error()).count();
            Some(RegisterErrorSummary {
                register,
                hits: labels.len(),
                errors,
                error_rate: errors as f64 / labels.len() as f64,
            })
        })
        .collect();

    rows.sort_by(|a, b| b.error_rate.total_cmp(&a.error_rate));
    rows
}

/// Per comparison field, the fraction of runs below `node` that differ from
/// the golden value
///
/// A field that is null in a run, or absent from the golden record, does not
/// count as a mismatch; nulls show up in `failed_to_parse` instead.
///
/// # Errors
/// `InsufficientData` when no run falls under the node.
pub fn field_mismatch_rates(campaign: &Campaign, node: NodeId) -> Result<FieldMismatchRates> {
    let runs = campaign.runs_under(node);
    if runs.is_empty() {
        return Err(AnalysisError::insufficient(1, 0));
    }

    let config = campaign.config();
    let golden = campaign.golden();
    let n = runs.len() as f64;

    let fields = config
        .compare_fields
        .iter()
        .map(|field| {
            let mismatches = runs
                .iter()
                .filter(|run| match (run.get(field), golden.get(field)) {
                    (Some(value), Some(expected)) => value != expected,
                    _ => false,
                })
                .count();
            FieldMismatch {
                field: field.clone(),
                rate: mismatches as f64 / n,
            }
        })
        .collect();

    let failed = runs
        .iter()
        .filter(|run| {
            classify_record(run, golden, &config.required_fields, &[] as &[String])
                == OutcomeClass::Critical
        })
        .count();

    Ok(FieldMismatchRates {
        n_runs: runs.len(),
        fields,
        failed_to_parse: failed as f64 / n,
    })
}

/// Point confidence interval of the class rates below `node`, at the
/// configured confidence level
pub fn confidence_interval_for(campaign: &Campaign, node: NodeId) -> Result<ConfidenceInterval> {
    let labels = campaign.classify_node(node);
    confidence_interval(&labels, campaign.config().confidence_level)
}

/// Windowed class rates below `node`, ordered by the configured ordering field
///
/// Runs without an ordering value cannot be placed on the time axis and are
/// left out with a warning.
pub fn windowed_rate_for(campaign: &Campaign, node: NodeId) -> Result<Vec<WindowPoint>> {
    let config = campaign.config();
    let runs = campaign.runs_under(node);

    let (ordered, order): (Vec<&RunRecord>, Vec<f64>) = runs
        .iter()
        .filter_map(|run| {
            run.ordering_value(&config.ordering_field)
                .map(|value| (*run, value))
        })
        .unzip();

    let dropped = runs.len() - ordered.len();
    if dropped > 0 {
        tracing::warn!(
            dropped,
            field = %config.ordering_field,
            "Runs without an ordering value were left out of the windowed rate"
        );
    }

    let labels = classify_with(ordered, campaign.golden(), config);
    if labels.is_empty() {
        return Err(AnalysisError::insufficient(config.window_size + 1, 0));
    }

    windowed_rate(&labels, &order, config.window_size, config.confidence_level)
}

/// Class rates below `node` rescaled to an injection space of `w_size` points
pub fn adjusted_probability_for(
    campaign: &Campaign,
    node: NodeId,
    w_size: f64,
) -> Result<AdjustedErrorProbability> {
    let labels = campaign.classify_node(node);
    adjusted_probability(&labels, w_size, labels.len())
}
