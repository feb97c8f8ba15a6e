// Equivalent-injection consistency check
//
// Two runs that flip the same bit of the same register at the same cycle must
// end the same way. A group that does not points at nondeterminism in the
// simulation or at a log that was parsed wrongly.

use crate::campaign::Campaign;
use crate::error::{AnalysisError, Result};
use crate::outcome::OutcomeClass;
use crate::register_tree::NodeId;
use fnv::FnvHashMap;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabeledRun {
    pub run_id: String,
    pub class: OutcomeClass,
}

/// A set of equivalent runs that were classified differently
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InconsistentGroup {
    /// Key values, one per key field
    pub key: Vec<String>,
    pub runs: Vec<LabeledRun>,
}

/// Find groups of equivalent runs below `node` whose classes disagree
///
/// Runs are grouped by the values of `key_fields` (see
/// [`RunRecord::key_value`](crate::record::RunRecord::key_value)); runs
/// missing any key value are not grouped. Groups come back in first-appearance
/// order.
///
/// # Errors
/// `InvalidParameter` when `key_fields` is empty.
pub fn consistency_check<S: AsRef<str>>(
    campaign: &Campaign,
    node: NodeId,
    key_fields: &[S],
) -> Result<Vec<InconsistentGroup>> {
    if key_fields.is_empty() {
        return Err(AnalysisError::invalid("key_fields", "at least one key field is required"));
    }

    let runs = campaign.runs_under(node);
    let labels = campaign.classify_node(node);

    let mut index: FnvHashMap<Vec<String>, usize> = FnvHashMap::default();
    let mut groups: Vec<InconsistentGroup> = Vec::new();

    for run in runs {
        let key: Option<Vec<String>> = key_fields
            .iter()
            .map(|field| run.key_value(field.as_ref()))
            .collect();
        let (Some(key), Some(class)) = (key, labels.get(&run.id)) else {
            continue;
        };

        let labeled = LabeledRun {
            run_id: run.id.clone(),
            class,
        };
        match index.get(&key) {
            Some(&i) => groups[i].runs.push(labeled),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(InconsistentGroup {
                    key,
                    runs: vec![labeled],
                });
            }
        }
    }

    let inconsistent: Vec<InconsistentGroup> = groups
        .into_iter()
        .filter(|g| g.runs.iter().any(|r| r.class != g.runs[0].class))
        .collect();

    if !inconsistent.is_empty() {
        tracing::warn!(
            groups = inconsistent.len(),
            "Equivalent injections produced different outcomes"
        );
    }

    Ok(inconsistent)
}
