// How much of the register tree was actually hit by the campaign
//
// A leaf register counts as populated when at least one run targeted it
// exactly. Unpopulated leaves point at registers the injector never reached.

use crate::record::RunRecord;
use crate::register_tree::{NodeId, RegisterTree};
use fnv::FnvHashSet;
use serde::Serialize;

/// Leaf coverage of a campaign
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeCoverage {
    /// Number of leaf registers in the tree
    pub leaves: usize,
    /// Leaves hit by at least one run
    pub populated: usize,
    /// Paths of leaves no run targeted, in pre-order
    pub unpopulated: Vec<String>,
}

impl TreeCoverage {
    /// Percentage of leaves never hit (0-100)
    pub fn unpopulated_percent(&self) -> f64 {
        if self.leaves == 0 {
            return 0.0;
        }
        self.unpopulated.len() as f64 * 100.0 / self.leaves as f64
    }
}

impl RegisterTree {
    /// Compute leaf coverage for a set of runs
    pub fn coverage<'a, I>(&self, records: I) -> TreeCoverage
    where
        I: IntoIterator<Item = &'a RunRecord>,
    {
        self.coverage_under(self.root(), records)
    }

    /// Leaf coverage of the subtree below `id`
    pub fn coverage_under<'a, I>(&self, id: NodeId, records: I) -> TreeCoverage
    where
        I: IntoIterator<Item = &'a RunRecord>,
    {
        let hit: FnvHashSet<&str> = records
            .into_iter()
            .filter_map(|r| r.register.as_deref())
            .collect();

        let leaves: Vec<NodeId> = self
            .walk(id, None)
            .into_iter()
            .filter(|&leaf| self.is_leaf(leaf))
            .collect();
        let unpopulated: Vec<String> = leaves
            .iter()
            .map(|&id| self.node(id).path())
            .filter(|path| !hit.contains(path))
            .map(str::to_string)
            .collect();

        let coverage = TreeCoverage {
            leaves: leaves.len(),
            populated: leaves.len() - unpopulated.len(),
            unpopulated,
        };

        tracing::debug!(
            "{:.2}% of the register tree is unpopulated",
            coverage.unpopulated_percent()
        );

        coverage
    }
}
