// Register hierarchy of the design under test
//
// The tree mirrors the SoC hierarchy: every dot-delimited register path
// (e.g. `ibex_soc_wrap.ibex_soc_i.u_top.register_file_i.rf_reg[3]`) becomes a
// chain of nodes from the root down to the leaf register. Run records are
// attached lazily: a node "owns" every run whose target register lies in its
// subtree, so statistics can be rolled up at any level of the hierarchy.
//
// Nodes live in a flat arena. Children are stored as indices in discovery
// order and the parent link is an index, so the tree has no reference cycles.

mod coverage;
mod tree;

pub use coverage::TreeCoverage;
pub use tree::{NodeId, RegisterNode, RegisterTree};

#[cfg(test)]
mod tests;
