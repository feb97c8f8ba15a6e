// Register tree tests against small but realistic SoC hierarchies

use super::*;
use crate::error::AnalysisError;
use crate::record::RunRecord;

const IBEX_RF: &str =
    "ibex_soc_wrap.ibex_soc_i.ibex_wrap.u_top.u_ibex_top.gen_regfile_ff.register_file_i";

fn small_tree() -> RegisterTree {
    RegisterTree::build(&["soc.core.reg0", "soc.core.reg1", "soc.mem.reg0"], ".").unwrap()
}

fn ibex_paths() -> Vec<String> {
    let mut paths: Vec<String> = (1..4).map(|i| format!("{}.rf_reg[{}]", IBEX_RF, i)).collect();
    paths.push("ibex_soc_wrap.ibex_soc_i.ibex_wrap.u_top.u_ibex_top.u_ibex_core.pc_id".to_string());
    paths.push("ibex_soc_wrap.ibex_soc_i.ram.mem".to_string());
    paths
}

#[test]
fn test_build_counts_nodes() {
    let tree = small_tree();

    // root + soc.core + soc.mem + 3 leaves
    assert_eq!(tree.len(), 6);
    assert_eq!(tree.leaves().len(), 3);

    let intermediate: Vec<&str> = tree
        .preorder()
        .into_iter()
        .filter(|&id| !tree.is_leaf(id))
        .map(|id| tree.node(id).path())
        .collect();
    assert_eq!(intermediate, vec!["soc", "soc.core", "soc.mem"]);
}

#[test]
fn test_children_keep_discovery_order() {
    let tree = RegisterTree::build(&["top.b.x", "top.a.y", "top.b.z", "top.c"], ".").unwrap();
    let names: Vec<&str> = tree
        .children(tree.root())
        .iter()
        .map(|&id| tree.node(id).name())
        .collect();
    assert_eq!(names, vec!["b", "a", "c"]);

    let b = tree.get_node_by_exact_path("top.b").unwrap();
    let names: Vec<&str> = tree.children(b).iter().map(|&id| tree.node(id).name()).collect();
    assert_eq!(names, vec!["x", "z"]);
}

#[test]
fn test_duplicate_paths_reuse_nodes() {
    let tree = RegisterTree::build(&["soc.a.r", "soc.a.r", "soc.a"], ".").unwrap();
    assert_eq!(tree.len(), 3);
}

#[test]
fn test_paths_extend_parent_path() {
    let tree = RegisterTree::build(&ibex_paths(), ".").unwrap();
    for id in tree.preorder() {
        if let Some(parent) = tree.parent(id) {
            let expected = format!("{}.{}", tree.node(parent).path(), tree.node(id).name());
            assert_eq!(tree.node(id).path(), expected);
            assert_eq!(tree.depth(id), tree.depth(parent) + 1);
        }
    }
}

#[test]
fn test_build_rejects_empty_list() {
    let paths: Vec<String> = vec![];
    assert!(matches!(
        RegisterTree::build(&paths, "."),
        Err(AnalysisError::Structural(_))
    ));
}

#[test]
fn test_build_rejects_mixed_roots() {
    let result = RegisterTree::build(&["soc.a", "other.b"], ".");
    assert!(matches!(result, Err(AnalysisError::Structural(_))));
}

#[test]
fn test_build_rejects_empty_segments() {
    assert!(RegisterTree::build(&["soc..a"], ".").is_err());
    assert!(RegisterTree::build(&[""], ".").is_err());
    assert!(RegisterTree::build(&["soc.a."], ".").is_err());
}

#[test]
fn test_build_rejects_empty_delimiter() {
    assert!(matches!(
        RegisterTree::build(&["soc.a"], ""),
        Err(AnalysisError::InvalidParameter { .. })
    ));
}

#[test]
fn test_custom_delimiter() {
    let tree = RegisterTree::build(&["soc/core/reg0", "soc/core/reg1"], "/").unwrap();
    assert_eq!(tree.len(), 4);
    assert!(tree.get_node_by_exact_path("soc/core").is_some());
}

#[test]
fn test_get_node_by_path_returns_highest_match() {
    let tree = small_tree();
    let core = tree.get_node_by_path("soc.core").unwrap();
    assert_eq!(tree.node(core).path(), "soc.core");

    // partial segment resolves to the shallowest node starting with it
    let partial = tree.get_node_by_path("soc.co").unwrap();
    assert_eq!(partial, core);

    // tie at leaf depth: first in pre-order
    let reg = tree.get_node_by_path("soc.core.reg").unwrap();
    assert_eq!(tree.node(reg).path(), "soc.core.reg0");

    assert!(tree.get_node_by_path("soc.gpu").is_none());
}

#[test]
fn test_get_nodes_by_name_preorder() {
    let tree = small_tree();
    let regs = tree.get_nodes_by_name("reg0");
    let paths: Vec<&str> = regs.iter().map(|&id| tree.node(id).path()).collect();
    assert_eq!(paths, vec!["soc.core.reg0", "soc.mem.reg0"]);
    assert!(tree.get_nodes_by_name("nope").is_empty());
}

#[test]
fn test_find_nodes_regex() {
    let tree = RegisterTree::build(&ibex_paths(), ".").unwrap();
    let regs = tree.find_nodes(r"^rf_reg\[\d+\]$").unwrap();
    assert_eq!(regs.len(), 3);
    assert!(tree.find_nodes("(").is_err());
}

#[test]
fn test_nodes_at_depth() {
    let tree = small_tree();
    assert_eq!(tree.nodes_at_depth(0), vec![tree.root()]);
    assert_eq!(tree.nodes_at_depth(1).len(), 2);
    assert_eq!(tree.nodes_at_depth(2).len(), 3);
    assert!(tree.nodes_at_depth(3).is_empty());
}

#[test]
fn test_walk_respects_max_depth() {
    let tree = small_tree();
    assert_eq!(tree.walk(tree.root(), Some(0)), vec![tree.root()]);
    assert_eq!(tree.walk(tree.root(), Some(1)).len(), 3);
    assert_eq!(tree.walk(tree.root(), None).len(), 6);

    let core = tree.get_node_by_exact_path("soc.core").unwrap();
    let sub: Vec<&str> = tree
        .walk(core, None)
        .into_iter()
        .map(|id| tree.node(id).path())
        .collect();
    assert_eq!(sub, vec!["soc.core", "soc.core.reg0", "soc.core.reg1"]);
}

#[test]
fn test_ancestors() {
    let tree = small_tree();
    let leaf = tree.get_node_by_exact_path("soc.mem.reg0").unwrap();
    let paths: Vec<&str> = tree
        .ancestors(leaf)
        .into_iter()
        .map(|id| tree.node(id).path())
        .collect();
    assert_eq!(paths, vec!["soc.mem", "soc"]);
    assert!(tree.ancestors(tree.root()).is_empty());
}

#[test]
fn test_runs_under_are_delimiter_aware() {
    let tree = RegisterTree::build(&["soc.reg1", "soc.reg10"], ".").unwrap();
    let runs = vec![
        RunRecord::new("a").with_register("soc.reg1"),
        RunRecord::new("b").with_register("soc.reg10"),
        RunRecord::new("c"),
    ];

    let reg1 = tree.get_node_by_exact_path("soc.reg1").unwrap();
    let under: Vec<&str> = tree
        .get_runs_under(reg1, &runs)
        .iter()
        .map(|r| r.id.as_str())
        .collect();
    assert_eq!(under, vec!["a"]);

    let all = tree.get_runs_under(tree.root(), &runs);
    assert_eq!(all.len(), 2);
}

#[test]
fn test_runs_belong_to_every_ancestor() {
    let tree = small_tree();
    let run = RunRecord::new("r").with_register("soc.core.reg1");
    let leaf = tree.get_node_by_exact_path("soc.core.reg1").unwrap();

    assert!(tree.contains_run(leaf, &run));
    for ancestor in tree.ancestors(leaf) {
        assert!(tree.contains_run(ancestor, &run));
    }
    let mem = tree.get_node_by_exact_path("soc.mem").unwrap();
    assert!(!tree.contains_run(mem, &run));
}

#[test]
fn test_analyze_nodes_continues_after_failure() {
    let tree = small_tree();
    let results = tree.analyze_nodes(tree.root(), None, |_, node| {
        if node.is_leaf() {
            Ok(node.path().len())
        } else {
            Err(AnalysisError::insufficient(1, 0))
        }
    });

    assert_eq!(results.len(), 6);
    assert_eq!(results.iter().filter(|(_, r)| r.is_ok()).count(), 3);
}

#[test]
fn test_coverage() {
    let tree = small_tree();
    let runs = vec![
        RunRecord::new("a").with_register("soc.core.reg0"),
        RunRecord::new("b").with_register("soc.core.reg0"),
        RunRecord::new("c").with_register("soc.mem.reg0"),
    ];

    let coverage = tree.coverage(&runs);
    assert_eq!(coverage.leaves, 3);
    assert_eq!(coverage.populated, 2);
    assert_eq!(coverage.unpopulated, vec!["soc.core.reg1".to_string()]);
    assert!((coverage.unpopulated_percent() - 100.0 / 3.0).abs() < 1e-9);
}

#[test]
fn test_coverage_under_subtree() {
    let tree = small_tree();
    let runs = vec![
        RunRecord::new("a").with_register("soc.core.reg0"),
        RunRecord::new("b").with_register("soc.mem.reg0"),
    ];

    let core = tree.get_node_by_exact_path("soc.core").unwrap();
    let coverage = tree.coverage_under(core, &runs);
    assert_eq!(coverage.leaves, 2);
    assert_eq!(coverage.populated, 1);
    assert_eq!(coverage.unpopulated, vec!["soc.core.reg1".to_string()]);

    let mem = tree.get_node_by_exact_path("soc.mem").unwrap();
    assert_eq!(tree.coverage_under(mem, &runs).unpopulated_percent(), 0.0);
}

#[test]
fn test_render() {
    let tree = small_tree();
    let text = tree.render(tree.root(), None, |_, node| node.name().to_string());
    let expected = "soc\n├── core\n│   ├── reg0\n│   └── reg1\n└── mem\n    └── reg0\n";
    assert_eq!(text, expected);
}

#[test]
fn test_render_stops_at_max_depth() {
    let tree = small_tree();
    let text = tree.render(tree.root(), Some(1), |_, node| node.name().to_string());
    assert_eq!(text, "soc\n├── core\n└── mem\n");

    let core = tree.get_node_by_exact_path("soc.core").unwrap();
    let text = tree.render(core, Some(0), |_, node| node.name().to_string());
    assert_eq!(text, "core\n");
}

#[test]
fn test_build_shares_prefixes_across_paths() {
    let tree = RegisterTree::build(
        &[
            "soc.core.rf.x1",
            "soc.core.rf.x2",
            "soc.core.csr.mepc",
            "soc.core.rf.x10",
            "soc.mem.ctrl",
        ],
        ".",
    )
    .unwrap();

    // soc, core, rf, x1, x2, csr, mepc, x10, mem, ctrl
    assert_eq!(tree.len(), 10);
    let rf = tree.get_node_by_exact_path("soc.core.rf").unwrap();
    let names: Vec<&str> = tree.children(rf).iter().map(|&id| tree.node(id).name()).collect();
    assert_eq!(names, vec!["x1", "x2", "x10"]);
    assert_eq!(tree.get_nodes_by_name("rf").len(), 1);
    assert_eq!(tree.depth(tree.get_node_by_exact_path("soc.core.rf.x10").unwrap()), 3);
}
