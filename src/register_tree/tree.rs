use crate::error::{AnalysisError, Result};
use crate::record::RunRecord;
use fnv::FnvHashMap;
use regex::Regex;
use serde::Serialize;

/// Index of a node inside its [`RegisterTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A block or register in the hardware hierarchy
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegisterNode {
    name: String,
    path: String,
    #[serde(skip)]
    parent: Option<NodeId>,
    #[serde(skip)]
    children: Vec<NodeId>,
    depth: usize,
}

impl RegisterNode {
    /// Last path segment
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full hierarchical path, unique per node
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in the order their paths were first encountered
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Rooted, immutable tree over delimiter-joined register paths
///
/// # Example
/// ```
/// use seuscope::register_tree::RegisterTree;
///
/// let tree = RegisterTree::build(
///     &["soc.core.reg0", "soc.core.reg1", "soc.mem.reg0"],
///     ".",
/// )?;
/// assert_eq!(tree.len(), 6);
/// let core = tree.get_node_by_path("soc.core").unwrap();
/// assert_eq!(tree.node(core).path(), "soc.core");
/// # Ok::<(), seuscope::error::AnalysisError>(())
/// ```
#[derive(Debug, Clone)]
pub struct RegisterTree {
    nodes: Vec<RegisterNode>,
    by_path: FnvHashMap<String, NodeId>,
    delimiter: String,
}

const ROOT: NodeId = NodeId(0);

impl RegisterTree {
    /// Build the tree from leaf register paths
    ///
    /// Every ancestor is created on demand; existing nodes are reused, so the
    /// node count never exceeds the number of distinct path prefixes.
    ///
    /// # Errors
    /// `Structural` if the list is empty, a path has an empty segment, or the
    /// paths do not share one first segment. No partial tree is returned.
    pub fn build<S: AsRef<str>>(leaf_paths: &[S], delimiter: &str) -> Result<Self> {
        if delimiter.is_empty() {
            return Err(AnalysisError::invalid("path_delimiter", "must not be empty"));
        }

        let first = leaf_paths
            .first()
            .ok_or_else(|| AnalysisError::Structural("Register path list is empty".to_string()))?;
        let root_name = first.as_ref().split(delimiter).next().unwrap_or_default();
        if root_name.is_empty() {
            return Err(AnalysisError::Structural(format!(
                "Register path '{}' has an empty root segment",
                first.as_ref()
            )));
        }

        let mut tree = Self {
            nodes: vec![RegisterNode {
                name: root_name.to_string(),
                path: root_name.to_string(),
                parent: None,
                children: Vec::new(),
                depth: 0,
            }],
            by_path: FnvHashMap::default(),
            delimiter: delimiter.to_string(),
        };
        tree.by_path.insert(root_name.to_string(), ROOT);

        for leaf in leaf_paths {
            tree.insert_path(leaf.as_ref(), root_name)?;
        }

        tracing::debug!(
            nodes = tree.nodes.len(),
            leaves = leaf_paths.len(),
            max_depth = tree.nodes.iter().map(|n| n.depth).max().unwrap_or(0),
            "Built register tree"
        );

        Ok(tree)
    }

    fn insert_path(&mut self, path: &str, root_name: &str) -> Result<()> {
        let delimiter = self.delimiter.clone();
        let mut segments = path.split(delimiter.as_str());

        if segments.next() != Some(root_name) {
            return Err(AnalysisError::Structural(format!(
                "Register path '{}' does not start with common root '{}'",
                path, root_name
            )));
        }

        let mut current = ROOT;
        for segment in segments {
            if segment.is_empty() {
                return Err(AnalysisError::Structural(format!(
                    "Register path '{}' contains an empty segment",
                    path
                )));
            }

            let child_path = format!("{}{}{}", self.nodes[current.0].path, delimiter, segment);
            current = match self.by_path.get(&child_path) {
                Some(&existing) => existing,
                None => self.push_child(current, segment, child_path),
            };
        }

        Ok(())
    }

    fn push_child(&mut self, parent: NodeId, name: &str, path: String) -> NodeId {
        let id = NodeId(self.nodes.len());
        let depth = self.nodes[parent.0].depth + 1;

        self.nodes.push(RegisterNode {
            name: name.to_string(),
            path: path.clone(),
            parent: Some(parent),
            children: Vec::new(),
            depth,
        });
        self.nodes[parent.0].children.push(id);
        self.by_path.insert(path, id);

        id
    }

    pub fn root(&self) -> NodeId {
        ROOT
    }

    /// Node data; ids are only handed out by this tree
    pub fn node(&self, id: NodeId) -> &RegisterNode {
        &self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&RegisterNode> {
        self.nodes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A built tree always holds at least its root
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.node(id).is_leaf()
    }

    pub fn depth(&self, id: NodeId) -> usize {
        self.node(id).depth
    }

    /// Ancestors from the parent up to the root
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::with_capacity(self.depth(id));
        let mut current = self.parent(id);
        while let Some(node) = current {
            result.push(node);
            current = self.parent(node);
        }
        result
    }

    /// Exact lookup by full path
    pub fn get_node_by_exact_path(&self, path: &str) -> Option<NodeId> {
        self.by_path.get(path).copied()
    }

    /// Highest node whose path starts with `path`
    ///
    /// This is a plain string-prefix match, so a partial segment such as
    /// `soc.co` resolves to `soc.core`. When several nodes share the minimal
    /// depth, the first one in pre-order wins.
    pub fn get_node_by_path(&self, path: &str) -> Option<NodeId> {
        let mut best: Option<NodeId> = None;
        for id in self.preorder() {
            let node = self.node(id);
            if !node.path.starts_with(path) {
                continue;
            }
            match best {
                Some(b) if self.depth(b) <= node.depth => {}
                _ => best = Some(id),
            }
        }
        best
    }

    /// All nodes named `name`, in pre-order
    pub fn get_nodes_by_name(&self, name: &str) -> Vec<NodeId> {
        self.preorder()
            .into_iter()
            .filter(|&id| self.node(id).name == name)
            .collect()
    }

    /// All nodes whose name matches a regular expression, in pre-order
    pub fn find_nodes(&self, pattern: &str) -> Result<Vec<NodeId>> {
        let regex = Regex::new(pattern)
            .map_err(|e| AnalysisError::invalid("pattern", e.to_string()))?;

        Ok(self
            .preorder()
            .into_iter()
            .filter(|&id| regex.is_match(&self.node(id).name))
            .collect())
    }

    /// All nodes at a hierarchy level (root is level 0), in pre-order
    pub fn nodes_at_depth(&self, level: usize) -> Vec<NodeId> {
        self.walk(ROOT, Some(level))
            .into_iter()
            .filter(|&id| self.depth(id) == level)
            .collect()
    }

    /// Leaf registers in pre-order
    pub fn leaves(&self) -> Vec<NodeId> {
        self.preorder()
            .into_iter()
            .filter(|&id| self.is_leaf(id))
            .collect()
    }

    pub fn preorder(&self) -> Vec<NodeId> {
        self.walk(ROOT, None)
    }

    /// Pre-order traversal from `start`, at most `max_depth` levels below it
    pub fn walk(&self, start: NodeId, max_depth: Option<usize>) -> Vec<NodeId> {
        let limit = max_depth.map(|d| self.depth(start) + d);
        let mut order = Vec::new();
        let mut stack = vec![start];

        while let Some(id) = stack.pop() {
            order.push(id);
            let node = self.node(id);
            if limit.is_some_and(|l| node.depth >= l) {
                continue;
            }
            stack.extend(node.children.iter().rev());
        }

        order
    }

    /// Delimiter-aware prefix test: `path` equals `ancestor` or lies below it
    ///
    /// `soc.reg1` is not under `soc.reg10` and vice versa.
    pub fn is_path_under(&self, ancestor: &str, path: &str) -> bool {
        match path.strip_prefix(ancestor) {
            Some("") => true,
            Some(rest) => rest.starts_with(self.delimiter.as_str()),
            None => false,
        }
    }

    /// True if the run targeted this node or one of its descendants
    pub fn contains_run(&self, id: NodeId, record: &RunRecord) -> bool {
        record
            .register
            .as_deref()
            .is_some_and(|reg| self.is_path_under(&self.node(id).path, reg))
    }

    /// Records whose target register lies in the subtree of `id`
    pub fn get_runs_under<'a, I>(&self, id: NodeId, records: I) -> Vec<&'a RunRecord>
    where
        I: IntoIterator<Item = &'a RunRecord>,
    {
        records
            .into_iter()
            .filter(|record| self.contains_run(id, record))
            .collect()
    }

    /// Apply an analysis to every node of a subtree
    ///
    /// A failing node is logged and reported in place; the sweep continues.
    pub fn analyze_nodes<T, F>(
        &self,
        start: NodeId,
        max_depth: Option<usize>,
        mut analysis: F,
    ) -> Vec<(NodeId, Result<T>)>
    where
        F: FnMut(NodeId, &RegisterNode) -> Result<T>,
    {
        self.walk(start, max_depth)
            .into_iter()
            .map(|id| {
                let node = self.node(id);
                let result = analysis(id, node);
                if let Err(e) = &result {
                    tracing::warn!(
                        path = %node.path,
                        is_leaf = node.is_leaf(),
                        "Analysis failed on node: {}",
                        e
                    );
                }
                (id, result)
            })
            .collect()
    }

    /// Render the subtree below `start` as an indented text tree
    ///
    /// `max_depth` limits the levels drawn below `start`, as in [`walk`](Self::walk).
    pub fn render<F>(&self, start: NodeId, max_depth: Option<usize>, mut label: F) -> String
    where
        F: FnMut(NodeId, &RegisterNode) -> String,
    {
        let limit = max_depth.map(|d| self.depth(start) + d);
        let mut out = String::new();
        let mut stack: Vec<(NodeId, String, bool)> = vec![(start, String::new(), true)];

        while let Some((id, prefix, last)) = stack.pop() {
            let node = self.node(id);
            if id == start {
                out.push_str(&label(id, node));
            } else {
                let branch = if last { "└── " } else { "├── " };
                out.push_str(&format!("{}{}{}", prefix, branch, label(id, node)));
            }
            out.push('\n');

            let child_prefix = if id == start {
                String::new()
            } else if last {
                format!("{}    ", prefix)
            } else {
                format!("{}│   ", prefix)
            };

            if limit.is_some_and(|l| node.depth >= l) {
                continue;
            }

            let n = node.children.len();
            for (i, &child) in node.children.iter().enumerate().rev() {
                stack.push((child, child_prefix.clone(), i + 1 == n));
            }
        }

        out
    }
}
