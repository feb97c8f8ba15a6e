//! A loaded fault-injection campaign
//!
//! Bundles the run table, the golden record, the register tree and the
//! analysis configuration. This is the object callers query: resolve a node,
//! fetch the runs below it, classify them, and hand the result to the rate
//! estimators.

use crate::classifier::{classify_with, validate_fields, Classification};
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::record::{GoldenRecord, RunRecord, RunTable};
use crate::register_tree::{NodeId, RegisterTree};
use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// On-disk shape of a parsed campaign, as written by the log ingestion step
#[derive(Debug, Deserialize)]
struct CampaignDump {
    records: RunTable,
    golden: GoldenRecord,
    register_paths: Vec<String>,
}

/// Immutable snapshot of one campaign
#[derive(Debug, Clone)]
pub struct Campaign {
    records: RunTable,
    golden: GoldenRecord,
    tree: RegisterTree,
    config: AnalysisConfig,
}

impl Campaign {
    /// Assemble a campaign and build its register tree
    ///
    /// # Errors
    /// Invalid configuration, a malformed register path list, or a configured
    /// field that nothing in the campaign carries.
    pub fn new<S: AsRef<str>>(
        records: RunTable,
        golden: GoldenRecord,
        register_paths: &[S],
        config: AnalysisConfig,
    ) -> Result<Self> {
        config.validate()?;
        let tree = RegisterTree::build(register_paths, &config.path_delimiter)?;
        validate_fields(&records, &golden, &config)?;

        let campaign = Self {
            records,
            golden,
            tree,
            config,
        };

        tracing::info!(
            runs = campaign.records.len(),
            nodes = campaign.tree.len(),
            golden_fields = campaign.golden.len(),
            without_register = campaign.runs_without_register().len(),
            "Loaded campaign"
        );

        Ok(campaign)
    }

    /// Load a campaign dump (`records`, `golden`, `register_paths`) from JSON
    ///
    /// A configuration without any field sets compares every golden field
    /// and requires all of them.
    pub fn from_json_str(json: &str, mut config: AnalysisConfig) -> anyhow::Result<Self> {
        let dump: CampaignDump =
            serde_json::from_str(json).context("Failed to parse campaign JSON")?;

        if config.required_fields.is_empty() && config.compare_fields.is_empty() {
            let fields: Vec<String> = dump.golden.field_names().map(str::to_string).collect();
            tracing::info!(?fields, "No fields configured, using golden record fields");
            config.required_fields = fields.clone();
            config.compare_fields = fields;
        }
        Ok(Self::new(
            dump.records,
            dump.golden,
            &dump.register_paths,
            config,
        )?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P, config: AnalysisConfig) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read campaign file: {}", path.as_ref().display())
        })?;
        Self::from_json_str(&content, config)
            .with_context(|| format!("Invalid campaign file: {}", path.as_ref().display()))
    }

    pub fn records(&self) -> &RunTable {
        &self.records
    }

    pub fn golden(&self) -> &GoldenRecord {
        &self.golden
    }

    pub fn tree(&self) -> &RegisterTree {
        &self.tree
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    /// Resolve a user-supplied path: exact match first, then the highest
    /// node starting with it
    pub fn resolve(&self, path: &str) -> Option<NodeId> {
        self.tree
            .get_node_by_exact_path(path)
            .or_else(|| self.tree.get_node_by_path(path))
    }

    /// Runs whose target register lies below `node`
    pub fn runs_under(&self, node: NodeId) -> Vec<&RunRecord> {
        self.tree.get_runs_under(node, &self.records)
    }

    /// Classification of the runs below `node`
    pub fn classify_node(&self, node: NodeId) -> Classification {
        classify_with(self.runs_under(node), &self.golden, &self.config)
    }

    /// Classification of every run in the campaign
    pub fn classify_all(&self) -> Classification {
        classify_with(&self.records, &self.golden, &self.config)
    }

    /// Runs where no target register could be parsed (stalls, illegal
    /// instructions before the injection report)
    pub fn runs_without_register(&self) -> Vec<&str> {
        self.records
            .iter()
            .filter(|r| r.register.is_none())
            .map(|r| r.id.as_str())
            .collect()
    }
}
