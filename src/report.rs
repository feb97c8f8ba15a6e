//! Report assembly and rendering
//!
//! A [`Report`] is computed once from a campaign and then rendered as text,
//! pretty JSON or CSV. JSON carries every field; CSV carries the main table of
//! each report.

use crate::aggregate::{
    adjusted_probability_for, confidence_interval_for, consistency_check, error_rate_by_type,
    error_rate_by_type_in_children, error_rate_summary, field_mismatch_rates,
    stacked_register_error_class, windowed_rate_for, ChildRates, FieldMismatchRates,
    InconsistentGroup, LabeledRun, RegisterClassProportions, RegisterErrorSummary,
};
use crate::campaign::Campaign;
use crate::cli::{OutputFormat, ReportKind};
use crate::error::{AnalysisError, Result};
use crate::outcome::{OutcomeClass, PerClass};
use crate::probability::{expected_collisions, variance_collisions, AdjustedErrorProbability};
use crate::rate::{ConfidenceInterval, WindowPoint};
use crate::register_tree::{NodeId, TreeCoverage};
use fnv::FnvHashMap;
use serde::Serialize;

/// Report parameters that do not come from the campaign
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    /// Equivalence key of the consistency check
    pub key_fields: Vec<String>,
    /// Levels below the node shown by the tree report
    pub max_depth: Option<usize>,
    pub n_cycles: Option<u64>,
    pub n_target_bits: Option<u64>,
    /// Campaign size for the collision model; defaults to the loaded run count
    pub n_runs: Option<u64>,
}

/// One row of the tree report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeRow {
    pub path: String,
    pub depth: usize,
    pub n_runs: usize,
    /// `None` for nodes without runs
    pub rates: Option<PerClass<f64>>,
}

/// Headline numbers of a node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignSummary {
    pub node: String,
    pub n_runs: usize,
    pub rates: PerClass<f64>,
    pub registers: Vec<RegisterErrorSummary>,
    pub mismatches: FieldMismatchRates,
    pub coverage: TreeCoverage,
    /// Runs whose target register could not be parsed
    pub without_register: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "report", rename_all = "snake_case")]
pub enum Report {
    Classify {
        node: String,
        counts: PerClass<usize>,
        runs: Vec<LabeledRun>,
    },
    Confidence {
        node: String,
        interval: ConfidenceInterval,
    },
    Windowed {
        node: String,
        window_size: usize,
        points: Vec<WindowPoint>,
    },
    Children {
        node: String,
        children: Vec<ChildRates>,
    },
    Registers {
        node: String,
        field: String,
        registers: Vec<RegisterClassProportions>,
    },
    Summary(CampaignSummary),
    Consistency {
        node: String,
        key_fields: Vec<String>,
        groups: Vec<InconsistentGroup>,
    },
    Collisions {
        n_cycles: u64,
        n_target_bits: u64,
        n_runs: u64,
        expected: f64,
        variance: f64,
    },
    Adjusted {
        node: String,
        probability: AdjustedErrorProbability,
    },
    Tree {
        node: String,
        nodes: Vec<TreeRow>,
        #[serde(skip)]
        rendered: String,
    },
}

fn required(value: Option<u64>, name: &str) -> Result<u64> {
    value.ok_or_else(|| AnalysisError::invalid(name, "required by this report"))
}

impl Report {
    /// Collision statistics of a campaign design, no run data needed
    pub fn collisions(n_cycles: u64, n_target_bits: u64, n_runs: u64) -> Result<Self> {
        Ok(Report::Collisions {
            n_cycles,
            n_target_bits,
            n_runs,
            expected: expected_collisions(n_cycles, n_target_bits, n_runs)?,
            variance: variance_collisions(n_cycles, n_target_bits, n_runs)?,
        })
    }

    /// Compute a report for the subtree rooted at `node`
    pub fn build(
        campaign: &Campaign,
        kind: ReportKind,
        node: NodeId,
        options: &ReportOptions,
    ) -> Result<Self> {
        let path = campaign.tree().node(node).path().to_string();
        tracing::debug!(?kind, node = %path, "Building report");

        let report = match kind {
            ReportKind::Classify => {
                let labels = campaign.classify_node(node);
                Report::Classify {
                    node: path,
                    counts: labels.counts(),
                    runs: labels
                        .iter()
                        .map(|(id, class)| LabeledRun {
                            run_id: id.to_string(),
                            class,
                        })
                        .collect(),
                }
            }
            ReportKind::Confidence => Report::Confidence {
                node: path,
                interval: confidence_interval_for(campaign, node)?,
            },
            ReportKind::Windowed => Report::Windowed {
                node: path,
                window_size: campaign.config().window_size,
                points: windowed_rate_for(campaign, node)?,
            },
            ReportKind::Children => Report::Children {
                node: path,
                children: error_rate_by_type_in_children(campaign, node),
            },
            ReportKind::Registers => {
                let field = campaign.config().register_field.clone();
                Report::Registers {
                    node: path,
                    registers: stacked_register_error_class(campaign, node, &field),
                    field,
                }
            }
            ReportKind::Summary => {
                let runs = campaign.runs_under(node);
                // runs without a register only belong to the whole campaign
                let without_register = if node == campaign.root() {
                    campaign
                        .runs_without_register()
                        .into_iter()
                        .map(str::to_string)
                        .collect()
                } else {
                    Vec::new()
                };
                Report::Summary(CampaignSummary {
                    n_runs: runs.len(),
                    rates: error_rate_by_type(campaign, node)?,
                    registers: error_rate_summary(campaign, node),
                    mismatches: field_mismatch_rates(campaign, node)?,
                    coverage: campaign.tree().coverage_under(node, runs),
                    without_register,
                    node: path,
                })
            }
            ReportKind::Consistency => Report::Consistency {
                groups: consistency_check(campaign, node, &options.key_fields)?,
                key_fields: options.key_fields.clone(),
                node: path,
            },
            ReportKind::Collisions => {
                let n_runs = options
                    .n_runs
                    .unwrap_or(campaign.records().len() as u64);
                Report::collisions(
                    required(options.n_cycles, "cycles")?,
                    required(options.n_target_bits, "bits")?,
                    n_runs,
                )?
            }
            ReportKind::Adjusted => {
                let cycles = required(options.n_cycles, "cycles")?;
                let bits = required(options.n_target_bits, "bits")?;
                Report::Adjusted {
                    node: path,
                    probability: adjusted_probability_for(
                        campaign,
                        node,
                        cycles as f64 * bits as f64,
                    )?,
                }
            }
            ReportKind::Tree => tree_report(campaign, node, options.max_depth, path),
        };

        Ok(report)
    }

    /// Render in the requested format
    pub fn render(&self, format: OutputFormat) -> anyhow::Result<String> {
        Ok(match format {
            OutputFormat::Text => self.to_report_string(),
            OutputFormat::Json => serde_json::to_string_pretty(self)?,
            OutputFormat::Csv => self.to_csv(),
        })
    }

    /// Human-readable rendering
    pub fn to_report_string(&self) -> String {
        let mut out = String::new();

        match self {
            Report::Classify { node, counts, runs } => {
                out.push_str(&format!("Classification of {} ({} runs)\n", node, runs.len()));
                out.push_str(&format!(
                    "  SEFI: {}  SDC: {}  NE: {}\n\n",
                    counts.critical, counts.corruption, counts.silent
                ));
                for run in runs {
                    out.push_str(&format!("  {:<24} {}\n", run.run_id, run.class));
                }
            }
            Report::Confidence { node, interval } => {
                out.push_str(&format!(
                    "Error rates of {} ({} runs, {:.1}% confidence)\n",
                    node,
                    interval.n,
                    interval.confidence_level * 100.0
                ));
                for class in OutcomeClass::ALL {
                    out.push_str(&format!(
                        "  {:<5} {:>8} ± {:<8} [{}, {}]\n",
                        class.name(),
                        percent(*interval.rates.get(class)),
                        percent(*interval.half_width.get(class)),
                        percent(interval.lower(class)),
                        percent(interval.upper(class)),
                    ));
                }
            }
            Report::Windowed {
                node,
                window_size,
                points,
            } => {
                out.push_str(&format!(
                    "Windowed error rates of {} (window of {} runs, pointwise bands)\n",
                    node, window_size
                ));
                out.push_str(&format!(
                    "  {:>12} {:<24} {:>8} {:>8} {:>8}\n",
                    "order", "run", "SEFI", "SDC", "NE"
                ));
                for point in points {
                    let cells: Vec<String> = match &point.estimate {
                        Some(est) => OutcomeClass::ALL
                            .iter()
                            .map(|&c| percent(*est.rate.get(c)))
                            .collect(),
                        None => vec!["-".to_string(); 3],
                    };
                    out.push_str(&format!(
                        "  {:>12} {:<24} {:>8} {:>8} {:>8}\n",
                        point.order, point.run_id, cells[0], cells[1], cells[2]
                    ));
                }
            }
            Report::Children { node, children } => {
                out.push_str(&format!("Error rates of the children of {}\n", node));
                if children.is_empty() {
                    out.push_str("  (no child with runs)\n");
                }
                for child in children {
                    out.push_str(&format!(
                        "  {:<20} {:>6} runs  {}\n",
                        child.name,
                        child.n_runs,
                        rates_line(&child.rates)
                    ));
                }
            }
            Report::Registers {
                node,
                field,
                registers,
            } => {
                out.push_str(&format!("Outcome proportions by {} under {}\n", field, node));
                for row in registers {
                    out.push_str(&format!(
                        "  {:<32} {:>6} runs  {}\n",
                        row.register,
                        row.n_runs,
                        rates_line(&row.proportions)
                    ));
                }
            }
            Report::Summary(summary) => summary_text(&mut out, summary),
            Report::Consistency {
                node,
                key_fields,
                groups,
            } => {
                if groups.is_empty() {
                    out.push_str(&format!(
                        "✅ All equivalent injections under {} agree (key: {})\n",
                        node,
                        key_fields.join(", ")
                    ));
                } else {
                    out.push_str(&format!(
                        "⚠️  {} groups of equivalent injections under {} disagree (key: {})\n",
                        groups.len(),
                        node,
                        key_fields.join(", ")
                    ));
                    for group in groups {
                        out.push_str(&format!("\n  {}\n", group.key.join(" / ")));
                        for run in &group.runs {
                            out.push_str(&format!("    {:<24} {}\n", run.run_id, run.class));
                        }
                    }
                }
            }
            Report::Collisions {
                n_cycles,
                n_target_bits,
                n_runs,
                expected,
                variance,
            } => {
                out.push_str("Multi-injection collisions\n");
                out.push_str(&format!(
                    "  Injection space: {} cycles × {} bits\n",
                    n_cycles, n_target_bits
                ));
                out.push_str(&format!("  Runs: {}\n", n_runs));
                out.push_str(&format!(
                    "  Expected runs on an already-hit point: {:.4}\n",
                    expected
                ));
                out.push_str(&format!("  Variance: {:.4}\n", variance));
            }
            Report::Adjusted { node, probability } => {
                out.push_str(&format!(
                    "Adjusted error probability of {} (W = {}, N = {})\n",
                    node, probability.w_size, probability.n_runs
                ));
                for (class, rate) in probability.rates.iter() {
                    out.push_str(&format!("  {:<5} {:.4}\n", class.name(), rate));
                }
            }
            Report::Tree { rendered, .. } => out.push_str(rendered),
        }

        out
    }

    /// CSV rendering of the main table
    pub fn to_csv(&self) -> String {
        let mut lines: Vec<String> = Vec::new();

        match self {
            Report::Classify { runs, .. } => {
                lines.push("run_id,class".to_string());
                for run in runs {
                    lines.push(format!("{},{}", escape_field(&run.run_id), run.class));
                }
            }
            Report::Confidence { interval, .. } => {
                lines.push("class,rate,std,half_width,lower,upper".to_string());
                for class in OutcomeClass::ALL {
                    lines.push(format!(
                        "{},{},{},{},{},{}",
                        class,
                        interval.rates.get(class),
                        interval.std.get(class),
                        interval.half_width.get(class),
                        interval.lower(class),
                        interval.upper(class)
                    ));
                }
            }
            Report::Windowed { points, .. } => {
                lines.push(
                    "order,run_id,n,sefi,sdc,ne,\
                     sefi_lower,sefi_upper,sdc_lower,sdc_upper,ne_lower,ne_upper"
                        .to_string(),
                );
                for point in points {
                    let mut fields = vec![point.order.to_string(), escape_field(&point.run_id)];
                    match &point.estimate {
                        Some(est) => {
                            fields.push(est.n.to_string());
                            fields.extend(
                                OutcomeClass::ALL
                                    .iter()
                                    .map(|&c| est.rate.get(c).to_string()),
                            );
                            for class in OutcomeClass::ALL {
                                fields.push(est.lower.get(class).to_string());
                                fields.push(est.upper.get(class).to_string());
                            }
                        }
                        None => fields.extend(std::iter::repeat(String::new()).take(10)),
                    }
                    lines.push(fields.join(","));
                }
            }
            Report::Children { children, .. } => {
                lines.push("name,path,n_runs,sefi,sdc,ne".to_string());
                for child in children {
                    lines.push(format!(
                        "{},{},{},{}",
                        escape_field(&child.name),
                        escape_field(&child.path),
                        child.n_runs,
                        rates_csv(&child.rates)
                    ));
                }
            }
            Report::Registers { registers, .. } => {
                lines.push("register,n_runs,sefi,sdc,ne".to_string());
                for row in registers {
                    lines.push(format!(
                        "{},{},{}",
                        escape_field(&row.register),
                        row.n_runs,
                        rates_csv(&row.proportions)
                    ));
                }
            }
            Report::Summary(summary) => {
                lines.push("register,hits,errors,error_rate".to_string());
                for row in &summary.registers {
                    lines.push(format!(
                        "{},{},{},{}",
                        escape_field(&row.register),
                        row.hits,
                        row.errors,
                        row.error_rate
                    ));
                }
            }
            Report::Consistency { groups, .. } => {
                lines.push("key,run_id,class".to_string());
                for group in groups {
                    let key = escape_field(&group.key.join("/"));
                    for run in &group.runs {
                        lines.push(format!("{},{},{}", key, escape_field(&run.run_id), run.class));
                    }
                }
            }
            Report::Collisions {
                n_cycles,
                n_target_bits,
                n_runs,
                expected,
                variance,
            } => {
                lines.push("n_cycles,n_target_bits,n_runs,expected,variance".to_string());
                lines.push(format!(
                    "{},{},{},{},{}",
                    n_cycles, n_target_bits, n_runs, expected, variance
                ));
            }
            Report::Adjusted { probability, .. } => {
                lines.push("class,w_size,n_runs,adjusted".to_string());
                for (class, rate) in probability.rates.iter() {
                    lines.push(format!(
                        "{},{},{},{}",
                        class, probability.w_size, probability.n_runs, rate
                    ));
                }
            }
            Report::Tree { nodes, .. } => {
                lines.push("path,depth,n_runs,sefi,sdc,ne".to_string());
                for row in nodes {
                    let rates = row
                        .rates
                        .as_ref()
                        .map(rates_csv)
                        .unwrap_or_else(|| ",,".to_string());
                    lines.push(format!(
                        "{},{},{},{}",
                        escape_field(&row.path),
                        row.depth,
                        row.n_runs,
                        rates
                    ));
                }
            }
        }

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}

fn tree_report(
    campaign: &Campaign,
    node: NodeId,
    max_depth: Option<usize>,
    path: String,
) -> Report {
    let tree = campaign.tree();
    // empty nodes are expected in sparse campaigns and carry no rates
    let analyzed = tree.analyze_nodes(node, max_depth, |id, _| {
        let labels = campaign.classify_node(id);
        if labels.is_empty() {
            return Ok(None);
        }
        Ok(Some((labels.len(), labels.rates()?)))
    });

    let mut by_id: FnvHashMap<NodeId, (usize, PerClass<f64>)> = FnvHashMap::default();
    let mut nodes = Vec::with_capacity(analyzed.len());
    for (id, result) in analyzed {
        let (n_runs, rates) = match result {
            Ok(Some((n, rates))) => {
                by_id.insert(id, (n, rates));
                (n, Some(rates))
            }
            Ok(None) | Err(_) => (0, None),
        };
        nodes.push(TreeRow {
            path: tree.node(id).path().to_string(),
            depth: tree.depth(id),
            n_runs,
            rates,
        });
    }

    let rendered = tree.render(node, max_depth, |id, n| match by_id.get(&id) {
        Some((runs, rates)) => format!("{} ({} runs: {})", n.name(), runs, rates_line(rates)),
        None => format!("{} (no runs)", n.name()),
    });

    Report::Tree {
        node: path,
        nodes,
        rendered,
    }
}

fn summary_text(out: &mut String, summary: &CampaignSummary) {
    out.push_str(&format!("Campaign summary for {}\n", summary.node));
    out.push_str("════════════════════════════════════════\n");
    out.push_str(&format!("Runs: {}\n", summary.n_runs));
    out.push_str(&format!("Outcomes: {}\n", rates_line(&summary.rates)));
    if !summary.without_register.is_empty() {
        out.push_str(&format!(
            "Runs without a target register: {}\n",
            summary.without_register.len()
        ));
    }

    let coverage = &summary.coverage;
    out.push_str(&format!(
        "Registers hit: {}/{} ({:.2}% unpopulated)\n",
        coverage.populated,
        coverage.leaves,
        coverage.unpopulated_percent()
    ));

    out.push_str(&format!(
        "\nFailed to parse: {}\n",
        percent(summary.mismatches.failed_to_parse)
    ));
    for mismatch in &summary.mismatches.fields {
        out.push_str(&format!(
            "  {:<24} differs in {}\n",
            mismatch.field,
            percent(mismatch.rate)
        ));
    }

    out.push_str("\nMost error-prone registers:\n");
    for row in &summary.registers {
        out.push_str(&format!(
            "  {:<32} {:>3}/{:<5} {:>8}\n",
            row.register,
            row.errors,
            row.hits,
            percent(row.error_rate)
        ));
    }
}

fn percent(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

fn rates_line(rates: &PerClass<f64>) -> String {
    rates
        .iter()
        .map(|(class, rate)| format!("{} {}", class.name(), percent(*rate)))
        .collect::<Vec<_>>()
        .join("  ")
}

fn rates_csv(rates: &PerClass<f64>) -> String {
    rates
        .iter()
        .map(|(_, rate)| rate.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Escape CSV field (handle commas, quotes, newlines)
fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
