use anyhow::{Context, Result};
use clap::Parser;
use seuscope::{
    campaign::Campaign,
    cli::{Cli, ReportKind},
    config::AnalysisConfig,
    report::{Report, ReportOptions},
};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Configuration file (or defaults) with command-line overrides applied
fn load_config(args: &Cli) -> Result<AnalysisConfig> {
    let mut config = match &args.config {
        Some(path) => AnalysisConfig::from_toml(path)?,
        None => AnalysisConfig::default(),
    };

    if let Some(level) = args.confidence {
        config.confidence_level = level;
    }
    if let Some(window_size) = args.window_size {
        config.window_size = window_size;
    }
    config.validate()?;

    Ok(config)
}

/// Collisions need no run data when the campaign size is given explicitly
fn design_only_report(args: &Cli) -> Result<Option<Report>> {
    if args.report != ReportKind::Collisions || args.campaign.is_some() {
        return Ok(None);
    }

    let (Some(cycles), Some(bits), Some(runs)) = (args.cycles, args.bits, args.runs) else {
        anyhow::bail!("--report collisions needs --cycles, --bits and --runs (or --campaign)");
    };
    Ok(Some(Report::collisions(cycles, bits, runs)?))
}

fn run(args: &Cli) -> Result<Report> {
    if let Some(report) = design_only_report(args)? {
        return Ok(report);
    }

    let Some(path) = &args.campaign else {
        anyhow::bail!(
            "Must specify --campaign FILE. Usage: seuscope --campaign FILE [--report KIND]"
        );
    };

    let config = load_config(args)?;
    let campaign = Campaign::from_json_file(path, config)?;

    let node = match &args.node {
        Some(node_path) => campaign
            .resolve(node_path)
            .with_context(|| format!("No register tree node matches '{}'", node_path))?,
        None => campaign.root(),
    };

    let options = ReportOptions {
        key_fields: args.keys.clone(),
        max_depth: args.depth,
        n_cycles: args.cycles,
        n_target_bits: args.bits,
        n_runs: args.runs,
    };

    Ok(Report::build(&campaign, args.report, node, &options)?)
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    let report = run(&args)?;
    print!("{}", report.render(args.format)?);

    Ok(())
}
