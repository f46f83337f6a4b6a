//! Command line: discover charts → (schema | modeline)
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use rayon::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::chart::{self, Chart};
use crate::diagnostics::TracingSink;
use crate::plan::{Plan, SchemaConfig};
use crate::schema::SchemaNode;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// generate JSON schemas for helm chart values from doc comments in values.yaml
#[derive(Parser, Debug)]
#[command(name = "values-schema", version)]
pub struct CommandLineInterface {
    /// log verbosity; RUST_LOG takes precedence when set
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// build values.schema.json for every chart found
    Schema(SchemaOut),
    /// point values.yaml at its schema via a yaml-language-server modeline
    Modeline(ModelineOut),
}

#[derive(Args, Debug, Clone)]
struct ChartSettings {
    /// chart directories to search; may be quoted glob patterns
    #[arg(num_args = 1.., required = true)]
    chart_dirs: Vec<String>,

    /// do everything except writing files
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

#[derive(Args, Debug)]
struct SchemaOut {
    #[command(flatten)]
    chart_settings: ChartSettings,

    /// fail on the first malformed doc comment instead of warning
    #[arg(long, default_value_t = false)]
    strict: bool,

    /// also print each schema to stdout
    #[arg(long, default_value_t = false)]
    stdout: bool,

    /// also write the modeline into each values.yaml
    #[arg(long, default_value_t = false)]
    write_modeline: bool,
}

#[derive(Args, Debug)]
struct ModelineOut {
    #[command(flatten)]
    chart_settings: ChartSettings,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl LogLevel {
    fn as_directive(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl ChartSettings {
    fn charts(&self) -> Result<Vec<Chart>> {
        let charts = chart::search(&self.chart_dirs).context("failed to search for charts")?;
        if charts.is_empty() {
            tracing::warn!(dirs = ?self.chart_dirs, "no charts found");
        }
        Ok(charts)
    }
}

impl SchemaOut {
    fn config(&self) -> SchemaConfig {
        SchemaConfig {
            strict: self.strict,
            stdout: self.stdout,
            dry_run: self.chart_settings.dry_run,
            write_modeline: self.write_modeline,
        }
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    /// Install the global `tracing` subscriber on stderr.
    pub fn init_logging(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.log_level.as_directive()));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    pub fn run(&self) -> Result<ExitCode> {
        match &self.cmd {
            Command::Schema(target) => run_schema(target),
            Command::Modeline(target) => run_modeline(target),
        }
    }
}

fn run_schema(target: &SchemaOut) -> Result<ExitCode> {
    let config = target.config();
    let plans = target
        .chart_settings
        .charts()?
        .into_iter()
        .map(|chart| Plan::new(config, chart))
        .collect::<Vec<_>>();

    // 1) build every chart independently
    let built = plans
        .par_iter()
        .map(|plan| {
            let span = tracing::info_span!("chart", name = %plan.chart.details.name);
            let _guard = span.enter();
            plan.log_details();
            plan.generate(&TracingSink)
        })
        .collect::<Vec<_>>();

    // 2) write in discovery order
    let mut failed = 0usize;
    for (plan, result) in plans.iter().zip(built) {
        let span = tracing::info_span!("chart", name = %plan.chart.details.name);
        let _guard = span.enter();
        match result.and_then(|schema| write_outputs(plan, &schema)) {
            Ok(()) => status_ok(plan),
            Err(error) => {
                failed += 1;
                tracing::error!("{error}");
                status_failed(plan);
            }
        }
    }

    if failed > 0 {
        tracing::error!("{failed} of {} charts failed", plans.len());
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn write_outputs(plan: &Plan, schema: &SchemaNode) -> crate::Result<()> {
    plan.write_schema(schema)?;
    if plan.config.write_modeline {
        plan.write_modeline()?;
    }
    Ok(())
}

fn run_modeline(target: &ModelineOut) -> Result<ExitCode> {
    let dry_run = target.chart_settings.dry_run;
    let mut failed = 0usize;
    for chart in target.chart_settings.charts()? {
        let values_file = chart.values_file();
        let written = crate::modeline::write(&values_file, &chart.schema_file(), dry_run)
            .with_context(|| format!("failed to write modeline to {}", values_file.display()));
        match written {
            Ok(()) => eprintln!("{} {}", "modeline".green().bold(), values_file.display()),
            Err(error) => {
                failed += 1;
                tracing::error!("{error:#}");
                eprintln!("{} {}", "failed".red().bold(), values_file.display());
            }
        }
    }
    Ok(if failed > 0 { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn status_ok(plan: &Plan) {
    let verb = if plan.config.dry_run { "checked" } else { "wrote" };
    eprintln!(
        "{} {} ({})",
        verb.green().bold(),
        plan.chart.schema_file().display(),
        plan.chart.details.name.dimmed(),
    );
}

fn status_failed(plan: &Plan) {
    eprintln!(
        "{} {} ({})",
        "failed".red().bold(),
        plan.chart.values_file().display(),
        plan.chart.details.name.dimmed(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_valid() {
        CommandLineInterface::command().debug_assert();
    }

    #[test]
    fn parses_schema_flags() {
        let cli = CommandLineInterface::try_parse_from([
            "values-schema", "--log-level", "debug", "schema", "--strict", "--dry-run", "charts/a", "charts/b",
        ])
        .unwrap();
        assert_eq!(cli.log_level, LogLevel::Debug);
        let Command::Schema(target) = cli.cmd else { panic!("expected schema") };
        assert_eq!(target.config(), SchemaConfig { strict: true, stdout: false, dry_run: true, write_modeline: false });
        assert_eq!(target.chart_settings.chart_dirs, vec!["charts/a", "charts/b"]);
    }

    #[test]
    fn chart_dirs_are_required() {
        assert!(CommandLineInterface::try_parse_from(["values-schema", "modeline"]).is_err());
    }
}
