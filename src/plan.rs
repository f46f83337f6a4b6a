//! Per-chart generation plan.
use crate::builder::{self, BuildOptions};
use crate::chart::Chart;
use crate::diagnostics::DiagnosticSink;
use crate::error::Result;
use crate::modeline;
use crate::schema::SchemaNode;

/// Settings of one `schema` run, shared by every chart.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SchemaConfig {
    pub strict: bool,
    pub stdout: bool,
    pub dry_run: bool,
    pub write_modeline: bool,
}

#[derive(Clone, Debug)]
pub struct Plan {
    pub config: SchemaConfig,
    pub chart: Chart,
}

impl Plan {
    pub fn new(config: SchemaConfig, chart: Chart) -> Self {
        Self { config, chart }
    }

    pub fn build_options(&self) -> BuildOptions {
        BuildOptions { strict: self.config.strict }
    }

    pub fn log_details(&self) {
        let name = &self.chart.details.name;
        tracing::debug!("plan: {name}: DryRun={}", self.config.dry_run);
        tracing::debug!("plan: {name}: StrictComments={}", self.config.strict);
        tracing::debug!("plan: {name}: Stdout={}", self.config.stdout);
        tracing::debug!("plan: {name}: WriteModeline={}", self.config.write_modeline);
        tracing::debug!("plan: {name}: ChartRoot={}", self.chart.root().display());
        tracing::debug!("plan: {name}: ValuesFile={}", self.chart.values_file().display());
        tracing::debug!("plan: {name}: SchemaFile={}", self.chart.schema_file().display());
    }

    /// Read the chart's values file and build its schema.
    pub fn generate(&self, sink: &dyn DiagnosticSink) -> Result<SchemaNode> {
        let values_file = self.chart.values_file();
        let source = std::fs::read_to_string(&values_file)?;
        builder::generate(&source, &values_file.to_string_lossy(), self.build_options(), sink)
    }

    /// Encode `schema` as indented JSON and return it.
    ///
    /// The text is printed when `stdout` is set and written to the chart's
    /// schema file unless `dry_run` is set.
    pub fn write_schema(&self, schema: &SchemaNode) -> Result<String> {
        let encoded = schema.to_json_pretty()?;
        if self.config.stdout {
            println!("{encoded}");
        }
        if self.config.dry_run {
            tracing::info!(chart = %self.chart.details.name, "schema: dry-run enabled, skipping write");
            return Ok(encoded);
        }
        std::fs::write(self.chart.schema_file(), &encoded)?;
        Ok(encoded)
    }

    pub fn write_modeline(&self) -> Result<()> {
        modeline::write(&self.chart.values_file(), &self.chart.schema_file(), self.config.dry_run)
    }
}
