//! Helm chart discovery.
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

pub const CHART_FILE: &str = "Chart.yaml";
pub const VALUES_FILE: &str = "values.yaml";
pub const SCHEMA_FILE: &str = "values.schema.json";

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ChartDetails {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chart {
    root: PathBuf,
    pub details: ChartDetails,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Chart {
    /// Read `Chart.yaml` under `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let path = root.join(CHART_FILE);
        let content = std::fs::read_to_string(&path)?;
        let details = serde_yaml::from_str::<ChartDetails>(&content)
            .map_err(|source| Error::ChartMetadata { path, source })?;
        Ok(Self { root, details })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
    pub fn chart_file(&self) -> PathBuf {
        self.root.join(CHART_FILE)
    }
    pub fn values_file(&self) -> PathBuf {
        self.root.join(VALUES_FILE)
    }
    pub fn schema_file(&self) -> PathBuf {
        self.root.join(SCHEMA_FILE)
    }
}

/// Find every chart at or below the given directories.
///
/// Arguments may be glob patterns; relative paths resolve against the
/// current directory. A directory is a chart when it holds both a
/// `Chart.yaml` and a `values.yaml` file. Directories whose chart metadata
/// cannot be read are skipped with a warning.
pub fn search<I>(chart_dirs: I) -> Result<Vec<Chart>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut charts = Vec::<Chart>::new();
    for root in resolve_roots(chart_dirs)? {
        let pattern = format!("{}/**/{CHART_FILE}", glob::Pattern::escape(&root.to_string_lossy()));
        for entry in glob::glob(&pattern)? {
            let chart_file = match entry {
                Ok(path) => path,
                Err(error) => {
                    tracing::trace!(%error, "search: skipping unreadable path");
                    continue;
                }
            };
            let Some(dir) = chart_file.parent() else { continue };
            tracing::trace!(path = %dir.display(), "search: checking path");

            if !chart_file.is_file() {
                tracing::trace!(path = %dir.display(), reason = "Chart.yaml is a directory", "search: skipping path");
                continue;
            }
            if !dir.join(VALUES_FILE).is_file() {
                tracing::trace!(path = %dir.display(), reason = "values.yaml is missing", "search: skipping path");
                continue;
            }

            match Chart::open(dir) {
                Ok(chart) => {
                    tracing::info!(name = %chart.details.name, path = %dir.display(), "search: found chart");
                    charts.push(chart);
                }
                Err(error) => {
                    tracing::warn!(path = %dir.display(), %error, "search: skipping possible chart");
                }
            }
        }
    }

    charts.sort_by(|a, b| a.root.cmp(&b.root));
    charts.dedup_by(|a, b| a.root == b.root);
    tracing::debug!(count = charts.len(), "search: done");
    Ok(charts)
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

/// Make each argument absolute and expand it as a glob.
fn resolve_roots<I>(chart_dirs: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'['))
    }

    let cwd = std::env::current_dir()?;
    let mut out = Vec::new();
    for raw in chart_dirs {
        let raw = raw.as_ref();
        let absolute = cwd.join(raw);
        if has_glob_chars(raw) {
            for entry in glob::glob(&absolute.to_string_lossy())? {
                match entry {
                    Ok(path) => out.push(path),
                    Err(error) => tracing::trace!(%error, "search: skipping unreadable path"),
                }
            }
        } else {
            out.push(absolute);
        }
    }
    Ok(out)
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chart_details_ignore_other_fields() {
        let details: ChartDetails =
            serde_yaml::from_str("apiVersion: v2\nname: demo\ndescription: A demo chart\nversion: 0.1.0\n").unwrap();
        assert_eq!(details, ChartDetails { name: "demo".to_string(), description: "A demo chart".to_string() });
    }

    #[test]
    fn chart_paths_live_under_root() {
        let chart = Chart { root: PathBuf::from("/charts/demo"), details: ChartDetails::default() };
        assert_eq!(chart.chart_file(), PathBuf::from("/charts/demo/Chart.yaml"));
        assert_eq!(chart.values_file(), PathBuf::from("/charts/demo/values.yaml"));
        assert_eq!(chart.schema_file(), PathBuf::from("/charts/demo/values.schema.json"));
    }
}
