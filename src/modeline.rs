//! `# yaml-language-server: $schema=...` modeline in values files.
use std::path::Path;

use crate::error::Result;

pub const MODELINE_KEY: &str = "yaml-language-server";

/// The modeline pointing at `schema_path`'s file name, newline-terminated.
pub fn render(schema_path: &Path) -> String {
    let file_name = schema_path
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_else(|| schema_path.to_string_lossy());
    format!("# {MODELINE_KEY}: $schema={file_name}\n")
}

/// Replace the existing modeline in `content`, or prepend one followed by a blank line.
pub fn apply(content: &str, schema_path: &Path) -> String {
    let modeline = render(schema_path);
    let marker = format!("# {MODELINE_KEY}:");
    match content.find(&marker) {
        Some(start) => {
            let end = content[start..]
                .find('\n')
                .map_or(content.len(), |eol| start + eol + 1);
            format!("{}{modeline}{}", &content[..start], &content[end..])
        }
        None => format!("{modeline}\n{content}"),
    }
}

/// Rewrite the modeline of the values file at `values_path` in place.
pub fn write(values_path: &Path, schema_path: &Path, dry_run: bool) -> Result<()> {
    if dry_run {
        tracing::info!(path = %values_path.display(), "modeline: dry-run enabled, skipping write");
        return Ok(());
    }
    let content = std::fs::read_to_string(values_path)?;
    let updated = apply(&content, schema_path);
    if updated != content {
        std::fs::write(values_path, updated)?;
    }
    tracing::debug!(path = %values_path.display(), "modeline: written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = "/charts/demo/values.schema.json";

    #[test]
    fn prepends_modeline_with_blank_line() {
        assert_eq!(
            apply("foo: bar\n", Path::new(SCHEMA)),
            "# yaml-language-server: $schema=values.schema.json\n\nfoo: bar\n"
        );
    }

    #[test]
    fn replaces_existing_modeline() {
        let content = "# yaml-language-server: $schema=old.json\n\n# doc\nfoo: bar\n";
        assert_eq!(
            apply(content, Path::new(SCHEMA)),
            "# yaml-language-server: $schema=values.schema.json\n\n# doc\nfoo: bar\n"
        );
    }

    #[test]
    fn replaces_modeline_on_last_line_without_newline() {
        assert_eq!(
            apply("foo: bar\n# yaml-language-server: $schema=x", Path::new(SCHEMA)),
            "foo: bar\n# yaml-language-server: $schema=values.schema.json\n"
        );
    }

    #[test]
    fn apply_is_idempotent() {
        let once = apply("foo: bar\n", Path::new(SCHEMA));
        assert_eq!(apply(&once, Path::new(SCHEMA)), once);
    }

    #[test]
    fn write_respects_dry_run() {
        let dir = tempfile::tempdir().unwrap();
        let values = dir.path().join("values.yaml");
        std::fs::write(&values, "foo: bar\n").unwrap();

        write(&values, Path::new(SCHEMA), true).unwrap();
        assert_eq!(std::fs::read_to_string(&values).unwrap(), "foo: bar\n");

        write(&values, Path::new(SCHEMA), false).unwrap();
        assert!(std::fs::read_to_string(&values).unwrap().starts_with("# yaml-language-server:"));
    }
}
