//! Writes generated test cases to files that other tools consume.

use std::path::Path;

use miette::{Context, IntoDiagnostic};
use serde::Serialize;

mod json;
mod postman;

pub use json::CasesFile;
pub use postman::{Placement, PostmanCollection};

pub fn write_to_disk(output: &Path, export: impl IntoExport) -> miette::Result<()> {
    let export = export.into_export();
    let path = output.join(export.path());
    let string = export.into_string()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .into_diagnostic()
            .with_context(|| format!("Failed to create directory `{}`", parent.display()))?;
    }
    std::fs::write(&path, string)
        .into_diagnostic()
        .with_context(|| format!("Failed to write `{}`", path.display()))?;
    Ok(())
}

/// The contents of an exported file.
pub trait Export {
    /// The file's path, relative to the output directory.
    fn path(&self) -> &str;
    fn into_string(self) -> miette::Result<String>;
}

/// Pretty-printed JSON, with a trailing newline.
impl<T: AsRef<str>, V: Serialize> Export for (T, V) {
    fn path(&self) -> &str {
        self.0.as_ref()
    }

    fn into_string(self) -> miette::Result<String> {
        let mut string = serde_json::to_string_pretty(&self.1)
            .into_diagnostic()
            .with_context(|| format!("Failed to serialize `{}`", self.0.as_ref()))?;
        string.push('\n');
        Ok(string)
    }
}

pub trait IntoExport {
    type Export: Export;

    fn into_export(self) -> Self::Export;
}

impl<T: Export> IntoExport for T {
    type Export = T;

    fn into_export(self) -> Self::Export {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_write_to_disk_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out");
        write_to_disk(&output, ("nested/out.json", json!({"ok": true}))).unwrap();

        let written = std::fs::read_to_string(output.join("nested/out.json")).unwrap();
        assert_eq!(written, "{\n  \"ok\": true\n}\n");
    }
}
