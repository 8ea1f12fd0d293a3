//! Utilities (expression file loading).

use std::fs;
use std::path::Path;

use anyhow::{bail, Result};

/// Read a VTL expression from a script file.
/// Accepts .vtl and plain text extensions.
pub fn read_expression_file(file_path: &str) -> Result<String> {
    let path = Path::new(file_path);

    if !path.exists() {
        bail!("Expression file '{}' does not exist", file_path);
    }

    if !path.is_file() {
        bail!("'{}' is not a file", file_path);
    }

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "vtl" | "txt" | "" => {
            let text = fs::read_to_string(path)
                .map_err(|e| anyhow::anyhow!("Failed to read file '{}': {}", file_path, e))?;
            if text.trim().is_empty() {
                bail!("Expression file '{}' is empty", file_path);
            }
            Ok(text)
        }
        _ => {
            bail!(
                "Unsupported file type: .{}\nCurrently supported: .vtl, .txt, and files without extension",
                extension
            );
        }
    }
}
