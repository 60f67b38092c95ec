//! Best-effort CSV projection for the staging preview
//!
//! Display-only: plain comma split with trimmed fields, no quoting or
//! escaping, no column-count validation. Matches what the backend's import
//! path will see; anything fancier would show the user a different table
//! than the one they are about to upload.

use std::io;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvPreview {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

fn split_fields(line: &str) -> Vec<String> {
    line.split(',').map(|field| field.trim().to_string()).collect()
}

/// Project CSV text into a header row and body rows, dropping blank lines.
/// Returns `None` when there is no non-blank line to show.
pub fn parse(text: &str) -> Option<CsvPreview> {
    let mut lines = text.lines().filter(|line| !line.trim().is_empty());
    let headers = split_fields(lines.next()?);
    let rows = lines.map(split_fields).collect();
    Some(CsvPreview { headers, rows })
}

/// Read a staged file and project its content. Regenerated on every call;
/// never touches the staging queue.
pub async fn preview_file(path: &Path) -> io::Result<Option<CsvPreview>> {
    let text = tokio::fs::read_to_string(path).await?;
    Ok(parse(&text))
}
