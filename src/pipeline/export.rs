// src/pipeline/export.rs

//! CSV export of harvested records.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use crate::error::Result;
use crate::models::ExhibitorRecord;

/// What was written by [`write_csv`].
#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub rows: usize,
}

/// Render records as CSV with a header row.
pub fn render_csv(records: &[ExhibitorRecord]) -> String {
    let mut out = String::new();
    push_row(&mut out, ExhibitorRecord::COLUMNS.iter().copied());
    for record in records {
        push_row(&mut out, record.cells().iter().map(String::as_str));
    }
    out
}

fn push_row<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>) {
    for (i, cell) in cells.enumerate() {
        if i > 0 {
            out.push(',');
        }
        push_cell(out, cell);
    }
    out.push('\n');
}

fn push_cell(out: &mut String, cell: &str) {
    if cell.contains([',', '"', '\n', '\r']) {
        out.push('"');
        out.push_str(&cell.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(cell);
    }
}

/// Write records to `path` (write to temp, then rename).
pub async fn write_csv(path: impl AsRef<Path>, records: &[ExhibitorRecord]) -> Result<ExportSummary> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let tmp = path.with_extension("tmp");
    let mut file = tokio::fs::File::create(&tmp).await?;
    file.write_all(render_csv(records).as_bytes()).await?;
    file.flush().await?;
    drop(file);

    tokio::fs::rename(&tmp, path).await?;
    Ok(ExportSummary {
        path: path.to_path_buf(),
        rows: records.len(),
    })
}
