//! Label output (text or JSON lines)

use anyhow::Result;
use serde::Serialize;
use std::io::Write;

/// Placeholder shown for labels the tracker refused
pub const UNTRACKED: &str = "(invalid timestamp)";

/// One label as shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelRow {
    pub name: String,
    pub timestamp: String,
    pub text: String,
    pub tracked: bool,
}

/// How rows are written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    JsonLines,
}

/// Write rows to `out`, one line each
pub fn write_rows<W: Write>(out: &mut W, rows: &[LabelRow], format: ReportFormat) -> Result<()> {
    let width = rows.iter().map(|row| row.name.len()).max().unwrap_or(0);
    for row in rows {
        match format {
            ReportFormat::Text => {
                let text = if row.tracked { row.text.as_str() } else { UNTRACKED };
                writeln!(out, "{:<width$}  {}", row.name, text, width = width)?;
            }
            ReportFormat::JsonLines => {
                serde_json::to_writer(&mut *out, row)?;
                writeln!(out)?;
            }
        }
    }
    out.flush()?;
    Ok(())
}
