//! Lookup report rendering

use serde::Serialize;

use crate::error::Result;
use crate::lookup::LookupOutcome;
use crate::quota::QuotaRecord;

/// Header printed before a decoded record
pub const QUOTA_HEADER: &str = "Quotas (FileSystem:BlocksSoft,BlocksHard,InodesSoft,InodesHard)";

/// Report output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human readable text
    #[default]
    Text,
    /// Single JSON object
    Json,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    entries: usize,
    found: bool,
    quota: Option<&'a QuotaRecord>,
}

/// Render `outcome` in the requested format
pub fn render(outcome: &LookupOutcome, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(outcome)),
        OutputFormat::Json => render_json(outcome),
    }
}

/// Text report
pub fn render_text(outcome: &LookupOutcome) -> String {
    match outcome {
        LookupOutcome::NoEntries => "0 entries found.\n".to_string(),
        LookupOutcome::NotFound { entries } => {
            format!("# {} entries found.\nQuotas Not Found!\n", entries)
        }
        LookupOutcome::Found { entries, record } => {
            format!("# {} entries found.\n{}\n{}\n", entries, QUOTA_HEADER, record)
        }
    }
}

/// JSON report
pub fn render_json(outcome: &LookupOutcome) -> Result<String> {
    let report = JsonReport {
        entries: outcome.entries(),
        found: outcome.record().is_some(),
        quota: outcome.record(),
    };
    Ok(serde_json::to_string(&report)?)
}
