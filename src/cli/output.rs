//! Output formatting helpers for CLI commands

use crate::api::SnapshotView;
use crate::orchestrator::{OverallStatus, Snapshot};
use crate::poller::{SourceState, SourceStatus};
use crate::source::{Payload, Source};
use chrono::{DateTime, Local, Utc};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde::Serialize;
use serde_json::json;

/// View model for a configured source
#[derive(Debug, Clone, Serialize)]
pub struct SourceRow {
    pub id: String,
    pub kind: String,
    pub url: String,
    pub cadence: String,
    pub timeout_seconds: u64,
}

impl SourceRow {
    /// Describe `source` as registered under `base_url`.
    pub fn new(source: &Source, base_url: &str) -> Self {
        let url = source
            .url(base_url)
            .map(|u| u.to_string())
            .unwrap_or_else(|e| format!("<{}>", e));
        Self {
            id: source.id.clone(),
            kind: source.kind.to_string(),
            url,
            cadence: source.cadence.to_string(),
            timeout_seconds: source.timeout.as_secs(),
        }
    }
}

/// Format sources as a table
pub fn format_sources_table(rows: &[SourceRow]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Source", "Kind", "URL", "Cadence", "Timeout"]);

    for r in rows {
        table.add_row(vec![
            Cell::new(&r.id),
            Cell::new(&r.kind),
            Cell::new(&r.url),
            Cell::new(&r.cadence),
            Cell::new(format!("{}s", r.timeout_seconds)),
        ]);
    }

    table.to_string()
}

/// Format sources as JSON
pub fn format_sources_json(rows: &[SourceRow]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&json!({ "sources": rows }))
}

/// Format a snapshot as a status line followed by one row per source
pub fn format_snapshot_table(snapshot: &Snapshot) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Source", "Status", "Value", "Updated", "Failures", "Last error"]);

    for (id, state) in &snapshot.sources {
        let value = state
            .last_success
            .as_ref()
            .map(summarize_payload)
            .unwrap_or_else(|| "-".to_string());
        let error = state
            .last_result
            .as_ref()
            .and_then(|r| r.error_message())
            .unwrap_or("-");

        table.add_row(vec![
            Cell::new(id),
            Cell::new(status_label(state)),
            Cell::new(value),
            Cell::new(format_time(state.last_success_at)),
            Cell::new(state.consecutive_failures),
            Cell::new(error),
        ]);
    }

    format!(
        "Overall: {}  (version {}, last update {})\n{}",
        overall_label(snapshot.overall_status),
        snapshot.version,
        format_time(snapshot.last_update),
        table
    )
}

/// Format a snapshot as JSON, in the same shape as `GET /api/snapshot`
pub fn format_snapshot_json(snapshot: &Snapshot) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&SnapshotView::from(snapshot))
}

/// One-line summary of a decoded payload.
pub fn summarize_payload(payload: &Payload) -> String {
    match payload {
        Payload::OptionChain(chain) => {
            let spot = chain
                .underlying_price
                .map(|p| format!("spot {:.2}, ", p))
                .unwrap_or_default();
            let strikes = chain.calls.len().max(chain.puts.len()).max(chain.contracts.len());
            format!("{}PCR {:.2}, {} strikes", spot, chain.pcr, strikes)
        }
        Payload::CurrentPrice(price) => match price.change {
            Some(change) => format!("LTP {:.2} ({:+.2})", price.ltp, change),
            None => format!("LTP {:.2}", price.ltp),
        },
        Payload::PreviousDay(ohlc) => format!(
            "O {:.2} H {:.2} L {:.2} C {:.2}",
            ohlc.open, ohlc.high, ohlc.low, ohlc.close
        ),
        Payload::StochRsi(rsi) => match &rsi.signal {
            Some(signal) => format!("StochRSI {:.2} ({})", rsi.stochrsi, signal),
            None => format!("StochRSI {:.2}", rsi.stochrsi),
        },
        Payload::SupportResistance(levels) => {
            let join = |levels: &[crate::source::Level]| {
                levels
                    .iter()
                    .map(|l| format!("{:.2}", l.value()))
                    .collect::<Vec<_>>()
                    .join(" ")
            };
            format!(
                "S {} | R {}",
                join(&levels.supports),
                join(&levels.resistances)
            )
        }
    }
}

fn status_label(state: &SourceState<Payload>) -> String {
    let label = match state.status() {
        SourceStatus::Loading => "Loading".yellow(),
        SourceStatus::Live => "Live".green(),
        SourceStatus::Stale => "Stale".yellow(),
        SourceStatus::Unreachable => "Unreachable".red(),
    };
    if state.is_in_flight && state.status() != SourceStatus::Loading {
        format!("{} ↻", label)
    } else {
        label.to_string()
    }
}

fn overall_label(status: OverallStatus) -> String {
    let label = status.as_str().to_uppercase();
    match status {
        OverallStatus::Healthy => label.green().bold().to_string(),
        OverallStatus::Degraded | OverallStatus::Loading => label.yellow().bold().to_string(),
        OverallStatus::Unreachable => label.red().bold().to_string(),
    }
}

fn format_time(at: Option<DateTime<Utc>>) -> String {
    at.map(|t| t.with_timezone(&Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "never".to_string())
}
