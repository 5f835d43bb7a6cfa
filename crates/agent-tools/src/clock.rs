//! Current time

use agent_core::{FnTool, NoArgs, Result, Tool};
use chrono::{SecondsFormat, Utc};

async fn now(_: NoArgs) -> anyhow::Result<String> {
    Ok(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// `time_reporter`, takes no arguments
pub fn time_reporter() -> Result<impl Tool> {
    FnTool::new(
        "time_reporter",
        "Reports the current UTC time in RFC 3339 format",
        Vec::new(),
        now,
    )
}
