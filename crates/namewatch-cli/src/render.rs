// # Text Rendering
//
// Plain-text rendering of facade reports for the terminal.

use namewatch_core::Error;
use namewatch_core::facade::{
    AvailabilityReport, BedrockHistory, BedrockReport, FallbackReason, HistoryReport,
};
use serde_json::Value;
use std::fmt::Write;
use std::time::Duration;

const RULE: &str = "----------------------------------------";
const PREFIX: &str = "[namewatch]";

/// One prefixed status line
pub fn line(message: &str) -> String {
    format!("{} {}", PREFIX, message)
}

/// A command rejected before anything was looked up
pub fn error(err: &Error) -> String {
    match err {
        Error::InvalidInput(message) => line(message),
        other => line(&format!("Error: {}", other)),
    }
}

/// Human-readable age, largest whole unit
pub fn format_age(age_ms: i64) -> String {
    let seconds = age_ms.max(0) / 1000;
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    let (count, unit) = if days > 0 {
        (days, "day")
    } else if hours > 0 {
        (hours, "hour")
    } else if minutes > 0 {
        (minutes, "minute")
    } else {
        (seconds, "second")
    };

    format!("{} {}{}", count, unit, if count == 1 { "" } else { "s" })
}

fn cooling_down(remaining: Duration) -> String {
    line(&format!(
        "Please wait {:.1}s before checking again.",
        remaining.as_secs_f64()
    ))
}

/// Outcome of a name-history command
pub fn history(name: &str, report: &HistoryReport) -> String {
    match report {
        HistoryReport::Live { profile } => profile_block(profile),
        HistoryReport::Cached { profile, .. } => {
            format!("{}\n{}", line("Using cached data..."), profile_block(profile))
        }
        HistoryReport::Stale {
            profile,
            age_ms,
            reason,
        } => {
            let notice = match reason {
                FallbackReason::Unreachable => "API unavailable, using cached data...",
                FallbackReason::Rejected { .. } => "Player not found, showing cached data...",
                FallbackReason::Error { .. } => "Error occurred, using cached data...",
            };
            format!(
                "{}\n{}\n(Cached {} ago)",
                line(notice),
                profile_block(profile),
                format_age(*age_ms)
            )
        }
        HistoryReport::NotFound => line(&format!("Player not found: {}", name)),
        HistoryReport::Failed { message } => line(&format!("Error: {}", message)),
        HistoryReport::CoolingDown { remaining } => cooling_down(*remaining),
    }
}

/// Name history entries of a profile document
fn history_entries(out: &mut String, usernames: &[Value]) {
    for (index, entry) in usernames.iter().enumerate() {
        let Some(entry) = entry.as_object() else {
            continue;
        };
        let name = entry
            .get("username")
            .and_then(Value::as_str)
            .unwrap_or("Unknown");

        let note = match entry.get("changed_at").and_then(Value::as_str) {
            Some(changed_at) => format!(" ({})", changed_at),
            None if index == usernames.len() - 1 => " (Original)".to_string(),
            None => String::new(),
        };

        let _ = writeln!(out, "  » {}{}", name, note);
    }
}

/// Profile document as returned by the history service
pub fn profile_block(profile: &Value) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}\n{}\n", RULE, PREFIX);

    if let Some(username) = profile.get("username").and_then(Value::as_str) {
        let _ = writeln!(out, "Current Name: {}", username);
    }
    if let Some(uuid) = profile.get("uuid").and_then(Value::as_str) {
        let _ = writeln!(out, "UUID: {}", uuid);
    }

    match profile.get("usernames").and_then(Value::as_array) {
        Some(usernames) => {
            let _ = writeln!(out, "\nName History ({}):", usernames.len());
            history_entries(&mut out, usernames);
        }
        None => {
            let _ = writeln!(out, "\nNo name history available");
        }
    }

    if let Some(created_at) = profile.get("created_at").and_then(Value::as_str) {
        let _ = writeln!(out, "\nFirst Seen: {}", created_at);
    }
    if let Some(views) = profile.get("views_lifetime").and_then(Value::as_i64) {
        let _ = writeln!(out, "Profile Views: {}", views);
    }

    out.push_str(RULE);
    out
}

/// Outcome of an availability command
pub fn availability(name: &str, report: &AvailabilityReport) -> String {
    let status = match report {
        AvailabilityReport::Available => {
            "Status: Available!\nThis name can be claimed.".to_string()
        }
        AvailabilityReport::Taken { current_owner } => match current_owner {
            Some(owner) => format!("Status: Taken\nCurrent Owner: {}", owner),
            None => "Status: Taken".to_string(),
        },
        AvailabilityReport::Unknown { status } => format!("Status: Unknown (HTTP {})", status),
        AvailabilityReport::Failed { message } => return line(&format!("Error: {}", message)),
        AvailabilityReport::CoolingDown { remaining } => return cooling_down(*remaining),
    };

    format!("{}\n{}\n\nName: {}\n{}\n{}", RULE, PREFIX, name, status, RULE)
}

/// Outcome of a cross-platform lookup command
pub fn bedrock(report: &BedrockReport) -> String {
    let profile = match report {
        BedrockReport::Found(profile) => profile,
        BedrockReport::NotFound { gamertag } => {
            return format!(
                "{}\n{} (Bedrock)\n\nGamertag: {}\n\nStatus: Not Found / API Unavailable\n\
                 The Bedrock account was not found or the API is currently unavailable.\n\
                 Try again later or verify the gamertag is correct.\n{}",
                RULE, PREFIX, gamertag, RULE
            );
        }
        BedrockReport::CoolingDown { remaining } => return cooling_down(*remaining),
    };

    let mut out = String::new();
    let _ = writeln!(out, "{}\n{} (Bedrock)\n", RULE, PREFIX);
    let _ = writeln!(out, "Gamertag: {}", profile.gamertag);
    let _ = writeln!(out, "XUID: {}", profile.xuid);
    if let Some(uuid) = &profile.floodgate_uuid {
        let _ = writeln!(out, "Floodgate UUID: {}", uuid);
    }
    out.push('\n');

    match &profile.history {
        BedrockHistory::Tracked(data) => {
            match data.get("usernames").and_then(Value::as_array) {
                Some(usernames) if !usernames.is_empty() => {
                    let _ = writeln!(out, "Name History ({}):", usernames.len());
                    history_entries(&mut out, usernames);
                }
                _ => {
                    let _ = writeln!(out, "Name History: No history available");
                }
            }
        }
        BedrockHistory::NotTracked => {
            let _ = writeln!(out, "Name History: Not tracked yet");
        }
        BedrockHistory::Unavailable => {
            let _ = writeln!(out, "Name History: Unavailable");
        }
        BedrockHistory::NotDerivable => {
            let _ = writeln!(out, "Name History: Xbox does not provide public name history");
        }
    }

    let _ = writeln!(out, "\nStatus: Bedrock Account Found!\nPlatform: Xbox/Bedrock");
    out.push_str(RULE);
    out
}

/// Watched names with their last observed state
pub fn watchlist(entries: &[(String, Option<bool>)]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}\n[namewatch watchlist]\n", RULE);

    if entries.is_empty() {
        let _ = writeln!(out, "Your watchlist is empty.\nUse 'watch <name>' to add names.");
    } else {
        let _ = writeln!(out, "Watching {} names:\n", entries.len());
        for (name, last_known) in entries {
            let state = match last_known {
                Some(true) => "available",
                Some(false) => "taken",
                None => "not checked yet",
            };
            let _ = writeln!(out, "  » {} ({})", name, state);
        }
    }

    out.push_str(RULE);
    out
}

/// Banner for a became-available notification
pub fn name_available(name: &str) -> String {
    format!(
        "{}\n{} Name Available!\n\nThe name {} is now available!\n{}",
        RULE, PREFIX, name, RULE
    )
}

/// Command summary
pub fn help() -> String {
    [
        RULE,
        PREFIX,
        "",
        "Commands:",
        "  <name>               Check name history",
        "  available <name>     Check availability",
        "  bedrock <gamertag>   Check Bedrock player",
        "  watch <name>         Watch name",
        "  unwatch <name>       Stop watching",
        "  watchlist [clear]    Show or clear the watchlist",
        "  cache [clear]        Show cache info or clear it",
        "  quit                 Exit",
        RULE,
    ]
    .join("\n")
}
