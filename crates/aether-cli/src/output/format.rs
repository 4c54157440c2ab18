use std::path::Path;

use aether_core::model::{LogEntry, Message};
use aether_core::storage::AuditStats;

use super::OutputFormat;

pub const GUEST: &str = "guest";

pub fn format_cost(cost: f64) -> String {
    format!("${cost:.4}")
}

pub fn user_label(user: Option<&str>) -> &str {
    user.unwrap_or(GUEST)
}

pub fn format_messages(messages: &[Message], fmt: OutputFormat) -> String {
    match fmt {
        OutputFormat::Json => serde_json::to_string_pretty(messages).unwrap_or_default(),
        OutputFormat::Text => {
            let mut out = String::new();
            for m in messages {
                out.push_str(&format!("{}: {}\n", m.role, m.content));
            }
            out
        }
    }
}

pub fn format_log_list(entries: &[LogEntry], full: bool, fmt: OutputFormat) -> String {
    match fmt {
        OutputFormat::Json => serde_json::to_string_pretty(entries).unwrap_or_default(),
        OutputFormat::Text => format_log_list_text(entries, full),
    }
}

fn format_log_list_text(entries: &[LogEntry], full: bool) -> String {
    if entries.is_empty() {
        return "No log entries found.\n".to_string();
    }

    let mut out = String::new();
    for e in entries {
        let time = e.time.format("%Y-%m-%d %H:%M:%S");
        let user = user_label(e.user.as_deref());
        let prompt = first_line(&e.prompt);
        out.push_str(&format!(
            "\u{25c6} {} {time} [{}] {user}  {prompt}\n",
            e.id.short(),
            e.log_type
        ));
        if full {
            for line in e.response.to_text().lines() {
                out.push_str(&format!("    {line}\n"));
            }
        }
    }
    out
}

fn first_line(text: &str) -> &str {
    let line = text.lines().next().unwrap_or("");
    if line.is_empty() {
        "(no prompt)"
    } else {
        line
    }
}

pub fn format_stats(stats: &AuditStats, home: &Path, fmt: OutputFormat) -> String {
    match fmt {
        OutputFormat::Json => serde_json::to_string_pretty(stats).unwrap_or_default(),
        OutputFormat::Text => {
            let mut out = String::new();
            out.push_str("Aether Statistics\n");
            out.push_str("=================\n");
            out.push_str(&format!("Home:           {}\n", home.display()));
            out.push_str(&format!("Log entries:    {}\n", stats.total_entries));
            out.push_str(&format!(
                "Ledger total:   {}\n",
                format_cost(stats.ledger_total)
            ));
            if let (Some(e), Some(l)) = (stats.earliest, stats.latest) {
                out.push_str(&format!(
                    "Date range:     {} to {}\n",
                    e.format("%Y-%m-%d"),
                    l.format("%Y-%m-%d")
                ));
            }

            if !stats.by_type.is_empty() {
                out.push_str("\nBy Type:\n");
                for (log_type, count) in &stats.by_type {
                    out.push_str(&format!("  {log_type}: {count}\n"));
                }
            }
            if !stats.by_user.is_empty() {
                out.push_str("\nBy User:\n");
                for (user, count) in &stats.by_user {
                    out.push_str(&format!("  {user}: {count}\n"));
                }
            }
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aether_core::model::{AgentRole, LogType, NewLogEntry};

    #[test]
    fn test_format_cost_four_places() {
        assert_eq!(format_cost(0.0), "$0.0000");
        assert_eq!(format_cost(0.00034), "$0.0003");
        assert_eq!(format_cost(1.5), "$1.5000");
    }

    #[test]
    fn test_log_list_text_shows_guest_and_type() {
        let entry = NewLogEntry::new(LogType::LogoGenerate, "acme logo\nsecond line", "svg".to_string()).stamp();
        let out = format_log_list(&[entry.clone()], false, OutputFormat::Text);
        assert!(out.contains(entry.id.short()));
        assert!(out.contains("[logo-generate] guest  acme logo"));
        assert!(!out.contains("second line"));
    }

    #[test]
    fn test_log_list_full_indents_response() {
        let replies = vec![Message::new(AgentRole::Verifier, "Checkpoints")];
        let entry = NewLogEntry::new(LogType::Workbench, "hi", replies)
            .with_user(Some("ada@example.com".into()))
            .stamp();
        let out = format_log_list(&[entry], true, OutputFormat::Text);
        assert!(out.contains("ada@example.com"));
        assert!(out.contains("    Verifier: Checkpoints\n"));
    }

    #[test]
    fn test_empty_log_list() {
        assert_eq!(
            format_log_list(&[], false, OutputFormat::Text),
            "No log entries found.\n"
        );
        assert_eq!(format_log_list(&[], false, OutputFormat::Json), "[]");
    }

    #[test]
    fn test_messages_text() {
        let out = format_messages(
            &[Message::user("hi"), Message::new(AgentRole::Analyst, "ok")],
            OutputFormat::Text,
        );
        assert_eq!(out, "User: hi\nAnalyst: ok\n");
    }
}
