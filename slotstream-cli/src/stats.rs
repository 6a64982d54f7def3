//! Statistics display and formatting

use slotstream_engine::{NodeStats, SlotSnapshot};
use std::io::Write;
use std::time::{Duration, Instant};

/// Format a sample rate in human-readable form
pub fn format_rate(samples_per_sec: f64) -> String {
    if samples_per_sec >= 1_000_000.0 {
        format!("{:.2} MS/s", samples_per_sec / 1_000_000.0)
    } else if samples_per_sec >= 1_000.0 {
        format!("{:.2} kS/s", samples_per_sec / 1_000.0)
    } else {
        format!("{:.1} S/s", samples_per_sec)
    }
}

/// Format a nominal rate, irregular streams included
pub fn format_nominal_rate(hz: f64) -> String {
    if hz > 0.0 {
        format!("{} Hz", hz)
    } else {
        "irregular".to_string()
    }
}

/// Format duration in human-readable form
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    if hours > 0 {
        format!("{}h {:02}m {:02}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {:02}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// Format time since the last activity on a slot
pub fn format_last_activity(last: Option<Instant>) -> String {
    match last {
        Some(at) => {
            let ago = at.elapsed();
            if ago < Duration::from_secs(1) {
                format!("{}ms ago", ago.as_millis())
            } else {
                format!("{} ago", format_duration(ago))
            }
        }
        None => "N/A".to_string(),
    }
}

/// Render node statistics as a table
pub fn render_node_stats(title: &str, stats: &NodeStats) -> String {
    let mut out = String::new();
    out.push_str("┌─────────────────────────────────────────────────────────────┐\n");
    out.push_str(&format!("│ {:<59} │\n", title));
    out.push_str("├─────────────────────────────────────────────────────────────┤\n");
    out.push_str(&format!("│ Status: {:<51} │\n", stats.status));
    out.push_str(&format!(
        "│ Slots: {:<52} │\n",
        format!("{} active / {} total", stats.active_slot_count(), stats.slot_count())
    ));
    out.push_str(&format!(
        "│ Cycles: {:<51} │\n",
        format!("{} ({} reconnects)", stats.cycles, stats.reconnects)
    ));
    out.push_str(&format!("│ Uptime: {:<51} │\n", format_duration(stats.uptime)));
    out.push_str("└─────────────────────────────────────────────────────────────┘\n");

    if !stats.slots.is_empty() {
        out.push_str("┌──────┬──────────────┬────┬───────────┬──────────┬──────────┬────────┐\n");
        out.push_str("│ Slot │ Stream       │ Ch │ Rate      │ Received │ Pushed   │ Errors │\n");
        out.push_str("├──────┼──────────────┼────┼───────────┼──────────┼──────────┼────────┤\n");
        for slot in &stats.slots {
            out.push_str(&render_slot_row(slot));
        }
        out.push_str("└──────┴──────────────┴────┴───────────┴──────────┴──────────┴────────┘\n");
    }

    out
}

fn render_slot_row(slot: &SlotSnapshot) -> String {
    let name = if slot.stream_name.is_empty() {
        "-"
    } else {
        slot.stream_name.as_str()
    };
    let rate = if slot.active {
        format_nominal_rate(slot.nominal_rate)
    } else {
        "inactive".to_string()
    };

    format!(
        "│ {:4} │ {:12} │ {:2} │ {:9} │ {:8} │ {:8} │ {:6} │\n",
        slot.index + 1,
        name,
        slot.channel_count,
        rate,
        slot.stats.samples_received,
        slot.stats.samples_pushed,
        slot.stats.transport_errors
    )
}

/// Display node statistics
pub fn display_node_stats(title: &str, stats: &NodeStats) {
    println!();
    print!("{}", render_node_stats(title, stats));
}

/// Display compact stats on one line (for continuous updates)
pub fn display_compact_stats(sender: &NodeStats, receiver: &NodeStats, elapsed: Duration) {
    let received = receiver.total_samples_received();
    let rate = if elapsed.as_secs_f64() > 0.0 {
        received as f64 / elapsed.as_secs_f64()
    } else {
        0.0
    };

    print!(
        "\r[{:8}] Out: {}/{} | In: {}/{} | Pushed: {} | Received: {} | Rate: {} | {}         ",
        format_duration(elapsed),
        sender.active_slot_count(),
        sender.slot_count(),
        receiver.active_slot_count(),
        receiver.slot_count(),
        sender.total_samples_pushed(),
        received,
        format_rate(rate),
        receiver.status
    );

    let _ = std::io::stdout().flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotstream_engine::SlotStats;

    #[test]
    fn test_format_rate() {
        assert_eq!(format_rate(250.0), "250.0 S/s");
        assert_eq!(format_rate(2_000.0), "2.00 kS/s");
        assert_eq!(format_rate(3_500_000.0), "3.50 MS/s");
    }

    #[test]
    fn test_format_nominal_rate() {
        assert_eq!(format_nominal_rate(250.0), "250 Hz");
        assert_eq!(format_nominal_rate(0.0), "irregular");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(30)), "30s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
        assert_eq!(format_duration(Duration::from_secs(3661)), "1h 01m 01s");
    }

    #[test]
    fn test_format_last_activity() {
        assert_eq!(format_last_activity(None), "N/A");
        assert!(format_last_activity(Some(Instant::now())).ends_with("ms ago"));
    }

    #[test]
    fn test_render_lists_every_slot() {
        let stats = NodeStats {
            cycles: 12,
            reconnects: 1,
            status: "OK".to_string(),
            slots: vec![
                SlotSnapshot {
                    index: 0,
                    label: "Stream name 1".to_string(),
                    stream_name: "EEG_0".to_string(),
                    active: true,
                    channel_count: 8,
                    nominal_rate: 250.0,
                    stats: SlotStats {
                        samples_received: 100,
                        ..SlotStats::default()
                    },
                },
                SlotSnapshot {
                    index: 1,
                    label: "Stream name 2".to_string(),
                    stream_name: String::new(),
                    active: false,
                    channel_count: 0,
                    nominal_rate: 0.0,
                    stats: SlotStats::default(),
                },
            ],
            uptime: Duration::from_secs(5),
        };

        let table = render_node_stats("RECEIVE NODE", &stats);
        assert!(table.contains("RECEIVE NODE"));
        assert!(table.contains("1 active / 2 total"));
        assert!(table.contains("EEG_0"));
        assert!(table.contains("inactive"));
        assert!(table.contains("12 (1 reconnects)"));
    }
}
