//! Message bodies. Pure functions over an `AttendanceSummary`.
//! Percentages use theory counts only.

use rollcall_core::types::{AttendanceSummary, Mark, percentage};
use serde::{Deserialize, Serialize};

/// Classes assumed to happen today for the morning projection.
pub const PROJECTED_CLASSES: u32 = 4;

/// Line used by the evening message when nothing was marked today.
pub const NOTHING_MARKED: &str = "No attendance was marked for you today.";

/// Which formatter a broadcast job renders with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Morning,
    Evening,
}

impl MessageKind {
    pub fn render(&self, summary: &AttendanceSummary) -> String {
        match self {
            Self::Morning => morning(summary),
            Self::Evening => evening(summary),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Evening => "evening",
        }
    }
}

impl std::str::FromStr for MessageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "morning" => Ok(Self::Morning),
            "evening" => Ok(Self::Evening),
            other => Err(format!("unknown message kind '{other}' (expected morning or evening)")),
        }
    }
}

/// Morning projection: current theory percentage plus best and worst case
/// if every one of today's classes is attended or missed.
pub fn morning(summary: &AttendanceSummary) -> String {
    let present = summary.theory_present;
    let total = summary.theory_total;
    if total == 0 {
        return format!(
            "Hello {}! Welcome! Your attendance tracking starts today.",
            summary.name
        );
    }

    let current = percentage(present, total);
    let attend_all = percentage(present + PROJECTED_CLASSES, total + PROJECTED_CLASSES);
    let miss_all = percentage(present, total + PROJECTED_CLASSES);

    let mut message = format!("☀️ Good Morning {}!\n\n", summary.name);
    message += &format!(
        "Your current overall attendance is *{current:.2}%* ({present}/{total}).\n\n"
    );
    message += &format!("*Today's Prediction (assuming {PROJECTED_CLASSES} classes):*\n");
    message += &format!("✅ If you attend all classes: *{attend_all:.2}%*\n");
    message += &format!("❌ If you miss all classes: *{miss_all:.2}%*\n\n");
    message += "Have a great day at college!";
    message
}

/// Evening recap: current theory percentage and today's per-subject marks.
pub fn evening(summary: &AttendanceSummary) -> String {
    let present = summary.theory_present;
    let total = summary.theory_total;
    let current = summary.theory_percentage();

    let mut message = format!("🌙 Good Evening {}!\n\n", summary.name);
    message += &format!(
        "Your updated overall attendance is *{current:.2}%* ({present}/{total}).\n\n"
    );

    if summary.todays_marks.is_empty() {
        message += NOTHING_MARKED;
        message.push('\n');
    } else {
        message += "*Today's Summary:*\n";
        for item in &summary.todays_marks {
            let emoji = match item.mark {
                Mark::Present => "✅",
                Mark::Absent => "❌",
            };
            message += &format!("  {emoji} {}: {}\n", item.subject, item.mark.as_str());
        }
    }
    message
}

/// Sent once on registration: a greeting followed by the evening recap.
pub fn welcome(summary: &AttendanceSummary) -> String {
    format!(
        "👋 Welcome {}! You're now subscribed to daily attendance updates.\n\n{}",
        summary.name,
        evening(summary)
    )
}

/// Same-day absence alert for one subject.
pub fn absence_alert(subject: &str) -> String {
    format!("⚠️ Attendance Alert: you have been marked *absent* in {subject} today.")
}
