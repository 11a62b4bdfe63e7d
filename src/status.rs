//! Status report for the console.

use crate::face;
use crate::model::SyncStatus;
use crate::position::Position;
use time::OffsetDateTime;

/// Everything the status report shows.
pub(crate) struct StatusView<'a> {
    pub displayed: Position,
    pub now: OffsetDateTime,
    pub timezone_url: &'a str,
    pub timezone_unsaved: bool,
    pub sync: SyncStatus,
}

/// Build status lines: both dials, then the numbers.
pub(crate) fn build_status(view: &StatusView<'_>) -> Vec<String> {
    let target = Position::from_time(view.now);
    let mut lines = vec![String::new()];
    lines.extend(face::side_by_side(
        &face::render(view.displayed, "Display"),
        &face::render(target, "Actual"),
        4,
    ));
    lines.push(String::new());

    lines.push(format!("  Display Time: {}", view.displayed));
    lines.push(format!(
        "  Actual Time:  {:02}:{:02}:{:02} (UTC{})",
        view.now.hour(),
        view.now.minute(),
        view.now.second(),
        format_offset(view.now)
    ));
    let unsaved = if view.timezone_unsaved { " (unsaved)" } else { "" };
    lines.push(format!("  Timezone:     {}{unsaved}", view.timezone_url));
    lines.push(format!("  Last sync:    {}", view.sync.describe()));

    let diff = view.displayed.signed_offset_to(target);
    if diff != 0 {
        // Positive diff means real time is ahead of the hands.
        let direction = if diff > 0 { "behind" } else { "ahead" };
        lines.push(format!(
            "  Difference:   {} minute(s) {direction}",
            diff.unsigned_abs()
        ));
    }
    lines.push(String::new());
    lines
}

fn format_offset(t: OffsetDateTime) -> String {
    let (h, m, _) = t.offset().as_hms();
    let sign = if h < 0 || m < 0 { '-' } else { '+' };
    format!("{sign}{:02}:{:02}", h.unsigned_abs(), m.unsigned_abs())
}
