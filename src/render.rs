//! Text rendering of the tracker and check-in form.

use crate::config::DisplayConfig;
use crate::form::CheckInForm;
use crate::tracker::{Reservation, Tracker};
use chrono::{DateTime, Local, Utc};

/// Format a timestamp the way the status blocks show it
pub fn format_time(ts: DateTime<Utc>, display: &DisplayConfig) -> String {
    if display.utc {
        ts.format(&display.time_format).to_string()
    } else {
        ts.with_timezone(&Local)
            .format(&display.time_format)
            .to_string()
    }
}

/// Quote a code so it can be pasted back into a command
pub fn quote_code(code: &str) -> String {
    shell_words::quote(code).into_owned()
}

fn status_lines(reservation: &Reservation, display: &DisplayConfig, now: DateTime<Utc>) -> String {
    let until = format_time(reservation.expires_at, display);
    let remaining = if reservation.is_expired(now) {
        "expired".to_string()
    } else {
        format!("{} min left", reservation.minutes_left(now))
    };
    format!(
        "  {} is using this code\n  Until {} ({})\n",
        reservation.occupant, until, remaining
    )
}

/// Render the summary, one block per code, and the check-in form
pub fn render(
    tracker: &Tracker,
    form: &CheckInForm,
    display: &DisplayConfig,
    now: DateTime<Utc>,
) -> String {
    let mut out = String::new();
    out.push_str("Gym Code Tracker\n");
    out.push_str(&format!(
        "{} of {} codes available\n",
        tracker.available_count(),
        tracker.total()
    ));

    for code in tracker.codes() {
        out.push_str(&format!("\n[{}]\n", code));
        match tracker.reservation(code) {
            Some(reservation) => {
                out.push_str(&status_lines(reservation, display, now));
                out.push_str(&format!("  Check out: /checkout {}\n", quote_code(code)));
            }
            None => out.push_str("  Available\n"),
        }
    }

    if tracker.available_count() > 0 {
        out.push_str(&render_form(tracker, form));
    }

    out
}

fn render_form(tracker: &Tracker, form: &CheckInForm) -> String {
    fn field(value: &str) -> &str {
        if value.is_empty() {
            "<empty>"
        } else {
            value
        }
    }

    let mut out = String::from("\nCheck In\n");
    out.push_str(&format!("  Name:     {}\n", field(&form.name)));
    out.push_str(&format!("  Duration: {} (minutes)\n", field(&form.duration)));
    out.push_str(&format!(
        "  Code:     {}  [options: {}]\n",
        form.effective_code(tracker).unwrap_or("-"),
        tracker.available_codes().join(", ")
    ));
    if form.can_submit() {
        out.push_str("  [Check In] ready: /checkin\n");
    } else if !form.duration.is_empty() && form.minutes().is_none() {
        out.push_str("  [Check In] disabled: duration must be a positive whole number\n");
    } else {
        out.push_str("  [Check In] disabled: enter a name and a duration\n");
    }
    out
}
