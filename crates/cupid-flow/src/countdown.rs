use chrono::{DateTime, Utc};
use cupid_types::session::TimeLeft;

/// Remaining time until `deadline`, split into display units.
/// `None` once the deadline has been reached.
pub fn time_left(deadline: DateTime<Utc>, now: DateTime<Utc>) -> Option<TimeLeft> {
    let remaining = (deadline - now).num_seconds();
    if remaining <= 0 {
        return None;
    }

    Some(TimeLeft {
        days: remaining / 86_400,
        hours: (remaining % 86_400) / 3_600,
        minutes: (remaining % 3_600) / 60,
        seconds: remaining % 60,
    })
}
