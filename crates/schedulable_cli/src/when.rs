//! `<when>` argument parsing.

use chrono::Duration;
use schedulable_core::ScheduleAt;

/// Resolves `+<n>d|h|m|s` against `now`, or any absolute form accepted by
/// `ScheduleAt`.
pub fn parse_when(input: &str, now: ScheduleAt) -> Result<ScheduleAt, String> {
    let trimmed = input.trim();
    if let Some(relative) = trimmed.strip_prefix('+') {
        let offset = parse_relative(relative)?;
        return now
            .as_datetime()
            .checked_add_signed(offset)
            .and_then(ScheduleAt::checked_from_datetime)
            .ok_or_else(|| format!("`{input}` lands outside years 0000-9999"));
    }

    trimmed
        .parse::<ScheduleAt>()
        .map_err(|err| format!("cannot read `{input}` as a time: {err}"))
}

fn parse_relative(value: &str) -> Result<Duration, String> {
    let Some((split, _)) = value.char_indices().last() else {
        return Err("relative time needs a number and a unit, e.g. +10d".to_string());
    };
    let (amount, unit) = value.split_at(split);
    let amount: i64 = amount
        .parse()
        .map_err(|_| format!("relative time `+{value}` needs a whole number"))?;

    let duration = match unit {
        "d" => Duration::try_days(amount),
        "h" => Duration::try_hours(amount),
        "m" => Duration::try_minutes(amount),
        "s" => Duration::try_seconds(amount),
        other => return Err(format!("unknown unit `{other}`; expected d, h, m or s")),
    };
    duration.ok_or_else(|| format!("relative time `+{value}` is out of range"))
}
