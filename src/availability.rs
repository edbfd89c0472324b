use chrono::{Datelike, NaiveDate, NaiveTime, Timelike, Weekday};

use crate::error::{BookingError, Closure, Result};
use crate::models::{hhmm, DayHours, Settings};

/// Free slots for one date. An empty `slots` with no `closure` means the
/// day is open but fully booked.
#[derive(Debug, Clone, PartialEq)]
pub struct DaySlots {
    pub slots: Vec<String>,
    pub closure: Option<Closure>,
}

impl DaySlots {
    fn closed(closure: Closure) -> Self {
        Self {
            slots: Vec::new(),
            closure: Some(closure),
        }
    }
}

/// Settings key for a weekday.
pub fn weekday_key(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

/// Parse a day name (e.g. "monday") into a chrono Weekday.
pub fn parse_weekday(day: &str) -> Option<Weekday> {
    match day.to_lowercase().as_str() {
        "monday" => Some(Weekday::Mon),
        "tuesday" => Some(Weekday::Tue),
        "wednesday" => Some(Weekday::Wed),
        "thursday" => Some(Weekday::Thu),
        "friday" => Some(Weekday::Fri),
        "saturday" => Some(Weekday::Sat),
        "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Parse a `YYYY-MM-DD` date and return it together with its canonical form.
pub fn parse_date(date: &str) -> Result<(NaiveDate, String)> {
    let parsed = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|_| BookingError::invalid(format!("Data non valida: '{date}'")))?;
    Ok((parsed, parsed.format("%Y-%m-%d").to_string()))
}

/// Parse an `HH:MM` time and return it in canonical form.
pub fn normalize_time(time: &str) -> Result<String> {
    hhmm::parse(time)
        .map(format_slot)
        .ok_or_else(|| BookingError::invalid(format!("Orario non valido: '{time}'")))
}

fn format_slot(t: NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

/// Opening hours for `date`, or the reason the business is closed.
pub fn hours_for<'a>(
    date: &str,
    settings: &'a Settings,
) -> Result<std::result::Result<&'a DayHours, Closure>> {
    if settings.is_holiday(date) {
        return Ok(Err(Closure::Holiday));
    }
    let (parsed, _) = parse_date(date)?;
    match settings.weekly.get(weekday_key(parsed.weekday())) {
        Some(day) if day.open => Ok(Ok(day)),
        _ => Ok(Err(Closure::Weekly)),
    }
}

/// All slot start times of a day, stepping `slot_minutes` from `start` while
/// strictly before `end`.
pub fn day_slots(hours: &DayHours, slot_minutes: u32) -> Vec<String> {
    let step = slot_minutes.max(1);
    let start = hours.start.num_seconds_from_midnight() / 60;
    let end = hours.end.num_seconds_from_midnight() / 60;
    (start..end)
        .step_by(step as usize)
        .filter_map(|m| NaiveTime::from_hms_opt(m / 60, m % 60, 0))
        .map(format_slot)
        .collect()
}

/// Free slots for `date` given the settings and the times already booked on it.
///
/// Booked times are matched by exact `HH:MM` equality against the generated
/// slots; a booking that does not sit on a slot boundary does not hide the
/// slot it overlaps.
pub fn compute_free_slots(
    date: &str,
    settings: &Settings,
    booked: &[String],
    slot_minutes: u32,
) -> Result<DaySlots> {
    let hours = match hours_for(date, settings)? {
        Ok(h) => h,
        Err(closure) => return Ok(DaySlots::closed(closure)),
    };

    let slots = day_slots(hours, slot_minutes)
        .into_iter()
        .filter(|slot| !booked.iter().any(|b| b == slot))
        .collect();

    Ok(DaySlots {
        slots,
        closure: None,
    })
}
