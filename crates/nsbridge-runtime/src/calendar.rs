//! Calendar fields and the calendar they are resolved in
//!
//! [`CalendarFields`] is the managed form of a date-components object: six
//! independently optional units. [`Calendar`] is the Gregorian calendar in a
//! given time zone; it is always passed explicitly so conversions do not
//! depend on hidden process state. [`Calendar::System`] opts back into the
//! host zone, which may change while the process runs.

use crate::{BridgeError, BridgeResult};
use chrono::{
    DateTime, Datelike, Local, LocalResult, NaiveDate, NaiveDateTime, Offset, TimeDelta,
    TimeZone, Timelike, Utc,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Config value selecting the host zone
pub const SYSTEM_CALENDAR: &str = "system";

/// The six calendar units the bridge reads and writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarUnit {
    Day,
    Month,
    Year,
    Hour,
    Minute,
    Second,
}

impl CalendarUnit {
    pub const ALL: [CalendarUnit; 6] = [
        CalendarUnit::Day,
        CalendarUnit::Month,
        CalendarUnit::Year,
        CalendarUnit::Hour,
        CalendarUnit::Minute,
        CalendarUnit::Second,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CalendarUnit::Day => "day",
            CalendarUnit::Month => "month",
            CalendarUnit::Year => "year",
            CalendarUnit::Hour => "hour",
            CalendarUnit::Minute => "minute",
            CalendarUnit::Second => "second",
        }
    }
}

impl fmt::Display for CalendarUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Calendar fields with an explicit "unspecified" state per unit
///
/// `second: None` and `second: Some(0)` are different records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CalendarFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hour: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minute: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second: Option<i32>,
}

impl CalendarFields {
    /// All units unspecified
    pub fn new() -> Self {
        Self::default()
    }

    /// All six units specified
    pub fn ymd_hms(year: i32, month: i32, day: i32, hour: i32, minute: i32, second: i32) -> Self {
        Self {
            day: Some(day),
            month: Some(month),
            year: Some(year),
            hour: Some(hour),
            minute: Some(minute),
            second: Some(second),
        }
    }

    pub fn get(&self, unit: CalendarUnit) -> Option<i32> {
        match unit {
            CalendarUnit::Day => self.day,
            CalendarUnit::Month => self.month,
            CalendarUnit::Year => self.year,
            CalendarUnit::Hour => self.hour,
            CalendarUnit::Minute => self.minute,
            CalendarUnit::Second => self.second,
        }
    }

    pub fn set(&mut self, unit: CalendarUnit, value: Option<i32>) {
        let slot = match unit {
            CalendarUnit::Day => &mut self.day,
            CalendarUnit::Month => &mut self.month,
            CalendarUnit::Year => &mut self.year,
            CalendarUnit::Hour => &mut self.hour,
            CalendarUnit::Minute => &mut self.minute,
            CalendarUnit::Second => &mut self.second,
        };
        *slot = value;
    }

    pub fn with(mut self, unit: CalendarUnit, value: i32) -> Self {
        self.set(unit, Some(value));
        self
    }

    pub fn is_complete(&self) -> bool {
        CalendarUnit::ALL.iter().all(|u| self.get(*u).is_some())
    }

    /// Units that have a value, in [`CalendarUnit::ALL`] order
    pub fn specified(&self) -> impl Iterator<Item = (CalendarUnit, i32)> + '_ {
        CalendarUnit::ALL
            .into_iter()
            .filter_map(move |u| self.get(u).map(|v| (u, v)))
    }
}

/// Gregorian calendar bound to a time zone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Calendar {
    /// The host's current zone, read at each conversion
    System,
    Zone(Tz),
}

impl Calendar {
    pub fn utc() -> Self {
        Calendar::Zone(Tz::UTC)
    }

    /// Parse an IANA zone name or "system"
    pub fn from_name(name: &str) -> BridgeResult<Self> {
        if name.eq_ignore_ascii_case(SYSTEM_CALENDAR) {
            return Ok(Calendar::System);
        }
        name.parse::<Tz>()
            .map(Calendar::Zone)
            .map_err(|_| BridgeError::InvalidTimezone(name.to_string()))
    }

    pub fn is_system(&self) -> bool {
        matches!(self, Calendar::System)
    }

    /// Resolve fields to an instant
    ///
    /// Unspecified units take their calendar defaults (year 1, month 1,
    /// day 1, midnight). Out-of-range units carry into the next larger unit,
    /// so month 13 is January of the following year. A wall-clock time
    /// skipped by a forward transition moves forward by the gap; a repeated
    /// one resolves to the earlier instant.
    pub fn resolve(&self, fields: &CalendarFields) -> BridgeResult<DateTime<Utc>> {
        let naive = naive_from_fields(fields)?;
        let resolved = match self {
            Calendar::System => localize(&Local, naive),
            Calendar::Zone(tz) => localize(tz, naive),
        };
        resolved.ok_or_else(|| {
            BridgeError::UnresolvableDate(format!("{} has no instant in {}", naive, self))
        })
    }

    /// All six units of `instant` as seen in this calendar
    pub fn decompose(&self, instant: DateTime<Utc>) -> CalendarFields {
        match self {
            Calendar::System => fields_of(&instant.with_timezone(&Local)),
            Calendar::Zone(tz) => fields_of(&instant.with_timezone(tz)),
        }
    }
}

impl fmt::Display for Calendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Calendar::System => f.write_str(SYSTEM_CALENDAR),
            Calendar::Zone(tz) => f.write_str(tz.name()),
        }
    }
}

fn naive_from_fields(fields: &CalendarFields) -> BridgeResult<NaiveDateTime> {
    let unresolvable = || {
        BridgeError::UnresolvableDate(format!(
            "fields {:?} are outside the calendar's range",
            fields
        ))
    };

    let month0 = i64::from(fields.month.unwrap_or(1)) - 1;
    let year = i64::from(fields.year.unwrap_or(1)) + month0.div_euclid(12);
    let month = month0.rem_euclid(12) as u32 + 1;

    let year = i32::try_from(year).map_err(|_| unresolvable())?;
    let midnight = NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(unresolvable)?;

    // i32 inputs keep this far inside i64
    let offset_secs = (i64::from(fields.day.unwrap_or(1)) - 1) * 86_400
        + i64::from(fields.hour.unwrap_or(0)) * 3_600
        + i64::from(fields.minute.unwrap_or(0)) * 60
        + i64::from(fields.second.unwrap_or(0));

    TimeDelta::try_seconds(offset_secs)
        .and_then(|delta| midnight.checked_add_signed(delta))
        .ok_or_else(unresolvable)
}

fn localize<Z: TimeZone>(zone: &Z, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    match zone.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => {
            // In a gap: apply the offset in force before the transition.
            let before = naive.checked_sub_signed(TimeDelta::try_days(1)?)?;
            let offset = zone.offset_from_local_datetime(&before).earliest()?.fix();
            let shift = TimeDelta::try_seconds(i64::from(offset.local_minus_utc()))?;
            let utc = naive.checked_sub_signed(shift)?;
            Some(Utc.from_utc_datetime(&utc))
        }
    }
}

fn fields_of<Z: TimeZone>(local: &DateTime<Z>) -> CalendarFields {
    CalendarFields::ymd_hms(
        local.year(),
        local.month() as i32,
        local.day() as i32,
        local.hour() as i32,
        local.minute() as i32,
        local.second() as i32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_unspecified_is_not_zero() {
        let fields = CalendarFields::new().with(CalendarUnit::Second, 0);
        assert_eq!(fields.second, Some(0));
        assert_eq!(fields.minute, None);
        assert_ne!(fields, CalendarFields::new());
        assert!(!fields.is_complete());
    }

    #[test]
    fn test_resolve_complete_fields() {
        let fields = CalendarFields::ymd_hms(2024, 2, 29, 13, 45, 30);
        assert_eq!(
            Calendar::utc().resolve(&fields).unwrap(),
            utc(2024, 2, 29, 13, 45, 30)
        );
    }

    #[test]
    fn test_resolve_uses_calendar_zone() {
        let tokyo = Calendar::from_name("Asia/Tokyo").unwrap();
        let fields = CalendarFields::ymd_hms(2024, 6, 1, 9, 0, 0);
        assert_eq!(tokyo.resolve(&fields).unwrap(), utc(2024, 6, 1, 0, 0, 0));
    }

    #[test]
    fn test_unspecified_fields_take_defaults() {
        let fields = CalendarFields {
            year: Some(2030),
            ..Default::default()
        };
        assert_eq!(
            Calendar::utc().resolve(&fields).unwrap(),
            utc(2030, 1, 1, 0, 0, 0)
        );
    }

    #[test]
    fn test_overflowing_units_carry() {
        let fields = CalendarFields::ymd_hms(2023, 13, 32, 0, 0, 60);
        // month 13 -> Jan 2024, day 32 -> Feb 1, second 60 -> 00:01:00
        assert_eq!(
            Calendar::utc().resolve(&fields).unwrap(),
            utc(2024, 2, 1, 0, 1, 0)
        );

        let fields = CalendarFields::ymd_hms(2024, 0, 1, 0, 0, 0);
        assert_eq!(
            Calendar::utc().resolve(&fields).unwrap(),
            utc(2023, 12, 1, 0, 0, 0)
        );
    }

    #[test]
    fn test_gap_moves_forward() {
        // Europe/Amsterdam skipped 02:00-03:00 on 2024-03-31
        let ams = Calendar::from_name("Europe/Amsterdam").unwrap();
        let fields = CalendarFields::ymd_hms(2024, 3, 31, 2, 30, 0);
        let instant = ams.resolve(&fields).unwrap();
        assert_eq!(instant, utc(2024, 3, 31, 1, 30, 0));
        assert_eq!(ams.decompose(instant).hour, Some(3));
    }

    #[test]
    fn test_repeated_time_takes_earlier_instant() {
        // 02:30 happened twice on 2024-10-27 in Europe/Amsterdam
        let ams = Calendar::from_name("Europe/Amsterdam").unwrap();
        let fields = CalendarFields::ymd_hms(2024, 10, 27, 2, 30, 0);
        assert_eq!(ams.resolve(&fields).unwrap(), utc(2024, 10, 27, 0, 30, 0));
    }

    #[test]
    fn test_decompose_fills_all_units() {
        let fields = Calendar::utc().decompose(utc(1999, 12, 31, 23, 59, 59));
        assert!(fields.is_complete());
        assert_eq!(fields, CalendarFields::ymd_hms(1999, 12, 31, 23, 59, 59));
    }

    #[test]
    fn test_year_out_of_range_is_unresolvable() {
        let fields = CalendarFields::ymd_hms(i32::MAX, 12, 1, 0, 0, 0);
        assert!(matches!(
            Calendar::utc().resolve(&fields),
            Err(BridgeError::UnresolvableDate(_))
        ));
    }

    #[test]
    fn test_calendar_names() {
        assert_eq!(Calendar::from_name("SYSTEM").unwrap(), Calendar::System);
        assert_eq!(Calendar::from_name("UTC").unwrap(), Calendar::utc());
        assert_eq!(Calendar::from_name("Asia/Tokyo").unwrap().to_string(), "Asia/Tokyo");
        assert!(matches!(
            Calendar::from_name("Mars/Olympus"),
            Err(BridgeError::InvalidTimezone(_))
        ));
    }

    #[test]
    fn test_fields_serialize_without_unspecified_units() {
        let fields = CalendarFields::new().with(CalendarUnit::Hour, 9);
        let json = serde_json::to_string(&fields).unwrap();
        assert_eq!(json, r#"{"hour":9}"#);
        let back: CalendarFields = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fields);
    }
}
