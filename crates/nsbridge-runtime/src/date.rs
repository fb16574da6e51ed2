//! Date components and dates
//!
//! A date-components object holds six independently optional calendar
//! fields. Natively an unset field reads back as a sentinel integer; here it
//! reads as `None`, and the sentinel itself can never be stored.
//!
//! Dates only cross the boundary through calendar fields, always under an
//! explicit [`Calendar`].

use crate::calendar::{Calendar, CalendarFields, CalendarUnit};
use crate::handle::{Handle, ScopedHandle};
use crate::runtime::ForeignRuntime;
use crate::{BridgeError, BridgeResult};

/// Create a date-components object with every field unspecified
pub fn new_calendar_fields(rt: &dyn ForeignRuntime) -> BridgeResult<Handle> {
    rt.new_date_components()
}

pub fn set_field(
    rt: &dyn ForeignRuntime,
    components: Handle,
    unit: CalendarUnit,
    value: i32,
) -> BridgeResult<()> {
    if value == rt.undefined_component() {
        return Err(BridgeError::ReservedComponentValue { unit, value });
    }
    rt.set_component(components, unit, value)
}

/// Read one field; `None` when it was never set
pub fn field(
    rt: &dyn ForeignRuntime,
    components: Handle,
    unit: CalendarUnit,
) -> BridgeResult<Option<i32>> {
    let raw = rt.component(components, unit)?;
    Ok((raw != rt.undefined_component()).then_some(raw))
}

macro_rules! field_accessors {
    ($($unit:ident => $get:ident, $set:ident;)*) => {
        $(
            pub fn $set(
                rt: &dyn ForeignRuntime,
                components: Handle,
                value: i32,
            ) -> BridgeResult<()> {
                set_field(rt, components, CalendarUnit::$unit, value)
            }

            pub fn $get(rt: &dyn ForeignRuntime, components: Handle) -> BridgeResult<Option<i32>> {
                field(rt, components, CalendarUnit::$unit)
            }
        )*
    };
}

field_accessors! {
    Day => day, set_day;
    Month => month, set_month;
    Year => year, set_year;
    Hour => hour, set_hour;
    Minute => minute, set_minute;
    Second => second, set_second;
}

/// Snapshot all six fields of a date-components object
pub fn read_fields(rt: &dyn ForeignRuntime, components: Handle) -> BridgeResult<CalendarFields> {
    let mut fields = CalendarFields::new();
    for unit in CalendarUnit::ALL {
        fields.set(unit, field(rt, components, unit)?);
    }
    Ok(fields)
}

/// Create a date-components object holding the specified `fields`
pub fn write_fields(rt: &dyn ForeignRuntime, fields: &CalendarFields) -> BridgeResult<Handle> {
    let components = ScopedHandle::new(rt, new_calendar_fields(rt)?);
    for (unit, value) in fields.specified() {
        set_field(rt, components.get(), unit, value)?;
    }
    Ok(components.into_inner())
}

/// Break a date into day, month, year, hour, minute and second
pub fn to_calendar_fields(
    rt: &dyn ForeignRuntime,
    date: Handle,
    calendar: &Calendar,
) -> BridgeResult<Handle> {
    rt.components_from_date(date, calendar)
}

/// Resolve calendar fields to a date
///
/// Unspecified fields take the calendar's defaults and out-of-range values
/// carry into the next larger unit.
pub fn to_date(
    rt: &dyn ForeignRuntime,
    components: Handle,
    calendar: &Calendar,
) -> BridgeResult<Handle> {
    rt.date_from_components(components, calendar)?.ok_or_else(|| {
        BridgeError::UnresolvableDate(format!(
            "{} calendar produced no date for {}",
            calendar, components
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryRuntime;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_fields_are_unspecified() {
        let rt = MemoryRuntime::new();
        let comps = new_calendar_fields(&rt).unwrap();
        assert_eq!(read_fields(&rt, comps).unwrap(), CalendarFields::new());
    }

    #[test]
    fn test_zero_is_a_value() {
        let rt = MemoryRuntime::new();
        let comps = new_calendar_fields(&rt).unwrap();
        set_hour(&rt, comps, 0).unwrap();
        assert_eq!(hour(&rt, comps).unwrap(), Some(0));
        assert_eq!(minute(&rt, comps).unwrap(), None);
    }

    #[test]
    fn test_sentinel_cannot_be_stored() {
        let rt = MemoryRuntime::new();
        let comps = new_calendar_fields(&rt).unwrap();
        let reserved = rt.undefined_component();
        assert!(matches!(
            set_day(&rt, comps, reserved),
            Err(BridgeError::ReservedComponentValue { unit: CalendarUnit::Day, .. })
        ));
        assert_eq!(day(&rt, comps).unwrap(), None);
    }

    #[test]
    fn test_write_then_read_fields() {
        let rt = MemoryRuntime::new();
        let fields = CalendarFields::new()
            .with(CalendarUnit::Year, 2024)
            .with(CalendarUnit::Second, 59);
        let comps = write_fields(&rt, &fields).unwrap();
        assert_eq!(read_fields(&rt, comps).unwrap(), fields);
        assert_eq!(rt.live_objects(), 1);
    }

    #[test]
    fn test_to_date_and_back() {
        let rt = MemoryRuntime::new();
        let utc = Calendar::utc();
        let comps = write_fields(&rt, &CalendarFields::ymd_hms(2024, 2, 29, 23, 59, 59)).unwrap();
        let date = to_date(&rt, comps, &utc).unwrap();
        assert_eq!(
            rt.date_value(date).unwrap(),
            Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap()
        );

        let back = to_calendar_fields(&rt, date, &utc).unwrap();
        assert_eq!(
            read_fields(&rt, back).unwrap(),
            CalendarFields::ymd_hms(2024, 2, 29, 23, 59, 59)
        );
    }

    #[test]
    fn test_month_overflow_carries() {
        let rt = MemoryRuntime::new();
        let comps =
            write_fields(&rt, &CalendarFields::ymd_hms(2023, 13, 1, 0, 0, 0)).unwrap();
        let date = to_date(&rt, comps, &Calendar::utc()).unwrap();
        assert_eq!(
            rt.date_value(date).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_unresolvable_fields_are_an_error() {
        let rt = MemoryRuntime::new();
        let comps = write_fields(&rt, &CalendarFields::new().with(CalendarUnit::Year, i32::MAX))
            .unwrap();
        assert!(matches!(
            to_date(&rt, comps, &Calendar::utc()),
            Err(BridgeError::UnresolvableDate(_))
        ));
    }
}
