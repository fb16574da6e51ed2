//! Date components and date round trips through the bridge

mod common;

use chrono::{DateTime, TimeZone, Utc};
use common::assert_eq;
use nsbridge_runtime::date::*;
use nsbridge_runtime::{BridgeError, Calendar, CalendarFields, CalendarUnit, MemoryRuntime};
use proptest::prelude::*;
use rstest::rstest;

fn tokyo() -> Calendar {
    Calendar::from_name("Asia/Tokyo").unwrap()
}

#[test]
fn test_each_field_is_independent() {
    let rt = MemoryRuntime::new();
    let comps = new_calendar_fields(&rt).unwrap();
    set_day(&rt, comps, 17).unwrap();
    set_month(&rt, comps, 3).unwrap();
    set_second(&rt, comps, 0).unwrap();

    assert_eq!(day(&rt, comps).unwrap(), Some(17));
    assert_eq!(month(&rt, comps).unwrap(), Some(3));
    assert_eq!(year(&rt, comps).unwrap(), None);
    assert_eq!(hour(&rt, comps).unwrap(), None);
    assert_eq!(minute(&rt, comps).unwrap(), None);
    assert_eq!(second(&rt, comps).unwrap(), Some(0));
}

#[rstest]
#[case(CalendarUnit::Day, -5)]
#[case(CalendarUnit::Month, 0)]
#[case(CalendarUnit::Year, i32::MAX)]
#[case(CalendarUnit::Hour, 25)]
#[case(CalendarUnit::Minute, 1)]
#[case(CalendarUnit::Second, -1)]
fn test_any_non_sentinel_value_is_stored(#[case] unit: CalendarUnit, #[case] value: i32) {
    let rt = MemoryRuntime::new();
    let comps = new_calendar_fields(&rt).unwrap();
    set_field(&rt, comps, unit, value).unwrap();
    assert_eq!(field(&rt, comps, unit).unwrap(), Some(value));
}

#[test]
fn test_setting_the_sentinel_keeps_the_field_unset() {
    let rt = MemoryRuntime::new();
    let comps = new_calendar_fields(&rt).unwrap();
    for unit in CalendarUnit::ALL {
        let result = set_field(&rt, comps, unit, i32::MIN);
        assert!(matches!(result, Err(BridgeError::ReservedComponentValue { .. })));
    }
    assert_eq!(read_fields(&rt, comps).unwrap(), CalendarFields::new());
}

#[test]
fn test_partial_fields_resolve_with_defaults() {
    let rt = MemoryRuntime::new();
    let comps = write_fields(&rt, &CalendarFields::new().with(CalendarUnit::Year, 2026)).unwrap();
    let date = to_date(&rt, comps, &Calendar::utc()).unwrap();
    assert_eq!(
        rt.date_value(date).unwrap(),
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    );
}

#[test]
fn test_second_sixty_rolls_into_next_minute() {
    let rt = MemoryRuntime::new();
    let comps = write_fields(&rt, &CalendarFields::ymd_hms(2024, 12, 31, 23, 59, 60)).unwrap();
    let date = to_date(&rt, comps, &Calendar::utc()).unwrap();
    assert_eq!(
        rt.date_value(date).unwrap(),
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    );
}

#[test]
fn test_same_fields_differ_by_calendar() {
    let rt = MemoryRuntime::new();
    let comps = write_fields(&rt, &CalendarFields::ymd_hms(2024, 6, 1, 9, 0, 0)).unwrap();
    let in_utc = to_date(&rt, comps, &Calendar::utc()).unwrap();
    let in_tokyo = to_date(&rt, comps, &tokyo()).unwrap();
    assert_eq!(
        rt.date_value(in_utc).unwrap() - rt.date_value(in_tokyo).unwrap(),
        chrono::Duration::hours(9)
    );
}

#[test]
fn test_decomposed_fields_are_complete() {
    let rt = MemoryRuntime::new();
    let date = rt.new_date(Utc.with_ymd_and_hms(2001, 9, 9, 1, 46, 40).unwrap());
    let comps = to_calendar_fields(&rt, date, &tokyo()).unwrap();
    let fields = read_fields(&rt, comps).unwrap();
    assert!(fields.is_complete());
    assert_eq!(fields, CalendarFields::ymd_hms(2001, 9, 9, 10, 46, 40));
}

fn instant_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    // 1970-01-01 .. 2100-01-01, whole seconds
    (0i64..4_102_444_800).prop_map(|secs| Utc.timestamp_opt(secs, 0).unwrap())
}

fn fields_strategy() -> impl Strategy<Value = CalendarFields> {
    (1970i32..2100, 1i32..=12, 1i32..=28, 0i32..24, 0i32..60, 0i32..60)
        .prop_map(|(y, mo, d, h, mi, s)| CalendarFields::ymd_hms(y, mo, d, h, mi, s))
}

proptest! {
    #[test]
    fn prop_date_round_trips_through_fields(instant in instant_strategy(), zoned in any::<bool>()) {
        let rt = MemoryRuntime::new();
        let calendar = if zoned { tokyo() } else { Calendar::utc() };
        let date = rt.new_date(instant);

        let comps = to_calendar_fields(&rt, date, &calendar).unwrap();
        let back = to_date(&rt, comps, &calendar).unwrap();
        prop_assert_eq!(rt.date_value(back).unwrap(), instant);
    }

    #[test]
    fn prop_fields_round_trip_through_date(fields in fields_strategy()) {
        // Tokyo has had no DST since 1951, so every wall time exists once
        let rt = MemoryRuntime::new();
        let calendar = tokyo();
        let comps = write_fields(&rt, &fields).unwrap();
        let date = to_date(&rt, comps, &calendar).unwrap();

        let back = to_calendar_fields(&rt, date, &calendar).unwrap();
        prop_assert_eq!(read_fields(&rt, back).unwrap(), fields);
    }
}
