use chrono::{DateTime, TimeZone, Utc};
use marketplace_bookings::overlap::{find_conflict, resolve_end, windows_conflict, BookingWindow};

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, hour, minute, 0).unwrap()
}

fn window(start_h: u32, start_m: u32, end_h: u32, end_m: u32) -> BookingWindow {
    BookingWindow {
        start: at(start_h, start_m),
        end: Some(at(end_h, end_m)),
    }
}

#[test]
fn back_to_back_bookings_are_legal() {
    let calendar = [window(10, 0, 11, 0), window(12, 0, 13, 0)];
    let candidate = window(11, 0, 12, 0);
    assert_eq!(find_conflict(candidate, &calendar), None);
}

#[test]
fn overlap_is_detected_against_any_existing_booking() {
    let calendar = [window(9, 0, 10, 0), window(10, 0, 11, 0), window(14, 0, 15, 0)];
    assert_eq!(find_conflict(window(10, 30, 11, 30), &calendar), Some(1));
    assert_eq!(find_conflict(window(13, 30, 14, 30), &calendar), Some(2));
    assert_eq!(find_conflict(window(11, 0, 12, 0), &calendar), None);
}

#[test]
fn symmetric_intersection_cases() {
    let existing = window(10, 0, 12, 0);
    // starts inside
    assert!(windows_conflict(window(11, 0, 13, 0), existing));
    // ends inside
    assert!(windows_conflict(window(9, 0, 11, 0), existing));
    // fully contains
    assert!(windows_conflict(window(9, 0, 13, 0), existing));
    // fully contained
    assert!(windows_conflict(window(10, 30, 11, 30), existing));
}

#[test]
fn duration_resolves_missing_end() {
    let end = resolve_end(at(10, 0), None, Some(45));
    assert_eq!(end, Some(at(10, 45)));

    // zero-width candidate only clashes with an exact start match
    let point = BookingWindow {
        start: at(10, 0),
        end: resolve_end(at(10, 0), None, None),
    };
    let other = BookingWindow {
        start: at(10, 30),
        end: None,
    };
    assert!(!windows_conflict(point, other));
    assert!(windows_conflict(
        point,
        BookingWindow {
            start: at(10, 0),
            end: None
        }
    ));
}
