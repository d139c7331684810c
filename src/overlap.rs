use chrono::{DateTime, Duration, Utc};

/// A booking's slot on a service calendar. `end` is `None` for
/// point-in-time bookings (service without a duration, no end supplied).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingWindow {
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

/// Half-open `[start, end)` intersection. Touching endpoints do not
/// conflict, so back-to-back bookings are legal.
pub fn windows_conflict(candidate: BookingWindow, existing: BookingWindow) -> bool {
    match (candidate.end, existing.end) {
        (Some(c_end), Some(e_end)) => existing.start < c_end && candidate.start < e_end,
        // point vs window: the point must fall inside [start, end)
        (Some(c_end), None) => candidate.start <= existing.start && existing.start < c_end,
        (None, Some(e_end)) => existing.start <= candidate.start && candidate.start < e_end,
        // point vs point: zero-width, exact start match only
        (None, None) => candidate.start == existing.start,
    }
}

pub fn find_conflict(candidate: BookingWindow, existing: &[BookingWindow]) -> Option<usize> {
    existing
        .iter()
        .position(|window| windows_conflict(candidate, *window))
}

/// An explicit end wins; otherwise the service duration resolves it;
/// otherwise the booking is point-in-time.
pub fn resolve_end(
    start: DateTime<Utc>,
    requested_end: Option<DateTime<Utc>>,
    duration_minutes: Option<i32>,
) -> Option<DateTime<Utc>> {
    requested_end.or_else(|| duration_minutes.map(|m| start + Duration::minutes(m as i64)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, hour, minute, 0).unwrap()
    }

    fn window(start: DateTime<Utc>, end: DateTime<Utc>) -> BookingWindow {
        BookingWindow {
            start,
            end: Some(end),
        }
    }

    #[test]
    fn candidate_starting_inside_existing_conflicts() {
        let existing = window(at(10, 0), at(11, 0));
        let candidate = window(at(10, 30), at(11, 30));
        assert!(windows_conflict(candidate, existing));
    }

    #[test]
    fn candidate_ending_inside_existing_conflicts() {
        let existing = window(at(10, 0), at(11, 0));
        let candidate = window(at(9, 30), at(10, 30));
        assert!(windows_conflict(candidate, existing));
    }

    #[test]
    fn candidate_containing_existing_conflicts() {
        let existing = window(at(10, 0), at(11, 0));
        let candidate = window(at(9, 0), at(12, 0));
        assert!(windows_conflict(candidate, existing));
    }

    #[test]
    fn touching_intervals_do_not_conflict() {
        let existing = window(at(10, 0), at(11, 0));
        assert!(!windows_conflict(window(at(11, 0), at(12, 0)), existing));
        assert!(!windows_conflict(window(at(9, 0), at(10, 0)), existing));
    }

    #[test]
    fn point_inside_window_conflicts() {
        let point = BookingWindow {
            start: at(10, 30),
            end: None,
        };
        assert!(windows_conflict(point, window(at(10, 0), at(11, 0))));
        assert!(windows_conflict(window(at(10, 0), at(11, 0)), point));
    }

    #[test]
    fn point_at_window_end_does_not_conflict() {
        let point = BookingWindow {
            start: at(11, 0),
            end: None,
        };
        assert!(!windows_conflict(point, window(at(10, 0), at(11, 0))));
    }

    #[test]
    fn points_conflict_only_on_exact_match() {
        let a = BookingWindow {
            start: at(10, 0),
            end: None,
        };
        let b = BookingWindow {
            start: at(10, 0),
            end: None,
        };
        let c = BookingWindow {
            start: at(10, 1),
            end: None,
        };
        assert!(windows_conflict(a, b));
        assert!(!windows_conflict(a, c));
    }

    #[test]
    fn resolve_end_prefers_explicit_end() {
        let end = resolve_end(at(10, 0), Some(at(10, 45)), Some(60));
        assert_eq!(end, Some(at(10, 45)));
    }

    #[test]
    fn resolve_end_falls_back_to_duration() {
        let end = resolve_end(at(10, 0), None, Some(90));
        assert_eq!(end, Some(at(11, 30)));
    }

    #[test]
    fn resolve_end_none_means_point_in_time() {
        assert_eq!(resolve_end(at(10, 0), None, None), None);
    }
}
