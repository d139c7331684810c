use marketplace_bookings::domain::booking::BookingStatus;
use marketplace_bookings::domain::escrow::{EscrowStatus, SettlementAction};

#[test]
fn booking_transition_table() {
    assert_eq!(
        BookingStatus::allowed_from(BookingStatus::Confirmed),
        &[BookingStatus::Pending]
    );
    assert_eq!(
        BookingStatus::allowed_from(BookingStatus::InProgress),
        &[BookingStatus::Confirmed]
    );
    assert_eq!(
        BookingStatus::allowed_from(BookingStatus::Cancelled),
        &[BookingStatus::Pending, BookingStatus::Confirmed]
    );
    assert_eq!(
        BookingStatus::allowed_from(BookingStatus::Completed),
        &[BookingStatus::Confirmed, BookingStatus::InProgress]
    );
    // only creation produces PENDING
    assert!(BookingStatus::allowed_from(BookingStatus::Pending).is_empty());
}

#[test]
fn booking_terminal_statuses_are_never_a_source() {
    let all = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::InProgress,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
    ];
    for target in all {
        for source in BookingStatus::allowed_from(target) {
            assert!(
                !source.is_terminal(),
                "terminal {source:?} must not be a transition source"
            );
        }
    }
}

#[test]
fn escrow_transition_table() {
    assert_eq!(
        EscrowStatus::allowed_from(EscrowStatus::Held),
        &[EscrowStatus::Pending]
    );
    assert_eq!(
        EscrowStatus::allowed_from(EscrowStatus::Failed),
        &[EscrowStatus::Pending]
    );
    assert_eq!(
        EscrowStatus::allowed_from(EscrowStatus::Cancelled),
        &[EscrowStatus::Pending]
    );
    assert_eq!(
        EscrowStatus::allowed_from(EscrowStatus::Released),
        &[EscrowStatus::Held]
    );
    assert_eq!(
        EscrowStatus::allowed_from(EscrowStatus::Refunded),
        &[EscrowStatus::Held]
    );
    assert!(EscrowStatus::allowed_from(EscrowStatus::Disputed).is_empty());
}

#[test]
fn escrow_terminal_statuses_are_never_a_source() {
    let all = [
        EscrowStatus::Pending,
        EscrowStatus::Held,
        EscrowStatus::Released,
        EscrowStatus::Refunded,
        EscrowStatus::Failed,
        EscrowStatus::Cancelled,
        EscrowStatus::Disputed,
    ];
    for target in all {
        for source in EscrowStatus::allowed_from(target) {
            assert!(
                !source.is_terminal(),
                "terminal {source:?} must not be a transition source"
            );
        }
    }
}

#[test]
fn settlement_actions_map_to_terminal_targets() {
    assert_eq!(
        SettlementAction::Release.target_status(),
        EscrowStatus::Released
    );
    assert_eq!(
        SettlementAction::Refund.target_status(),
        EscrowStatus::Refunded
    );
    assert!(SettlementAction::Release.target_status().is_terminal());
    assert!(SettlementAction::Refund.target_status().is_terminal());
}

#[test]
fn status_strings_round_trip() {
    for status in [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::InProgress,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
    ] {
        assert_eq!(BookingStatus::parse(status.as_str()).unwrap(), status);
    }
    for status in [
        EscrowStatus::Pending,
        EscrowStatus::Held,
        EscrowStatus::Released,
        EscrowStatus::Refunded,
        EscrowStatus::Failed,
        EscrowStatus::Cancelled,
        EscrowStatus::Disputed,
    ] {
        assert_eq!(EscrowStatus::parse(status.as_str()).unwrap(), status);
    }
    assert!(BookingStatus::parse("HELD").is_err());
    assert!(EscrowStatus::parse("IN_PROGRESS").is_err());
}
