//! Load/assignment desync detection and invariant preservation.

use civicdesk_core::desk::TriageDesk;
use civicdesk_core::error::DeskError;
use civicdesk_core::report::{NewReport, ReportStatus, Severity};
use civicdesk_core::team::AssignPriority;

fn desk() -> TriageDesk {
    TriageDesk::build_test().unwrap()
}

fn submit(desk: &mut TriageDesk, category: &str) -> String {
    desk.submit_report(NewReport {
        title: format!("Demo {category} issue"),
        description: "A reproducible issue submitted by the test suite.".to_string(),
        category: category.to_string(),
        severity: Severity::Medium,
        location: None,
        media_url: None,
        reported_by: "test-citizen".to_string(),
    })
    .unwrap()
    .report_id
}

/// A load counter that disagrees with the assignment rows is surfaced as
/// LoadDesync, and the whole unassign rolls back.
#[test]
fn desync_is_detected_on_unassign() {
    let mut desk = desk();
    let report_id = submit(&mut desk, "pothole");
    desk.assign(&report_id, "road-crew", AssignPriority::Medium, "admin").unwrap();

    desk.store().force_team_load("road-crew", 0).unwrap();

    let err = desk.unassign(&report_id, "road-crew", "admin").unwrap_err();
    assert!(matches!(err, DeskError::LoadDesync { .. }));

    // Rolled back: the assignment row and the corrupted counter both remain.
    assert_eq!(desk.store().team_assignment_count("road-crew").unwrap(), 1);
    assert_eq!(desk.store().get_team("road-crew").unwrap().current_load, 0);
    assert_eq!(
        desk.store().get_report(&report_id).unwrap().assigned_to.as_deref(),
        Some("road-crew")
    );
}

#[test]
fn desync_is_detected_on_assign() {
    let mut desk = desk();
    let report_id = submit(&mut desk, "pothole");

    // road-crew has capacity 4 and no assignment rows; a forced load of 3
    // leaves room for the increment, so only the row count gives it away.
    desk.store().force_team_load("road-crew", 3).unwrap();

    let err = desk
        .assign(&report_id, "road-crew", AssignPriority::Medium, "admin")
        .unwrap_err();
    assert!(matches!(err, DeskError::LoadDesync { .. }));

    assert_eq!(desk.store().get_team("road-crew").unwrap().current_load, 3);
    assert_eq!(desk.store().team_assignment_count("road-crew").unwrap(), 0);
    let report = desk.store().get_report(&report_id).unwrap();
    assert_eq!(report.status, ReportStatus::Reported);
    assert_eq!(report.assigned_to, None);
}

#[test]
fn verify_team_consistency_reports_desync() {
    let mut desk = desk();
    desk.store().verify_team_consistency("road-crew").unwrap();

    let report_id = submit(&mut desk, "pothole");
    desk.assign(&report_id, "road-crew", AssignPriority::Medium, "admin").unwrap();
    desk.store().verify_team_consistency("road-crew").unwrap();

    desk.store().force_team_load("road-crew", 2).unwrap();
    let err = desk.store().verify_team_consistency("road-crew").unwrap_err();
    match err {
        DeskError::LoadDesync {
            current_load,
            assignment_rows,
            ..
        } => {
            assert_eq!(current_load, 2);
            assert_eq!(assignment_rows, 1);
        }
        other => panic!("expected LoadDesync, got {other:?}"),
    }

    assert!(matches!(
        desk.store().verify_team_consistency("night-crew").unwrap_err(),
        DeskError::TeamNotFound { .. }
    ));
}

/// Hammering one team past its capacity admits exactly `capacity`
/// assignments and keeps the counter equal to the row count.
#[test]
fn load_stays_bounded_under_assignment_pressure() {
    let mut desk = desk();
    let capacity = desk.store().get_team("water-dept").unwrap().capacity;

    let mut accepted = 0u32;
    let mut rejected = 0u32;
    for _ in 0..8 {
        let report_id = submit(&mut desk, "water-leak");
        match desk.assign(&report_id, "water-dept", AssignPriority::High, "admin") {
            Ok(()) => accepted += 1,
            Err(DeskError::CapacityExceeded { .. }) => rejected += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(accepted, capacity);
    assert_eq!(rejected, 8 - capacity);

    let team = desk.store().get_team("water-dept").unwrap();
    assert_eq!(team.current_load, capacity);
    assert_eq!(
        desk.store().team_assignment_count("water-dept").unwrap(),
        capacity as i64
    );
    desk.store().verify_team_consistency("water-dept").unwrap();
}

/// Invariants hold for every team after an arbitrary mix of operations.
#[test]
fn every_operation_preserves_invariants() {
    let mut desk = desk();

    let a = submit(&mut desk, "pothole");
    let b = submit(&mut desk, "streetlight");
    let c = submit(&mut desk, "parks");
    desk.assign(&a, "road-crew", AssignPriority::High, "admin").unwrap();
    desk.dispatch(&b, "admin").unwrap();
    desk.dispatch(&c, "admin").unwrap();
    desk.change_status(&a, ReportStatus::Resolved, "admin", None).unwrap();
    desk.unassign(&a, "road-crew", "admin").unwrap();
    desk.change_status(&a, ReportStatus::Closed, "admin", None).unwrap();

    for team in desk.store().list_teams().unwrap() {
        desk.store().verify_team_consistency(&team.team_id).unwrap();
        assert!(team.current_load <= team.capacity);
    }
}
