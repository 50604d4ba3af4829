//! Report lifecycle: submission, status transitions, and the audit trail.

use civicdesk_core::desk::TriageDesk;
use civicdesk_core::error::DeskError;
use civicdesk_core::report::{Location, NewReport, ReportStatus, Severity, UpdateKind};
use civicdesk_core::team::AssignPriority;

fn desk() -> TriageDesk {
    TriageDesk::build_test().unwrap()
}

fn submission(category: &str) -> NewReport {
    NewReport {
        title: format!("Demo {category} issue"),
        description: "A reproducible issue submitted by the test suite.".to_string(),
        category: category.to_string(),
        severity: Severity::Medium,
        location: None,
        media_url: None,
        reported_by: "test-citizen".to_string(),
    }
}

#[test]
fn submission_starts_reported_with_trail() {
    let mut desk = desk();
    let report = desk.submit_report(submission("pothole")).unwrap();

    assert_eq!(report.status, ReportStatus::Reported);
    assert_eq!(report.assigned_to, None);
    assert!(report.tracking_id.starts_with("CIV-"));
    assert_eq!(report.tracking_id.len(), 18);

    let history = desk.report_history(&report.report_id).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].kind, UpdateKind::Comment);

    let by_tracking = desk
        .store()
        .get_report_by_tracking(&report.tracking_id)
        .unwrap();
    assert_eq!(by_tracking.report_id, report.report_id);
}

/// A first assignment implies the work started: reported -> in-progress,
/// with both the assignment and the transition on the trail.
#[test]
fn first_assignment_auto_starts_report() {
    let mut desk = desk();
    let report = desk.submit_report(submission("pothole")).unwrap();
    desk.assign(&report.report_id, "road-crew", AssignPriority::High, "admin")
        .unwrap();

    let report = desk.store().get_report(&report.report_id).unwrap();
    assert_eq!(report.status, ReportStatus::InProgress);
    assert_eq!(report.assigned_to.as_deref(), Some("road-crew"));

    let history = desk.report_history(&report.report_id).unwrap();
    let kinds: Vec<UpdateKind> = history.iter().map(|u| u.kind).collect();
    assert_eq!(
        kinds,
        vec![UpdateKind::Comment, UpdateKind::Assignment, UpdateKind::StatusChange]
    );
}

/// Unassigning does not rewind the status, and a second assignment does not
/// re-fire the auto-start transition.
#[test]
fn reassignment_does_not_restart_lifecycle() {
    let mut desk = desk();
    let report = desk.submit_report(submission("pothole")).unwrap();
    desk.assign(&report.report_id, "road-crew", AssignPriority::Medium, "admin")
        .unwrap();
    desk.unassign(&report.report_id, "road-crew", "admin").unwrap();

    let mid = desk.store().get_report(&report.report_id).unwrap();
    assert_eq!(mid.status, ReportStatus::InProgress);

    desk.assign(&report.report_id, "road-crew", AssignPriority::Medium, "admin")
        .unwrap();
    let after = desk.store().get_report(&report.report_id).unwrap();
    assert_eq!(after.status, ReportStatus::InProgress);

    let history = desk.report_history(&report.report_id).unwrap();
    let status_changes = history
        .iter()
        .filter(|u| u.kind == UpdateKind::StatusChange)
        .count();
    assert_eq!(status_changes, 1);
}

#[test]
fn forward_path_reaches_terminal_closed() {
    let mut desk = desk();
    let report = desk.submit_report(submission("pothole")).unwrap();
    let id = report.report_id;
    desk.assign(&id, "road-crew", AssignPriority::Medium, "admin").unwrap();

    let before = desk.store().update_count(&id).unwrap();
    desk.change_status(&id, ReportStatus::Resolved, "admin", Some("crew confirmed"))
        .unwrap();
    desk.change_status(&id, ReportStatus::Closed, "admin", None).unwrap();
    assert_eq!(desk.store().update_count(&id).unwrap(), before + 2);

    let report = desk.store().get_report(&id).unwrap();
    assert_eq!(report.status, ReportStatus::Closed);
    assert!(report.status.is_terminal());

    for to in [ReportStatus::Reported, ReportStatus::InProgress, ReportStatus::Resolved] {
        let err = desk.change_status(&id, to, "admin", None).unwrap_err();
        assert!(matches!(err, DeskError::InvalidTransition { .. }));
    }
}

#[test]
fn resolved_report_can_be_reopened() {
    let mut desk = desk();
    let report = desk.submit_report(submission("pothole")).unwrap();
    let id = report.report_id;
    desk.assign(&id, "road-crew", AssignPriority::Medium, "admin").unwrap();
    desk.change_status(&id, ReportStatus::Resolved, "admin", None).unwrap();

    desk.change_status(&id, ReportStatus::InProgress, "admin", Some("issue recurred"))
        .unwrap();
    assert_eq!(
        desk.store().get_report(&id).unwrap().status,
        ReportStatus::InProgress
    );

    desk.change_status(&id, ReportStatus::Resolved, "admin", None).unwrap();
    assert_eq!(
        desk.store().get_report(&id).unwrap().status,
        ReportStatus::Resolved
    );
}

#[test]
fn illegal_jumps_are_rejected() {
    let mut desk = desk();
    let report = desk.submit_report(submission("pothole")).unwrap();
    let id = report.report_id;

    // Skipping in-progress, and self-transitions, are both illegal.
    for to in [ReportStatus::Resolved, ReportStatus::Reported] {
        let err = desk.change_status(&id, to, "admin", None).unwrap_err();
        assert!(matches!(err, DeskError::InvalidTransition { .. }));
    }

    desk.assign(&id, "road-crew", AssignPriority::Medium, "admin").unwrap();
    // in-progress must pass through resolved before closing.
    let err = desk
        .change_status(&id, ReportStatus::Closed, "admin", None)
        .unwrap_err();
    assert!(matches!(err, DeskError::InvalidTransition { .. }));

    // Rejected transitions leave no trace on the trail.
    let history = desk.report_history(&id).unwrap();
    assert_eq!(
        history
            .iter()
            .filter(|u| u.kind == UpdateKind::StatusChange)
            .count(),
        1
    );
}

/// An admin may discard a fresh report without any work being done.
#[test]
fn report_can_be_discarded_from_reported() {
    let mut desk = desk();
    let report = desk.submit_report(submission("pothole")).unwrap();
    desk.change_status(&report.report_id, ReportStatus::Closed, "admin", Some("duplicate"))
        .unwrap();
    assert_eq!(
        desk.store().get_report(&report.report_id).unwrap().status,
        ReportStatus::Closed
    );
}

#[test]
fn submission_bounds_are_enforced() {
    let mut desk = desk();

    let mut short_title = submission("pothole");
    short_title.title = "Pot".to_string();
    let err = desk.submit_report(short_title).unwrap_err();
    assert!(matches!(err, DeskError::InvalidSubmission { .. }));

    let mut short_description = submission("pothole");
    short_description.description = "Bad.".to_string();
    assert!(matches!(
        desk.submit_report(short_description).unwrap_err(),
        DeskError::InvalidSubmission { .. }
    ));

    let mut no_category = submission("pothole");
    no_category.category = "  ".to_string();
    assert!(matches!(
        desk.submit_report(no_category).unwrap_err(),
        DeskError::InvalidSubmission { .. }
    ));

    let mut bad_lat = submission("pothole");
    bad_lat.location = Some(Location {
        lat: 123.4,
        lng: 10.0,
        address: None,
    });
    assert!(matches!(
        desk.submit_report(bad_lat).unwrap_err(),
        DeskError::InvalidSubmission { .. }
    ));

    let mut bad_lng = submission("pothole");
    bad_lng.location = Some(Location {
        lat: 45.0,
        lng: -190.0,
        address: None,
    });
    assert!(matches!(
        desk.submit_report(bad_lng).unwrap_err(),
        DeskError::InvalidSubmission { .. }
    ));

    // Nothing was persisted.
    assert_eq!(desk.store().report_count().unwrap(), 0);
}

#[test]
fn unknown_report_is_not_found() {
    let mut desk = desk();

    let err = desk
        .change_status("no-such-report", ReportStatus::Closed, "admin", None)
        .unwrap_err();
    assert!(matches!(err, DeskError::ReportNotFound { .. }));

    assert!(matches!(
        desk.store().get_report("no-such-report").unwrap_err(),
        DeskError::ReportNotFound { .. }
    ));
    assert!(matches!(
        desk.store().get_report_by_tracking("CIV-00000000-XXXXX").unwrap_err(),
        DeskError::ReportNotFound { .. }
    ));
    assert!(matches!(
        desk.report_history("no-such-report").unwrap_err(),
        DeskError::ReportNotFound { .. }
    ));
}
