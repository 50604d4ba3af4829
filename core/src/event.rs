//! Lifecycle events delivered over the notification hub.
//!
//! RULE: events are best-effort. Core state never depends on an event being
//! observed, and a failed operation publishes nothing.

use crate::report::{ReportStatus, Severity};
use crate::team::AssignPriority;
use crate::types::{ReportId, TeamId, TrackingId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeskEvent {
    ReportCreated {
        report_id: ReportId,
        tracking_id: TrackingId,
        category: String,
        severity: Severity,
    },
    ReportStatusChanged {
        report_id: ReportId,
        from: ReportStatus,
        to: ReportStatus,
        changed_by: String,
    },
    ReportAssigned {
        report_id: ReportId,
        team_id: TeamId,
        priority: AssignPriority,
    },
    ReportUnassigned {
        report_id: ReportId,
        team_id: TeamId,
    },
}

/// Stable string name for an event variant, for logging.
pub fn event_type_name(event: &DeskEvent) -> &'static str {
    match event {
        DeskEvent::ReportCreated { .. } => "report_created",
        DeskEvent::ReportStatusChanged { .. } => "report_status_changed",
        DeskEvent::ReportAssigned { .. } => "report_assigned",
        DeskEvent::ReportUnassigned { .. } => "report_unassigned",
    }
}
