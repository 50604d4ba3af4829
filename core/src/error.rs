use crate::report::ReportStatus;
use crate::types::{ReportId, TeamId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeskError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Team '{team_id}' is full or inactive")]
    CapacityExceeded { team_id: TeamId },

    #[error("Report '{report_id}' is not assigned to team '{team_id}'")]
    AssignmentNotFound { report_id: ReportId, team_id: TeamId },

    #[error("Report '{report_id}' is already assigned to team '{team_id}'")]
    AlreadyAssigned { report_id: ReportId, team_id: TeamId },

    #[error("Team '{team_id}' not found")]
    TeamNotFound { team_id: TeamId },

    #[error("Report '{report_id}' not found")]
    ReportNotFound { report_id: ReportId },

    #[error("Illegal status transition: {from} -> {to}")]
    InvalidTransition { from: ReportStatus, to: ReportStatus },

    #[error(
        "Team '{team_id}' load desync: current_load={current_load}, assignment rows={assignment_rows}"
    )]
    LoadDesync {
        team_id: TeamId,
        current_load: i64,
        assignment_rows: i64,
    },

    #[error("Invalid submission: {reason}")]
    InvalidSubmission { reason: String },

    #[error("Unknown {kind} value: '{value}'")]
    UnknownEnum { kind: &'static str, value: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type DeskResult<T> = Result<T, DeskError>;
