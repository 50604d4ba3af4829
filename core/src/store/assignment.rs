//! Assignment and unassignment: the capacity-checked link between a report
//! and a team.
//!
//! RULE: the capacity check and the load increment are one conditional
//! UPDATE inside one transaction. Availability queries are advisory only;
//! capacity is enforced here, at commit time.

use super::DeskStore;
use crate::error::{DeskError, DeskResult};
use crate::report::{ReportStatus, UpdateKind};
use crate::team::AssignPriority;
use crate::types::Timestamp;
use rusqlite::{params, Connection, OptionalExtension};

/// What an assignment actually did, for event publication by the caller.
#[derive(Debug, Clone, Copy)]
pub struct AssignOutcome {
    /// True when the assignment moved the report from reported to
    /// in-progress.
    pub auto_started: bool,
}

/// Load counter vs. assignment rows, checked inside every assignment
/// transaction. A mismatch rolls the transaction back as LoadDesync.
pub(super) fn check_team_consistency(conn: &Connection, team_id: &str) -> DeskResult<()> {
    let (load, capacity): (i64, i64) = conn.query_row(
        "SELECT current_load, capacity FROM team WHERE team_id = ?1",
        params![team_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    let rows: i64 = conn.query_row(
        "SELECT COUNT(*) FROM team_assignment WHERE team_id = ?1",
        params![team_id],
        |row| row.get(0),
    )?;
    if load < 0 || load > capacity || load != rows {
        return Err(DeskError::LoadDesync {
            team_id: team_id.to_string(),
            current_load: load,
            assignment_rows: rows,
        });
    }
    Ok(())
}

impl DeskStore {
    /// Link a report to a team, consuming one unit of capacity. Fails with
    /// CapacityExceeded and no mutation when the team is full or inactive.
    /// A first assignment also moves the report from reported to
    /// in-progress, with both trail entries written in the same transaction.
    pub fn assign_report(
        &self,
        report_id: &str,
        team_id: &str,
        priority: AssignPriority,
        actor: &str,
        now: Timestamp,
    ) -> DeskResult<AssignOutcome> {
        let tx = self.conn.unchecked_transaction()?;

        let (status, assigned_to): (ReportStatus, Option<String>) = tx
            .query_row(
                "SELECT status, assigned_to FROM report WHERE report_id = ?1",
                params![report_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?
            .ok_or_else(|| DeskError::ReportNotFound {
                report_id: report_id.to_string(),
            })?;

        if let Some(current_team) = assigned_to {
            return Err(DeskError::AlreadyAssigned {
                report_id: report_id.to_string(),
                team_id: current_team,
            });
        }
        if status.is_terminal() {
            return Err(DeskError::InvalidTransition {
                from: status,
                to: ReportStatus::InProgress,
            });
        }

        // Capacity check and load increment as a single conditional
        // statement. Zero rows: the team is missing, inactive, or full.
        let reserved = tx.execute(
            "UPDATE team SET current_load = current_load + 1
             WHERE team_id = ?1 AND is_active = 1 AND current_load < capacity",
            params![team_id],
        )?;
        if reserved == 0 {
            let exists: i64 = tx.query_row(
                "SELECT COUNT(*) FROM team WHERE team_id = ?1",
                params![team_id],
                |row| row.get(0),
            )?;
            return Err(if exists == 0 {
                DeskError::TeamNotFound {
                    team_id: team_id.to_string(),
                }
            } else {
                DeskError::CapacityExceeded {
                    team_id: team_id.to_string(),
                }
            });
        }

        tx.execute(
            "INSERT INTO team_assignment (report_id, team_id, priority, assigned_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![report_id, team_id, priority, now],
        )?;

        let auto_started = status == ReportStatus::Reported;
        if auto_started {
            tx.execute(
                "UPDATE report SET status = ?1, assigned_to = ?2, updated_at = ?3
                 WHERE report_id = ?4",
                params![ReportStatus::InProgress, team_id, now, report_id],
            )?;
        } else {
            tx.execute(
                "UPDATE report SET assigned_to = ?1, updated_at = ?2 WHERE report_id = ?3",
                params![team_id, now, report_id],
            )?;
        }

        tx.execute(
            "INSERT INTO report_update (report_id, kind, message, created_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                report_id,
                UpdateKind::Assignment,
                format!("assigned to team {team_id} at {priority} priority"),
                actor,
                now,
            ],
        )?;
        if auto_started {
            tx.execute(
                "INSERT INTO report_update (report_id, kind, message, created_by, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    report_id,
                    UpdateKind::StatusChange,
                    "status changed from reported to in-progress",
                    actor,
                    now,
                ],
            )?;
        }

        check_team_consistency(&tx, team_id)?;
        tx.commit()?;
        Ok(AssignOutcome { auto_started })
    }

    /// Remove the report/team link and release one unit of capacity. Fails
    /// with AssignmentNotFound, report state untouched, when no link exists.
    pub fn unassign_report(
        &self,
        report_id: &str,
        team_id: &str,
        actor: &str,
        now: Timestamp,
    ) -> DeskResult<()> {
        let tx = self.conn.unchecked_transaction()?;

        let removed = tx.execute(
            "DELETE FROM team_assignment WHERE report_id = ?1 AND team_id = ?2",
            params![report_id, team_id],
        )?;
        if removed == 0 {
            return Err(DeskError::AssignmentNotFound {
                report_id: report_id.to_string(),
                team_id: team_id.to_string(),
            });
        }

        // No floor on the decrement: a zero load alongside an assignment
        // row is a desync, and the consistency check below must see it.
        tx.execute(
            "UPDATE team SET current_load = current_load - 1 WHERE team_id = ?1",
            params![team_id],
        )?;

        tx.execute(
            "UPDATE report SET assigned_to = NULL, updated_at = ?1 WHERE report_id = ?2",
            params![now, report_id],
        )?;

        tx.execute(
            "INSERT INTO report_update (report_id, kind, message, created_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                report_id,
                UpdateKind::Unassignment,
                format!("unassigned from team {team_id}"),
                actor,
                now,
            ],
        )?;

        check_team_consistency(&tx, team_id)?;
        tx.commit()?;
        Ok(())
    }
}
