//! Report queries and the append-only update trail.

use super::DeskStore;
use crate::error::{DeskError, DeskResult};
use crate::report::{Location, ReportRecord, ReportStatus, ReportUpdate, UpdateKind};
use crate::types::Timestamp;
use rusqlite::{params, OptionalExtension};

fn report_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<ReportRecord> {
    let lat: Option<f64> = row.get(7)?;
    let lng: Option<f64> = row.get(8)?;
    let address: Option<String> = row.get(9)?;
    let location = match (lat, lng) {
        (Some(lat), Some(lng)) => Some(Location { lat, lng, address }),
        _ => None,
    };
    Ok(ReportRecord {
        report_id: row.get(0)?,
        tracking_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        category: row.get(4)?,
        severity: row.get(5)?,
        status: row.get(6)?,
        location,
        media_url: row.get(10)?,
        reported_by: row.get(11)?,
        assigned_to: row.get(12)?,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
    })
}

impl DeskStore {
    pub fn insert_report(&self, report: &ReportRecord) -> DeskResult<()> {
        self.conn.execute(
            "INSERT INTO report (
                report_id, tracking_id, title, description, category, severity,
                status, lat, lng, address, media_url, reported_by, assigned_to,
                created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                report.report_id,
                report.tracking_id,
                report.title,
                report.description,
                report.category,
                report.severity,
                report.status,
                report.location.as_ref().map(|l| l.lat),
                report.location.as_ref().map(|l| l.lng),
                report.location.as_ref().and_then(|l| l.address.as_deref()),
                report.media_url.as_deref(),
                report.reported_by,
                report.assigned_to.as_deref(),
                report.created_at,
                report.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_report(&self, report_id: &str) -> DeskResult<ReportRecord> {
        self.conn
            .query_row(
                "SELECT report_id, tracking_id, title, description, category, severity,
                        status, lat, lng, address, media_url, reported_by, assigned_to,
                        created_at, updated_at
                 FROM report WHERE report_id = ?1",
                params![report_id],
                report_row_mapper,
            )
            .optional()?
            .ok_or_else(|| DeskError::ReportNotFound {
                report_id: report_id.to_string(),
            })
    }

    /// Look up a report by its shareable tracking id.
    pub fn get_report_by_tracking(&self, tracking_id: &str) -> DeskResult<ReportRecord> {
        self.conn
            .query_row(
                "SELECT report_id, tracking_id, title, description, category, severity,
                        status, lat, lng, address, media_url, reported_by, assigned_to,
                        created_at, updated_at
                 FROM report WHERE tracking_id = ?1",
                params![tracking_id],
                report_row_mapper,
            )
            .optional()?
            .ok_or_else(|| DeskError::ReportNotFound {
                report_id: tracking_id.to_string(),
            })
    }

    pub fn reports_with_status(&self, status: ReportStatus) -> DeskResult<Vec<ReportRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT report_id, tracking_id, title, description, category, severity,
                    status, lat, lng, address, media_url, reported_by, assigned_to,
                    created_at, updated_at
             FROM report WHERE status = ?1
             ORDER BY created_at ASC, report_id ASC",
        )?;
        let rows = stmt.query_map(params![status], report_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// The triage queue: submitted reports nobody has picked up yet.
    pub fn queued_reports(&self) -> DeskResult<Vec<ReportRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT report_id, tracking_id, title, description, category, severity,
                    status, lat, lng, address, media_url, reported_by, assigned_to,
                    created_at, updated_at
             FROM report WHERE status = 'reported' AND assigned_to IS NULL
             ORDER BY created_at ASC, report_id ASC",
        )?;
        let rows = stmt.query_map([], report_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Set the status and append the status-change trail entry in one
    /// transaction.
    pub fn change_report_status(
        &self,
        report_id: &str,
        to: ReportStatus,
        message: &str,
        actor: &str,
        now: Timestamp,
    ) -> DeskResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE report SET status = ?1, updated_at = ?2 WHERE report_id = ?3",
            params![to, now, report_id],
        )?;
        if changed == 0 {
            return Err(DeskError::ReportNotFound {
                report_id: report_id.to_string(),
            });
        }
        tx.execute(
            "INSERT INTO report_update (report_id, kind, message, created_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![report_id, UpdateKind::StatusChange, message, actor, now],
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn append_update(&self, report_id: &str, update: &ReportUpdate) -> DeskResult<()> {
        self.conn.execute(
            "INSERT INTO report_update (report_id, kind, message, created_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                report_id,
                update.kind,
                update.message,
                update.created_by,
                update.created_at,
            ],
        )?;
        Ok(())
    }

    /// Full audit trail for a report, in append order.
    pub fn updates_for_report(&self, report_id: &str) -> DeskResult<Vec<ReportUpdate>> {
        let mut stmt = self.conn.prepare(
            "SELECT kind, message, created_by, created_at
             FROM report_update WHERE report_id = ?1
             ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![report_id], |row| {
            Ok(ReportUpdate {
                kind: row.get(0)?,
                message: row.get(1)?,
                created_by: row.get(2)?,
                created_at: row.get(3)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    // ── Test / summary helpers ─────────────────────────────────

    pub fn report_count(&self) -> DeskResult<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM report", [], |row| row.get(0))
            .map_err(Into::into)
    }

    pub fn status_count(&self, status: ReportStatus) -> DeskResult<i64> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM report WHERE status = ?1",
                params![status],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }

    pub fn update_count(&self, report_id: &str) -> DeskResult<i64> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM report_update WHERE report_id = ?1",
                params![report_id],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }
}
