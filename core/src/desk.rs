//! The triage desk — the single entry point for every core operation.
//!
//! RULES:
//!   - State changes go through the store; the desk owns policy.
//!   - Events are published only after the owning transaction commits.
//!   - A publish failure can never fail a desk operation.

use crate::config::{DeskConfig, TeamSeed};
use crate::error::{DeskError, DeskResult};
use crate::event::DeskEvent;
use crate::notify::NotificationHub;
use crate::report::{NewReport, ReportRecord, ReportStatus, ReportUpdate, UpdateKind};
use crate::store::DeskStore;
use crate::team::{AssignPriority, TeamRecord};
use crate::types::TeamId;
use chrono::Utc;
use std::sync::mpsc::Receiver;

pub struct TriageDesk {
    store: DeskStore,
    hub: NotificationHub,
}

impl TriageDesk {
    pub fn new(store: DeskStore) -> Self {
        Self {
            store,
            hub: NotificationHub::new(),
        }
    }

    /// In-memory desk with the built-in roster. Used by tests.
    pub fn build_test() -> DeskResult<Self> {
        let store = DeskStore::in_memory()?;
        store.migrate()?;
        let mut desk = Self::new(store);
        desk.provision_roster(&DeskConfig::default_test().roster)?;
        Ok(desk)
    }

    pub fn store(&self) -> &DeskStore {
        &self.store
    }

    /// Register a notification observer.
    pub fn subscribe(&mut self) -> Receiver<DeskEvent> {
        self.hub.subscribe()
    }

    // ── Provisioning ───────────────────────────────────────────

    /// Seed teams from a roster. Returns the number provisioned.
    pub fn provision_roster(&mut self, roster: &[TeamSeed]) -> DeskResult<usize> {
        let now = Utc::now();
        for seed in roster {
            if seed.capacity == 0 {
                return Err(
                    anyhow::anyhow!("Team '{}' must have capacity >= 1", seed.team_id).into(),
                );
            }
            let team = TeamRecord {
                team_id: seed.team_id.clone(),
                name: seed.name.clone(),
                department: seed.department,
                specialties: seed.specialties.clone(),
                capacity: seed.capacity,
                current_load: 0,
                is_active: seed.is_active,
                created_at: now,
            };
            self.store.insert_team(&team)?;
            log::info!(
                "provisioned team {} ({}, capacity {})",
                team.team_id,
                team.department,
                team.capacity
            );
        }
        Ok(roster.len())
    }

    /// Soft activation toggle. Inactive teams keep their assignments but
    /// accept no new ones.
    pub fn set_team_active(&mut self, team_id: &str, active: bool) -> DeskResult<()> {
        self.store.set_team_active(team_id, active)?;
        log::info!(
            "team {team_id} {}",
            if active { "activated" } else { "deactivated" }
        );
        Ok(())
    }

    // ── Submission ─────────────────────────────────────────────

    /// Accept a citizen submission and mint the report record.
    pub fn submit_report(&mut self, submission: NewReport) -> DeskResult<ReportRecord> {
        submission.validate()?;
        let now = Utc::now();
        let report = submission.into_record(now);
        self.store.insert_report(&report)?;
        self.store.append_update(
            &report.report_id,
            &ReportUpdate {
                kind: UpdateKind::Comment,
                message: format!("report received, tracking id {}", report.tracking_id),
                created_by: report.reported_by.clone(),
                created_at: now,
            },
        )?;
        log::debug!(
            "report {} submitted in category {}",
            report.tracking_id,
            report.category
        );
        self.hub.publish(DeskEvent::ReportCreated {
            report_id: report.report_id.clone(),
            tracking_id: report.tracking_id.clone(),
            category: report.category.clone(),
            severity: report.severity,
        });
        Ok(report)
    }

    // ── Assignment ─────────────────────────────────────────────

    /// Link a report to a team, consuming one unit of capacity. Capacity is
    /// re-validated inside the store transaction; a stale availability
    /// result fails here with CapacityExceeded rather than over-assigning.
    pub fn assign(
        &mut self,
        report_id: &str,
        team_id: &str,
        priority: AssignPriority,
        actor: &str,
    ) -> DeskResult<()> {
        let outcome = self
            .store
            .assign_report(report_id, team_id, priority, actor, Utc::now())?;
        log::info!("report {report_id} assigned to {team_id} ({priority})");
        self.hub.publish(DeskEvent::ReportAssigned {
            report_id: report_id.to_string(),
            team_id: team_id.to_string(),
            priority,
        });
        if outcome.auto_started {
            self.hub.publish(DeskEvent::ReportStatusChanged {
                report_id: report_id.to_string(),
                from: ReportStatus::Reported,
                to: ReportStatus::InProgress,
                changed_by: actor.to_string(),
            });
        }
        Ok(())
    }

    pub fn unassign(&mut self, report_id: &str, team_id: &str, actor: &str) -> DeskResult<()> {
        self.store
            .unassign_report(report_id, team_id, actor, Utc::now())?;
        log::info!("report {report_id} unassigned from {team_id}");
        self.hub.publish(DeskEvent::ReportUnassigned {
            report_id: report_id.to_string(),
            team_id: team_id.to_string(),
        });
        Ok(())
    }

    /// Assign to the least-loaded team covering the report's category, at
    /// the severity-derived priority. Candidates that fill up between the
    /// availability query and the commit are skipped. None means nothing
    /// has capacity — the report stays queued unassigned, a normal outcome.
    pub fn dispatch(&mut self, report_id: &str, actor: &str) -> DeskResult<Option<TeamId>> {
        let report = self.store.get_report(report_id)?;
        let candidates = self.store.teams_available_for_category(&report.category)?;
        let priority = report.severity.default_priority();
        for team in candidates {
            match self.assign(report_id, &team.team_id, priority, actor) {
                Ok(()) => return Ok(Some(team.team_id)),
                Err(DeskError::CapacityExceeded { .. }) => continue,
                Err(e) => return Err(e),
            }
        }
        log::debug!("no team available for category {}", report.category);
        Ok(None)
    }

    // ── Lifecycle ──────────────────────────────────────────────

    /// Administrative status change. Every accepted transition appends one
    /// trail entry.
    pub fn change_status(
        &mut self,
        report_id: &str,
        to: ReportStatus,
        actor: &str,
        note: Option<&str>,
    ) -> DeskResult<()> {
        let report = self.store.get_report(report_id)?;
        let from = report.status;
        if !from.can_transition_to(to) {
            return Err(DeskError::InvalidTransition { from, to });
        }
        let message = match note {
            Some(note) => format!("status changed from {from} to {to}: {note}"),
            None => format!("status changed from {from} to {to}"),
        };
        self.store
            .change_report_status(report_id, to, &message, actor, Utc::now())?;
        log::info!("report {report_id}: {from} -> {to}");
        self.hub.publish(DeskEvent::ReportStatusChanged {
            report_id: report_id.to_string(),
            from,
            to,
            changed_by: actor.to_string(),
        });
        Ok(())
    }

    // ── Queries ────────────────────────────────────────────────

    pub fn find_available_for_category(&self, category: &str) -> DeskResult<Vec<TeamRecord>> {
        self.store.teams_available_for_category(category)
    }

    pub fn report_history(&self, report_id: &str) -> DeskResult<Vec<ReportUpdate>> {
        self.store.get_report(report_id)?;
        self.store.updates_for_report(report_id)
    }
}
