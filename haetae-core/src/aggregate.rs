//! Derived view state: combining immutable base datasets with the
//! session overlay.
//!
//! Base data never mutates. Effective incident status, hidden-trigger
//! visibility, read flags, and the synthesized "current task" rows are all
//! computed here from the overlay (accepted ids, triggered ids, read ids,
//! session-local additions) on every call.

use chrono::{DateTime, Utc};
use smallvec::SmallVec;

use crate::agent::Agent;
use crate::data::NarrativeData;
use crate::mode::BureauMode;
use crate::records::{
    ApprovalDocument, Incident, InspectionRequest, Message, Notification, Schedule, ScheduleType,
};
use crate::trigger::TriggerEngine;

/// Identity placeholder applied to segwang-mode approvals.
pub const UNKNOWN_NAME: &str = "Unknown";
const UNKNOWN_CREATOR_ID: &str = "unknown-id";
const UNKNOWN_APPROVER_ID: &str = "admin-id";

/// Reapplication marker excluded from the base schedule set.
const REAPPLICATION_SUFFIX: &str = "신청 건";
/// At most this many "current task" rows are synthesized.
const MAX_TASK_SCHEDULES: usize = 3;

/// Incidents as the agent currently sees them: hidden triggers filtered,
/// fire-time stamped, effective status overlaid, newest first.
#[must_use]
pub fn processed_incidents(
    data: &NarrativeData,
    agent: &Agent,
    mode: BureauMode,
    accepted_ids: &[String],
    engine: &TriggerEngine,
) -> Vec<Incident> {
    let base = match mode {
        BureauMode::Segwang => data.segwang.incidents.clone(),
        BureauMode::Ordinary => data.incidents_for(agent),
    };

    let mut incidents: Vec<Incident> = base
        .into_iter()
        .filter(|incident| incident.trigger.is_none() || engine.has_fired(&incident.id))
        .map(|mut incident| {
            if incident.trigger.is_some() {
                // Dynamically revealed records surface as fresh.
                if let Some(fired) = engine.fired_at(&incident.id) {
                    incident.created_at = fired;
                    incident.updated_at = fired;
                }
            }
            if accepted_ids.iter().any(|id| *id == incident.id) {
                incident.status = agent.department.working_status();
            }
            incident
        })
        .collect();

    incidents.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    incidents
}

/// Base schedules (minus reapplications and approval deadlines), then
/// session additions, then up to three synthesized current-task rows.
#[must_use]
pub fn combined_schedules(
    data: &NarrativeData,
    agent: &Agent,
    mode: BureauMode,
    session_schedules: &[Schedule],
    incidents: &[Incident],
    now: DateTime<Utc>,
) -> Vec<Schedule> {
    let base = match mode {
        BureauMode::Segwang => data.segwang.schedules.clone(),
        BureauMode::Ordinary => data.schedules_for(agent),
    };

    let working = agent.department.working_status();
    let task_rows: SmallVec<[Schedule; MAX_TASK_SCHEDULES]> = incidents
        .iter()
        .filter(|incident| incident.status == working)
        .take(MAX_TASK_SCHEDULES)
        .map(|incident| Schedule {
            id: format!("sch-inc-{}", incident.id),
            title: format!("{}: {}", agent.department.action_prefix(), incident.title),
            schedule_type: ScheduleType::Operation,
            date: now,
            related_id: Some(incident.id.clone()),
        })
        .collect();

    base.into_iter()
        .filter(|schedule| {
            !schedule.title.ends_with(REAPPLICATION_SUFFIX)
                && schedule.schedule_type != ScheduleType::ApprovalDeadline
        })
        .chain(session_schedules.iter().cloned())
        .chain(task_rows)
        .collect()
}

/// Session approvals first, then base. Segwang-mode base documents lose
/// their identity fields to the Unknown placeholder; session documents
/// keep real identity.
#[must_use]
pub fn combined_approvals(
    data: &NarrativeData,
    agent: &Agent,
    mode: BureauMode,
    session_approvals: &[ApprovalDocument],
) -> Vec<ApprovalDocument> {
    let base: Vec<ApprovalDocument> = match mode {
        BureauMode::Segwang => data
            .segwang
            .approvals
            .iter()
            .cloned()
            .map(|mut doc| {
                doc.created_by_name = UNKNOWN_NAME.to_string();
                doc.approver_name = UNKNOWN_NAME.to_string();
                doc.created_by = UNKNOWN_CREATOR_ID.to_string();
                doc.approver = UNKNOWN_APPROVER_ID.to_string();
                doc
            })
            .collect(),
        BureauMode::Ordinary => data.approvals_for(agent),
    };

    session_approvals.iter().cloned().chain(base).collect()
}

/// Session inspections first, then base.
#[must_use]
pub fn combined_inspections(
    data: &NarrativeData,
    agent: &Agent,
    session_inspections: &[InspectionRequest],
) -> Vec<InspectionRequest> {
    session_inspections
        .iter()
        .cloned()
        .chain(data.inspections_for(agent))
        .collect()
}

/// Notices with hidden triggers filtered, fire-times applied, read flags
/// overlaid, pinned entries first and newest first within each group.
#[must_use]
pub fn combined_notifications(
    data: &NarrativeData,
    agent: &Agent,
    engine: &TriggerEngine,
) -> Vec<Notification> {
    let base = data.notifications_for(agent);
    let mut notices: Vec<Notification> = base
        .into_iter()
        .filter(|notice| notice.trigger.is_none() || engine.has_fired(&notice.id))
        .map(|mut notice| {
            if notice.trigger.is_some() {
                if let Some(fired) = engine.fired_at(&notice.id) {
                    notice.created_at = fired;
                }
            }
            if engine.is_read(&notice.id) {
                notice.is_read = true;
            }
            notice
        })
        .collect();

    notices.sort_by(|a, b| {
        b.is_pinned
            .cmp(&a.is_pinned)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    notices
}

/// Persona messages (trigger-filtered) plus session messages, newest
/// first.
#[must_use]
pub fn combined_messages(
    data: &NarrativeData,
    agent: &Agent,
    engine: &TriggerEngine,
    session_messages: &[Message],
) -> Vec<Message> {
    let base = data.messages_for(agent);
    let mut messages: Vec<Message> = base
        .into_iter()
        .filter(|message| message.trigger.is_none() || engine.has_fired(&message.id))
        .chain(session_messages.iter().cloned())
        .map(|mut message| {
            if engine.is_read(&message.id) {
                message.is_read = true;
            }
            message
        })
        .collect();

    messages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    messages
}
