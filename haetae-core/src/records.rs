//! Narrative record types: incidents, schedules, approvals, inspections,
//! notices, messages, and the equipment/location catalogs.
//!
//! Base records are immutable content; everything a session changes about
//! them is derived through the overlay functions in [`crate::aggregate`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::trigger::TriggerCondition;

/// Incident workflow status. The ordering reflects the rescue pipeline;
/// `Sealed` is terminal and only appears in segwang-mode records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IncidentStatus {
    #[serde(rename = "접수")]
    Received,
    #[serde(rename = "조사중")]
    Investigating,
    #[serde(rename = "구조대기")]
    AwaitingRescue,
    #[serde(rename = "구조중")]
    Rescuing,
    #[serde(rename = "정리대기")]
    AwaitingCleanup,
    #[serde(rename = "정리중")]
    Cleaning,
    #[serde(rename = "종결")]
    Closed,
    #[serde(rename = "봉인")]
    Sealed,
}

impl IncidentStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Received => "접수",
            Self::Investigating => "조사중",
            Self::AwaitingRescue => "구조대기",
            Self::Rescuing => "구조중",
            Self::AwaitingCleanup => "정리대기",
            Self::Cleaning => "정리중",
            Self::Closed => "종결",
            Self::Sealed => "봉인",
        }
    }

    /// Closed and sealed incidents accept no further session work.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Sealed)
    }
}

impl fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Danger classification (형 system), ordered from least to most severe.
/// `Annihilation` and `Unclassified` only occur in segwang-mode records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DangerLevel {
    #[serde(rename = "소형")]
    Minor,
    #[serde(rename = "고형")]
    Caution,
    #[serde(rename = "뇌형")]
    Severe,
    #[serde(rename = "파형")]
    Ruin,
    #[serde(rename = "멸형")]
    Annihilation,
    #[serde(rename = "등급불명")]
    Unclassified,
}

impl DangerLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Minor => "소형",
            Self::Caution => "고형",
            Self::Severe => "뇌형",
            Self::Ruin => "파형",
            Self::Annihilation => "멸형",
            Self::Unclassified => "등급불명",
        }
    }
}

impl fmt::Display for DangerLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable incident record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub id: String,
    pub title: String,
    pub case_number: String,
    pub registration_number: String,
    pub location: String,
    pub danger_level: DangerLevel,
    pub status: IncidentStatus,
    pub report_content: String,
    #[serde(default)]
    pub darkness_type: Option<String>,
    #[serde(default)]
    pub countermeasure: Option<String>,
    #[serde(default)]
    pub entry_restrictions: Option<String>,
    #[serde(default)]
    pub requires_patrol: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub manual_id: Option<String>,
    /// Hidden-trigger gate: the incident stays invisible until this
    /// condition's event id has fired.
    #[serde(default)]
    pub trigger: Option<TriggerCondition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleType {
    #[serde(rename = "작전")]
    Operation,
    #[serde(rename = "방문예약")]
    VisitReservation,
    #[serde(rename = "결재마감")]
    ApprovalDeadline,
    #[serde(rename = "당직")]
    Duty,
    #[serde(rename = "훈련")]
    Training,
    #[serde(rename = "행사")]
    Event,
}

impl ScheduleType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Operation => "작전",
            Self::VisitReservation => "방문예약",
            Self::ApprovalDeadline => "결재마감",
            Self::Duty => "당직",
            Self::Training => "훈련",
            Self::Event => "행사",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub schedule_type: ScheduleType,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub related_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApprovalType {
    #[serde(rename = "조사보고서")]
    InvestigationReport,
    #[serde(rename = "출동일지")]
    DispatchLog,
    #[serde(rename = "순찰일지")]
    PatrolLog,
    #[serde(rename = "현장정리보고서")]
    CleanupReport,
    #[serde(rename = "시말서")]
    IncidentStatement,
    #[serde(rename = "장비품의서")]
    EquipmentRequisition,
    #[serde(rename = "방문품의서")]
    VisitRequisition,
    #[serde(rename = "휴가신청서")]
    LeaveRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApprovalStatus {
    #[serde(rename = "작성중")]
    Drafting,
    #[serde(rename = "결재대기")]
    Pending,
    #[serde(rename = "승인")]
    Approved,
    #[serde(rename = "반려")]
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalDocument {
    pub id: String,
    #[serde(rename = "type")]
    pub doc_type: ApprovalType,
    pub title: String,
    pub content: String,
    pub status: ApprovalStatus,
    pub created_by: String,
    pub created_by_name: String,
    pub approver: String,
    pub approver_name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub processed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub related_incident_id: Option<String>,
    #[serde(default)]
    pub reject_reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InspectionType {
    #[serde(rename = "정기검사")]
    Routine,
    #[serde(rename = "정밀검사")]
    Thorough,
    #[serde(rename = "긴급검사")]
    Emergency,
}

impl InspectionType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Routine => "정기검사",
            Self::Thorough => "정밀검사",
            Self::Emergency => "긴급검사",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InspectionStatus {
    #[serde(rename = "신청")]
    Requested,
    #[serde(rename = "접수")]
    Accepted,
    #[serde(rename = "완료")]
    Completed,
}

/// Contamination inspection request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionRequest {
    pub id: String,
    pub agent_id: String,
    #[serde(rename = "type")]
    pub inspection_type: InspectionType,
    pub status: InspectionStatus,
    pub scheduled_date: DateTime<Utc>,
    #[serde(default)]
    pub symptoms: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticePriority {
    #[serde(rename = "긴급")]
    Urgent,
    #[serde(rename = "필독")]
    MustRead,
    #[serde(rename = "일반")]
    General,
}

/// Bureau notice. `source_department` and `category` stay free text: the
/// notice board accepts whatever the issuing desk typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub content: String,
    pub full_content: String,
    pub priority: NoticePriority,
    pub source_department: String,
    pub category: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub is_urgent: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub trigger: Option<TriggerCondition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub sender_department: String,
    pub receiver_id: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub trigger: Option<TriggerCondition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EquipmentCategory {
    #[serde(rename = "대여")]
    Rental,
    #[serde(rename = "지급")]
    Issued,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    pub id: String,
    pub name: String,
    pub category: EquipmentCategory,
    #[serde(default)]
    pub requires_approval: bool,
    pub description: String,
    pub total_stock: u32,
    pub available_stock: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitLocation {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub requires_approval: bool,
    pub operating_hours: String,
    #[serde(default)]
    pub closed_dates: Vec<String>,
}
