use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use time::OffsetDateTime;
use uuid::Uuid;

/// Kind of work a report request represents. Only `AiValuation` counts
/// against an organization's monthly quota; appraisal orders are dispatched
/// to human appraisers and billed separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    AiValuation,
    AppraisalOrder,
}

impl ReportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::AiValuation => "ai_valuation",
            ReportKind::AppraisalOrder => "appraisal_order",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Queued,
    Running,
    Ready,
    Failed,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Queued => "queued",
            ReportStatus::Running => "running",
            ReportStatus::Ready => "ready",
            ReportStatus::Failed => "failed",
        }
    }
}

/// One requested report. Status transitions are owned by the generation
/// pipeline; this service inserts `queued` rows and reads.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ReportRequest {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub kind: ReportKind,
    pub subject_address: String,
    pub status: ReportStatus,
    pub error: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}
