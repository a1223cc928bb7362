use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::models::report::{ReportKind, ReportRequest};

#[async_trait]
pub trait ReportRepository: Send + Sync {
    /// Inserts a new request in `queued` status and returns the stored row.
    async fn insert_report_request(
        &self,
        organization_id: Uuid,
        kind: ReportKind,
        subject_address: &str,
    ) -> Result<ReportRequest, sqlx::Error>;

    async fn find_report_request(
        &self,
        organization_id: Uuid,
        report_id: Uuid,
    ) -> Result<Option<ReportRequest>, sqlx::Error>;

    async fn list_report_requests(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<ReportRequest>, sqlx::Error>;

    /// Counts requests of `kind` created within `[period_start, period_end]`,
    /// both bounds inclusive. Failed requests are not counted.
    async fn count_reports_in_period(
        &self,
        organization_id: Uuid,
        kind: ReportKind,
        period_start: OffsetDateTime,
        period_end: OffsetDateTime,
    ) -> Result<i64, sqlx::Error>;
}
