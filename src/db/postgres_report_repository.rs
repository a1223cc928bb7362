use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::models::report::{ReportKind, ReportRequest};

use super::report_repository::ReportRepository;

pub struct PostgresReportRepository {
    pub pool: PgPool,
}

#[async_trait]
impl ReportRepository for PostgresReportRepository {
    async fn insert_report_request(
        &self,
        organization_id: Uuid,
        kind: ReportKind,
        subject_address: &str,
    ) -> Result<ReportRequest, sqlx::Error> {
        let result = sqlx::query_as::<_, ReportRequest>(
            r#"
            INSERT INTO report_requests (organization_id, kind, subject_address, status, created_at, updated_at)
            VALUES ($1, $2, $3, 'queued', now(), now())
            RETURNING id, organization_id, kind, subject_address, status, error, created_at, updated_at
            "#,
        )
        .bind(organization_id)
        .bind(kind)
        .bind(subject_address)
        .fetch_one(&self.pool)
        .await?;

        Ok(result)
    }

    async fn find_report_request(
        &self,
        organization_id: Uuid,
        report_id: Uuid,
    ) -> Result<Option<ReportRequest>, sqlx::Error> {
        let result = sqlx::query_as::<_, ReportRequest>(
            r#"
            SELECT id, organization_id, kind, subject_address, status, error, created_at, updated_at
            FROM report_requests
            WHERE organization_id = $1 AND id = $2
            "#,
        )
        .bind(organization_id)
        .bind(report_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(result)
    }

    async fn list_report_requests(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<ReportRequest>, sqlx::Error> {
        let results = sqlx::query_as::<_, ReportRequest>(
            r#"
            SELECT id, organization_id, kind, subject_address, status, error, created_at, updated_at
            FROM report_requests
            WHERE organization_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(results)
    }

    async fn count_reports_in_period(
        &self,
        organization_id: Uuid,
        kind: ReportKind,
        period_start: OffsetDateTime,
        period_end: OffsetDateTime,
    ) -> Result<i64, sqlx::Error> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM report_requests
            WHERE organization_id = $1
              AND kind = $2
              AND created_at >= $3
              AND created_at <= $4
              AND status IN ('queued', 'running', 'ready')
            "#,
        )
        .bind(organization_id)
        .bind(kind)
        .bind(period_start)
        .bind(period_end)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
