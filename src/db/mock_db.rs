use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::organization_repository::OrganizationRepository;
use crate::db::report_repository::ReportRepository;
use crate::models::organization::Organization;
use crate::models::report::{ReportKind, ReportRequest, ReportStatus};

/// In-memory stand-in for both repositories. Seed rows directly or via the
/// helpers, flip `should_fail` to simulate a database outage.
#[allow(dead_code)]
#[derive(Default)]
pub struct MockDb {
    pub organizations: Mutex<Vec<Organization>>,
    pub report_requests: Mutex<Vec<ReportRequest>>,
    pub should_fail: bool,
}

impl MockDb {
    #[allow(dead_code)]
    pub fn seed_organization(&self, name: &str, plan: &str) -> Organization {
        let now = OffsetDateTime::now_utc();
        let org = Organization {
            id: Uuid::new_v4(),
            name: name.to_string(),
            plan: plan.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.organizations.lock().unwrap().push(org.clone());
        org
    }

    #[allow(dead_code)]
    pub fn seed_report(
        &self,
        organization_id: Uuid,
        kind: ReportKind,
        status: ReportStatus,
        created_at: OffsetDateTime,
    ) -> ReportRequest {
        let report = ReportRequest {
            id: Uuid::new_v4(),
            organization_id,
            kind,
            subject_address: "12 Harbor View Dr".to_string(),
            status,
            error: None,
            created_at,
            updated_at: created_at,
        };
        self.report_requests.lock().unwrap().push(report.clone());
        report
    }
}

#[async_trait]
impl OrganizationRepository for MockDb {
    async fn create_organization(
        &self,
        name: &str,
        plan: &str,
    ) -> Result<Organization, sqlx::Error> {
        if self.should_fail {
            return Err(sqlx::Error::Protocol("Mock DB failure".into()));
        }
        Ok(self.seed_organization(name, plan))
    }

    async fn find_organization(
        &self,
        organization_id: Uuid,
    ) -> Result<Option<Organization>, sqlx::Error> {
        if self.should_fail {
            return Err(sqlx::Error::Protocol("Mock DB failure".into()));
        }
        Ok(self
            .organizations
            .lock()
            .unwrap()
            .iter()
            .find(|org| org.id == organization_id)
            .cloned())
    }

    async fn get_plan(&self, organization_id: Uuid) -> Result<Option<String>, sqlx::Error> {
        if self.should_fail {
            return Err(sqlx::Error::Protocol("Mock DB failure".into()));
        }
        Ok(self
            .organizations
            .lock()
            .unwrap()
            .iter()
            .find(|org| org.id == organization_id)
            .map(|org| org.plan.clone()))
    }
}

#[async_trait]
impl ReportRepository for MockDb {
    async fn insert_report_request(
        &self,
        organization_id: Uuid,
        kind: ReportKind,
        subject_address: &str,
    ) -> Result<ReportRequest, sqlx::Error> {
        if self.should_fail {
            return Err(sqlx::Error::Protocol("Mock DB failure".into()));
        }
        let now = OffsetDateTime::now_utc();
        let report = ReportRequest {
            id: Uuid::new_v4(),
            organization_id,
            kind,
            subject_address: subject_address.to_string(),
            status: ReportStatus::Queued,
            error: None,
            created_at: now,
            updated_at: now,
        };
        self.report_requests.lock().unwrap().push(report.clone());
        Ok(report)
    }

    async fn find_report_request(
        &self,
        organization_id: Uuid,
        report_id: Uuid,
    ) -> Result<Option<ReportRequest>, sqlx::Error> {
        if self.should_fail {
            return Err(sqlx::Error::Protocol("Mock DB failure".into()));
        }
        Ok(self
            .report_requests
            .lock()
            .unwrap()
            .iter()
            .find(|report| report.organization_id == organization_id && report.id == report_id)
            .cloned())
    }

    async fn list_report_requests(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<ReportRequest>, sqlx::Error> {
        if self.should_fail {
            return Err(sqlx::Error::Protocol("Mock DB failure".into()));
        }
        let mut reports: Vec<ReportRequest> = self
            .report_requests
            .lock()
            .unwrap()
            .iter()
            .filter(|report| report.organization_id == organization_id)
            .cloned()
            .collect();
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reports)
    }

    async fn count_reports_in_period(
        &self,
        organization_id: Uuid,
        kind: ReportKind,
        period_start: OffsetDateTime,
        period_end: OffsetDateTime,
    ) -> Result<i64, sqlx::Error> {
        if self.should_fail {
            return Err(sqlx::Error::Protocol("Mock DB failure".into()));
        }
        let count = self
            .report_requests
            .lock()
            .unwrap()
            .iter()
            .filter(|report| {
                report.organization_id == organization_id
                    && report.kind == kind
                    && report.created_at >= period_start
                    && report.created_at <= period_end
                    && matches!(
                        report.status,
                        ReportStatus::Queued | ReportStatus::Running | ReportStatus::Ready
                    )
            })
            .count();
        Ok(count as i64)
    }
}
