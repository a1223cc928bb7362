use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{util::days_in_year_month, OffsetDateTime, Time};
use tracing::warn;
use uuid::Uuid;

use crate::db::organization_repository::OrganizationRepository;
use crate::db::report_repository::ReportRepository;
use crate::models::plan::PlanTier;
use crate::models::report::ReportKind;
use crate::utils::plan_limits::{NormalizedPlanTier, PlanLimits, UNLIMITED_REPORTS};

/// Machine-readable code attached to quota denials.
pub const QUOTA_EXCEEDED_ERROR: &str = "report_quota_exceeded";

#[derive(Debug, Error)]
pub enum UsageError {
    #[error("organization {0} not found")]
    OrganizationNotFound(Uuid),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Current calendar-month billing window, both bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingPeriod {
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
}

/// Window containing `now`: midnight on the 1st through 23:59.59.999 on the
/// last day of the same month, in the caller's reference frame. Callers pass
/// `OffsetDateTime::now_utc()` so the bounds line up with stored UTC
/// timestamps.
pub fn billing_period(now: OffsetDateTime) -> BillingPeriod {
    let start = now
        .replace_day(1)
        .unwrap_or(now)
        .replace_time(Time::MIDNIGHT);

    let last_day = days_in_year_month(now.year(), now.month());
    let end_of_day = Time::from_hms_milli(23, 59, 59, 999).unwrap_or(Time::MIDNIGHT);
    let end = now.replace_day(last_day).unwrap_or(now).replace_time(end_of_day);

    BillingPeriod { start, end }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageStatus {
    /// Raw plan string as stored on the organization.
    pub plan: String,
    /// Tier the limit was resolved from; `None` when `plan` was not
    /// recognized and the conservative default applied.
    pub tier: Option<PlanTier>,
    pub used: i64,
    pub limit: i64,
    /// `None` on uncapped plans, otherwise never negative.
    pub remaining: Option<i64>,
    pub unlimited: bool,
    pub exceeded: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub period_start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub period_end: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCheck {
    pub requires_payment: bool,
    pub usage: UsageStatus,
}

/// Read side of the monthly report quota. Every answer is computed fresh
/// from the datastore; nothing here consumes quota, only inserting a
/// report request does.
#[derive(Clone)]
pub struct UsageMeter {
    organization_repo: Arc<dyn OrganizationRepository>,
    report_repo: Arc<dyn ReportRepository>,
    plan_limits: PlanLimits,
}

impl UsageMeter {
    pub fn new(
        organization_repo: Arc<dyn OrganizationRepository>,
        report_repo: Arc<dyn ReportRepository>,
        plan_limits: PlanLimits,
    ) -> Self {
        Self {
            organization_repo,
            report_repo,
            plan_limits,
        }
    }

    pub async fn usage_status(&self, organization_id: Uuid) -> Result<UsageStatus, UsageError> {
        self.usage_status_at(organization_id, OffsetDateTime::now_utc())
            .await
    }

    /// Usage for the billing period containing `now`.
    pub async fn usage_status_at(
        &self,
        organization_id: Uuid,
        now: OffsetDateTime,
    ) -> Result<UsageStatus, UsageError> {
        let plan = self
            .organization_repo
            .get_plan(organization_id)
            .await?
            .ok_or(UsageError::OrganizationNotFound(organization_id))?;

        let tier = NormalizedPlanTier::from_option(Some(plan.as_str()));
        if tier.is_none() {
            warn!(
                "unrecognized plan {:?} on organization {}; applying the default limit",
                plan, organization_id
            );
        }
        let limit = self.plan_limits.limit_for_tier(tier);
        let unlimited = limit == UNLIMITED_REPORTS;

        let period = billing_period(now);
        let used = self
            .report_repo
            .count_reports_in_period(
                organization_id,
                ReportKind::AiValuation,
                period.start,
                period.end,
            )
            .await?;

        let exceeded = !unlimited && used >= limit;
        let remaining = if unlimited {
            None
        } else {
            Some((limit - used).max(0))
        };

        Ok(UsageStatus {
            plan,
            tier: tier.map(PlanTier::from),
            used,
            limit,
            remaining,
            unlimited,
            exceeded,
            period_start: period.start,
            period_end: period.end,
        })
    }

    pub async fn can_create_report(&self, organization_id: Uuid) -> Result<bool, UsageError> {
        let usage = self.usage_status(organization_id).await?;
        Ok(!usage.exceeded)
    }

    /// Point-in-time answer for the payment flow; quota is not reserved, so
    /// two concurrent callers can both pass at `used == limit - 1`.
    pub async fn check_usage_for_payment(
        &self,
        organization_id: Uuid,
    ) -> Result<PaymentCheck, UsageError> {
        let usage = self.usage_status(organization_id).await?;
        Ok(PaymentCheck {
            requires_payment: usage.exceeded,
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use time::{Date, Month, OffsetDateTime, Time};
    use uuid::Uuid;

    use super::{billing_period, UsageError, UsageMeter};
    use crate::db::mock_db::MockDb;
    use crate::models::plan::PlanTier;
    use crate::models::report::{ReportKind, ReportStatus};
    use crate::utils::plan_limits::{PlanLimits, DEFAULT_PLAN_REPORT_LIMIT};

    fn utc(year: i32, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> OffsetDateTime {
        let date =
            Date::from_calendar_date(year, Month::try_from(month).unwrap(), day).unwrap();
        OffsetDateTime::new_utc(date, Time::from_hms(hour, minute, second).unwrap())
    }

    fn utc_milli(
        year: i32,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
        milli: u16,
    ) -> OffsetDateTime {
        let date =
            Date::from_calendar_date(year, Month::try_from(month).unwrap(), day).unwrap();
        OffsetDateTime::new_utc(
            date,
            Time::from_hms_milli(hour, minute, second, milli).unwrap(),
        )
    }

    fn meter(db: Arc<MockDb>) -> UsageMeter {
        UsageMeter::new(db.clone(), db, PlanLimits::default())
    }

    #[test]
    fn billing_period_spans_the_calendar_month() {
        let period = billing_period(utc(2024, 6, 15, 10, 30, 0));

        assert_eq!(period.start, utc(2024, 6, 1, 0, 0, 0));
        assert_eq!(period.end, utc_milli(2024, 6, 30, 23, 59, 59, 999));
        assert!(period.start.offset().is_utc());
        assert!(period.end.offset().is_utc());
    }

    #[test]
    fn billing_period_handles_february_and_leap_years() {
        let leap = billing_period(utc(2024, 2, 10, 12, 0, 0));
        assert_eq!(leap.end.day(), 29);

        let common = billing_period(utc(2023, 2, 10, 12, 0, 0));
        assert_eq!(common.end.day(), 28);
    }

    #[test]
    fn billing_period_covers_december_without_spilling_into_january() {
        let period = billing_period(utc(2025, 12, 31, 23, 59, 59));

        assert_eq!(period.start, utc(2025, 12, 1, 0, 0, 0));
        assert_eq!(period.end, utc_milli(2025, 12, 31, 23, 59, 59, 999));
    }

    #[test]
    fn billing_period_is_stable_across_the_month() {
        let early = billing_period(utc(2024, 3, 1, 0, 0, 0));
        let late = billing_period(utc(2024, 3, 31, 23, 59, 59));
        assert_eq!(early, late);
    }

    #[tokio::test]
    async fn requests_at_the_period_bounds_are_counted() {
        let db = Arc::new(MockDb::default());
        let org = db.seed_organization("Shoreline Realty", "starter");

        db.seed_report(
            org.id,
            ReportKind::AiValuation,
            ReportStatus::Ready,
            utc(2024, 6, 1, 0, 0, 0),
        );
        db.seed_report(
            org.id,
            ReportKind::AiValuation,
            ReportStatus::Ready,
            utc_milli(2024, 6, 30, 23, 59, 59, 999),
        );
        // First instant of July belongs to the next period.
        db.seed_report(
            org.id,
            ReportKind::AiValuation,
            ReportStatus::Ready,
            utc(2024, 7, 1, 0, 0, 0),
        );

        let usage = meter(db)
            .usage_status_at(org.id, utc(2024, 6, 15, 12, 0, 0))
            .await
            .unwrap();
        assert_eq!(usage.used, 2);
    }

    #[tokio::test]
    async fn previous_month_requests_do_not_carry_over() {
        let db = Arc::new(MockDb::default());
        let org = db.seed_organization("Shoreline Realty", "starter");

        for _ in 0..5 {
            db.seed_report(
                org.id,
                ReportKind::AiValuation,
                ReportStatus::Ready,
                utc(2024, 5, 20, 9, 0, 0),
            );
        }

        let usage = meter(db)
            .usage_status_at(org.id, utc(2024, 6, 2, 8, 0, 0))
            .await
            .unwrap();
        assert_eq!(usage.used, 0);
        assert!(!usage.exceeded);
        assert_eq!(usage.remaining, Some(5));
    }

    #[tokio::test]
    async fn used_reaching_the_limit_marks_it_exceeded() {
        let db = Arc::new(MockDb::default());
        let org = db.seed_organization("Shoreline Realty", "starter");
        let now = utc(2024, 6, 15, 12, 0, 0);

        for _ in 0..5 {
            db.seed_report(
                org.id,
                ReportKind::AiValuation,
                ReportStatus::Ready,
                utc(2024, 6, 10, 9, 0, 0),
            );
        }

        let usage = meter(db).usage_status_at(org.id, now).await.unwrap();
        assert_eq!(usage.used, 5);
        assert_eq!(usage.limit, 5);
        assert!(usage.exceeded);
        assert_eq!(usage.remaining, Some(0));
    }

    #[tokio::test]
    async fn below_the_limit_leaves_room() {
        let db = Arc::new(MockDb::default());
        let org = db.seed_organization("Shoreline Realty", "starter");

        for _ in 0..3 {
            db.seed_report(
                org.id,
                ReportKind::AiValuation,
                ReportStatus::Ready,
                utc(2024, 6, 10, 9, 0, 0),
            );
        }

        let usage = meter(db)
            .usage_status_at(org.id, utc(2024, 6, 15, 12, 0, 0))
            .await
            .unwrap();
        assert!(!usage.exceeded);
        assert_eq!(usage.remaining, Some(2));
    }

    #[tokio::test]
    async fn remaining_never_goes_negative() {
        let db = Arc::new(MockDb::default());
        let org = db.seed_organization("Shoreline Realty", "starter");

        for _ in 0..8 {
            db.seed_report(
                org.id,
                ReportKind::AiValuation,
                ReportStatus::Ready,
                utc(2024, 6, 10, 9, 0, 0),
            );
        }

        let usage = meter(db)
            .usage_status_at(org.id, utc(2024, 6, 15, 12, 0, 0))
            .await
            .unwrap();
        assert_eq!(usage.used, 8);
        assert_eq!(usage.remaining, Some(0));
        assert!(usage.exceeded);
    }

    #[tokio::test]
    async fn failed_requests_never_consume_quota() {
        let db = Arc::new(MockDb::default());
        let org = db.seed_organization("Shoreline Realty", "starter");
        let created = utc(2024, 6, 10, 9, 0, 0);

        for _ in 0..4 {
            db.seed_report(org.id, ReportKind::AiValuation, ReportStatus::Ready, created);
        }
        for _ in 0..3 {
            db.seed_report(org.id, ReportKind::AiValuation, ReportStatus::Failed, created);
        }

        let usage = meter(db)
            .usage_status_at(org.id, utc(2024, 6, 15, 12, 0, 0))
            .await
            .unwrap();
        assert_eq!(usage.used, 4);
        assert!(!usage.exceeded);
        assert_eq!(usage.remaining, Some(1));
    }

    #[tokio::test]
    async fn queued_and_running_requests_hold_quota() {
        let db = Arc::new(MockDb::default());
        let org = db.seed_organization("Shoreline Realty", "starter");
        let created = utc(2024, 6, 10, 9, 0, 0);

        db.seed_report(org.id, ReportKind::AiValuation, ReportStatus::Queued, created);
        db.seed_report(org.id, ReportKind::AiValuation, ReportStatus::Running, created);
        db.seed_report(org.id, ReportKind::AiValuation, ReportStatus::Ready, created);

        let usage = meter(db)
            .usage_status_at(org.id, utc(2024, 6, 15, 12, 0, 0))
            .await
            .unwrap();
        assert_eq!(usage.used, 3);
    }

    #[tokio::test]
    async fn appraisal_orders_are_not_metered() {
        let db = Arc::new(MockDb::default());
        let org = db.seed_organization("Shoreline Realty", "starter");
        let created = utc(2024, 6, 10, 9, 0, 0);

        for _ in 0..5 {
            db.seed_report(org.id, ReportKind::AppraisalOrder, ReportStatus::Ready, created);
        }
        db.seed_report(org.id, ReportKind::AiValuation, ReportStatus::Ready, created);

        let usage = meter(db)
            .usage_status_at(org.id, utc(2024, 6, 15, 12, 0, 0))
            .await
            .unwrap();
        assert_eq!(usage.used, 1);
        assert!(!usage.exceeded);
    }

    #[tokio::test]
    async fn enterprise_accounts_are_uncapped() {
        let db = Arc::new(MockDb::default());
        let org = db.seed_organization("National Lending Corp", "enterprise");
        let created = utc(2024, 6, 10, 9, 0, 0);

        for _ in 0..10_000 {
            db.seed_report(org.id, ReportKind::AiValuation, ReportStatus::Ready, created);
        }

        let m = meter(db);
        let usage = m
            .usage_status_at(org.id, utc(2024, 6, 15, 12, 0, 0))
            .await
            .unwrap();
        assert!(usage.unlimited);
        assert_eq!(usage.used, 10_000);
        assert_eq!(usage.remaining, None);
        assert!(!usage.exceeded);
        assert_eq!(usage.tier, Some(PlanTier::Enterprise));

        let check = m.check_usage_for_payment(org.id).await.unwrap();
        assert!(!check.requires_payment);
    }

    #[tokio::test]
    async fn trial_accounts_share_the_starter_allowance() {
        let db = Arc::new(MockDb::default());
        let org = db.seed_organization("New Signup LLC", "trial");

        for _ in 0..5 {
            db.seed_report(
                org.id,
                ReportKind::AiValuation,
                ReportStatus::Ready,
                utc(2024, 6, 10, 9, 0, 0),
            );
        }

        let usage = meter(db)
            .usage_status_at(org.id, utc(2024, 6, 15, 12, 0, 0))
            .await
            .unwrap();
        assert_eq!(usage.limit, 5);
        assert!(usage.exceeded);
        assert_eq!(usage.tier, Some(PlanTier::Trial));
    }

    #[tokio::test]
    async fn unrecognized_plans_get_the_conservative_default() {
        let db = Arc::new(MockDb::default());
        let org = db.seed_organization("Legacy Import", "platinum");

        for _ in 0..DEFAULT_PLAN_REPORT_LIMIT {
            db.seed_report(
                org.id,
                ReportKind::AiValuation,
                ReportStatus::Ready,
                utc(2024, 6, 10, 9, 0, 0),
            );
        }

        let usage = meter(db)
            .usage_status_at(org.id, utc(2024, 6, 15, 12, 0, 0))
            .await
            .unwrap();
        assert_eq!(usage.limit, DEFAULT_PLAN_REPORT_LIMIT);
        assert!(usage.exceeded);
        assert!(!usage.unlimited);
        assert_eq!(usage.tier, None);
    }

    #[tokio::test]
    async fn missing_organizations_are_reported_as_not_found() {
        let db = Arc::new(MockDb::default());
        let missing = Uuid::new_v4();

        let m = meter(db);
        let err = m.usage_status(missing).await.unwrap_err();
        assert!(matches!(err, UsageError::OrganizationNotFound(id) if id == missing));

        let err = m.can_create_report(missing).await.unwrap_err();
        assert!(matches!(err, UsageError::OrganizationNotFound(_)));
    }

    #[tokio::test]
    async fn database_failures_propagate() {
        let db = Arc::new(MockDb {
            should_fail: true,
            ..Default::default()
        });

        let err = meter(db)
            .usage_status(Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, UsageError::Database(_)));
    }

    #[tokio::test]
    async fn payment_check_flags_orgs_at_their_limit() {
        let db = Arc::new(MockDb::default());
        let org = db.seed_organization("Shoreline Realty", "starter");
        let now = OffsetDateTime::now_utc();

        for _ in 0..5 {
            db.seed_report(org.id, ReportKind::AiValuation, ReportStatus::Ready, now);
        }
        for _ in 0..2 {
            db.seed_report(org.id, ReportKind::AiValuation, ReportStatus::Failed, now);
        }

        let m = meter(db);
        let check = m.check_usage_for_payment(org.id).await.unwrap();
        assert!(check.requires_payment);
        assert_eq!(check.usage.used, 5);
        assert_eq!(check.usage.remaining, Some(0));

        assert!(!m.can_create_report(org.id).await.unwrap());
    }

    #[tokio::test]
    async fn checks_are_read_only_and_idempotent() {
        let db = Arc::new(MockDb::default());
        let org = db.seed_organization("Shoreline Realty", "starter");
        let now = OffsetDateTime::now_utc();

        for _ in 0..2 {
            db.seed_report(org.id, ReportKind::AiValuation, ReportStatus::Ready, now);
        }

        let m = meter(db.clone());
        let first = m.usage_status(org.id).await.unwrap();
        m.can_create_report(org.id).await.unwrap();
        m.check_usage_for_payment(org.id).await.unwrap();
        let second = m.usage_status(org.id).await.unwrap();

        assert_eq!(first.used, second.used);
        assert_eq!(first.remaining, second.remaining);
        assert_eq!(db.report_requests.lock().unwrap().len(), 2);
    }
}
