use crate::config::{
    DEFAULT_PROFESSIONAL_MONTHLY_REPORT_LIMIT, DEFAULT_STARTER_MONTHLY_REPORT_LIMIT,
};

/// Sentinel meaning "no monthly report cap" for a tier.
pub const UNLIMITED_REPORTS: i64 = -1;

/// Limit applied when a stored plan string cannot be recognized. Matches the
/// smallest paid tier so a malformed plan never grants extra capacity.
pub const DEFAULT_PLAN_REPORT_LIMIT: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizedPlanTier {
    Trial,
    Starter,
    Professional,
    Enterprise,
}

impl NormalizedPlanTier {
    /// Parses the plan strings the billing system has stored over time,
    /// e.g. "Professional", "professional:annual", "starter_v2".
    /// Returns `None` for anything unrecognized.
    pub fn from_option(raw: Option<&str>) -> Option<Self> {
        let normalized = raw.unwrap_or_default().trim().to_lowercase();
        if normalized.is_empty() {
            return None;
        }

        let key = normalized
            .split([':', '-', '_', ' ', '/', '.'])
            .next()
            .unwrap_or(normalized.as_str());

        match key {
            "trial" | "free" | "demo" => Some(Self::Trial),
            "starter" | "basic" | "solo" | "individual" => Some(Self::Starter),
            "professional" | "pro" | "team" | "business" => Some(Self::Professional),
            "enterprise" | "unlimited" => Some(Self::Enterprise),
            _ => {
                if normalized.contains("enterprise") {
                    Some(Self::Enterprise)
                } else if normalized.contains("professional") {
                    Some(Self::Professional)
                } else {
                    None
                }
            }
        }
    }

    pub fn is_trial(self) -> bool {
        matches!(self, Self::Trial)
    }
}

/// Per-tier monthly report caps, resolved once at startup and shared
/// read-only after that.
#[derive(Debug, Clone, Copy)]
pub struct PlanLimits {
    pub starter_monthly_reports: i64,
    pub professional_monthly_reports: i64,
}

impl Default for PlanLimits {
    fn default() -> Self {
        Self {
            starter_monthly_reports: DEFAULT_STARTER_MONTHLY_REPORT_LIMIT,
            professional_monthly_reports: DEFAULT_PROFESSIONAL_MONTHLY_REPORT_LIMIT,
        }
    }
}

impl PlanLimits {
    /// Monthly report cap for an already-normalized tier. Trial accounts get
    /// the starter allowance, enterprise is uncapped, and `None` (an
    /// unrecognized stored value) falls back to [`DEFAULT_PLAN_REPORT_LIMIT`].
    pub fn limit_for_tier(&self, tier: Option<NormalizedPlanTier>) -> i64 {
        match tier {
            Some(NormalizedPlanTier::Trial) | Some(NormalizedPlanTier::Starter) => {
                self.starter_monthly_reports
            }
            Some(NormalizedPlanTier::Professional) => self.professional_monthly_reports,
            Some(NormalizedPlanTier::Enterprise) => UNLIMITED_REPORTS,
            None => DEFAULT_PLAN_REPORT_LIMIT,
        }
    }

    pub fn monthly_report_limit(&self, raw_plan: Option<&str>) -> i64 {
        self.limit_for_tier(NormalizedPlanTier::from_option(raw_plan))
    }
}
