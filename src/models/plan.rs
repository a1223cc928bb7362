use serde::{Deserialize, Serialize};

use crate::utils::plan_limits::NormalizedPlanTier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    Trial,
    Starter,
    Professional,
    Enterprise,
}

impl PlanTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Trial => "trial",
            PlanTier::Starter => "starter",
            PlanTier::Professional => "professional",
            PlanTier::Enterprise => "enterprise",
        }
    }
}

impl From<NormalizedPlanTier> for PlanTier {
    fn from(value: NormalizedPlanTier) -> Self {
        match value {
            NormalizedPlanTier::Trial => PlanTier::Trial,
            NormalizedPlanTier::Starter => PlanTier::Starter,
            NormalizedPlanTier::Professional => PlanTier::Professional,
            NormalizedPlanTier::Enterprise => PlanTier::Enterprise,
        }
    }
}
