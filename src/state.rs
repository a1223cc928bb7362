use crate::config::Config;
use crate::db::{
    organization_repository::OrganizationRepository, report_repository::ReportRepository,
};
use crate::services::stripe::StripeService;
use crate::usage::UsageMeter;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub organization_repo: Arc<dyn OrganizationRepository>,
    pub report_repo: Arc<dyn ReportRepository>,
    pub usage: UsageMeter,
    pub stripe: Arc<dyn StripeService>,
    pub config: Arc<Config>,
}
