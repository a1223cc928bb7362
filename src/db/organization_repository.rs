use async_trait::async_trait;
use uuid::Uuid;

use crate::models::organization::Organization;

#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    async fn create_organization(
        &self,
        name: &str,
        plan: &str,
    ) -> Result<Organization, sqlx::Error>;

    async fn find_organization(
        &self,
        organization_id: Uuid,
    ) -> Result<Option<Organization>, sqlx::Error>;

    /// Raw plan string as stored, or `None` when the organization does not
    /// exist.
    async fn get_plan(&self, organization_id: Uuid) -> Result<Option<String>, sqlx::Error>;
}
