use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::organization::Organization;

use super::organization_repository::OrganizationRepository;

pub struct PostgresOrganizationRepository {
    pub pool: PgPool,
}

#[async_trait]
impl OrganizationRepository for PostgresOrganizationRepository {
    async fn create_organization(
        &self,
        name: &str,
        plan: &str,
    ) -> Result<Organization, sqlx::Error> {
        let result = sqlx::query_as::<_, Organization>(
            r#"
            INSERT INTO organizations (name, plan, created_at, updated_at)
            VALUES ($1, $2, now(), now())
            RETURNING id, name, plan, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(plan)
        .fetch_one(&self.pool)
        .await?;

        Ok(result)
    }

    async fn find_organization(
        &self,
        organization_id: Uuid,
    ) -> Result<Option<Organization>, sqlx::Error> {
        let result = sqlx::query_as::<_, Organization>(
            r#"
            SELECT id, name, plan, created_at, updated_at
            FROM organizations
            WHERE id = $1
            "#,
        )
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(result)
    }

    async fn get_plan(&self, organization_id: Uuid) -> Result<Option<String>, sqlx::Error> {
        let plan = sqlx::query_scalar::<_, String>(
            r#"
            SELECT plan FROM organizations WHERE id = $1
            "#,
        )
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(plan)
    }
}
