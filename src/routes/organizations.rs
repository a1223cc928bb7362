use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::models::plan::PlanTier;
use crate::responses::JsonResponse;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateOrganizationPayload {
    pub name: String,
    /// New accounts start on the trial tier unless billing says otherwise.
    #[serde(default)]
    pub plan: Option<PlanTier>,
}

pub async fn create_organization(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrganizationPayload>,
) -> Response {
    let name = payload.name.trim();
    if name.is_empty() {
        return JsonResponse::bad_request("Organization name is required").into_response();
    }

    let plan = payload.plan.unwrap_or(PlanTier::Trial);
    match state
        .organization_repo
        .create_organization(name, plan.as_str())
        .await
    {
        Ok(organization) => (
            StatusCode::CREATED,
            Json(json!({
                "success": true,
                "organization": organization,
            })),
        )
            .into_response(),
        Err(err) => {
            error!("failed to create organization: {:?}", err);
            JsonResponse::server_error("Failed to create organization").into_response()
        }
    }
}

pub async fn get_organization(
    State(state): State<AppState>,
    Path(organization_id): Path<Uuid>,
) -> Response {
    match state
        .organization_repo
        .find_organization(organization_id)
        .await
    {
        Ok(Some(organization)) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "organization": organization,
            })),
        )
            .into_response(),
        Ok(None) => JsonResponse::not_found("Organization not found").into_response(),
        Err(err) => {
            error!("failed to load organization: {:?}", err);
            JsonResponse::server_error("Failed to load organization").into_response()
        }
    }
}
