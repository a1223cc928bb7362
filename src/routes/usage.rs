use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::responses::JsonResponse;
use crate::state::AppState;
use crate::usage::UsageError;

pub async fn get_usage(
    State(state): State<AppState>,
    Path(organization_id): Path<Uuid>,
) -> Response {
    match state.usage.usage_status(organization_id).await {
        Ok(usage) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "usage": usage,
            })),
        )
            .into_response(),
        Err(UsageError::OrganizationNotFound(_)) => {
            JsonResponse::not_found("Organization not found").into_response()
        }
        Err(UsageError::Database(err)) => {
            error!("failed to load report usage: {:?}", err);
            JsonResponse::server_error("Failed to load report usage").into_response()
        }
    }
}

pub async fn check_payment(
    State(state): State<AppState>,
    Path(organization_id): Path<Uuid>,
) -> Response {
    match state.usage.check_usage_for_payment(organization_id).await {
        Ok(check) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "requires_payment": check.requires_payment,
                "usage": check.usage,
            })),
        )
            .into_response(),
        Err(UsageError::OrganizationNotFound(_)) => {
            JsonResponse::not_found("Organization not found").into_response()
        }
        Err(UsageError::Database(err)) => {
            error!("failed to check payment requirement: {:?}", err);
            JsonResponse::server_error("Failed to check payment requirement").into_response()
        }
    }
}
