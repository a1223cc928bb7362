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

use crate::models::report::ReportKind;
use crate::responses::JsonResponse;
use crate::services::stripe::{
    CheckoutLineItem, CheckoutMode, CreateCheckoutSessionRequest,
};
use crate::state::AppState;
use crate::usage::{UsageError, UsageStatus, QUOTA_EXCEEDED_ERROR};

#[derive(Deserialize)]
pub struct CreateReportPayload {
    pub subject_address: String,
    #[serde(default)]
    pub kind: Option<ReportKind>,
}

pub async fn create_report(
    State(state): State<AppState>,
    Path(organization_id): Path<Uuid>,
    Json(payload): Json<CreateReportPayload>,
) -> Response {
    let subject_address = payload.subject_address.trim();
    if subject_address.is_empty() {
        return JsonResponse::bad_request("Subject address is required").into_response();
    }

    let kind = payload.kind.unwrap_or(ReportKind::AiValuation);
    match kind {
        ReportKind::AiValuation => {
            let check = match state.usage.check_usage_for_payment(organization_id).await {
                Ok(check) => check,
                Err(UsageError::OrganizationNotFound(_)) => {
                    return JsonResponse::not_found("Organization not found").into_response()
                }
                Err(UsageError::Database(err)) => {
                    error!("failed to check report quota: {:?}", err);
                    return JsonResponse::server_error("Failed to create report").into_response();
                }
            };

            if check.requires_payment {
                return quota_exceeded_response(&state, organization_id, check.usage).await;
            }
        }
        // Appraisal orders are billed per order by the fulfillment desk and
        // do not draw on the monthly allowance.
        ReportKind::AppraisalOrder => {
            match state
                .organization_repo
                .find_organization(organization_id)
                .await
            {
                Ok(Some(_)) => {}
                Ok(None) => {
                    return JsonResponse::not_found("Organization not found").into_response()
                }
                Err(err) => {
                    error!("failed to load organization: {:?}", err);
                    return JsonResponse::server_error("Failed to create report").into_response();
                }
            }
        }
    }

    match state
        .report_repo
        .insert_report_request(organization_id, kind, subject_address)
        .await
    {
        Ok(report) => (
            StatusCode::CREATED,
            Json(json!({
                "success": true,
                "report": report,
            })),
        )
            .into_response(),
        Err(err) => {
            error!("failed to insert report request: {:?}", err);
            JsonResponse::server_error("Failed to create report").into_response()
        }
    }
}

/// Turns a quota denial into a single-report Stripe Checkout hand-off. The
/// report itself is not created; the frontend redirects to `checkout_url`.
async fn quota_exceeded_response(
    state: &AppState,
    organization_id: Uuid,
    usage: UsageStatus,
) -> Response {
    let frontend = state.config.frontend_origin.trim_end_matches('/');
    let req = CreateCheckoutSessionRequest {
        success_url: format!("{}/reports?checkout=success", frontend),
        cancel_url: format!("{}/reports?checkout=cancelled", frontend),
        mode: CheckoutMode::Payment,
        line_items: vec![CheckoutLineItem {
            price: state.config.stripe.report_price_id.clone(),
            quantity: 1,
        }],
        client_reference_id: Some(organization_id.to_string()),
        metadata: Some(
            [(
                "organization_id".to_string(),
                organization_id.to_string(),
            )]
            .into_iter()
            .collect(),
        ),
    };

    let session = match state.stripe.create_checkout_session(req).await {
        Ok(session) => session,
        Err(err) => {
            error!("failed to create checkout session: {:?}", err);
            return JsonResponse::server_error("Failed to start checkout").into_response();
        }
    };

    let checkout_url = match session.url {
        Some(url) => url,
        None => {
            error!("checkout session {} has no redirect url", session.id);
            return JsonResponse::server_error("Failed to start checkout").into_response();
        }
    };

    (
        StatusCode::PAYMENT_REQUIRED,
        Json(json!({
            "status": "error",
            "success": false,
            "message": "Monthly report limit reached for the current billing period",
            "code": QUOTA_EXCEEDED_ERROR,
            "usage": usage,
            "checkout_url": checkout_url,
        })),
    )
        .into_response()
}

pub async fn list_reports(
    State(state): State<AppState>,
    Path(organization_id): Path<Uuid>,
) -> Response {
    match state
        .organization_repo
        .find_organization(organization_id)
        .await
    {
        Ok(Some(_)) => {}
        Ok(None) => return JsonResponse::not_found("Organization not found").into_response(),
        Err(err) => {
            error!("failed to load organization: {:?}", err);
            return JsonResponse::server_error("Failed to list reports").into_response();
        }
    }

    match state.report_repo.list_report_requests(organization_id).await {
        Ok(reports) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "reports": reports,
            })),
        )
            .into_response(),
        Err(err) => {
            error!("failed to list report requests: {:?}", err);
            JsonResponse::server_error("Failed to list reports").into_response()
        }
    }
}

pub async fn get_report(
    State(state): State<AppState>,
    Path((organization_id, report_id)): Path<(Uuid, Uuid)>,
) -> Response {
    match state
        .report_repo
        .find_report_request(organization_id, report_id)
        .await
    {
        Ok(Some(report)) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "report": report,
            })),
        )
            .into_response(),
        Ok(None) => JsonResponse::not_found("Report not found").into_response(),
        Err(err) => {
            error!("failed to load report request: {:?}", err);
            JsonResponse::server_error("Failed to load report").into_response()
        }
    }
}
