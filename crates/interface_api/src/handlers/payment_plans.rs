//! Payment plan handlers

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use validator::Validate;

use core_kernel::InstallmentId;
use domain_billing::Caller;

use crate::dto::payment_plans::*;
use crate::dto::InvoiceQuery;
use crate::{error::ApiError, AppState};

/// Lists the installments of an invoice
pub async fn list_plans(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    query: Result<Query<InvoiceQuery>, QueryRejection>,
) -> Result<Json<Vec<PaymentPlanResponse>>, ApiError> {
    let Query(query) = query?;
    let invoice_id = query.require()?;
    let plans = state.service.list(&caller, invoice_id).await?;
    Ok(Json(plans.into_iter().map(Into::into).collect()))
}

/// Schedules a new installment
pub async fn create_plan(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    payload: Result<Json<CreatePaymentPlanRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PaymentPlanResponse>), ApiError> {
    caller.require_plan_manager()?;
    let Json(request) = payload?;
    request.validate()?;

    let input = request
        .into_input()
        .ok_or_else(|| ApiError::Validation("Missing fields".to_string()))?;
    let created = state.service.create(&caller, input).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Edits an installment
pub async fn update_plan(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdatePaymentPlanRequest>, JsonRejection>,
) -> Result<Json<PaymentPlanResponse>, ApiError> {
    caller.require_plan_manager()?;
    let Path(id) = path?;
    let Json(request) = payload?;
    request.validate()?;

    let updated = state
        .service
        .update(&caller, InstallmentId::new(id), request.into())
        .await?;
    Ok(Json(updated.into()))
}

/// Deletes an installment
pub async fn delete_plan(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let Path(id) = path?;
    state.service.delete(&caller, InstallmentId::new(id)).await?;
    Ok(Json(DeleteResponse { success: true }))
}

/// Audit trail of an installment
pub async fn list_logs(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Vec<AuditLogResponse>>, ApiError> {
    let Path(id) = path?;
    let entries = state.service.audit_log(&caller, InstallmentId::new(id)).await?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}

/// Every installment across all invoices
pub async fn list_all_plans(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<PaymentPlanSummaryResponse>>, ApiError> {
    let plans = state.service.list_all(&caller).await?;
    Ok(Json(plans.into_iter().map(Into::into).collect()))
}

/// Runs a reconciliation pass for one invoice
pub async fn reconcile(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    query: Result<Query<InvoiceQuery>, QueryRejection>,
) -> Result<Json<ReconcileResponse>, ApiError> {
    caller.require_plan_manager()?;
    let Query(query) = query?;
    let invoice_id = query.require()?;
    let report = state.service.reconcile(&caller, invoice_id).await?;
    Ok(Json(report.into()))
}
