//! Payment handlers

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use validator::Validate;

use domain_billing::Caller;

use crate::dto::payments::*;
use crate::dto::InvoiceQuery;
use crate::{error::ApiError, AppState};

/// Records a payment against an invoice
pub async fn record_payment(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    payload: Result<Json<RecordPaymentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PaymentResponse>), ApiError> {
    let Json(request) = payload?;
    request.validate()?;

    let payment = state.service.record_payment(&caller, request.into()).await?;
    Ok((StatusCode::CREATED, Json(payment.into())))
}

/// Lists the payments of an invoice
pub async fn list_payments(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    query: Result<Query<InvoiceQuery>, QueryRejection>,
) -> Result<Json<Vec<PaymentResponse>>, ApiError> {
    let Query(query) = query?;
    let invoice_id = query.require()?;
    let payments = state.service.list_payments(&caller, invoice_id).await?;
    Ok(Json(payments.into_iter().map(Into::into).collect()))
}
