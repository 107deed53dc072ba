//! Payment endpoints.

use axum::{Json, Router, extract::State, routing::post};
use academy_common::AppResult;
use academy_core::{InitiatedPayment, PaymentQuote, PaymentService, VerifyResult};
use serde::Deserialize;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Initiate payment request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiatePaymentRequest {
    pub assignment_id: String,
    pub amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "GBP".to_string()
}

/// Open a provider checkout for an assignment. Succeeds without a
/// checkout URL when the provider is unavailable; the payment row and
/// reference still exist for support.
async fn initiate_payment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<InitiatePaymentRequest>,
) -> AppResult<ApiResponse<InitiatedPayment>> {
    let initiated = state
        .payment_service
        .initiate(&user, &req.assignment_id, req.amount, &req.currency)
        .await?;
    Ok(ApiResponse::ok(initiated))
}

/// Verify payment request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequest {
    pub tx_ref: String,
}

/// Reconcile a payment against the provider once.
async fn verify_payment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<VerifyPaymentRequest>,
) -> AppResult<ApiResponse<VerifyResult>> {
    let result = state.payment_service.verify(&user, &req.tx_ref).await?;
    Ok(ApiResponse::ok(result))
}

/// Long-poll verification until the payment settles, fails, or the
/// attempt cap is exhausted (`VERIFICATION_TIMEOUT`).
async fn poll_payment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<VerifyPaymentRequest>,
) -> AppResult<ApiResponse<VerifyResult>> {
    let result = state
        .payment_service
        .poll_until_settled(&user, &req.tx_ref)
        .await?;
    Ok(ApiResponse::ok(result))
}

/// Quote request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

/// Display-only fee breakdown for a checkout amount.
async fn quote_payment(
    AuthUser(_user): AuthUser,
    Json(req): Json<QuoteRequest>,
) -> AppResult<ApiResponse<PaymentQuote>> {
    Ok(ApiResponse::ok(PaymentService::quote(
        req.amount,
        &req.currency,
    )))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/initiate", post(initiate_payment))
        .route("/verify", post(verify_payment))
        .route("/poll", post(poll_payment))
        .route("/quote", post(quote_payment))
}
