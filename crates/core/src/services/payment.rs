//! Payment orchestration.
//!
//! Bridges local payment rows to an external collection provider whose
//! only contract is: given an amount and a reference, produce a checkout
//! URL; given a checkout id, report a coarse status. Reconciliation runs
//! through [`PaymentService::verify`]; the bounded poll loop in
//! [`PaymentService::poll_until_settled`] is the one sanctioned retry
//! mechanism in the core.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

use academy_common::{AppError, AppResult, IdGenerator, PaymentConfig};
use academy_db::entities::{payment, user};
use academy_db::repositories::{AssignmentRepository, PaymentRepository};

use crate::services::activity_log::{ActivityLogService, ActivityType, NewActivity};
use crate::services::lifecycle::LifecycleService;

pub use academy_db::entities::payment::PaymentStatus;

/// Coarse status a provider reports for a checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutStatus {
    Pending,
    Completed,
    Failed,
    Expired,
}

/// Everything a provider needs to open a checkout.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub amount: f64,
    pub currency: String,
    /// Local transaction reference, embedded in the checkout for
    /// reconciliation on return.
    pub reference: String,
    pub redirect_url: Option<String>,
    pub customer_name: String,
    pub customer_email: String,
}

/// A provider-side checkout session.
#[derive(Debug, Clone)]
pub struct Checkout {
    /// Provider-side identifier.
    pub id: String,
    /// URL the customer completes payment at.
    pub url: String,
}

/// Capability interface for payment collection. Any provider with these
/// two operations is substitutable.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Provider slug stored on payment rows.
    fn name(&self) -> &'static str;

    /// Open a checkout session.
    async fn create_checkout(&self, request: &CheckoutRequest) -> AppResult<Checkout>;

    /// Report the current status of a checkout session.
    async fn get_status(&self, checkout_id: &str) -> AppResult<CheckoutStatus>;
}

/// Wise pay-in-link adapter.
pub struct WiseProvider {
    http_client: reqwest::Client,
    token: String,
    profile_id: String,
    base_url: String,
}

const WISE_API_BASE: &str = "https://api.transferwise.com";
const WISE_SANDBOX_API_BASE: &str = "https://api.sandbox.transferwise.tech";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PayInLinkBody {
    amount: PayInAmount,
    reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect_url: Option<String>,
    customer: PayInCustomer,
}

#[derive(Serialize)]
struct PayInAmount {
    value: f64,
    currency: String,
}

#[derive(Serialize)]
struct PayInCustomer {
    name: String,
    email: String,
}

#[derive(Deserialize)]
struct PayInLinkResponse {
    id: String,
    url: String,
}

#[derive(Deserialize)]
struct PayInLinkStatusResponse {
    status: String,
}

impl WiseProvider {
    /// Build a provider from config. Returns `None` when credentials are
    /// missing; callers fall back to [`NoopProvider`].
    #[must_use]
    #[allow(clippy::expect_used)] // Client build only fails with incompatible TLS settings
    pub fn from_config(config: &PaymentConfig) -> Option<Self> {
        let token = config.api_token.clone()?;
        let profile_id = config.profile_id.clone()?;

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .expect("Failed to create HTTP client");

        Some(Self {
            http_client,
            token,
            profile_id,
            base_url: if config.sandbox {
                WISE_SANDBOX_API_BASE.to_string()
            } else {
                WISE_API_BASE.to_string()
            },
        })
    }
}

#[async_trait]
impl PaymentProvider for WiseProvider {
    fn name(&self) -> &'static str {
        "wise"
    }

    async fn create_checkout(&self, request: &CheckoutRequest) -> AppResult<Checkout> {
        let url = format!(
            "{}/v3/profiles/{}/pay-in-links",
            self.base_url, self.profile_id
        );

        let body = PayInLinkBody {
            amount: PayInAmount {
                value: request.amount,
                currency: request.currency.clone(),
            },
            reference: request.reference.clone(),
            redirect_url: request.redirect_url.clone(),
            customer: PayInCustomer {
                name: request.customer_name.clone(),
                email: request.customer_email.clone(),
            },
        };

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ProviderUnavailable(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::ProviderUnavailable(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let link: PayInLinkResponse = response
            .json()
            .await
            .map_err(|e| AppError::ProviderUnavailable(format!("Invalid response: {e}")))?;

        Ok(Checkout {
            id: link.id,
            url: link.url,
        })
    }

    async fn get_status(&self, checkout_id: &str) -> AppResult<CheckoutStatus> {
        let url = format!(
            "{}/v3/profiles/{}/pay-in-links/{checkout_id}",
            self.base_url, self.profile_id
        );

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| AppError::ProviderUnavailable(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::ProviderUnavailable(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let status: PayInLinkStatusResponse = response
            .json()
            .await
            .map_err(|e| AppError::ProviderUnavailable(format!("Invalid response: {e}")))?;

        Ok(match status.status.as_str() {
            "COMPLETED" => CheckoutStatus::Completed,
            "FAILED" => CheckoutStatus::Failed,
            "EXPIRED" => CheckoutStatus::Expired,
            _ => CheckoutStatus::Pending,
        })
    }
}

/// Provider used when no credentials are configured. Checkout creation
/// degrades (the payment row still exists); status checks report pending.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProvider;

#[async_trait]
impl PaymentProvider for NoopProvider {
    fn name(&self) -> &'static str {
        "wise"
    }

    async fn create_checkout(&self, _request: &CheckoutRequest) -> AppResult<Checkout> {
        Err(AppError::ProviderUnavailable(
            "payment provider not configured".to_string(),
        ))
    }

    async fn get_status(&self, _checkout_id: &str) -> AppResult<CheckoutStatus> {
        Ok(CheckoutStatus::Pending)
    }
}

/// Result of initiating a payment.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiatedPayment {
    pub payment_id: String,
    pub transaction_reference: String,
    /// Absent when the provider was unreachable or unconfigured; the UI
    /// directs the student to support with the reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout_url: Option<String>,
}

/// Three-state verification outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum VerifyStatus {
    Pending,
    Completed,
    Failed,
}

/// Result of one verification.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResult {
    pub payment_id: String,
    pub status: VerifyStatus,
}

/// Display-only fee breakdown for a checkout amount.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentQuote {
    pub source_amount: f64,
    pub currency: String,
    pub fee: f64,
    pub target_amount: f64,
}

/// Payment orchestrator.
#[derive(Clone)]
pub struct PaymentService {
    payment_repo: PaymentRepository,
    assignment_repo: AssignmentRepository,
    lifecycle: LifecycleService,
    activity_log: ActivityLogService,
    provider: Arc<dyn PaymentProvider>,
    config: PaymentConfig,
    id_gen: IdGenerator,
}

impl PaymentService {
    /// Create a new payment service.
    #[must_use]
    pub fn new(
        payment_repo: PaymentRepository,
        assignment_repo: AssignmentRepository,
        lifecycle: LifecycleService,
        activity_log: ActivityLogService,
        provider: Arc<dyn PaymentProvider>,
        config: PaymentConfig,
    ) -> Self {
        Self {
            payment_repo,
            assignment_repo,
            lifecycle,
            activity_log,
            provider,
            config,
            id_gen: IdGenerator::new(),
        }
    }

    /// Open a checkout for an assignment.
    ///
    /// The pending payment row is written before the provider is
    /// contacted, so a provider outage still leaves an auditable local
    /// record; in that case no checkout URL is returned and the call still
    /// succeeds.
    pub async fn initiate(
        &self,
        user: &user::Model,
        assignment_id: &str,
        amount: f64,
        currency: &str,
    ) -> AppResult<InitiatedPayment> {
        let assignment = self.assignment_repo.get_by_id(assignment_id).await?;
        if assignment.user_id != user.id {
            return Err(AppError::AssignmentNotFound(assignment_id.to_string()));
        }

        let tx_ref = self
            .id_gen
            .generate_transaction_reference(&user.id, assignment_id);

        let model = payment::ActiveModel {
            id: Set(self.id_gen.generate()),
            assignment_id: Set(assignment_id.to_string()),
            user_id: Set(user.id.clone()),
            amount: Set(amount),
            currency: Set(currency.to_string()),
            provider: Set(self.provider.name().to_string()),
            transaction_reference: Set(tx_ref.clone()),
            provider_transaction_id: Set(None),
            status: Set(PaymentStatus::Pending),
            metadata: Set(None),
            created_at: Set(chrono::Utc::now().into()),
            completed_at: Set(None),
        };
        let payment = self.payment_repo.create(model).await?;

        let request = CheckoutRequest {
            amount,
            currency: currency.to_string(),
            reference: tx_ref.clone(),
            redirect_url: self
                .config
                .redirect_url
                .as_ref()
                .map(|origin| format!("{origin}?tx_ref={tx_ref}")),
            customer_name: user.name.clone(),
            customer_email: user.email.clone(),
        };

        let checkout = match self.provider.create_checkout(&request).await {
            Ok(checkout) => Some(checkout),
            Err(e) => {
                // Degraded flow, not a failure of initiate: the payment row
                // stands and the student is pointed at support.
                tracing::warn!(error = %e, reference = %tx_ref, "checkout creation failed");
                None
            }
        };

        if let Some(checkout) = &checkout {
            let update = payment::ActiveModel {
                provider_transaction_id: Set(Some(checkout.id.clone())),
                metadata: Set(Some(serde_json::json!({ "checkoutUrl": checkout.url }))),
                ..Default::default()
            };
            self.payment_repo
                .update_if_status(&payment.id, PaymentStatus::Pending, update)
                .await?;
        }

        self.activity_log
            .record(
                NewActivity::new(
                    ActivityType::PaymentInitiated,
                    format!(
                        "Payment initiated. {amount:.2} {currency}. Provider: {}",
                        checkout
                            .as_ref()
                            .map_or("unconfigured", |checkout| checkout.id.as_str())
                    ),
                )
                .user(&user.id)
                .assignment(assignment_id)
                .payment(&payment.id),
            )
            .await?;

        Ok(InitiatedPayment {
            payment_id: payment.id,
            transaction_reference: tx_ref,
            checkout_url: checkout.map(|checkout| checkout.url),
        })
    }

    /// Reconcile one payment against the provider.
    ///
    /// Idempotent on terminal states: an already-completed payment
    /// short-circuits without a provider call (after re-driving the
    /// assignment advance in case an earlier crash left it behind), and a
    /// redundant concurrent poll loses the conditional update and changes
    /// nothing.
    pub async fn verify(&self, user: &user::Model, tx_ref: &str) -> AppResult<VerifyResult> {
        let payment = self.payment_repo.get_by_reference(tx_ref).await?;
        if payment.user_id != user.id && !user.is_admin() {
            return Err(AppError::Forbidden("not your payment".to_string()));
        }

        if payment.status == PaymentStatus::Completed {
            self.reconcile_assignment(&payment).await?;
            return Ok(VerifyResult {
                payment_id: payment.id,
                status: VerifyStatus::Completed,
            });
        }

        if payment.status.is_terminal() {
            return Ok(VerifyResult {
                payment_id: payment.id,
                status: VerifyStatus::Failed,
            });
        }

        // No provider-side checkout means nothing to ask; stays pending
        let Some(provider_id) = payment.provider_transaction_id.clone() else {
            return Ok(VerifyResult {
                payment_id: payment.id,
                status: VerifyStatus::Pending,
            });
        };

        let provider_status = match self.provider.get_status(&provider_id).await {
            Ok(status) => status,
            Err(e) => {
                // A flaky provider must not fail the poll loop; report the
                // status unchanged and let the next poll retry.
                tracing::warn!(error = %e, reference = %tx_ref, "provider status check failed");
                return Ok(VerifyResult {
                    payment_id: payment.id,
                    status: VerifyStatus::Pending,
                });
            }
        };

        match provider_status {
            CheckoutStatus::Completed => {
                let update = payment::ActiveModel {
                    status: Set(PaymentStatus::Completed),
                    completed_at: Set(Some(chrono::Utc::now().into())),
                    provider_transaction_id: Set(Some(provider_id)),
                    ..Default::default()
                };
                self.payment_repo
                    .update_if_status(&payment.id, payment.status, update)
                    .await?;

                // Advance the assignment and append the single completion
                // audit entry; idempotent if a concurrent poll already did.
                self.reconcile_assignment(&payment).await?;

                Ok(VerifyResult {
                    payment_id: payment.id,
                    status: VerifyStatus::Completed,
                })
            }
            CheckoutStatus::Failed | CheckoutStatus::Expired => {
                let update = payment::ActiveModel {
                    status: Set(PaymentStatus::Failed),
                    ..Default::default()
                };
                let won = self
                    .payment_repo
                    .update_if_status(&payment.id, payment.status, update)
                    .await?;

                if won {
                    self.activity_log
                        .record(
                            NewActivity::new(
                                ActivityType::PaymentFailed,
                                format!("Payment failed at provider. Reference: {tx_ref}"),
                            )
                            .user(&payment.user_id)
                            .assignment(&payment.assignment_id)
                            .payment(&payment.id),
                        )
                        .await?;
                }

                Ok(VerifyResult {
                    payment_id: payment.id,
                    status: VerifyStatus::Failed,
                })
            }
            CheckoutStatus::Pending => Ok(VerifyResult {
                payment_id: payment.id,
                status: VerifyStatus::Pending,
            }),
        }
    }

    /// Drive the assignment forward for a completed payment.
    ///
    /// The assignment's `payment_id` is the sole authoritative link: if it
    /// already settled through a different payment, this duplicate intent
    /// is ignored rather than surfaced as an error.
    async fn reconcile_assignment(&self, payment: &payment::Model) -> AppResult<()> {
        match self
            .lifecycle
            .confirm_payment(&payment.assignment_id, &payment.id)
            .await
        {
            Ok(_) => Ok(()),
            Err(AppError::InvalidTransition(_)) => {
                tracing::warn!(
                    payment_id = %payment.id,
                    assignment_id = %payment.assignment_id,
                    "completed payment not linked; assignment settled through another intent"
                );
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Poll [`Self::verify`] on a fixed interval up to a hard cap,
    /// stopping immediately on any terminal result.
    ///
    /// Exhausting the cap yields [`AppError::VerificationTimeout`] with
    /// the payment left pending: a verification timeout is not a payment
    /// failure and the two are surfaced differently. Callers cancel by
    /// dropping the future; no background task is involved.
    pub async fn poll_until_settled(
        &self,
        user: &user::Model,
        tx_ref: &str,
    ) -> AppResult<VerifyResult> {
        let interval = Duration::from_secs(self.config.poll_interval_secs);
        let max_attempts = self.config.poll_max_attempts.max(1);

        let mut last = None;
        for attempt in 1..=max_attempts {
            let result = self.verify(user, tx_ref).await?;
            match result.status {
                VerifyStatus::Completed | VerifyStatus::Failed => return Ok(result),
                VerifyStatus::Pending => last = Some(result),
            }

            if attempt < max_attempts && !interval.is_zero() {
                tokio::time::sleep(interval).await;
            }
        }

        let mut entry = NewActivity::new(
            ActivityType::PaymentTimeout,
            format!(
                "Payment verification timed out after {max_attempts} attempts. Reference: {tx_ref}"
            ),
        )
        .user(&user.id);
        if let Some(result) = last {
            entry = entry.payment(&result.payment_id);
        }
        self.activity_log.record(entry).await?;

        Err(AppError::VerificationTimeout(tx_ref.to_string()))
    }

    /// Display-only fee breakdown: flat 0.5% fee, same currency.
    #[must_use]
    pub fn quote(amount: f64, currency: &str) -> PaymentQuote {
        PaymentQuote {
            source_amount: amount,
            currency: currency.to_string(),
            fee: round2(amount * 0.005),
            target_amount: round2(amount * 0.995),
        }
    }

    /// Admin listing of payments.
    pub async fn list(
        &self,
        status: Option<PaymentStatus>,
        limit: u64,
    ) -> AppResult<Vec<payment::Model>> {
        self.payment_repo.list(status, limit).await
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use academy_db::entities::{activity_log, assignment};
    use academy_db::repositories::ActivityLogRepository;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::atomic::{AtomicU32, Ordering};

    struct StubProvider {
        status: CheckoutStatus,
        status_calls: AtomicU32,
    }

    impl StubProvider {
        fn new(status: CheckoutStatus) -> Self {
            Self {
                status,
                status_calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl PaymentProvider for StubProvider {
        fn name(&self) -> &'static str {
            "stub"
        }

        async fn create_checkout(&self, _request: &CheckoutRequest) -> AppResult<Checkout> {
            Ok(Checkout {
                id: "stub-checkout-1".to_string(),
                url: "https://pay.example/stub-checkout-1".to_string(),
            })
        }

        async fn get_status(&self, _checkout_id: &str) -> AppResult<CheckoutStatus> {
            self.status_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.status)
        }
    }

    fn test_user(id: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            token: None,
            role: user::UserRole::User,
            region: None,
            country: None,
            school_level: None,
            department: None,
            created_at: Utc::now().into(),
            last_login: None,
        }
    }

    fn test_payment(id: &str, status: PaymentStatus) -> payment::Model {
        payment::Model {
            id: id.to_string(),
            assignment_id: "a1".to_string(),
            user_id: "user1".to_string(),
            amount: 24.0,
            currency: "GBP".to_string(),
            provider: "stub".to_string(),
            transaction_reference: "ACA-user1-a1-1700000000000-abcdef".to_string(),
            provider_transaction_id: Some("stub-checkout-1".to_string()),
            status,
            metadata: None,
            created_at: Utc::now().into(),
            completed_at: None,
        }
    }

    fn test_assignment(status: assignment::AssignmentStatus) -> assignment::Model {
        assignment::Model {
            id: "a1".to_string(),
            user_id: "user1".to_string(),
            user_name: Some("Alice".to_string()),
            user_email: Some("alice@example.com".to_string()),
            assignment_type: "Essay".to_string(),
            course_name: "History".to_string(),
            class_name: "HIST-101".to_string(),
            teacher_name: "Dr. Jones".to_string(),
            due_date: Utc::now().into(),
            platform: "email".to_string(),
            platform_contact: "alice@example.com".to_string(),
            description: None,
            files: serde_json::json!([]),
            status,
            payment_amount: Some(24.0),
            payment_currency: Some("GBP".to_string()),
            complexity: Some("low".to_string()),
            estimated_hours: Some(2),
            payment_id: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn test_log_row() -> activity_log::Model {
        activity_log::Model {
            id: "log1".to_string(),
            event_type: ActivityType::PaymentTimeout,
            user_id: Some("user1".to_string()),
            user_name: None,
            user_email: None,
            assignment_id: None,
            payment_id: Some("p1".to_string()),
            description: "test".to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn service_with(
        db: Arc<sea_orm::DatabaseConnection>,
        provider: Arc<dyn PaymentProvider>,
        config: PaymentConfig,
    ) -> PaymentService {
        let activity_log = ActivityLogService::new(ActivityLogRepository::new(Arc::clone(&db)));
        let lifecycle = LifecycleService::new(
            AssignmentRepository::new(Arc::clone(&db)),
            PaymentRepository::new(Arc::clone(&db)),
            activity_log.clone(),
        );
        PaymentService::new(
            PaymentRepository::new(Arc::clone(&db)),
            AssignmentRepository::new(db),
            lifecycle,
            activity_log,
            provider,
            config,
        )
    }

    fn fast_config(max_attempts: u32) -> PaymentConfig {
        PaymentConfig {
            poll_interval_secs: 0,
            poll_max_attempts: max_attempts,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn verify_completed_payment_short_circuits() {
        let mut completed = test_payment("p1", PaymentStatus::Completed);
        completed.completed_at = Some(Utc::now().into());

        let mut submitted = test_assignment(assignment::AssignmentStatus::Submitted);
        submitted.payment_id = Some("p1".to_string());

        // Exactly two query results: the payment lookup and the assignment
        // no-op check. Any provider call, update or log append would hit
        // the stub counter or an exhausted mock.
        let provider = Arc::new(StubProvider::new(CheckoutStatus::Pending));
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[completed.clone()]])
                .append_query_results([[submitted]])
                .into_connection(),
        );

        let service = service_with(db, Arc::clone(&provider) as Arc<dyn PaymentProvider>, fast_config(120));
        let user = test_user("user1");

        let result = service
            .verify(&user, &completed.transaction_reference)
            .await
            .unwrap();

        assert_eq!(result.status, VerifyStatus::Completed);
        assert_eq!(provider.status_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn verify_twice_on_completed_is_idempotent() {
        let mut completed = test_payment("p1", PaymentStatus::Completed);
        completed.completed_at = Some(Utc::now().into());

        let mut submitted = test_assignment(assignment::AssignmentStatus::Submitted);
        submitted.payment_id = Some("p1".to_string());

        let provider = Arc::new(StubProvider::new(CheckoutStatus::Pending));
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[completed.clone()]])
                .append_query_results([[submitted.clone()]])
                .append_query_results([[completed.clone()]])
                .append_query_results([[submitted]])
                .into_connection(),
        );

        let service = service_with(db, Arc::clone(&provider) as Arc<dyn PaymentProvider>, fast_config(120));
        let user = test_user("user1");

        let first = service
            .verify(&user, &completed.transaction_reference)
            .await
            .unwrap();
        let second = service
            .verify(&user, &completed.transaction_reference)
            .await
            .unwrap();

        assert_eq!(first.status, second.status);
        // No provider calls and no appended audit entries either time
        assert_eq!(provider.status_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn verify_unknown_reference_is_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<payment::Model>::new()])
                .into_connection(),
        );

        let service = service_with(
            db,
            Arc::new(StubProvider::new(CheckoutStatus::Pending)),
            fast_config(120),
        );

        let result = service.verify(&test_user("user1"), "ACA-missing").await;

        assert!(matches!(result, Err(AppError::PaymentNotFound(_))));
    }

    #[tokio::test]
    async fn verify_forbids_other_users() {
        let pending = test_payment("p1", PaymentStatus::Pending);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[pending.clone()]])
                .into_connection(),
        );

        let service = service_with(
            db,
            Arc::new(StubProvider::new(CheckoutStatus::Pending)),
            fast_config(120),
        );

        let result = service
            .verify(&test_user("intruder"), &pending.transaction_reference)
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn poll_exhausts_cap_into_verification_timeout() {
        let pending = test_payment("p1", PaymentStatus::Pending);
        let provider = Arc::new(StubProvider::new(CheckoutStatus::Pending));

        let mut mock = MockDatabase::new(DatabaseBackend::Postgres);
        for _ in 0..120 {
            mock = mock.append_query_results([[pending.clone()]]);
        }
        // Timeout audit entry append
        mock = mock.append_query_results([[test_log_row()]]);
        mock = mock.append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }]);

        let db = Arc::new(mock.into_connection());
        let service = service_with(db, Arc::clone(&provider) as Arc<dyn PaymentProvider>, fast_config(120));
        let user = test_user("user1");

        let result = service
            .poll_until_settled(&user, &pending.transaction_reference)
            .await;

        assert!(matches!(result, Err(AppError::VerificationTimeout(_))));
        // Stopped exactly at the cap
        assert_eq!(provider.status_calls.load(Ordering::SeqCst), 120);
    }

    #[tokio::test]
    async fn poll_stops_on_failed() {
        let pending = test_payment("p1", PaymentStatus::Pending);
        let provider = Arc::new(StubProvider::new(CheckoutStatus::Expired));

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[pending.clone()]])
                .append_query_results([[test_log_row()]])
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1, // payment -> failed
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                ])
                .into_connection(),
        );

        let service = service_with(db, Arc::clone(&provider) as Arc<dyn PaymentProvider>, fast_config(120));
        let user = test_user("user1");

        let result = service
            .poll_until_settled(&user, &pending.transaction_reference)
            .await
            .unwrap();

        assert_eq!(result.status, VerifyStatus::Failed);
        // One provider call, then the loop stopped
        assert_eq!(provider.status_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn quote_applies_half_percent_fee() {
        let quote = PaymentService::quote(100.0, "GBP");
        assert_eq!(quote.fee, 0.5);
        assert_eq!(quote.target_amount, 99.5);
        assert_eq!(quote.currency, "GBP");

        let quote = PaymentService::quote(33.33, "GBP");
        assert_eq!(quote.fee, 0.17);
        assert_eq!(quote.target_amount, 33.16);
    }
}
