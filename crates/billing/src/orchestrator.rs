//! Plan change orchestration
//!
//! Drives the [`transition`] reducer from user actions and talks to the
//! backend when a change is submitted. Upgrades are submitted as soon as the
//! user proceeds; downgrades wait for an explicit confirmation. A failed
//! submission is never retried automatically.

use chrono::{DateTime, Utc};
use swiftbot_shared::{PlanSelection, Subscription, UserId};
use tracing::{debug, info, warn};

use crate::backend::{PlanChangeRequest, PlanChangeResponse, SubscriptionBackend};
use crate::classifier::{ChangeClassification, PlanChange};
use crate::error::{BillingError, BillingResult};
use crate::messages::{self, Locale};
use crate::payment_failure::{self, ApiFailure};
use crate::plan_change::{
    transition, PlanChangeEvent, PlanChangeFailure, PlanChangeOutcome, PlanChangeState,
};

/// One change-plan dialog session for a user
pub struct PlanChangeSession<B> {
    backend: B,
    user_id: UserId,
    locale: Locale,
    state: PlanChangeState,
    next_billing_date: Option<DateTime<Utc>>,
}

impl<B: SubscriptionBackend> PlanChangeSession<B> {
    pub fn new(backend: B, user_id: UserId, locale: Locale) -> Self {
        Self {
            backend,
            user_id,
            locale,
            state: PlanChangeState::Idle,
            next_billing_date: None,
        }
    }

    pub fn state(&self) -> &PlanChangeState {
        &self.state
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn apply(&mut self, event: PlanChangeEvent) -> BillingResult<&PlanChangeState> {
        let event_name = event.name();
        let next = transition(&self.state, event)?;
        debug!(
            user_id = %self.user_id,
            event = event_name,
            from = self.state.name(),
            to = next.name(),
            "Plan change transition"
        );
        self.state = next;
        Ok(&self.state)
    }

    /// Open the dialog with the current plan pre-selected
    pub fn open(&mut self, current: PlanSelection) -> BillingResult<&PlanChangeState> {
        self.apply(PlanChangeEvent::Open { current })
    }

    /// Open the dialog for a loaded subscription
    pub fn open_for(&mut self, subscription: &Subscription) -> BillingResult<&PlanChangeState> {
        let current = subscription.current_plan()?;
        self.next_billing_date = subscription.next_billing_date;
        self.open(current)
    }

    /// Select a plan; returns how the change would be classified
    pub fn select(&mut self, proposed: PlanSelection) -> BillingResult<ChangeClassification> {
        self.apply(PlanChangeEvent::Select(proposed))?;
        self.state
            .change()
            .map(|change| change.classification)
            .ok_or_else(|| BillingError::Internal("selection produced no change".to_string()))
    }

    /// Upgrades are submitted right away; downgrades stop at confirmation
    pub async fn proceed(&mut self) -> BillingResult<&PlanChangeState> {
        self.apply(PlanChangeEvent::Proceed)?;

        if matches!(self.state, PlanChangeState::Upgrading { .. }) {
            self.apply(PlanChangeEvent::Submit)?;
            self.submit().await;
        }

        Ok(&self.state)
    }

    /// Second confirmation for a downgrade
    pub async fn confirm_downgrade(&mut self) -> BillingResult<&PlanChangeState> {
        self.apply(PlanChangeEvent::ConfirmDowngrade)?;
        self.submit().await;
        Ok(&self.state)
    }

    pub fn decline_downgrade(&mut self) -> BillingResult<&PlanChangeState> {
        self.apply(PlanChangeEvent::DeclineDowngrade)
    }

    /// Go back to the classified selection after a failure (e.g. once the card was updated)
    pub fn resubmit(&mut self) -> BillingResult<&PlanChangeState> {
        self.apply(PlanChangeEvent::Resubmit)
    }

    pub fn close(&mut self) -> BillingResult<&PlanChangeState> {
        self.apply(PlanChangeEvent::Close)
    }

    /// Text for the downgrade confirmation prompt
    pub fn downgrade_prompt(&self) -> String {
        messages::downgrade_confirmation(self.next_billing_date, self.locale)
    }

    async fn submit(&mut self) {
        let change = match &self.state {
            PlanChangeState::Submitting { change } => *change,
            _ => return,
        };

        let request = PlanChangeRequest {
            user_id: self.user_id,
            connections: change.proposed.connections,
            billing_period: change.proposed.billing_period,
            change_type: change.classification,
        };

        info!(
            user_id = %self.user_id,
            change_type = %change.classification,
            from = %change.current,
            to = %change.proposed,
            "Submitting plan change"
        );

        let event = match self.backend.change_plan(&request).await {
            Ok(response) if response.success => {
                PlanChangeEvent::Succeeded(self.outcome(&change, response).await)
            }
            Ok(response) => {
                let message = response
                    .error
                    .or(response.message)
                    .unwrap_or_else(|| "Plan change was not accepted".to_string());
                let failure = ApiFailure::new(message);
                PlanChangeEvent::Failed(self.failure(failure.kind(), failure.message))
            }
            Err(e) => PlanChangeEvent::Failed(self.failure(e.failure_kind(), e.user_message())),
        };

        // Submitting only accepts Succeeded/Failed, both produced above
        if let Err(e) = self.apply(event) {
            warn!(user_id = %self.user_id, error = %e, "Unexpected plan change transition error");
        }
    }

    async fn outcome(&self, change: &PlanChange, response: PlanChangeResponse) -> PlanChangeOutcome {
        // Reload so the caller sees the server's view of the change
        let subscription = match self.backend.fetch_subscription(self.user_id).await {
            Ok(sub) => Some(sub),
            Err(e) => {
                warn!(user_id = %self.user_id, error = %e, "Failed to reload subscription after plan change");
                None
            }
        };

        let amount_charged_cents = response.amount_charged_cents();
        let effective_date = response
            .effective_date
            .as_deref()
            .and_then(messages::parse_effective_date);

        let classification = change.classification;
        let message = match classification {
            ChangeClassification::Upgrade => {
                messages::upgrade_success(amount_charged_cents, self.locale)
            }
            ChangeClassification::Downgrade => {
                messages::downgrade_success(effective_date, self.locale)
            }
        };

        info!(
            user_id = %self.user_id,
            change_type = %classification,
            amount_charged_cents = ?amount_charged_cents,
            effective_date = ?effective_date,
            "Plan change accepted"
        );

        PlanChangeOutcome {
            classification,
            amount_charged_cents,
            effective_date,
            message,
            subscription,
        }
    }

    fn failure(&self, kind: payment_failure::FailureKind, message: String) -> PlanChangeFailure {
        warn!(
            user_id = %self.user_id,
            kind = ?kind,
            error = %message,
            "Plan change failed"
        );
        PlanChangeFailure { kind, message }
    }

    /// Message for the current failure: card-update prompt or the error text
    pub fn failure_message(&self) -> Option<String> {
        match &self.state {
            PlanChangeState::Failed { failure, .. } if failure.offers_card_update() => {
                Some(messages::payment_failure_prompt(self.locale).to_string())
            }
            PlanChangeState::Failed { failure, .. } => {
                Some(messages::generic_failure(&failure.message, self.locale))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CancelResponse;
    use crate::payment_failure::{FailureCode, FailureKind};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use swiftbot_shared::{BillingPeriod, Subscription, SubscriptionStatus};

    /// Backend double that records plan change requests
    struct MockBackend {
        reply: Mutex<Option<BillingResult<PlanChangeResponse>>>,
        requests: Mutex<Vec<PlanChangeRequest>>,
        reload_fails: bool,
    }

    impl MockBackend {
        fn replying(reply: BillingResult<PlanChangeResponse>) -> Self {
            Self {
                reply: Mutex::new(Some(reply)),
                requests: Mutex::new(Vec::new()),
                reload_fails: false,
            }
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl SubscriptionBackend for MockBackend {
        async fn fetch_subscription(&self, user_id: UserId) -> BillingResult<Subscription> {
            if self.reload_fails {
                return Err(BillingError::Transport("timeout".into()));
            }
            Ok(Subscription {
                user_id,
                status: SubscriptionStatus::Active,
                connections_purchased: 4,
                billing_period: BillingPeriod::Monthly,
                trial_start_date: None,
                trial_end_date: None,
                next_billing_date: None,
                canceled_at: None,
                affiliate_code: None,
                promotion_code: None,
                scheduled_connections: None,
                scheduled_billing_period: None,
                scheduled_change_date: None,
            })
        }

        async fn change_plan(
            &self,
            request: &PlanChangeRequest,
        ) -> BillingResult<PlanChangeResponse> {
            self.requests.lock().unwrap().push(request.clone());
            self.reply
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Err(BillingError::Internal("no reply queued".into())))
        }

        async fn cancel_subscription(
            &self,
            _user_id: UserId,
            _reason: Option<&str>,
        ) -> BillingResult<CancelResponse> {
            Ok(CancelResponse::default())
        }

        async fn cancel_scheduled_change(&self, _user_id: UserId) -> BillingResult<()> {
            Ok(())
        }
    }

    fn session(backend: MockBackend) -> PlanChangeSession<MockBackend> {
        PlanChangeSession::new(backend, UserId::new(), Locale::PtBr)
    }

    #[tokio::test]
    async fn test_upgrade_submits_immediately() {
        let backend = MockBackend::replying(Ok(PlanChangeResponse {
            success: true,
            amount_charged: Some(490.0),
            ..Default::default()
        }));
        let mut session = session(backend);

        session.open(PlanSelection::monthly(2).unwrap()).unwrap();
        let classification = session.select(PlanSelection::monthly(4).unwrap()).unwrap();
        assert_eq!(classification, ChangeClassification::Upgrade);

        let state = session.proceed().await.unwrap();
        match state {
            PlanChangeState::Success { outcome, .. } => {
                assert_eq!(outcome.amount_charged_cents, Some(49_000));
                assert!(outcome.message.contains("R$ 490,00"));
                assert!(outcome.subscription.is_some());
            }
            other => panic!("unexpected state {:?}", other),
        }

        let requests = session.backend().requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].connections, 4);
        assert_eq!(requests[0].change_type, ChangeClassification::Upgrade);
    }

    #[tokio::test]
    async fn test_downgrade_waits_for_confirmation() {
        let backend = MockBackend::replying(Ok(PlanChangeResponse {
            success: true,
            effective_date: Some("2026-11-01".into()),
            ..Default::default()
        }));
        let mut session = session(backend);

        session.open(PlanSelection::annual(5).unwrap()).unwrap();
        session.select(PlanSelection::annual(3).unwrap()).unwrap();

        let state = session.proceed().await.unwrap();
        assert_eq!(state.name(), "confirming_downgrade");
        assert_eq!(session.backend().request_count(), 0);

        let state = session.confirm_downgrade().await.unwrap();
        match state {
            PlanChangeState::Success { outcome, .. } => {
                assert_eq!(outcome.classification, ChangeClassification::Downgrade);
                assert!(outcome.message.contains("01/11/2026"));
            }
            other => panic!("unexpected state {:?}", other),
        }
        assert_eq!(session.backend().request_count(), 1);
    }

    #[tokio::test]
    async fn test_downgrade_with_unparsable_date_uses_fallback() {
        let backend = MockBackend::replying(Ok(PlanChangeResponse {
            success: true,
            effective_date: Some("soon".into()),
            ..Default::default()
        }));
        let mut session = session(backend);

        session.open(PlanSelection::monthly(4).unwrap()).unwrap();
        session.select(PlanSelection::monthly(1).unwrap()).unwrap();
        session.proceed().await.unwrap();
        let state = session.confirm_downgrade().await.unwrap();

        match state {
            PlanChangeState::Success { outcome, .. } => {
                assert!(outcome.effective_date.is_none());
                assert!(outcome.message.contains("próximo ciclo de cobrança"));
            }
            other => panic!("unexpected state {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_declined_card_offers_card_update() {
        let backend = MockBackend::replying(Err(BillingError::Api(ApiFailure::new(
            "Your card was declined",
        ))));
        let mut session = session(backend);

        session.open(PlanSelection::monthly(2).unwrap()).unwrap();
        session.select(PlanSelection::monthly(4).unwrap()).unwrap();
        let state = session.proceed().await.unwrap();

        match state {
            PlanChangeState::Failed { failure, .. } => {
                assert_eq!(failure.kind, FailureKind::Payment);
                assert!(failure.offers_card_update());
            }
            other => panic!("unexpected state {:?}", other),
        }
        assert!(session
            .failure_message()
            .unwrap()
            .contains("atualizar seu cartão"));
    }

    #[tokio::test]
    async fn test_generic_failure_is_surfaced_without_retry() {
        let backend = MockBackend::replying(Err(BillingError::Api(
            ApiFailure::new("Subscription is locked").with_code(FailureCode::Other),
        )));
        let mut session = session(backend);

        session.open(PlanSelection::monthly(2).unwrap()).unwrap();
        session.select(PlanSelection::monthly(4).unwrap()).unwrap();
        let state = session.proceed().await.unwrap();
        assert_eq!(state.name(), "failed");
        assert_eq!(
            session.failure_message().unwrap(),
            "Erro ao alterar o plano: Subscription is locked"
        );
        assert_eq!(session.backend().request_count(), 1);

        // User-initiated resubmission goes back to the classified selection
        let state = session.resubmit().unwrap();
        assert_eq!(state.name(), "classified");
    }

    #[tokio::test]
    async fn test_unsuccessful_body_is_a_failure() {
        let backend = MockBackend::replying(Ok(PlanChangeResponse {
            success: false,
            error: Some("Pagamento recusado".into()),
            ..Default::default()
        }));
        let mut session = session(backend);

        session.open(PlanSelection::monthly(2).unwrap()).unwrap();
        session.select(PlanSelection::monthly(3).unwrap()).unwrap();
        match session.proceed().await.unwrap() {
            PlanChangeState::Failed { failure, .. } => {
                assert_eq!(failure.message, "Pagamento recusado");
                assert!(failure.offers_card_update());
            }
            other => panic!("unexpected state {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_reload_failure_still_succeeds() {
        let mut backend = MockBackend::replying(Ok(PlanChangeResponse {
            success: true,
            ..Default::default()
        }));
        backend.reload_fails = true;
        let mut session = session(backend);

        session.open(PlanSelection::monthly(1).unwrap()).unwrap();
        session.select(PlanSelection::monthly(2).unwrap()).unwrap();
        match session.proceed().await.unwrap() {
            PlanChangeState::Success { outcome, .. } => {
                assert!(outcome.subscription.is_none());
                assert_eq!(outcome.message, "Plano atualizado com sucesso!");
            }
            other => panic!("unexpected state {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_open_for_subscription_uses_next_billing_date() {
        let backend = MockBackend::replying(Ok(PlanChangeResponse::default()));
        let mut sub = backend.fetch_subscription(UserId::new()).await.unwrap();
        sub.next_billing_date = Some(
            DateTime::parse_from_rfc3339("2026-11-05T10:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        );
        let mut session = session(backend);

        let state = session.open_for(&sub).unwrap();
        assert_eq!(
            state,
            &PlanChangeState::Selecting {
                current: PlanSelection::monthly(4).unwrap()
            }
        );
        assert!(session.downgrade_prompt().contains("05/11/2026"));
    }

    #[tokio::test]
    async fn test_proceed_with_unchanged_plan_is_an_error() {
        let mut session = session(MockBackend::replying(Ok(PlanChangeResponse::default())));
        session.open(PlanSelection::monthly(2).unwrap()).unwrap();
        session.select(PlanSelection::monthly(2).unwrap()).unwrap();

        let err = session.proceed().await.unwrap_err();
        assert!(matches!(err, BillingError::Transition(_)));
        assert_eq!(session.backend().request_count(), 0);
        assert_eq!(session.state().name(), "classified");
    }
}
