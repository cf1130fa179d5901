//! Subscription endpoints
//!
//! Reads go through Supabase REST; writes go through the SwiftBot API, which
//! owns proration and downgrade scheduling.

use async_trait::async_trait;
use serde::Serialize;
use swiftbot_billing::{
    BillingResult, CancelResponse, PlanChangeRequest, PlanChangeResponse, SubscriptionBackend,
};
use swiftbot_shared::{Subscription, UserId};
use tracing::info;

use crate::account::AccountClient;
use crate::http::Ack;

pub(crate) const SUBSCRIPTION_UPGRADE: &str = "/api/subscription/upgrade";
pub(crate) const SUBSCRIPTION_CANCEL: &str = "/api/subscription/cancel";
pub(crate) const SUBSCRIPTION_CANCEL_CHANGE: &str = "/api/subscription/cancel-change";

#[derive(Debug, Serialize)]
struct CancelRequest<'a> {
    user_id: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct UserRequest {
    user_id: UserId,
}

#[async_trait]
impl SubscriptionBackend for AccountClient {
    async fn fetch_subscription(&self, user_id: UserId) -> BillingResult<Subscription> {
        Ok(self.supabase()?.fetch_subscription(user_id).await?)
    }

    async fn change_plan(&self, request: &PlanChangeRequest) -> BillingResult<PlanChangeResponse> {
        Ok(self.api().post(SUBSCRIPTION_UPGRADE, request).await?)
    }

    async fn cancel_subscription(
        &self,
        user_id: UserId,
        reason: Option<&str>,
    ) -> BillingResult<CancelResponse> {
        let response: CancelResponse = self
            .api()
            .post(SUBSCRIPTION_CANCEL, &CancelRequest { user_id, reason })
            .await?;
        info!(
            user_id = %user_id,
            access_until = ?response.access_until,
            "Subscription canceled"
        );
        Ok(response)
    }

    async fn cancel_scheduled_change(&self, user_id: UserId) -> BillingResult<()> {
        let _: Ack = self
            .api()
            .post(SUBSCRIPTION_CANCEL_CHANGE, &UserRequest { user_id })
            .await?;
        info!(user_id = %user_id, "Scheduled plan change canceled");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;
    use swiftbot_billing::{
        BillingError, ChangeClassification, FailureKind, Locale, PlanChangeSession,
        PlanChangeState,
    };
    use swiftbot_shared::{BillingPeriod, PlanSelection};

    fn client(server: &mockito::ServerGuard) -> AccountClient {
        AccountClient::with_base_url(server.url(), "tok")
    }

    #[tokio::test]
    async fn test_change_plan_posts_request() {
        let mut server = mockito::Server::new_async().await;
        let user_id = UserId::new();
        let mock = server
            .mock("POST", SUBSCRIPTION_UPGRADE)
            .match_header("authorization", "Bearer tok")
            .match_body(Matcher::PartialJson(json!({
                "user_id": user_id.to_string(),
                "connections": 5,
                "billing_period": "monthly",
                "change_type": "upgrade"
            })))
            .with_status(200)
            .with_body(
                json!({ "success": true, "change_type": "upgrade", "amount_charged": 245.5 })
                    .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let response = client(&server)
            .change_plan(&PlanChangeRequest {
                user_id,
                connections: 5,
                billing_period: BillingPeriod::Monthly,
                change_type: ChangeClassification::Upgrade,
            })
            .await
            .unwrap();

        assert!(response.success);
        assert_eq!(response.amount_charged_cents(), Some(24_550));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_change_plan_error_keeps_failure_code() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", SUBSCRIPTION_UPGRADE)
            .with_status(402)
            .with_body(
                json!({ "error": "Não foi possível concluir", "code": "insufficient_funds" })
                    .to_string(),
            )
            .create_async()
            .await;

        let err = client(&server)
            .change_plan(&PlanChangeRequest {
                user_id: UserId::new(),
                connections: 2,
                billing_period: BillingPeriod::Annual,
                change_type: ChangeClassification::Upgrade,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, BillingError::Api(_)));
        assert_eq!(err.failure_kind(), FailureKind::Payment);
    }

    #[tokio::test]
    async fn test_cancel_and_cancel_change() {
        let mut server = mockito::Server::new_async().await;
        let user_id = UserId::new();
        let cancel = server
            .mock("POST", SUBSCRIPTION_CANCEL)
            .match_body(Matcher::PartialJson(json!({
                "user_id": user_id.to_string(),
                "reason": "too expensive"
            })))
            .with_status(200)
            .with_body(
                json!({ "success": true, "access_until": "2026-11-19" }).to_string(),
            )
            .create_async()
            .await;
        let cancel_change = server
            .mock("POST", SUBSCRIPTION_CANCEL_CHANGE)
            .match_body(Matcher::PartialJson(json!({ "user_id": user_id.to_string() })))
            .with_status(200)
            .with_body(json!({ "success": true }).to_string())
            .create_async()
            .await;

        let client = client(&server);
        let response = client
            .cancel_subscription(user_id, Some("too expensive"))
            .await
            .unwrap();
        assert_eq!(response.access_until.as_deref(), Some("2026-11-19"));
        client.cancel_scheduled_change(user_id).await.unwrap();

        cancel.assert_async().await;
        cancel_change.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_without_supabase_is_config_error() {
        let client = AccountClient::with_base_url("http://localhost:1", "tok");
        let err = client.fetch_subscription(UserId::new()).await.unwrap_err();
        assert!(matches!(err, BillingError::Config(_)));
    }

    #[tokio::test]
    async fn test_session_downgrade_against_http_backend() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", SUBSCRIPTION_UPGRADE)
            .match_body(Matcher::PartialJson(json!({
                "connections": 2,
                "change_type": "downgrade"
            })))
            .with_status(200)
            .with_body(
                json!({ "success": true, "effective_date": "2026-11-19T00:00:00Z" }).to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let mut session = PlanChangeSession::new(client(&server), UserId::new(), Locale::PtBr);
        session.open(PlanSelection::monthly(4).unwrap()).unwrap();
        let classification = session.select(PlanSelection::monthly(2).unwrap()).unwrap();
        assert_eq!(classification, ChangeClassification::Downgrade);

        session.proceed().await.unwrap();
        assert!(matches!(
            session.state(),
            PlanChangeState::ConfirmingDowngrade { .. }
        ));

        session.confirm_downgrade().await.unwrap();
        match session.state() {
            PlanChangeState::Success { outcome, .. } => {
                assert!(outcome.message.contains("19/11/2026"));
                // No Supabase configured, so the reload is skipped
                assert!(outcome.subscription.is_none());
            }
            other => panic!("unexpected state {:?}", other),
        }
        mock.assert_async().await;
    }

    async fn upgrade_with_reply(reply: serde_json::Value) -> PlanChangeState {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", SUBSCRIPTION_UPGRADE)
            .with_status(200)
            .with_body(reply.to_string())
            .expect(1)
            .create_async()
            .await;

        let mut session = PlanChangeSession::new(client(&server), UserId::new(), Locale::PtBr);
        session.open(PlanSelection::monthly(2).unwrap()).unwrap();
        session.select(PlanSelection::monthly(4).unwrap()).unwrap();
        session.proceed().await.unwrap();
        mock.assert_async().await;
        session.state().clone()
    }

    #[tokio::test]
    async fn test_upgrade_with_string_amount_and_unknown_change_type_succeeds() {
        let state = upgrade_with_reply(json!({
            "success": true,
            "change_type": "immediate",
            "amount_charged": "490.00"
        }))
        .await;

        match state {
            PlanChangeState::Success { outcome, .. } => {
                assert_eq!(outcome.classification, ChangeClassification::Upgrade);
                assert_eq!(outcome.amount_charged_cents, Some(49_000));
                assert!(outcome.message.contains("R$ 490,00"));
            }
            other => panic!("unexpected state {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_upgrade_with_unusable_amount_uses_fallback_message() {
        let state = upgrade_with_reply(json!({
            "success": true,
            "amount_charged": "pending"
        }))
        .await;

        match state {
            PlanChangeState::Success { outcome, .. } => {
                assert_eq!(outcome.amount_charged_cents, None);
                assert_eq!(outcome.message, "Plano atualizado com sucesso!");
            }
            other => panic!("unexpected state {:?}", other),
        }
    }
}
