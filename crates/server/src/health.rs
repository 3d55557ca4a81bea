use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Serialize;

use crate::bootstrap::BridgeContext;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub bot_identity: HealthCheck,
    pub checked_at: String,
}

pub async fn health(
    State(context): State<Arc<BridgeContext>>,
) -> (StatusCode, Json<HealthResponse>) {
    let bot_identity = match context.identity.resolve().await {
        Ok(identity) => HealthCheck {
            status: "ready",
            detail: format!("bot_id={} user_id={}", identity.bot_id, identity.user_id),
        },
        Err(error) => HealthCheck { status: "degraded", detail: error.to_string() },
    };
    let ready = bot_identity.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: format!("threadwise-server runtime initialized (model {})", context.model),
        },
        bot_identity,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{extract::State, http::StatusCode, Json};
    use threadwise_agent::testing::ScriptedLlm;
    use threadwise_core::config::AppConfig;
    use threadwise_core::BotIdentity;
    use threadwise_slack::testing::FakeSlackApi;
    use threadwise_slack::SlackApiError;

    use crate::bootstrap::BridgeContext;
    use crate::health::health;

    fn context(api: Arc<FakeSlackApi>) -> Arc<BridgeContext> {
        Arc::new(
            BridgeContext::from_parts(&AppConfig::default(), api, Arc::new(ScriptedLlm::replying("ok")))
                .expect("context"),
        )
    }

    #[tokio::test]
    async fn health_returns_ready_when_identity_resolves() {
        let api = Arc::new(FakeSlackApi::new(BotIdentity::new("B0BOT", "U0BOT")));

        let (status, Json(payload)) = health(State(context(api))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.bot_identity.detail, "bot_id=B0BOT user_id=U0BOT");
        assert_eq!(payload.service.status, "ready");
    }

    #[tokio::test]
    async fn health_returns_service_unavailable_when_auth_test_fails() {
        let api = Arc::new(FakeSlackApi::new(BotIdentity::new("B0BOT", "U0BOT")));
        api.set_auth(Err(SlackApiError::Api("invalid_auth".to_owned())));

        let (status, Json(payload)) = health(State(context(api))).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.bot_identity.status, "degraded");
        assert_eq!(payload.service.status, "ready");
    }
}
