use std::sync::Arc;
use std::time::Duration;

use threadwise_agent::{AgentRuntime, CompletionError, LlmClient, OpenAiCompatibleClient};
use threadwise_core::config::{AppConfig, ConfigError, LoadOptions};
use threadwise_core::SignatureVerifier;
use threadwise_slack::dispatch::ReplyDispatcher;
use threadwise_slack::events::bridge_dispatcher;
use threadwise_slack::identity::BotIdentityResolver;
use threadwise_slack::threads::ThreadContextFetcher;
use threadwise_slack::{
    EventDispatcher, RequestAuthenticator, SlackApi, SlackApiError, SlackWebClient,
};
use thiserror::Error;
use tracing::info;

const SLACK_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything a request handler needs, built once and shared as axum state.
pub struct BridgeContext {
    pub authenticator: RequestAuthenticator,
    pub dispatcher: EventDispatcher,
    pub identity: Arc<BotIdentityResolver>,
    pub ignore_retries: bool,
    pub model: String,
}

impl BridgeContext {
    pub fn from_parts(
        config: &AppConfig,
        api: Arc<dyn SlackApi>,
        llm: Arc<dyn LlmClient>,
    ) -> Result<Self, BootstrapError> {
        let authenticator = RequestAuthenticator::new(
            SignatureVerifier::new(
                config.slack.signing_secret.clone(),
                config.slack.max_clock_skew_secs,
            ),
            config.slack.verification_token.clone(),
        );
        let identity = Arc::new(BotIdentityResolver::new(api.clone()));
        let replies = Arc::new(ReplyDispatcher::new(api.clone(), identity.clone()));
        let agent = Arc::new(AgentRuntime::new(llm)?);
        let model = agent.model().to_owned();
        let dispatcher =
            bridge_dispatcher(ThreadContextFetcher::new(api), identity.clone(), replies, agent);

        Ok(Self {
            authenticator,
            dispatcher,
            identity,
            ignore_retries: config.slack.ignore_retries,
            model,
        })
    }
}

pub struct Application {
    pub config: AppConfig,
    pub context: Arc<BridgeContext>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("slack client construction failed: {0}")]
    SlackClient(#[from] SlackApiError),
    #[error("completion client construction failed: {0}")]
    Completion(#[from] CompletionError),
}

pub fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config)
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let api: Arc<dyn SlackApi> = Arc::new(SlackWebClient::new(
        config.slack.api_base_url.clone(),
        config.slack.bot_token.clone(),
        SLACK_HTTP_TIMEOUT,
    )?);
    let llm: Arc<dyn LlmClient> = Arc::new(OpenAiCompatibleClient::from_config(&config.llm)?);
    let context = BridgeContext::from_parts(&config, api, llm)?;

    info!(
        event_name = "system.bootstrap.ready",
        correlation_id = "bootstrap",
        llm_provider = config.llm.provider.as_str(),
        llm_model = %context.model,
        ignore_retries = context.ignore_retries,
        "bridge context initialized"
    );

    Ok(Application { config, context: Arc::new(context) })
}
