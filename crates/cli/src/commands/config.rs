use std::env;
use std::fs;
use std::path::Path;

use secrecy::{ExposeSecret, SecretString};
use threadwise_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

use super::CommandResult;

const CONFIG_INVALID_EXIT_CODE: u8 = 2;

struct ConfigField {
    key_path: &'static str,
    env_keys: &'static [&'static str],
    value: String,
}

impl ConfigField {
    fn new(key_path: &'static str, env_keys: &'static [&'static str], value: String) -> Self {
        Self { key_path, env_keys, value }
    }
}

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                CONFIG_INVALID_EXIT_CODE,
                format!("config validation failed: {error}"),
            )
        }
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in effective_fields(&config) {
        let source = field_source(
            field.key_path,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key_path, &field.value, source));
    }

    CommandResult::success(lines.join("\n"))
}

fn effective_fields(config: &AppConfig) -> Vec<ConfigField> {
    let slack = &config.slack;
    let llm = &config.llm;
    let server = &config.server;

    vec![
        ConfigField::new(
            "slack.bot_token",
            &["THREADWISE_SLACK_BOT_TOKEN", "SLACK_TOKEN"],
            redact_token(slack.bot_token.expose_secret()),
        ),
        ConfigField::new(
            "slack.app_token",
            &["THREADWISE_SLACK_APP_TOKEN", "SLACK_APP_TOKEN"],
            redact_optional(slack.app_token.as_ref()),
        ),
        ConfigField::new(
            "slack.signing_secret",
            &["THREADWISE_SLACK_SIGNING_SECRET", "SLACK_SIGNING_SECRET"],
            redact_opaque(&slack.signing_secret),
        ),
        ConfigField::new(
            "slack.verification_token",
            &["THREADWISE_SLACK_VERIFICATION_TOKEN", "SLACK_VERIFICATION_TOKEN"],
            redact_opaque(&slack.verification_token),
        ),
        ConfigField::new(
            "slack.api_base_url",
            &["THREADWISE_SLACK_API_BASE_URL"],
            slack.api_base_url.clone(),
        ),
        ConfigField::new(
            "slack.max_clock_skew_secs",
            &["THREADWISE_SLACK_MAX_CLOCK_SKEW_SECS"],
            slack.max_clock_skew_secs.to_string(),
        ),
        ConfigField::new(
            "slack.ignore_retries",
            &["THREADWISE_SLACK_IGNORE_RETRIES"],
            slack.ignore_retries.to_string(),
        ),
        ConfigField::new(
            "llm.provider",
            &["THREADWISE_LLM_PROVIDER"],
            llm.provider.as_str().to_string(),
        ),
        ConfigField::new(
            "llm.api_key",
            &["THREADWISE_LLM_API_KEY", "OPEN_AI_KEY"],
            redact_optional(llm.api_key.as_ref()),
        ),
        ConfigField::new(
            "llm.base_url",
            &["THREADWISE_LLM_BASE_URL"],
            llm.effective_base_url().to_string(),
        ),
        ConfigField::new("llm.model", &["THREADWISE_LLM_MODEL"], llm.model.clone()),
        ConfigField::new(
            "llm.timeout_secs",
            &["THREADWISE_LLM_TIMEOUT_SECS"],
            llm.timeout_secs.to_string(),
        ),
        ConfigField::new(
            "server.bind_address",
            &["THREADWISE_SERVER_BIND_ADDRESS"],
            server.bind_address.clone(),
        ),
        ConfigField::new(
            "server.port",
            &["THREADWISE_SERVER_PORT", "SERVER_PORT"],
            server.port.to_string(),
        ),
        ConfigField::new(
            "server.graceful_shutdown_secs",
            &["THREADWISE_SERVER_GRACEFUL_SHUTDOWN_SECS"],
            server.graceful_shutdown_secs.to_string(),
        ),
        ConfigField::new(
            "logging.level",
            &["THREADWISE_LOGGING_LEVEL", "THREADWISE_LOG_LEVEL"],
            config.logging.level.clone(),
        ),
        ConfigField::new(
            "logging.format",
            &["THREADWISE_LOGGING_FORMAT", "THREADWISE_LOG_FORMAT"],
            format!("{:?}", config.logging.format).to_lowercase(),
        ),
    ]
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Slack tokens keep their `xoxb-`/`xapp-` kind so a swapped token is still visible.
fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}

fn redact_optional(secret: Option<&SecretString>) -> String {
    match secret {
        Some(secret) => redact_token(secret.expose_secret()),
        None => "<unset>".to_string(),
    }
}

fn redact_opaque(secret: &SecretString) -> String {
    if secret.expose_secret().trim().is_empty() {
        "<empty>".to_string()
    } else {
        "<redacted>".to_string()
    }
}
