use std::sync::Arc;
use std::time::Duration;

use secrecy::ExposeSecret;
use serde::Serialize;
use threadwise_core::config::{AppConfig, LoadOptions};
use threadwise_slack::identity::BotIdentityResolver;
use threadwise_slack::{SlackApi, SlackWebClient};

use super::CommandResult;

const DOCTOR_FAILED_EXIT_CODE: u8 = 1;
const AUTH_TEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

impl DoctorCheck {
    fn skipped(name: &'static str) -> Self {
        Self {
            name,
            status: CheckStatus::Skipped,
            details: "skipped because configuration did not load".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code =
        if report.overall_status == CheckStatus::Pass { 0 } else { DOCTOR_FAILED_EXIT_CODE };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_signing_secret(&config));
            checks.push(check_slack_auth(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(DoctorCheck::skipped("signing_secret"));
            checks.push(DoctorCheck::skipped("slack_auth_test"));
        }
    }

    summarize(checks)
}

fn summarize(checks: Vec<DoctorCheck>) -> DoctorReport {
    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

/// Slack signing secrets are 32 alphanumeric characters.
const SIGNING_SECRET_LEN: usize = 32;

fn check_signing_secret(config: &AppConfig) -> DoctorCheck {
    let signing_secret = config.slack.signing_secret.expose_secret().trim();
    let verification_token = config.slack.verification_token.expose_secret().trim();

    let well_formed = signing_secret.len() == SIGNING_SECRET_LEN
        && signing_secret.chars().all(|ch| ch.is_ascii_alphanumeric());
    if !well_formed {
        return DoctorCheck {
            name: "signing_secret",
            status: CheckStatus::Fail,
            details: format!(
                "slack.signing_secret should be the {SIGNING_SECRET_LEN}-character value from \
                 Basic Information > App Credentials (found {} characters)",
                signing_secret.chars().count()
            ),
        };
    }
    if signing_secret == verification_token {
        return DoctorCheck {
            name: "signing_secret",
            status: CheckStatus::Fail,
            details: "slack.signing_secret and slack.verification_token are identical; one of \
                      them holds the wrong credential"
                .to_string(),
        };
    }

    DoctorCheck {
        name: "signing_secret",
        status: CheckStatus::Pass,
        details: format!("signing secret present ({SIGNING_SECRET_LEN} characters)"),
    }
}

fn check_slack_auth(config: &AppConfig) -> DoctorCheck {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck {
                name: "slack_auth_test",
                status: CheckStatus::Fail,
                details: format!("failed to initialize async runtime: {error}"),
            };
        }
    };

    let client = match SlackWebClient::new(
        config.slack.api_base_url.clone(),
        config.slack.bot_token.clone(),
        AUTH_TEST_TIMEOUT,
    ) {
        Ok(client) => client,
        Err(error) => {
            return DoctorCheck {
                name: "slack_auth_test",
                status: CheckStatus::Fail,
                details: format!("failed to build slack client: {error}"),
            };
        }
    };

    runtime.block_on(probe_auth_test(Arc::new(client)))
}

async fn probe_auth_test(api: Arc<dyn SlackApi>) -> DoctorCheck {
    let resolver = BotIdentityResolver::new(api);
    match resolver.resolve().await {
        Ok(identity) => DoctorCheck {
            name: "slack_auth_test",
            status: CheckStatus::Pass,
            details: format!(
                "bot token accepted (bot_id={} user_id={})",
                identity.bot_id, identity.user_id
            ),
        },
        Err(error) => DoctorCheck {
            name: "slack_auth_test",
            status: CheckStatus::Fail,
            details: format!("auth.test failed: {error}"),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
