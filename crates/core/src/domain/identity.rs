use serde::{Deserialize, Serialize};

/// The bot's own identity as reported by the platform's introspection call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotIdentity {
    pub bot_id: String,
    pub user_id: String,
}

impl BotIdentity {
    pub fn new(bot_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self { bot_id: bot_id.into(), user_id: user_id.into() }
    }

    /// True when `candidate` names this bot, by either its bot id or its bot user id.
    pub fn matches(&self, candidate: &str) -> bool {
        let candidate = candidate.trim();
        if candidate.is_empty() {
            return false;
        }
        candidate == self.bot_id || candidate == self.user_id
    }
}
