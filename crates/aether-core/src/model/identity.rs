use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// The signed-in user, persisted under `app_user`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub email: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub time: DateTime<Utc>,
}

impl Identity {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            time: Utc::now().trunc_subsecs(3),
        }
    }
}
