//! Session metadata recorded when an external login succeeds.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// How the external login was carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoginMethod {
    /// User signed in through the system browser and confirmed manually.
    ExternalBrowser,
    /// Success was detected from embedded browser navigation.
    EmbeddedBrowser,
}

impl LoginMethod {
    /// Returns the wire tag of this method.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ExternalBrowser => "external-browser",
            Self::EmbeddedBrowser => "embedded-browser",
        }
    }
}

impl std::fmt::Display for LoginMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque record of a successful login.
///
/// Persisted next to the user identity and reproduced verbatim on reload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Login method tag.
    pub login_method: LoginMethod,
    /// Terminal URL reached by the browser, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_url: Option<String>,
}

impl SessionRecord {
    /// Creates a record stamped with the current time.
    #[must_use]
    pub fn new(login_method: LoginMethod) -> Self {
        Self {
            timestamp: Utc::now().timestamp_millis(),
            login_method,
            login_url: None,
        }
    }

    /// Sets the timestamp.
    #[must_use]
    pub const fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Sets the terminal URL.
    #[must_use]
    pub fn with_login_url(mut self, url: impl Into<String>) -> Self {
        self.login_url = Some(url.into());
        self
    }
}
