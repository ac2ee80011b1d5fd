//! Identity provider configuration and the login success rule.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use url::Url;

/// External identity provider reachable through a browser surface.
///
/// The provider's protocol is opaque. All we know about it are a handful of
/// URL markers that show up once the user has signed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Provider {
    /// Provider name (e.g., "Seznam").
    pub name: String,
    /// Page the browser surface is opened on.
    pub login_url: Url,
    /// Marker of the mail application's own domain.
    pub app_domain_marker: String,
    /// Marker of the provider's post-login landing page.
    pub landing_marker: String,
    /// Explicit success query indicator.
    pub success_query: String,
    /// Registrable domain of the provider.
    pub provider_domain: String,
    /// Host serving the login page itself.
    pub login_host: String,
}

impl Default for Provider {
    fn default() -> Self {
        Self {
            name: "Seznam".to_string(),
            login_url: Url::parse("https://login.szn.cz/")
                .unwrap_or_else(|_| unreachable!("static login URL is valid")),
            app_domain_marker: "email.cz".to_string(),
            landing_marker: "homepage.szn.cz".to_string(),
            success_query: "?login=success".to_string(),
            provider_domain: "szn.cz".to_string(),
            login_host: "login.szn.cz".to_string(),
        }
    }
}

impl Provider {
    /// Creates a provider with the given login page.
    ///
    /// Markers default to empty and must be set with the builder methods.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn new(name: impl Into<String>, login_url: impl AsRef<str>) -> Result<Self> {
        let login_url = Url::parse(login_url.as_ref())?;
        let login_host = login_url.host_str().unwrap_or_default().to_string();
        Ok(Self {
            name: name.into(),
            login_url,
            app_domain_marker: String::new(),
            landing_marker: String::new(),
            success_query: String::new(),
            provider_domain: String::new(),
            login_host,
        })
    }

    /// Seznam.cz configuration used by the Email.cz client.
    #[must_use]
    pub fn seznam() -> Self {
        Self::default()
    }

    /// Sets the application domain marker.
    #[must_use]
    pub fn with_app_domain_marker(mut self, marker: impl Into<String>) -> Self {
        self.app_domain_marker = marker.into();
        self
    }

    /// Sets the post-login landing marker.
    #[must_use]
    pub fn with_landing_marker(mut self, marker: impl Into<String>) -> Self {
        self.landing_marker = marker.into();
        self
    }

    /// Sets the success query indicator.
    #[must_use]
    pub fn with_success_query(mut self, query: impl Into<String>) -> Self {
        self.success_query = query.into();
        self
    }

    /// Sets the provider domain.
    #[must_use]
    pub fn with_provider_domain(mut self, domain: impl Into<String>) -> Self {
        self.provider_domain = domain.into();
        self
    }

    /// Returns `true` if a navigated URL means the external login succeeded.
    ///
    /// Any one of these is enough:
    /// - the URL contains the app domain marker
    /// - the URL contains the landing marker
    /// - the URL contains the success query
    /// - the host is on the provider domain but is not the login host
    ///
    /// The last clause also matches intermediate provider pages, so a
    /// redirect through e.g. `id.szn.cz` counts as success.
    #[must_use]
    pub fn is_login_success(&self, url: &str) -> bool {
        let contains = |marker: &str| !marker.is_empty() && url.contains(marker);

        if contains(&self.app_domain_marker)
            || contains(&self.landing_marker)
            || contains(&self.success_query)
        {
            return true;
        }

        self.is_provider_page(url)
    }

    fn is_provider_page(&self, url: &str) -> bool {
        if self.provider_domain.is_empty() {
            return false;
        }
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        let domain = self.provider_domain.to_ascii_lowercase();

        let on_domain = host == domain || host.ends_with(&format!(".{domain}"));
        on_domain && !host.eq_ignore_ascii_case(&self.login_host)
    }

    /// Validates that the login page and markers are usable.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid.
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.login_url.scheme(), "http" | "https") {
            return Err(Error::InvalidConfig(format!(
                "login_url must be http(s), got {}",
                self.login_url.scheme()
            )));
        }
        if self.login_host.is_empty() {
            return Err(Error::InvalidConfig("login_host is empty".into()));
        }
        // The login page itself must never look like a success, otherwise
        // opening the browser would log the user in immediately.
        if self.is_login_success(self.login_url.as_str()) {
            return Err(Error::InvalidConfig(format!(
                "login_url {} matches the success rule",
                self.login_url
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn test_seznam_provider() {
        let provider = Provider::seznam();
        assert_eq!(provider.name, "Seznam");
        assert_eq!(provider.login_url.as_str(), "https://login.szn.cz/");
        provider.validate().unwrap();
    }

    #[test]
    fn test_login_page_is_not_success() {
        let provider = Provider::seznam();
        assert!(!provider.is_login_success("https://login.szn.cz/"));
        assert!(!provider.is_login_success("https://login.szn.cz/step2"));
    }

    #[test]
    fn test_provider_domain_page_is_success() {
        let provider = Provider::seznam();
        assert!(provider.is_login_success("https://szn.cz/welcome"));
        assert!(provider.is_login_success("https://id.szn.cz/profile"));
    }

    #[test]
    fn test_markers_are_success() {
        let provider = Provider::seznam();
        assert!(provider.is_login_success("https://email.cz/"));
        assert!(provider.is_login_success("https://homepage.szn.cz/"));
        assert!(provider.is_login_success("https://example.org/done?login=success"));
        assert!(provider.is_login_success("not a url ?login=success"));
    }

    #[test]
    fn test_unrelated_pages_are_not_success() {
        let provider = Provider::seznam();
        assert!(!provider.is_login_success("https://example.org/"));
        assert!(!provider.is_login_success("https://notszn.cz/"));
        assert!(!provider.is_login_success("garbage"));
    }

    #[test]
    fn test_custom_provider() {
        let provider = Provider::new("Custom", "https://auth.example.com/signin")
            .unwrap()
            .with_provider_domain("example.com")
            .with_success_query("?ok=1");

        assert_eq!(provider.login_host, "auth.example.com");
        assert!(provider.is_login_success("https://mail.example.com/"));
        assert!(!provider.is_login_success("https://auth.example.com/next"));
        provider.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_self_matching_login_url() {
        let provider = Provider::new("Broken", "https://auth.example.com/?login=success")
            .unwrap()
            .with_success_query("?login=success");
        assert!(matches!(provider.validate(), Err(Error::InvalidConfig(_))));
    }
}
