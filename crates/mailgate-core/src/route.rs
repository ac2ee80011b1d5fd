//! Screen routes and the authentication route guard.

use tokio::sync::watch;
use tracing::debug;

use crate::gate::AuthState;

/// A screen of the mail client.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    /// Login screen, the only route reachable while logged out.
    Login,
    /// Inbox list; the default protected route.
    Inbox,
    /// Settings and profile.
    Profile,
    /// Single email.
    EmailDetail {
        /// Email identifier.
        id: String,
    },
}

impl Route {
    /// Route shown after login.
    pub const DEFAULT_PROTECTED: Self = Self::Inbox;

    /// Returns `true` if the route needs a logged-in user.
    #[must_use]
    pub const fn is_protected(&self) -> bool {
        !matches!(self, Self::Login)
    }

    /// Router path of this route.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Login => "/login".to_string(),
            Self::Inbox => "/(tabs)/(home)".to_string(),
            Self::Profile => "/(tabs)/profile".to_string(),
            Self::EmailDetail { id } => format!("/email-detail?id={id}"),
        }
    }

    /// Parses a router path. Returns `None` for unknown paths.
    #[must_use]
    pub fn parse(path: &str) -> Option<Self> {
        let (path, query) = path.split_once('?').unwrap_or((path, ""));
        let path = match path.trim_end_matches('/') {
            "" => "/",
            p => p,
        };

        match path {
            "/login" => Some(Self::Login),
            "/" | "/(tabs)" | "/(tabs)/(home)" => Some(Self::Inbox),
            "/(tabs)/profile" | "/profile" => Some(Self::Profile),
            "/email-detail" => {
                let id = query
                    .split('&')
                    .find_map(|pair| pair.strip_prefix("id="))
                    .filter(|id| !id.is_empty())?;
                Some(Self::EmailDetail { id: id.to_string() })
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path())
    }
}

/// Where `route` must redirect to under `state`, if anywhere.
///
/// Nothing is decided while the state is still loading. A redirect to the
/// route already shown is reported as no redirect.
#[must_use]
pub fn redirect_for(state: &AuthState, route: &Route) -> Option<Route> {
    let target = match state {
        AuthState::Loading => return None,
        AuthState::Unauthenticated if route.is_protected() => Route::Login,
        AuthState::Authenticated(_) if *route == Route::Login => Route::DEFAULT_PROTECTED,
        _ => return None,
    };
    (target != *route).then_some(target)
}

/// Applies [`redirect_for`] whenever the route or the auth state changes.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    current: Route,
    state: AuthState,
}

impl RouteGuard {
    /// Creates a guard showing `initial` with the state still loading.
    #[must_use]
    pub const fn new(initial: Route) -> Self {
        Self {
            current: initial,
            state: AuthState::Loading,
        }
    }

    /// Route currently shown.
    #[must_use]
    pub const fn current(&self) -> &Route {
        &self.current
    }

    /// Last auth state seen.
    #[must_use]
    pub const fn state(&self) -> &AuthState {
        &self.state
    }

    /// Navigates to `route` and returns the route actually shown.
    pub fn navigate(&mut self, route: Route) -> &Route {
        self.current = route;
        self.enforce();
        &self.current
    }

    /// Records a new auth state; returns the redirect it caused, if any.
    pub fn on_state_change(&mut self, state: &AuthState) -> Option<Route> {
        self.state = state.clone();
        self.enforce()
    }

    /// Picks up the latest state from a gate subscription.
    ///
    /// Returns the redirect it caused, if any.
    pub fn sync(&mut self, rx: &mut watch::Receiver<AuthState>) -> Option<Route> {
        let state = rx.borrow_and_update().clone();
        self.on_state_change(&state)
    }

    fn enforce(&mut self) -> Option<Route> {
        let target = redirect_for(&self.state, &self.current)?;
        debug!("Redirecting {} -> {}", self.current, target);
        self.current = target.clone();
        Some(target)
    }
}
