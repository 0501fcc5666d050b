/// Pages the client can be on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    SignIn,
    SignUp,
    Chat,
    Other(String),
}

impl Route {
    pub fn from_path(path: &str) -> Self {
        match path {
            "/signin" => Self::SignIn,
            "/signup" => Self::SignUp,
            "/chat" => Self::Chat,
            other => Self::Other(other.to_owned()),
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Self::SignIn => "/signin",
            Self::SignUp => "/signup",
            Self::Chat => "/chat",
            Self::Other(path) => path,
        }
    }

    /// Sign-in and sign-up are the only pages reachable without a session.
    pub fn is_auth_page(&self) -> bool {
        matches!(self, Self::SignIn | Self::SignUp)
    }
}

/// Where a visitor on `route` must be sent, if anywhere.
pub fn redirect_for(route: &Route, signed_in: bool) -> Option<Route> {
    match (signed_in, route.is_auth_page()) {
        (false, false) => Some(Route::SignIn),
        (true, true) => Some(Route::Chat),
        _ => None,
    }
}

/// Keeps the current route consistent with the session state.
///
/// Starts in a loading state and renders only a placeholder until the first
/// session check arrives.
#[derive(Debug)]
pub struct AuthGate {
    route: Route,
    signed_in: Option<bool>,
}

impl AuthGate {
    pub fn new(route: Route) -> Self {
        Self {
            route,
            signed_in: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.signed_in.is_none()
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn placeholder(&self) -> Option<&'static str> {
        self.is_loading().then_some("Loading...")
    }

    /// Feed a session check or an auth-state change. Returns the redirect
    /// taken, if any.
    pub fn on_auth_state(&mut self, signed_in: bool) -> Option<Route> {
        self.signed_in = Some(signed_in);
        self.apply()
    }

    /// Move to `route` and re-check it against the last known session state.
    pub fn navigate(&mut self, route: Route) -> Option<Route> {
        self.route = route;
        if self.is_loading() {
            return None;
        }
        self.apply()
    }

    fn apply(&mut self) -> Option<Route> {
        let signed_in = self.signed_in?;
        let target = redirect_for(&self.route, signed_in)?;
        self.route = target.clone();
        Some(target)
    }
}
