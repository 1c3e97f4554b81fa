//! Role-based route guarding, enforced twice.
//!
//! The edge-level check runs before anything renders, on nothing but the
//! `token`/`role` cookie pair — cheap, but only a routing convenience (a
//! spoofed cookie changes navigation, never authorization, which the server
//! re-checks per request). The render-level check runs the same rules again
//! once the session store has resolved authoritative data, covering the gap
//! right after login when the edge hint is not yet trustworthy. A role
//! mismatch always redirects; admin-only surfaces are never rendered and
//! then hidden.

use crate::model::Role;
use crate::session::Session;

pub const SIGN_IN: &str = "/";
pub const DASHBOARD_HOME: &str = "/dashboard";
pub const ATTENDANCE_HOME: &str = "/attendance";

/// Where a role lands after sign-in.
pub fn home_for(role: Role) -> &'static str {
    match role {
        Role::Employee => ATTENDANCE_HOME,
        Role::Admin => DASHBOARD_HOME,
    }
}

/// What the route guard knows about the current actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// Nothing resolved yet (first load, before any session check).
    Unknown,
    /// A session check is on the wire; block render, decide nothing.
    Checking,
    SignedOut,
    SignedInAdmin,
    SignedInEmployee,
}

impl AuthState {
    pub fn from_session(session: &Session) -> Self {
        if session.is_loading {
            return Self::Checking;
        }
        if !session.checked {
            return Self::Unknown;
        }
        match &session.user {
            None => Self::SignedOut,
            Some(user) => match user.role {
                Role::Admin => Self::SignedInAdmin,
                Role::Employee => Self::SignedInEmployee,
            },
        }
    }

    fn role(&self) -> Option<Role> {
        match self {
            Self::SignedInAdmin => Some(Role::Admin),
            Self::SignedInEmployee => Some(Role::Employee),
            Self::Unknown | Self::Checking | Self::SignedOut => None,
        }
    }
}

/// The raw cookie pair the edge check runs on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeCredentials {
    pub token: Option<String>,
    pub role: Option<String>,
}

impl EdgeCredentials {
    pub fn from_cookie_header(header: &str) -> Self {
        let mut creds = Self::default();
        for pair in header.split(';') {
            if let Some((name, value)) = pair.trim().split_once('=') {
                match name {
                    "token" => creds.token = Some(value.to_string()),
                    "role" => creds.role = Some(value.to_string()),
                    _ => {}
                }
            }
        }
        creds
    }

    /// Both cookies present and the role parses into the closed enum.
    /// An unparseable role is treated as signed-out rather than guessed at.
    fn signed_in_role(&self) -> Option<Role> {
        match (&self.token, &self.role) {
            (Some(token), Some(role)) if !token.is_empty() => role.parse().ok(),
            _ => None,
        }
    }
}

/// Edge-level decision, made before rendering. `None` means pass through.
pub fn edge_redirect(credentials: &EdgeCredentials, path: &str) -> Option<&'static str> {
    redirect_for(credentials.signed_in_role(), path)
}

/// Render-level decision from authoritative session state. `Unknown` and
/// `Checking` decide nothing — the caller blocks render until resolution.
pub fn render_redirect(state: &AuthState, path: &str) -> Option<&'static str> {
    match state {
        AuthState::Unknown | AuthState::Checking => None,
        AuthState::SignedOut => redirect_for(None, path),
        signed_in => redirect_for(signed_in.role(), path),
    }
}

fn redirect_for(signed_in_as: Option<Role>, path: &str) -> Option<&'static str> {
    let Some(role) = signed_in_as else {
        // Not signed in: everything except the sign-in surface bounces home.
        return (path != SIGN_IN).then_some(SIGN_IN);
    };

    if path == SIGN_IN {
        return Some(home_for(role));
    }
    match role {
        Role::Employee if path.starts_with(DASHBOARD_HOME) => Some(ATTENDANCE_HOME),
        Role::Admin if path.starts_with(ATTENDANCE_HOME) => Some(DASHBOARD_HOME),
        Role::Employee | Role::Admin => None,
    }
}
