//! Single source of truth for "who is the current actor".
//!
//! Nothing outside this store mutates session state; the route guard and
//! the rest of the client only read snapshots. A small signed-in hint is
//! persisted to disk as a fast path between runs — it is never a trust
//! boundary, the authoritative answer is always the session-check call.

use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::{auth, ApiClient};
use crate::error::ClientError;
use crate::model::{Role, User};

/// Current session snapshot.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub user: Option<User>,
    /// Raised while a session check is on the wire, so dependent surfaces
    /// can block render instead of flashing unauthenticated content.
    pub is_loading: bool,
    /// Whether at least one check has completed since boot.
    pub checked: bool,
}

impl Session {
    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }
}

pub struct SessionStore {
    state: Mutex<Session>,
    hint: HintFile,
}

fn lock(state: &Mutex<Session>) -> MutexGuard<'_, Session> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SessionStore {
    pub fn new(hint_path: PathBuf) -> Self {
        Self {
            state: Mutex::new(Session::default()),
            hint: HintFile { path: hint_path },
        }
    }

    /// Resolve the current actor against the server. Any failure — transport
    /// or an explicit `success:false` — clears local state and resolves to
    /// [`ClientError::SessionInvalid`]; the caller redirects, never retries.
    pub async fn check_session(&self, api: &ApiClient) -> Result<User, ClientError> {
        lock(&self.state).is_loading = true;

        let outcome = auth::check_session(api).await;

        let mut session = lock(&self.state);
        session.is_loading = false;
        session.checked = true;
        match outcome {
            Ok(user) => {
                session.user = Some(user.clone());
                drop(session);
                self.hint.write(user.role);
                info!(user = %user.email, role = %user.role, "session resolved");
                Ok(user)
            }
            Err(error) => {
                session.user = None;
                drop(session);
                self.hint.clear();
                warn!(error = %error, "session check failed");
                Err(ClientError::SessionInvalid)
            }
        }
    }

    /// Clear the session. The server call is fire-and-forget: local state
    /// and the persisted hint go away whatever the server answers.
    pub async fn logout(&self, api: &ApiClient) {
        if let Err(error) = auth::logout(api).await {
            warn!(error = %error, "logout request failed, clearing local session anyway");
        }
        let mut session = lock(&self.state);
        session.user = None;
        session.checked = true;
        drop(session);
        self.hint.clear();
        info!("signed out");
    }

    pub fn snapshot(&self) -> Session {
        lock(&self.state).clone()
    }

    pub fn current_user(&self) -> Option<User> {
        lock(&self.state).user.clone()
    }

    pub fn is_signed_in(&self) -> bool {
        lock(&self.state).is_signed_in()
    }

    /// Fast-path hint from the previous run, if any. Routing may use it to
    /// pick an optimistic landing surface before `check_session` resolves.
    pub fn hinted_role(&self) -> Option<Role> {
        self.hint.read()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SignInHint {
    signed_in: bool,
    role: Option<Role>,
}

/// Client-local persistence of the signed-in hint. I/O failures only cost
/// the fast path, so they are logged and swallowed.
struct HintFile {
    path: PathBuf,
}

impl HintFile {
    fn write(&self, role: Role) {
        let hint = SignInHint {
            signed_in: true,
            role: Some(role),
        };
        let text = match serde_json::to_string(&hint) {
            Ok(text) => text,
            Err(error) => {
                warn!(error = %error, "could not encode session hint");
                return;
            }
        };
        if let Err(error) = fs::write(&self.path, text) {
            warn!(error = %error, path = %self.path.display(), "could not persist session hint");
        }
    }

    fn clear(&self) {
        if self.path.exists() {
            if let Err(error) = fs::remove_file(&self.path) {
                warn!(error = %error, path = %self.path.display(), "could not clear session hint");
            }
        }
    }

    fn read(&self) -> Option<Role> {
        let text = fs::read_to_string(&self.path).ok()?;
        let hint: SignInHint = serde_json::from_str(&text).ok()?;
        if hint.signed_in { hint.role } else { None }
    }
}
