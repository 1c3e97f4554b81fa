//! The top-level client: one object wiring the session store, the query
//! cache, the REST client and the live channel together. Embedding code
//! talks to this and nothing below it.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{info, instrument};
use validator::Validate;

use crate::api::{self, ApiClient};
use crate::cache::{keys, ObserverGuard, QueryCache};
use crate::config::Config;
use crate::error::ClientError;
use crate::guard::{home_for, AuthState, EdgeCredentials};
use crate::live::AttendanceListener;
use crate::model::{AttendanceLog, Employee, Role, Task, User};
use crate::session::SessionStore;
use crate::validate::{EmployeeForm, LoginForm, TaskForm};

/// Aggregates for the admin landing surface, derived from cached reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_employees: usize,
    pub active_tasks: usize,
    pub present_today: usize,
}

pub struct ParlourClient {
    config: Config,
    api: ApiClient,
    session: SessionStore,
    cache: QueryCache,
    listener: Mutex<Option<AttendanceListener>>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ParlourClient {
    /// Build the client and start the periodic cache sweeper. Nothing talks
    /// to the network until the first session check or query.
    pub fn init(config: Config) -> Result<Self, ClientError> {
        let api = ApiClient::new(&config)?;
        let session = SessionStore::new(config.session_hint_path.clone());
        let cache = QueryCache::new(
            Duration::from_millis(config.stale_time_ms),
            Duration::from_millis(config.gc_time_ms),
        );

        let sweeper = {
            let cache = cache.clone();
            let period = Duration::from_millis(config.gc_time_ms.max(1_000));
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(period);
                ticker.tick().await;
                loop {
                    ticker.tick().await;
                    cache.sweep();
                }
            })
        };

        info!(api = %config.api_base_url, "client initialised");
        Ok(Self {
            config,
            api,
            session,
            cache,
            listener: Mutex::new(None),
            sweeper: Mutex::new(Some(sweeper)),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // ---- session ----

    pub async fn check_session(&self) -> Result<User, ClientError> {
        self.session.check_session(&self.api).await
    }

    #[instrument(name = "auth_login", skip(self, form), fields(email = %form.email))]
    pub async fn login(&self, form: LoginForm) -> Result<User, ClientError> {
        form.validate()?;
        api::auth::login(&self.api, &form.email, &form.password).await?;
        self.session.check_session(&self.api).await
    }

    pub async fn logout(&self) {
        self.session.logout(&self.api).await;
        self.stop_attendance_listener();
    }

    pub fn current_user(&self) -> Option<User> {
        self.session.current_user()
    }

    pub fn auth_state(&self) -> AuthState {
        AuthState::from_session(&self.session.snapshot())
    }

    /// Optimistic landing path from the persisted hint, before any session
    /// check has resolved.
    pub fn hinted_role(&self) -> Option<Role> {
        self.session.hinted_role()
    }

    /// Where the signed-in user belongs, or the sign-in surface.
    pub fn home_path(&self) -> &'static str {
        match self.current_user() {
            Some(user) => home_for(user.role),
            None => crate::guard::SIGN_IN,
        }
    }

    pub fn edge_credentials(&self) -> EdgeCredentials {
        self.api.edge_credentials()
    }

    // ---- live channel ----

    /// Start the attendance listener if it is not already running.
    pub fn start_attendance_listener(&self) {
        let mut listener = lock(&self.listener);
        if listener.is_some() {
            return;
        }
        *listener = Some(AttendanceListener::spawn(
            self.config.socket_url.clone(),
            self.api.cookie_header(),
            self.cache.clone(),
        ));
    }

    pub fn stop_attendance_listener(&self) {
        if let Some(listener) = lock(&self.listener).take() {
            listener.disconnect();
        }
    }

    pub fn has_attendance_listener(&self) -> bool {
        lock(&self.listener).is_some()
    }

    // ---- cached reads ----

    pub async fn attendance_logs(&self) -> Result<Vec<AttendanceLog>, ClientError> {
        let api = self.api.clone();
        self.cache
            .query(&keys::attendance(), move || async move {
                api::attendance::list(&api).await
            })
            .await
    }

    /// The signed-in employee's own logs.
    pub async fn my_attendance(&self) -> Result<Vec<AttendanceLog>, ClientError> {
        let api = self.api.clone();
        self.cache
            .query(&keys::employee_attendance(), move || async move {
                api::attendance::employee_logs(&api).await
            })
            .await
    }

    /// Today's logs across all employees, the feed the live channel keeps
    /// fresh.
    pub async fn employees_today(&self) -> Result<Vec<AttendanceLog>, ClientError> {
        let api = self.api.clone();
        self.cache
            .query(&keys::employees_today(), move || async move {
                api::attendance::employees_today(&api).await
            })
            .await
    }

    pub async fn employees(&self) -> Result<Vec<Employee>, ClientError> {
        let api = self.api.clone();
        self.cache
            .query(&keys::employees(), move || async move {
                api::employee::list(&api).await
            })
            .await
    }

    pub async fn employee(&self, id: &str) -> Result<Employee, ClientError> {
        let api = self.api.clone();
        let id_owned = id.to_owned();
        self.cache
            .query(&keys::employee(id), move || async move {
                api::employee::get(&api, &id_owned).await
            })
            .await
    }

    pub async fn tasks(&self) -> Result<Vec<Task>, ClientError> {
        let api = self.api.clone();
        self.cache
            .query(&keys::tasks(), move || async move {
                api::task::list(&api).await
            })
            .await
    }

    /// Tasks assigned to the signed-in employee; requires a resolved session.
    pub async fn my_tasks(&self) -> Result<Vec<Task>, ClientError> {
        let user = self.current_user().ok_or(ClientError::SessionInvalid)?;
        let api = self.api.clone();
        self.cache
            .query(&keys::employee_tasks(&user.id), move || async move {
                api::task::employee_tasks(&api).await
            })
            .await
    }

    pub async fn dashboard_stats(&self) -> Result<DashboardStats, ClientError> {
        let employees = self.employees().await?;
        let tasks = self.tasks().await?;
        let today = self.employees_today().await?;
        Ok(DashboardStats {
            total_employees: employees.len(),
            active_tasks: tasks.iter().filter(|task| !task.is_done()).count(),
            present_today: today.iter().filter(|log| !log.is_absent()).count(),
        })
    }

    /// Pin a cache entry while a view depends on it.
    pub fn observe(&self, key: &str) -> ObserverGuard {
        self.cache.observe(key)
    }

    // ---- attendance mutations ----

    /// Check the signed-in employee in. Both the history and today's feed
    /// go stale on success.
    pub async fn check_in(&self) -> Result<AttendanceLog, ClientError> {
        let api = self.api.clone();
        self.cache
            .mutate(
                move || async move {
                    let content = api::attendance::check_in(&api, None).await?;
                    decode_log(content)
                },
                &[keys::attendance(), keys::employees_today()],
            )
            .await
    }

    /// Rejected by the server when there is no open check-in; the rejection
    /// surfaces as [`ClientError::Api`] and no cache entry changes.
    pub async fn check_out(&self) -> Result<AttendanceLog, ClientError> {
        let api = self.api.clone();
        self.cache
            .mutate(
                move || async move {
                    let content = api::attendance::check_out(&api, None).await?;
                    decode_log(content)
                },
                &[keys::attendance(), keys::employees_today()],
            )
            .await
    }

    pub async fn delete_attendance(&self, id: &str) -> Result<(), ClientError> {
        let api = self.api.clone();
        let id = id.to_owned();
        self.cache
            .mutate(
                move || async move { api::attendance::delete(&api, &id).await },
                &[keys::attendance(), keys::employees_today()],
            )
            .await
    }

    // ---- employee mutations ----

    pub async fn create_employee(&self, form: EmployeeForm) -> Result<Employee, ClientError> {
        form.validate()?;
        if form.password.is_none() {
            return Err(ClientError::Validation(
                "a new employee needs a password".to_string(),
            ));
        }
        let api = self.api.clone();
        let body = serde_json::to_value(&form)?;
        self.cache
            .mutate(
                move || async move {
                    let content = api::employee::create(&api, body).await?;
                    api::http::decode(content)
                },
                &[keys::employees()],
            )
            .await
    }

    pub async fn update_employee(
        &self,
        id: &str,
        form: EmployeeForm,
    ) -> Result<Employee, ClientError> {
        form.validate()?;
        let api = self.api.clone();
        let id = id.to_owned();
        let body = serde_json::to_value(&form)?;
        self.cache
            .mutate(
                move || async move {
                    let content = api::employee::update(&api, &id, body).await?;
                    api::http::decode(content)
                },
                &[keys::employees()],
            )
            .await
    }

    pub async fn delete_employee(&self, id: &str) -> Result<(), ClientError> {
        let api = self.api.clone();
        let id = id.to_owned();
        self.cache
            .mutate(
                move || async move { api::employee::delete(&api, &id).await },
                &[keys::employees()],
            )
            .await
    }

    // ---- task mutations ----

    pub async fn create_task(&self, form: TaskForm) -> Result<Task, ClientError> {
        form.validate()?;
        let api = self.api.clone();
        let body = serde_json::to_value(&form)?;
        self.cache
            .mutate(
                move || async move {
                    let content = api::task::create(&api, body).await?;
                    api::http::decode(content)
                },
                &[keys::tasks()],
            )
            .await
    }

    pub async fn update_task(&self, id: &str, form: TaskForm) -> Result<Task, ClientError> {
        form.validate()?;
        let api = self.api.clone();
        let id = id.to_owned();
        let body = serde_json::to_value(&form)?;
        self.cache
            .mutate(
                move || async move {
                    let content = api::task::update(&api, &id, body).await?;
                    api::http::decode(content)
                },
                &[keys::tasks()],
            )
            .await
    }

    pub async fn delete_task(&self, id: &str) -> Result<(), ClientError> {
        let api = self.api.clone();
        let id = id.to_owned();
        self.cache
            .mutate(
                move || async move { api::task::delete(&api, &id).await },
                &[keys::tasks()],
            )
            .await
    }

    /// Synchronous teardown: stop the live channel and the sweeper. Session
    /// state is left as is; use [`logout`](Self::logout) to sign out.
    pub fn dispose(&self) {
        self.stop_attendance_listener();
        if let Some(sweeper) = lock(&self.sweeper).take() {
            sweeper.abort();
        }
        info!("client disposed");
    }
}

impl Drop for ParlourClient {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn decode_log(content: Value) -> Result<AttendanceLog, ClientError> {
    api::http::decode(content)
}
