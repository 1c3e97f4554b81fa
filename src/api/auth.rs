//! Session endpoints. The server issues the `token`/`role` cookies on
//! login; this module only moves the envelope.

use serde_json::json;

use crate::api::http::{decode, ApiClient};
use crate::error::ClientError;
use crate::model::User;

pub async fn login(api: &ApiClient, email: &str, password: &str) -> Result<(), ClientError> {
    api.post("/auth/login", Some(json!({ "email": email, "password": password })))
        .await
        .map(|_| ())
}

/// The authoritative "who am I" call; cookies travel automatically.
pub async fn check_session(api: &ApiClient) -> Result<User, ClientError> {
    decode(api.get("/auth/check-session").await?)
}

pub async fn logout(api: &ApiClient) -> Result<(), ClientError> {
    api.post("/auth/logout", None).await.map(|_| ())
}
