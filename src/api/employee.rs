//! Employee CRUD over the `/users` resource.

use serde_json::Value;

use crate::api::http::ApiClient;
use crate::error::ClientError;

pub async fn list(api: &ApiClient) -> Result<Value, ClientError> {
    api.get("/users").await
}

pub async fn get(api: &ApiClient, id: &str) -> Result<Value, ClientError> {
    api.get(&format!("/users/get/{id}")).await
}

pub async fn create(api: &ApiClient, employee: Value) -> Result<Value, ClientError> {
    api.post("/users/create", Some(employee)).await
}

pub async fn update(api: &ApiClient, id: &str, employee: Value) -> Result<Value, ClientError> {
    api.put(&format!("/users/update/{id}"), employee).await
}

pub async fn delete(api: &ApiClient, id: &str) -> Result<(), ClientError> {
    api.delete(&format!("/users/delete/{id}")).await.map(|_| ())
}
