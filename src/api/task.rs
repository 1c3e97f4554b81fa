//! Task CRUD.

use serde_json::Value;

use crate::api::http::ApiClient;
use crate::error::ClientError;

const BASE: &str = "/tasks";

pub async fn list(api: &ApiClient) -> Result<Value, ClientError> {
    api.get(BASE).await
}

/// Tasks assigned to the signed-in employee.
pub async fn employee_tasks(api: &ApiClient) -> Result<Value, ClientError> {
    api.get("/tasks/employee").await
}

pub async fn create(api: &ApiClient, task: Value) -> Result<Value, ClientError> {
    api.post("/tasks/create", Some(task)).await
}

pub async fn update(api: &ApiClient, id: &str, task: Value) -> Result<Value, ClientError> {
    api.put(&format!("{BASE}/update/{id}"), task).await
}

pub async fn delete(api: &ApiClient, id: &str) -> Result<(), ClientError> {
    api.delete(&format!("{BASE}/delete/{id}")).await.map(|_| ())
}
