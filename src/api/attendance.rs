//! Attendance endpoints. List calls return raw envelope content so the
//! query cache can store them untyped; typing happens at the read site.

use serde_json::{json, Value};

use crate::api::http::ApiClient;
use crate::error::ClientError;

const BASE: &str = "/attendance";

/// Full attendance history (admin surface).
pub async fn list(api: &ApiClient) -> Result<Value, ClientError> {
    api.get(BASE).await
}

/// The signed-in employee's own logs.
pub async fn employee_logs(api: &ApiClient) -> Result<Value, ClientError> {
    api.get("/attendance/employee").await
}

/// Today's logs across all employees (dashboard surface).
pub async fn employees_today(api: &ApiClient) -> Result<Value, ClientError> {
    api.get("/attendance/employees").await
}

pub async fn check_in(api: &ApiClient, employee_id: Option<&str>) -> Result<Value, ClientError> {
    api.post("/attendance/check-in", body_for(employee_id)).await
}

/// Rejected by the server when no open check-in exists; the error surfaces
/// unchanged and nothing is written locally.
pub async fn check_out(api: &ApiClient, employee_id: Option<&str>) -> Result<Value, ClientError> {
    api.post("/attendance/check-out", body_for(employee_id)).await
}

pub async fn delete(api: &ApiClient, id: &str) -> Result<(), ClientError> {
    api.delete(&format!("{BASE}/delete/{id}")).await.map(|_| ())
}

fn body_for(employee_id: Option<&str>) -> Option<Value> {
    employee_id.map(|id| json!({ "employeeId": id }))
}
