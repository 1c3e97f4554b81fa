//! Client-side form validation, run before any network call. A failing
//! form resolves to [`ClientError::Validation`] and no request is sent.

use serde::Serialize;
use std::borrow::Cow;
use validator::{Validate, ValidationError};

use crate::model::{Role, TaskStatus};

/// At least 8 characters, letters and digits only, with at least one of
/// each.
fn password_rule(value: &str) -> Result<(), ValidationError> {
    let long_enough = value.len() >= 8;
    let alnum_only = value.chars().all(|c| c.is_ascii_alphanumeric());
    let has_letter = value.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = value.chars().any(|c| c.is_ascii_digit());
    if long_enough && alnum_only && has_letter && has_digit {
        Ok(())
    } else {
        Err(ValidationError::new("password").with_message(Cow::Borrowed(
            "password must be at least 8 characters long and contain at least one letter and one number",
        )))
    }
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct LoginForm {
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    #[validate(custom(function = password_rule))]
    pub password: String,
}

/// Create/update payload for an employee record. The password is write-only:
/// required on create, optional on update, never echoed back by the server.
#[derive(Debug, Clone, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeForm {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    #[validate(custom(function = password_rule))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Membership in the closed role set is enforced by the type.
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TaskForm {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: String,
    #[validate(length(min = 1, message = "description must not be empty"))]
    pub description: String,
    #[validate(length(min = 1, message = "a task needs an assignee"))]
    pub assigned_to: String,
    pub status: TaskStatus,
}
