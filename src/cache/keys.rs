//! Cache key builders for every query the dashboard issues.
//!
//! Centralising key construction keeps invalidation honest: mutations and
//! the live channel invalidate by prefix, so parameterised keys must extend
//! their collection key (`tasks` -> `tasks:{employee_id}`).

/// Full attendance history (admin attendance table).
pub fn attendance() -> String {
    "attendance".to_string()
}

/// The signed-in employee's own attendance logs. Extends the `attendance`
/// prefix so one invalidation covers both views.
pub fn employee_attendance() -> String {
    "attendance:employee".to_string()
}

/// Today's logs across all employees (dashboard stat card).
pub fn employees_today() -> String {
    "employees-logs".to_string()
}

/// The employee directory.
pub fn employees() -> String {
    "employees".to_string()
}

/// A single employee record.
pub fn employee(id: &str) -> String {
    format!("employees:{id}")
}

/// Every task (admin task table).
pub fn tasks() -> String {
    "tasks".to_string()
}

/// Tasks assigned to one employee.
pub fn employee_tasks(employee_id: &str) -> String {
    format!("tasks:{employee_id}")
}
