use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::user::UserRef;

/// One employee-day of attendance. Neither stamp means "absent"; a lone
/// check-in is an open, in-progress day. The server owns the stamps — the
/// client never fabricates or edits them locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceLog {
    #[serde(alias = "_id")]
    pub id: String,
    pub employee: UserRef,
    #[serde(default)]
    pub check_in: Option<DateTime<Utc>>,
    #[serde(default)]
    pub check_out: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl AttendanceLog {
    pub fn is_absent(&self) -> bool {
        self.check_in.is_none() && self.check_out.is_none()
    }

    pub fn is_open(&self) -> bool {
        self.check_in.is_some() && self.check_out.is_none()
    }

    /// Time between check-in and check-out. `None` while the day is open or
    /// if the stamps are out of order (check-out must not precede check-in).
    pub fn worked(&self) -> Option<chrono::Duration> {
        match (self.check_in, self.check_out) {
            (Some(check_in), Some(check_out)) if check_out >= check_in => {
                Some(check_out - check_in)
            }
            _ => None,
        }
    }
}
