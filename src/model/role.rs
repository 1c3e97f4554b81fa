use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Closed set of dashboard roles. The wire envelope and the `role` cookie
/// both carry the uppercase name; anything else fails to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
pub enum Role {
    #[serde(rename = "ADMIN")]
    #[strum(serialize = "ADMIN")]
    Admin,
    #[serde(rename = "EMPLOYEE")]
    #[strum(serialize = "EMPLOYEE")]
    Employee,
}

impl Role {
    pub fn is_employee(self) -> bool {
        matches!(self, Self::Employee)
    }
}
