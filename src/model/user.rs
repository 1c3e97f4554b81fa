use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::role::Role;

/// The current actor as returned by the session check, and the shape
/// employee records come back in (the write-only password travels only on
/// the create/update form, never here).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Employee records share the user shape on the read path.
pub type Employee = User;

/// A user-valued field that some endpoints populate and others return as a
/// bare id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserRef {
    User(User),
    Id(String),
}

impl UserRef {
    pub fn id(&self) -> &str {
        match self {
            Self::User(user) => &user.id,
            Self::Id(id) => id,
        }
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            Self::User(user) => Some(user),
            Self::Id(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_mongo_style_id_alias() {
        let user: User = serde_json::from_str(
            r#"{"_id":"u1","name":"Ana","email":"ana@salon.test","role":"ADMIN"}"#,
        )
        .unwrap();
        assert_eq!(user.id, "u1");
        assert_eq!(user.role, Role::Admin);
    }

    #[test]
    fn user_ref_decodes_both_shapes() {
        let bare: UserRef = serde_json::from_str("\"u2\"").unwrap();
        assert_eq!(bare.id(), "u2");
        assert!(bare.user().is_none());

        let populated: UserRef = serde_json::from_str(
            r#"{"id":"u3","name":"Bo","email":"bo@salon.test","role":"EMPLOYEE"}"#,
        )
        .unwrap();
        assert_eq!(populated.id(), "u3");
        assert!(populated.user().is_some());
    }
}
