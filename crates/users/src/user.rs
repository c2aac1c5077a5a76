use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tienda_core::{ColumnSpec, DomainError, TableSchema};

/// Column constraints for the `users` table.
///
/// `username` and `email` carry unique indexes: the index is the source of
/// truth for uniqueness, the handler's pre-check is only an advisory fast
/// path that produces a friendlier error when it wins the race.
pub const USERS_SCHEMA: TableSchema = TableSchema {
    table: "users",
    columns: &[
        ColumnSpec {
            name: "username",
            max_len: Some(100),
            required: true,
            unique: true,
        },
        ColumnSpec {
            name: "email",
            max_len: Some(100),
            required: true,
            unique: true,
        },
        ColumnSpec {
            name: "password",
            max_len: Some(255),
            required: true,
            unique: false,
        },
        ColumnSpec {
            name: "role",
            max_len: None,
            required: false,
            unique: false,
        },
        ColumnSpec {
            name: "isActive",
            max_len: None,
            required: false,
            unique: false,
        },
    ],
};

/// Stored role for a user account. No authorization is derived from it here;
/// it is data carried by the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub const ALL: &'static [&'static str] = &["user", "admin"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(DomainError::validation(format!("rol desconocido: {other}"))),
        }
    }
}

/// A stored user row.
///
/// `id` and `password` are immutable once created: [`UserChanges`] cannot
/// express them, so no update path can alter them. The password is stored as
/// given (not hashed) — observed behavior of the current design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Attributes for inserting a user.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// Partial update: only present fields are applied, the rest of the row is
/// left unchanged. `id` and `password` are intentionally absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

impl UserChanges {
    /// Soft-delete change set: mark the row inactive, touch nothing else.
    pub fn deactivated() -> Self {
        Self {
            is_active: Some(false),
            ..Self::default()
        }
    }
}

impl User {
    /// Apply the present fields of a change set.
    pub fn apply(&mut self, changes: &UserChanges) {
        if let Some(username) = &changes.username {
            self.username = username.clone();
        }
        if let Some(email) = &changes.email {
            self.email = email.clone();
        }
        if let Some(role) = changes.role {
            self.role = role;
        }
        if let Some(is_active) = changes.is_active {
            self.is_active = is_active;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> User {
        User {
            id: 3,
            username: "Liz".to_string(),
            email: "liz@gmail.com".to_string(),
            password: "123456".to_string(),
            role: Role::User,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn apply_only_touches_present_fields() {
        let mut user = sample();

        user.apply(&UserChanges {
            email: Some("liz@hotmail.com".to_string()),
            ..UserChanges::default()
        });

        assert_eq!(user.email, "liz@hotmail.com");
        assert_eq!(user.username, "Liz");
        assert_eq!(user.role, Role::User);
        assert!(user.is_active);
    }

    #[test]
    fn apply_cannot_alter_id_or_password() {
        let mut user = sample();

        // A change set with every expressible field populated.
        user.apply(&UserChanges {
            username: Some("Lucia".to_string()),
            email: Some("lucia@gmail.com".to_string()),
            role: Some(Role::Admin),
            is_active: Some(false),
        });

        assert_eq!(user.id, 3);
        assert_eq!(user.password, "123456");
    }

    #[test]
    fn deactivated_change_set_only_clears_is_active() {
        let changes = UserChanges::deactivated();
        assert_eq!(changes.is_active, Some(false));
        assert!(changes.username.is_none());
        assert!(changes.email.is_none());
        assert!(changes.role.is_none());

        let mut user = sample();
        user.apply(&changes);
        assert!(!user.is_active);
        assert_eq!(user.username, "Liz");
    }

    #[test]
    fn role_round_trips_through_strings() {
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert!("root".parse::<Role>().is_err());
        assert_eq!(Role::default(), Role::User);
        assert_eq!(Role::Admin.as_str(), "admin");
    }

    #[test]
    fn serializes_with_camel_case_wire_fields() {
        let value = serde_json::to_value(sample()).unwrap();

        assert_eq!(value["username"], "Liz");
        assert_eq!(value["role"], "user");
        assert_eq!(value["isActive"], true);
        assert!(value.get("createdAt").is_some());
        assert!(value.get("is_active").is_none());
    }

    #[test]
    fn schema_marks_username_and_email_unique() {
        let unique: Vec<_> = USERS_SCHEMA.unique_columns().collect();
        assert_eq!(unique, vec!["username", "email"]);
        assert_eq!(USERS_SCHEMA.column("password").unwrap().max_len, Some(255));
    }
}
