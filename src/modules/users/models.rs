use libris_authz::Role;
use libris_db::Document;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Marker stored in `deletedBy` when members close their own account.
pub const DELETED_BY_SELF: &str = "SELF";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    Active,
    Deleted,
}

/// Stored account record. Never serialized to clients; see [`UserProfile`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    /// Argon2 PHC string
    pub password_hash: String,
    pub role: Role,
    pub status: UserStatus,
    pub deleted_by: Option<String>,
    /// Ids of books currently on loan to this user
    pub books_borrowed: Vec<String>,
    /// Append-only history of returned book ids
    pub books_returned: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl User {
    pub fn new(username: String, password_hash: String, role: Role) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            username,
            password_hash,
            role,
            status: UserStatus::Active,
            deleted_by: None,
            books_borrowed: Vec::new(),
            books_returned: Vec::new(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }
}

impl Document for User {
    const COLLECTION: &'static str = "users";
    const UNIQUE_FIELD: Option<&'static str> = Some("username");

    fn id(&self) -> &str {
        &self.id
    }
}

/// Client-facing view of a user; the password hash never leaves the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub role: Role,
    pub status: UserStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_by: Option<String>,
    pub books_borrowed: Vec<String>,
    pub books_returned: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role,
            status: user.status,
            deleted_by: user.deleted_by,
            books_borrowed: user.books_borrowed,
            books_returned: user.books_returned,
            created_at: user.created_at,
        }
    }
}

/// Body of signup and librarian add-user.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateUser {
    pub username: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

/// Body of a user edit. A password change needs both password fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    pub username: Option<String>,
    pub role: Option<String>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersQuery {
    #[serde(default)]
    pub exclude_self: bool,
}

/// Who closed an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletedBy {
    Librarian(String),
    SelfService,
}

impl DeletedBy {
    pub fn marker(&self) -> &str {
        match self {
            DeletedBy::Librarian(id) => id,
            DeletedBy::SelfService => DELETED_BY_SELF,
        }
    }
}
