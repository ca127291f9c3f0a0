//! Account creation, lookup and editing.

use libris_authz::{PasswordHasher, Role};
use libris_db::{Store, Versioned};

use super::models::{CreateUser, UpdateUser, User};
use crate::error::{optional, required, secret, LibraryError};

fn parse_role(raw: String) -> Result<Role, LibraryError> {
    raw.parse().map_err(LibraryError::Validation)
}

/// Shared by signup and librarian add-user. The raw password is hashed with a
/// fresh salt and never stored.
pub fn create_user(
    store: &Store,
    hasher: &PasswordHasher,
    input: CreateUser,
) -> Result<User, LibraryError> {
    let username = required("username", input.username)?;
    let password = secret("password", input.password)?;
    let role = parse_role(required("role", input.role)?)?;

    let user = User::new(username, hasher.hash(&password)?, role);
    store.transaction(|tx| tx.insert(&user))?;

    tracing::info!(user_id = %user.id, username = %user.username, role = %user.role, "user created");
    Ok(user)
}

/// Active accounts, optionally leaving out the caller.
pub fn list_active_users(store: &Store, exclude: Option<&str>) -> Result<Vec<User>, LibraryError> {
    let users = store.read(|tx| tx.find_by::<User>("status", "ACTIVE"))?;
    Ok(users
        .into_iter()
        .map(|u| u.doc)
        .filter(|u| Some(u.id.as_str()) != exclude)
        .collect())
}

pub(crate) fn load_active(
    tx: &libris_db::Tx<'_>,
    id: &str,
) -> Result<Versioned<User>, LibraryError> {
    tx.get::<User>(id)?
        .filter(|u| u.doc.is_active())
        .ok_or(LibraryError::NotFound("User"))
}

/// Tokens outlive account deletion, so write operations re-check that the
/// acting account is still active.
pub fn ensure_active_account(store: &Store, id: &str) -> Result<(), LibraryError> {
    match store.read(|tx| tx.get::<User>(id))? {
        Some(user) if user.doc.is_active() => Ok(()),
        _ => {
            tracing::warn!(user_id = %id, "write rejected: acting account is deleted");
            Err(LibraryError::AccountDeleted)
        }
    }
}

pub fn get_active_user(store: &Store, id: &str) -> Result<User, LibraryError> {
    Ok(store.read(|tx| load_active(tx, id))?.doc)
}

/// Edit username and/or role; change the password when the current one is
/// re-verified. The write is compare-and-set against the record that was
/// verified, so a concurrent edit surfaces as a retryable conflict.
pub fn update_user(
    store: &Store,
    hasher: &PasswordHasher,
    id: &str,
    input: UpdateUser,
) -> Result<User, LibraryError> {
    let username = optional("username", input.username)?;
    let role = optional("role", input.role)?.map(parse_role).transpose()?;
    let current_password = input.current_password.filter(|p| !p.is_empty());
    let new_password = input.new_password.filter(|p| !p.is_empty());

    let password_change = match (current_password, new_password) {
        (Some(current), Some(new)) => Some((current, new)),
        (None, None) => None,
        _ => {
            return Err(LibraryError::Validation(
                "currentPassword and newPassword must be provided together".to_string(),
            ))
        }
    };

    let mut user = store.read(|tx| load_active(tx, id))?;

    if let Some((current, new)) = password_change {
        if !hasher.verify(&current, &user.doc.password_hash)? {
            tracing::warn!(user_id = %id, "password change rejected: current password mismatch");
            return Err(LibraryError::InvalidCurrentPassword);
        }
        user.doc.password_hash = hasher.hash(&new)?;
    }
    if let Some(username) = username {
        user.doc.username = username;
    }
    if let Some(role) = role {
        user.doc.role = role;
    }

    store.transaction(|tx| tx.save(&mut user))?;
    tracing::info!(user_id = %id, "user updated");
    Ok(user.doc)
}
