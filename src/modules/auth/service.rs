//! Credential checks: signup and login.

use libris_authz::{Identity, PasswordHasher, Role, TokenCodec};
use libris_db::Store;
use serde::Serialize;

use crate::error::LibraryError;
use crate::modules::users::{
    models::{CreateUser, User},
    service::create_user,
};

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub role: Role,
}

pub fn signup(store: &Store, hasher: &PasswordHasher, input: CreateUser) -> Result<User, LibraryError> {
    create_user(store, hasher, input)
}

/// Exchange a username and password for a signed token.
///
/// Deleted accounts are refused before the password is looked at. Unknown
/// usernames and wrong passwords share one error.
pub fn login(
    store: &Store,
    hasher: &PasswordHasher,
    tokens: &TokenCodec,
    username: &str,
    password: &str,
) -> Result<Session, LibraryError> {
    let user = store
        .read(|tx| tx.find_one_by::<User>("username", username))?
        .map(|u| u.doc);

    let Some(user) = user else {
        tracing::warn!(username, "login failed: unknown username");
        return Err(LibraryError::InvalidCredentials);
    };
    if !user.is_active() {
        tracing::warn!(user_id = %user.id, "login refused: account deleted");
        return Err(LibraryError::AccountDeleted);
    }
    if !hasher.verify(password, &user.password_hash)? {
        tracing::warn!(user_id = %user.id, "login failed: wrong password");
        return Err(LibraryError::InvalidCredentials);
    }

    let issued = tokens.issue(&Identity {
        id: user.id.clone(),
        role: user.role,
    })?;
    tracing::info!(user_id = %user.id, role = %user.role, expires_at = %issued.expires_at, "login succeeded");

    Ok(Session {
        token: issued.token,
        role: user.role,
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::modules::users::{lifecycle, models::DeletedBy};
    use crate::test_support::{fast_hasher, migrated_store};

    fn codec() -> TokenCodec {
        TokenCodec::new("test-secret", Duration::from_secs(3600))
    }

    fn signup_as(store: &Store, hasher: &PasswordHasher, username: &str, role: &str) -> User {
        signup(
            store,
            hasher,
            CreateUser {
                username: Some(username.into()),
                password: Some("s3cret".into()),
                role: Some(role.into()),
            },
        )
        .unwrap()
    }

    #[test]
    fn signup_then_login_yields_matching_identity() {
        let store = migrated_store();
        let hasher = fast_hasher();
        let tokens = codec();
        let user = signup_as(&store, &hasher, "ada", "LIBRARIAN");

        let session = login(&store, &hasher, &tokens, "ada", "s3cret").unwrap();
        assert_eq!(session.role, Role::Librarian);

        let identity = tokens.verify(&session.token).unwrap();
        assert_eq!(identity.id, user.id);
        assert_eq!(identity.role, Role::Librarian);
    }

    #[test]
    fn password_with_surrounding_spaces_logs_in_verbatim() {
        let store = migrated_store();
        let hasher = fast_hasher();
        signup(
            &store,
            &hasher,
            CreateUser {
                username: Some("ada".into()),
                password: Some(" secret ".into()),
                role: Some("MEMBER".into()),
            },
        )
        .unwrap();

        assert!(login(&store, &hasher, &codec(), "ada", " secret ").is_ok());
        assert!(matches!(
            login(&store, &hasher, &codec(), "ada", "secret"),
            Err(LibraryError::InvalidCredentials)
        ));
    }

    #[test]
    fn wrong_password_and_unknown_user_are_indistinguishable() {
        let store = migrated_store();
        let hasher = fast_hasher();
        signup_as(&store, &hasher, "ada", "MEMBER");

        let wrong = login(&store, &hasher, &codec(), "ada", "nope").unwrap_err();
        let unknown = login(&store, &hasher, &codec(), "bob", "s3cret").unwrap_err();
        assert!(matches!(wrong, LibraryError::InvalidCredentials));
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[test]
    fn deleted_account_is_refused_regardless_of_password() {
        let store = migrated_store();
        let hasher = fast_hasher();
        let user = signup_as(&store, &hasher, "ada", "MEMBER");
        lifecycle::delete_user(&store, &user.id, DeletedBy::SelfService).unwrap();

        for password in ["s3cret", "wrong"] {
            let err = login(&store, &hasher, &codec(), "ada", password).unwrap_err();
            assert!(matches!(err, LibraryError::AccountDeleted));
        }
    }
}
