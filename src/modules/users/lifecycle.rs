//! Account lifecycle: ACTIVE -> DELETED.
//!
//! Deleting an account releases every book still on loan to it: each book
//! goes back to AVAILABLE and its id moves from `booksBorrowed` to
//! `booksReturned`. The release and the status flip are one transaction.

use libris_db::Store;

use super::{
    models::{DeletedBy, UserStatus},
    service::load_active,
};
use crate::error::LibraryError;
use crate::modules::books::models::{Book, BookStatus};

/// Outcome of closing an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedAccount {
    pub user_id: String,
    /// Books that were on loan and are now available again
    pub released: Vec<String>,
}

pub fn delete_user(
    store: &Store,
    target_id: &str,
    deleted_by: DeletedBy,
) -> Result<ClosedAccount, LibraryError> {
    let closed = store.transaction(|tx| {
        let mut user = load_active(tx, target_id)?;

        let released: Vec<String> = user.doc.books_borrowed.drain(..).collect();
        for book_id in &released {
            // A loan can only point at a live book; tolerate a missing one so a
            // stale ledger never blocks account closure.
            let Some(mut book) = tx.get::<Book>(book_id)? else {
                tracing::warn!(user_id = %target_id, book_id = %book_id, "loaned book no longer in catalog");
                continue;
            };
            book.doc.status = BookStatus::Available;
            tx.save(&mut book)?;
        }

        user.doc.books_returned.extend(released.iter().cloned());
        user.doc.status = UserStatus::Deleted;
        user.doc.deleted_by = Some(deleted_by.marker().to_string());
        tx.save(&mut user)?;

        Ok::<_, LibraryError>(ClosedAccount {
            user_id: user.doc.id,
            released,
        })
    })?;

    tracing::info!(
        user_id = %closed.user_id,
        deleted_by = %deleted_by.marker(),
        released = closed.released.len(),
        "account deleted"
    );
    Ok(closed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::{models::CreateBook, service as books};
    use crate::modules::lending::service as lending;
    use crate::modules::users::models::User;
    use crate::modules::users::service::get_active_user;
    use crate::test_support::{active_borrowers, member_account, migrated_store};

    fn add(store: &Store, title: &str) -> Book {
        books::add_book(
            store,
            CreateBook {
                title: Some(title.into()),
                author: Some("Anon".into()),
            },
        )
        .unwrap()
    }

    fn load(store: &Store, id: &str) -> User {
        store
            .read(|tx| tx.get::<User>(id))
            .unwrap()
            .expect("user exists")
            .doc
    }

    #[test]
    fn deleting_member_releases_every_loan() {
        let store = migrated_store();
        let member = member_account(&store, "m1");
        let a = add(&store, "A");
        let b = add(&store, "B");
        let c = add(&store, "C");
        lending::borrow(&store, &member.id, &a.id).unwrap();
        lending::borrow(&store, &member.id, &b.id).unwrap();

        let closed = delete_user(&store, &member.id, DeletedBy::Librarian("lib-1".into())).unwrap();
        assert_eq!(closed.released, vec![a.id.clone(), b.id.clone()]);

        for book in [&a, &b, &c] {
            assert_eq!(
                books::get_book(&store, &book.id).unwrap().status,
                BookStatus::Available
            );
            assert_eq!(active_borrowers(&store, &book.id).unwrap(), 0);
        }

        let stored = load(&store, &member.id);
        assert_eq!(stored.status, UserStatus::Deleted);
        assert_eq!(stored.deleted_by.as_deref(), Some("lib-1"));
        assert!(stored.books_borrowed.is_empty());
        assert_eq!(stored.books_returned, vec![a.id, b.id]);
    }

    #[test]
    fn self_service_delete_without_loans_is_a_status_flip() {
        let store = migrated_store();
        let member = member_account(&store, "m1");

        let closed = delete_user(&store, &member.id, DeletedBy::SelfService).unwrap();
        assert!(closed.released.is_empty());

        let stored = load(&store, &member.id);
        assert_eq!(stored.status, UserStatus::Deleted);
        assert_eq!(stored.deleted_by.as_deref(), Some("SELF"));
        assert!(stored.books_returned.is_empty());
        assert!(matches!(
            get_active_user(&store, &member.id),
            Err(LibraryError::NotFound("User"))
        ));
    }

    #[test]
    fn deleting_twice_or_unknown_is_not_found() {
        let store = migrated_store();
        let member = member_account(&store, "m1");
        delete_user(&store, &member.id, DeletedBy::SelfService).unwrap();

        assert!(matches!(
            delete_user(&store, &member.id, DeletedBy::SelfService),
            Err(LibraryError::NotFound("User"))
        ));
        assert!(matches!(
            delete_user(&store, "nobody", DeletedBy::SelfService),
            Err(LibraryError::NotFound("User"))
        ));
    }
}
