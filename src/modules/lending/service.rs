//! Lending engine: AVAILABLE <-> BORROWED, plus each member's ledgers.
//!
//! Every transition reads the book and the member, checks the move is legal
//! and writes both records in one transaction. A rejected move writes nothing.

use libris_db::{Store, Tx, Versioned};

use crate::error::LibraryError;
use crate::modules::books::models::{Book, BookStatus};
use crate::modules::users::models::User;

fn load_member(tx: &Tx<'_>, member_id: &str) -> Result<Versioned<User>, LibraryError> {
    let member = tx
        .get::<User>(member_id)?
        .ok_or(LibraryError::NotFound("User"))?;
    if !member.doc.is_active() {
        return Err(LibraryError::AccountDeleted);
    }
    Ok(member)
}

fn load_book(tx: &Tx<'_>, book_id: &str) -> Result<Versioned<Book>, LibraryError> {
    tx.get::<Book>(book_id)?
        .ok_or(LibraryError::NotFound("Book"))
}

pub fn borrow(store: &Store, member_id: &str, book_id: &str) -> Result<Book, LibraryError> {
    let result: Result<Book, LibraryError> = store.transaction(|tx| {
        let mut member = load_member(tx, member_id)?;
        let mut book = load_book(tx, book_id)?;
        if book.doc.status != BookStatus::Available {
            return Err(LibraryError::Conflict("Book not available"));
        }

        book.doc.status = BookStatus::Borrowed;
        member.doc.books_borrowed.push(book.doc.id.clone());
        tx.save(&mut book)?;
        tx.save(&mut member)?;
        Ok(book.doc)
    });

    match &result {
        Ok(book) => tracing::info!(member_id, book_id, title = %book.title, "book borrowed"),
        Err(err) => tracing::warn!(member_id, book_id, error = %err, "borrow rejected"),
    }
    result
}

pub fn return_book(store: &Store, member_id: &str, book_id: &str) -> Result<Book, LibraryError> {
    let result: Result<Book, LibraryError> = store.transaction(|tx| {
        let mut member = load_member(tx, member_id)?;
        let mut book = load_book(tx, book_id)?;
        if book.doc.status != BookStatus::Borrowed {
            return Err(LibraryError::Conflict("Book not borrowed"));
        }
        let Some(slot) = member.doc.books_borrowed.iter().position(|id| id == book_id) else {
            return Err(LibraryError::Ownership);
        };

        book.doc.status = BookStatus::Available;
        let returned = member.doc.books_borrowed.remove(slot);
        member.doc.books_returned.push(returned);
        tx.save(&mut book)?;
        tx.save(&mut member)?;
        Ok(book.doc)
    });

    match &result {
        Ok(_) => tracing::info!(member_id, book_id, "book returned"),
        Err(err) => tracing::warn!(member_id, book_id, error = %err, "return rejected"),
    }
    result
}

/// Books currently on loan to the member, in borrow order.
pub fn list_borrowed(store: &Store, member_id: &str) -> Result<Vec<Book>, LibraryError> {
    store.read(|tx| {
        let member = load_member(tx, member_id)?;
        let books = tx.get_many::<Book>(&member.doc.books_borrowed)?;
        Ok(books.into_iter().map(|b| b.doc).collect())
    })
}

/// Returned books, oldest first. Ids whose book has since been deleted are
/// skipped; repeated loans of the same book appear once per return.
pub fn history(store: &Store, member_id: &str) -> Result<Vec<Book>, LibraryError> {
    store.read(|tx| {
        let member = load_member(tx, member_id)?;
        let books = tx.get_many::<Book>(&member.doc.books_returned)?;
        Ok(books.into_iter().map(|b| b.doc).collect())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::{models::CreateBook, service as books};
    use crate::modules::users::{lifecycle, models::DeletedBy};
    use crate::test_support::{active_borrowers, librarian, member_account, migrated_store};

    fn add(store: &Store, title: &str, author: &str) -> Book {
        books::add_book(
            store,
            CreateBook {
                title: Some(title.into()),
                author: Some(author.into()),
            },
        )
        .unwrap()
    }

    fn member(store: &Store, id: &str) -> User {
        store.read(|tx| tx.get::<User>(id)).unwrap().unwrap().doc
    }

    #[test]
    fn dune_borrow_and_return() {
        let store = migrated_store();
        let m = member_account(&store, "m");
        let dune = add(&store, "Dune", "Herrick");

        let borrowed = borrow(&store, &m.id, &dune.id).unwrap();
        assert_eq!(borrowed.status, BookStatus::Borrowed);
        assert_eq!(member(&store, &m.id).books_borrowed, vec![dune.id.clone()]);
        assert_eq!(active_borrowers(&store, &dune.id).unwrap(), 1);

        let returned = return_book(&store, &m.id, &dune.id).unwrap();
        assert_eq!(returned.status, BookStatus::Available);
        let after = member(&store, &m.id);
        assert!(after.books_borrowed.is_empty());
        assert_eq!(after.books_returned, vec![dune.id.clone()]);
        assert_eq!(active_borrowers(&store, &dune.id).unwrap(), 0);
    }

    #[test]
    fn double_borrow_conflicts_and_changes_nothing() {
        let store = migrated_store();
        let first = member_account(&store, "first");
        let second = member_account(&store, "second");
        let dune = add(&store, "Dune", "Herrick");
        borrow(&store, &first.id, &dune.id).unwrap();

        let err = borrow(&store, &second.id, &dune.id).unwrap_err();
        assert!(matches!(err, LibraryError::Conflict("Book not available")));

        assert!(member(&store, &second.id).books_borrowed.is_empty());
        assert_eq!(member(&store, &first.id).books_borrowed, vec![dune.id.clone()]);
        assert_eq!(active_borrowers(&store, &dune.id).unwrap(), 1);
    }

    #[test]
    fn returning_someone_elses_book_is_an_ownership_error() {
        let store = migrated_store();
        let owner = member_account(&store, "owner");
        let other = member_account(&store, "other");
        let dune = add(&store, "Dune", "Herrick");
        borrow(&store, &owner.id, &dune.id).unwrap();

        let err = return_book(&store, &other.id, &dune.id).unwrap_err();
        assert!(matches!(err, LibraryError::Ownership));

        assert_eq!(books::get_book(&store, &dune.id).unwrap().status, BookStatus::Borrowed);
        assert_eq!(member(&store, &owner.id).books_borrowed, vec![dune.id.clone()]);
        assert!(member(&store, &other.id).books_returned.is_empty());
    }

    #[test]
    fn returning_an_available_book_conflicts() {
        let store = migrated_store();
        let m = member_account(&store, "m");
        let dune = add(&store, "Dune", "Herrick");

        let err = return_book(&store, &m.id, &dune.id).unwrap_err();
        assert!(matches!(err, LibraryError::Conflict("Book not borrowed")));
    }

    #[test]
    fn concurrent_borrows_of_one_book_admit_exactly_one() {
        let store = migrated_store();
        let first = member_account(&store, "first");
        let second = member_account(&store, "second");
        let dune = add(&store, "Dune", "Herrick");
        let gate = std::sync::Barrier::new(2);

        let outcomes: Vec<Result<Book, LibraryError>> = std::thread::scope(|scope| {
            let handles: Vec<_> = [&first, &second]
                .into_iter()
                .map(|m| {
                    let (store, gate, book_id) = (store.clone(), &gate, dune.id.clone());
                    scope.spawn(move || {
                        gate.wait();
                        borrow(&store, &m.id, &book_id)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(outcomes
            .iter()
            .any(|r| matches!(r, Err(LibraryError::Conflict("Book not available")))));
        assert_eq!(active_borrowers(&store, &dune.id).unwrap(), 1);
        assert_eq!(books::get_book(&store, &dune.id).unwrap().status, BookStatus::Borrowed);
    }

    #[test]
    fn unknown_book_or_member() {
        let store = migrated_store();
        let m = member_account(&store, "m");
        let dune = add(&store, "Dune", "Herrick");

        assert!(matches!(
            borrow(&store, &m.id, "missing"),
            Err(LibraryError::NotFound("Book"))
        ));
        assert!(matches!(
            borrow(&store, "ghost", &dune.id),
            Err(LibraryError::NotFound("User"))
        ));
    }

    #[test]
    fn deleted_member_cannot_borrow() {
        let store = migrated_store();
        let m = member_account(&store, "m");
        let dune = add(&store, "Dune", "Herrick");
        lifecycle::delete_user(&store, &m.id, DeletedBy::SelfService).unwrap();

        assert!(matches!(
            borrow(&store, &m.id, &dune.id),
            Err(LibraryError::AccountDeleted)
        ));
        assert_eq!(books::get_book(&store, &dune.id).unwrap().status, BookStatus::Available);
    }

    #[test]
    fn history_keeps_repeats_and_skips_deleted_books() {
        let store = migrated_store();
        let m = member_account(&store, "m");
        let dune = add(&store, "Dune", "Herrick");
        let emma = add(&store, "Emma", "Austen");

        for _ in 0..2 {
            borrow(&store, &m.id, &dune.id).unwrap();
            return_book(&store, &m.id, &dune.id).unwrap();
        }
        borrow(&store, &m.id, &emma.id).unwrap();
        return_book(&store, &m.id, &emma.id).unwrap();
        books::delete_book(&store, &librarian("lib"), &emma.id).unwrap();

        let titles: Vec<String> = history(&store, &m.id)
            .unwrap()
            .into_iter()
            .map(|b| b.title)
            .collect();
        assert_eq!(titles, vec!["Dune", "Dune"]);
        assert_eq!(member(&store, &m.id).books_returned.len(), 3);
    }

    #[test]
    fn borrowed_lists_current_loans() {
        let store = migrated_store();
        let m = member_account(&store, "m");
        let dune = add(&store, "Dune", "Herrick");
        let emma = add(&store, "Emma", "Austen");
        borrow(&store, &m.id, &dune.id).unwrap();
        borrow(&store, &m.id, &emma.id).unwrap();
        return_book(&store, &m.id, &dune.id).unwrap();

        let current = list_borrowed(&store, &m.id).unwrap();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].id, emma.id);
    }
}
