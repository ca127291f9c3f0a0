//! Catalog management.

use libris_authz::Identity;
use libris_db::Store;

use super::models::{Book, BookStatus, CreateBook, DeletedBook, UpdateBook};
use crate::error::{optional, required, LibraryError};

pub fn add_book(store: &Store, input: CreateBook) -> Result<Book, LibraryError> {
    let book = Book::new(
        required("title", input.title)?,
        required("author", input.author)?,
    );
    store.transaction(|tx| tx.insert(&book))?;
    tracing::info!(book_id = %book.id, title = %book.title, "book added");
    Ok(book)
}

pub fn list_books(store: &Store) -> Result<Vec<Book>, LibraryError> {
    let books = store.read(|tx| tx.all::<Book>())?;
    Ok(books.into_iter().map(|b| b.doc).collect())
}

pub fn get_book(store: &Store, id: &str) -> Result<Book, LibraryError> {
    store
        .read(|tx| tx.get::<Book>(id))?
        .map(|b| b.doc)
        .ok_or(LibraryError::NotFound("Book"))
}

pub fn update_book(store: &Store, id: &str, input: UpdateBook) -> Result<Book, LibraryError> {
    let title = optional("title", input.title)?;
    let author = optional("author", input.author)?;
    if title.is_none() && author.is_none() {
        return Err(LibraryError::Validation(
            "title or author is required".to_string(),
        ));
    }

    let book = store.transaction(|tx| {
        let mut book = tx.get::<Book>(id)?.ok_or(LibraryError::NotFound("Book"))?;
        if let Some(title) = title {
            book.doc.title = title;
        }
        if let Some(author) = author {
            book.doc.author = author;
        }
        tx.save(&mut book)?;
        Ok::<_, LibraryError>(book.doc)
    })?;

    tracing::info!(book_id = %book.id, "book updated");
    Ok(book)
}

/// Archive the book under the deleting identity, then remove it from the
/// catalog. Both writes commit together. Borrowed books cannot be deleted.
pub fn delete_book(store: &Store, actor: &Identity, id: &str) -> Result<DeletedBook, LibraryError> {
    let archived: Result<DeletedBook, LibraryError> = store.transaction(|tx| {
        let book = tx.get::<Book>(id)?.ok_or(LibraryError::NotFound("Book"))?;
        if book.doc.status == BookStatus::Borrowed {
            return Err(LibraryError::Conflict(
                "Book already borrowed by someone else",
            ));
        }

        let archived = DeletedBook::snapshot(&book.doc, &actor.id);
        tx.insert(&archived)?;
        tx.delete::<Book>(id)?;
        Ok(archived)
    });

    match &archived {
        Ok(record) => tracing::info!(
            book_id = %id,
            deleted_by = %record.deleted_by,
            "book archived and removed from catalog"
        ),
        Err(LibraryError::Conflict(reason)) => {
            tracing::warn!(book_id = %id, reason, "book deletion rejected")
        }
        Err(_) => {}
    }
    archived
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{librarian, migrated_store};

    fn dune() -> CreateBook {
        CreateBook {
            title: Some("Dune".into()),
            author: Some("Herbert".into()),
        }
    }

    #[test]
    fn add_requires_title_and_author() {
        let store = migrated_store();
        let err = add_book(
            &store,
            CreateBook {
                title: Some("Dune".into()),
                author: None,
            },
        )
        .unwrap_err();
        assert!(matches!(err, LibraryError::Validation(msg) if msg == "author is required"));
    }

    #[test]
    fn titles_are_unique() {
        let store = migrated_store();
        add_book(&store, dune()).unwrap();
        let err = add_book(&store, dune()).unwrap_err();
        assert!(matches!(err, LibraryError::DuplicateKey { field: "title" }));
        assert_eq!(list_books(&store).unwrap().len(), 1);
    }

    #[test]
    fn update_changes_only_given_fields() {
        let store = migrated_store();
        let book = add_book(&store, dune()).unwrap();

        let updated = update_book(
            &store,
            &book.id,
            UpdateBook {
                title: None,
                author: Some("Frank Herbert".into()),
            },
        )
        .unwrap();
        assert_eq!(updated.title, "Dune");
        assert_eq!(updated.author, "Frank Herbert");
        assert_eq!(get_book(&store, &book.id).unwrap(), updated);
    }

    #[test]
    fn renaming_onto_a_taken_title_fails() {
        let store = migrated_store();
        add_book(&store, dune()).unwrap();
        let emma = add_book(
            &store,
            CreateBook {
                title: Some("Emma".into()),
                author: Some("Austen".into()),
            },
        )
        .unwrap();

        let err = update_book(
            &store,
            &emma.id,
            UpdateBook {
                title: Some("Dune".into()),
                author: None,
            },
        )
        .unwrap_err();
        assert!(matches!(err, LibraryError::DuplicateKey { field: "title" }));
        assert_eq!(get_book(&store, &emma.id).unwrap().title, "Emma");
    }

    #[test]
    fn update_missing_book_is_not_found() {
        let store = migrated_store();
        let err = update_book(
            &store,
            "nope",
            UpdateBook {
                title: Some("X".into()),
                author: None,
            },
        )
        .unwrap_err();
        assert!(matches!(err, LibraryError::NotFound("Book")));
    }

    #[test]
    fn delete_archives_exactly_once() {
        let store = migrated_store();
        let actor = librarian("lib-1");
        let book = add_book(&store, dune()).unwrap();

        let archived = delete_book(&store, &actor, &book.id).unwrap();
        assert_eq!(archived.title, "Dune");
        assert_eq!(archived.author, "Herbert");
        assert_eq!(archived.deleted_by, "lib-1");

        assert!(matches!(
            get_book(&store, &book.id),
            Err(LibraryError::NotFound("Book"))
        ));
        let archive = store.read(|tx| tx.all::<DeletedBook>()).unwrap();
        assert_eq!(archive.len(), 1);

        assert!(matches!(
            delete_book(&store, &actor, &book.id),
            Err(LibraryError::NotFound("Book"))
        ));
        assert_eq!(store.read(|tx| tx.count::<DeletedBook>()).unwrap(), 1);
    }

    #[test]
    fn deleted_title_can_be_added_and_archived_again() {
        let store = migrated_store();
        let actor = librarian("lib-1");

        let first = add_book(&store, dune()).unwrap();
        delete_book(&store, &actor, &first.id).unwrap();
        let second = add_book(&store, dune()).unwrap();
        delete_book(&store, &actor, &second.id).unwrap();

        assert_eq!(store.read(|tx| tx.count::<DeletedBook>()).unwrap(), 2);
    }

    #[test]
    fn borrowed_book_cannot_be_deleted() {
        let store = migrated_store();
        let book = add_book(&store, dune()).unwrap();
        store
            .transaction(|tx| {
                let mut stored = tx.get::<Book>(&book.id)?.unwrap();
                stored.doc.status = BookStatus::Borrowed;
                tx.save(&mut stored)
            })
            .unwrap();

        let err = delete_book(&store, &librarian("lib-1"), &book.id).unwrap_err();
        assert!(matches!(err, LibraryError::Conflict(_)));
        assert_eq!(get_book(&store, &book.id).unwrap().status, BookStatus::Borrowed);
        assert_eq!(store.read(|tx| tx.count::<DeletedBook>()).unwrap(), 0);
    }
}
