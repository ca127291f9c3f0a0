use libris_db::Document;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Availability of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookStatus {
    Available,
    Borrowed,
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: String,
    /// Unique across the catalog
    pub title: String,
    pub author: String,
    pub status: BookStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Book {
    pub fn new(title: String, author: String) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            title,
            author,
            status: BookStatus::Available,
            created_at: OffsetDateTime::now_utc(),
        }
    }
}

impl Document for Book {
    const COLLECTION: &'static str = "books";
    const UNIQUE_FIELD: Option<&'static str> = Some("title");

    fn id(&self) -> &str {
        &self.id
    }
}

/// Archival snapshot of a deleted book. Written once, never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedBook {
    pub id: String,
    /// Id the book had while it was in the catalog
    pub book_id: String,
    pub title: String,
    pub author: String,
    pub status: BookStatus,
    pub deleted_by: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub deleted_at: OffsetDateTime,
}

impl DeletedBook {
    pub fn snapshot(book: &Book, deleted_by: &str) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            book_id: book.id.clone(),
            title: book.title.clone(),
            author: book.author.clone(),
            status: book.status,
            deleted_by: deleted_by.to_string(),
            created_at: book.created_at,
            deleted_at: OffsetDateTime::now_utc(),
        }
    }
}

impl Document for DeletedBook {
    const COLLECTION: &'static str = "deleted_books";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Request body for adding a book.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateBook {
    pub title: Option<String>,
    pub author: Option<String>,
}

/// Request body for editing a book; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateBook {
    pub title: Option<String>,
    pub author: Option<String>,
}
