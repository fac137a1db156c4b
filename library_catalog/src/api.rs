use chrono::NaiveDate;
use paperclip::actix::Apiv2Schema;
use serde::{Deserialize, Serialize};

pub type AuthorId = i32;
pub type BookId = i32;

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
/// Author stored in the catalog
pub struct Author {
    pub id: AuthorId,
    pub first_name: String,
    pub last_name: String,
    pub biography: String,
    /// Serialized as YYYY-MM-DD
    pub birth_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
/// Complete set of author fields, required to create an author
pub struct AuthorDetails {
    pub first_name: String,
    pub last_name: String,
    pub biography: String,
    pub birth_date: NaiveDate,
}

impl AuthorDetails {
    pub fn with_id(self, id: AuthorId) -> Author {
        Author {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            biography: self.biography,
            birth_date: self.birth_date,
        }
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
/// Author payload where every field is optional.
/// Used as the body of create requests (validated to be complete) and partial updates.
pub struct AuthorPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub biography: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
}

impl AuthorPatch {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.biography.is_none()
            && self.birth_date.is_none()
    }
}

impl From<AuthorDetails> for AuthorPatch {
    fn from(details: AuthorDetails) -> Self {
        Self {
            first_name: Some(details.first_name),
            last_name: Some(details.last_name),
            biography: Some(details.biography),
            birth_date: Some(details.birth_date),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
/// Book stored in the catalog
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub year: i32,
    pub isbn: String,
    pub author_id: AuthorId,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
/// Complete set of book fields, required to create a book
pub struct BookDetails {
    pub title: String,
    pub year: i32,
    pub isbn: String,
    pub author_id: AuthorId,
}

impl BookDetails {
    pub fn with_id(self, id: BookId) -> Book {
        Book {
            id,
            title: self.title,
            year: self.year,
            isbn: self.isbn,
            author_id: self.author_id,
        }
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
/// Book payload where every field is optional
pub struct BookPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_id: Option<AuthorId>,
}

impl BookPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.year.is_none() && self.isbn.is_none() && self.author_id.is_none()
    }
}

impl From<BookDetails> for BookPatch {
    fn from(details: BookDetails) -> Self {
        Self {
            title: Some(details.title),
            year: Some(details.year),
            isbn: Some(details.isbn),
            author_id: Some(details.author_id),
        }
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
/// Body of the combined book and author update, a missing part counts as an empty patch
pub struct BookAuthorPayload {
    #[serde(default)]
    pub book: BookPatch,
    #[serde(default)]
    pub author: AuthorPatch,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
pub struct AuthorIdResponse {
    pub author_id: AuthorId,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
pub struct BookIdResponse {
    pub book_id: BookId,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
/// Body of every error response
pub struct ErrorResponse {
    /// Mirrors the HTTP status code
    pub code: u16,
    pub message: String,
    /// Every violation found, only present for validation failures
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

#[cfg(test)]
mod api_tests {
    use super::*;

    #[test]
    fn test_birth_date_uses_calendar_date_format() {
        let author = Author {
            id: 1,
            first_name: "Ursula".to_string(),
            last_name: "Le Guin".to_string(),
            biography: "Earthsea".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1929, 10, 21).unwrap(),
        };

        let json = serde_json::to_value(&author).unwrap();
        assert_eq!(json["birth_date"], "1929-10-21");

        let parsed: AuthorPatch =
            serde_json::from_str(r#"{"birth_date": "1929-10-21"}"#).unwrap();
        assert_eq!(parsed.birth_date, Some(author.birth_date));
    }

    #[test]
    fn test_patch_skips_absent_fields() {
        let patch = BookPatch {
            title: Some("Dune".to_string()),
            ..BookPatch::default()
        };
        assert_eq!(serde_json::to_string(&patch).unwrap(), r#"{"title":"Dune"}"#);
        assert!(!patch.is_empty());
        assert!(BookPatch::default().is_empty());
    }

    #[test]
    fn test_book_author_payload_parts_are_optional() {
        let payload: BookAuthorPayload =
            serde_json::from_str(r#"{"author": {"last_name": "Herbert"}}"#).unwrap();
        assert!(payload.book.is_empty());
        assert_eq!(payload.author.last_name.as_deref(), Some("Herbert"));
    }
}
