use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::api::{
    Author, AuthorDetails, AuthorId, AuthorPatch, Book, BookDetails, BookId, BookPatch,
};
use crate::catalog_repository::{CatalogRepository, CatalogRepositoryError};

static ISBN_10_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{9}[0-9X]$").expect("ISBN-10 regex should be valid"));
static ISBN_13_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{13}$").expect("ISBN-13 regex should be valid"));

#[derive(thiserror::Error, Debug)]
pub enum CatalogServiceError {
    #[error("Validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error(transparent)]
    Repository(#[from] CatalogRepositoryError),
}

/// Checks the shape of an ISBN-10 or ISBN-13, hyphens are ignored.
/// Check digits are not verified.
pub fn is_valid_isbn(isbn: &str) -> bool {
    let stripped = isbn.replace('-', "");
    ISBN_10_REGEX.is_match(&stripped) || ISBN_13_REGEX.is_match(&stripped)
}

fn validate_author_patch(patch: &AuthorPatch, errors: &mut Vec<String>) {
    let text_fields = [
        ("first_name", &patch.first_name),
        ("last_name", &patch.last_name),
        ("biography", &patch.biography),
    ];
    for (name, value) in text_fields {
        if value.as_deref().is_some_and(str::is_empty) {
            errors.push(format!("{} cannot be empty", name));
        }
    }
}

fn validate_book_patch(patch: &BookPatch, errors: &mut Vec<String>) {
    if patch.title.as_deref().is_some_and(str::is_empty) {
        errors.push("title cannot be empty".to_string());
    }
    if patch.year.is_some_and(|year| year <= 0) {
        errors.push("year must be a positive number".to_string());
    }
    if patch.author_id.is_some_and(|author_id| author_id <= 0) {
        errors.push("author_id must be a positive number".to_string());
    }
    if let Some(isbn) = &patch.isbn {
        if isbn.replace('-', "").is_empty() {
            errors.push("ISBN cannot be empty".to_string());
        } else if !is_valid_isbn(isbn) {
            errors.push("ISBN format is invalid".to_string());
        }
    }
}

fn required(errors: &mut Vec<String>, name: &str, present: bool) {
    if !present {
        errors.push(format!("{} is required", name));
    }
}

/// Turns a creation payload into complete details, collecting every violation
fn author_details_from_patch(patch: AuthorPatch) -> Result<AuthorDetails, Vec<String>> {
    let mut errors = vec![];
    required(&mut errors, "first_name", patch.first_name.is_some());
    required(&mut errors, "last_name", patch.last_name.is_some());
    required(&mut errors, "biography", patch.biography.is_some());
    required(&mut errors, "birth_date", patch.birth_date.is_some());
    validate_author_patch(&patch, &mut errors);

    match (
        patch.first_name,
        patch.last_name,
        patch.biography,
        patch.birth_date,
    ) {
        (Some(first_name), Some(last_name), Some(biography), Some(birth_date))
            if errors.is_empty() =>
        {
            Ok(AuthorDetails {
                first_name,
                last_name,
                biography,
                birth_date,
            })
        }
        _ => Err(errors),
    }
}

fn book_details_from_patch(patch: BookPatch) -> Result<BookDetails, Vec<String>> {
    let mut errors = vec![];
    required(&mut errors, "title", patch.title.is_some());
    required(&mut errors, "year", patch.year.is_some());
    required(&mut errors, "ISBN", patch.isbn.is_some());
    required(&mut errors, "author_id", patch.author_id.is_some());
    validate_book_patch(&patch, &mut errors);

    match (patch.title, patch.year, patch.isbn, patch.author_id) {
        (Some(title), Some(year), Some(isbn), Some(author_id)) if errors.is_empty() => {
            Ok(BookDetails {
                title,
                year,
                isbn,
                author_id,
            })
        }
        _ => Err(errors),
    }
}

/// Validates requests and delegates them to the repository
pub struct CatalogService {
    repository: Arc<dyn CatalogRepository>,
}

impl CatalogService {
    pub fn new(repository: Arc<dyn CatalogRepository>) -> Self {
        Self { repository }
    }

    /// Books may only point to authors that exist, the foreign key in storage is the backstop
    async fn ensure_author_exists(&self, author_id: AuthorId) -> Result<(), CatalogServiceError> {
        match self.repository.get_author(author_id).await {
            Ok(_) => Ok(()),
            Err(CatalogRepositoryError::AuthorNotFound(_)) => Err(CatalogServiceError::Validation(
                vec![format!("author {} does not exist", author_id)],
            )),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn get_all_authors(&self) -> Result<Vec<Author>, CatalogServiceError> {
        Ok(self.repository.get_all_authors().await?)
    }

    pub async fn get_author(&self, author_id: AuthorId) -> Result<Author, CatalogServiceError> {
        Ok(self.repository.get_author(author_id).await?)
    }

    pub async fn create_author(&self, patch: AuthorPatch) -> Result<AuthorId, CatalogServiceError> {
        let details = author_details_from_patch(patch).map_err(CatalogServiceError::Validation)?;
        Ok(self.repository.create_author(details).await?)
    }

    pub async fn update_author(
        &self,
        author_id: AuthorId,
        patch: AuthorPatch,
    ) -> Result<(), CatalogServiceError> {
        let mut errors = vec![];
        validate_author_patch(&patch, &mut errors);
        if !errors.is_empty() {
            return Err(CatalogServiceError::Validation(errors));
        }
        Ok(self.repository.update_author(author_id, patch).await?)
    }

    pub async fn delete_author(&self, author_id: AuthorId) -> Result<(), CatalogServiceError> {
        Ok(self.repository.delete_author(author_id).await?)
    }

    pub async fn get_all_books(&self) -> Result<Vec<Book>, CatalogServiceError> {
        Ok(self.repository.get_all_books().await?)
    }

    pub async fn get_books_by_author(
        &self,
        author_id: AuthorId,
    ) -> Result<Vec<Book>, CatalogServiceError> {
        Ok(self.repository.get_books_by_author(author_id).await?)
    }

    pub async fn get_book(&self, book_id: BookId) -> Result<Book, CatalogServiceError> {
        Ok(self.repository.get_book(book_id).await?)
    }

    pub async fn create_book(&self, patch: BookPatch) -> Result<BookId, CatalogServiceError> {
        let details = book_details_from_patch(patch).map_err(CatalogServiceError::Validation)?;
        self.ensure_author_exists(details.author_id).await?;
        Ok(self.repository.create_book(details).await?)
    }

    pub async fn update_book(
        &self,
        book_id: BookId,
        patch: BookPatch,
    ) -> Result<(), CatalogServiceError> {
        let mut errors = vec![];
        validate_book_patch(&patch, &mut errors);
        if !errors.is_empty() {
            return Err(CatalogServiceError::Validation(errors));
        }
        if let Some(author_id) = patch.author_id {
            self.ensure_author_exists(author_id).await?;
        }
        Ok(self.repository.update_book(book_id, patch).await?)
    }

    pub async fn delete_book(&self, book_id: BookId) -> Result<(), CatalogServiceError> {
        Ok(self.repository.delete_book(book_id).await?)
    }

    /// Validates both patches together so the response lists violations of both
    pub async fn update_book_and_author(
        &self,
        book_id: BookId,
        book_patch: BookPatch,
        author_id: AuthorId,
        author_patch: AuthorPatch,
    ) -> Result<(), CatalogServiceError> {
        let mut errors = vec![];
        validate_book_patch(&book_patch, &mut errors);
        validate_author_patch(&author_patch, &mut errors);
        if !errors.is_empty() {
            return Err(CatalogServiceError::Validation(errors));
        }
        if let Some(book_author_id) = book_patch.author_id {
            self.ensure_author_exists(book_author_id).await?;
        }
        Ok(self
            .repository
            .update_book_and_author(book_id, book_patch, author_id, author_patch)
            .await?)
    }
}
