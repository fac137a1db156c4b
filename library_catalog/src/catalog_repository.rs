pub use in_memory_catalog_repository::InMemoryCatalogRepository;
pub use postgres_catalog_repository::{
    PostgresCatalogRepository, PostgresCatalogRepositoryConfig,
};

use crate::api::{Author, AuthorDetails, AuthorId, AuthorPatch, Book, BookDetails, BookId, BookPatch};

mod in_memory_catalog_repository;
mod postgres_catalog_repository;
mod update_query;

#[derive(thiserror::Error, Debug)]
pub enum CatalogRepositoryError {
    #[error("Author {0} not found")]
    AuthorNotFound(AuthorId),

    #[error("Book {0} not found")]
    BookNotFound(BookId),

    #[error("Author {0} still has books")]
    AuthorHasBooks(AuthorId),

    #[error("Failed to deserialize record: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("DatabaseFailure failure {0}")]
    DatabaseFailure(#[from] tokio_postgres::Error),

    #[error("Failed to get connection from pool {0}")]
    PoolFailure(#[from] deadpool_postgres::PoolError),

    #[error("Other error {0}")]
    Other(String),
}

impl CatalogRepositoryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::AuthorNotFound(_) | Self::BookNotFound(_))
    }
}

#[async_trait::async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Lists all authors ordered by id
    async fn get_all_authors(&self) -> Result<Vec<Author>, CatalogRepositoryError>;
    async fn get_author(&self, author_id: AuthorId) -> Result<Author, CatalogRepositoryError>;
    /// Adds author to repository, returns an id assigned to the author
    async fn create_author(&self, details: AuthorDetails)
        -> Result<AuthorId, CatalogRepositoryError>;
    /// Sets only the fields present in the patch.
    /// Empty patch succeeds without touching storage, otherwise fails with AuthorNotFound
    /// when there is no such author
    async fn update_author(
        &self,
        author_id: AuthorId,
        patch: AuthorPatch,
    ) -> Result<(), CatalogRepositoryError>;
    /// Deletes every book of the author one by one, then the author itself.
    /// The first failing delete aborts, books deleted before it stay deleted.
    /// A book added to the author meanwhile fails the delete with AuthorHasBooks.
    async fn delete_author(&self, author_id: AuthorId) -> Result<(), CatalogRepositoryError>;

    /// Lists all books ordered by id
    async fn get_all_books(&self) -> Result<Vec<Book>, CatalogRepositoryError>;
    async fn get_books_by_author(
        &self,
        author_id: AuthorId,
    ) -> Result<Vec<Book>, CatalogRepositoryError>;
    async fn get_book(&self, book_id: BookId) -> Result<Book, CatalogRepositoryError>;
    /// Adds book to repository, returns an id assigned to the book
    async fn create_book(&self, details: BookDetails) -> Result<BookId, CatalogRepositoryError>;
    /// Same contract as update_author
    async fn update_book(&self, book_id: BookId, patch: BookPatch)
        -> Result<(), CatalogRepositoryError>;
    async fn delete_book(&self, book_id: BookId) -> Result<(), CatalogRepositoryError>;

    /// Applies both patches atomically, nothing is persisted if either record is missing
    async fn update_book_and_author(
        &self,
        book_id: BookId,
        book_patch: BookPatch,
        author_id: AuthorId,
        author_patch: AuthorPatch,
    ) -> Result<(), CatalogRepositoryError>;
}
