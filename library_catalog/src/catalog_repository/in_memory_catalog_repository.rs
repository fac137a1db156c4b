use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI32, Ordering};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;

use crate::api::{
    Author, AuthorDetails, AuthorId, AuthorPatch, Book, BookDetails, BookId, BookPatch,
};
use crate::catalog_repository::{CatalogRepository, CatalogRepositoryError};

#[derive(Default)]
struct Catalog {
    authors: BTreeMap<AuthorId, Author>,
    books: BTreeMap<BookId, Book>,
}

/// Keeps the catalog in process memory, ids start at 1 like a SERIAL column
pub struct InMemoryCatalogRepository {
    author_sequence_generator: AtomicI32,
    book_sequence_generator: AtomicI32,
    catalog: parking_lot::RwLock<Catalog>,
}

impl Default for InMemoryCatalogRepository {
    fn default() -> Self {
        Self {
            author_sequence_generator: AtomicI32::new(1),
            book_sequence_generator: AtomicI32::new(1),
            catalog: Default::default(),
        }
    }
}

/// Merges the patch into the record the same way a JSON merge patch does
fn apply_patch<T, P>(record: &T, patch: &P) -> Result<T, CatalogRepositoryError>
where
    T: Serialize + DeserializeOwned,
    P: Serialize,
{
    let mut result = json!(record);
    json_patch::merge(&mut result, &json!(patch));
    Ok(serde_json::from_value(result)?)
}

impl InMemoryCatalogRepository {
    fn remove_author(&self, author_id: AuthorId) -> Result<(), CatalogRepositoryError> {
        let mut catalog = self.catalog.write();
        if catalog.books.values().any(|book| book.author_id == author_id) {
            return Err(CatalogRepositoryError::AuthorHasBooks(author_id));
        }
        catalog
            .authors
            .remove(&author_id)
            .map(|_| ())
            .ok_or(CatalogRepositoryError::AuthorNotFound(author_id))
    }
}

#[async_trait::async_trait]
impl CatalogRepository for InMemoryCatalogRepository {
    async fn get_all_authors(&self) -> Result<Vec<Author>, CatalogRepositoryError> {
        Ok(self.catalog.read().authors.values().cloned().collect())
    }

    async fn get_author(&self, author_id: AuthorId) -> Result<Author, CatalogRepositoryError> {
        self.catalog
            .read()
            .authors
            .get(&author_id)
            .cloned()
            .ok_or(CatalogRepositoryError::AuthorNotFound(author_id))
    }

    async fn create_author(
        &self,
        details: AuthorDetails,
    ) -> Result<AuthorId, CatalogRepositoryError> {
        let id = self
            .author_sequence_generator
            .fetch_add(1, Ordering::Relaxed);
        self.catalog
            .write()
            .authors
            .insert(id, details.with_id(id));
        Ok(id)
    }

    async fn update_author(
        &self,
        author_id: AuthorId,
        patch: AuthorPatch,
    ) -> Result<(), CatalogRepositoryError> {
        if patch.is_empty() {
            return Ok(());
        }

        let mut catalog = self.catalog.write();
        let author = catalog
            .authors
            .get_mut(&author_id)
            .ok_or(CatalogRepositoryError::AuthorNotFound(author_id))?;
        *author = apply_patch(&*author, &patch)?;
        Ok(())
    }

    async fn delete_author(&self, author_id: AuthorId) -> Result<(), CatalogRepositoryError> {
        for book in self.get_books_by_author(author_id).await? {
            self.delete_book(book.id).await?;
        }

        self.remove_author(author_id)
    }

    async fn get_all_books(&self) -> Result<Vec<Book>, CatalogRepositoryError> {
        Ok(self.catalog.read().books.values().cloned().collect())
    }

    async fn get_books_by_author(
        &self,
        author_id: AuthorId,
    ) -> Result<Vec<Book>, CatalogRepositoryError> {
        Ok(self
            .catalog
            .read()
            .books
            .values()
            .filter(|book| book.author_id == author_id)
            .cloned()
            .collect())
    }

    async fn get_book(&self, book_id: BookId) -> Result<Book, CatalogRepositoryError> {
        self.catalog
            .read()
            .books
            .get(&book_id)
            .cloned()
            .ok_or(CatalogRepositoryError::BookNotFound(book_id))
    }

    async fn create_book(&self, details: BookDetails) -> Result<BookId, CatalogRepositoryError> {
        let id = self.book_sequence_generator.fetch_add(1, Ordering::Relaxed);
        self.catalog.write().books.insert(id, details.with_id(id));
        Ok(id)
    }

    async fn update_book(
        &self,
        book_id: BookId,
        patch: BookPatch,
    ) -> Result<(), CatalogRepositoryError> {
        if patch.is_empty() {
            return Ok(());
        }

        let mut catalog = self.catalog.write();
        let book = catalog
            .books
            .get_mut(&book_id)
            .ok_or(CatalogRepositoryError::BookNotFound(book_id))?;
        *book = apply_patch(&*book, &patch)?;
        Ok(())
    }

    async fn delete_book(&self, book_id: BookId) -> Result<(), CatalogRepositoryError> {
        self.catalog
            .write()
            .books
            .remove(&book_id)
            .map(|_| ())
            .ok_or(CatalogRepositoryError::BookNotFound(book_id))
    }

    async fn update_book_and_author(
        &self,
        book_id: BookId,
        book_patch: BookPatch,
        author_id: AuthorId,
        author_patch: AuthorPatch,
    ) -> Result<(), CatalogRepositoryError> {
        let mut catalog = self.catalog.write();

        // Both records are computed before anything is written back
        let updated_book = if book_patch.is_empty() {
            None
        } else {
            let book = catalog
                .books
                .get(&book_id)
                .ok_or(CatalogRepositoryError::BookNotFound(book_id))?;
            Some(apply_patch(book, &book_patch)?)
        };

        let updated_author = if author_patch.is_empty() {
            None
        } else {
            let author = catalog
                .authors
                .get(&author_id)
                .ok_or(CatalogRepositoryError::AuthorNotFound(author_id))?;
            Some(apply_patch(author, &author_patch)?)
        };

        if let Some(book) = updated_book {
            catalog.books.insert(book_id, book);
        }
        if let Some(author) = updated_author {
            catalog.authors.insert(author_id, author);
        }
        Ok(())
    }
}

#[cfg(test)]
mod in_memory_catalog_repository_tests {
    use chrono::NaiveDate;

    use super::*;

    fn author_details(last_name: &str) -> AuthorDetails {
        AuthorDetails {
            first_name: "Frank".to_string(),
            last_name: last_name.to_string(),
            biography: "Science fiction author".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1920, 10, 8).unwrap(),
        }
    }

    fn book_details(title: &str, author_id: AuthorId) -> BookDetails {
        BookDetails {
            title: title.to_string(),
            year: 1965,
            isbn: "0306406152".to_string(),
            author_id,
        }
    }

    #[tokio::test]
    /// Tests if create_author and get_author work correctly
    async fn test_create_author_and_get_it() {
        let repo = InMemoryCatalogRepository::default();

        let not_existing_author_id = 20000;
        assert!(matches!(
            repo.get_author(not_existing_author_id).await,
            Err(CatalogRepositoryError::AuthorNotFound(..))
        ));

        let details = author_details("Herbert");
        let id = repo
            .create_author(details.clone())
            .await
            .expect("Failed to add author");

        let author = repo.get_author(id).await.expect("Failed to get author");
        assert_eq!(author, details.with_id(id));
    }

    #[tokio::test]
    /// Listing keeps insertion order and starts empty
    async fn test_create_books_and_list_them() {
        let repo = InMemoryCatalogRepository::default();
        assert_eq!(repo.get_all_books().await.unwrap(), vec![]);
        assert_eq!(repo.get_all_authors().await.unwrap(), vec![]);

        let author_id = repo.create_author(author_details("Herbert")).await.unwrap();
        let id_1 = repo
            .create_book(book_details("title1", author_id))
            .await
            .unwrap();
        let id_2 = repo
            .create_book(book_details("title2", author_id))
            .await
            .unwrap();

        assert_eq!(
            repo.get_all_books().await.unwrap(),
            vec![
                book_details("title1", author_id).with_id(id_1),
                book_details("title2", author_id).with_id(id_2),
            ]
        );
    }

    #[tokio::test]
    /// Partial update leaves the fields that were not given untouched
    async fn test_update_book_patch_and_get_it() {
        let repo = InMemoryCatalogRepository::default();

        // empty patch is a no-op even for a missing book
        repo.update_book(2000, BookPatch::default())
            .await
            .expect("Empty patch should succeed");

        let missing = repo
            .update_book(
                2000,
                BookPatch {
                    title: Some("x".to_string()),
                    ..BookPatch::default()
                },
            )
            .await;
        assert!(matches!(
            missing,
            Err(CatalogRepositoryError::BookNotFound(2000))
        ));

        let id = repo.create_book(book_details("xx", 1)).await.unwrap();
        repo.update_book(
            id,
            BookPatch {
                title: Some("patchedTitle".to_string()),
                ..BookPatch::default()
            },
        )
        .await
        .expect("Failed to patch");

        assert_eq!(
            repo.get_book(id).await.unwrap(),
            book_details("patchedTitle", 1).with_id(id)
        );
    }

    #[tokio::test]
    async fn test_delete_author_deletes_their_books() {
        let repo = InMemoryCatalogRepository::default();
        let author_id = repo.create_author(author_details("Herbert")).await.unwrap();
        let other_author_id = repo.create_author(author_details("Asimov")).await.unwrap();
        let book_1 = repo
            .create_book(book_details("Dune", author_id))
            .await
            .unwrap();
        let book_2 = repo
            .create_book(book_details("Dune Messiah", author_id))
            .await
            .unwrap();
        let other_book = repo
            .create_book(book_details("Foundation", other_author_id))
            .await
            .unwrap();

        repo.delete_author(author_id).await.unwrap();

        assert!(matches!(
            repo.get_book(book_1).await,
            Err(CatalogRepositoryError::BookNotFound(..))
        ));
        assert!(matches!(
            repo.get_book(book_2).await,
            Err(CatalogRepositoryError::BookNotFound(..))
        ));
        assert!(repo.get_book(other_book).await.is_ok());
        assert!(matches!(
            repo.delete_author(author_id).await,
            Err(CatalogRepositoryError::AuthorNotFound(..))
        ));
    }

    #[tokio::test]
    async fn test_update_book_and_author_is_all_or_nothing() {
        let repo = InMemoryCatalogRepository::default();
        let author_id = repo.create_author(author_details("Herbert")).await.unwrap();
        let book_id = repo
            .create_book(book_details("Dune", author_id))
            .await
            .unwrap();

        let result = repo
            .update_book_and_author(
                book_id,
                BookPatch {
                    title: Some("Changed".to_string()),
                    ..BookPatch::default()
                },
                author_id + 1,
                AuthorPatch {
                    last_name: Some("Changed".to_string()),
                    ..AuthorPatch::default()
                },
            )
            .await;
        assert!(matches!(
            result,
            Err(CatalogRepositoryError::AuthorNotFound(..))
        ));
        assert_eq!(repo.get_book(book_id).await.unwrap().title, "Dune");

        let result = repo
            .update_book_and_author(
                book_id + 1,
                BookPatch {
                    title: Some("Changed".to_string()),
                    ..BookPatch::default()
                },
                author_id,
                AuthorPatch {
                    last_name: Some("Changed".to_string()),
                    ..AuthorPatch::default()
                },
            )
            .await;
        assert!(matches!(
            result,
            Err(CatalogRepositoryError::BookNotFound(..))
        ));
        assert_eq!(
            repo.get_author(author_id).await.unwrap(),
            author_details("Herbert").with_id(author_id)
        );

        repo.update_book_and_author(
            book_id,
            BookPatch {
                title: Some("Changed".to_string()),
                ..BookPatch::default()
            },
            author_id,
            AuthorPatch {
                last_name: Some("Changed".to_string()),
                ..AuthorPatch::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(repo.get_book(book_id).await.unwrap().title, "Changed");
        assert_eq!(
            repo.get_author(author_id).await.unwrap().last_name,
            "Changed"
        );
    }

    #[tokio::test]
    async fn test_author_with_remaining_book_is_not_removed() {
        let repo = InMemoryCatalogRepository::default();
        let author_id = repo.create_author(author_details("Herbert")).await.unwrap();
        let book_id = repo
            .create_book(book_details("Dune", author_id))
            .await
            .unwrap();

        assert!(matches!(
            repo.remove_author(author_id),
            Err(CatalogRepositoryError::AuthorHasBooks(..))
        ));
        assert!(repo.get_author(author_id).await.is_ok());
        assert!(repo.get_book(book_id).await.is_ok());
    }
}
