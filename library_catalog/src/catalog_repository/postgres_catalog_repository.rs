use anyhow::Context;
use deadpool_postgres::{Pool, PoolConfig, Runtime};
use tokio_postgres::error::SqlState;
use tokio_postgres::{NoTls, Row};

use crate::api::{
    Author, AuthorDetails, AuthorId, AuthorPatch, Book, BookDetails, BookId, BookPatch,
};
use crate::catalog_repository::update_query::{as_params, author_update, book_update};
use crate::catalog_repository::{CatalogRepository, CatalogRepositoryError};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS authors (
        id              SERIAL PRIMARY KEY,
        first_name      TEXT NOT NULL,
        last_name       TEXT NOT NULL,
        biography       TEXT NOT NULL,
        birth_date      DATE NOT NULL
    );
    CREATE TABLE IF NOT EXISTS books (
        id              SERIAL PRIMARY KEY,
        title           TEXT NOT NULL,
        year            INTEGER NOT NULL,
        isbn            TEXT NOT NULL,
        author_id       INTEGER NOT NULL REFERENCES authors(id)
    );
";

pub struct PostgresCatalogRepository {
    pool: Pool,
}

impl PostgresCatalogRepository {
    async fn delete_author_row(&self, author_id: AuthorId) -> Result<(), CatalogRepositoryError> {
        let client = self.pool.get().await?;
        match client
            .execute("DELETE FROM authors WHERE id = $1", &[&author_id])
            .await
        {
            Ok(0) => Err(CatalogRepositoryError::AuthorNotFound(author_id)),
            Ok(_) => Ok(()),
            Err(err)
                if err
                    .as_db_error()
                    .map(|db_err| db_err.code() == &SqlState::FOREIGN_KEY_VIOLATION)
                    .unwrap_or_default() =>
            {
                Err(CatalogRepositoryError::AuthorHasBooks(author_id))
            }
            Err(other_err) => Err(other_err.into()),
        }
    }
}

pub struct PostgresCatalogRepositoryConfig {
    pub hostname: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    pub pool_size: usize,
}

impl PostgresCatalogRepository {
    /// Creates the connection pool, checks that the database is reachable and creates missing tables
    pub async fn init(config: PostgresCatalogRepositoryConfig) -> anyhow::Result<Self> {
        tracing::info!(
            "Connecting to postgres at {}:{}/{} as {}",
            config.hostname,
            config.port,
            config.database,
            config.username
        );

        let mut pool_config = deadpool_postgres::Config::new();
        pool_config.host = Some(config.hostname);
        pool_config.port = Some(config.port);
        pool_config.user = Some(config.username);
        pool_config.password = Some(config.password);
        pool_config.dbname = Some(config.database);
        pool_config.pool = Some(PoolConfig::new(config.pool_size));

        let pool = pool_config
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .context("Failed to create postgres pool")?;

        let client = pool.get().await.context("Failed to connect to postgres")?;
        client
            .batch_execute(SCHEMA)
            .await
            .context("Failed to setup tables")?;

        Ok(Self { pool })
    }
}

fn author_from_row(row: &Row) -> Result<Author, tokio_postgres::Error> {
    Ok(Author {
        id: row.try_get("id")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        biography: row.try_get("biography")?,
        birth_date: row.try_get("birth_date")?,
    })
}

fn book_from_row(row: &Row) -> Result<Book, tokio_postgres::Error> {
    Ok(Book {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        year: row.try_get("year")?,
        isbn: row.try_get("isbn")?,
        author_id: row.try_get("author_id")?,
    })
}

#[async_trait::async_trait]
impl CatalogRepository for PostgresCatalogRepository {
    async fn get_all_authors(&self) -> Result<Vec<Author>, CatalogRepositoryError> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare_cached(
                "SELECT id, first_name, last_name, biography, birth_date FROM authors ORDER BY id",
            )
            .await?;

        let rows = client.query(&stmt, &[]).await?;
        rows.iter()
            .map(|row| Ok(author_from_row(row)?))
            .collect()
    }

    async fn get_author(&self, author_id: AuthorId) -> Result<Author, CatalogRepositoryError> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare_cached(
                "SELECT id, first_name, last_name, biography, birth_date FROM authors WHERE id = $1",
            )
            .await?;

        let row = client
            .query_opt(&stmt, &[&author_id])
            .await?
            .ok_or(CatalogRepositoryError::AuthorNotFound(author_id))?;

        Ok(author_from_row(&row)?)
    }

    async fn create_author(
        &self,
        details: AuthorDetails,
    ) -> Result<AuthorId, CatalogRepositoryError> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare_cached(
                "INSERT INTO authors (first_name, last_name, biography, birth_date) \
                 VALUES ($1, $2, $3, $4) RETURNING id",
            )
            .await?;

        let rows = client
            .query(
                &stmt,
                &[
                    &details.first_name,
                    &details.last_name,
                    &details.biography,
                    &details.birth_date,
                ],
            )
            .await?;

        let author_id: AuthorId = rows
            .first()
            .ok_or_else(|| CatalogRepositoryError::Other("Id not returned".to_string()))?
            .try_get(0)?;

        Ok(author_id)
    }

    async fn update_author(
        &self,
        author_id: AuthorId,
        patch: AuthorPatch,
    ) -> Result<(), CatalogRepositoryError> {
        let Some((query, params)) = author_update(patch).build(author_id) else {
            return Ok(());
        };

        let client = self.pool.get().await?;
        let updated = client.execute(query.as_str(), &as_params(&params)).await?;
        if updated == 0 {
            return Err(CatalogRepositoryError::AuthorNotFound(author_id));
        }
        Ok(())
    }

    async fn delete_author(&self, author_id: AuthorId) -> Result<(), CatalogRepositoryError> {
        // Books go first, the author row is still referenced by them until then
        let books = self.get_books_by_author(author_id).await?;
        tracing::debug!("Deleting {} books of author {}", books.len(), author_id);
        for book in books {
            self.delete_book(book.id).await?;
        }

        self.delete_author_row(author_id).await
    }

    async fn get_all_books(&self) -> Result<Vec<Book>, CatalogRepositoryError> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare_cached("SELECT id, title, year, isbn, author_id FROM books ORDER BY id")
            .await?;

        let rows = client.query(&stmt, &[]).await?;
        rows.iter().map(|row| Ok(book_from_row(row)?)).collect()
    }

    async fn get_books_by_author(
        &self,
        author_id: AuthorId,
    ) -> Result<Vec<Book>, CatalogRepositoryError> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare_cached(
                "SELECT id, title, year, isbn, author_id FROM books WHERE author_id = $1 ORDER BY id",
            )
            .await?;

        let rows = client.query(&stmt, &[&author_id]).await?;
        rows.iter().map(|row| Ok(book_from_row(row)?)).collect()
    }

    async fn get_book(&self, book_id: BookId) -> Result<Book, CatalogRepositoryError> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare_cached("SELECT id, title, year, isbn, author_id FROM books WHERE id = $1")
            .await?;

        let row = client
            .query_opt(&stmt, &[&book_id])
            .await?
            .ok_or(CatalogRepositoryError::BookNotFound(book_id))?;

        Ok(book_from_row(&row)?)
    }

    async fn create_book(&self, details: BookDetails) -> Result<BookId, CatalogRepositoryError> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare_cached(
                "INSERT INTO books (title, year, isbn, author_id) VALUES ($1, $2, $3, $4) RETURNING id",
            )
            .await?;

        let rows = client
            .query(
                &stmt,
                &[
                    &details.title,
                    &details.year,
                    &details.isbn,
                    &details.author_id,
                ],
            )
            .await?;

        let book_id: BookId = rows
            .first()
            .ok_or_else(|| CatalogRepositoryError::Other("Id not returned".to_string()))?
            .try_get(0)?;

        Ok(book_id)
    }

    async fn update_book(
        &self,
        book_id: BookId,
        patch: BookPatch,
    ) -> Result<(), CatalogRepositoryError> {
        let Some((query, params)) = book_update(patch).build(book_id) else {
            return Ok(());
        };

        let client = self.pool.get().await?;
        let updated = client.execute(query.as_str(), &as_params(&params)).await?;
        if updated == 0 {
            return Err(CatalogRepositoryError::BookNotFound(book_id));
        }
        Ok(())
    }

    async fn delete_book(&self, book_id: BookId) -> Result<(), CatalogRepositoryError> {
        let client = self.pool.get().await?;
        let deleted = client
            .execute("DELETE FROM books WHERE id = $1", &[&book_id])
            .await?;
        if deleted == 0 {
            return Err(CatalogRepositoryError::BookNotFound(book_id));
        }
        Ok(())
    }

    async fn update_book_and_author(
        &self,
        book_id: BookId,
        book_patch: BookPatch,
        author_id: AuthorId,
        author_patch: AuthorPatch,
    ) -> Result<(), CatalogRepositoryError> {
        let mut client = self.pool.get().await?;
        // Returning early drops the transaction which rolls it back
        let transaction = client.transaction().await?;

        if let Some((query, params)) = book_update(book_patch).build(book_id) {
            if transaction.execute(query.as_str(), &as_params(&params)).await? == 0 {
                transaction.rollback().await?;
                return Err(CatalogRepositoryError::BookNotFound(book_id));
            }
        }

        if let Some((query, params)) = author_update(author_patch).build(author_id) {
            if transaction.execute(query.as_str(), &as_params(&params)).await? == 0 {
                transaction.rollback().await?;
                return Err(CatalogRepositoryError::AuthorNotFound(author_id));
            }
        }

        transaction.commit().await?;
        Ok(())
    }
}
