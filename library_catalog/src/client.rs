use anyhow::{bail, Context};
use reqwest::StatusCode;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_tracing::TracingMiddleware;

use crate::api::{
    Author, AuthorId, AuthorIdResponse, AuthorPatch, Book, BookAuthorPayload, BookId,
    BookIdResponse, BookPatch, ErrorResponse,
};

pub struct LibraryCatalogClient {
    url: String,
    client: ClientWithMiddleware,
}

/// Reads the JSON error body, falls back to the status line
async fn error_message(response: reqwest::Response) -> String {
    let status = response.status();
    match response.json::<ErrorResponse>().await {
        Ok(error) if error.errors.is_empty() => error.message,
        Ok(error) => format!("{}: {}", error.message, error.errors.join(", ")),
        Err(_) => status.to_string(),
    }
}

impl LibraryCatalogClient {
    pub fn new(url: &str) -> anyhow::Result<Self> {
        let reqwest_client = reqwest::Client::builder()
            .build()
            .context("Failed to build reqwest client")?;
        let client = ClientBuilder::new(reqwest_client)
            // Insert the tracing middleware
            .with(TracingMiddleware::default())
            .build();

        Ok(Self {
            url: url.to_string(),
            client,
        })
    }

    /// Calls GET /authors endpoint
    pub async fn list_authors(&self) -> anyhow::Result<Vec<Author>> {
        let response = self
            .client
            .get(format!("{}/authors", self.url))
            .send()
            .await?;
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            bail!("Failed to list authors {}", error_message(response).await)
        }
    }

    /// Calls GET /authors/{author_id} endpoint
    /// Returns None if the author is not in the catalog
    pub async fn get_author(&self, author_id: AuthorId) -> anyhow::Result<Option<Author>> {
        let response = self
            .client
            .get(format!("{}/authors/{}", self.url, author_id))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            Ok(None)
        } else if response.status().is_success() {
            Ok(Some(response.json().await?))
        } else {
            bail!("Failed to get author {}", error_message(response).await)
        }
    }

    /// Calls POST /authors endpoint
    /// Returns id of the created author
    pub async fn create_author(&self, author: AuthorPatch) -> anyhow::Result<AuthorId> {
        let response = self
            .client
            .post(format!("{}/authors", self.url))
            .json(&author)
            .send()
            .await?;
        if !response.status().is_success() {
            bail!("Failed to create author {}", error_message(response).await)
        }
        let created: AuthorIdResponse = response.json().await?;
        Ok(created.author_id)
    }

    /// Calls PUT /authors/{author_id} endpoint
    pub async fn update_author(
        &self,
        author_id: AuthorId,
        patch: AuthorPatch,
    ) -> anyhow::Result<()> {
        let response = self
            .client
            .put(format!("{}/authors/{}", self.url, author_id))
            .json(&patch)
            .send()
            .await?;
        if !response.status().is_success() {
            bail!("Failed to update author {}", error_message(response).await)
        }
        Ok(())
    }

    /// Calls DELETE /authors/{author_id} endpoint, books of the author are deleted too
    pub async fn delete_author(&self, author_id: AuthorId) -> anyhow::Result<()> {
        let response = self
            .client
            .delete(format!("{}/authors/{}", self.url, author_id))
            .send()
            .await?;
        if !response.status().is_success() {
            bail!("Failed to delete author {}", error_message(response).await)
        }
        Ok(())
    }

    /// Calls GET /books endpoint
    pub async fn list_books(&self) -> anyhow::Result<Vec<Book>> {
        let response = self
            .client
            .get(format!("{}/books", self.url))
            .send()
            .await?;
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            bail!("Failed to list books {}", error_message(response).await)
        }
    }

    /// Calls GET /books/{book_id} endpoint
    /// Returns None if the book is not in the catalog
    pub async fn get_book(&self, book_id: BookId) -> anyhow::Result<Option<Book>> {
        let response = self
            .client
            .get(format!("{}/books/{}", self.url, book_id))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            Ok(None)
        } else if response.status().is_success() {
            Ok(Some(response.json().await?))
        } else {
            bail!("Failed to get book {}", error_message(response).await)
        }
    }

    /// Calls POST /books endpoint
    /// Returns id of the created book
    pub async fn create_book(&self, book: BookPatch) -> anyhow::Result<BookId> {
        let response = self
            .client
            .post(format!("{}/books", self.url))
            .json(&book)
            .send()
            .await?;
        if !response.status().is_success() {
            bail!("Failed to create book {}", error_message(response).await)
        }
        let created: BookIdResponse = response.json().await?;
        Ok(created.book_id)
    }

    /// Calls PUT /books/{book_id} endpoint
    pub async fn update_book(&self, book_id: BookId, patch: BookPatch) -> anyhow::Result<()> {
        let response = self
            .client
            .put(format!("{}/books/{}", self.url, book_id))
            .json(&patch)
            .send()
            .await?;
        if !response.status().is_success() {
            bail!("Failed to update book {}", error_message(response).await)
        }
        Ok(())
    }

    /// Calls DELETE /books/{book_id} endpoint
    pub async fn delete_book(&self, book_id: BookId) -> anyhow::Result<()> {
        let response = self
            .client
            .delete(format!("{}/books/{}", self.url, book_id))
            .send()
            .await?;
        if !response.status().is_success() {
            bail!("Failed to delete book {}", error_message(response).await)
        }
        Ok(())
    }

    /// Calls PUT /books/{book_id}/authors/{author_id} endpoint
    /// Either both records are updated or none of them
    pub async fn update_book_and_author(
        &self,
        book_id: BookId,
        author_id: AuthorId,
        payload: BookAuthorPayload,
    ) -> anyhow::Result<()> {
        let response = self
            .client
            .put(format!("{}/books/{}/authors/{}", self.url, book_id, author_id))
            .json(&payload)
            .send()
            .await?;
        if !response.status().is_success() {
            bail!(
                "Failed to update book and author {}",
                error_message(response).await
            )
        }
        Ok(())
    }
}
