use actix_web::http::header::LOCATION;
use actix_web::web::Data;
use actix_web::{Error, HttpResponse};
use paperclip::actix::{api_v2_operation, web, Apiv2Schema};
use serde::Deserialize;

use crate::api::{
    AuthorId, AuthorIdResponse, AuthorPatch, BookAuthorPayload, BookId, BookIdResponse,
    BookPatch, MessageResponse,
};
use crate::catalog_service::CatalogService;
use crate::errors::ApiError;

#[derive(Debug, Deserialize, Apiv2Schema)]
pub struct BookAuthorPath {
    pub book_id: BookId,
    pub author_id: AuthorId,
}

#[api_v2_operation]
pub async fn health() -> Result<HttpResponse, Error> {
    Ok(HttpResponse::Ok().finish())
}

#[api_v2_operation]
pub async fn get_all_authors(service: Data<CatalogService>) -> Result<HttpResponse, Error> {
    let authors = service.get_all_authors().await.map_err(ApiError::from)?;
    Ok(HttpResponse::Ok().json(authors))
}

#[api_v2_operation]
pub async fn create_author(
    service: Data<CatalogService>,
    author: web::Json<AuthorPatch>,
) -> Result<HttpResponse, Error> {
    let author_id = service
        .create_author(author.into_inner())
        .await
        .map_err(ApiError::from)?;

    tracing::info!("Created author {}", author_id);
    Ok(HttpResponse::Created()
        .append_header((LOCATION, format!("/authors/{}", author_id)))
        .json(AuthorIdResponse { author_id }))
}

#[api_v2_operation]
pub async fn get_author(
    service: Data<CatalogService>,
    author_id: web::Path<AuthorId>,
) -> Result<HttpResponse, Error> {
    let author = service
        .get_author(author_id.into_inner())
        .await
        .map_err(ApiError::from)?;
    Ok(HttpResponse::Ok().json(author))
}

#[api_v2_operation]
pub async fn update_author(
    service: Data<CatalogService>,
    author_id: web::Path<AuthorId>,
    patch: web::Json<AuthorPatch>,
) -> Result<HttpResponse, Error> {
    let author_id = author_id.into_inner();
    service
        .update_author(author_id, patch.into_inner())
        .await
        .map_err(ApiError::from)?;
    Ok(HttpResponse::Ok().json(AuthorIdResponse { author_id }))
}

#[api_v2_operation]
pub async fn delete_author(
    service: Data<CatalogService>,
    author_id: web::Path<AuthorId>,
) -> Result<HttpResponse, Error> {
    let author_id = author_id.into_inner();
    service
        .delete_author(author_id)
        .await
        .map_err(ApiError::from)?;

    tracing::info!("Deleted author {} with their books", author_id);
    Ok(HttpResponse::Ok().json(AuthorIdResponse { author_id }))
}

#[api_v2_operation]
pub async fn get_all_books(service: Data<CatalogService>) -> Result<HttpResponse, Error> {
    let books = service.get_all_books().await.map_err(ApiError::from)?;
    Ok(HttpResponse::Ok().json(books))
}

#[api_v2_operation]
pub async fn create_book(
    service: Data<CatalogService>,
    book: web::Json<BookPatch>,
) -> Result<HttpResponse, Error> {
    let book_id = service
        .create_book(book.into_inner())
        .await
        .map_err(ApiError::from)?;

    tracing::info!("Created book {}", book_id);
    Ok(HttpResponse::Created()
        .append_header((LOCATION, format!("/books/{}", book_id)))
        .json(BookIdResponse { book_id }))
}

#[api_v2_operation]
pub async fn get_book(
    service: Data<CatalogService>,
    book_id: web::Path<BookId>,
) -> Result<HttpResponse, Error> {
    let book = service
        .get_book(book_id.into_inner())
        .await
        .map_err(ApiError::from)?;
    Ok(HttpResponse::Ok().json(book))
}

#[api_v2_operation]
pub async fn update_book(
    service: Data<CatalogService>,
    book_id: web::Path<BookId>,
    patch: web::Json<BookPatch>,
) -> Result<HttpResponse, Error> {
    let book_id = book_id.into_inner();
    service
        .update_book(book_id, patch.into_inner())
        .await
        .map_err(ApiError::from)?;
    Ok(HttpResponse::Ok().json(BookIdResponse { book_id }))
}

#[api_v2_operation]
pub async fn delete_book(
    service: Data<CatalogService>,
    book_id: web::Path<BookId>,
) -> Result<HttpResponse, Error> {
    let book_id = book_id.into_inner();
    service.delete_book(book_id).await.map_err(ApiError::from)?;
    Ok(HttpResponse::Ok().json(BookIdResponse { book_id }))
}

#[api_v2_operation]
pub async fn update_book_and_author(
    service: Data<CatalogService>,
    path: web::Path<BookAuthorPath>,
    payload: web::Json<BookAuthorPayload>,
) -> Result<HttpResponse, Error> {
    let BookAuthorPath { book_id, author_id } = path.into_inner();
    let BookAuthorPayload { book, author } = payload.into_inner();
    service
        .update_book_and_author(book_id, book, author_id, author)
        .await
        .map_err(ApiError::from)?;

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Book and author updated successfully".to_string(),
    }))
}
