use actix_web::dev::ServiceResponse;
use actix_web::http::StatusCode;
use actix_web::middleware::{ErrorHandlerResponse, ErrorHandlers};
use actix_web::web::{JsonConfig, PathConfig};
use actix_web::ResponseError;
use paperclip::actix::web;

use crate::errors::ApiError;
use crate::handlers;

pub fn config_app(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/health").route(web::get().to(handlers::health)))
        .service(
            web::resource("/authors")
                .route(web::get().to(handlers::get_all_authors))
                .route(web::post().to(handlers::create_author)),
        )
        .service(
            web::resource("/authors/{author_id}")
                .route(web::get().to(handlers::get_author))
                .route(web::put().to(handlers::update_author))
                .route(web::delete().to(handlers::delete_author)),
        )
        .service(
            web::resource("/books")
                .route(web::get().to(handlers::get_all_books))
                .route(web::post().to(handlers::create_book)),
        )
        .service(
            web::resource("/books/{book_id}")
                .route(web::get().to(handlers::get_book))
                .route(web::put().to(handlers::update_book))
                .route(web::delete().to(handlers::delete_book)),
        )
        .service(
            web::resource("/books/{book_id}/authors/{author_id}")
                .route(web::put().to(handlers::update_book_and_author)),
        );
}

/// Undecodable bodies are answered with a JSON 400 instead of the plain text default
pub fn json_config() -> JsonConfig {
    JsonConfig::default().error_handler(|err, _req| {
        tracing::debug!("Rejected request payload {}", err);
        ApiError::InvalidRequest(format!("invalid request payload: {}", err)).into()
    })
}

/// Non numeric ids in the path are answered with a JSON 400
pub fn path_config() -> PathConfig {
    PathConfig::default().error_handler(|err, _req| {
        ApiError::InvalidRequest(format!("invalid id: {}", err)).into()
    })
}

/// Gives the empty 405 produced by the router a JSON error body
pub fn error_handlers<B: 'static>() -> ErrorHandlers<B> {
    ErrorHandlers::new().handler(StatusCode::METHOD_NOT_ALLOWED, render_method_not_allowed)
}

fn render_method_not_allowed<B>(
    res: ServiceResponse<B>,
) -> actix_web::Result<ErrorHandlerResponse<B>> {
    let (req, _) = res.into_parts();
    let res = ServiceResponse::new(req, ApiError::MethodNotAllowed.error_response())
        .map_into_right_body();
    Ok(ErrorHandlerResponse::Response(res))
}
