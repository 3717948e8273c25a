//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, health};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bookstore API",
        version = "0.1.0",
        description = "Bookstore inventory REST API"
    ),
    servers(
        (url = "/api", description = "Bookstore API")
    ),
    paths(
        health::health_check,
        books::list_books,
        books::get_book,
        books::get_book_by_isbn,
        books::search_by_title,
        books::search_by_author,
        books::create_book,
        books::update_book,
        books::delete_book,
        books::update_stock,
        books::count_books,
        books::low_stock,
    ),
    components(
        schemas(
            crate::models::book::Book,
            crate::models::book::BookRequest,
            health::HealthResponse,
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Book inventory management")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
