//! Book inventory endpoints

use axum::{extract::State, http::StatusCode, Json};

use super::{ApiJson, ApiPath, ApiQuery};
use crate::{
    error::{AppError, AppResult, ErrorResponse},
    models::book::{AuthorQuery, Book, BookRequest, LowStockQuery, StockQuery, TitleQuery},
    AppState,
};

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Book {} not found", id))
}

/// List all books
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    responses(
        (status = 200, description = "All books in the inventory", body = Vec<Book>)
    )
)]
pub async fn list_books(State(state): State<AppState>) -> Json<Vec<Book>> {
    Json(state.services.books.find_all())
}

/// Get book by ID
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(("id" = i64, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<Book>> {
    state
        .services
        .books
        .find_by_id(id)
        .map(Json)
        .ok_or_else(|| not_found(id))
}

/// Get book by ISBN
#[utoipa::path(
    get,
    path = "/books/isbn/{isbn}",
    tag = "books",
    params(("isbn" = String, Path, description = "ISBN number")),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "No book with this ISBN", body = ErrorResponse)
    )
)]
pub async fn get_book_by_isbn(
    State(state): State<AppState>,
    ApiPath(isbn): ApiPath<String>,
) -> AppResult<Json<Book>> {
    state
        .services
        .books
        .find_by_isbn(&isbn)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No book with ISBN {}", isbn)))
}

/// Search books by title (case-insensitive, partial)
#[utoipa::path(
    get,
    path = "/books/search/title",
    tag = "books",
    params(("title" = Option<String>, Query, description = "Title to search for")),
    responses(
        (status = 200, description = "Matching books", body = Vec<Book>)
    )
)]
pub async fn search_by_title(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<TitleQuery>,
) -> Json<Vec<Book>> {
    tracing::debug!("Title search: {:?}", query.title);
    Json(state.services.books.find_by_title(query.title.as_deref()))
}

/// Search books by author (case-insensitive, partial)
#[utoipa::path(
    get,
    path = "/books/search/author",
    tag = "books",
    params(("author" = Option<String>, Query, description = "Author to search for")),
    responses(
        (status = 200, description = "Matching books", body = Vec<Book>)
    )
)]
pub async fn search_by_author(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<AuthorQuery>,
) -> Json<Vec<Book>> {
    tracing::debug!("Author search: {:?}", query.author);
    Json(state.services.books.find_by_author(query.author.as_deref()))
}

/// Create a book
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    request_body = BookRequest,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid data or duplicate ISBN", body = ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<BookRequest>,
) -> AppResult<(StatusCode, Json<Book>)> {
    let book = state.services.books.create(request)?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// Replace a book
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    params(("id" = i64, Path, description = "Book ID")),
    request_body = BookRequest,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 400, description = "Invalid data or duplicate ISBN", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<BookRequest>,
) -> AppResult<Json<Book>> {
    state
        .services
        .books
        .update(id, request)?
        .map(Json)
        .ok_or_else(|| not_found(id))
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    params(("id" = i64, Path, description = "Book ID")),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<StatusCode> {
    if state.services.books.delete(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}

/// Set the stock quantity of a book
#[utoipa::path(
    patch,
    path = "/books/{id}/stock",
    tag = "books",
    params(
        ("id" = i64, Path, description = "Book ID"),
        ("quantity" = i32, Query, description = "New stock quantity")
    ),
    responses(
        (status = 200, description = "Stock updated", body = Book),
        (status = 400, description = "Missing or negative quantity", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn update_stock(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<StockQuery>,
) -> AppResult<Json<Book>> {
    state
        .services
        .books
        .update_stock(id, query.quantity)?
        .map(Json)
        .ok_or_else(|| not_found(id))
}

/// Total number of books
#[utoipa::path(
    get,
    path = "/books/count",
    tag = "books",
    responses(
        (status = 200, description = "Number of books", body = usize)
    )
)]
pub async fn count_books(State(state): State<AppState>) -> Json<usize> {
    Json(state.services.books.count())
}

/// Books with stock below a threshold
#[utoipa::path(
    get,
    path = "/books/low-stock",
    tag = "books",
    params(("threshold" = Option<i32>, Query, description = "Stock threshold (default: 10)")),
    responses(
        (status = 200, description = "Books below the threshold", body = Vec<Book>),
        (status = 400, description = "Negative threshold", body = ErrorResponse)
    )
)]
pub async fn low_stock(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<LowStockQuery>,
) -> AppResult<Json<Vec<Book>>> {
    let threshold = query
        .threshold
        .unwrap_or(state.config.catalog.low_stock_threshold);
    let books = state.services.books.find_books_with_low_stock(threshold)?;
    Ok(Json(books))
}
