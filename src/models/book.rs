//! Book model and request types

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Book record as stored and returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Assigned by the store on creation
    #[serde(default)]
    pub id: Option<i64>,
    #[schema(example = "The Great Gatsby")]
    pub title: String,
    #[schema(example = "F. Scott Fitzgerald")]
    pub author: String,
    #[schema(example = "978-0-7432-7356-5")]
    pub isbn: String,
    #[schema(value_type = String, format = Date, example = "1925-04-10")]
    pub publication_date: NaiveDate,
    #[schema(value_type = f64, example = 15.99)]
    pub price: Decimal,
    #[schema(example = 50)]
    pub stock_quantity: i32,
    pub description: Option<String>,
}

impl Book {
    /// Copy of this book carrying `id`
    pub fn with_id(self, id: i64) -> Self {
        Self { id: Some(id), ..self }
    }

    /// Copy of this book with a different stock quantity, everything else kept
    pub fn with_stock(self, stock_quantity: i32) -> Self {
        Self {
            stock_quantity,
            ..self
        }
    }

    /// ISBN comparison ignores surrounding whitespace on both sides
    pub fn has_isbn(&self, isbn: &str) -> bool {
        self.isbn.trim() == isbn.trim()
    }
}

/// Create / update book request.
///
/// Required fields are optional here so that a missing value is reported as a
/// validation error on that field rather than as a malformed body.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookRequest {
    /// Ignored: ids are always assigned by the store
    #[serde(default)]
    pub id: Option<i64>,
    #[validate(length(
        min = 1,
        max = 200,
        message = "Title must be between 1 and 200 characters"
    ))]
    pub title: Option<String>,
    #[validate(length(
        min = 1,
        max = 100,
        message = "Author must be between 1 and 100 characters"
    ))]
    pub author: Option<String>,
    #[validate(length(
        min = 10,
        max = 17,
        message = "ISBN must be between 10 and 17 characters"
    ))]
    pub isbn: Option<String>,
    #[schema(value_type = Option<String>, format = Date)]
    pub publication_date: Option<NaiveDate>,
    #[schema(value_type = Option<f64>)]
    pub price: Option<Decimal>,
    #[validate(range(min = 0, message = "Stock quantity cannot be negative"))]
    pub stock_quantity: Option<i32>,
    #[validate(length(max = 1000, message = "Description cannot exceed 1000 characters"))]
    pub description: Option<String>,
}

/// Title search query
#[derive(Debug, Deserialize)]
pub struct TitleQuery {
    pub title: Option<String>,
}

/// Author search query
#[derive(Debug, Deserialize)]
pub struct AuthorQuery {
    pub author: Option<String>,
}

/// Stock update query
#[derive(Debug, Deserialize)]
pub struct StockQuery {
    pub quantity: Option<i32>,
}

/// Low-stock listing query
#[derive(Debug, Deserialize)]
pub struct LowStockQuery {
    pub threshold: Option<i32>,
}
