//! Book inventory service: validation and ISBN uniqueness on top of the store

use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use validator::{Validate, ValidationErrors};

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookRequest},
    repository::Repository,
};

const MAX_PRICE_EXCLUSIVE: i64 = 1_000_000;
const MAX_PRICE_SCALE: u32 = 2;

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
}

impl BooksService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub fn find_all(&self) -> Vec<Book> {
        self.repository.books.find_all()
    }

    pub fn find_by_id(&self, id: i64) -> Option<Book> {
        if id <= 0 {
            return None;
        }
        self.repository.books.find_by_id(id)
    }

    /// Case-insensitive partial match on title
    pub fn find_by_title(&self, title: Option<&str>) -> Vec<Book> {
        match title {
            Some(title) => self.repository.books.find_by_title_containing(title),
            None => Vec::new(),
        }
    }

    /// Case-insensitive partial match on author
    pub fn find_by_author(&self, author: Option<&str>) -> Vec<Book> {
        match author {
            Some(author) => self.repository.books.find_by_author_containing(author),
            None => Vec::new(),
        }
    }

    pub fn find_by_isbn(&self, isbn: &str) -> Option<Book> {
        let isbn = isbn.trim();
        if isbn.is_empty() {
            return None;
        }
        self.repository.books.find_by_isbn(isbn)
    }

    /// Books with stock strictly below `threshold`
    pub fn find_books_with_low_stock(&self, threshold: i32) -> AppResult<Vec<Book>> {
        if threshold < 0 {
            return Err(AppError::validation("threshold", "Threshold cannot be negative"));
        }
        Ok(self.repository.books.find_by_stock_below(threshold))
    }

    pub fn count(&self) -> usize {
        self.repository.books.count()
    }

    pub fn exists(&self, id: i64) -> bool {
        id > 0 && self.repository.books.exists_by_id(id)
    }

    /// Create a new book. Any id in the request is ignored.
    pub fn create(&self, request: BookRequest) -> AppResult<Book> {
        let book = validate_request(&request, Local::now().date_naive())?;

        let created = self
            .repository
            .books
            .insert_unique_isbn(book)
            .inspect_err(|e| tracing::warn!("Rejected book create: {}", e))?;

        tracing::info!("Book created id={:?} isbn={}", created.id, created.isbn);
        Ok(created)
    }

    /// Replace the book at `id` with the request's data.
    ///
    /// `Ok(None)` when no book has that id.
    pub fn update(&self, id: i64, request: BookRequest) -> AppResult<Option<Book>> {
        if !self.exists(id) {
            return Ok(None);
        }

        let book = validate_request(&request, Local::now().date_naive())?;

        let updated = self
            .repository
            .books
            .replace_unique_isbn(id, book)
            .inspect_err(|e| tracing::warn!("Rejected update of book {}: {}", id, e))?;

        if updated.is_some() {
            tracing::info!("Book updated id={}", id);
        }
        Ok(updated)
    }

    pub fn delete(&self, id: i64) -> bool {
        if id <= 0 {
            return false;
        }
        let deleted = self.repository.books.delete_by_id(id);
        if deleted {
            tracing::info!("Book deleted id={}", id);
        }
        deleted
    }

    /// Set the stock quantity of a book, leaving every other field untouched
    pub fn update_stock(&self, id: i64, quantity: Option<i32>) -> AppResult<Option<Book>> {
        let quantity = match quantity {
            Some(quantity) if quantity >= 0 => quantity,
            _ => {
                return Err(AppError::validation(
                    "quantity",
                    "Stock quantity cannot be null or negative",
                ))
            }
        };

        if id <= 0 {
            return Ok(None);
        }

        let updated = self.repository.books.update_stock(id, quantity);
        if updated.is_some() {
            tracing::info!("Book {} stock set to {}", id, quantity);
        }
        Ok(updated)
    }

    /// Create the sample catalog when the store is empty.
    ///
    /// Returns the number of books created.
    pub fn seed_sample_data(&self) -> AppResult<usize> {
        if self.count() > 0 {
            tracing::debug!("Store not empty, skipping sample data");
            return Ok(0);
        }

        let samples = sample_books();
        let created = samples.len();
        for sample in samples {
            self.create(sample)?;
        }
        tracing::info!("Seeded {} sample books", created);
        Ok(created)
    }
}

/// Check every field of `request` and build the book to store.
///
/// Fields are checked in a fixed order; the first violation wins.
pub fn validate_request(request: &BookRequest, today: NaiveDate) -> AppResult<Book> {
    let constraint_errors = request.validate().err();
    // `key` is the struct field, `field` its wire name
    let constraint_on = |key: &str, field: &'static str| {
        match first_message(constraint_errors.as_ref(), key) {
            Some(reason) => Err(AppError::validation(field, reason)),
            None => Ok(()),
        }
    };
    let constraint = |field: &'static str| constraint_on(field, field);

    let title = required_text("title", request.title.as_deref(), "Book title is required")?;
    constraint("title")?;

    let author = required_text("author", request.author.as_deref(), "Book author is required")?;
    constraint("author")?;

    let isbn = required_text("isbn", request.isbn.as_deref(), "Book ISBN is required")?;
    constraint("isbn")?;

    let price = request
        .price
        .ok_or_else(|| AppError::validation("price", "Book price is required"))?;
    check_price(price)?;

    let stock_quantity = request
        .stock_quantity
        .ok_or_else(|| AppError::validation("stockQuantity", "Stock quantity is required"))?;
    constraint_on("stock_quantity", "stockQuantity")?;

    let publication_date = request
        .publication_date
        .ok_or_else(|| AppError::validation("publicationDate", "Publication date is required"))?;
    if publication_date > today {
        return Err(AppError::validation(
            "publicationDate",
            "Publication date cannot be in the future",
        ));
    }

    constraint("description")?;

    Ok(Book {
        id: None,
        title: title.to_string(),
        author: author.to_string(),
        isbn: isbn.to_string(),
        publication_date,
        price,
        stock_quantity,
        description: request.description.clone(),
    })
}

fn required_text<'a>(
    field: &'static str,
    value: Option<&'a str>,
    message: &str,
) -> AppResult<&'a str> {
    match value {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(AppError::validation(field, message)),
    }
}

fn first_message(errors: Option<&ValidationErrors>, field: &str) -> Option<String> {
    let field_errors = errors?.field_errors();
    let error = field_errors.get(field)?.first()?;
    Some(
        error
            .message
            .as_ref()
            .map(|message| message.to_string())
            .unwrap_or_else(|| error.code.to_string()),
    )
}

fn check_price(price: Decimal) -> AppResult<()> {
    if price <= Decimal::ZERO {
        return Err(AppError::validation("price", "Book price must be greater than 0"));
    }
    let normalized = price.normalize();
    if normalized.scale() > MAX_PRICE_SCALE
        || normalized.trunc() >= Decimal::from(MAX_PRICE_EXCLUSIVE)
    {
        return Err(AppError::validation(
            "price",
            "Price must have at most 6 integer digits and 2 decimal places",
        ));
    }
    Ok(())
}

struct Sample {
    title: &'static str,
    author: &'static str,
    isbn: &'static str,
    published: (i32, u32, u32),
    cents: i64,
    stock: i32,
    description: &'static str,
}

impl From<Sample> for BookRequest {
    fn from(sample: Sample) -> Self {
        let (year, month, day) = sample.published;
        BookRequest {
            id: None,
            title: Some(sample.title.to_string()),
            author: Some(sample.author.to_string()),
            isbn: Some(sample.isbn.to_string()),
            publication_date: NaiveDate::from_ymd_opt(year, month, day),
            price: Some(Decimal::new(sample.cents, 2)),
            stock_quantity: Some(sample.stock),
            description: Some(sample.description.to_string()),
        }
    }
}

fn sample_books() -> Vec<BookRequest> {
    let samples = [
        Sample {
            title: "The Great Gatsby",
            author: "F. Scott Fitzgerald",
            isbn: "978-0-7432-7356-5",
            published: (1925, 4, 10),
            cents: 1599,
            stock: 50,
            description: "A classic American novel about the Jazz Age",
        },
        Sample {
            title: "To Kill a Mockingbird",
            author: "Harper Lee",
            isbn: "978-0-06-112008-4",
            published: (1960, 7, 11),
            cents: 1499,
            stock: 30,
            description: "A gripping tale of racial injustice and childhood innocence",
        },
        Sample {
            title: "1984",
            author: "George Orwell",
            isbn: "978-0-452-28423-4",
            published: (1949, 6, 8),
            cents: 1399,
            stock: 25,
            description: "A dystopian social science fiction novel",
        },
    ];
    samples.into_iter().map(BookRequest::from).collect()
}
