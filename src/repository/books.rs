//! In-memory book store

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::{
    error::{AppError, AppResult},
    models::book::Book,
};

#[derive(Debug)]
struct BookTable {
    books: BTreeMap<i64, Book>,
    /// Next id handed out by the generator; never decreases except on `delete_all`
    next_id: i64,
}

impl BookTable {
    fn new() -> Self {
        Self {
            books: BTreeMap::new(),
            next_id: 1,
        }
    }

    fn allocate_id(&mut self) -> AppResult<i64> {
        let id = self.next_id;
        self.next_id = id_after(id)?;
        Ok(id)
    }

    /// Ensure the generator never hands out an id that was written explicitly
    fn reserve_id(&mut self, id: i64) -> AppResult<()> {
        if id >= self.next_id {
            self.next_id = id_after(id)?;
        }
        Ok(())
    }

    fn isbn_owner(&self, isbn: &str) -> Option<i64> {
        self.books
            .iter()
            .find(|(_, book)| book.has_isbn(isbn))
            .map(|(id, _)| *id)
    }

    fn put(&mut self, id: i64, book: Book) -> Book {
        let stored = book.with_id(id);
        self.books.insert(id, stored.clone());
        stored
    }
}

/// The generator must stay able to hand out a fresh id after `id`
fn id_after(id: i64) -> AppResult<i64> {
    id.checked_add(1)
        .ok_or_else(|| AppError::validation("id", "Book id is out of range"))
}

/// Thread-safe keyed collection of books.
///
/// Every record is replaced wholesale on write and handed out as a clone on
/// read, so no caller ever holds a reference into the table.
#[derive(Debug)]
pub struct BooksRepository {
    table: RwLock<BookTable>,
}

impl Default for BooksRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl BooksRepository {
    pub fn new() -> Self {
        Self {
            table: RwLock::new(BookTable::new()),
        }
    }

    // A panic while holding the lock cannot leave a half-written record.
    fn read(&self) -> RwLockReadGuard<'_, BookTable> {
        self.table.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BookTable> {
        self.table.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// All books, ordered by id
    pub fn find_all(&self) -> Vec<Book> {
        self.read().books.values().cloned().collect()
    }

    pub fn find_by_id(&self, id: i64) -> Option<Book> {
        self.read().books.get(&id).cloned()
    }

    /// Case-insensitive substring match on title; a blank query matches nothing
    pub fn find_by_title_containing(&self, text: &str) -> Vec<Book> {
        self.find_containing(text, |book| book.title.as_str())
    }

    /// Case-insensitive substring match on author; a blank query matches nothing
    pub fn find_by_author_containing(&self, text: &str) -> Vec<Book> {
        self.find_containing(text, |book| book.author.as_str())
    }

    fn find_containing(&self, text: &str, field: impl Fn(&Book) -> &str) -> Vec<Book> {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.read()
            .books
            .values()
            .filter(|book| field(book).to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    pub fn find_by_isbn(&self, isbn: &str) -> Option<Book> {
        if isbn.trim().is_empty() {
            return None;
        }
        self.read()
            .books
            .values()
            .find(|book| book.has_isbn(isbn))
            .cloned()
    }

    /// Books whose stock is strictly below `threshold`
    pub fn find_by_stock_below(&self, threshold: i32) -> Vec<Book> {
        self.read()
            .books
            .values()
            .filter(|book| book.stock_quantity < threshold)
            .cloned()
            .collect()
    }

    /// Insert or replace. A book without id gets the next generated one.
    ///
    /// Fails without writing when the id would exhaust the generator.
    pub fn save(&self, book: Book) -> AppResult<Book> {
        let mut table = self.write();
        let id = match book.id {
            Some(id) => {
                table.reserve_id(id)?;
                id
            }
            None => table.allocate_id()?,
        };
        Ok(table.put(id, book))
    }

    /// Insert or replace at `id`, overwriting whatever id the book carried
    pub fn save_at(&self, id: i64, book: Book) -> AppResult<Book> {
        let mut table = self.write();
        table.reserve_id(id)?;
        Ok(table.put(id, book))
    }

    /// Insert under a fresh id, unless the isbn is already taken.
    ///
    /// The isbn check and the insert happen under the same write lock.
    pub fn insert_unique_isbn(&self, book: Book) -> AppResult<Book> {
        let mut table = self.write();
        if table.isbn_owner(&book.isbn).is_some() {
            return Err(AppError::isbn_conflict(&book.isbn));
        }
        let id = table.allocate_id()?;
        Ok(table.put(id, book))
    }

    /// Replace the record at `id`, unless another record owns the isbn.
    ///
    /// Returns `Ok(None)` when `id` is not stored.
    pub fn replace_unique_isbn(&self, id: i64, book: Book) -> AppResult<Option<Book>> {
        let mut table = self.write();
        if !table.books.contains_key(&id) {
            return Ok(None);
        }
        match table.isbn_owner(&book.isbn) {
            Some(owner) if owner != id => Err(AppError::isbn_conflict(&book.isbn)),
            _ => Ok(Some(table.put(id, book))),
        }
    }

    /// Replace the record at `id` with a copy carrying a new stock quantity
    pub fn update_stock(&self, id: i64, stock_quantity: i32) -> Option<Book> {
        let mut table = self.write();
        let current = table.books.get(&id)?.clone();
        Some(table.put(id, current.with_stock(stock_quantity)))
    }

    pub fn delete_by_id(&self, id: i64) -> bool {
        self.write().books.remove(&id).is_some()
    }

    pub fn exists_by_id(&self, id: i64) -> bool {
        self.read().books.contains_key(&id)
    }

    pub fn exists_by_isbn(&self, isbn: &str) -> bool {
        if isbn.trim().is_empty() {
            return false;
        }
        self.read().isbn_owner(isbn).is_some()
    }

    pub fn count(&self) -> usize {
        self.read().books.len()
    }

    /// Clear everything and restart ids at 1. Test isolation only.
    pub fn delete_all(&self) {
        *self.write() = BookTable::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::sync::Arc;
    use std::thread;

    fn book(title: &str, author: &str, isbn: &str, stock: i32) -> Book {
        Book {
            id: None,
            title: title.into(),
            author: author.into(),
            isbn: isbn.into(),
            publication_date: NaiveDate::from_ymd_opt(2001, 1, 1).unwrap(),
            price: Decimal::new(999, 2),
            stock_quantity: stock,
            description: None,
        }
    }

    #[test]
    fn test_save_assigns_increasing_ids() {
        let repo = BooksRepository::new();
        let first = repo.save(book("A", "a", "1111111111", 1)).unwrap();
        let second = repo.save(book("B", "b", "2222222222", 1)).unwrap();
        assert_eq!(first.id, Some(1));
        assert_eq!(second.id, Some(2));
        assert_eq!(repo.count(), 2);
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let repo = BooksRepository::new();
        let first = repo.save(book("A", "a", "1111111111", 1)).unwrap();
        assert!(repo.delete_by_id(1));
        let second = repo.save(book("B", "b", "2222222222", 1)).unwrap();
        assert_eq!(first.id, Some(1));
        assert_eq!(second.id, Some(2));
    }

    #[test]
    fn test_save_with_id_replaces_slot() {
        let repo = BooksRepository::new();
        let stored = repo.save(book("A", "a", "1111111111", 1)).unwrap();
        let replaced = repo
            .save(Book {
                title: "A, revised".into(),
                ..stored
            })
            .unwrap();
        assert_eq!(replaced.id, Some(1));
        assert_eq!(repo.count(), 1);
        assert_eq!(repo.find_by_id(1).unwrap().title, "A, revised");
    }

    #[test]
    fn test_explicit_ids_are_skipped_by_generator() {
        let repo = BooksRepository::new();
        repo.save_at(5, book("A", "a", "1111111111", 1).with_id(42)).unwrap();
        assert_eq!(repo.find_by_id(5).unwrap().id, Some(5));
        assert!(repo.find_by_id(42).is_none());

        let next = repo.save(book("B", "b", "2222222222", 1)).unwrap();
        assert_eq!(next.id, Some(6));
    }

    #[test]
    fn test_ids_that_would_exhaust_generator_are_rejected() {
        let repo = BooksRepository::new();
        let err = repo.save_at(i64::MAX, book("A", "a", "1111111111", 1)).unwrap_err();
        assert!(matches!(err, AppError::Validation { field: "id", .. }));
        let err = repo.save(book("B", "b", "2222222222", 1).with_id(i64::MAX)).unwrap_err();
        assert!(matches!(err, AppError::Validation { field: "id", .. }));
        assert_eq!(repo.count(), 0);

        // the largest usable id still works and the generator stops there
        repo.save_at(i64::MAX - 1, book("C", "c", "3333333333", 1)).unwrap();
        assert!(repo.insert_unique_isbn(book("D", "d", "4444444444", 1)).is_err());
        assert_eq!(repo.count(), 1);
    }

    #[test]
    fn test_returned_copies_are_detached() {
        let repo = BooksRepository::new();
        let mut stored = repo.save(book("A", "a", "1111111111", 1)).unwrap();
        stored.title.push_str(" (changed)");
        assert_eq!(repo.find_by_id(1).unwrap().title, "A");
    }

    #[test]
    fn test_substring_search_is_case_insensitive() {
        let repo = BooksRepository::new();
        repo.save(book("The Great Gatsby", "F. Scott Fitzgerald", "1111111111", 1)).unwrap();
        repo.save(book("Great Expectations", "Charles Dickens", "2222222222", 1)).unwrap();

        assert_eq!(repo.find_by_title_containing("great").len(), 2);
        assert_eq!(repo.find_by_title_containing("  GATSBY ").len(), 1);
        assert_eq!(repo.find_by_author_containing("dickens")[0].title, "Great Expectations");
        assert!(repo.find_by_author_containing("tolkien").is_empty());
    }

    #[test]
    fn test_blank_queries_match_nothing() {
        let repo = BooksRepository::new();
        repo.save(book("Anything", "Anyone", "1111111111", 1)).unwrap();

        assert!(repo.find_by_title_containing("").is_empty());
        assert!(repo.find_by_title_containing("   ").is_empty());
        assert!(repo.find_by_author_containing("\t").is_empty());
        assert!(repo.find_by_isbn("  ").is_none());
        assert!(!repo.exists_by_isbn(""));
    }

    #[test]
    fn test_isbn_lookup_trims_input() {
        let repo = BooksRepository::new();
        repo.save(book("A", "a", "978-0-452-28423-4", 1)).unwrap();

        assert!(repo.find_by_isbn(" 978-0-452-28423-4 ").is_some());
        assert!(repo.exists_by_isbn("978-0-452-28423-4"));
        assert!(repo.find_by_isbn("978-0-452-28423").is_none());
    }

    #[test]
    fn test_stock_below_is_strict() {
        let repo = BooksRepository::new();
        repo.save(book("A", "a", "1111111111", 3)).unwrap();
        repo.save(book("B", "b", "2222222222", 10)).unwrap();

        let low = repo.find_by_stock_below(10);
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].title, "A");
        assert!(repo.find_by_stock_below(0).is_empty());
    }

    #[test]
    fn test_delete_missing_returns_false() {
        let repo = BooksRepository::new();
        assert!(!repo.delete_by_id(7));
        assert!(!repo.exists_by_id(7));
    }

    #[test]
    fn test_delete_all_resets_generator() {
        let repo = BooksRepository::new();
        repo.save(book("A", "a", "1111111111", 1)).unwrap();
        repo.save(book("B", "b", "2222222222", 1)).unwrap();
        repo.delete_all();

        assert_eq!(repo.count(), 0);
        assert_eq!(repo.save(book("C", "c", "3333333333", 1)).unwrap().id, Some(1));
    }

    #[test]
    fn test_insert_unique_isbn_rejects_duplicate() {
        let repo = BooksRepository::new();
        repo.insert_unique_isbn(book("A", "a", "1111111111", 1)).unwrap();
        let err = repo
            .insert_unique_isbn(book("B", "b", " 1111111111", 1))
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict { field: "isbn", .. }));
        assert_eq!(repo.count(), 1);
    }

    #[test]
    fn test_replace_unique_isbn() {
        let repo = BooksRepository::new();
        repo.insert_unique_isbn(book("A", "a", "1111111111", 1)).unwrap();
        repo.insert_unique_isbn(book("B", "b", "2222222222", 1)).unwrap();

        // keeping its own isbn is fine
        let kept = repo
            .replace_unique_isbn(1, book("A2", "a", "1111111111", 4))
            .unwrap()
            .unwrap();
        assert_eq!(kept.title, "A2");

        let err = repo
            .replace_unique_isbn(1, book("A3", "a", "2222222222", 4))
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));

        assert!(repo
            .replace_unique_isbn(99, book("Z", "z", "9999999999", 1))
            .unwrap()
            .is_none());
        assert!(!repo.exists_by_id(99));
    }

    #[test]
    fn test_update_stock_only_touches_quantity() {
        let repo = BooksRepository::new();
        let stored = repo.save(book("A", "a", "1111111111", 5)).unwrap();
        let updated = repo.update_stock(1, 0).unwrap();

        assert_eq!(updated.stock_quantity, 0);
        assert_eq!(updated, stored.with_stock(0));
        assert!(repo.update_stock(2, 1).is_none());
    }

    #[test]
    fn test_concurrent_saves_get_distinct_ids() {
        let repo = Arc::new(BooksRepository::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let repo = Arc::clone(&repo);
                thread::spawn(move || {
                    (0..50)
                        .map(|i| {
                            repo.save(book("T", "a", &format!("{:05}-{:05}", t, i), 1))
                                .unwrap()
                                .id
                                .unwrap()
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids: Vec<i64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 400);
        assert_eq!(ids.first(), Some(&1));
        assert_eq!(ids.last(), Some(&400));
    }

    #[test]
    fn test_concurrent_duplicate_isbn_single_winner() {
        let repo = Arc::new(BooksRepository::new());
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let repo = Arc::clone(&repo);
                thread::spawn(move || {
                    let copy = book(&format!("Copy {}", i), "a", "978-0-00-000000-0", 1);
                    repo.insert_unique_isbn(copy).is_ok()
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
        assert_eq!(repo.count(), 1);
    }
}
