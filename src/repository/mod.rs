//! Repository layer: in-memory storage

pub mod books;

use std::sync::Arc;

/// Main repository struct holding the shared stores
#[derive(Clone, Default)]
pub struct Repository {
    pub books: Arc<books::BooksRepository>,
}

impl Repository {
    /// Create a repository with empty stores
    pub fn new() -> Self {
        Self::default()
    }
}
