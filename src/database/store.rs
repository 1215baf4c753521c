use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::database::models::{Note, User};

/// Errors from the persistence boundary
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Username already exists: {0}")]
    DuplicateUsername(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Property notes are sorted by when listing or searching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoteSort {
    Title,
    CreatedAt,
    UpdatedAt,
}

impl NoteSort {
    /// Accepted query-parameter spellings: title, createdAt, updatedAt.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "title" => Some(NoteSort::Title),
            "createdAt" => Some(NoteSort::CreatedAt),
            "updatedAt" => Some(NoteSort::UpdatedAt),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }
}

/// Zero-based page request with sort order.
#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
    pub sort: NoteSort,
    pub direction: SortDirection,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: 10,
            sort: NoteSort::Title,
            direction: SortDirection::Asc,
        }
    }
}

impl PageRequest {
    pub fn offset(&self) -> u64 {
        self.page as u64 * self.size as u64
    }
}

/// One page of query results plus paging metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: &PageRequest, total_items: u64) -> Self {
        let total_pages = if request.size == 0 {
            0
        } else {
            total_items.div_ceil(request.size as u64) as u32
        };

        Self {
            items,
            page: request.page,
            size: request.size,
            total_items,
            total_pages,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}

/// Identity persistence boundary. `find_by_username` is the single point of
/// truth mapping a username to a full identity; comparison is exact-match
/// with no normalization.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn exists_by_username(&self, username: &str) -> Result<bool, StoreError>;

    /// Insert or update. Fails with `DuplicateUsername` before any write if
    /// another identity already holds the username.
    async fn save(&self, user: User) -> Result<User, StoreError>;

    async fn delete_by_id(&self, id: Uuid) -> Result<(), StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}

/// Note persistence boundary, keyed by (owner, id).
#[async_trait]
pub trait NoteStore: Send + Sync {
    async fn save(&self, note: Note) -> Result<Note, StoreError>;

    async fn find_by_user_and_id(&self, user_id: Uuid, id: Uuid) -> Result<Option<Note>, StoreError>;

    async fn exists_by_user_and_id(&self, user_id: Uuid, id: Uuid) -> Result<bool, StoreError>;

    async fn find_by_user(&self, user_id: Uuid, request: &PageRequest) -> Result<Page<Note>, StoreError>;

    /// Case-insensitive substring match on title or content.
    async fn search_by_term(
        &self,
        user_id: Uuid,
        term: &str,
        request: &PageRequest,
    ) -> Result<Page<Note>, StoreError>;

    /// Notes carrying at least one of the given tags, case-insensitive.
    async fn search_by_tags(
        &self,
        user_id: Uuid,
        tags: &[String],
        request: &PageRequest,
    ) -> Result<Page<Note>, StoreError>;

    async fn delete_by_user_and_id(&self, user_id: Uuid, id: Uuid) -> Result<(), StoreError>;

    /// Cascade target for account deletion.
    async fn delete_by_user(&self, user_id: Uuid) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_params_parse_exact_spellings_only() {
        assert_eq!(NoteSort::parse("title"), Some(NoteSort::Title));
        assert_eq!(NoteSort::parse("createdAt"), Some(NoteSort::CreatedAt));
        assert_eq!(NoteSort::parse("updatedAt"), Some(NoteSort::UpdatedAt));
        assert_eq!(NoteSort::parse("Title"), None);
        assert_eq!(SortDirection::parse("desc"), Some(SortDirection::Desc));
        assert_eq!(SortDirection::parse("DESC"), None);
    }

    #[test]
    fn page_metadata_rounds_up() {
        let request = PageRequest { size: 10, ..Default::default() };
        let page: Page<i32> = Page::new(vec![1, 2, 3], &request, 21);
        assert_eq!(page.total_pages, 3);
        assert!(!page.is_empty());

        let empty: Page<i32> = Page::new(vec![], &request, 0);
        assert!(empty.is_empty());
        assert_eq!(empty.total_pages, 0);
    }

    #[test]
    fn offset_is_page_times_size() {
        let request = PageRequest { page: 3, size: 25, ..Default::default() };
        assert_eq!(request.offset(), 75);
    }
}
