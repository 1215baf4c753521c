//! In-memory store backend. Plays the role the original deployment's
//! embedded database played in dev/test: zero setup, process-lifetime data.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::models::{Note, User};
use crate::database::store::{
    NoteSort, NoteStore, Page, PageRequest, SortDirection, StoreError, UserStore,
};

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    notes: RwLock<HashMap<Uuid, Note>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sort_notes(notes: &mut [Note], request: &PageRequest) {
    match request.sort {
        NoteSort::Title => notes.sort_by(|a, b| a.title.cmp(&b.title)),
        NoteSort::CreatedAt => notes.sort_by_key(|n| n.created_at),
        NoteSort::UpdatedAt => notes.sort_by_key(|n| n.updated_at),
    }
    if request.direction == SortDirection::Desc {
        notes.reverse();
    }
}

fn paginate(mut notes: Vec<Note>, request: &PageRequest) -> Page<Note> {
    sort_notes(&mut notes, request);
    let total = notes.len() as u64;
    let items = notes
        .into_iter()
        .skip(request.offset() as usize)
        .take(request.size as usize)
        .collect();
    Page::new(items, request, total)
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, StoreError> {
        let users = self.users.read().await;
        Ok(users.values().any(|u| u.username == username))
    }

    async fn save(&self, user: User) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        let taken = users
            .values()
            .any(|u| u.username == user.username && u.id != user.id);
        if taken {
            return Err(StoreError::DuplicateUsername(user.username));
        }

        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        users
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("user {}", id)))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[async_trait]
impl NoteStore for MemoryStore {
    async fn save(&self, mut note: Note) -> Result<Note, StoreError> {
        let mut notes = self.notes.write().await;
        if let Some(existing) = notes.get(&note.id) {
            note.created_at = existing.created_at;
        }
        note.updated_at = Utc::now();

        notes.insert(note.id, note.clone());
        Ok(note)
    }

    async fn find_by_user_and_id(&self, user_id: Uuid, id: Uuid) -> Result<Option<Note>, StoreError> {
        let notes = self.notes.read().await;
        Ok(notes.get(&id).filter(|n| n.user_id == user_id).cloned())
    }

    async fn exists_by_user_and_id(&self, user_id: Uuid, id: Uuid) -> Result<bool, StoreError> {
        let notes = self.notes.read().await;
        Ok(notes.get(&id).is_some_and(|n| n.user_id == user_id))
    }

    async fn find_by_user(&self, user_id: Uuid, request: &PageRequest) -> Result<Page<Note>, StoreError> {
        let notes = self.notes.read().await;
        let owned = notes
            .values()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        Ok(paginate(owned, request))
    }

    async fn search_by_term(
        &self,
        user_id: Uuid,
        term: &str,
        request: &PageRequest,
    ) -> Result<Page<Note>, StoreError> {
        let term = term.to_lowercase();
        let notes = self.notes.read().await;
        let matched = notes
            .values()
            .filter(|n| n.user_id == user_id)
            .filter(|n| {
                n.title.to_lowercase().contains(&term) || n.content.to_lowercase().contains(&term)
            })
            .cloned()
            .collect();
        Ok(paginate(matched, request))
    }

    async fn search_by_tags(
        &self,
        user_id: Uuid,
        tags: &[String],
        request: &PageRequest,
    ) -> Result<Page<Note>, StoreError> {
        let wanted: Vec<String> = tags.iter().map(|t| t.to_lowercase()).collect();
        let notes = self.notes.read().await;
        let matched = notes
            .values()
            .filter(|n| n.user_id == user_id)
            .filter(|n| {
                n.tags
                    .iter()
                    .any(|tag| wanted.contains(&tag.to_lowercase()))
            })
            .cloned()
            .collect();
        Ok(paginate(matched, request))
    }

    async fn delete_by_user_and_id(&self, user_id: Uuid, id: Uuid) -> Result<(), StoreError> {
        let mut notes = self.notes.write().await;
        match notes.get(&id) {
            Some(n) if n.user_id == user_id => {
                notes.remove(&id);
                Ok(())
            }
            _ => Err(StoreError::NotFound(format!("note {}", id))),
        }
    }

    async fn delete_by_user(&self, user_id: Uuid) -> Result<(), StoreError> {
        let mut notes = self.notes.write().await;
        notes.retain(|_, n| n.user_id != user_id);
        Ok(())
    }
}
