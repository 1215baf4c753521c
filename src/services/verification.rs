//! Guard checks that convert data-existence queries into typed failures,
//! run before the corresponding read or mutation so calling code stays on
//! the happy path.

use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::database::store::{NoteStore, Page, StoreError, UserStore};
use crate::database::models::Note;

#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("{0}")]
    UserNotFound(String),

    #[error("{0}")]
    UsernameTaken(String),

    #[error("{0}")]
    NoteNotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Named precondition guards over the user and note stores.
#[derive(Clone)]
pub struct VerificationService {
    users: Arc<dyn UserStore>,
    notes: Arc<dyn NoteStore>,
}

impl VerificationService {
    pub fn new(users: Arc<dyn UserStore>, notes: Arc<dyn NoteStore>) -> Self {
        Self { users, notes }
    }

    /// Fails with `UserNotFound` unless an identity holds the username.
    pub async fn verify_user_exists(&self, username: &str) -> Result<(), VerificationError> {
        if !self.lookup_username(username).await? {
            return Err(VerificationError::UserNotFound(
                "There is no user with the provided username".to_string(),
            ));
        }
        Ok(())
    }

    /// Fails with `UsernameTaken` when the username is already in use.
    pub async fn verify_username_free(&self, username: &str) -> Result<(), VerificationError> {
        if self.lookup_username(username).await? {
            return Err(VerificationError::UsernameTaken(
                "The provided username is already in use".to_string(),
            ));
        }
        Ok(())
    }

    /// Fails with `NoteNotFound` unless the owner has a note with this id.
    pub async fn verify_note_exists(&self, owner_id: Uuid, note_id: Uuid) -> Result<(), VerificationError> {
        let exists = self.notes.exists_by_user_and_id(owner_id, note_id).await?;
        if !exists {
            return Err(VerificationError::NoteNotFound(
                "There is no note with the provided id".to_string(),
            ));
        }
        Ok(())
    }

    /// Fails with `NoteNotFound` when a query produced an empty page.
    pub fn verify_page_not_empty(&self, page: &Page<Note>) -> Result<(), VerificationError> {
        if page.is_empty() {
            return Err(VerificationError::NoteNotFound("No notes were found".to_string()));
        }
        Ok(())
    }

    async fn lookup_username(&self, username: &str) -> Result<bool, VerificationError> {
        Ok(self.users.exists_by_username(username).await?)
    }
}
