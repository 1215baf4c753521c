use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::database::models::Note;
use crate::database::store::{NoteSort, Page, PageRequest, SortDirection};
use crate::error::ApiError;
use crate::middleware::Principal;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct NoteRequest {
    #[serde(default)]
    pub tags: Vec<String>,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct NoteResponse {
    pub id: Uuid,
    pub tags: Vec<String>,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Note> for NoteResponse {
    fn from(note: Note) -> Self {
        Self {
            id: note.id,
            tags: note.tags,
            title: note.title,
            content: note.content,
            created_at: note.created_at,
            updated_at: note.updated_at,
        }
    }
}

/// Paging query parameters shared by list and search endpoints. Parameter
/// spellings match the original API surface.
#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub property: Option<String>,
    #[serde(rename = "sortDirection")]
    pub sort_direction: Option<String>,
}

impl PageParams {
    fn to_request(&self) -> Result<PageRequest, ApiError> {
        page_request(self.page, self.size, self.property.as_deref(), self.sort_direction.as_deref())
    }
}

fn page_request(
    page: Option<u32>,
    size: Option<u32>,
    property: Option<&str>,
    sort_direction: Option<&str>,
) -> Result<PageRequest, ApiError> {
    let sort = match property {
        None => NoteSort::Title,
        Some(s) => NoteSort::parse(s).ok_or_else(|| {
            ApiError::bad_request("property must be one of: title, createdAt, updatedAt")
        })?,
    };
    let direction = match sort_direction {
        None => SortDirection::Asc,
        Some(s) => SortDirection::parse(s)
            .ok_or_else(|| ApiError::bad_request("sortDirection must be asc or desc"))?,
    };

    Ok(PageRequest {
        page: page.unwrap_or(0),
        size: size.unwrap_or(10),
        sort,
        direction,
    })
}

const TITLE_MAX: usize = 100;
const TAG_MAX: usize = 30;

fn validate(body: &NoteRequest) -> Result<(), ApiError> {
    if body.title.trim().is_empty() {
        return Err(ApiError::bad_request("Title must not be blank"));
    }
    if body.title.chars().count() > TITLE_MAX {
        return Err(ApiError::bad_request(format!(
            "Title must be at most {} characters",
            TITLE_MAX
        )));
    }
    if body.content.is_empty() {
        return Err(ApiError::bad_request("Content must not be blank"));
    }
    if body.tags.iter().any(|t| t.is_empty() || t.chars().count() > TAG_MAX) {
        return Err(ApiError::bad_request(format!(
            "Tags must be 1 to {} characters",
            TAG_MAX
        )));
    }
    Ok(())
}

fn page_body(page: Page<Note>) -> Json<serde_json::Value> {
    Json(json!({
        "success": true,
        "data": page.map(NoteResponse::from)
    }))
}

/// POST /notes-api/notes - create a note owned by the logged-in user.
pub async fn create(
    State(state): State<AppState>,
    principal: Principal,
    Json(body): Json<NoteRequest>,
) -> Result<Response, ApiError> {
    validate(&body)?;
    let user = super::current_user(&state, &principal).await?;

    let note = state
        .notes
        .save(Note::new(user.id, body.tags, body.title, body.content))
        .await?;
    tracing::info!(username = %user.username, note_id = %note.id, "created note");

    let location = format!("/notes-api/notes/{}", note.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(json!({ "success": true, "data": NoteResponse::from(note) })),
    )
        .into_response())
}

/// GET /notes-api/notes/:id
pub async fn find_by_id(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = super::current_user(&state, &principal).await?;

    state.verification.verify_note_exists(user.id, id).await?;
    let note = state
        .notes
        .find_by_user_and_id(user.id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("There is no note with the provided id"))?;

    Ok(Json(json!({ "success": true, "data": NoteResponse::from(note) })))
}

/// GET /notes-api/notes - the user's notes, paginated and sorted.
pub async fn find_all(
    State(state): State<AppState>,
    principal: Principal,
    Query(params): Query<PageParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let request = params.to_request()?;
    let user = super::current_user(&state, &principal).await?;

    let page = state.notes.find_by_user(user.id, &request).await?;
    state.verification.verify_page_not_empty(&page)?;

    Ok(page_body(page))
}

// serde_urlencoded cannot flatten PageParams into these, so the paging
// fields are repeated inline.
#[derive(Debug, Deserialize)]
pub struct TermParams {
    pub term: String,
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub property: Option<String>,
    #[serde(rename = "sortDirection")]
    pub sort_direction: Option<String>,
}

/// GET /notes-api/notes/search/by-term - substring match on title or
/// content, case-insensitive.
pub async fn find_by_term(
    State(state): State<AppState>,
    principal: Principal,
    Query(params): Query<TermParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let request = page_request(
        params.page,
        params.size,
        params.property.as_deref(),
        params.sort_direction.as_deref(),
    )?;
    let user = super::current_user(&state, &principal).await?;

    let page = state
        .notes
        .search_by_term(user.id, &params.term, &request)
        .await?;
    state.verification.verify_page_not_empty(&page)?;

    Ok(page_body(page))
}

#[derive(Debug, Deserialize)]
pub struct TagParams {
    /// Comma-separated list of tags.
    pub tags: String,
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub property: Option<String>,
    #[serde(rename = "sortDirection")]
    pub sort_direction: Option<String>,
}

/// GET /notes-api/notes/search/by-tags - notes carrying at least one of the
/// given tags.
pub async fn find_by_tags(
    State(state): State<AppState>,
    principal: Principal,
    Query(params): Query<TagParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let request = page_request(
        params.page,
        params.size,
        params.property.as_deref(),
        params.sort_direction.as_deref(),
    )?;
    let tags: Vec<String> = params
        .tags
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect();
    if tags.is_empty() {
        return Err(ApiError::bad_request("At least one tag is required"));
    }

    let user = super::current_user(&state, &principal).await?;

    let page = state.notes.search_by_tags(user.id, &tags, &request).await?;
    state.verification.verify_page_not_empty(&page)?;

    Ok(page_body(page))
}

/// PUT /notes-api/notes/:id - replace tags, title and content.
pub async fn update(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
    Json(body): Json<NoteRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    validate(&body)?;
    let user = super::current_user(&state, &principal).await?;

    state.verification.verify_note_exists(user.id, id).await?;
    let mut note = state
        .notes
        .find_by_user_and_id(user.id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("There is no note with the provided id"))?;

    note.tags = body.tags;
    note.title = body.title;
    note.content = body.content;
    let note = state.notes.save(note).await?;
    tracing::info!(username = %user.username, note_id = %note.id, "updated note");

    Ok(Json(json!({ "success": true, "data": NoteResponse::from(note) })))
}

/// DELETE /notes-api/notes/:id
pub async fn delete(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = super::current_user(&state, &principal).await?;

    state.verification.verify_note_exists(user.id, id).await?;
    let note = state
        .notes
        .find_by_user_and_id(user.id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("There is no note with the provided id"))?;

    state.notes.delete_by_user_and_id(user.id, id).await?;
    tracing::info!(username = %user.username, note_id = %note.id, "deleted note");

    Ok(Json(json!({
        "success": true,
        "data": format!("The note \"{}\" was deleted successfully", note.title)
    })))
}
