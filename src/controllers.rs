use super::{
    components::{self, Component},
    derived, htmx,
    models::{normalize_tags, AppState, NoteDraft},
};
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Form,
};
use serde::Deserialize;
use uuid::Uuid;

/// Wrap a screen in the full document unless htmx only asked for the
/// fragment.
fn page_or_partial<'a>(
    headers: &HeaderMap,
    title: &'a str,
    body: impl Component + 'a,
) -> String {
    if htmx::is_partial(headers) {
        body.render()
    } else {
        components::Page {
            title,
            children: Box::new(body),
        }
        .render()
    }
}

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    q: String,
}

pub async fn root(
    State(AppState { store, .. }): State<AppState>,
    Query(SearchQuery { q }): Query<SearchQuery>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let state = store.snapshot().await;
    let notes = derived::search(&state.notes, &q);
    page_or_partial(
        &headers,
        "Notlarım",
        components::NotesHome {
            notes: &notes,
            query: &q,
            offline: !state.connection.is_online(),
            loading: state.loading,
        },
    )
}

/// Live search results; always a fragment.
pub async fn list_notes(
    State(AppState { store, .. }): State<AppState>,
    Query(SearchQuery { q }): Query<SearchQuery>,
) -> impl IntoResponse {
    let state = store.snapshot().await;
    let notes = derived::search(&state.notes, &q);
    components::NoteCards {
        notes: &notes,
        empty_text: "Aramanızla eşleşen not yok",
    }
    .render()
}

pub async fn new_note_form(headers: HeaderMap) -> impl IntoResponse {
    let draft = NoteDraft::default();
    page_or_partial(
        &headers,
        "Yeni Not",
        components::NoteEditor {
            id: None,
            draft: &draft,
        },
    )
}

pub async fn edit_note_form(
    State(AppState { store, .. }): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Response {
    let Some(note) = store.get(id).await else {
        return not_found(&headers);
    };
    let draft = NoteDraft {
        title: note.title,
        content: note.content,
        tags: note.tags,
        completed: note.completed,
    };
    page_or_partial(
        &headers,
        "Notu Düzenle",
        components::NoteEditor {
            id: Some(id),
            draft: &draft,
        },
    )
    .into_response()
}

pub async fn view_note(
    State(AppState { store, .. }): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Response {
    let Some(note) = store.get(id).await else {
        return not_found(&headers);
    };
    page_or_partial(
        &headers,
        note.display_title(),
        components::NoteView { note: &note },
    )
    .into_response()
}

fn not_found(headers: &HeaderMap) -> Response {
    (
        StatusCode::NOT_FOUND,
        page_or_partial(headers, "Not bulunamadı", components::NotFound {}),
    )
        .into_response()
}

#[derive(Deserialize)]
pub struct NoteForm {
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    /// Comma separated, as typed.
    #[serde(default)]
    tags: String,
}

impl NoteForm {
    fn into_draft(self, completed: bool) -> NoteDraft {
        NoteDraft {
            tags: normalize_tags(self.tags.split(',')),
            title: self.title,
            content: self.content,
            completed,
        }
    }
}

fn rejected(message: &str) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        components::ValidationAlert { message }.render(),
    )
        .into_response()
}

pub async fn create_note(
    State(AppState { store, .. }): State<AppState>,
    Form(form): Form<NoteForm>,
) -> Response {
    match store.create(form.into_draft(false)).await {
        Ok(()) => (StatusCode::CREATED, htmx::redirect("/"), "OK").into_response(),
        Err(e) => rejected(&e.to_string()),
    }
}

pub async fn save_note(
    State(AppState { store, .. }): State<AppState>,
    Path(id): Path<Uuid>,
    Form(form): Form<NoteForm>,
) -> Response {
    // The editor has no completion checkbox; editing must not un-complete a
    // task.
    let completed = store.get(id).await.map(|n| n.completed).unwrap_or(false);
    match store.update(id, form.into_draft(completed)).await {
        Ok(()) => (htmx::redirect("/"), "OK").into_response(),
        Err(e) => rejected(&e.to_string()),
    }
}

/// Re-renders the card in its new state, or nothing if the note went away.
pub async fn toggle_note(
    State(AppState { store, .. }): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    store.toggle_completion(id).await;
    match store.get(id).await {
        Some(note) => components::NoteCard { note: &note }.render(),
        None => "".to_string(),
    }
}

/// The card swaps itself out for the empty response. If the delete failed
/// the note comes back on the next render.
pub async fn delete_note(
    State(AppState { store, .. }): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    store.delete(id).await;
    ""
}

pub async fn list_tags(
    State(AppState { store, .. }): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let state = store.snapshot().await;
    let tags = derived::tags(&state.notes);
    page_or_partial(&headers, "Etiketlerim", components::TagList { tags: &tags })
}

#[derive(Deserialize)]
pub struct TagQuery {
    name: String,
}

pub async fn tagged_notes(
    State(AppState { store, .. }): State<AppState>,
    Query(TagQuery { name }): Query<TagQuery>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let state = store.snapshot().await;
    let notes = derived::notes_by_tag(&state.notes, &name);
    page_or_partial(
        &headers,
        &format!("#{name}"),
        components::TaggedNotes {
            tag: &name,
            notes: &notes,
        },
    )
}

#[derive(Deserialize)]
pub struct TasksQuery {
    tab: Option<String>,
}

pub async fn tasks(
    State(AppState { store, .. }): State<AppState>,
    Query(TasksQuery { tab }): Query<TasksQuery>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let state = store.snapshot().await;
    let tab = match tab.as_deref() {
        Some("completed") => components::TaskTab::Completed,
        _ => components::TaskTab::Pending,
    };
    let pending = derived::pending(&state.notes);
    let completed = derived::completed(&state.notes);
    page_or_partial(
        &headers,
        "Görevlerim",
        components::TaskBoard {
            tab,
            pending: &pending,
            completed: &completed,
        },
    )
}

pub async fn health(
    State(AppState { store, .. }): State<AppState>,
) -> impl IntoResponse {
    if store.connection().await.is_online() {
        "ok online"
    } else {
        "ok offline"
    }
}
