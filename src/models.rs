use super::{relay::PushProvider, store::NoteStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::sync::Arc;
use uuid::Uuid;

/// A single note, as stored in the `notes` table. The database assigns the
/// id; it never changes afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// Title for display; untitled notes still need something to click on.
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            "Başlıksız Not"
        } else {
            &self.title
        }
    }

    /// Overwrite the user-editable fields from a draft, keeping identity and
    /// creation time.
    pub fn patch(&mut self, draft: &NoteDraft, updated_at: DateTime<Utc>) {
        self.title = draft.title.clone();
        self.content = draft.content.clone();
        self.tags = draft.tags.clone();
        self.completed = draft.completed;
        self.updated_at = updated_at;
    }
}

/// The user-editable half of a note. This is what the editor submits and
/// what the store writes on create and update.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub completed: bool,
}

impl NoteDraft {
    #[cfg(test)]
    pub fn new(title: &str, content: &str, tags: &[&str]) -> Self {
        Self {
            title: title.to_string(),
            content: content.to_string(),
            tags: normalize_tags(tags.iter().copied()),
            completed: false,
        }
    }

    /// A draft is empty when there is neither a title nor any content once
    /// whitespace is ignored. Tags alone don't make a note.
    pub fn is_empty(&self) -> bool {
        self.title.trim().is_empty() && self.content.trim().is_empty()
    }
}

/// Trim tags, drop blanks and drop repeats, keeping first-seen order.
pub fn normalize_tags<'a>(raw: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw {
        let tag = tag.trim();
        if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

/// Derived from the note set; never stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub name: String,
    pub count: usize,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub enum ConnectionState {
    #[default]
    Online,
    Offline,
}

impl ConnectionState {
    pub fn is_online(&self) -> bool {
        matches!(self, ConnectionState::Online)
    }
}

/// A row-level change, either observed on the real-time channel or produced
/// by one of our own successful writes.
#[derive(Clone, Debug, PartialEq)]
pub enum ChangeEvent {
    Insert(Note),
    Update(Note),
    Delete(Uuid),
}

impl ChangeEvent {
    pub fn note_id(&self) -> Uuid {
        match self {
            ChangeEvent::Insert(note) | ChangeEvent::Update(note) => note.id,
            ChangeEvent::Delete(id) => *id,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store: NoteStore,
    pub provider: Arc<dyn PushProvider>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(title: &str) -> Note {
        let now = Utc::now();
        Note {
            id: Uuid::new_v4(),
            title: title.to_string(),
            content: String::new(),
            tags: vec![],
            completed: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_normalize_tags() {
        let tags = normalize_tags([" work ", "", "home", "work", "  "]);
        assert_eq!(tags, vec!["work".to_string(), "home".to_string()]);
    }

    #[test]
    fn test_draft_is_empty() {
        assert!(NoteDraft::new("  ", "\n", &["tag"]).is_empty());
        assert!(!NoteDraft::new("", "body", &[]).is_empty());
        assert!(!NoteDraft::new("title", "", &[]).is_empty());
    }

    #[test]
    fn test_display_title_falls_back() {
        assert_eq!(note("").display_title(), "Başlıksız Not");
        assert_eq!(note("Groceries").display_title(), "Groceries");
    }

    #[test]
    fn test_patch_keeps_identity() {
        let mut n = note("old");
        let id = n.id;
        let created = n.created_at;
        let later = created + chrono::Duration::seconds(5);
        n.patch(&NoteDraft::new("new", "body", &["a"]), later);
        assert_eq!(n.id, id);
        assert_eq!(n.created_at, created);
        assert_eq!(n.title, "new");
        assert_eq!(n.tags, vec!["a".to_string()]);
        assert_eq!(n.updated_at, later);
    }
}
