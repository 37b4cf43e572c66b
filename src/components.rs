// In many cases, we need to do a let binding to satisfy the borrow checker
// and for some reason, clippy identifies those as unnecessary. Maybe there
// are and clippy knows more than me, maybe not.
#![allow(clippy::let_and_return)]

use super::{
    config::{PREVIEW_CHARS, VISIBLE_TAGS},
    derived,
    models::{Note, NoteDraft, Tag},
};
use ammonia::{clean, clean_text};
use uuid::Uuid;

pub const DELETE_CONFIRMATION: &str = "Bu notu silmek istediğinize emin misiniz?";

pub trait Component {
    /// Render the component to a HTML string. By convention, the
    /// implementation should sanitize all string properties at render-time
    fn render(&self) -> String;
}

pub struct Page<'a> {
    pub title: &'a str,
    pub children: Box<dyn Component + 'a>,
}

impl Component for Page<'_> {
    fn render(&self) -> String {
        // htmx won't swap 4xx responses by default; validation failures come
        // back as 422 and we do want to show them.
        format!(
            r#"
            <html lang="tr">
                <head>
                    <meta charset="utf-8" />
                    <meta name="viewport" content="width=device-width, initial-scale=1.0"></meta>
                    <title>{title}</title>
                </head>
                <body hx-boost="true">
                    {nav}
                    {body_html}
                    <script src="https://unpkg.com/htmx.org@1.9.6"></script>
                    <script>
                        htmx.config.defaultSwapStyle = "outerHTML";
                        document.body.addEventListener("htmx:beforeSwap", (e) => {{
                            if (e.detail.xhr.status === 422) {{
                                e.detail.shouldSwap = true;
                                e.detail.isError = false;
                            }}
                        }});
                    </script>
                </body>
            </html>
            "#,
            title = clean_text(self.title),
            nav = Nav {}.render(),
            body_html = self.children.render()
        )
    }
}

pub struct Nav {}
impl Component for Nav {
    fn render(&self) -> String {
        r#"
        <nav class="nav">
            <a href="/">Notlar</a>
            <a href="/tasks">Görevler</a>
            <a href="/tags">Etiketler</a>
            <a href="/note/new">+ Yeni Not</a>
        </nav>
        "#
        .to_string()
    }
}

pub struct OfflineBanner {
    pub offline: bool,
}
impl Component for OfflineBanner {
    fn render(&self) -> String {
        if self.offline {
            r#"<p class="offline" role="status">Çevrimdışı: son kaydedilen notlar gösteriliyor</p>"#
                .to_string()
        } else {
            "".to_string()
        }
    }
}

/// Tag chips as shown on a card: the first few, then a "+N".
pub struct TagChips<'a> {
    pub tags: &'a [String],
}
impl Component for TagChips<'_> {
    fn render(&self) -> String {
        if self.tags.is_empty() {
            return "".to_string();
        }
        let chips = self
            .tags
            .iter()
            .take(VISIBLE_TAGS)
            .map(|t| format!(r#"<span class="tag">{}</span>"#, clean_text(t)))
            .collect::<Vec<String>>()
            .join("");
        let more = if self.tags.len() > VISIBLE_TAGS {
            format!(
                r#"<span class="more-tags">+{}</span>"#,
                self.tags.len() - VISIBLE_TAGS
            )
        } else {
            "".to_string()
        };
        format!(r#"<div class="tags">{chips}{more}</div>"#)
    }
}

pub struct NoteCard<'a> {
    pub note: &'a Note,
}
impl Component for NoteCard<'_> {
    fn render(&self) -> String {
        let note = self.note;
        let id = note.id;
        let (completed_class, check, toggle_label) = if note.completed {
            ("completed", "✓", "Tamamlanmadı olarak işaretle")
        } else {
            ("", "", "Tamamlandı olarak işaretle")
        };
        format!(
            r#"
            <div class="note-card {completed_class}" id="note-{id}">
                <button
                    class="check-button"
                    aria-label="{toggle_label}"
                    hx-post="/note/{id}/toggle"
                    hx-target="closest .note-card"
                >{check}</button>
                <a class="note-info" href="/note/{id}">
                    <h3 class="note-title">{title}</h3>
                    <p class="note-content">{preview}</p>
                    {tags}
                </a>
                <button
                    class="delete-button"
                    aria-label="Notu sil"
                    hx-delete="/note/{id}"
                    hx-confirm="{confirm}"
                    hx-target="closest .note-card"
                >🗑️</button>
            </div>
            "#,
            title = clean_text(note.display_title()),
            preview = clean_text(&derived::preview(&note.content, PREVIEW_CHARS)),
            tags = TagChips { tags: &note.tags }.render(),
            confirm = DELETE_CONFIRMATION,
        )
    }
}

pub struct NoteCards<'a> {
    pub notes: &'a [&'a Note],
    pub empty_text: &'a str,
}
impl Component for NoteCards<'_> {
    fn render(&self) -> String {
        if self.notes.is_empty() {
            return format!(
                r#"<div id="note-list" class="empty">{}</div>"#,
                clean_text(self.empty_text)
            );
        }
        let cards = self
            .notes
            .iter()
            .map(|note| NoteCard { note }.render())
            .collect::<Vec<String>>()
            .join("");
        format!(r#"<div id="note-list" class="notes-list">{cards}</div>"#)
    }
}

pub struct NotesHome<'a> {
    pub notes: &'a [&'a Note],
    pub query: &'a str,
    pub offline: bool,
    pub loading: bool,
}
impl Component for NotesHome<'_> {
    fn render(&self) -> String {
        let list = if self.loading && self.notes.is_empty() {
            r#"<div id="note-list">Yükleniyor...</div>"#.to_string()
        } else {
            NoteCards {
                notes: self.notes,
                empty_text: if self.query.is_empty() {
                    "Henüz not yok 🎋"
                } else {
                    "Aramanızla eşleşen not yok"
                },
            }
            .render()
        };
        format!(
            r##"
            <main>
                {banner}
                <h1>Notlarım 🐼</h1>
                <input
                    type="search"
                    name="q"
                    value="{query}"
                    placeholder="Notlarda ara..."
                    hx-get="/notes"
                    hx-trigger="keyup changed delay:300ms, search"
                    hx-target="#note-list"
                />
                {list}
            </main>
            "##,
            banner = OfflineBanner {
                offline: self.offline
            }
            .render(),
            query = clean_text(self.query),
        )
    }
}

pub struct NoteEditor<'a> {
    pub id: Option<Uuid>,
    pub draft: &'a NoteDraft,
}
impl Component for NoteEditor<'_> {
    fn render(&self) -> String {
        let (action, heading, preview_link) = match self.id {
            Some(id) => (
                format!("/note/{id}"),
                "Notu Düzenle",
                format!(r#"<a href="/note/{id}/view">Önizle</a>"#),
            ),
            None => ("/note".to_string(), "Yeni Not", "".to_string()),
        };
        format!(
            r##"
            <main>
                <a href="/">← Geri</a>
                {preview_link}
                <h1>{heading}</h1>
                <form hx-post="{action}" hx-target="#editor-alert">
                    <div id="editor-alert"></div>
                    <label for="title">Başlık</label>
                    <input type="text" name="title" id="title" value="{title}" />
                    <label for="content">İçerik</label>
                    <textarea name="content" id="content" rows="10">{content}</textarea>
                    <label for="tags">Etiketler (virgülle ayırın)</label>
                    <input type="text" name="tags" id="tags" value="{tags}" />
                    <button>Kaydet</button>
                </form>
            </main>
            "##,
            title = clean_text(&self.draft.title),
            content = clean_text(&self.draft.content),
            tags = clean_text(&self.draft.tags.join(", ")),
        )
    }
}

/// Swapped into the editor when a save is rejected. The alert blocks, the
/// text stays on the page afterwards.
pub struct ValidationAlert<'a> {
    pub message: &'a str,
}
impl Component for ValidationAlert<'_> {
    fn render(&self) -> String {
        let message = clean_text(self.message);
        format!(
            r#"
            <div id="editor-alert" role="alert">{message}</div>
            <script>alert(document.getElementById("editor-alert").innerText)</script>
            "#
        )
    }
}

pub struct NoteView<'a> {
    pub note: &'a Note,
}
impl Component for NoteView<'_> {
    fn render(&self) -> String {
        let note = self.note;
        let rendered = markdown::to_html(&note.content);
        let cleaned = clean(&rendered);
        format!(
            r#"
            <main>
                <a href="/">← Geri</a>
                <h1>{title}</h1>
                {tags}
                <article class="prose">{cleaned}</article>
                <p class="meta">Son güncelleme: {updated}</p>
                <a href="/note/{id}">Düzenle</a>
            </main>
            "#,
            id = note.id,
            title = clean_text(note.display_title()),
            tags = TagChips { tags: &note.tags }.render(),
            updated = note.updated_at.format("%Y-%m-%d %H:%M"),
        )
    }
}

pub struct TagList<'a> {
    pub tags: &'a [Tag],
}
impl Component for TagList<'_> {
    fn render(&self) -> String {
        let body = if self.tags.is_empty() {
            r#"<p class="empty">Henüz etiket yok 🎋</p>"#.to_string()
        } else {
            // A GET form lets the browser take care of encoding the tag
            // name into the query string.
            let items = self
                .tags
                .iter()
                .map(|tag| {
                    format!(
                        r#"
                        <li>
                            <button name="name" value="{name}">
                                <span class="tag-name">{name}</span>
                                <span class="tag-count">{count}</span>
                            </button>
                        </li>
                        "#,
                        name = clean_text(&tag.name),
                        count = tag.count
                    )
                })
                .collect::<Vec<String>>()
                .join("");
            format!(r#"<form action="/tag" method="get"><ul class="tag-list">{items}</ul></form>"#)
        };
        format!(
            r#"
            <main>
                <h1>Etiketlerim 🎋</h1>
                <p>{count} etiket</p>
                {body}
            </main>
            "#,
            count = self.tags.len()
        )
    }
}

pub struct TaggedNotes<'a> {
    pub tag: &'a str,
    pub notes: &'a [&'a Note],
}
impl Component for TaggedNotes<'_> {
    fn render(&self) -> String {
        format!(
            r#"
            <main>
                <a href="/tags">← Etiketler</a>
                <h1>#{tag}</h1>
                {cards}
            </main>
            "#,
            tag = clean_text(self.tag),
            cards = NoteCards {
                notes: self.notes,
                empty_text: "Bu etikette not yok",
            }
            .render()
        )
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TaskTab {
    Pending,
    Completed,
}

pub struct TaskBoard<'a> {
    pub tab: TaskTab,
    pub pending: &'a [&'a Note],
    pub completed: &'a [&'a Note],
}
impl Component for TaskBoard<'_> {
    fn render(&self) -> String {
        let (shown, empty_text) = match self.tab {
            TaskTab::Pending => (self.pending, "Bekleyen görev yok 🎉"),
            TaskTab::Completed => (self.completed, "Henüz tamamlanan görev yok"),
        };
        let active = |tab: TaskTab| if tab == self.tab { "active" } else { "" };
        format!(
            r#"
            <main>
                <h1>Görevlerim 📋</h1>
                <p>{pending_count} bekleyen • {completed_count} tamamlanan</p>
                <div class="tabs">
                    <a class="tab {pending_active}" href="/tasks?tab=pending">📋 Yapılacaklar {pending_count}</a>
                    <a class="tab {completed_active}" href="/tasks?tab=completed">✅ Tamamlananlar {completed_count}</a>
                </div>
                {cards}
            </main>
            "#,
            pending_count = self.pending.len(),
            completed_count = self.completed.len(),
            pending_active = active(TaskTab::Pending),
            completed_active = active(TaskTab::Completed),
            cards = NoteCards {
                notes: shown,
                empty_text
            }
            .render()
        )
    }
}

pub struct NotFound {}
impl Component for NotFound {
    fn render(&self) -> String {
        r#"<main><h1>Not bulunamadı</h1><a href="/">← Geri</a></main>"#.to_string()
    }
}
