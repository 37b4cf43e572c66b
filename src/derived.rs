//! Everything the screens show besides the raw note list is computed here,
//! from whatever note set is current. Nothing in this module is cached.

use super::models::{Note, Tag};
use std::collections::HashMap;

/// Count notes per tag. Most-used first; ties sorted by name so the page
/// doesn't shuffle between renders.
pub fn tags(notes: &[Note]) -> Vec<Tag> {
    let counts = notes.iter().flat_map(|n| n.tags.iter()).fold(
        HashMap::new(),
        |mut acc: HashMap<&str, usize>, tag| {
            *acc.entry(tag.as_str()).or_default() += 1;
            acc
        },
    );
    let mut tags: Vec<Tag> = counts
        .into_iter()
        .map(|(name, count)| Tag {
            name: name.to_string(),
            count,
        })
        .collect();
    tags.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));

    tags
}

pub fn notes_by_tag<'a>(notes: &'a [Note], tag: &str) -> Vec<&'a Note> {
    notes.iter().filter(|n| n.tags.iter().any(|t| t == tag)).collect()
}

pub fn pending(notes: &[Note]) -> Vec<&Note> {
    notes.iter().filter(|n| !n.completed).collect()
}

pub fn completed(notes: &[Note]) -> Vec<&Note> {
    notes.iter().filter(|n| n.completed).collect()
}

/// Case-insensitive substring match over title and content. An empty query
/// matches everything; whitespace is matched as typed.
pub fn search<'a>(notes: &'a [Note], query: &str) -> Vec<&'a Note> {
    let needle = query.to_lowercase();
    if needle.is_empty() {
        return notes.iter().collect();
    }
    notes
        .iter()
        .filter(|n| {
            n.title.to_lowercase().contains(&needle)
                || n.content.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Cut `content` to at most `max_chars` characters, marking the cut with an
/// ellipsis. Counts chars, not bytes; notes are frequently in Turkish.
pub fn preview(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &content[..idx]),
        None => content.to_string(),
    }
}
