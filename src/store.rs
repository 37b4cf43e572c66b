//! The in-process mirror of the `notes` table.
//!
//! The database is the system of record. `NoteStore` keeps a copy of the note
//! set for the screens to render from, and converges it through exactly one
//! function, [`NoteStore::apply`], whether the change came from one of our own
//! writes or from the real-time channel. Write failures are logged and leave
//! local state alone; load failures fall back to the on-disk snapshot and mark
//! the store offline.

use super::{
    db_ops::NoteBackend,
    errors::ValidationError,
    models::{ChangeEvent, ConnectionState, Note, NoteDraft},
    notify::{self, Notifier},
    snapshot::Snapshot,
};
use chrono::{DateTime, SubsecRound, Utc};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, Default)]
pub struct NoteState {
    pub notes: Vec<Note>,
    pub connection: ConnectionState,
    pub loading: bool,
}

#[derive(Clone)]
pub struct NoteStore {
    state: Arc<RwLock<NoteState>>,
    backend: Arc<dyn NoteBackend>,
    notifier: Arc<dyn Notifier>,
    snapshot: Snapshot,
}

impl NoteStore {
    pub fn new(
        backend: Arc<dyn NoteBackend>,
        notifier: Arc<dyn Notifier>,
        snapshot: Snapshot,
    ) -> Self {
        Self {
            state: Arc::new(RwLock::new(NoteState {
                loading: true,
                ..Default::default()
            })),
            backend,
            notifier,
            snapshot,
        }
    }

    /// A copy of the current state, for rendering.
    pub async fn snapshot(&self) -> NoteState {
        self.state.read().await.clone()
    }

    pub async fn get(&self, id: Uuid) -> Option<Note> {
        self.state.read().await.notes.iter().find(|n| n.id == id).cloned()
    }

    pub async fn connection(&self) -> ConnectionState {
        self.state.read().await.connection
    }

    /// Replace local state with whatever the database has. If the database
    /// can't be read, show the last snapshot instead and go offline.
    pub async fn load(&self) {
        self.state.write().await.loading = true;

        match self.backend.list().await {
            Ok(notes) => {
                if let Err(e) = self.snapshot.write(&notes).await {
                    tracing::warn!(error = ?e, "could not write note snapshot");
                }
                tracing::info!(count = notes.len(), "notes loaded");
                let mut state = self.state.write().await;
                state.notes = notes;
                state.connection = ConnectionState::Online;
                state.loading = false;
            }
            Err(e) => {
                tracing::error!(error = ?e, "loading notes failed; going offline");
                let fallback = match self.snapshot.read().await {
                    Ok(notes) => notes,
                    Err(e) => {
                        tracing::warn!(error = ?e, "note snapshot unreadable");
                        None
                    }
                };
                let mut state = self.state.write().await;
                if let Some(notes) = fallback {
                    state.notes = notes;
                }
                state.connection = ConnectionState::Offline;
                state.loading = false;
            }
        }
    }

    /// Validation is the only error surfaced to the caller. Backend failures
    /// are logged and the note set is left as it was.
    pub async fn create(&self, draft: NoteDraft) -> Result<(), ValidationError> {
        if draft.is_empty() {
            return Err(ValidationError::EmptyNote);
        }
        match self.backend.insert(&draft).await {
            Ok(note) => {
                // Our own insert will usually echo back over the real-time
                // channel too; `apply` drops the duplicate.
                self.merge_created(note).await;
                notify::dispatch(
                    &self.notifier,
                    notify::CREATED_HEADING,
                    notify::message_for(&draft.title, notify::CREATED_FALLBACK),
                );
            }
            Err(e) => tracing::error!(error = ?e, "creating note failed"),
        }
        Ok(())
    }

    pub async fn update(
        &self,
        id: Uuid,
        draft: NoteDraft,
    ) -> Result<(), ValidationError> {
        if draft.is_empty() {
            return Err(ValidationError::EmptyNote);
        }
        let current = self.get(id).await;
        let updated_at = next_timestamp(current.as_ref());

        if let Err(e) = self.backend.update(id, &draft, updated_at).await {
            tracing::error!(error = ?e, %id, "updating note failed");
            return Ok(());
        }
        if let Some(mut note) = current {
            note.patch(&draft, updated_at);
            self.apply(ChangeEvent::Update(note)).await;
        }
        notify::dispatch(
            &self.notifier,
            notify::UPDATED_HEADING,
            notify::message_for(&draft.title, notify::UPDATED_FALLBACK),
        );
        Ok(())
    }

    pub async fn delete(&self, id: Uuid) {
        match self.backend.delete(id).await {
            Ok(()) => self.apply(ChangeEvent::Delete(id)).await,
            Err(e) => tracing::error!(error = ?e, %id, "deleting note failed"),
        }
    }

    /// Unknown ids are ignored.
    pub async fn toggle_completion(&self, id: Uuid) {
        let Some(mut note) = self.get(id).await else {
            tracing::debug!(%id, "toggle for a note we don't have");
            return;
        };
        let updated_at = next_timestamp(Some(&note));
        let completed = !note.completed;

        if let Err(e) =
            self.backend.set_completed(id, completed, updated_at).await
        {
            tracing::error!(error = ?e, %id, "toggling note failed");
            return;
        }
        note.completed = completed;
        note.updated_at = updated_at;
        self.apply(ChangeEvent::Update(note)).await;
    }

    /// Converge local state with a change. Inserts for ids we already have
    /// are dropped; updates and deletes always win. Remote updates are read
    /// back from the database, so whatever arrives is the current row.
    pub async fn apply(&self, event: ChangeEvent) {
        let mut state = self.state.write().await;
        reconcile(&mut state.notes, event);
    }

    /// Consume remote change events until every sender is gone.
    pub async fn subscribe(&self, mut rx: mpsc::Receiver<ChangeEvent>) {
        while let Some(event) = rx.recv().await {
            tracing::debug!(id = %event.note_id(), ?event, "remote change");
            self.apply(event).await;
        }
        tracing::info!("change subscription closed");
    }

    /// A successful insert replaces any copy of the same id and goes to the
    /// top, unlike a remote insert which defers to what we already have.
    async fn merge_created(&self, note: Note) {
        let mut state = self.state.write().await;
        state.notes.retain(|n| n.id != note.id);
        state.notes.insert(0, note);
    }
}

fn reconcile(notes: &mut Vec<Note>, event: ChangeEvent) {
    match event {
        ChangeEvent::Insert(note) => {
            if !notes.iter().any(|n| n.id == note.id) {
                notes.insert(0, note);
            }
        }
        ChangeEvent::Update(note) => {
            if let Some(existing) = notes.iter_mut().find(|n| n.id == note.id) {
                *existing = note;
            }
        }
        ChangeEvent::Delete(id) => notes.retain(|n| n.id != id),
    }
}

/// `updated_at` must never go backwards, even if our clock is behind the
/// one that stamped the current row. Postgres keeps microseconds.
fn next_timestamp(current: Option<&Note>) -> DateTime<Utc> {
    let now = Utc::now().trunc_subsecs(6);
    match current {
        Some(note) if note.updated_at > now => note.updated_at,
        _ => now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db_ops::memory::MemoryBackend, notify::recording::RecordingNotifier,
        realtime,
    };
    use chrono::Duration;
    use tempfile::TempDir;

    struct Harness {
        store: NoteStore,
        backend: Arc<MemoryBackend>,
        notifier: Arc<RecordingNotifier>,
        _dir: TempDir,
    }

    fn harness() -> Harness {
        crate::logging::init_test_logging();
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(MemoryBackend::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let store = NoteStore::new(
            backend.clone(),
            notifier.clone(),
            Snapshot::new(dir.path().join("notes_backup.json")),
        );
        Harness {
            store,
            backend,
            notifier,
            _dir: dir,
        }
    }

    fn remote_note(title: &str) -> Note {
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

    #[tokio::test]
    async fn test_empty_note_is_rejected_without_mutation() {
        let h = harness();
        let result = h.store.create(NoteDraft::new(" ", "", &["tag"])).await;
        assert_eq!(result, Err(ValidationError::EmptyNote));
        assert!(h.store.snapshot().await.notes.is_empty());
        assert_eq!(h.backend.row_count(), 0);
        assert!(h.notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_create_adds_exactly_one_note_and_notifies() {
        let h = harness();
        h.store
            .create(NoteDraft::new("Market", "süt", &["ev", "alışveriş"]))
            .await
            .unwrap();

        let notes = h.store.snapshot().await.notes;
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "Market");
        assert_eq!(notes[0].content, "süt");
        assert_eq!(notes[0].tags, vec!["ev".to_string(), "alışveriş".to_string()]);

        h.notifier.wait().await;
        assert_eq!(
            h.notifier.sent(),
            vec![(notify::CREATED_HEADING.to_string(), "Market".to_string())]
        );
    }

    #[tokio::test]
    async fn test_create_then_echoed_insert_is_not_duplicated() {
        let h = harness();
        h.store.create(NoteDraft::new("", "content only", &[])).await.unwrap();
        let created = h.store.snapshot().await.notes[0].clone();

        h.store.apply(ChangeEvent::Insert(created)).await;
        assert_eq!(h.store.snapshot().await.notes.len(), 1);

        h.notifier.wait().await;
        assert_eq!(h.notifier.sent()[0].1, notify::CREATED_FALLBACK);
    }

    #[tokio::test]
    async fn test_failed_create_is_silent_no_op() {
        let h = harness();
        h.backend.set_failing(true);
        assert!(h.store.create(NoteDraft::new("t", "", &[])).await.is_ok());
        assert!(h.store.snapshot().await.notes.is_empty());
    }

    #[tokio::test]
    async fn test_update_patches_local_state_and_notifies() {
        let h = harness();
        h.store.create(NoteDraft::new("old", "", &[])).await.unwrap();
        h.notifier.wait().await;
        let before = h.store.snapshot().await.notes[0].clone();

        h.store
            .update(before.id, NoteDraft::new("new", "body", &["x"]))
            .await
            .unwrap();

        let after = h.store.get(before.id).await.expect("note");
        assert_eq!(after.title, "new");
        assert_eq!(after.content, "body");
        assert_eq!(after.created_at, before.created_at);
        assert!(after.updated_at >= before.updated_at);
        assert_eq!(h.backend.list().await.unwrap()[0].title, "new");

        h.notifier.wait().await;
        assert_eq!(
            h.notifier.sent()[1],
            (notify::UPDATED_HEADING.to_string(), "new".to_string())
        );
    }

    #[tokio::test]
    async fn test_update_rejects_empty_draft() {
        let h = harness();
        h.store.create(NoteDraft::new("keep", "", &[])).await.unwrap();
        let id = h.store.snapshot().await.notes[0].id;
        assert_eq!(
            h.store.update(id, NoteDraft::default()).await,
            Err(ValidationError::EmptyNote)
        );
        assert_eq!(h.store.get(id).await.unwrap().title, "keep");
    }

    #[tokio::test]
    async fn test_delete_removes_locally_and_remotely() {
        let h = harness();
        h.store.create(NoteDraft::new("gone", "", &[])).await.unwrap();
        h.store.create(NoteDraft::new("stays", "", &[])).await.unwrap();
        let gone = h
            .store
            .snapshot()
            .await
            .notes
            .into_iter()
            .find(|n| n.title == "gone")
            .unwrap();

        h.store.delete(gone.id).await;
        assert!(h.store.get(gone.id).await.is_none());
        assert_eq!(h.backend.row_count(), 1);

        h.store.load().await;
        let titles: Vec<String> =
            h.store.snapshot().await.notes.into_iter().map(|n| n.title).collect();
        assert_eq!(titles, vec!["stays".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_note() {
        let h = harness();
        h.store.create(NoteDraft::new("x", "", &[])).await.unwrap();
        let id = h.store.snapshot().await.notes[0].id;
        h.backend.set_failing(true);
        h.store.delete(id).await;
        assert!(h.store.get(id).await.is_some());
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_completion() {
        let h = harness();
        h.store.create(NoteDraft::new("task", "", &[])).await.unwrap();
        let id = h.store.snapshot().await.notes[0].id;

        h.store.toggle_completion(id).await;
        assert!(h.store.get(id).await.unwrap().completed);
        assert!(h.backend.get(id).await.unwrap().unwrap().completed);

        h.store.toggle_completion(id).await;
        assert!(!h.store.get(id).await.unwrap().completed);
    }

    #[tokio::test]
    async fn test_toggle_unknown_id_does_nothing() {
        let h = harness();
        h.store.toggle_completion(Uuid::new_v4()).await;
        assert!(h.store.snapshot().await.notes.is_empty());
    }

    #[tokio::test]
    async fn test_remote_insert_for_known_id_is_suppressed() {
        let h = harness();
        let note = remote_note("remote");
        h.store.apply(ChangeEvent::Insert(note.clone())).await;
        h.store.apply(ChangeEvent::Insert(note.clone())).await;
        assert_eq!(h.store.snapshot().await.notes, vec![note]);
    }

    #[tokio::test]
    async fn test_remote_update_from_lagging_clock_converges_to_db() {
        let h = harness();
        h.store.create(NoteDraft::new("mine", "", &[])).await.unwrap();
        let id = h.store.snapshot().await.notes[0].id;
        h.store.toggle_completion(id).await;
        let local = h.store.get(id).await.unwrap();

        // Another client with a clock a little behind ours saves after us.
        let theirs = NoteDraft::new("theirs", "", &[]);
        h.backend
            .update(id, &theirs, local.updated_at - Duration::milliseconds(5))
            .await
            .unwrap();
        let event = realtime::resolve(
            &*h.backend,
            realtime::Payload {
                op: realtime::Op::Update,
                id,
            },
        )
        .await
        .unwrap()
        .expect("row");
        h.store.apply(event).await;

        let db = h.backend.get(id).await.unwrap().unwrap();
        assert_eq!(h.store.get(id).await.unwrap(), db);
        assert_eq!(db.title, "theirs");
        assert!(!db.completed);
    }

    #[tokio::test]
    async fn test_echo_of_own_toggle_keeps_local_state() {
        let h = harness();
        h.store.create(NoteDraft::new("task", "", &[])).await.unwrap();
        let id = h.store.snapshot().await.notes[0].id;
        h.store.toggle_completion(id).await;

        let echo = h.backend.get(id).await.unwrap().unwrap();
        h.store.apply(ChangeEvent::Update(echo.clone())).await;
        let local = h.store.get(id).await.unwrap();
        assert!(local.completed);
        assert_eq!(local, echo);
    }

    #[tokio::test]
    async fn test_remote_update_for_unknown_id_is_ignored() {
        let h = harness();
        h.store.apply(ChangeEvent::Update(remote_note("ghost"))).await;
        assert!(h.store.snapshot().await.notes.is_empty());
    }

    #[tokio::test]
    async fn test_subscription_applies_events_in_order() {
        let h = harness();
        let (tx, rx) = mpsc::channel(8);
        let note = remote_note("live");
        tx.send(ChangeEvent::Insert(note.clone())).await.unwrap();
        tx.send(ChangeEvent::Insert(note.clone())).await.unwrap();
        tx.send(ChangeEvent::Delete(note.id)).await.unwrap();
        tx.send(ChangeEvent::Insert(remote_note("after"))).await.unwrap();
        drop(tx);

        h.store.subscribe(rx).await;
        let notes = h.store.snapshot().await.notes;
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "after");
    }

    #[tokio::test]
    async fn test_load_success_goes_online_and_writes_snapshot() {
        let h = harness();
        h.backend.insert(&NoteDraft::new("persisted", "", &[])).await.unwrap();

        h.store.load().await;
        let state = h.store.snapshot().await;
        assert!(!state.loading);
        assert_eq!(state.connection, ConnectionState::Online);
        assert_eq!(state.notes.len(), 1);

        let saved = h.store.snapshot.read().await.unwrap().expect("snapshot");
        assert_eq!(saved, state.notes);
    }

    #[tokio::test]
    async fn test_failed_load_shows_snapshot_and_goes_offline() {
        let h = harness();
        h.backend.insert(&NoteDraft::new("cached", "", &[])).await.unwrap();
        h.store.load().await;

        h.backend.set_failing(true);
        h.store.apply(ChangeEvent::Delete(
            h.store.snapshot().await.notes[0].id,
        ))
        .await;
        h.store.load().await;

        let state = h.store.snapshot().await;
        assert_eq!(state.connection, ConnectionState::Offline);
        assert!(!state.loading);
        assert_eq!(state.notes.len(), 1);
        assert_eq!(state.notes[0].title, "cached");
    }

    #[tokio::test]
    async fn test_reload_after_outage_goes_back_online() {
        let h = harness();
        h.backend.set_failing(true);
        h.store.load().await;
        assert_eq!(h.store.connection().await, ConnectionState::Offline);

        h.backend.set_failing(false);
        h.backend.insert(&NoteDraft::new("written meanwhile", "", &[])).await.unwrap();
        h.store.load().await;

        let state = h.store.snapshot().await;
        assert_eq!(state.connection, ConnectionState::Online);
        assert_eq!(state.notes.len(), 1);
        assert_eq!(state.notes[0].title, "written meanwhile");
    }

    #[tokio::test]
    async fn test_failed_load_without_snapshot_keeps_current_notes() {
        let h = harness();
        h.backend.set_failing(true);
        h.store.apply(ChangeEvent::Insert(remote_note("in memory"))).await;
        h.store.load().await;

        let state = h.store.snapshot().await;
        assert_eq!(state.connection, ConnectionState::Offline);
        assert_eq!(state.notes.len(), 1);
    }

    #[test]
    fn test_next_timestamp_never_goes_backwards() {
        let mut note = remote_note("future");
        note.updated_at = Utc::now() + Duration::hours(1);
        assert_eq!(next_timestamp(Some(&note)), note.updated_at);
        let now = next_timestamp(None);
        assert!(now <= Utc::now());
        assert_eq!(now.timestamp_subsec_nanos() % 1_000, 0);
    }
}
