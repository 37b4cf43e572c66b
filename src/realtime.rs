//! Row-level change feed. A trigger on `notes` publishes `{op, id}` on the
//! `notes_changes` channel; we resolve each payload into a typed
//! [`ChangeEvent`] and hand it to the store over an mpsc channel.

use super::{
    config::{CHANGES_CHANNEL, RECONNECT_INTERVAL},
    db_ops::NoteBackend,
    models::ChangeEvent,
    store::NoteStore,
};
use anyhow::Result;
use serde::Deserialize;
use sqlx::postgres::{PgListener, PgPool};
use std::sync::Arc;
use tokio::{
    sync::mpsc,
    time::{self, MissedTickBehavior},
};
use uuid::Uuid;

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Op {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct Payload {
    pub op: Op,
    pub id: Uuid,
}

pub fn parse_payload(raw: &str) -> Result<Payload> {
    Ok(serde_json::from_str(raw)?)
}

/// Turn a notification into an event. Inserts and updates carry the full
/// row, so we fetch it; if it has vanished in the meantime there's nothing to
/// apply and we return `None`.
pub async fn resolve(
    backend: &dyn NoteBackend,
    payload: Payload,
) -> Result<Option<ChangeEvent>> {
    Ok(match payload.op {
        Op::Delete => Some(ChangeEvent::Delete(payload.id)),
        Op::Insert => backend.get(payload.id).await?.map(ChangeEvent::Insert),
        Op::Update => backend.get(payload.id).await?.map(ChangeEvent::Update),
    })
}

/// Keep the store in sync for the life of the process. Each round connects
/// the listener, reloads the note set (after subscribing, so nothing in
/// between is missed) and forwards changes until the connection drops. A
/// database that is down at boot or goes away later is picked up again on a
/// later round.
pub async fn supervise(
    db: PgPool,
    backend: Arc<dyn NoteBackend>,
    store: NoteStore,
    tx: mpsc::Sender<ChangeEvent>,
) {
    let mut ticker = time::interval(RECONNECT_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let listener = match connect(&db).await {
            Ok(listener) => Some(listener),
            Err(e) => {
                tracing::warn!(error = ?e, "could not connect change listener");
                None
            }
        };
        store.load().await;
        let Some(listener) = listener else {
            continue;
        };
        match forward(listener, backend.as_ref(), &tx).await {
            Ok(()) => return,
            Err(e) => tracing::warn!(error = ?e, "change listener dropped"),
        }
    }
}

async fn connect(db: &PgPool) -> Result<PgListener> {
    let mut listener = PgListener::connect_with(db).await?;
    listener.listen(CHANGES_CHANNEL).await?;
    tracing::info!(channel = CHANGES_CHANNEL, "listening for note changes");
    Ok(listener)
}

/// Forward changes until the connection drops (an error) or the store stops
/// listening (`Ok`).
async fn forward(
    mut listener: PgListener,
    backend: &dyn NoteBackend,
    tx: &mpsc::Sender<ChangeEvent>,
) -> Result<()> {
    loop {
        let notification = listener.recv().await?;
        let payload = match parse_payload(notification.payload()) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(
                    error = ?e,
                    payload = notification.payload(),
                    "skipping unreadable change notification"
                );
                continue;
            }
        };
        let id = payload.id;
        match resolve(backend, payload).await {
            Ok(Some(event)) => {
                if tx.send(event).await.is_err() {
                    tracing::info!("store stopped listening; closing listener");
                    return Ok(());
                }
            }
            Ok(None) => tracing::debug!(%id, "changed row already gone"),
            Err(e) => tracing::warn!(error = ?e, %id, "could not fetch changed row"),
        }
    }
}
