//! Async handle over the calls table with change notifications.
//!
//! Every query runs on the blocking pool. Every write that changes the
//! table bumps a revision counter and publishes it on a broadcast channel,
//! which is what the feed projector listens to. Clones share the same pool,
//! counter, and channel.

use crate::{CallError, ResetOutcome};
use chama_db::DbPool;
use chama_types::{CallRecord, NewCall};
use rusqlite::Connection;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Capacity of the change channel. A slow listener that falls further
/// behind than this sees `Lagged`, which projectors treat as "changed".
const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Shared, cloneable access to the call store.
#[derive(Clone)]
pub struct CallStore {
    pool: DbPool,
    changes: broadcast::Sender<u64>,
    revision: Arc<AtomicU64>,
}

impl std::fmt::Debug for CallStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallStore")
            .field("revision", &self.revision())
            .field("listeners", &self.changes.receiver_count())
            .finish()
    }
}

impl CallStore {
    pub fn new(pool: DbPool) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            pool,
            changes,
            revision: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Subscribes to change notifications. Each message is the revision
    /// reached by the write that produced it.
    pub fn subscribe_changes(&self) -> broadcast::Receiver<u64> {
        self.changes.subscribe()
    }

    /// Number of writes observed since this store was created.
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }

    /// Inserts a validated call and notifies listeners.
    pub async fn insert(&self, call: NewCall) -> Result<CallRecord, CallError> {
        let record = self.run(move |conn| crate::insert_call(conn, &call)).await?;
        self.notify("insert");
        Ok(record)
    }

    pub async fn get(&self, call_id: String) -> Result<CallRecord, CallError> {
        self.run(move |conn| crate::get_call(conn, &call_id)).await
    }

    /// Lists the `limit` most recent calls, newest first.
    pub async fn recent(&self, limit: u32) -> Result<Vec<CallRecord>, CallError> {
        self.run(move |conn| crate::list_recent_calls(conn, limit))
            .await
    }

    /// Deletes every call. Listeners are only notified when something was
    /// actually removed.
    pub async fn reset(&self) -> Result<ResetOutcome, CallError> {
        let outcome = self.run(crate::delete_all_calls).await?;
        match outcome {
            ResetOutcome::Deleted { count } => {
                tracing::info!(count, "call history reset");
                self.notify("reset");
            }
            ResetOutcome::AlreadyEmpty => {
                tracing::info!("call history reset requested but already empty");
            }
        }
        Ok(outcome)
    }

    pub async fn delete(&self, call_id: String) -> Result<(), CallError> {
        self.run(move |conn| crate::delete_call(conn, &call_id))
            .await?;
        self.notify("delete");
        Ok(())
    }

    /// Re-inserts an existing call under a new ID.
    pub async fn recall(&self, call_id: String) -> Result<CallRecord, CallError> {
        let record = self.run(move |conn| crate::recall(conn, &call_id)).await?;
        self.notify("recall");
        Ok(record)
    }

    async fn run<T, F>(&self, op: F) -> Result<T, CallError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, CallError> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            op(&conn)
        })
        .await
        .map_err(|e| CallError::Task(e.to_string()))?
    }

    fn notify(&self, cause: &'static str) {
        let revision = self.revision.fetch_add(1, Ordering::SeqCst) + 1;
        // No listeners is normal when no display is connected.
        if self.changes.send(revision).is_err() {
            tracing::debug!(revision, cause, "call store changed with no listeners");
        } else {
            tracing::debug!(revision, cause, "call store change published");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chama_db::{create_pool, run_migrations, DbRuntimeSettings};

    fn store() -> CallStore {
        let pool = create_pool(
            ":memory:",
            DbRuntimeSettings {
                pool_max_size: 1,
                ..Default::default()
            },
        )
        .expect("pool creation should succeed");
        {
            let conn = pool.get().expect("should get a connection");
            run_migrations(&conn).expect("migrations should succeed");
        }
        CallStore::new(pool)
    }

    fn new_call(name: &str) -> NewCall {
        NewCall {
            patient_name: name.to_string(),
            room_number: "1".to_string(),
            professional_name: None,
        }
    }

    #[tokio::test]
    async fn writes_publish_increasing_revisions() {
        let store = store();
        let mut changes = store.subscribe_changes();

        let a = store.insert(new_call("Ana")).await.unwrap();
        assert_eq!(changes.recv().await.unwrap(), 1);

        store.recall(a.id.clone()).await.unwrap();
        assert_eq!(changes.recv().await.unwrap(), 2);

        store.delete(a.id).await.unwrap();
        assert_eq!(changes.recv().await.unwrap(), 3);
        assert_eq!(store.revision(), 3);
    }

    #[tokio::test]
    async fn empty_reset_does_not_notify() {
        let store = store();
        let mut changes = store.subscribe_changes();

        assert_eq!(store.reset().await.unwrap(), ResetOutcome::AlreadyEmpty);
        assert!(matches!(
            changes.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
        assert_eq!(store.revision(), 0);
    }

    #[tokio::test]
    async fn failed_writes_do_not_notify() {
        let store = store();
        let mut changes = store.subscribe_changes();

        let err = store.delete("ghost".to_string()).await.unwrap_err();
        assert!(matches!(err, CallError::NotFound(_)));
        assert!(changes.try_recv().is_err());
    }

    #[tokio::test]
    async fn clones_share_notifier() {
        let store = store();
        let other = store.clone();
        let mut changes = store.subscribe_changes();

        other.insert(new_call("Bia")).await.unwrap();
        assert_eq!(changes.recv().await.unwrap(), 1);
        assert_eq!(store.revision(), 1);
    }
}
