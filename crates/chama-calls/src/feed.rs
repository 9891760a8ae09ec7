//! Live feed of the most recent calls.
//!
//! A [`FeedSubscription`] delivers the current snapshot as soon as it is
//! established and a fresh full snapshot after every store change. It never
//! delivers diffs. Notifications that pile up while a query is running are
//! collapsed into a single re-query.

use crate::store::CallStore;
use chama_types::FeedSnapshot;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Snapshots buffered between the projector task and the subscriber.
const FEED_BUFFER: usize = 16;

/// What a feed subscriber sees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedState {
    /// Whole-state replacement, newest call first.
    Snapshot(FeedSnapshot),
    /// No store is available, or the stream broke. The feed ends after this.
    NoData,
}

/// Issues "latest N calls, newest first" subscriptions against a store.
pub struct FeedProjector;

impl FeedProjector {
    /// Starts a live subscription.
    ///
    /// With no store the projector does not subscribe at all: the returned
    /// subscription yields a single [`FeedState::NoData`] and then ends.
    pub fn subscribe(store: Option<&CallStore>, limit: u32) -> FeedSubscription {
        let (tx, rx) = mpsc::channel(FEED_BUFFER);

        let Some(store) = store else {
            tracing::debug!("no call store available, feed reports no data");
            // Fresh channel with spare capacity, cannot fail.
            let _ = tx.try_send(FeedState::NoData);
            return FeedSubscription {
                rx,
                task: None,
                released: false,
            };
        };

        let task = tokio::spawn(project(store.clone(), limit, tx));
        FeedSubscription {
            rx,
            task: Some(task),
            released: false,
        }
    }
}

async fn project(store: CallStore, limit: u32, tx: mpsc::Sender<FeedState>) {
    // Subscribe before the first query so no change can slip in between.
    let mut changes = store.subscribe_changes();

    loop {
        let state = match store.recent(limit).await {
            Ok(calls) => FeedState::Snapshot(FeedSnapshot::new(calls)),
            Err(e) => {
                tracing::warn!(error = %e, "feed query failed, feed degrades to no data");
                let _ = tx.send(FeedState::NoData).await;
                return;
            }
        };

        if tx.send(state).await.is_err() {
            tracing::debug!("feed subscriber gone, stopping projector");
            return;
        }

        match changes.recv().await {
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "feed projector lagged, re-querying");
            }
            Err(RecvError::Closed) => {
                tracing::warn!("call store change stream closed, feed degrades to no data");
                let _ = tx.send(FeedState::NoData).await;
                return;
            }
        }

        // Collapse a burst of notifications into one query.
        loop {
            match changes.try_recv() {
                Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
    }
}

/// Handle to a running feed. Dropping it releases the subscription.
#[derive(Debug)]
pub struct FeedSubscription {
    rx: mpsc::Receiver<FeedState>,
    task: Option<JoinHandle<()>>,
    released: bool,
}

impl FeedSubscription {
    /// Waits for the next feed state. Returns `None` once the feed has ended
    /// or been released.
    pub async fn next(&mut self) -> Option<FeedState> {
        if self.released {
            return None;
        }
        self.rx.recv().await
    }

    /// Cancels the underlying subscription. Safe to call more than once; only
    /// the first call has an effect. Buffered snapshots are discarded.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!("feed subscription released");
        }
        self.rx.close();
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl Drop for FeedSubscription {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chama_db::{create_pool, run_migrations, DbPool, DbRuntimeSettings};
    use chama_types::NewCall;
    use std::time::Duration;
    use tokio::time::timeout;

    fn store() -> CallStore {
        store_with_pool().1
    }

    fn store_with_pool() -> (DbPool, CallStore) {
        let pool = create_pool(
            ":memory:",
            DbRuntimeSettings {
                pool_max_size: 1,
                ..Default::default()
            },
        )
        .unwrap();
        run_migrations(&pool.get().unwrap()).unwrap();
        (pool.clone(), CallStore::new(pool))
    }

    /// Renames a selected column so snapshot queries fail while plain
    /// deletes still succeed.
    fn break_snapshot_query(pool: &DbPool) {
        pool.get()
            .unwrap()
            .execute_batch("ALTER TABLE calls RENAME COLUMN professional_name TO professional")
            .unwrap();
    }

    fn new_call(name: &str) -> NewCall {
        NewCall {
            patient_name: name.to_string(),
            room_number: "5".to_string(),
            professional_name: None,
        }
    }

    async fn next_snapshot(sub: &mut FeedSubscription) -> FeedSnapshot {
        match timeout(Duration::from_secs(5), sub.next()).await {
            Ok(Some(FeedState::Snapshot(snapshot))) => snapshot,
            other => panic!("expected snapshot, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn no_store_reports_no_data_and_ends() {
        let mut sub = FeedProjector::subscribe(None, 6);
        assert_eq!(sub.next().await, Some(FeedState::NoData));
        assert_eq!(sub.next().await, None);
    }

    #[tokio::test]
    async fn delivers_initial_then_full_snapshots() {
        let store = store();
        let mut sub = FeedProjector::subscribe(Some(&store), 6);

        assert!(next_snapshot(&mut sub).await.is_empty());

        let a = store.insert(new_call("Ana")).await.unwrap();
        let snapshot = next_snapshot(&mut sub).await;
        assert_eq!(snapshot.calls(), std::slice::from_ref(&a));

        let b = store.insert(new_call("Bia")).await.unwrap();
        let snapshot = next_snapshot(&mut sub).await;
        assert_eq!(snapshot.calls(), &[b, a]);
    }

    #[tokio::test]
    async fn snapshot_is_bounded_by_limit() {
        let store = store();
        for i in 0..4 {
            store.insert(new_call(&format!("P{i}"))).await.unwrap();
        }

        let mut sub = FeedProjector::subscribe(Some(&store), 2);
        let snapshot = next_snapshot(&mut sub).await;
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.calls()[0].patient_name, "P3");
    }

    #[tokio::test]
    async fn reset_yields_empty_snapshot() {
        let store = store();
        store.insert(new_call("Ana")).await.unwrap();
        let mut sub = FeedProjector::subscribe(Some(&store), 6);
        assert_eq!(next_snapshot(&mut sub).await.len(), 1);

        store.reset().await.unwrap();
        assert!(next_snapshot(&mut sub).await.is_empty());
    }

    #[tokio::test]
    async fn failed_query_reports_no_data_and_ends() {
        let (pool, store) = store_with_pool();
        store.insert(new_call("Ana")).await.unwrap();
        let mut sub = FeedProjector::subscribe(Some(&store), 6);
        assert_eq!(next_snapshot(&mut sub).await.len(), 1);

        break_snapshot_query(&pool);
        store.reset().await.unwrap();

        let degraded = timeout(Duration::from_secs(5), sub.next()).await.unwrap();
        assert_eq!(degraded, Some(FeedState::NoData));
        let ended = timeout(Duration::from_secs(5), sub.next()).await.unwrap();
        assert_eq!(ended, None);

        // Later changes reach nobody.
        store.reset().await.unwrap();
        assert_eq!(sub.next().await, None);
    }

    #[tokio::test]
    async fn release_is_idempotent_and_stops_delivery() {
        let store = store();
        let mut sub = FeedProjector::subscribe(Some(&store), 6);
        next_snapshot(&mut sub).await;

        sub.release();
        sub.release();
        assert!(sub.is_released());

        store.insert(new_call("Ana")).await.unwrap();
        assert_eq!(sub.next().await, None);
    }
}
