//! In-memory cache of synthesized announcement audio.
//!
//! Displays fetch the audio by ID right after the announcement event, so
//! only the most recent few clips are kept. Older ones are evicted first.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Default number of clips kept in memory.
pub const DEFAULT_AUDIO_CAPACITY: usize = 32;

/// Reference to a playable clip handed to the display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioAsset {
    pub id: String,
    pub content_type: String,
    /// Path the display can fetch the clip from.
    pub url: String,
}

/// A cached clip.
#[derive(Debug, Clone)]
pub struct StoredAudio {
    pub content_type: String,
    pub bytes: Arc<Vec<u8>>,
}

#[derive(Debug, Clone)]
pub struct AudioStore {
    clips: Arc<RwLock<VecDeque<(String, StoredAudio)>>>,
    capacity: usize,
}

impl Default for AudioStore {
    fn default() -> Self {
        Self::new(DEFAULT_AUDIO_CAPACITY)
    }
}

impl AudioStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            clips: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
            capacity: capacity.max(1),
        }
    }

    /// Stores a clip and returns its asset reference.
    pub async fn put(&self, content_type: &str, bytes: Vec<u8>) -> AudioAsset {
        let id = Uuid::new_v4().to_string();
        let size = bytes.len();
        {
            let mut clips = self.clips.write().await;
            while clips.len() >= self.capacity {
                clips.pop_front();
            }
            clips.push_back((
                id.clone(),
                StoredAudio {
                    content_type: content_type.to_string(),
                    bytes: Arc::new(bytes),
                },
            ));
        }
        tracing::debug!(asset_id = %id, content_type, size, "announcement audio cached");

        AudioAsset {
            url: format!("/api/audio/{id}"),
            id,
            content_type: content_type.to_string(),
        }
    }

    pub async fn get(&self, id: &str) -> Option<StoredAudio> {
        self.clips
            .read()
            .await
            .iter()
            .find(|(clip_id, _)| clip_id == id)
            .map(|(_, clip)| clip.clone())
    }

    pub async fn len(&self) -> usize {
        self.clips.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.clips.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get() {
        let store = AudioStore::default();
        let asset = store.put("audio/wav", vec![1, 2, 3]).await;
        assert_eq!(asset.url, format!("/api/audio/{}", asset.id));

        let clip = store.get(&asset.id).await.expect("clip should be cached");
        assert_eq!(clip.content_type, "audio/wav");
        assert_eq!(clip.bytes.as_slice(), &[1, 2, 3]);
        assert!(store.get("missing").await.is_none());
    }

    #[tokio::test]
    async fn oldest_clip_is_evicted() {
        let store = AudioStore::new(2);
        let first = store.put("audio/mpeg", vec![1]).await;
        let second = store.put("audio/mpeg", vec![2]).await;
        let third = store.put("audio/mpeg", vec![3]).await;

        assert_eq!(store.len().await, 2);
        assert!(store.get(&first.id).await.is_none());
        assert!(store.get(&second.id).await.is_some());
        assert!(store.get(&third.id).await.is_some());
    }
}
