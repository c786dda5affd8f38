//! Process-wide track cache.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::OnceCell;

use super::{TrackData, TrackKey};
use crate::error::EdtResult;

type Slot = Arc<OnceCell<Arc<TrackData>>>;

/// Write-once-per-track cache.
///
/// The map only hands out one init cell per key; the cell serializes the
/// first load of that key while other keys proceed independently. Once a
/// cell is set, reads never wait.
#[derive(Default)]
pub struct TrackCache {
    slots: RwLock<HashMap<TrackKey, Slot>>,
}

impl TrackCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached data for `key`, or the result of running `load` once.
    ///
    /// If `load` fails, the error is returned and the slot stays empty so a
    /// later request can try again.
    pub async fn get_or_load<F, Fut>(&self, key: &TrackKey, load: F) -> EdtResult<Arc<TrackData>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = EdtResult<TrackData>>,
    {
        let slot = self.slot(key);

        if let Some(data) = slot.get() {
            return Ok(Arc::clone(data));
        }

        let data = slot
            .get_or_try_init(|| async {
                let data = load().await?;
                tracing::info!(
                    track = %key,
                    backend = ?data.backend(),
                    events = data.len(),
                    "loaded track"
                );
                Ok::<_, crate::error::EdtError>(Arc::new(data))
            })
            .await?;

        Ok(Arc::clone(data))
    }

    /// Whether `key` has been loaded successfully.
    pub fn is_loaded(&self, key: &TrackKey) -> bool {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .is_some_and(|slot| slot.initialized())
    }

    /// Keys loaded so far, sorted.
    pub fn loaded_keys(&self) -> Vec<TrackKey> {
        let mut keys: Vec<TrackKey> = self
            .slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, slot)| slot.initialized())
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    /// The init cell for `key`, created on first request (double-checked).
    fn slot(&self, key: &TrackKey) -> Slot {
        if let Some(slot) = self
            .slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
        {
            return Arc::clone(slot);
        }

        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(key.clone()).or_default())
    }
}
