//! Recently seen result batches.
//!
//! Re-issuing a query (e.g. reopening the view) replays the cached batch so
//! the rows come back without waiting on the source.

use rowsync_core::QueryBatch;

#[derive(Debug, Clone)]
struct Slot {
    batch: QueryBatch,
    stamp: u64,
}

/// Fixed-capacity cache of batches keyed by search string.
///
/// Slots live in a flat arena; each store bumps a recency stamp and the
/// slot with the lowest stamp is the one evicted.
#[derive(Debug, Clone)]
pub struct ResultCache {
    slots: Vec<Slot>,
    capacity: usize,
    clock: u64,
    default_batch: Option<QueryBatch>,
}

impl ResultCache {
    /// Create a cache holding up to `capacity` batches. Zero disables it.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            clock: 0,
            default_batch: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of keyed batches held, not counting the default batch.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Store a batch.
    ///
    /// Empty batches are ignored. A batch for the empty search string is
    /// kept only when it is the default batch. Returns whether the batch was
    /// stored.
    pub fn put(&mut self, batch: QueryBatch) -> bool {
        if self.capacity == 0 || batch.is_empty() {
            return false;
        }
        if batch.search_string.is_empty() {
            if !batch.default_results {
                return false;
            }
            tracing::debug!("Caching default batch ({} results)", batch.len());
            self.default_batch = Some(batch);
            return true;
        }

        self.clock += 1;
        let stamp = self.clock;

        if let Some(slot) = self
            .slots
            .iter_mut()
            .find(|s| s.batch.search_string == batch.search_string)
        {
            slot.batch = batch;
            slot.stamp = stamp;
            return true;
        }

        if self.slots.len() < self.capacity {
            self.slots.push(Slot { batch, stamp });
            return true;
        }

        if let Some(slot) = self.slots.iter_mut().min_by_key(|s| s.stamp) {
            tracing::debug!("Evicting cached batch for '{}'", slot.batch.search_string);
            *slot = Slot { batch, stamp };
        }
        true
    }

    /// Batch for `search`. The empty string yields the default batch.
    pub fn get(&self, search: &str) -> Option<&QueryBatch> {
        if search.is_empty() {
            return self.default_batch.as_ref();
        }
        self.slots
            .iter()
            .find(|s| s.batch.search_string == search)
            .map(|s| &s.batch)
    }

    pub fn default_batch(&self) -> Option<&QueryBatch> {
        self.default_batch.as_ref()
    }

    pub fn invalidate_default(&mut self) {
        self.default_batch = None;
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.default_batch = None;
        self.clock = 0;
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(5)
    }
}
