//! Frontier: the breadth-first queue of pages waiting to be fetched
//!
//! Entries are popped in FIFO order, so every depth-`d` page is dispatched
//! before any depth-`d + 1` page discovered later. Entries deeper than the
//! depth budget are never queued.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use url::Url;

/// A page waiting to be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    /// The URL to fetch
    pub url: Url,

    /// Link hops from the start URL
    pub depth: u32,
}

/// Depth-aware FIFO work queue
#[derive(Debug)]
pub struct Frontier {
    queue: Mutex<VecDeque<FrontierEntry>>,
    max_depth: u32,
}

impl Frontier {
    /// Creates an empty frontier that accepts entries up to `max_depth`
    pub fn new(max_depth: u32) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            max_depth,
        }
    }

    /// Adds an entry to the back of the queue
    ///
    /// Returns false (and queues nothing) when `depth` exceeds the depth budget.
    pub fn push(&self, url: Url, depth: u32) -> bool {
        if depth > self.max_depth {
            tracing::trace!("Not queueing {} at depth {} (max {})", url, depth, self.max_depth);
            return false;
        }

        self.lock().push_back(FrontierEntry { url, depth });
        true
    }

    /// Removes the oldest entry
    pub fn pop(&self) -> Option<FrontierEntry> {
        self.lock().pop_front()
    }

    /// Removes up to `limit` of the oldest entries, preserving order
    pub fn pop_batch(&self, limit: usize) -> Vec<FrontierEntry> {
        let mut queue = self.lock();
        let count = limit.min(queue.len());
        queue.drain(..count).collect()
    }

    /// Returns the number of queued entries
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<FrontierEntry>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
