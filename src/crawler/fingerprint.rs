//! Fingerprint store for URL deduplication
//!
//! Tracks every URL that has been scheduled or visited during one run, keyed
//! by its fingerprint (see `url::fingerprint`).

use crate::url::fingerprint;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};
use url::Url;

/// Set of URL fingerprints seen during a crawl run
///
/// All methods take `&self` and are safe to call from concurrent tasks. The
/// lock is never held across an `.await`.
#[derive(Debug, Default)]
pub struct FingerprintStore {
    seen: Mutex<HashSet<String>>,
}

impl FingerprintStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if a URL with the same fingerprint was already marked
    pub fn seen(&self, url: &Url) -> bool {
        self.lock().contains(&fingerprint(url))
    }

    /// Marks a URL as seen
    pub fn mark(&self, url: &Url) {
        self.lock().insert(fingerprint(url));
    }

    /// Atomically checks and marks a URL
    ///
    /// Returns true only for the first caller with a given fingerprint. Two
    /// concurrent discoveries of the same resource can never both win.
    pub fn check_and_mark(&self, url: &Url) -> bool {
        self.lock().insert(fingerprint(url))
    }

    /// Number of distinct fingerprints
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        // The set stays consistent even if a holder panicked mid-insert
        self.seen.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
