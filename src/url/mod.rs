//! URL handling module for Sumi-Harvest
//!
//! This module provides URL validation, fingerprinting for deduplication and
//! host scoping.

mod domain;
mod normalize;

pub use domain::{extract_domain, same_host};
pub use normalize::{fingerprint, normalize_url};
