//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `PageState`: the terminal outcome of one frontier entry (accepted, rejected, skipped)
//! - `RunState`: the lifecycle of a whole crawl run

mod page_state;
mod run_state;

pub use page_state::PageState;
pub use run_state::RunState;
