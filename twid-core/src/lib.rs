//! Media discovery and download pipeline for profile media timelines.
//!
//! Network traffic observed while a browser scrolls a profile's media tab is
//! classified, normalized to the best rendition and collected in a
//! [`core::registry::MediaRegistry`]. The finalized records are then fetched
//! concurrently with bounded retry.

pub mod core;
pub mod error;
pub mod fs_paths;
pub mod models;
