pub mod browser;
pub mod classifier;
pub mod discovery;
pub mod downloader;
pub mod events;
pub mod normalizer;
pub mod registry;
pub mod retry;
pub mod video_info;
