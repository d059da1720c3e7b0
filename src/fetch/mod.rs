//! Package downloads.

pub mod download;

pub use download::Downloader;
