pub mod config;
pub mod error;
pub mod events;
pub mod listing;
pub mod render;
pub mod resolution;
pub mod rotation;
pub mod title;
pub mod tasks {
    pub mod fetcher;
    pub mod presenter;
}
