//! SQLite persistence for the ML gateway.
//!
//! This crate provides:
//! - A split reader/writer pool in WAL mode with embedded migrations
//! - Crop image analyses, queried per user and farm for progress tracking
//! - Crop recommendation history

pub mod crop_images;
pub mod error;
pub mod pool;
pub mod recommendations;

mod rows;

pub use crop_images::CropImageRepository;
pub use error::{StoreError, StoreResult};
pub use pool::{default_database_url, DatabasePool};
pub use recommendations::CropRecommendationRepository;
