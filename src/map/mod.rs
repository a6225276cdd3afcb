// src/map/mod.rs

//! Content map generation.
//!
//! - `cache`: per-partition output cache over the settings store
//! - `render`: XML serialization of partitions and the index
//! - `engine`: request classification and orchestration

pub mod cache;
pub mod engine;
pub mod render;

pub use cache::MapCache;
pub use engine::{MapEngine, MapOutcome, MapQuery};
