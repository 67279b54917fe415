//! topicboard/crates/tb-core/src/lib.rs
//!
//! The central domain types and interface definitions for topicboard.

pub mod error;
pub mod forms;
pub mod models;
pub mod traits;

// Re-exporting for easier access in other crates
pub use error::*;
pub use forms::*;
pub use models::*;
pub use traits::*;
