//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Input events (key-down/key-up mapped to simulation input)

pub mod input;

pub use input::{Controls, Key};
