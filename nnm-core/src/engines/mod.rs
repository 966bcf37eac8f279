//! Concrete implementations of the `RedactionEngine` trait.
//!
//! # License
//! MIT OR Apache-2.0

pub mod phrase_engine;
