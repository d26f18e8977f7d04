//! Output helpers.
//!
//! - per-tau result export (CSV) (`export`)
//! - run manifest (JSON) (`export`)

pub mod export;

pub use export::*;
