//! Input generation for the demo pipeline and tests.

pub mod sample;

pub use sample::*;
