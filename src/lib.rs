//! `tau-calib` library crate.
//!
//! The binary (`taucal`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - modules are reusable (e.g., embedding the calibrator in a larger
//!   analysis driver)
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod calib;
pub mod cli;
pub mod data;
pub mod domain;
pub mod edm;
pub mod error;
pub mod io;
pub mod meta;
pub mod report;
pub mod smear;
pub mod store;
pub mod syst;
