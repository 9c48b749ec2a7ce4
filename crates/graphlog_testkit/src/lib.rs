//! # graphlog testkit
//!
//! Test utilities for graphlog.
//!
//! This crate provides:
//! - Log fixtures, in memory and file-backed
//! - Property-based generators for records, commands and log entries
//! - A torn-tail harness that recovers every prefix of a log
//!
//! ## Usage
//!
//! ```rust,ignore
//! use graphlog_testkit::prelude::*;
//!
//! let log = memory_log();
//! write_node_transaction(&log, 1, 1, &[10, 11]);
//! for result in TornTailHarness::from_log(&log).unwrap().check_every_cut() {
//!     assert!(result.passed, "{}", result.description);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod crash;
pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::crash::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use crash::*;
pub use fixtures::*;
pub use generators::*;
